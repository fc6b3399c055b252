//! The attention engine.
//!
//! Turns resolved pull request signals into a score breakdown, a clamped
//! final score and the single most important reason to look at the pull
//! request. Everything here is pure: the same input and weights always
//! produce the same result.

mod reason;
mod score;
mod weights;

pub use reason::{AttentionReason, ReasonSignals, derive_attention_reason, needs_attention};
pub use score::{AttentionInput, ScoreBreakdown, calculate_urgency_score, hours_since};
pub use weights::AttentionWeights;

/// Complete attention verdict for one pull request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AttentionAssessment {
    /// Per-factor contributions.
    pub breakdown: ScoreBreakdown,
    /// Clamped sum of the breakdown.
    pub final_score: i64,
    /// Most important reason, if any.
    pub reason: Option<AttentionReason>,
    /// Whether the reason demands action.
    pub needs_attention: bool,
}

/// Scores a pull request and derives its reason.
#[must_use]
pub fn assess_attention(
    input: &AttentionInput,
    signals: &ReasonSignals,
    weights: &AttentionWeights,
) -> AttentionAssessment {
    let breakdown = calculate_urgency_score(input, weights);
    let reason = derive_attention_reason(signals);
    AttentionAssessment {
        final_score: breakdown.final_score(),
        breakdown,
        reason,
        needs_attention: needs_attention(reason),
    }
}
