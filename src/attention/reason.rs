//! Human-readable attention reasons.

use crate::resolve::{CiState, ReviewState};

/// Why a pull request surfaces in the attention list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttentionReason {
    /// The viewer's review is requested.
    ReviewRequested,
    /// The viewer is an assignee.
    AssignedToYou,
    /// The branch conflicts with its base.
    MergeConflicts,
    /// A reviewer asked for changes.
    ChangesRequested,
    /// CI is failing.
    CiFailing,
    /// CI reported nothing. Informational only.
    CiUnknown,
}

impl AttentionReason {
    /// Text shown to users and stored alongside the score.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::ReviewRequested => "Review requested",
            Self::AssignedToYou => "Assigned to you",
            Self::MergeConflicts => "Has merge conflicts",
            Self::ChangesRequested => "Changes requested",
            Self::CiFailing => "CI failing",
            Self::CiUnknown => "CI status unknown",
        }
    }

    /// Informational reasons never mark a pull request as needing attention.
    #[must_use]
    pub const fn is_informational(&self) -> bool {
        matches!(self, Self::CiUnknown)
    }
}

/// Signals consulted by the reason cascade.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReasonSignals {
    /// The viewer's review is requested.
    pub review_requested: bool,
    /// The viewer is an assignee.
    pub assigned: bool,
    /// The branch conflicts with its base.
    pub merge_conflicts: bool,
    /// Canonical review state.
    pub review_state: ReviewState,
    /// Canonical CI state.
    pub ci_state: CiState,
}

/// Picks the first applicable reason, in priority order.
#[must_use]
pub const fn derive_attention_reason(signals: &ReasonSignals) -> Option<AttentionReason> {
    if signals.review_requested {
        Some(AttentionReason::ReviewRequested)
    } else if signals.assigned {
        Some(AttentionReason::AssignedToYou)
    } else if signals.merge_conflicts {
        Some(AttentionReason::MergeConflicts)
    } else if matches!(signals.review_state, ReviewState::ChangesRequested) {
        Some(AttentionReason::ChangesRequested)
    } else {
        match signals.ci_state {
            CiState::Failure => Some(AttentionReason::CiFailing),
            CiState::Unknown => Some(AttentionReason::CiUnknown),
            CiState::Success | CiState::Pending => None,
        }
    }
}

/// A reason marks attention unless it is missing or informational.
#[must_use]
pub const fn needs_attention(reason: Option<AttentionReason>) -> bool {
    match reason {
        Some(found) => !found.is_informational(),
        None => false,
    }
}
