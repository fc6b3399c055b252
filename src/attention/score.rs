//! The urgency score: a sum of independently capped factors.

use chrono::{DateTime, Utc};

use super::weights::AttentionWeights;
use crate::resolve::CiState;

/// Signals the score is computed from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AttentionInput {
    /// The viewer's review is requested.
    pub review_requested: bool,
    /// The viewer is an assignee.
    pub assigned: bool,
    /// Canonical CI state of the head commit.
    pub ci_state: CiState,
    /// Whole hours since the pull request was last updated.
    pub hours_since_update: u64,
    /// Texts mentioning the viewer.
    pub mentions: u32,
    /// Lines added.
    pub additions: u64,
    /// Lines removed.
    pub deletions: u64,
    /// Issue comment count.
    pub comments: u64,
    /// Commit count.
    pub commits: u64,
    /// The pull request is a draft.
    pub draft: bool,
    /// The viewer acted last.
    pub viewer_acted_last: bool,
}

/// One signed value per factor. Penalties are stored as negative values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ScoreBreakdown {
    /// Review requested from the viewer.
    pub review_request_boost: i64,
    /// Viewer assigned.
    pub assignee_boost: i64,
    /// CI state; raises urgency.
    pub ci_penalty: i64,
    /// Time since the last update.
    pub staleness_boost: i64,
    /// Mentions of the viewer.
    pub mention_boost: i64,
    /// Logarithmic diff size.
    pub size_boost: i64,
    /// Comment activity.
    pub activity_boost: i64,
    /// Commit count.
    pub commit_boost: i64,
    /// Draft pull requests.
    pub draft_penalty: i64,
    /// The viewer acted last.
    pub my_last_activity_penalty: i64,
}

impl ScoreBreakdown {
    /// Sum of every factor, clamped at zero.
    #[must_use]
    pub const fn final_score(&self) -> i64 {
        let total = self
            .review_request_boost
            .saturating_add(self.assignee_boost)
            .saturating_add(self.ci_penalty)
            .saturating_add(self.staleness_boost)
            .saturating_add(self.mention_boost)
            .saturating_add(self.size_boost)
            .saturating_add(self.activity_boost)
            .saturating_add(self.commit_boost)
            .saturating_add(self.draft_penalty)
            .saturating_add(self.my_last_activity_penalty);
        if total < 0 { 0 } else { total }
    }
}

/// Computes the score breakdown for one pull request.
#[must_use]
pub fn calculate_urgency_score(input: &AttentionInput, weights: &AttentionWeights) -> ScoreBreakdown {
    let ci_weight = match input.ci_state {
        CiState::Failure => weights.ci_failure,
        CiState::Pending => weights.ci_pending,
        CiState::Unknown => weights.ci_unknown,
        CiState::Success => 0,
    };
    let staleness_points = input
        .hours_since_update
        .checked_div(u64::from(weights.staleness_hours_per_point))
        .unwrap_or(0);
    let diff_lines = input.additions.saturating_add(input.deletions);

    ScoreBreakdown {
        review_request_boost: when(input.review_requested, weights.review_request),
        assignee_boost: when(input.assigned, weights.assignee),
        ci_penalty: i64::from(ci_weight),
        staleness_boost: capped(staleness_points, weights.staleness_cap),
        mention_boost: capped(
            u64::from(input.mentions).saturating_mul(u64::from(weights.per_mention)),
            weights.mention_cap,
        ),
        size_boost: capped(u64::from(doubled_log2(diff_lines)), weights.size_cap),
        activity_boost: capped(
            input.comments.saturating_mul(u64::from(weights.per_comment)),
            weights.activity_cap,
        ),
        commit_boost: capped(input.commits, weights.commit_cap),
        draft_penalty: -when(input.draft, weights.draft_penalty),
        my_last_activity_penalty: -when(input.viewer_acted_last, weights.my_last_activity_penalty),
    }
}

/// Whole hours from `updated_at` to `now`; future timestamps count as zero.
#[must_use]
pub fn hours_since(updated_at: DateTime<Utc>, now: DateTime<Utc>) -> u64 {
    u64::try_from(now.signed_duration_since(updated_at).num_hours()).unwrap_or(0)
}

fn when(condition: bool, weight: u32) -> i64 {
    if condition { i64::from(weight) } else { 0 }
}

fn capped(value: u64, cap: u32) -> i64 {
    i64::from(u32::try_from(value).unwrap_or(u32::MAX).min(cap))
}

/// `floor(2 * log2(lines + 1))`, computed as `floor(log2((lines + 1)^2))`.
fn doubled_log2(lines: u64) -> u32 {
    let base = u128::from(lines).saturating_add(1);
    base.saturating_mul(base).ilog2()
}
