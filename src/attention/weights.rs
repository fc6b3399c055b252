//! Tunable magnitudes for the attention score.

use serde::{Deserialize, Serialize};

/// Weights and caps applied by [`super::calculate_urgency_score`].
///
/// The shape of the score is fixed; these values only tune its magnitudes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AttentionWeights {
    /// Added when the viewer's review is requested.
    pub review_request: u32,
    /// Added when the viewer is an assignee.
    pub assignee: u32,
    /// Added when CI is failing.
    pub ci_failure: u32,
    /// Added when CI is still running.
    pub ci_pending: u32,
    /// Added when CI reported nothing.
    pub ci_unknown: u32,
    /// Hours without an update that earn one staleness point.
    pub staleness_hours_per_point: u32,
    /// Upper bound of the staleness boost.
    pub staleness_cap: u32,
    /// Added per text mentioning the viewer.
    pub per_mention: u32,
    /// Upper bound of the mention boost.
    pub mention_cap: u32,
    /// Upper bound of the logarithmic size boost.
    pub size_cap: u32,
    /// Added per comment.
    pub per_comment: u32,
    /// Upper bound of the comment activity boost.
    pub activity_cap: u32,
    /// Upper bound of the commit boost.
    pub commit_cap: u32,
    /// Subtracted for drafts.
    pub draft_penalty: u32,
    /// Subtracted when the viewer acted last.
    pub my_last_activity_penalty: u32,
}

impl Default for AttentionWeights {
    fn default() -> Self {
        Self {
            review_request: 50,
            assignee: 30,
            ci_failure: 25,
            ci_pending: 10,
            ci_unknown: 5,
            staleness_hours_per_point: 4,
            staleness_cap: 20,
            per_mention: 5,
            mention_cap: 20,
            size_cap: 20,
            per_comment: 1,
            activity_cap: 10,
            commit_cap: 10,
            draft_penalty: 20,
            my_last_activity_penalty: 15,
        }
    }
}
