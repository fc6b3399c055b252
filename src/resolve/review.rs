//! Review state resolution.

use crate::github::models::{PullRequestSnapshot, Review, ReviewVerdict};

/// Canonical review state of a pull request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReviewState {
    /// The pull request is still a draft.
    Draft,
    /// Reviewers have been requested and have not yet responded.
    ReviewRequested,
    /// The latest review approved the change.
    Approved,
    /// The latest review requested changes.
    ChangesRequested,
    /// The latest review only left comments (or was dismissed).
    Commented,
    /// Nobody has submitted a review.
    Unreviewed,
}

impl ReviewState {
    /// Returns the persisted representation.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Draft => "DRAFT",
            Self::ReviewRequested => "REVIEW_REQUESTED",
            Self::Approved => "APPROVED",
            Self::ChangesRequested => "CHANGES_REQUESTED",
            Self::Commented => "COMMENTED",
            Self::Unreviewed => "UNREVIEWED",
        }
    }
}

/// Returns the most recently submitted non-pending review.
#[must_use]
pub fn latest_submitted_review(reviews: &[Review]) -> Option<&Review> {
    reviews
        .iter()
        .filter(|review| review.verdict != ReviewVerdict::Pending)
        .filter(|review| review.submitted_at.is_some())
        .max_by_key(|review| review.submitted_at)
}

/// Resolves the review state of a pull request.
///
/// Drafts and pull requests with outstanding review requests resolve without
/// consulting `reviews`. `None` means the reviews could not be fetched and
/// degrades to [`ReviewState::Unreviewed`].
#[must_use]
pub fn resolve_review_state(
    snapshot: &PullRequestSnapshot,
    reviews: Option<&[Review]>,
) -> ReviewState {
    if snapshot.draft {
        return ReviewState::Draft;
    }
    if snapshot.has_pending_review_requests() {
        return ReviewState::ReviewRequested;
    }

    let Some(latest) = reviews.and_then(latest_submitted_review) else {
        return ReviewState::Unreviewed;
    };

    match latest.verdict {
        ReviewVerdict::Approved => ReviewState::Approved,
        ReviewVerdict::ChangesRequested => ReviewState::ChangesRequested,
        ReviewVerdict::Commented | ReviewVerdict::Dismissed => ReviewState::Commented,
        ReviewVerdict::Pending => ReviewState::Unreviewed,
    }
}
