//! Fetching the per-pull-request signals the resolvers consume.
//!
//! Every fetch here degrades instead of failing: CI errors count as "no
//! entries", review errors leave the reviews unknown and comment errors leave
//! the comments unknown. The resolvers turn unknown inputs into safe defaults.

use tracing::warn;

use crate::github::{
    HostingGateway, IssueComment, PullRequestSnapshot, RepositoryLocator, Review,
};
use crate::resolve::{
    CiState, SignalOutcome, resolve_ci_state, summarise_check_runs, summarise_combined_status,
};

/// Raw inputs for one pull request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(super) struct PullRequestSignals {
    pub(super) ci_state: CiState,
    pub(super) reviews: Option<Vec<Review>>,
    pub(super) comments: Option<Vec<IssueComment>>,
}

pub(super) async fn gather_signals(
    gateway: &dyn HostingGateway,
    repository: &RepositoryLocator,
    pull: &PullRequestSnapshot,
) -> PullRequestSignals {
    let (status, checks, reviews, comments) = tokio::join!(
        gateway.combined_status(repository, &pull.head_sha),
        gateway.check_runs(repository, &pull.head_sha),
        gateway.reviews(repository, pull.number),
        gateway.issue_comments(repository, pull.number),
    );

    let status_outcome = match status {
        Ok(combined) => summarise_combined_status(&combined),
        Err(error) => {
            warn!(repository = %repository, pull = %pull.number, %error, "combined status unavailable");
            SignalOutcome::NoEntries
        }
    };
    let checks_outcome = match checks {
        Ok(runs) => summarise_check_runs(&runs),
        Err(error) => {
            warn!(repository = %repository, pull = %pull.number, %error, "check runs unavailable");
            SignalOutcome::NoEntries
        }
    };

    PullRequestSignals {
        ci_state: resolve_ci_state(status_outcome, checks_outcome),
        reviews: reviews
            .inspect_err(|error| {
                warn!(repository = %repository, pull = %pull.number, %error, "reviews unavailable");
            })
            .ok(),
        comments: comments
            .inspect_err(|error| {
                warn!(repository = %repository, pull = %pull.number, %error, "comments unavailable");
            })
            .ok(),
    }
}
