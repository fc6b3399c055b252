//! GitHub hosting API access for the sync engine.
//!
//! This module wraps Octocrab behind the [`HostingGateway`] trait, decodes the
//! REST payloads the engine consumes into explicit domain types, and maps
//! transport failures into [`GitHubError`] so callers can decide how to
//! degrade without touching Octocrab internals.

pub mod error;
pub mod gateway;
pub mod locator;
pub mod models;
pub mod rate_limit;

pub use error::GitHubError;
pub use gateway::{GatewayFactory, HostingGateway, OctocrabGateway, OctocrabGatewayFactory};
pub use locator::{
    PersonalAccessToken, PullRequestNumber, RepositoryLocator, RepositoryName, RepositoryOwner,
};
pub use models::{
    CheckConclusion, CheckRun, CheckRunStatus, CombinedStatus, CommitStatusState, IssueComment,
    PullRequestLifecycle, PullRequestSnapshot, RepositoryDetails, Review, ReviewVerdict,
};

#[cfg(test)]
pub use gateway::MockHostingGateway;

#[cfg(test)]
pub(crate) mod test_fixtures;

#[cfg(test)]
mod tests;
