//! Gateways for reading pull request state through Octocrab.
//!
//! The sync engine talks to GitHub exclusively through [`HostingGateway`], so
//! tests can substitute a mock while [`OctocrabGateway`] performs real HTTP
//! requests. Every call may fail independently; callers decide which failures
//! degrade to a safe default and which abort the current item.

mod client;
mod error_mapping;
mod factory;
mod octocrab_gateway;

pub use factory::{GatewayFactory, OctocrabGatewayFactory};
pub use octocrab_gateway::OctocrabGateway;

use async_trait::async_trait;

use crate::github::error::GitHubError;
use crate::github::locator::{PullRequestNumber, RepositoryLocator};
use crate::github::models::{
    CheckRun, CombinedStatus, IssueComment, PullRequestSnapshot, RepositoryDetails, Review,
};

/// Read-only view of the hosting API consumed by the sync engine.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait HostingGateway: Send + Sync {
    /// Login of the user the client is authenticated as.
    async fn authenticated_login(&self) -> Result<String, GitHubError>;

    /// Repository metadata, used to validate access and read the default branch.
    async fn repository(
        &self,
        repository: &RepositoryLocator,
    ) -> Result<RepositoryDetails, GitHubError>;

    /// Numbers of every open pull request in the repository, across all
    /// pages.
    ///
    /// The outer error fails the whole listing. An entry whose number cannot
    /// be read is returned as its own error so the rest can still be synced.
    async fn list_open_pull_requests(
        &self,
        repository: &RepositoryLocator,
    ) -> Result<Vec<Result<PullRequestNumber, GitHubError>>, GitHubError>;

    /// Full pull request details, including size and activity metrics.
    async fn pull_request(
        &self,
        repository: &RepositoryLocator,
        number: PullRequestNumber,
    ) -> Result<PullRequestSnapshot, GitHubError>;

    /// Legacy combined commit status for a SHA.
    async fn combined_status(
        &self,
        repository: &RepositoryLocator,
        sha: &str,
    ) -> Result<CombinedStatus, GitHubError>;

    /// Check runs for a SHA.
    async fn check_runs(
        &self,
        repository: &RepositoryLocator,
        sha: &str,
    ) -> Result<Vec<CheckRun>, GitHubError>;

    /// Every review submitted on the pull request.
    async fn reviews(
        &self,
        repository: &RepositoryLocator,
        number: PullRequestNumber,
    ) -> Result<Vec<Review>, GitHubError>;

    /// Every issue comment on the pull request.
    async fn issue_comments(
        &self,
        repository: &RepositoryLocator,
        number: PullRequestNumber,
    ) -> Result<Vec<IssueComment>, GitHubError>;
}
