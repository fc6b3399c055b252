//! Octocrab implementation of [`HostingGateway`].

use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use octocrab::{Octocrab, Page};
use serde::de::DeserializeOwned;
use tracing::warn;

use crate::github::error::GitHubError;
use crate::github::locator::{PersonalAccessToken, PullRequestNumber, RepositoryLocator};
use crate::github::models::{
    ApiAuthenticatedUser, ApiCheckRuns, ApiCombinedStatus, ApiIssueComment, ApiRepository,
    ApiReview, CheckRun, CombinedStatus, IssueComment, PullRequestSnapshot, RepositoryDetails,
    Review, listed_pull_request_number,
};
use crate::github::rate_limit::RateLimitInfo;

use super::HostingGateway;
use super::client::build_octocrab_client;
use super::error_mapping::{is_rate_limit_error, map_octocrab_error};

/// Largest page size GitHub accepts.
const PER_PAGE: &str = "100";

/// Check-run pages read per commit before the rest is dropped.
const MAX_CHECK_RUN_PAGES: u32 = 10;

/// Octocrab-backed gateway with a per-request timeout.
pub struct OctocrabGateway {
    client: Octocrab,
    request_timeout: Duration,
}

impl OctocrabGateway {
    /// Creates a new gateway from an Octocrab client.
    #[must_use]
    pub const fn new(client: Octocrab, request_timeout: Duration) -> Self {
        Self {
            client,
            request_timeout,
        }
    }

    /// Builds an authenticated gateway against `api_base`.
    ///
    /// # Errors
    ///
    /// Returns `GitHubError::InvalidUrl` when the base URI cannot be parsed or
    /// `GitHubError::Api` when Octocrab fails to construct a client.
    pub fn for_token(
        token: &PersonalAccessToken,
        api_base: &str,
        request_timeout: Duration,
    ) -> Result<Self, GitHubError> {
        let client = build_octocrab_client(token, api_base)?;
        Ok(Self::new(client, request_timeout))
    }

    async fn timed<T, F>(&self, operation: &str, future: F) -> Result<T, GitHubError>
    where
        F: Future<Output = Result<T, GitHubError>> + Send,
    {
        tokio::time::timeout(self.request_timeout, future)
            .await
            .unwrap_or_else(|_elapsed| {
                Err(GitHubError::Timeout {
                    operation: operation.to_owned(),
                    seconds: self.request_timeout.as_secs(),
                })
            })
    }

    async fn get_json<T>(
        &self,
        operation: &str,
        path: String,
        query: Option<&[(&str, &str)]>,
    ) -> Result<T, GitHubError>
    where
        T: DeserializeOwned + Send,
    {
        self.timed(operation, async {
            match self.client.get::<T, _, _>(path, query).await {
                Ok(value) => Ok(value),
                Err(error) => Err(self.map_error_with_rate_limit(operation, &error).await),
            }
        })
        .await
    }

    async fn get_all_pages<T>(
        &self,
        operation: &str,
        path: String,
        query: &[(&str, &str)],
    ) -> Result<Vec<T>, GitHubError>
    where
        T: DeserializeOwned + Send,
    {
        self.timed(operation, async {
            let first: Page<T> = match self.client.get(path, Some(query)).await {
                Ok(page) => page,
                Err(error) => return Err(self.map_error_with_rate_limit(operation, &error).await),
            };

            match self.client.all_pages(first).await {
                Ok(items) => Ok(items),
                Err(error) => Err(self.map_error_with_rate_limit(operation, &error).await),
            }
        })
        .await
    }

    async fn map_error_with_rate_limit(
        &self,
        operation: &str,
        error: &octocrab::Error,
    ) -> GitHubError {
        match error {
            octocrab::Error::GitHub { source, .. } if is_rate_limit_error(source) => {
                let rate_limit = self.fetch_rate_limit_info().await;
                let base_message =
                    format!("{operation} failed: {message}", message = source.message);
                let message = match &rate_limit {
                    Some(info) => format!(
                        "{base_message} (resets at {reset})",
                        reset = info.resets_at().to_rfc3339()
                    ),
                    None => base_message,
                };

                GitHubError::RateLimitExceeded {
                    rate_limit,
                    message,
                }
            }
            _ => map_octocrab_error(operation, error),
        }
    }

    async fn fetch_rate_limit_info(&self) -> Option<RateLimitInfo> {
        let rate = self.client.ratelimit().get().await.ok()?.rate;
        let Ok(limit) = u32::try_from(rate.limit) else {
            return None;
        };
        let Ok(remaining) = u32::try_from(rate.remaining) else {
            return None;
        };
        RateLimitInfo::from_epoch(limit, remaining, rate.reset)
    }
}

#[async_trait]
impl HostingGateway for OctocrabGateway {
    async fn authenticated_login(&self) -> Result<String, GitHubError> {
        let user: ApiAuthenticatedUser = self
            .get_json("authenticated user", "/user".to_owned(), None)
            .await?;
        Ok(user.login)
    }

    async fn repository(
        &self,
        repository: &RepositoryLocator,
    ) -> Result<RepositoryDetails, GitHubError> {
        let details: ApiRepository = self
            .get_json("repository", repository.repository_path(), None)
            .await?;
        Ok(details.into())
    }

    async fn list_open_pull_requests(
        &self,
        repository: &RepositoryLocator,
    ) -> Result<Vec<Result<PullRequestNumber, GitHubError>>, GitHubError> {
        let query = [("state", "open"), ("per_page", PER_PAGE)];
        let raw: Vec<serde_json::Value> = self
            .get_all_pages("list pulls", repository.pulls_path(), &query)
            .await?;

        Ok(raw.into_iter().map(listed_pull_request_number).collect())
    }

    async fn pull_request(
        &self,
        repository: &RepositoryLocator,
        number: PullRequestNumber,
    ) -> Result<PullRequestSnapshot, GitHubError> {
        let raw: serde_json::Value = self
            .get_json("pull request", repository.pull_request_path(number), None)
            .await?;
        PullRequestSnapshot::from_raw(raw)
    }

    async fn combined_status(
        &self,
        repository: &RepositoryLocator,
        sha: &str,
    ) -> Result<CombinedStatus, GitHubError> {
        let query = [("per_page", PER_PAGE)];
        let status: ApiCombinedStatus = self
            .get_json(
                "combined status",
                repository.combined_status_path(sha),
                Some(&query),
            )
            .await?;
        CombinedStatus::try_from(status)
    }

    async fn check_runs(
        &self,
        repository: &RepositoryLocator,
        sha: &str,
    ) -> Result<Vec<CheckRun>, GitHubError> {
        let mut runs = Vec::new();
        for page in 1..=MAX_CHECK_RUN_PAGES {
            let page_number = page.to_string();
            let query = [("per_page", PER_PAGE), ("page", page_number.as_str())];
            let batch: ApiCheckRuns = self
                .get_json("check runs", repository.check_runs_path(sha), Some(&query))
                .await?;
            let received = batch.check_runs.len();
            runs.extend(batch.check_runs);

            let total = batch.total_count.unwrap_or(0);
            let collected = u64::try_from(runs.len()).unwrap_or(u64::MAX);
            if received == 0 || collected >= total {
                return runs.into_iter().map(CheckRun::try_from).collect();
            }
            if page == MAX_CHECK_RUN_PAGES {
                warn!(
                    repository = %repository,
                    sha,
                    total,
                    collected,
                    "check runs truncated"
                );
            }
        }
        runs.into_iter().map(CheckRun::try_from).collect()
    }

    async fn reviews(
        &self,
        repository: &RepositoryLocator,
        number: PullRequestNumber,
    ) -> Result<Vec<Review>, GitHubError> {
        let query = [("per_page", PER_PAGE)];
        let reviews: Vec<ApiReview> = self
            .get_all_pages("reviews", repository.reviews_path(number), &query)
            .await?;
        reviews.into_iter().map(Review::try_from).collect()
    }

    async fn issue_comments(
        &self,
        repository: &RepositoryLocator,
        number: PullRequestNumber,
    ) -> Result<Vec<IssueComment>, GitHubError> {
        let query = [("per_page", PER_PAGE)];
        let comments: Vec<ApiIssueComment> = self
            .get_all_pages(
                "issue comments",
                repository.issue_comments_path(number),
                &query,
            )
            .await?;
        Ok(comments.into_iter().map(IssueComment::from).collect())
    }
}
