//! Structured problems collected during a sync run.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::github::{PullRequestNumber, RepositoryLocator};

/// What a [`SyncIssue`] applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueScope {
    /// A failure that aborted the whole run.
    Run,
    /// A repository that could not be seeded or listed.
    Repository,
    /// A single pull request that could not be processed.
    PullRequest,
}

/// A recorded, non-fatal sync problem.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncIssue {
    /// What the issue applies to.
    pub scope: IssueScope,
    /// Repository full name, when known.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub repository: Option<String>,
    /// Pull request number, for pull-request issues.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub pull_request: Option<u64>,
    /// Human-readable failure detail.
    pub message: String,
}

impl SyncIssue {
    /// An issue that aborted the run.
    pub fn run(message: impl Into<String>) -> Self {
        Self {
            scope: IssueScope::Run,
            repository: None,
            pull_request: None,
            message: message.into(),
        }
    }

    /// An issue affecting a whole repository.
    pub fn repository(repository: &RepositoryLocator, message: impl Into<String>) -> Self {
        Self {
            scope: IssueScope::Repository,
            repository: Some(repository.full_name()),
            pull_request: None,
            message: message.into(),
        }
    }

    /// An issue affecting one pull request.
    pub fn pull_request(
        repository: &RepositoryLocator,
        number: PullRequestNumber,
        message: impl Into<String>,
    ) -> Self {
        Self {
            scope: IssueScope::PullRequest,
            repository: Some(repository.full_name()),
            pull_request: Some(number.get()),
            message: message.into(),
        }
    }
}

impl fmt::Display for SyncIssue {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.repository, self.pull_request) {
            (Some(repository), Some(number)) => {
                write!(formatter, "{repository}#{number}: {}", self.message)
            }
            (Some(repository), None) => write!(formatter, "{repository}: {}", self.message),
            (None, _) => formatter.write_str(&self.message),
        }
    }
}
