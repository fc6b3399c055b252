//! Identity wrappers for repositories, pull requests, and tokens.

use std::fmt;

use super::error::GitHubError;

/// Repository owner wrapper to avoid stringly typed parameters.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RepositoryOwner(String);

impl RepositoryOwner {
    fn new(value: &str, input: &str) -> Result<Self, GitHubError> {
        if value.is_empty() {
            return Err(GitHubError::InvalidRepository {
                input: input.to_owned(),
            });
        }
        Ok(Self(value.to_owned()))
    }

    /// Borrow the owner value.
    #[must_use]
    pub const fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

/// Repository name wrapper to prevent parameter mix-ups.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RepositoryName(String);

impl RepositoryName {
    fn new(value: &str, input: &str) -> Result<Self, GitHubError> {
        if value.is_empty() {
            return Err(GitHubError::InvalidRepository {
                input: input.to_owned(),
            });
        }
        Ok(Self(value.to_owned()))
    }

    /// Borrow the repository name.
    #[must_use]
    pub const fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

/// Pull request number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PullRequestNumber(u64);

impl PullRequestNumber {
    /// Wraps a pull request number.
    ///
    /// # Errors
    ///
    /// Returns [`GitHubError::InvalidPullRequestNumber`] for zero.
    pub const fn new(value: u64) -> Result<Self, GitHubError> {
        if value == 0 {
            return Err(GitHubError::InvalidPullRequestNumber);
        }
        Ok(Self(value))
    }

    /// Returns the numeric value.
    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for PullRequestNumber {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(formatter, "#{}", self.0)
    }
}

/// Personal access token wrapper enforcing presence.
#[derive(Clone, PartialEq, Eq)]
pub struct PersonalAccessToken(String);

impl PersonalAccessToken {
    /// Validates that the token is non-empty and trims whitespace.
    ///
    /// # Errors
    ///
    /// Returns [`GitHubError::MissingToken`] when the supplied string is blank.
    pub fn new(token: impl AsRef<str>) -> Result<Self, GitHubError> {
        let trimmed = token.as_ref().trim();
        if trimmed.is_empty() {
            return Err(GitHubError::MissingToken);
        }
        Ok(Self(trimmed.to_owned()))
    }

    /// Borrow the token value.
    #[must_use]
    pub const fn value(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Debug for PersonalAccessToken {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str("PersonalAccessToken(..)")
    }
}

impl AsRef<str> for PersonalAccessToken {
    fn as_ref(&self) -> &str {
        self.value()
    }
}

/// A repository on the configured GitHub host.
///
/// The API base lives on the gateway client, so a locator only carries the
/// `owner/name` pair and derives request paths from it.
///
/// # Example
///
/// ```
/// use beacon::github::RepositoryLocator;
///
/// let locator = RepositoryLocator::parse("octo/widgets").expect("should parse");
/// assert_eq!(locator.owner().as_str(), "octo");
/// assert_eq!(locator.full_name(), "octo/widgets");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RepositoryLocator {
    owner: RepositoryOwner,
    name: RepositoryName,
}

impl RepositoryLocator {
    /// Builds a locator from separate owner and name values.
    ///
    /// # Errors
    ///
    /// Returns [`GitHubError::InvalidRepository`] when either part is empty.
    pub fn from_owner_repo(owner: &str, name: &str) -> Result<Self, GitHubError> {
        let input = format!("{owner}/{name}");
        Ok(Self {
            owner: RepositoryOwner::new(owner.trim(), &input)?,
            name: RepositoryName::new(name.trim(), &input)?,
        })
    }

    /// Parses an `owner/name` full name.
    ///
    /// # Errors
    ///
    /// Returns [`GitHubError::InvalidRepository`] unless the input has exactly
    /// two non-empty segments.
    pub fn parse(full_name: &str) -> Result<Self, GitHubError> {
        let trimmed = full_name.trim().trim_end_matches('/');
        let mut segments = trimmed.split('/');
        let (Some(owner), Some(name), None) = (segments.next(), segments.next(), segments.next())
        else {
            return Err(GitHubError::InvalidRepository {
                input: full_name.to_owned(),
            });
        };

        Ok(Self {
            owner: RepositoryOwner::new(owner, full_name)?,
            name: RepositoryName::new(name, full_name)?,
        })
    }

    /// Repository owner.
    #[must_use]
    pub const fn owner(&self) -> &RepositoryOwner {
        &self.owner
    }

    /// Repository name.
    #[must_use]
    pub const fn name(&self) -> &RepositoryName {
        &self.name
    }

    /// Returns `owner/name`.
    #[must_use]
    pub fn full_name(&self) -> String {
        format!("{}/{}", self.owner.as_str(), self.name.as_str())
    }

    pub(crate) fn repository_path(&self) -> String {
        format!("/repos/{}/{}", self.owner.as_str(), self.name.as_str())
    }

    pub(crate) fn pulls_path(&self) -> String {
        format!("{}/pulls", self.repository_path())
    }

    pub(crate) fn pull_request_path(&self, number: PullRequestNumber) -> String {
        format!("{}/pulls/{}", self.repository_path(), number.get())
    }

    pub(crate) fn reviews_path(&self, number: PullRequestNumber) -> String {
        format!("{}/pulls/{}/reviews", self.repository_path(), number.get())
    }

    pub(crate) fn issue_comments_path(&self, number: PullRequestNumber) -> String {
        format!("{}/issues/{}/comments", self.repository_path(), number.get())
    }

    pub(crate) fn combined_status_path(&self, sha: &str) -> String {
        format!("{}/commits/{sha}/status", self.repository_path())
    }

    pub(crate) fn check_runs_path(&self, sha: &str) -> String {
        format!("{}/commits/{sha}/check-runs", self.repository_path())
    }
}

impl fmt::Display for RepositoryLocator {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(formatter, "{}/{}", self.owner.as_str(), self.name.as_str())
    }
}
