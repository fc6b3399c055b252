//! Error types exposed by the GitHub hosting layer.

use thiserror::Error;

use super::rate_limit::RateLimitInfo;

/// Errors surfaced while parsing identifiers or communicating with GitHub.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum GitHubError {
    /// The supplied URL or API base could not be parsed.
    #[error("URL is invalid: {0}")]
    InvalidUrl(String),

    /// A repository reference was not in `owner/name` form.
    #[error("repository must be written as owner/name, got `{input}`")]
    InvalidRepository {
        /// The rejected input.
        input: String,
    },

    /// The pull request number is not a valid integer.
    #[error("pull request number must be a positive integer")]
    InvalidPullRequestNumber,

    /// The authentication token was missing.
    #[error("personal access token is required")]
    MissingToken,

    /// The authentication token was rejected by GitHub.
    #[error("GitHub rejected the token: {message}")]
    Authentication {
        /// GitHub error message returned with the 401/403 response.
        message: String,
    },

    /// The requested resource does not exist or is not visible to the token.
    #[error("GitHub resource not found: {message}")]
    NotFound {
        /// Description of the missing resource.
        message: String,
    },

    /// GitHub returned a non-authentication API error.
    #[error("GitHub API error: {message}")]
    Api {
        /// Response body from GitHub describing the failure.
        message: String,
    },

    /// Networking failed while calling GitHub.
    #[error("network error talking to GitHub: {message}")]
    Network {
        /// Transport-level error detail.
        message: String,
    },

    /// A request did not complete within the configured timeout.
    #[error("{operation} timed out after {seconds}s")]
    Timeout {
        /// Operation that timed out.
        operation: String,
        /// Timeout that elapsed, in seconds.
        seconds: u64,
    },

    /// Rate limit exceeded - the API returned 403/429 with a rate limit message.
    #[error("GitHub API rate limit exceeded: {message}")]
    RateLimitExceeded {
        /// Rate limit info if available from the rate limit endpoint.
        rate_limit: Option<RateLimitInfo>,
        /// Error message from GitHub.
        message: String,
    },

    /// A payload carried an enumerated value this crate does not understand.
    #[error("unexpected {field} value `{value}` in GitHub payload")]
    UnexpectedValue {
        /// Name of the payload field.
        field: &'static str,
        /// The unrecognised value.
        value: String,
    },
}
