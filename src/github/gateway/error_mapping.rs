//! Translation of Octocrab failures into [`GitHubError`].

use http::StatusCode;

use crate::github::error::GitHubError;

/// Transport failures that never produced an HTTP response.
const fn is_transport_failure(error: &octocrab::Error) -> bool {
    matches!(
        error,
        octocrab::Error::Http { .. }
            | octocrab::Error::Hyper { .. }
            | octocrab::Error::Service { .. }
    )
}

/// A 403 or 429 whose message or documentation link mentions rate limiting.
pub(super) fn is_rate_limit_error(source: &octocrab::GitHubError) -> bool {
    let throttling_status = matches!(
        source.status_code,
        StatusCode::FORBIDDEN | StatusCode::TOO_MANY_REQUESTS
    );
    throttling_status
        && (source.message.to_lowercase().contains("rate limit")
            || source
                .documentation_url
                .as_deref()
                .is_some_and(|url| url.contains("rate-limit")))
}

/// Classifies an Octocrab failure by HTTP status or transport cause.
pub(super) fn map_octocrab_error(operation: &str, error: &octocrab::Error) -> GitHubError {
    let octocrab::Error::GitHub { source, .. } = error else {
        let message = format!("{operation} failed: {error}");
        return if is_transport_failure(error) {
            GitHubError::Network { message }
        } else {
            GitHubError::Api { message }
        };
    };

    let status = source.status_code;
    let message = format!("{operation} failed: GitHub returned {status} {}", source.message);
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => GitHubError::Authentication { message },
        StatusCode::NOT_FOUND => GitHubError::NotFound { message },
        _ => GitHubError::Api { message },
    }
}
