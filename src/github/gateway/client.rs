//! Octocrab client construction.

use http::Uri;
use octocrab::Octocrab;

use crate::github::error::GitHubError;
use crate::github::locator::PersonalAccessToken;

use super::error_mapping::map_octocrab_error;

/// Parses the API base, dropping trailing slashes so joined paths stay clean.
fn api_base_uri(api_base: &str) -> Result<Uri, GitHubError> {
    let uri = api_base
        .trim()
        .trim_end_matches('/')
        .parse::<Uri>()
        .map_err(|error| GitHubError::InvalidUrl(error.to_string()))?;
    if uri.scheme().is_none() || uri.host().is_none() {
        return Err(GitHubError::InvalidUrl(format!(
            "`{api_base}` is not an absolute URL"
        )));
    }
    Ok(uri)
}

/// Builds an Octocrab client authenticated with `token` against `api_base`.
///
/// # Errors
///
/// Returns `GitHubError::InvalidUrl` for a relative or malformed base and
/// `GitHubError::Api` when Octocrab rejects the configuration.
pub(super) fn build_octocrab_client(
    token: &PersonalAccessToken,
    api_base: &str,
) -> Result<Octocrab, GitHubError> {
    Octocrab::builder()
        .personal_token(token.as_ref())
        .base_uri(api_base_uri(api_base)?)
        .map_err(|error| GitHubError::Api {
            message: format!("invalid api base: {error}"),
        })?
        .build()
        .map_err(|error| map_octocrab_error("build client", &error))
}
