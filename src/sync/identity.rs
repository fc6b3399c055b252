//! Identity and credential resolution.

use std::collections::BTreeMap;

use crate::github::PersonalAccessToken;

use super::SyncError;

/// Enumerates identities and hands out their tokens.
#[cfg_attr(test, mockall::automock)]
pub trait CredentialResolver: Send + Sync {
    /// Logins with stored credentials.
    fn identities(&self) -> Vec<String>;

    /// A currently valid token for `login`.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::UnknownIdentity`] when nothing is stored for it.
    fn token_for(&self, login: &str) -> Result<PersonalAccessToken, SyncError>;
}

/// Picks the acting identity.
///
/// An explicit login always wins. Otherwise exactly one stored identity is
/// required.
///
/// # Errors
///
/// Returns [`SyncError::MissingIdentity`] when nothing is stored and
/// [`SyncError::AmbiguousIdentity`] when several are.
pub fn select_identity(explicit: Option<&str>, stored: &[String]) -> Result<String, SyncError> {
    if let Some(login) = explicit.map(str::trim).filter(|login| !login.is_empty()) {
        return Ok(login.to_owned());
    }
    match stored {
        [] => Err(SyncError::MissingIdentity),
        [only] => Ok(only.clone()),
        several => Err(SyncError::AmbiguousIdentity {
            candidates: several.to_vec(),
        }),
    }
}

/// Credentials held in memory, keyed by login.
#[derive(Debug, Clone, Default)]
pub struct StaticCredentials {
    tokens: BTreeMap<String, PersonalAccessToken>,
}

impl StaticCredentials {
    /// Adds or replaces the token for `login`.
    #[must_use]
    pub fn with(mut self, login: impl Into<String>, token: PersonalAccessToken) -> Self {
        self.tokens.insert(login.into(), token);
        self
    }
}

impl CredentialResolver for StaticCredentials {
    fn identities(&self) -> Vec<String> {
        self.tokens.keys().cloned().collect()
    }

    fn token_for(&self, login: &str) -> Result<PersonalAccessToken, SyncError> {
        self.tokens
            .iter()
            .find(|(stored, _token)| stored.eq_ignore_ascii_case(login))
            .map(|(_login, token)| token.clone())
            .ok_or_else(|| SyncError::UnknownIdentity {
                login: login.to_owned(),
            })
    }
}
