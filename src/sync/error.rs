//! Errors that stop a sync before or during a run.

use thiserror::Error;

use crate::github::GitHubError;
use crate::persistence::PersistenceError;

/// Orchestrator-level failures.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SyncError {
    /// No identity was given and none is stored.
    #[error("no GitHub identity is configured (set --token or GITHUB_TOKEN)")]
    MissingIdentity,

    /// Several identities are stored and none was chosen.
    #[error("several GitHub identities are configured ({}); choose one with --login", candidates.join(", "))]
    AmbiguousIdentity {
        /// Stored identities.
        candidates: Vec<String>,
    },

    /// The chosen identity is not known to the credential resolver.
    #[error("no credentials stored for `{login}`")]
    UnknownIdentity {
        /// Requested login.
        login: String,
    },

    /// A hosting call needed before the run could start failed.
    #[error(transparent)]
    GitHub(#[from] GitHubError),

    /// A storage call failed.
    #[error(transparent)]
    Persistence(#[from] PersistenceError),
}
