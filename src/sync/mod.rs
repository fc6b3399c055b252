//! The synchronisation engine.
//!
//! [`SyncOrchestrator`] resolves who is acting and which repositories they
//! track, then drives a [`RepositorySynchronizer`] per repository. Each
//! synchronizer lists open pull requests, resolves their CI, review, activity
//! and flow signals, scores them and upserts the result. Failures are
//! recorded as [`SyncIssue`]s and the run keeps going; only a storage outage
//! aborts it, and even then the run row is finalised as failed.

mod error;
mod identity;
mod issue;
mod orchestrator;
mod repository;
mod signals;

pub use error::SyncError;
pub use identity::{CredentialResolver, StaticCredentials, select_identity};
pub use issue::{IssueScope, SyncIssue};
pub use orchestrator::{SyncOrchestrator, SyncRunSummary};
pub use repository::{
    RepositorySyncReport, RepositorySynchronizer, StorageUnavailable, SyncSettings,
};

#[cfg(test)]
pub use identity::MockCredentialResolver;
