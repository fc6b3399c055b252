//! Local persistence and database migrations.
//!
//! Beacon keeps tracked repositories, reconciled pull requests, their
//! attention state and the sync run history in a local `SQLite` database.
//! The schema is managed with Diesel migrations so the database can be
//! created and upgraded consistently across machines.

mod error;
mod migrator;
mod model;
mod sqlite_store;
mod store;

pub use error::PersistenceError;
pub use migrator::{
    CURRENT_SCHEMA_VERSION, INITIAL_SCHEMA_VERSION, SchemaVersion, migrate_database,
};
pub use model::{
    AttentionEntry, NewTrackedRepository, Provenance, PullRequestRecord, SyncRunId,
    SyncRunOutcome, SyncRunRecord, SyncRunStatus, SyncTrigger, TrackedRepository,
};
pub use sqlite_store::SqliteSyncStore;
pub use store::SyncStore;

#[cfg(test)]
pub use store::MockSyncStore;
