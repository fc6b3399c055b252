//! Storage seam used by the sync engine.

use chrono::{DateTime, Utc};

use crate::attention::AttentionAssessment;

use super::PersistenceError;
use super::model::{
    AttentionEntry, NewTrackedRepository, PullRequestRecord, SyncRunId, SyncRunOutcome,
    SyncRunRecord, SyncTrigger, TrackedRepository,
};

/// Persistence operations required by the synchronizer and orchestrator.
#[cfg_attr(test, mockall::automock)]
pub trait SyncStore: Send + Sync {
    /// Lists the repositories a viewer currently tracks.
    ///
    /// # Errors
    ///
    /// Returns [`PersistenceError`] when the query fails.
    fn tracked_repositories(
        &self,
        viewer_login: &str,
    ) -> Result<Vec<TrackedRepository>, PersistenceError>;

    /// Whether the viewer has any tracked repository row, including
    /// soft-removed ones.
    ///
    /// # Errors
    ///
    /// Returns [`PersistenceError`] when the query fails.
    fn has_tracking_history(&self, viewer_login: &str) -> Result<bool, PersistenceError>;

    /// Inserts a tracked repository or revives a soft-removed one. An
    /// explicit request upgrades a seeded row to explicit provenance.
    ///
    /// # Errors
    ///
    /// Returns [`PersistenceError`] when the write fails.
    fn upsert_tracked_repository(
        &self,
        repository: &NewTrackedRepository,
    ) -> Result<TrackedRepository, PersistenceError>;

    /// Soft-removes a repository. Returns whether a tracked row changed.
    ///
    /// # Errors
    ///
    /// Returns [`PersistenceError`] when the write fails.
    fn untrack_repository(
        &self,
        viewer_login: &str,
        full_name: &str,
    ) -> Result<bool, PersistenceError>;

    /// Records a successful repository sync.
    ///
    /// # Errors
    ///
    /// Returns [`PersistenceError`] when the write fails.
    fn record_repository_sync(
        &self,
        repository_id: i64,
        default_branch: &str,
        synced_at: DateTime<Utc>,
    ) -> Result<(), PersistenceError>;

    /// Upserts a pull request and its attention state in one transaction.
    ///
    /// # Errors
    ///
    /// Returns [`PersistenceError`] when either write fails; neither is kept.
    fn upsert_pull_request(
        &self,
        record: &PullRequestRecord,
        attention: &AttentionAssessment,
    ) -> Result<(), PersistenceError>;

    /// Creates a `RUNNING` sync run.
    ///
    /// # Errors
    ///
    /// Returns [`PersistenceError`] when the write fails.
    fn create_sync_run(
        &self,
        trigger: SyncTrigger,
        repositories: &[String],
        started_at: DateTime<Utc>,
    ) -> Result<SyncRunId, PersistenceError>;

    /// Finalises a run that is still `RUNNING`. Returns whether it matched.
    ///
    /// # Errors
    ///
    /// Returns [`PersistenceError`] when the write fails.
    fn finalize_sync_run(
        &self,
        run_id: SyncRunId,
        outcome: &SyncRunOutcome,
    ) -> Result<bool, PersistenceError>;

    /// Loads a sync run.
    ///
    /// # Errors
    ///
    /// Returns [`PersistenceError`] when the query fails or a stored value is
    /// invalid.
    fn sync_run(&self, run_id: SyncRunId) -> Result<Option<SyncRunRecord>, PersistenceError>;

    /// Lists a viewer's open pull requests, highest score first.
    ///
    /// # Errors
    ///
    /// Returns [`PersistenceError`] when the query fails.
    fn attention_entries(&self, viewer_login: &str)
    -> Result<Vec<AttentionEntry>, PersistenceError>;
}
