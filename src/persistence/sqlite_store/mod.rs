//! `SQLite` implementation of [`SyncStore`].
//!
//! Every operation opens its own connection with foreign keys enabled, so the
//! store is cheap to share between tasks. Writes use `ON CONFLICT ... DO
//! UPDATE` against the natural keys, which keeps repeated syncs idempotent.

mod pull_requests;
mod repositories;
mod sync_runs;

use chrono::{DateTime, Utc};
use diesel::OptionalExtension;
use diesel::QueryableByName;
use diesel::RunQueryDsl;
use diesel::sql_query;
use diesel::sql_types::{BigInt, Text};
use diesel::sqlite::SqliteConnection;

use crate::attention::AttentionAssessment;

use super::PersistenceError;
use super::migrator::open_connection;
use super::model::{
    AttentionEntry, NewTrackedRepository, PullRequestRecord, SyncRunId, SyncRunOutcome,
    SyncRunRecord, SyncTrigger, TrackedRepository,
};
use super::store::SyncStore;

/// Table whose presence indicates the sync schema has been migrated.
const SENTINEL_TABLE: &str = "sync_runs";

/// SQLite-backed sync store.
#[derive(Debug, Clone)]
pub struct SqliteSyncStore {
    database_url: String,
}

impl SqliteSyncStore {
    /// Creates a store targeting `database_url`.
    ///
    /// # Errors
    ///
    /// Returns [`PersistenceError::BlankDatabaseUrl`] when the URL is blank.
    pub fn new(database_url: impl Into<String>) -> Result<Self, PersistenceError> {
        let database_url_string = database_url.into();
        if database_url_string.trim().is_empty() {
            return Err(PersistenceError::BlankDatabaseUrl);
        }
        Ok(Self {
            database_url: database_url_string,
        })
    }

    fn connect(&self) -> Result<SqliteConnection, PersistenceError> {
        open_connection(self.database_url.trim())
    }
}

impl SyncStore for SqliteSyncStore {
    fn tracked_repositories(
        &self,
        viewer_login: &str,
    ) -> Result<Vec<TrackedRepository>, PersistenceError> {
        let mut connection = self.connect()?;
        repositories::list_tracked(&mut connection, viewer_login)
    }

    fn has_tracking_history(&self, viewer_login: &str) -> Result<bool, PersistenceError> {
        let mut connection = self.connect()?;
        repositories::has_history(&mut connection, viewer_login)
    }

    fn upsert_tracked_repository(
        &self,
        repository: &NewTrackedRepository,
    ) -> Result<TrackedRepository, PersistenceError> {
        let mut connection = self.connect()?;
        repositories::upsert(&mut connection, repository)
    }

    fn untrack_repository(
        &self,
        viewer_login: &str,
        full_name: &str,
    ) -> Result<bool, PersistenceError> {
        let mut connection = self.connect()?;
        repositories::untrack(&mut connection, viewer_login, full_name)
    }

    fn record_repository_sync(
        &self,
        repository_id: i64,
        default_branch: &str,
        synced_at: DateTime<Utc>,
    ) -> Result<(), PersistenceError> {
        let mut connection = self.connect()?;
        repositories::record_sync(&mut connection, repository_id, default_branch, synced_at)
    }

    fn upsert_pull_request(
        &self,
        record: &PullRequestRecord,
        attention: &AttentionAssessment,
    ) -> Result<(), PersistenceError> {
        let mut connection = self.connect()?;
        pull_requests::upsert_with_attention(&mut connection, record, attention)
    }

    fn create_sync_run(
        &self,
        trigger: SyncTrigger,
        repositories: &[String],
        started_at: DateTime<Utc>,
    ) -> Result<SyncRunId, PersistenceError> {
        let mut connection = self.connect()?;
        sync_runs::create(&mut connection, trigger, repositories, started_at)
    }

    fn finalize_sync_run(
        &self,
        run_id: SyncRunId,
        outcome: &SyncRunOutcome,
    ) -> Result<bool, PersistenceError> {
        let mut connection = self.connect()?;
        sync_runs::finalize(&mut connection, run_id, outcome)
    }

    fn sync_run(&self, run_id: SyncRunId) -> Result<Option<SyncRunRecord>, PersistenceError> {
        let mut connection = self.connect()?;
        sync_runs::load(&mut connection, run_id)
    }

    fn attention_entries(
        &self,
        viewer_login: &str,
    ) -> Result<Vec<AttentionEntry>, PersistenceError> {
        let mut connection = self.connect()?;
        pull_requests::attention_entries(&mut connection, viewer_login)
    }
}

fn schema_exists(connection: &mut SqliteConnection) -> Result<bool, diesel::result::Error> {
    #[derive(Debug, QueryableByName)]
    struct Row {
        #[diesel(sql_type = BigInt)]
        one: i64,
    }

    let exists: Option<Row> =
        sql_query("SELECT 1 AS one FROM sqlite_master WHERE type = 'table' AND name = ? LIMIT 1;")
            .bind::<Text, _>(SENTINEL_TABLE)
            .get_result(connection)
            .optional()?;

    Ok(exists.is_some_and(|row| row.one == 1))
}

fn map_error_with_schema_check<F>(
    connection: &mut SqliteConnection,
    error: &diesel::result::Error,
    create_error: F,
) -> PersistenceError
where
    F: Fn(String) -> PersistenceError,
{
    match schema_exists(connection) {
        Ok(false) => PersistenceError::SchemaNotInitialised,
        Ok(true) => create_error(error.to_string()),
        Err(check_error) => create_error(format!(
            "schema presence check failed: {check_error}; original error: {error}"
        )),
    }
}

fn map_query_error(
    connection: &mut SqliteConnection,
    error: &diesel::result::Error,
) -> PersistenceError {
    map_error_with_schema_check(connection, error, |message| {
        PersistenceError::QueryFailed { message }
    })
}

fn map_write_error(
    connection: &mut SqliteConnection,
    error: &diesel::result::Error,
) -> PersistenceError {
    map_error_with_schema_check(connection, error, |message| {
        PersistenceError::WriteFailed { message }
    })
}

fn to_i64(value: u64) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}

fn to_u64(value: i64) -> u64 {
    u64::try_from(value).unwrap_or(0)
}

fn parse_timestamp(
    field: &'static str,
    value: &str,
) -> Result<DateTime<Utc>, PersistenceError> {
    DateTime::parse_from_rfc3339(value)
        .map(|parsed| parsed.with_timezone(&Utc))
        .map_err(|_error| PersistenceError::CorruptValue {
            field,
            value: value.to_owned(),
        })
}

#[cfg(test)]
mod tests;
