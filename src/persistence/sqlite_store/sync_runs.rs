//! Sync run rows.

use chrono::{DateTime, Utc};
use diesel::OptionalExtension;
use diesel::QueryableByName;
use diesel::RunQueryDsl;
use diesel::sql_query;
use diesel::sql_types::{BigInt, Nullable, Text};
use diesel::sqlite::SqliteConnection;

use crate::persistence::PersistenceError;
use crate::persistence::model::{
    SyncRunId, SyncRunOutcome, SyncRunRecord, SyncRunStatus, SyncTrigger,
};
use crate::sync::SyncIssue;

use super::{map_query_error, map_write_error, parse_timestamp, to_i64, to_u64};

#[derive(Debug, QueryableByName)]
struct LastIdRow {
    #[diesel(sql_type = BigInt)]
    id: i64,
}

#[derive(Debug, QueryableByName)]
struct RunRow {
    #[diesel(sql_type = BigInt)]
    id: i64,
    #[diesel(sql_type = Text)]
    trigger_kind: String,
    #[diesel(sql_type = Text)]
    status: String,
    #[diesel(sql_type = BigInt)]
    pulled_count: i64,
    #[diesel(sql_type = BigInt)]
    upserted_count: i64,
    #[diesel(sql_type = BigInt)]
    error_count: i64,
    #[diesel(sql_type = Text)]
    repositories: String,
    #[diesel(sql_type = Text)]
    errors: String,
    #[diesel(sql_type = Nullable<Text>)]
    finished_at: Option<String>,
}

impl TryFrom<RunRow> for SyncRunRecord {
    type Error = PersistenceError;

    fn try_from(row: RunRow) -> Result<Self, Self::Error> {
        let repositories: Vec<String> =
            serde_json::from_str(&row.repositories).map_err(|_error| {
                PersistenceError::CorruptValue {
                    field: "sync_runs.repositories",
                    value: row.repositories.clone(),
                }
            })?;
        let issues: Vec<SyncIssue> =
            serde_json::from_str(&row.errors).map_err(|_error| PersistenceError::CorruptValue {
                field: "sync_runs.errors",
                value: row.errors.clone(),
            })?;
        let finished_at = row
            .finished_at
            .as_deref()
            .map(|value| parse_timestamp("sync_runs.finished_at", value))
            .transpose()?;

        Ok(Self {
            id: SyncRunId(row.id),
            trigger: row.trigger_kind,
            status: SyncRunStatus::parse(&row.status)?,
            pulled: to_u64(row.pulled_count),
            upserted: to_u64(row.upserted_count),
            error_count: to_u64(row.error_count),
            repositories,
            issues,
            finished_at,
        })
    }
}

fn to_json<T: serde::Serialize + ?Sized>(value: &T) -> Result<String, PersistenceError> {
    serde_json::to_string(value).map_err(|error| PersistenceError::WriteFailed {
        message: format!("serialisation failed: {error}"),
    })
}

pub(super) fn create(
    connection: &mut SqliteConnection,
    trigger: SyncTrigger,
    repositories: &[String],
    started_at: DateTime<Utc>,
) -> Result<SyncRunId, PersistenceError> {
    let repositories_json = to_json(repositories)?;

    sql_query(
        "INSERT INTO sync_runs (trigger_kind, status, repositories, started_at) \
         VALUES (?, ?, ?, ?);",
    )
    .bind::<Text, _>(trigger.as_str())
    .bind::<Text, _>(SyncRunStatus::Running.as_str())
    .bind::<Text, _>(&repositories_json)
    .bind::<Text, _>(started_at.to_rfc3339())
    .execute(connection)
    .map_err(|error| map_write_error(connection, &error))?;

    let row: LastIdRow = sql_query("SELECT last_insert_rowid() AS id;")
        .get_result(connection)
        .map_err(|error| map_query_error(connection, &error))?;

    Ok(SyncRunId(row.id))
}

pub(super) fn finalize(
    connection: &mut SqliteConnection,
    run_id: SyncRunId,
    outcome: &SyncRunOutcome,
) -> Result<bool, PersistenceError> {
    if outcome.status == SyncRunStatus::Running {
        return Err(PersistenceError::WriteFailed {
            message: "a sync run cannot be finalised as RUNNING".to_owned(),
        });
    }
    let errors_json = to_json(&outcome.issues)?;
    let error_count = u64::try_from(outcome.issues.len()).unwrap_or(u64::MAX);

    let affected = sql_query(
        "UPDATE sync_runs \
         SET status = ?, pulled_count = ?, upserted_count = ?, error_count = ?, errors = ?, \
             finished_at = ? \
         WHERE id = ? AND status = 'RUNNING';",
    )
    .bind::<Text, _>(outcome.status.as_str())
    .bind::<BigInt, _>(to_i64(outcome.pulled))
    .bind::<BigInt, _>(to_i64(outcome.upserted))
    .bind::<BigInt, _>(to_i64(error_count))
    .bind::<Text, _>(&errors_json)
    .bind::<Text, _>(outcome.finished_at.to_rfc3339())
    .bind::<BigInt, _>(run_id.0)
    .execute(connection)
    .map_err(|error| map_write_error(connection, &error))?;

    Ok(affected > 0)
}

pub(super) fn load(
    connection: &mut SqliteConnection,
    run_id: SyncRunId,
) -> Result<Option<SyncRunRecord>, PersistenceError> {
    let row: Option<RunRow> = sql_query(
        "SELECT id, trigger_kind, status, pulled_count, upserted_count, error_count, \
                repositories, errors, finished_at \
         FROM sync_runs WHERE id = ? LIMIT 1;",
    )
    .bind::<BigInt, _>(run_id.0)
    .get_result(connection)
    .optional()
    .map_err(|error| map_query_error(connection, &error))?;

    row.map(SyncRunRecord::try_from).transpose()
}
