//! Tracked repository rows.

use chrono::{DateTime, Utc};
use diesel::QueryableByName;
use diesel::RunQueryDsl;
use diesel::sql_query;
use diesel::sql_types::{BigInt, Nullable, Text};
use diesel::sqlite::SqliteConnection;

use crate::github::RepositoryLocator;
use crate::persistence::PersistenceError;
use crate::persistence::model::{NewTrackedRepository, Provenance, TrackedRepository};

use super::{map_query_error, map_write_error, parse_timestamp};

#[derive(Debug, QueryableByName)]
struct TrackedRow {
    #[diesel(sql_type = BigInt)]
    id: i64,
    #[diesel(sql_type = Text)]
    viewer_login: String,
    #[diesel(sql_type = Text)]
    owner: String,
    #[diesel(sql_type = Text)]
    name: String,
    #[diesel(sql_type = Nullable<Text>)]
    default_branch: Option<String>,
    #[diesel(sql_type = Text)]
    provenance: String,
    #[diesel(sql_type = Nullable<Text>)]
    last_synced_at: Option<String>,
}

impl TryFrom<TrackedRow> for TrackedRepository {
    type Error = PersistenceError;

    fn try_from(row: TrackedRow) -> Result<Self, Self::Error> {
        let locator = RepositoryLocator::from_owner_repo(&row.owner, &row.name).map_err(|_error| {
            PersistenceError::CorruptValue {
                field: "tracked_repositories.owner",
                value: format!("{}/{}", row.owner, row.name),
            }
        })?;
        let last_synced_at = row
            .last_synced_at
            .as_deref()
            .map(|value| parse_timestamp("tracked_repositories.last_synced_at", value))
            .transpose()?;

        Ok(Self {
            id: row.id,
            viewer_login: row.viewer_login,
            locator,
            default_branch: row.default_branch,
            provenance: Provenance::parse(&row.provenance)?,
            last_synced_at,
        })
    }
}

const SELECT_COLUMNS: &str =
    "SELECT id, viewer_login, owner, name, default_branch, provenance, last_synced_at \
     FROM tracked_repositories";

pub(super) fn list_tracked(
    connection: &mut SqliteConnection,
    viewer_login: &str,
) -> Result<Vec<TrackedRepository>, PersistenceError> {
    let rows: Vec<TrackedRow> = sql_query(format!(
        "{SELECT_COLUMNS} WHERE viewer_login = ? AND tracked = 1 ORDER BY full_name;"
    ))
    .bind::<Text, _>(viewer_login)
    .load(connection)
    .map_err(|error| map_query_error(connection, &error))?;

    rows.into_iter().map(TrackedRepository::try_from).collect()
}

/// Whether the viewer has ever tracked anything, soft-removed rows included.
pub(super) fn has_history(
    connection: &mut SqliteConnection,
    viewer_login: &str,
) -> Result<bool, PersistenceError> {
    #[derive(Debug, QueryableByName)]
    struct Row {
        #[diesel(sql_type = BigInt)]
        present: i64,
    }

    let row: Row = sql_query(
        "SELECT EXISTS(SELECT 1 FROM tracked_repositories WHERE viewer_login = ?) AS present;",
    )
    .bind::<Text, _>(viewer_login)
    .get_result(connection)
    .map_err(|error| map_query_error(connection, &error))?;

    Ok(row.present != 0)
}

pub(super) fn upsert(
    connection: &mut SqliteConnection,
    repository: &NewTrackedRepository,
) -> Result<TrackedRepository, PersistenceError> {
    let full_name = repository.locator.full_name();

    // An explicit request upgrades a seeded row; seeding never downgrades.
    sql_query(
        "INSERT INTO tracked_repositories \
         (viewer_login, owner, name, full_name, default_branch, provenance, tracked) \
         VALUES (?, ?, ?, ?, ?, ?, 1) \
         ON CONFLICT(viewer_login, full_name) DO UPDATE SET \
           tracked = 1, \
           provenance = CASE WHEN excluded.provenance = 'EXPLICIT' \
             THEN 'EXPLICIT' ELSE tracked_repositories.provenance END, \
           default_branch = COALESCE(excluded.default_branch, tracked_repositories.default_branch), \
           updated_at = CURRENT_TIMESTAMP;",
    )
    .bind::<Text, _>(&repository.viewer_login)
    .bind::<Text, _>(repository.locator.owner().as_str())
    .bind::<Text, _>(repository.locator.name().as_str())
    .bind::<Text, _>(&full_name)
    .bind::<Nullable<Text>, _>(repository.default_branch.as_deref())
    .bind::<Text, _>(repository.provenance.as_str())
    .execute(connection)
    .map_err(|error| map_write_error(connection, &error))?;

    let row: TrackedRow = sql_query(format!(
        "{SELECT_COLUMNS} WHERE viewer_login = ? AND full_name = ? LIMIT 1;"
    ))
    .bind::<Text, _>(&repository.viewer_login)
    .bind::<Text, _>(&full_name)
    .get_result(connection)
    .map_err(|error| map_query_error(connection, &error))?;

    TrackedRepository::try_from(row)
}

pub(super) fn untrack(
    connection: &mut SqliteConnection,
    viewer_login: &str,
    full_name: &str,
) -> Result<bool, PersistenceError> {
    let affected = sql_query(
        "UPDATE tracked_repositories SET tracked = 0, updated_at = CURRENT_TIMESTAMP \
         WHERE viewer_login = ? AND full_name = ? AND tracked = 1;",
    )
    .bind::<Text, _>(viewer_login)
    .bind::<Text, _>(full_name)
    .execute(connection)
    .map_err(|error| map_write_error(connection, &error))?;

    Ok(affected > 0)
}

pub(super) fn record_sync(
    connection: &mut SqliteConnection,
    repository_id: i64,
    default_branch: &str,
    synced_at: DateTime<Utc>,
) -> Result<(), PersistenceError> {
    let affected = sql_query(
        "UPDATE tracked_repositories \
         SET default_branch = ?, last_synced_at = ?, updated_at = CURRENT_TIMESTAMP \
         WHERE id = ?;",
    )
    .bind::<Text, _>(default_branch)
    .bind::<Text, _>(synced_at.to_rfc3339())
    .bind::<BigInt, _>(repository_id)
    .execute(connection)
    .map_err(|error| map_write_error(connection, &error))?;

    if affected == 0 {
        return Err(PersistenceError::WriteFailed {
            message: format!("tracked repository {repository_id} does not exist"),
        });
    }
    Ok(())
}
