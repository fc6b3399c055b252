//! Diesel-backed migration runner for the local `SQLite` database.

use diesel::Connection;
use diesel::RunQueryDsl;
use diesel::sql_query;
use diesel::sqlite::SqliteConnection;
use diesel_migrations::{EmbeddedMigrations, MigrationHarness, embed_migrations};
use tracing::info;

use crate::telemetry::{TelemetryEvent, TelemetrySink};

use super::PersistenceError;

/// Migrations compiled into the binary.
pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

/// Version of the migration that creates the sync tables.
pub const INITIAL_SCHEMA_VERSION: &str = "20261019000000";

/// Latest schema version shipped with this build.
pub const CURRENT_SCHEMA_VERSION: &str = INITIAL_SCHEMA_VERSION;

const CONNECTION_PRAGMAS: [&str; 2] = [
    "PRAGMA foreign_keys = ON;",
    "PRAGMA busy_timeout = 5000;",
];

/// A Diesel migration version string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaVersion(String);

impl SchemaVersion {
    /// Returns the inner version string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Applies pending migrations and reports the resulting schema version.
///
/// The version is also recorded through `telemetry`, once per call, even
/// when nothing was pending.
///
/// # Errors
///
/// Returns [`PersistenceError`] when the database cannot be opened, a
/// migration fails, or no version can be read back afterwards.
pub fn migrate_database(
    database_url: &str,
    telemetry: &dyn TelemetrySink,
) -> Result<SchemaVersion, PersistenceError> {
    let target = database_url.trim();
    if target.is_empty() {
        return Err(PersistenceError::BlankDatabaseUrl);
    }

    let mut connection = open_connection(target)?;
    let applied = connection
        .run_pending_migrations(MIGRATIONS)
        .map_err(|error| PersistenceError::MigrationFailed {
            message: error.to_string(),
        })?
        .len();
    let schema_version = latest_applied_version(&mut connection)?;
    info!(
        applied,
        schema_version = schema_version.as_str(),
        "database migrations complete"
    );

    telemetry.record(TelemetryEvent::SchemaVersionRecorded {
        schema_version: schema_version.as_str().to_owned(),
    });
    Ok(schema_version)
}

/// Opens a connection with foreign keys enforced and a busy timeout set.
pub(super) fn open_connection(database_url: &str) -> Result<SqliteConnection, PersistenceError> {
    let mut connection = SqliteConnection::establish(database_url).map_err(|error| {
        PersistenceError::ConnectionFailed {
            message: error.to_string(),
        }
    })?;

    for pragma in CONNECTION_PRAGMAS {
        sql_query(pragma)
            .execute(&mut connection)
            .map_err(|error| PersistenceError::PragmaFailed {
                pragma,
                message: error.to_string(),
            })?;
    }
    Ok(connection)
}

fn latest_applied_version(
    connection: &mut SqliteConnection,
) -> Result<SchemaVersion, PersistenceError> {
    let applied = connection.applied_migrations().map_err(|error| {
        PersistenceError::SchemaVersionQueryFailed {
            message: error.to_string(),
        }
    })?;

    applied
        .into_iter()
        .max()
        .map(|version| SchemaVersion(version.to_string()))
        .ok_or(PersistenceError::MissingSchemaVersion)
}
