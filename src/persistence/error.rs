//! Error types for local persistence operations.

use thiserror::Error;

/// Errors returned by the `SQLite` store and its migrations.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum PersistenceError {
    /// No database URL/path was provided.
    #[error("database URL is required (use --database-url or BEACON_DATABASE_URL)")]
    MissingDatabaseUrl,

    /// The database URL/path was present but blank.
    #[error("database URL must not be blank")]
    BlankDatabaseUrl,

    /// Establishing a `SQLite` connection failed.
    #[error("failed to connect to SQLite database: {message}")]
    ConnectionFailed {
        /// Error detail from Diesel.
        message: String,
    },

    /// Running pending migrations failed.
    #[error("failed to run database migrations: {message}")]
    MigrationFailed {
        /// Error detail from Diesel migrations.
        message: String,
    },

    /// A connection pragma was rejected.
    #[error("failed to apply `{pragma}`: {message}")]
    PragmaFailed {
        /// Pragma statement that failed.
        pragma: &'static str,
        /// Error detail from `SQLite`.
        message: String,
    },

    /// Reading the schema version from the migration table failed.
    #[error("failed to read schema version after migrations: {message}")]
    SchemaVersionQueryFailed {
        /// Error detail from Diesel query execution.
        message: String,
    },

    /// The migrations completed but no schema version could be found.
    #[error("no schema version recorded after migrations ran")]
    MissingSchemaVersion,

    /// The sync tables do not exist yet.
    #[error("database schema is not initialised (run with --migrate-db first)")]
    SchemaNotInitialised,

    /// A read query failed.
    #[error("database query failed: {message}")]
    QueryFailed {
        /// Error detail from Diesel.
        message: String,
    },

    /// A write failed or affected an unexpected number of rows.
    #[error("database write failed: {message}")]
    WriteFailed {
        /// Error detail from Diesel.
        message: String,
    },

    /// A stored value could not be decoded.
    #[error("stored value for {field} is invalid: {value}")]
    CorruptValue {
        /// Column holding the value.
        field: &'static str,
        /// Value as stored.
        value: String,
    },
}
