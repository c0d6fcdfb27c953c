use std::path::PathBuf;
use thiserror::Error;

/// Errors produced while establishing or using the database connection.
#[derive(Error, Debug)]
pub enum DbError {
    #[error("Invalid database settings: {0}")]
    Settings(#[from] configuration::error::ConfigError),

    #[error("Database query failed: {0}")]
    Query(#[from] sqlx::Error),

    #[error("Could not connect to the database after {attempts} attempts")]
    RetriesExhausted { attempts: u32 },
}

/// Errors produced by the schema migration engine.
///
/// Catalog errors (everything up to and including `CurrentAheadOfTarget`)
/// are fatal and surface before any schema mutation happens; they mean the
/// migration scripts, or the database's recorded position, need fixing.
#[derive(Error, Debug)]
pub enum MigrationError {
    #[error("Found multiple revisions {0}")]
    DuplicateRevision(String),

    #[error("Multiple revisions depend on {}", .depends_on.as_deref().unwrap_or("<none>"))]
    MultipleDependents { depends_on: Option<String> },

    #[error("Cannot find first migration in chain")]
    NoHead,

    #[error("Migration chain is broken after {after}")]
    BrokenChain { after: String },

    #[error("Cannot find current revision {0} in migration files")]
    UnknownCurrentRevision(String),

    #[error("Current revision {current} is ahead of target revision {target}")]
    CurrentAheadOfTarget { current: String, target: String },

    #[error("Migration script location should be specified explicitly")]
    MissingScriptLocation,

    #[error("Failed to read migration catalog at {path}: {source}")]
    Catalog {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Invalid migration script {path}: {reason}")]
    InvalidScript { path: PathBuf, reason: String },

    #[error("Database error while migrating: {0}")]
    Database(#[from] sqlx::Error),
}
