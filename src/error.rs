//! Error types for capstone.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("failed to load config: {0}")]
    Config(#[from] envconfig::Error),

    #[error("failed to open database: {0}")]
    ConnectionOpen(#[source] sqlx::Error),

    #[error("failed to ping database: {0}")]
    ConnectionPing(#[source] sqlx::Error),

    #[error("cannot resolve absolute path for {}: {source}", .path.display())]
    PathResolution {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("migration failed: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("telemetry error: {0}")]
    Telemetry(String),

    #[error("{0}")]
    Other(String),
}

impl Error {
    /// True for failures to open or ping the database.
    pub fn is_connection(&self) -> bool {
        matches!(self, Error::ConnectionOpen(_) | Error::ConnectionPing(_))
    }
}

pub type Result<T> = std::result::Result<T, Error>;
