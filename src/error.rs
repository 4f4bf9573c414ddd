//! Error types for the catalog and its database façade.

use std::io;
use std::path::PathBuf;

/// Result type alias for catalog operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Main error enum.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Opening, creating or copying a database file failed.
    #[error("IO error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The engine rejected or failed a statement.
    #[error("Query failed: {source} (sql: {sql})")]
    Query {
        sql: String,
        #[source]
        source: rusqlite::Error,
    },

    /// A query expected to yield at most one row yielded more.
    #[error("Query returned more than one row (sql: {sql})")]
    TooManyRows { sql: String },

    /// A snapshot would be copied onto itself.
    #[error("Snapshot '{dataset}-{label}' cannot be both source and target")]
    SnapshotOverlap { dataset: String, label: String },

    /// A snapshot, table or column does not exist.
    #[error("Not found: {0}")]
    NotFound(String),

    /// The façade has been closed, or was never opened.
    #[error("Database is closed")]
    Closed,

    /// A table does not have the shape its definition requires.
    #[error("Table '{table}' violates its schema: {reason}")]
    Schema { table: String, reason: String },

    /// The blocking task running a statement panicked or was cancelled.
    #[error("Database task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

impl Error {
    pub(crate) fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn query(sql: &str, source: rusqlite::Error) -> Self {
        Self::Query {
            sql: sql.to_string(),
            source,
        }
    }

    /// True for engine-reported statement failures, including constraint violations.
    pub fn is_query(&self) -> bool {
        matches!(self, Self::Query { .. } | Self::TooManyRows { .. })
    }
}
