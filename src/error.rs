use std::fmt;

use thiserror::Error;

/// Which half of a delta was running when it failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Apply,
    Revert,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Apply => f.write_str("apply"),
            Direction::Revert => f.write_str("revert"),
        }
    }
}

#[derive(Debug, Error)]
pub enum Error {
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("column {table}.{column} already exists")]
    DuplicateColumn { table: String, column: String },

    #[error("column {table}.{column} does not exist")]
    MissingColumn { table: String, column: String },

    #[error("table {0} does not exist")]
    MissingTable(String),

    #[error("column {table}.{column} must follow {after}, which does not exist")]
    DependencyOrder {
        table: String,
        column: String,
        after: String,
    },

    #[error("invalid column definition: {0}")]
    InvalidColumn(String),

    #[error("invalid delta identifier: {0}")]
    InvalidDeltaId(String),

    #[error("delta {0} is declared more than once")]
    DuplicateDeltaId(String),

    #[error("unknown delta: {0}")]
    UnknownDelta(String),

    #[error("delta {id} failed during {direction}: {source}")]
    DeltaFailed {
        id: String,
        direction: Direction,
        #[source]
        source: Box<Error>,
    },

    #[error("not found")]
    NotFound,

    #[error("already exists")]
    AlreadyExists,

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("forbidden: {0}")]
    Forbidden(String),
}

impl Error {
    /// Identifier of the delta that failed, if this error came out of a log run.
    pub fn failed_delta(&self) -> Option<&str> {
        match self {
            Error::DeltaFailed { id, .. } => Some(id),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
