use thiserror::Error;

use crate::cursor::CursorState;

/// Failure reported by a collaborator (schema source, value source, accumulator or sink).
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Error {
    /// Database error or adapter failure.
    #[error("database error: {0}")]
    Db(String),
    /// Filesystem or stream failure.
    #[error("io error: {0}")]
    Io(String),
    /// The caller supplied something the collaborator cannot work with.
    #[error("invalid input: {0}")]
    InvalidInput(String),
    /// A requested feature is not supported by this variant.
    #[error("unsupported: {0}")]
    Unsupported(String),
    /// The code path exists but has no implementation for this variant.
    #[error("not implemented: {0}")]
    NotImplemented(String),
    /// Catch-all error for unexpected failures.
    #[error("other error: {0}")]
    Other(String),
}

impl From<std::io::Error> for Error {
    fn from(value: std::io::Error) -> Self {
        Error::Io(value.to_string())
    }
}

/// Convenience alias for results returned by collaborators.
pub type Result<T> = std::result::Result<T, Error>;

/// Coarse classification of a [`ProfileError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Schema,
    Extraction,
    Accumulation,
    Sink,
    InvalidState,
}

/// Failure of a profiling run, tagged with the table/column it happened on.
#[derive(Debug, Error)]
pub enum ProfileError {
    /// Listing the tables of the schema failed.
    #[error("schema error: listing tables failed: {source}")]
    Schema { source: Error },
    /// Listing the columns of a table failed.
    #[error("schema error: listing columns of '{table}' failed: {source}")]
    Columns { table: String, source: Error },
    /// Opening, reading or closing a column's value stream failed.
    #[error("extraction error on '{table}.{column}': {source}")]
    Extraction {
        table: String,
        column: String,
        source: Error,
    },
    /// The accumulator rejected a value or failed to produce a metric.
    #[error("accumulation error on '{table}.{column}': {source}")]
    Accumulation {
        table: String,
        column: String,
        source: Error,
    },
    /// The report sink failed to persist the finished report.
    #[error("sink error: {source}")]
    Sink { source: Error },
    /// The cursor accessor was used outside of a column position.
    #[error("invalid cursor state: {state:?}")]
    InvalidState { state: CursorState },
}

impl ProfileError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ProfileError::Schema { .. } | ProfileError::Columns { .. } => ErrorKind::Schema,
            ProfileError::Extraction { .. } => ErrorKind::Extraction,
            ProfileError::Accumulation { .. } => ErrorKind::Accumulation,
            ProfileError::Sink { .. } => ErrorKind::Sink,
            ProfileError::InvalidState { .. } => ErrorKind::InvalidState,
        }
    }

    /// The collaborator error this run failure wraps, if any.
    pub fn source_error(&self) -> Option<&Error> {
        match self {
            ProfileError::Schema { source }
            | ProfileError::Columns { source, .. }
            | ProfileError::Extraction { source, .. }
            | ProfileError::Accumulation { source, .. }
            | ProfileError::Sink { source } => Some(source),
            ProfileError::InvalidState { .. } => None,
        }
    }
}
