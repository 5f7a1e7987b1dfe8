use thiserror::Error;

/// Errors surfaced by databases, statements and row iterators.
///
/// Every engine failure is propagated to the immediate caller; nothing is retried.
#[derive(Debug, Error)]
pub enum SqliteShimError {
    /// A parameter could not be bound (too many values, slot out of range, overflow).
    #[error("Parameter binding error: {0}")]
    BindError(String),

    /// The engine reported a column type tag this layer cannot decode.
    #[error("Unsupported column type {tag} for column '{column}'")]
    UnsupportedColumnType { column: String, tag: i32 },

    /// A scalar call or a first/last access found no rows.
    #[error("Query returned no rows: {0}")]
    EmptyResult(String),

    /// A scalar call received something other than a single usable value.
    #[error("Scalar query error: {0}")]
    ScalarQueryError(String),

    /// Malformed SQL, constraint violations and every other engine failure.
    #[error("SQL execution error: {0}")]
    ExecutionError(#[source] rusqlite::Error),

    /// The database (or the derived statement/cursor) has already been closed.
    #[error("Handle is closed: {0}")]
    ClosedHandle(String),

    #[error("Connection error: {0}")]
    ConnectionError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, SqliteShimError>;

impl From<rusqlite::Error> for SqliteShimError {
    fn from(err: rusqlite::Error) -> Self {
        match err {
            rusqlite::Error::InvalidParameterCount(given, expected) => {
                SqliteShimError::BindError(format!(
                    "statement expects {expected} parameters but {given} were supplied"
                ))
            }
            rusqlite::Error::InvalidParameterName(name) => {
                SqliteShimError::BindError(format!("unknown parameter name {name}"))
            }
            other => SqliteShimError::ExecutionError(other),
        }
    }
}

impl SqliteShimError {
    /// `true` for [`SqliteShimError::ClosedHandle`].
    #[must_use]
    pub fn is_closed_handle(&self) -> bool {
        matches!(self, SqliteShimError::ClosedHandle(_))
    }
}
