//! Store error type.

/// Failures of the local database layer.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// No row matched the lookup key.
    #[error("not found")]
    NotFound,
    /// Underlying SQLite failure.
    #[error("sqlite: {0}")]
    Sqlite(#[from] rusqlite::Error),
    /// A stored column did not parse back into its domain type.
    #[error("corrupt row: {0}")]
    Decode(String),
}

impl StoreError {
    pub(crate) fn from_query(e: rusqlite::Error) -> Self {
        match e {
            rusqlite::Error::QueryReturnedNoRows => Self::NotFound,
            other => Self::Sqlite(other),
        }
    }
}
