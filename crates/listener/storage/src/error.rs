use thiserror::Error;

/// Errors that may occur while interacting with log storage.
///
/// This enum is used across all implementations of the storage traits.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StorageError {
    /// The stored version no longer matches the version the caller read.
    #[error("version conflict for log {id} in {source_id}: expected {expected}, found {found}")]
    Conflict {
        /// Source the log belongs to.
        source_id: String,
        /// Identifier of the log.
        id: String,
        /// Version the caller based its write on.
        expected: u64,
        /// Version currently stored.
        found: u64,
    },

    /// The expected record was not found in the store.
    #[error("log {id} not found in {source_id}")]
    NotFound {
        /// Source the log belongs to.
        source_id: String,
        /// Identifier of the log.
        id: String,
    },

    /// The store could not be reached.
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

impl StorageError {
    /// Returns `true` for an optimistic-lock version mismatch.
    pub const fn is_conflict(&self) -> bool {
        matches!(self, Self::Conflict { .. })
    }

    /// Returns `true` if the record vanished.
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}
