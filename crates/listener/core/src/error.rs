use log_listener_storage::StorageError;
use log_listener_types::MalformedBlockError;
use thiserror::Error;

/// Errors that abort a reconciliation pass.
///
/// Version conflicts and vanished records are handled inside the pass and only surface here once
/// the retry bound is exhausted.
#[derive(Debug, Error)]
pub enum ReconcileError {
    /// The source identifier was empty.
    #[error("source identifier must not be empty")]
    EmptySource,

    /// The block contains a transaction without hash, sender or nonce.
    #[error(transparent)]
    MalformedBlock(#[from] MalformedBlockError),

    /// The log store failed.
    #[error(transparent)]
    Storage(#[from] StorageError),

    /// The record kept changing under concurrent writers.
    #[error("log {id} in {source_id} still conflicting after {retries} retries")]
    Contention {
        /// Source the log belongs to.
        source_id: String,
        /// Identifier of the log.
        id: String,
        /// Number of retries performed.
        retries: usize,
    },
}
