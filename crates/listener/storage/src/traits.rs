use crate::StorageError;
use async_trait::async_trait;
use log_listener_types::LogEvent;
use std::fmt::Debug;

/// Provides read access to the log records of a source.
///
/// Implementations are expected to be thread-safe; reconciliation passes for different blocks may
/// read the same source concurrently.
#[async_trait]
pub trait LogEventReader: Debug + Send + Sync {
    /// Returns all [`Pending`](log_listener_types::LogEventStatus::Pending) logs of `source_id`.
    ///
    /// The order of the returned records is not significant.
    async fn find_pending_logs(&self, source_id: &str) -> Result<Vec<LogEvent>, StorageError>;

    /// Looks up a single log record.
    ///
    /// # Returns
    /// * `Ok(Some(LogEvent))` with the freshest stored version of the record.
    /// * `Ok(None)` if no such record exists.
    /// * `Err(StorageError)` if the store could not be queried.
    async fn find_log_event(
        &self,
        source_id: &str,
        id: &str,
    ) -> Result<Option<LogEvent>, StorageError>;
}

/// Provides conditional write access to the log records of a source.
#[async_trait]
pub trait LogEventWriter: Debug + Send + Sync {
    /// Persists `event` if the stored record still carries `event.version`.
    ///
    /// # Returns
    /// * `Ok(LogEvent)` containing the stored record with its new version.
    /// * `Err(StorageError::Conflict)` if the record was written by someone else since it was read.
    /// * `Err(StorageError::NotFound)` if the record no longer exists.
    async fn save(&self, source_id: &str, event: LogEvent) -> Result<LogEvent, StorageError>;
}
