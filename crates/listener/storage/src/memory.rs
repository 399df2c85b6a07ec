//! A [`LogEventReader`] + [`LogEventWriter`] backed by process memory.

use crate::{LogEventReader, LogEventWriter, StorageError};
use async_trait::async_trait;
use log_listener_types::LogEvent;
use std::collections::HashMap;
use tokio::sync::RwLock;
use tracing::trace;

type LogKey = (String, String);

/// In-memory log store with per-record compare-and-swap on the version.
///
/// Used by tests and by the replay tool. Every successful write bumps the record version by one.
/// Reads return records ordered by id.
#[derive(Debug, Default)]
pub struct InMemoryLogStore {
    logs: RwLock<HashMap<LogKey, LogEvent>>,
}

impl InMemoryLogStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or replaces a record unconditionally, the way log discovery does.
    ///
    /// The stored version is one past the replaced record's version, or `event.version` for a
    /// new record. Returns the stored record.
    pub async fn insert(&self, source_id: &str, mut event: LogEvent) -> LogEvent {
        let mut logs = self.logs.write().await;
        let key = (source_id.to_string(), event.id.clone());
        if let Some(existing) = logs.get(&key) {
            event.version = existing.version + 1;
        }
        logs.insert(key, event.clone());
        event
    }

    /// Returns the stored record, if any.
    pub async fn get(&self, source_id: &str, id: &str) -> Option<LogEvent> {
        self.logs.read().await.get(&(source_id.to_string(), id.to_string())).cloned()
    }

    /// Returns every record of `source_id`, ordered by id.
    pub async fn logs(&self, source_id: &str) -> Vec<LogEvent> {
        let logs = self.logs.read().await;
        let mut out: Vec<_> = logs
            .iter()
            .filter(|((source, _), _)| source == source_id)
            .map(|(_, log)| log.clone())
            .collect();
        out.sort_by(|a, b| a.id.cmp(&b.id));
        out
    }

    /// Number of records across all sources.
    pub async fn len(&self) -> usize {
        self.logs.read().await.len()
    }

    /// Returns `true` if the store holds no records.
    pub async fn is_empty(&self) -> bool {
        self.logs.read().await.is_empty()
    }
}

#[async_trait]
impl LogEventReader for InMemoryLogStore {
    async fn find_pending_logs(&self, source_id: &str) -> Result<Vec<LogEvent>, StorageError> {
        let mut pending = self.logs(source_id).await;
        pending.retain(LogEvent::is_pending);
        Ok(pending)
    }

    async fn find_log_event(
        &self,
        source_id: &str,
        id: &str,
    ) -> Result<Option<LogEvent>, StorageError> {
        Ok(self.get(source_id, id).await)
    }
}

#[async_trait]
impl LogEventWriter for InMemoryLogStore {
    async fn save(&self, source_id: &str, mut event: LogEvent) -> Result<LogEvent, StorageError> {
        let mut logs = self.logs.write().await;
        let key = (source_id.to_string(), event.id.clone());
        let Some(stored) = logs.get_mut(&key) else {
            return Err(StorageError::NotFound { source_id: key.0, id: key.1 });
        };

        if stored.version != event.version {
            return Err(StorageError::Conflict {
                source_id: key.0,
                id: key.1,
                expected: event.version,
                found: stored.version,
            });
        }

        event.version += 1;
        trace!(
            target: "log_store",
            source_id,
            id = %event.id,
            version = event.version,
            status = %event.status,
            "Saved log event"
        );
        *stored = event.clone();
        Ok(event)
    }
}
