//! The persisted log event record.

use crate::LogEventStatus;
use alloy_primitives::{Address, B256, Bytes, TxHash};
use serde::{Deserialize, Serialize};

/// A previously recorded occurrence of a contract event.
///
/// Records are partitioned by a source identifier (e.g. a collection or contract) that is not part
/// of the record itself; `id` is unique within that source and stays stable across status
/// transitions. `version` is owned by the store and used for optimistic concurrency control.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogEvent {
    /// Identifier of the record within its source.
    pub id: String,
    /// The event signature the log matched.
    pub topic: B256,
    /// Hash of the transaction that produced the log, as last known.
    pub transaction_hash: TxHash,
    /// Sender of the producing transaction.
    pub from: Address,
    /// Sender nonce of the producing transaction.
    #[serde(with = "alloy_serde::quantity")]
    pub nonce: u64,
    /// Lifecycle status.
    pub status: LogEventStatus,
    /// Whether the record shows up in read views.
    pub visible: bool,
    /// Store revision, bumped on every successful write.
    #[serde(default)]
    pub version: u64,
    /// Contract that emitted the log.
    #[serde(default)]
    pub address: Address,
    /// Number of the block the log was last seen in.
    #[serde(default, skip_serializing_if = "Option::is_none", with = "alloy_serde::quantity::opt")]
    pub block_number: Option<u64>,
    /// Hash of the block the log was last seen in.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub block_hash: Option<B256>,
    /// Position of the log within the block.
    #[serde(default, skip_serializing_if = "Option::is_none", with = "alloy_serde::quantity::opt")]
    pub log_index: Option<u64>,
    /// Position of the log among the logs of its transaction matching the same topic.
    #[serde(default)]
    pub index: u32,
    /// Sub-position for logs that expand into several records.
    #[serde(default)]
    pub minor_log_index: u32,
    /// Raw log data.
    #[serde(default)]
    pub data: Bytes,
}

impl LogEvent {
    /// Creates a new pending, visible log event with the given identity.
    pub fn pending(
        id: impl Into<String>,
        topic: B256,
        transaction_hash: TxHash,
        from: Address,
        nonce: u64,
    ) -> Self {
        Self {
            id: id.into(),
            topic,
            transaction_hash,
            from,
            nonce,
            status: LogEventStatus::Pending,
            visible: true,
            version: 0,
            address: Address::ZERO,
            block_number: None,
            block_hash: None,
            log_index: None,
            index: 0,
            minor_log_index: 0,
            data: Bytes::new(),
        }
    }

    /// The `(sender, nonce)` pair of the producing transaction.
    pub const fn sender_nonce(&self) -> (Address, u64) {
        (self.from, self.nonce)
    }

    /// Returns `true` if the log is still pending.
    pub const fn is_pending(&self) -> bool {
        self.status.is_pending()
    }

    /// Returns the log moved to `status`.
    ///
    /// Hidden statuses always clear `visible`.
    pub fn with_status(mut self, status: LogEventStatus) -> Self {
        self.status = status;
        if status.is_hidden() {
            self.visible = false;
        }
        self
    }
}
