//! Partitioning of pending logs against the transactions of a block.
//!
//! A pending log can be tied to a block transaction in two ways:
//! - by exact transaction hash, meaning the producing transaction itself is in the block;
//! - by `(sender, nonce)`, meaning some transaction occupies the nonce slot of the producing one.
//!
//! For each transaction the second group excludes the first, so the transaction that produced a
//! log is never also reported as displacing it.

use alloy_primitives::{Address, TxHash};
use log_listener_types::{LogEvent, TxIdentity};
use std::collections::{HashMap, HashSet};

/// Logs of a block transaction, grouped by how they are tied to it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionMatches<'a> {
    /// The transaction the logs were matched against.
    pub tx: TxIdentity,
    /// Logs whose transaction hash equals the transaction's hash.
    pub exact: Vec<&'a LogEvent>,
    /// Logs sharing the transaction's `(sender, nonce)` slot but not its hash.
    pub displaced: Vec<&'a LogEvent>,
}

impl TransactionMatches<'_> {
    /// Returns `true` if no log is tied to the transaction.
    pub fn is_empty(&self) -> bool {
        self.exact.is_empty() && self.displaced.is_empty()
    }
}

/// Lookup tables over a set of candidate logs.
#[derive(Debug)]
pub struct IdentityMatcher<'a> {
    by_hash: HashMap<TxHash, Vec<&'a LogEvent>>,
    by_sender_nonce: HashMap<(Address, u64), Vec<&'a LogEvent>>,
}

impl<'a> IdentityMatcher<'a> {
    /// Indexes `logs` by transaction hash and by `(sender, nonce)`.
    ///
    /// Input order is preserved within every group.
    pub fn new(logs: &'a [LogEvent]) -> Self {
        let mut by_hash: HashMap<_, Vec<_>> = HashMap::new();
        let mut by_sender_nonce: HashMap<_, Vec<_>> = HashMap::new();
        for log in logs {
            by_hash.entry(log.transaction_hash).or_default().push(log);
            by_sender_nonce.entry(log.sender_nonce()).or_default().push(log);
        }
        Self { by_hash, by_sender_nonce }
    }

    /// Groups the indexed logs tied to `tx`.
    pub fn matches(&self, tx: &TxIdentity) -> TransactionMatches<'a> {
        let exact = self.by_hash.get(&tx.hash).cloned().unwrap_or_default();
        let exact_ids: HashSet<&str> = exact.iter().map(|log| log.id.as_str()).collect();
        let displaced: Vec<&'a LogEvent> = self
            .by_sender_nonce
            .get(&tx.sender_nonce())
            .map(|logs| {
                logs.iter().copied().filter(|log| !exact_ids.contains(log.id.as_str())).collect()
            })
            .unwrap_or_default();

        TransactionMatches { tx: *tx, exact, displaced }
    }
}

/// Matches `logs` against every transaction of a block, in block order.
///
/// Returns one entry per transaction, including transactions no log is tied to. Logs tied to no
/// transaction do not appear in the result.
pub fn match_block<'a>(txs: &[TxIdentity], logs: &'a [LogEvent]) -> Vec<TransactionMatches<'a>> {
    let matcher = IdentityMatcher::new(logs);
    txs.iter().map(|tx| matcher.matches(tx)).collect()
}
