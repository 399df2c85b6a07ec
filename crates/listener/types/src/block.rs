//! Block and transaction shapes consumed by reconciliation.

use alloy_primitives::{Address, B256, TxHash};
use derive_more::Constructor;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A transaction as returned by a block data source.
///
/// Fields are optional because data sources may hand out partially populated transaction
/// objects. Use [`Block::identities`] to obtain validated [`TxIdentity`] values.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    /// Transaction hash.
    #[serde(default)]
    pub hash: Option<TxHash>,
    /// Sender address.
    #[serde(default)]
    pub from: Option<Address>,
    /// Sender nonce.
    #[serde(default, with = "alloy_serde::quantity::opt")]
    pub nonce: Option<u64>,
}

impl From<TxIdentity> for Transaction {
    fn from(tx: TxIdentity) -> Self {
        Self { hash: Some(tx.hash), from: Some(tx.from), nonce: Some(tx.nonce) }
    }
}

/// A block with its ordered transaction list.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Block {
    /// Block number.
    #[serde(with = "alloy_serde::quantity")]
    pub number: u64,
    /// Block hash.
    pub hash: B256,
    /// Transactions in block order.
    #[serde(default)]
    pub transactions: Vec<Transaction>,
}

impl Block {
    /// Validates every transaction and returns their identities in block order.
    ///
    /// Fails on the first transaction missing its hash, sender or nonce, so that no part of a
    /// malformed block is ever processed.
    pub fn identities(&self) -> Result<Vec<TxIdentity>, MalformedBlockError> {
        self.transactions
            .iter()
            .enumerate()
            .map(|(tx_index, tx)| -> Result<TxIdentity, MalformedBlockError> {
                let missing = |field: TxField| MalformedBlockError {
                    block_number: self.number,
                    tx_index,
                    field,
                };
                Ok(TxIdentity {
                    hash: tx.hash.ok_or_else(|| missing(TxField::Hash))?,
                    from: tx.from.ok_or_else(|| missing(TxField::From))?,
                    nonce: tx.nonce.ok_or_else(|| missing(TxField::Nonce))?,
                })
            })
            .collect()
    }
}

/// The validated identity of a transaction: its hash and its `(sender, nonce)` slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Constructor)]
pub struct TxIdentity {
    /// Transaction hash.
    pub hash: TxHash,
    /// Sender address.
    pub from: Address,
    /// Sender nonce.
    pub nonce: u64,
}

impl TxIdentity {
    /// The `(sender, nonce)` slot occupied by the transaction.
    pub const fn sender_nonce(&self) -> (Address, u64) {
        (self.from, self.nonce)
    }
}

/// A transaction field required by reconciliation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, derive_more::Display)]
pub enum TxField {
    /// The transaction hash.
    #[display("hash")]
    Hash,
    /// The sender address.
    #[display("from")]
    From,
    /// The sender nonce.
    #[display("nonce")]
    Nonce,
}

/// A block transaction is missing a field required for reconciliation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("transaction {tx_index} of block {block_number} is missing `{field}`")]
pub struct MalformedBlockError {
    /// Number of the offending block.
    pub block_number: u64,
    /// Position of the offending transaction in the block.
    pub tx_index: usize,
    /// The missing field.
    pub field: TxField,
}
