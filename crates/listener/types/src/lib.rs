//! Core types shared across the pending log listener components.
//!
//! This crate defines the log record tracked while its transaction is not yet irreversible, its
//! lifecycle status, and the block shape that reconciliation consumes.

mod status;
pub use status::{LogEventStatus, UnknownStatus};

mod log;
pub use log::LogEvent;

mod block;
pub use block::{Block, MalformedBlockError, Transaction, TxField, TxIdentity};
