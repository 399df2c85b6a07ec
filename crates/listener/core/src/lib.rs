//! Reconciliation of pending logs against newly observed blocks.
//!
//! When a block arrives, every pending log tied to one of its transactions is retired: logs of the
//! transaction itself become [`Inactive`](log_listener_types::LogEventStatus::Inactive), logs of
//! another transaction that held the same `(sender, nonce)` slot become
//! [`Dropped`](log_listener_types::LogEventStatus::Dropped). See [`PendingLogReconciler`].

mod config;
pub use config::ReconcilerConfig;

mod error;
pub use error::ReconcileError;

mod matcher;
pub use matcher::{IdentityMatcher, TransactionMatches, match_block};

mod metrics;

/// Contains the [`PendingLogReconciler`] and transition planning.
mod reconciler;
pub use reconciler::{PendingLogReconciler, Transition, plan_transitions};
