//! Contains subcommands for the listener.

mod reconcile;
pub use reconcile::ReconcileCommand;
