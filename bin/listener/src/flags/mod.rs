//! CLI flags.

mod reconciler;
pub use reconciler::ReconcilerArgs;
