//! Storage contract for pending log records.
//!
//! Reconciliation only needs three operations from a store: listing the pending logs of a source,
//! a point lookup, and a conditional write guarded by the record version. They are split into
//! [`LogEventReader`] and [`LogEventWriter`] so components can depend on the narrowest access
//! they need.

mod error;
pub use error::StorageError;

mod traits;
pub use traits::{LogEventReader, LogEventWriter};

mod memory;
pub use memory::InMemoryLogStore;
