//! Configuration for the [`PendingLogReconciler`](crate::PendingLogReconciler).

use backon::ExponentialBuilder;
use std::time::Duration;

/// Tuning knobs for a reconciliation pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReconcilerConfig {
    /// How many times a conflicting update is reloaded and retried before giving up.
    pub max_conflict_retries: usize,
    /// Delay before the first retry.
    pub retry_min_delay: Duration,
    /// Upper bound for the delay between retries.
    pub retry_max_delay: Duration,
    /// Number of status updates that may be in flight at once within one pass.
    pub update_concurrency: usize,
}

impl ReconcilerConfig {
    /// Default number of conflict retries.
    pub const DEFAULT_MAX_CONFLICT_RETRIES: usize = 5;
    /// Default number of concurrent updates.
    pub const DEFAULT_UPDATE_CONCURRENCY: usize = 4;

    /// Returns the backoff used for optimistic-lock retries.
    pub fn backoff(&self) -> ExponentialBuilder {
        ExponentialBuilder::default()
            .with_min_delay(self.retry_min_delay)
            .with_max_delay(self.retry_max_delay.max(self.retry_min_delay))
            .with_max_times(self.max_conflict_retries)
            .with_jitter()
    }

    /// The effective update concurrency, never below one.
    pub fn concurrency(&self) -> usize {
        self.update_concurrency.max(1)
    }
}

impl Default for ReconcilerConfig {
    fn default() -> Self {
        Self {
            max_conflict_retries: Self::DEFAULT_MAX_CONFLICT_RETRIES,
            retry_min_delay: Duration::from_millis(10),
            retry_max_delay: Duration::from_secs(1),
            update_concurrency: Self::DEFAULT_UPDATE_CONCURRENCY,
        }
    }
}
