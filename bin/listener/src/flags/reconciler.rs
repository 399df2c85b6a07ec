use clap::Args;
use log_listener_core::ReconcilerConfig;
use std::time::Duration;

/// Reconciliation tuning arguments.
#[derive(Args, Debug, Clone, PartialEq, Eq)]
pub struct ReconcilerArgs {
    /// Retries of a conflicting update before the pass fails.
    #[arg(
        long = "reconciler.max-conflict-retries",
        env = "LOG_LISTENER_MAX_CONFLICT_RETRIES",
        default_value_t = ReconcilerConfig::DEFAULT_MAX_CONFLICT_RETRIES
    )]
    pub max_conflict_retries: usize,

    /// Delay before the first conflict retry, in milliseconds.
    #[arg(
        long = "reconciler.retry-min-delay-ms",
        env = "LOG_LISTENER_RETRY_MIN_DELAY_MS",
        default_value_t = 10
    )]
    pub retry_min_delay_ms: u64,

    /// Upper bound for the delay between conflict retries, in milliseconds.
    #[arg(
        long = "reconciler.retry-max-delay-ms",
        env = "LOG_LISTENER_RETRY_MAX_DELAY_MS",
        default_value_t = 1_000
    )]
    pub retry_max_delay_ms: u64,

    /// Status updates in flight at once.
    #[arg(
        long = "reconciler.update-concurrency",
        env = "LOG_LISTENER_UPDATE_CONCURRENCY",
        default_value_t = ReconcilerConfig::DEFAULT_UPDATE_CONCURRENCY
    )]
    pub update_concurrency: usize,
}

impl From<ReconcilerArgs> for ReconcilerConfig {
    fn from(args: ReconcilerArgs) -> Self {
        Self {
            max_conflict_retries: args.max_conflict_retries,
            retry_min_delay: Duration::from_millis(args.retry_min_delay_ms),
            retry_max_delay: Duration::from_millis(args.retry_max_delay_ms),
            update_concurrency: args.update_concurrency,
        }
    }
}
