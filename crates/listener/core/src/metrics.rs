use crate::ReconcileError;
use log_listener_types::LogEventStatus;
use std::time::Instant;

#[derive(Debug, Clone)]
pub(crate) struct Metrics;

impl Metrics {
    pub(crate) const RECONCILED_TOTAL: &'static str = "log_listener_reconciled_total";
    pub(crate) const CONFLICT_RETRIES_TOTAL: &'static str = "log_listener_conflict_retries_total";
    pub(crate) const RECONCILE_ERRORS_TOTAL: &'static str = "log_listener_reconcile_errors_total";
    pub(crate) const RECONCILE_DURATION_SECONDS: &'static str =
        "log_listener_reconcile_duration_seconds";

    pub(crate) fn init() {
        Self::describe();
        Self::zero();
    }

    fn describe() {
        metrics::describe_counter!(
            Self::RECONCILED_TOTAL,
            metrics::Unit::Count,
            "Total number of pending logs moved to a new status by reconciliation",
        );

        metrics::describe_counter!(
            Self::CONFLICT_RETRIES_TOTAL,
            metrics::Unit::Count,
            "Total number of log updates retried after an optimistic-lock conflict",
        );

        metrics::describe_counter!(
            Self::RECONCILE_ERRORS_TOTAL,
            metrics::Unit::Count,
            "Total number of reconciliation passes aborted by an error",
        );

        metrics::describe_histogram!(
            Self::RECONCILE_DURATION_SECONDS,
            metrics::Unit::Seconds,
            "Latency of a reconciliation pass",
        );
    }

    fn zero() {
        for status in [LogEventStatus::Inactive, LogEventStatus::Dropped] {
            metrics::counter!(Self::RECONCILED_TOTAL, "status" => status.as_str()).increment(0);
        }

        metrics::counter!(Self::CONFLICT_RETRIES_TOTAL).increment(0);

        metrics::counter!(Self::RECONCILE_ERRORS_TOTAL).increment(0);
    }

    pub(crate) fn record_update(status: LogEventStatus) {
        metrics::counter!(Self::RECONCILED_TOTAL, "status" => status.as_str()).increment(1);
    }

    pub(crate) fn record_conflict_retry() {
        metrics::counter!(Self::CONFLICT_RETRIES_TOTAL).increment(1);
    }

    pub(crate) fn record_pass(started: Instant, result: Result<(), &ReconcileError>) {
        metrics::histogram!(Self::RECONCILE_DURATION_SECONDS)
            .record(started.elapsed().as_secs_f64());

        if result.is_err() {
            metrics::counter!(Self::RECONCILE_ERRORS_TOTAL).increment(1);
        }
    }
}
