//! Utilities shared by the pending log listener binaries.

mod error;
pub use error::{CliError, CliResult, PrometheusError};

mod metrics_args;
pub use metrics_args::MetricsArgs;

mod prometheus;
pub use prometheus::init_prometheus_server;

mod telemetry;
pub use telemetry::{init_tracing_subscriber, verbosity_level};
