//! Contains the listener CLI.

use crate::commands::ReconcileCommand;
use anyhow::Result;
use clap::{ArgAction, Parser, Subcommand};
use log_listener_cli::{MetricsArgs, init_tracing_subscriber};

/// Subcommands for the CLI.
#[derive(Debug, Clone, Subcommand)]
pub enum Commands {
    /// Reconciles recorded pending logs against a recorded block.
    Reconcile(ReconcileCommand),
}

/// The pending log listener CLI.
#[derive(Parser, Clone, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Verbosity level (0-3)
    #[arg(long, short, global = true, action = ArgAction::Count)]
    pub v: u8,
    /// Prometheus CLI arguments.
    #[command(flatten)]
    pub metrics: MetricsArgs,
    /// The subcommand to run.
    #[command(subcommand)]
    pub subcommand: Commands,
}

impl Cli {
    /// Runs the CLI.
    pub async fn run(self) -> Result<()> {
        // Initialize the telemetry stack.
        init_tracing_subscriber(self.v, None)?;
        self.metrics.init_metrics()?;

        match self.subcommand {
            Commands::Reconcile(reconcile) => reconcile.run().await,
        }
    }
}
