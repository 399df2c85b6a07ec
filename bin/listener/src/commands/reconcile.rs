//! Reconcile Subcommand

use crate::flags::ReconcilerArgs;
use alloy_primitives::B256;
use anyhow::{Context as _, Result};
use clap::Parser;
use futures::StreamExt;
use log_listener_core::PendingLogReconciler;
use log_listener_storage::InMemoryLogStore;
use log_listener_types::{Block, LogEvent};
use serde::de::DeserializeOwned;
use std::{
    path::{Path, PathBuf},
    pin::pin,
    sync::Arc,
};
use tracing::{info, warn};

/// The `reconcile` Subcommand
///
/// Seeds an in-memory store with recorded log events, reconciles them against a recorded block
/// and prints every updated record as one JSON line.
///
/// # Usage
///
/// ```sh
/// log-listener reconcile --source <ID> --topic <HASH> --block block.json --logs logs.json
/// ```
#[derive(Parser, Debug, Clone)]
#[command(about = "Reconciles recorded pending logs against a recorded block")]
pub struct ReconcileCommand {
    /// Source the log events belong to.
    #[arg(long, env = "LOG_LISTENER_SOURCE")]
    pub source: String,
    /// Event signature to reconcile.
    #[arg(long)]
    pub topic: B256,
    /// Path to a JSON-RPC block with its transactions.
    #[arg(long)]
    pub block: PathBuf,
    /// Path to a JSON array of log events.
    #[arg(long)]
    pub logs: PathBuf,
    /// Reconciliation tuning.
    #[command(flatten)]
    pub reconciler: ReconcilerArgs,
}

impl ReconcileCommand {
    /// Runs the subcommand.
    pub async fn run(self) -> Result<()> {
        for log in self.execute().await? {
            println!("{}", serde_json::to_string(&log)?);
        }
        Ok(())
    }

    /// Runs the reconciliation and returns the updated records in emission order.
    pub async fn execute(&self) -> Result<Vec<LogEvent>> {
        let block: Block = read_json(&self.block).await?;
        let logs: Vec<LogEvent> = read_json(&self.logs).await?;

        let store = Arc::new(InMemoryLogStore::new());
        for log in logs {
            store.insert(&self.source, log).await;
        }
        info!(
            target: "log_listener",
            source = %self.source,
            block_number = block.number,
            seeded = store.len().await,
            "Seeded log store"
        );
        if store.is_empty().await {
            warn!(
                target: "log_listener",
                path = %self.logs.display(),
                "No log events to reconcile"
            );
        }

        let reconciler = PendingLogReconciler::new(store, self.reconciler.clone().into());
        let mut updates = pin!(reconciler.reconcile(&self.source, self.topic, &block));

        let mut updated = Vec::new();
        while let Some(update) = updates.next().await {
            updated.push(update.with_context(|| {
                format!("Failed to reconcile block {} for source '{}'", block.number, self.source)
            })?);
        }
        Ok(updated)
    }
}

async fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let contents = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read '{}'", path.display()))?;
    serde_json::from_str(&contents)
        .with_context(|| format!("Failed to parse JSON from '{}'", path.display()))
}
