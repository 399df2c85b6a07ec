//! Replays pending log reconciliation against recorded blocks.

mod cli;
mod commands;
mod flags;

use clap::Parser;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    cli::Cli::parse().run().await
}
