//! Binary crate for the `avwx` command-line tool.
//!
//! This crate focuses on:
//! - Parsing CLI arguments and dispatching commands
//! - Favorites persistence and interactive prompts
//! - Human-friendly report formatting

use clap::Parser;
use tracing_subscriber::EnvFilter;

mod cli;
mod favorites;
mod report;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cmd = cli::Cli::parse();
    init_tracing(cmd.debug);
    cmd.run().await
}

fn init_tracing(debug: bool) {
    let default = if debug { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt().with_env_filter(filter).with_target(false).init();
}
