//! shardex - sharded exact inner-product search
//!
//! A single-binary CLI for loading encoded passages onto capacity-bounded
//! devices and writing top-k rankings for encoded queries.

mod cli;

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use cli::Cli;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let default_filter = if cli.verbose {
        "shardex=debug,warn"
    } else if cli.quiet {
        "shardex=warn"
    } else {
        "shardex=info,warn"
    };

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    cli.run().await
}
