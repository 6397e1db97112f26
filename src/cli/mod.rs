//! CLI module - command definitions and handlers

mod config_cmd;
mod convert;
mod inspect;
mod search;

use clap::{Parser, Subcommand};

pub use config_cmd::ConfigArgs;
pub use convert::ConvertArgs;
pub use inspect::InspectArgs;
pub use search::SearchArgs;

/// shardex - sharded exact inner-product search over encoded passages
#[derive(Parser)]
#[command(name = "shardex")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Rank encoded queries against passages sharded over devices
    Search(SearchArgs),

    /// Summarize reps files
    Inspect(InspectArgs),

    /// Convert reps between bundle and JSON Lines
    Convert(ConvertArgs),

    /// Manage configuration
    Config(ConfigArgs),
}

impl Cli {
    pub async fn run(self) -> anyhow::Result<()> {
        match self.command {
            Commands::Search(args) => search::run(args, self.quiet).await,
            Commands::Inspect(args) => inspect::run(args).await,
            Commands::Convert(args) => convert::run(args).await,
            Commands::Config(args) => config_cmd::run(args).await,
        }
    }
}
