//! Config command - manage shardex configuration

use clap::{Args, Subcommand};

use shardex::config::Config;

#[derive(Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommands,
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Show current configuration
    Show,

    /// Initialize config file with defaults
    Init {
        /// Overwrite existing config
        #[arg(short, long)]
        force: bool,
    },

    /// Set a single value, e.g. `shards.num_devices 4`
    Set {
        /// Dotted key (shards.num_devices, shards.capacity_per_device,
        /// shards.backend, search.depth, search.batch_size)
        key: String,

        value: String,
    },

    /// Show config file path
    Path,
}

pub async fn run(args: ConfigArgs) -> anyhow::Result<()> {
    match args.command {
        ConfigCommands::Show => {
            let config = Config::load();
            let path = Config::config_path();

            if path.exists() {
                println!("Config file: {}", path.display());
            } else {
                println!("Config file: {} (not found, using defaults)", path.display());
            }
            println!();
            println!("[shards]");
            println!("num_devices = {}", config.shards.num_devices);
            println!("capacity_per_device = {}", config.shards.capacity_per_device);
            println!("backend = \"{}\"", config.shards.backend);
            println!();
            println!("[search]");
            println!("depth = {}", config.search.depth);
            println!("batch_size = {}", config.search.batch_size);
        }

        ConfigCommands::Init { force } => {
            let path = Config::config_path();

            if !Config::write_example(force)? {
                anyhow::bail!(
                    "Config file already exists at {}. Use --force to overwrite.",
                    path.display()
                );
            }

            println!("Created config file at {}", path.display());
            println!();
            println!("Edit the file to change the default device layout and search depth.");
            println!();
            println!("  # 4 devices of 2M vectors, queries scanned in parallel");
            println!("  [shards]");
            println!("  num_devices = 4");
            println!("  capacity_per_device = 2000000");
            println!("  backend = \"parallel-flat\"");
        }

        ConfigCommands::Set { key, value } => {
            let mut config = Config::load();
            config.set(&key, &value)?;
            config.save()?;
            println!("Set {} = {}", key, value);
        }

        ConfigCommands::Path => {
            println!("{}", Config::config_path().display());
        }
    }

    Ok(())
}
