//! Convert command - move reps between the bundle and JSON Lines forms

use std::path::PathBuf;

use clap::Args;

use shardex::Reps;

#[derive(Args)]
pub struct ConvertArgs {
    /// Source file (bundle or .jsonl)
    pub input: PathBuf,

    /// Destination; a `.jsonl` name writes JSON Lines, anything else a bundle
    pub output: PathBuf,
}

pub async fn run(args: ConvertArgs) -> anyhow::Result<()> {
    if args.input == args.output {
        anyhow::bail!("Input and output are the same file: {}", args.input.display());
    }

    let reps = Reps::load(&args.input)?;
    reps.save(&args.output)?;

    println!(
        "Converted {} vectors ({} dims): {} -> {}",
        reps.len(),
        reps.dimensions(),
        args.input.display(),
        args.output.display()
    );
    Ok(())
}
