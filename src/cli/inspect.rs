//! Inspect command - summarize encoded reps files

use std::path::PathBuf;

use clap::Args;

use shardex::diagnostics::{self, VectorStats};
use shardex::Reps;

#[derive(Args)]
pub struct InspectArgs {
    /// Reps files (bundle or .jsonl)
    #[arg(required = true)]
    pub files: Vec<PathBuf>,

    /// Also print value and norm statistics
    #[arg(short, long)]
    pub detailed: bool,
}

pub async fn run(args: InspectArgs) -> anyhow::Result<()> {
    println!("Reps Files");
    println!("{}", "=".repeat(50));

    let mut total = 0usize;
    let mut dimensions: Option<usize> = None;

    for (i, path) in args.files.iter().enumerate() {
        let reps = Reps::load(path)?;
        let duplicates = diagnostics::check_duplicate_ids(&path.display().to_string(), &reps.ids);

        print!(
            "   {}. {} ({} vectors, {} dims)",
            i + 1,
            path.display(),
            reps.len(),
            reps.dimensions()
        );
        if duplicates > 0 {
            print!(" [{} duplicate ids]", duplicates);
        }
        println!();

        if args.detailed {
            let stats = VectorStats::compute(reps.vectors.view());
            println!(
                "      min {:.6}, max {:.6}, mean {:.6}, std {:.6}",
                stats.min, stats.max, stats.mean, stats.std
            );
            println!(
                "      norm min {:.6}, max {:.6}, mean {:.6}",
                stats.norm_min, stats.norm_max, stats.norm_mean
            );
            if stats.non_finite > 0 || stats.zero_rows > 0 {
                println!(
                    "      {} non-finite values, {} zero vectors",
                    stats.non_finite, stats.zero_rows
                );
            }
        }

        match dimensions {
            Some(d) if d != reps.dimensions() => {
                println!("      warning: width differs from the first file ({})", d);
            }
            None => dimensions = Some(reps.dimensions()),
            _ => {}
        }
        total += reps.len();
    }

    println!("\n{}", "=".repeat(50));
    println!("Total: {} vector(s) in {} file(s)", total, args.files.len());

    Ok(())
}
