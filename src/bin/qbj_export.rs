//! QBJ Export Tool - Convert recorded matches into QBJ documents
//!
//! Reads match snapshots (JSON) written by the scorekeeper and produces QBJ
//! `Match` documents, either one at a time or a whole round in parallel.
//! Can also print a box score for an exported match.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use qbj_exporter::export::{ExportOptions, DEFAULT_BONUS_PARTS};
use qbj_exporter::pipeline::{
    compute_stats, export_batch, export_file, write_stats_csv, BatchConfig, ExportConfig,
};
use std::io::Write;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "qbj-export")]
#[command(about = "Convert recorded quiz bowl matches into QBJ Match documents")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Convert a single match snapshot
    Export {
        /// Match snapshot JSON file
        #[arg(short, long)]
        input: PathBuf,

        /// Output QBJ file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,

        #[command(flatten)]
        options: OptionArgs,
    },

    /// Convert many match snapshots into a directory
    ///
    /// Each `<name>.json` becomes `<out_dir>/<name>.qbj`. A file that fails
    /// is reported and the rest are still converted.
    Batch {
        /// Match snapshot JSON files
        #[arg(short, long, num_args = 1.., required = true)]
        inputs: Vec<PathBuf>,

        /// Directory for the QBJ files
        #[arg(short = 'd', long)]
        out_dir: PathBuf,

        /// Number of parallel threads (default: number of CPU cores)
        #[arg(short, long)]
        threads: Option<usize>,

        #[command(flatten)]
        options: OptionArgs,
    },

    /// Print the box score of an exported match
    Stats {
        /// QBJ match file
        #[arg(short, long)]
        input: PathBuf,

        /// Also write per-player stats to this CSV file
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[derive(clap::Args)]
struct OptionArgs {
    /// Fail on references to teams or players that are not in the match
    #[arg(long, env = "QBJ_STRICT")]
    strict: bool,

    /// Pretty-print the JSON output
    #[arg(long, env = "QBJ_PRETTY")]
    pretty: bool,

    /// Number of parts per bonus
    #[arg(long, default_value_t = DEFAULT_BONUS_PARTS)]
    bonus_parts: u32,
}

impl OptionArgs {
    fn to_options(&self) -> ExportOptions {
        let mut options = ExportOptions::default().with_bonus_parts(self.bonus_parts);
        if self.strict {
            options = options.strict();
        }
        if self.pretty {
            options = options.pretty();
        }
        options
    }
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Export {
            input,
            output,
            options,
        } => {
            let outcome = export_file(&ExportConfig {
                input,
                output: output.clone(),
                options: options.to_options(),
            })?;

            if output.is_none() {
                let mut stdout = std::io::stdout().lock();
                writeln!(stdout, "{}", outcome.json).context("Failed to write to stdout")?;
            }
            if !outcome.warnings.is_empty() {
                eprintln!(
                    "Exported {} questions with {} warning(s)",
                    outcome.questions,
                    outcome.warnings.len()
                );
            }
        }
        Commands::Batch {
            inputs,
            out_dir,
            threads,
            options,
        } => {
            let result = export_batch(
                &BatchConfig {
                    inputs,
                    out_dir,
                    threads,
                    options: options.to_options(),
                },
                |progress| {
                    eprint!(
                        "\r[{}/{}] Exporting... ({} errors)    ",
                        progress.completed, progress.total, progress.errors
                    );
                    std::io::stderr().flush().ok();
                },
            )?;

            eprintln!(); // New line after progress
            for (path, error) in &result.failures {
                eprintln!("  {}: {}", path.display(), error);
            }
            eprintln!("{}", result.summary());
        }
        Commands::Stats { input, output } => {
            print!("{}", compute_stats(&input)?);
            if let Some(output) = output {
                let rows = write_stats_csv(&input, &output)?;
                eprintln!("Wrote {} player rows to {}", rows, output.display());
            }
        }
    }

    Ok(())
}
