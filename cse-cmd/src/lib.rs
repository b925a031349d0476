//! Command implementations for the critical storm CLI.
//!
//! Provides subcommands for running the full ensemble batch and for
//! inspecting single result files.

use clap::Subcommand;
use cse_ensemble::{read_peak_row, RunIdentity};
use cse_utils::table::{format_value, render};
use log::info;
use std::path::PathBuf;

pub mod discover;
pub mod pipeline;
pub mod report;

use discover::{RESULT_FILE_SUFFIX, WORK_DIR};
use pipeline::{run_batch, RunConfig};

#[derive(Subcommand)]
pub enum Command {
    /// Find the critical storm for every event and location in a folder of result files
    Run {
        /// Folder containing the model's PO result CSVs
        #[arg(short = 'i', long)]
        input: PathBuf,

        /// Folder for results.txt, log.txt, ensemble.csv and chart data
        #[arg(short = 'o', long)]
        output: PathBuf,

        /// Working folder inputs are copied into (removed and recreated; must
        /// not overlap the input or output folder)
        #[arg(short = 'w', long, default_value = WORK_DIR)]
        work_dir: PathBuf,

        /// File name suffix identifying result files (case-insensitive)
        #[arg(short = 's', long, default_value = RESULT_FILE_SUFFIX)]
        suffix: String,

        /// Read inputs in place instead of copying them to the working folder
        #[arg(long)]
        no_copy: bool,
    },

    /// Print the peak flow at every location in one result file
    Peaks {
        /// Path to a PO result CSV
        file: PathBuf,
    },

    /// Print the event, duration and temporal pattern encoded in a file name
    Identify {
        /// Result file name
        filename: String,
    },
}

pub async fn run(command: Command) -> anyhow::Result<()> {
    match command {
        Command::Run {
            input,
            output,
            work_dir,
            suffix,
            no_copy,
        } => {
            let config = RunConfig {
                input_dir: input,
                output_dir: output,
                work_dir,
                suffix,
                copy_inputs: !no_copy,
            };
            let out = run_batch(&config).await?;
            info!(
                "{} files ingested, {} skipped",
                out.ingested.len(),
                out.skipped.len()
            );
            println!("{}", report::results_text(&out.analysis.summaries));
            Ok(())
        }
        Command::Peaks { file } => {
            let row = tokio::task::spawn_blocking(move || read_peak_row(&file)).await??;
            println!("{}", row.identity);
            let headers = vec!["Location".to_string(), "Max Flow".to_string()];
            let rows: Vec<Vec<String>> = row
                .peaks
                .iter()
                .map(|p| vec![p.location.clone(), format_value(p.max_flow)])
                .collect();
            println!("{}", render(&headers, &rows));
            Ok(())
        }
        Command::Identify { filename } => {
            let identity = RunIdentity::parse(&filename)?;
            println!("event: {}", identity.event);
            println!("duration: {}", identity.duration);
            println!("temporal pattern: {}", identity.temporal_pattern);
            Ok(())
        }
    }
}
