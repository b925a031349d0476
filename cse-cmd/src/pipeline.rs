//! The batch: discover, normalize, aggregate, analyze, report.

use anyhow::Context;
use cse_data::{analyze_ensemble, EnsembleAnalysis};
use cse_ensemble::{read_peak_row, EnsembleTable, PeakRow};
use cse_log::RunLog;
use cse_utils::files::{basename, skipped_inputs};
use log::{info, warn};
use std::fs;
use std::path::{Path, PathBuf};

use crate::discover::{
    check_work_dir, find_result_files, stage_inputs, RESULT_FILE_SUFFIX, WORK_DIR,
};
use crate::report::{self, ChartRenderer, JsonChartWriter, LOG_FILE};

/// Everything one batch needs to know.
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub input_dir: PathBuf,
    pub output_dir: PathBuf,
    pub work_dir: PathBuf,
    /// Matched case-insensitively against file names.
    pub suffix: String,
    /// Copy inputs into `work_dir` before reading them.
    pub copy_inputs: bool,
}

impl RunConfig {
    pub fn new(input_dir: impl Into<PathBuf>, output_dir: impl Into<PathBuf>) -> Self {
        RunConfig {
            input_dir: input_dir.into(),
            output_dir: output_dir.into(),
            work_dir: PathBuf::from(WORK_DIR),
            suffix: RESULT_FILE_SUFFIX.to_string(),
            copy_inputs: true,
        }
    }
}

/// A file that could not be turned into a peak row.
#[derive(Debug, Clone, PartialEq)]
pub struct SkippedFile {
    pub name: String,
    pub reason: String,
}

/// Result files read in one pass, in input order.
#[derive(Debug, Default)]
pub struct Ingested {
    pub paths: Vec<PathBuf>,
    pub peak_rows: Vec<PeakRow>,
    pub failures: Vec<SkippedFile>,
}

/// What a finished batch produced.
#[derive(Debug)]
pub struct PipelineOutput {
    /// Basenames of files that made it into the ensemble.
    pub ingested: Vec<String>,
    /// Basenames of discovered files that did not.
    pub skipped: Vec<String>,
    pub ensemble: EnsembleTable,
    pub analysis: EnsembleAnalysis,
}

/// Read every file on the blocking pool. Results are collected in input
/// order regardless of completion order. A file that fails to normalize
/// or parse is recorded and left out.
pub async fn ingest_files(paths: &[PathBuf]) -> anyhow::Result<Ingested> {
    let handles: Vec<_> = paths
        .iter()
        .cloned()
        .map(|path| {
            tokio::task::spawn_blocking(move || {
                let result = read_peak_row(&path);
                (path, result)
            })
        })
        .collect();

    let mut ingested = Ingested::default();
    for handle in handles {
        let (path, result) = handle.await.context("result file reader panicked")?;
        match result {
            Ok(row) => {
                ingested.paths.push(path);
                ingested.peak_rows.push(row);
            }
            Err(e) => {
                let name = basename(&path);
                warn!("skipping {}: {}", name, e);
                ingested.failures.push(SkippedFile {
                    name,
                    reason: e.to_string(),
                });
            }
        }
    }

    info!(
        "read {} of {} result files",
        ingested.peak_rows.len(),
        paths.len()
    );
    Ok(ingested)
}

/// Run the batch, appending to `run_log` as each stage completes and
/// writing artifacts into the output folder.
///
/// Artifacts of an earlier batch are removed first, so a failure leaves
/// only this batch's files behind.
pub async fn run_pipeline(
    config: &RunConfig,
    run_log: &mut RunLog,
) -> anyhow::Result<PipelineOutput> {
    fs::create_dir_all(&config.output_dir).with_context(|| {
        format!("cannot create output folder {}", config.output_dir.display())
    })?;
    report::clear_previous(&config.output_dir)?;

    if config.copy_inputs {
        check_work_dir(&config.work_dir, &config.input_dir, &config.output_dir)?;
    }

    let raw_inputs = find_result_files(&config.input_dir, &config.suffix)?;
    let sources = if config.copy_inputs {
        stage_inputs(&raw_inputs, &config.work_dir)?
    } else {
        raw_inputs.clone()
    };

    let ingested = ingest_files(&sources).await?;
    let ingested_names: Vec<String> = ingested.paths.iter().map(|p| basename(p)).collect();
    let skipped = skipped_inputs(&raw_inputs, &ingested.paths);

    run_log.log(format!(
        "Inputs read from source folder {}:",
        config.input_dir.display()
    ));
    run_log.log_list(&ingested_names);
    run_log.log("\nSkipped inputs:");
    run_log.log_list(&skipped);
    for failure in &ingested.failures {
        run_log.log(format!("  {}: {}", failure.name, failure.reason));
    }

    let ensemble = EnsembleTable::from_peak_rows(&ingested.peak_rows);
    if ensemble.is_empty() {
        warn!("no result files were ingested from {}", config.input_dir.display());
    }
    run_log.log("\nEnsemble:");
    run_log.log(&ensemble);

    report::write_ensemble(&config.output_dir, &ensemble)?;

    let analysis = analyze_ensemble(&ensemble).context("storm grid analysis failed")?;

    let renderer = JsonChartWriter;
    for grid in &analysis.grids {
        run_log.log(format!("\n{}", grid));
        renderer.render(grid, &config.output_dir)?;
    }

    let results = report::results_text(&analysis.summaries);
    report::write_results(&config.output_dir, &analysis.summaries)?;
    report::write_results_json(&config.output_dir, &analysis.summaries)?;
    run_log.log(format!("\n{}", results));

    info!(
        "{} critical storms written to {}",
        analysis.summaries.len(),
        config.output_dir.display()
    );

    Ok(PipelineOutput {
        ingested: ingested_names,
        skipped,
        ensemble,
        analysis,
    })
}

/// Run the batch and always leave `log.txt` in the output folder. On
/// failure the error and its context chain close the log.
pub async fn run_batch(config: &RunConfig) -> anyhow::Result<PipelineOutput> {
    let mut run_log = RunLog::new();
    let result = run_pipeline(config, &mut run_log).await;

    if let Err(e) = &result {
        run_log.log(format!("\nError encountered!\n\n{:?}", e));
    }
    write_log(&run_log, &config.output_dir)?;
    result
}

fn write_log(run_log: &RunLog, output_dir: &Path) -> anyhow::Result<()> {
    let path = run_log.write_to_txt(output_dir, LOG_FILE)?;
    info!("run log written to {}", path.display());
    Ok(())
}
