//! Output artifacts: results table, ensemble CSV and chart-ready grids.

use anyhow::Context;
use cse_data::summary::results_table;
use cse_data::{CriticalStorm, StormGrid};
use cse_ensemble::EnsembleTable;
use cse_utils::files::str_to_valid_filename;
use serde::Serialize;
use std::fs::{self, File};
use std::path::{Path, PathBuf};

pub const RESULTS_FILE: &str = "results.txt";
pub const RESULTS_JSON_FILE: &str = "results.json";
pub const ENSEMBLE_FILE: &str = "ensemble.csv";
pub const LOG_FILE: &str = "log.txt";

const RESULTS_BANNER: &str = "###### RESULTS ######";

/// Shared by every chart file name: the sanitized `: Max Flow ` of a tag.
pub const CHART_MARKER: &str = "- Max Flow ";

/// Turns a storm grid into a chart file in the output folder.
pub trait ChartRenderer {
    /// Render `grid` into `output_dir`, returning the written path.
    fn render(&self, grid: &StormGrid, output_dir: &Path) -> anyhow::Result<PathBuf>;
}

/// File stem for a grid's chart: its tag with unsafe characters replaced.
pub fn chart_file_stem(grid: &StormGrid) -> String {
    str_to_valid_filename(&grid.tag.to_string())
}

/// One box of a duration box plot: every temporal pattern's flow for a
/// single duration.
#[derive(Debug, Serialize)]
pub struct ChartBox {
    pub duration: u32,
    /// Present flows in temporal-pattern order.
    pub values: Vec<f64>,
    pub patterns: Vec<String>,
    pub average: Option<f64>,
    pub median: Option<f64>,
    pub critical_tp: String,
}

/// Chart-ready form of a storm grid.
#[derive(Debug, Serialize)]
pub struct ChartData {
    pub title: String,
    pub x_label: &'static str,
    pub y_label: &'static str,
    pub boxes: Vec<ChartBox>,
}

impl From<&StormGrid> for ChartData {
    fn from(grid: &StormGrid) -> Self {
        let boxes = grid
            .rows
            .iter()
            .map(|row| {
                let (patterns, values) = grid
                    .temporal_patterns
                    .iter()
                    .zip(&row.flows)
                    .filter_map(|(p, v)| v.map(|v| (p.clone(), v)))
                    .unzip();
                ChartBox {
                    duration: row.duration,
                    values,
                    patterns,
                    average: row.average,
                    median: row.median,
                    critical_tp: row.critical_tp.to_string(),
                }
            })
            .collect();

        ChartData {
            title: grid.tag.to_string(),
            x_label: "Duration (m)",
            y_label: "Max Flow (cu.m/sec)",
            boxes,
        }
    }
}

/// Writes each grid as `<sanitized tag>.json` for an external plotter.
#[derive(Debug, Default, Clone, Copy)]
pub struct JsonChartWriter;

impl ChartRenderer for JsonChartWriter {
    fn render(&self, grid: &StormGrid, output_dir: &Path) -> anyhow::Result<PathBuf> {
        let path = output_dir.join(format!("{}.json", chart_file_stem(grid)));
        let data = ChartData::from(grid);
        let json = serde_json::to_string_pretty(&data)?;
        fs::write(&path, json).with_context(|| format!("cannot write chart {}", path.display()))?;
        Ok(path)
    }
}

/// The results block: banner then one row per critical storm.
pub fn results_text(summaries: &[CriticalStorm]) -> String {
    format!("{}\n\n{}", RESULTS_BANNER, results_table(summaries))
}

pub fn write_results(output_dir: &Path, summaries: &[CriticalStorm]) -> anyhow::Result<PathBuf> {
    let path = output_dir.join(RESULTS_FILE);
    fs::write(&path, results_text(summaries))
        .with_context(|| format!("cannot write {}", path.display()))?;
    Ok(path)
}

/// Summaries as a JSON array, one object per (event, location).
pub fn write_results_json(
    output_dir: &Path,
    summaries: &[CriticalStorm],
) -> anyhow::Result<PathBuf> {
    let path = output_dir.join(RESULTS_JSON_FILE);
    let json = serde_json::to_string_pretty(summaries)?;
    fs::write(&path, json).with_context(|| format!("cannot write {}", path.display()))?;
    Ok(path)
}

fn is_chart_file(name: &str) -> bool {
    name.ends_with(".json") && name.contains(CHART_MARKER)
}

/// Delete results, ensemble and chart files left by an earlier batch so
/// a failed batch never sits next to an older batch's results. Other
/// files in `output_dir` are left alone.
pub fn clear_previous(output_dir: &Path) -> anyhow::Result<Vec<PathBuf>> {
    let mut removed = Vec::new();
    let entries = fs::read_dir(output_dir)
        .with_context(|| format!("cannot read output folder {}", output_dir.display()))?;
    for entry in entries {
        let entry = entry?;
        let name = entry.file_name().to_string_lossy().into_owned();
        let ours = [RESULTS_FILE, RESULTS_JSON_FILE, ENSEMBLE_FILE].contains(&name.as_str())
            || is_chart_file(&name);
        if ours && entry.file_type()?.is_file() {
            let path = entry.path();
            fs::remove_file(&path)
                .with_context(|| format!("cannot remove {}", path.display()))?;
            removed.push(path);
        }
    }
    if !removed.is_empty() {
        log::info!(
            "removed {} files from a previous batch in {}",
            removed.len(),
            output_dir.display()
        );
    }
    Ok(removed)
}

pub fn write_ensemble(output_dir: &Path, ensemble: &EnsembleTable) -> anyhow::Result<PathBuf> {
    let path = output_dir.join(ENSEMBLE_FILE);
    let file = File::create(&path).with_context(|| format!("cannot create {}", path.display()))?;
    ensemble
        .write_csv(file)
        .with_context(|| format!("cannot write {}", path.display()))?;
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use cse_data::{CriticalTp, GridRow, GridTag};

    fn grid() -> StormGrid {
        StormGrid {
            tag: GridTag {
                event: "1%ey".to_string(),
                location: "PO/A".to_string(),
            },
            temporal_patterns: vec!["tp01".to_string(), "tp02".to_string(), "tp03".to_string()],
            rows: vec![GridRow {
                duration: 60,
                flows: vec![Some(1.0), None, Some(3.0)],
                average: Some(2.0),
                median: Some(2.0),
                critical_tp: CriticalTp::Pattern("tp03".to_string()),
            }],
        }
    }

    #[test]
    fn test_chart_file_stem_is_sanitized() {
        assert_eq!(chart_file_stem(&grid()), "1-ey- Max Flow PO-A");
    }

    #[test]
    fn test_chart_data_skips_missing_cells() {
        let data = ChartData::from(&grid());
        assert_eq!(data.title, "1%ey: Max Flow PO/A");
        assert_eq!(data.boxes[0].values, vec![1.0, 3.0]);
        assert_eq!(data.boxes[0].patterns, vec!["tp01", "tp03"]);
        assert_eq!(data.boxes[0].critical_tp, "tp03");
    }

    #[test]
    fn test_json_chart_writer() {
        let dir = tempfile::tempdir().unwrap();
        let path = JsonChartWriter.render(&grid(), dir.path()).unwrap();
        assert_eq!(path, dir.path().join("1-ey- Max Flow PO-A.json"));
        let json: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(json["boxes"][0]["duration"], 60);
        assert_eq!(json["x_label"], "Duration (m)");
    }

    #[test]
    fn test_chart_names_carry_marker() {
        assert!(is_chart_file(&format!("{}.json", chart_file_stem(&grid()))));
        assert!(!is_chart_file("notes.json"));
        assert!(!is_chart_file("1ey- Max Flow PO_A.txt"));
    }

    #[test]
    fn test_clear_previous_only_removes_batch_files() {
        let dir = tempfile::tempdir().unwrap();
        JsonChartWriter.render(&grid(), dir.path()).unwrap();
        for name in [RESULTS_FILE, RESULTS_JSON_FILE, ENSEMBLE_FILE, "notes.json", "log.txt"] {
            fs::write(dir.path().join(name), "x").unwrap();
        }

        let removed = clear_previous(dir.path()).unwrap();
        assert_eq!(removed.len(), 4);
        assert!(dir.path().join("notes.json").exists());
        assert!(dir.path().join("log.txt").exists());
        assert!(!dir.path().join(RESULTS_FILE).exists());
        assert!(!dir.path().join("1-ey- Max Flow PO-A.json").exists());
    }

    #[test]
    fn test_results_json_fields() {
        let dir = tempfile::tempdir().unwrap();
        let storms = [
            CriticalStorm {
                event: "1ey".to_string(),
                location: "PO_A".to_string(),
                duration: Some(90),
                temporal_pattern: CriticalTp::Pattern("tp01".to_string()),
                flow: Some(20.0),
            },
            CriticalStorm {
                event: "1ey".to_string(),
                location: "PO_B".to_string(),
                duration: None,
                temporal_pattern: CriticalTp::NotAvailable,
                flow: None,
            },
        ];
        let path = write_results_json(dir.path(), &storms).unwrap();
        let json: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(json[0]["duration"], 90);
        assert_eq!(json[0]["temporal_pattern"], "tp01");
        assert_eq!(json[1]["temporal_pattern"], "NA");
        assert!(json[1]["flow"].is_null());
    }

    #[test]
    fn test_results_text_has_banner() {
        let storm = CriticalStorm {
            event: "1ey".to_string(),
            location: "PO_A".to_string(),
            duration: None,
            temporal_pattern: CriticalTp::NotAvailable,
            flow: None,
        };
        let text = results_text(&[storm]);
        assert!(text.starts_with("###### RESULTS ######\n\nEvent"));
        assert!(text.contains("NA"));
    }
}
