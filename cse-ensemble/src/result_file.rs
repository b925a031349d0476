//! Result file normalizer.
//!
//! A model run writes one delimited text file per run. The layout is fixed:
//!
//! ```text
//! Example_1EY_360m_tp01_PO.csv,Location,PO_A,PO_A,PO_B      <- first row, sets the width
//! Example_1EY_360m_tp01_PO.csv,Time,Flow,Velocity,Flow      <- header row, first row with "Flow"
//! ,0.00,0.0,0.0,0.0
//! ,0.25,1.2,0.4,0.8
//! ```
//!
//! The first column is a per-run label and is dropped, the second is the
//! time index, and each remaining column is one series for the location
//! named in the same column of the first row. Location names may repeat.

use csv::{ReaderBuilder, StringRecord};
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

use crate::EnsembleError;

/// Literal cell that marks the true header row.
pub const HEADER_MARKER: &str = "Flow";

/// One labelled series of a normalized result file.
#[derive(Debug, Clone, PartialEq)]
pub struct ResultColumn {
    /// Unique label, `<original_label>.<position>`.
    pub label: String,
    /// Label as it appears in the header row.
    pub original_label: String,
    /// Monitored location this series belongs to.
    pub location: String,
    /// Raw cells, one per time step.
    pub cells: Vec<String>,
}

impl ResultColumn {
    /// Whether this column holds a flow series.
    pub fn is_flow(&self) -> bool {
        self.original_label.contains(HEADER_MARKER)
    }
}

/// A result file reduced to a time index and uniquely labelled columns.
#[derive(Debug, Clone, PartialEq)]
pub struct ResultTable {
    /// Source file name, used as the run id downstream.
    pub name: String,
    /// Header label of the time column.
    pub index_label: String,
    /// Time (or chainage) values, one per row.
    pub index: Vec<String>,
    pub columns: Vec<ResultColumn>,
}

impl ResultTable {
    /// Read and normalize the result file at `path`.
    pub fn from_path(path: &Path) -> Result<Self, EnsembleError> {
        let file = File::open(path).map_err(|e| EnsembleError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        Self::from_reader(&name, path, file)
    }

    /// Normalize result file contents read from `reader`. `path` is only
    /// used for error messages.
    pub fn from_reader<R: Read>(name: &str, path: &Path, reader: R) -> Result<Self, EnsembleError> {
        let path: PathBuf = path.to_path_buf();

        // Rows are ragged in practice, so the csv crate must not enforce a width.
        let records = ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_reader(reader)
            .records()
            .collect::<Result<Vec<StringRecord>, csv::Error>>()
            .map_err(|e| EnsembleError::Csv {
                path: path.clone(),
                source: e,
            })?;

        let header_width = match records.first() {
            Some(first) => first.len(),
            None => return Err(EnsembleError::EmptyInput { path }),
        };
        if header_width < 2 {
            return Err(EnsembleError::NarrowHeader {
                path,
                width: header_width,
            });
        }

        let header_index = match header_row(&records, header_width) {
            Some(i) => i,
            None => return Err(EnsembleError::MissingHeader { path }),
        };
        let data = &records[header_index + 1..];
        if data.is_empty() {
            return Err(EnsembleError::EmptyInput { path });
        }

        let header = &records[header_index];
        let index_label = cell(header, 1);
        let index = data.iter().map(|row| cell(row, 1)).collect();

        let columns = (2..header_width)
            .enumerate()
            .map(|(position, col)| {
                let original_label = cell(header, col);
                let label = format!("{}.{}", original_label, position);
                let location = if header_index > 0 {
                    cell(&records[0], col).trim().to_string()
                } else {
                    String::new()
                };
                ResultColumn {
                    location: if location.is_empty() { label.clone() } else { location },
                    label,
                    original_label,
                    cells: data.iter().map(|row| cell(row, col)).collect(),
                }
            })
            .collect::<Vec<_>>();

        log::debug!(
            "normalized {}: header row {}, {} columns, {} rows",
            name,
            header_index,
            columns.len(),
            data.len()
        );

        Ok(ResultTable {
            name: name.to_string(),
            index_label,
            index,
            columns,
        })
    }

    /// Number of data rows.
    pub fn row_count(&self) -> usize {
        self.index.len()
    }

    /// Columns holding flow series, in file order.
    pub fn flow_columns(&self) -> impl Iterator<Item = &ResultColumn> {
        self.columns.iter().filter(|c| c.is_flow())
    }
}

/// Index of the first row with a `Flow` cell within the first `width`
/// columns, or `None` if there is no such row.
pub fn header_row(records: &[StringRecord], width: usize) -> Option<usize> {
    records
        .iter()
        .position(|row| row.iter().take(width).any(|c| c.trim() == HEADER_MARKER))
}

/// Cell `col` of `row`, empty when the row is too short.
fn cell(row: &StringRecord, col: usize) -> String {
    row.get(col).unwrap_or("").to_string()
}
