use cse_utils::stats;

use crate::result_file::ResultTable;
use crate::{EnsembleError, RunIdentity};

/// Column label prefix for a location's peak flow.
pub const MAX_FLOW_PREFIX: &str = "Max Flow ";

/// Peak flow at one monitored location for one run.
#[derive(Debug, Clone, PartialEq)]
pub struct LocationPeak {
    pub location: String,
    /// `None` when the series had no numeric cell.
    pub max_flow: Option<f64>,
}

/// One run reduced to its identity and a peak flow per location.
#[derive(Debug, Clone, PartialEq)]
pub struct PeakRow {
    /// Source file name.
    pub run_id: String,
    pub identity: RunIdentity,
    /// Peaks in order of first appearance in the file.
    pub peaks: Vec<LocationPeak>,
}

impl PeakRow {
    /// Reduce a normalized result table to one peak row.
    ///
    /// Every `Flow` column contributes the maximum of its numeric cells.
    /// A location that appears in several flow columns keeps the largest
    /// of their maxima. Fails only if the table's name does not parse as
    /// a run identity.
    pub fn from_table(table: &ResultTable) -> Result<Self, EnsembleError> {
        let identity = RunIdentity::parse(&table.name)?;

        let mut peaks: Vec<LocationPeak> = Vec::new();
        for column in table.flow_columns() {
            let max_flow = column_max(&column.cells);
            match peaks.iter_mut().find(|p| p.location == column.location) {
                Some(existing) => {
                    existing.max_flow = match (existing.max_flow, max_flow) {
                        (Some(a), Some(b)) => Some(a.max(b)),
                        (a, b) => a.or(b),
                    };
                }
                None => peaks.push(LocationPeak {
                    location: column.location.clone(),
                    max_flow,
                }),
            }
        }

        Ok(PeakRow {
            run_id: table.name.clone(),
            identity,
            peaks,
        })
    }

    /// Peak flow recorded for `location`, if the run reports it.
    pub fn peak(&self, location: &str) -> Option<f64> {
        self.peaks
            .iter()
            .find(|p| p.location == location)
            .and_then(|p| p.max_flow)
    }
}

/// `Max Flow <location>`
pub fn max_flow_label(location: &str) -> String {
    format!("{}{}", MAX_FLOW_PREFIX, location)
}

/// Numeric value of a raw cell. Text, blanks and NaN are missing.
pub fn coerce_numeric(cell: &str) -> Option<f64> {
    cell.trim().parse::<f64>().ok().filter(|v| !v.is_nan())
}

/// Maximum over the numeric cells of a column, ignoring the rest.
pub fn column_max(cells: &[String]) -> Option<f64> {
    let values: Vec<Option<f64>> = cells.iter().map(|c| coerce_numeric(c)).collect();
    stats::max(&values)
}
