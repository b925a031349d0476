//! Critical storm selection: one governing storm per grid.

use cse_utils::table::render;
use serde::Serialize;
use std::fmt;

use crate::storm_grid::{CriticalTp, StormGrid, NOT_AVAILABLE};

/// Column headings of the results table, in output order.
pub const RESULT_COLUMNS: [&str; 5] = [
    "Event",
    "Location",
    "Critical Duration",
    "Critical Temporal Pattern",
    "Critical Flow",
];

/// The governing storm for one (event, location) pair.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CriticalStorm {
    pub event: String,
    pub location: String,
    /// Minutes; `None` when no duration has a median.
    pub duration: Option<u32>,
    pub temporal_pattern: CriticalTp,
    /// `None` whenever `temporal_pattern` is not available.
    pub flow: Option<f64>,
}

impl CriticalStorm {
    /// Pick the duration with the highest median (the shortest on a tie)
    /// and report that row's critical pattern and its flow.
    pub fn from_grid(grid: &StormGrid) -> Self {
        let mut governing = None;
        for row in &grid.rows {
            let Some(median) = row.median else { continue };
            match governing {
                Some((_, best)) if best >= median => {}
                _ => governing = Some((row, median)),
            }
        }

        let (duration, temporal_pattern, flow) = match governing {
            Some((row, _)) => {
                let flow = row
                    .critical_tp
                    .as_pattern()
                    .and_then(|pattern| grid.value(row, pattern));
                (Some(row.duration), row.critical_tp.clone(), flow)
            }
            None => {
                log::warn!("{}: no duration has a median flow", grid.tag);
                (None, CriticalTp::NotAvailable, None)
            }
        };

        CriticalStorm {
            event: grid.tag.event.clone(),
            location: grid.tag.location.clone(),
            duration,
            temporal_pattern,
            flow,
        }
    }

    /// Cells in [`RESULT_COLUMNS`] order, `NA` for missing values.
    pub fn cells(&self) -> Vec<String> {
        vec![
            self.event.clone(),
            self.location.clone(),
            self.duration
                .map_or(NOT_AVAILABLE.to_string(), |d| d.to_string()),
            self.temporal_pattern.to_string(),
            self.flow
                .map_or(NOT_AVAILABLE.to_string(), |f| format!("{:.3}", f)),
        ]
    }
}

impl fmt::Display for CriticalStorm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let cells = self.cells();
        for (i, (label, value)) in RESULT_COLUMNS.iter().zip(&cells).enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{}: {}", label, value)?;
        }
        Ok(())
    }
}

/// All summaries as one text table.
pub fn results_table(summaries: &[CriticalStorm]) -> String {
    let headers: Vec<String> = RESULT_COLUMNS.iter().map(|c| c.to_string()).collect();
    let rows: Vec<Vec<String>> = summaries.iter().map(|s| s.cells()).collect();
    render(&headers, &rows)
}
