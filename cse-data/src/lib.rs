//! Storm grid analysis and critical storm selection.
//!
//! Takes the stacked peak flows of an ensemble and, for every location
//! and event, pivots them into a [`StormGrid`] and reduces that grid to
//! its governing [`CriticalStorm`].

mod error;
pub mod storm_grid;
pub mod summary;

pub use error::AnalysisError;
pub use storm_grid::{CriticalTp, GridRow, GridTag, StormGrid};
pub use summary::CriticalStorm;

use cse_ensemble::EnsembleTable;

/// Grids and their critical storms for a whole ensemble.
#[derive(Debug, Clone, PartialEq)]
pub struct EnsembleAnalysis {
    /// One grid per (location, event), locations in ensemble column order
    /// and events in order of first appearance.
    pub grids: Vec<StormGrid>,
    /// Aligned with `grids`.
    pub summaries: Vec<CriticalStorm>,
}

/// Analyze every (location, event) pair of the ensemble.
///
/// Stops at the first structural error; a partial analysis is never
/// returned.
pub fn analyze_ensemble(table: &EnsembleTable) -> Result<EnsembleAnalysis, AnalysisError> {
    let events = table.events();
    let mut grids = Vec::with_capacity(table.locations.len() * events.len());

    for location in &table.locations {
        for event in &events {
            grids.push(StormGrid::analyze(table, location, event)?);
        }
    }

    let summaries: Vec<CriticalStorm> = grids.iter().map(CriticalStorm::from_grid).collect();
    log::info!(
        "analyzed {} grids over {} locations and {} events",
        grids.len(),
        table.locations.len(),
        events.len()
    );

    Ok(EnsembleAnalysis { grids, summaries })
}
