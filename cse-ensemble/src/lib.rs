//! Core types and result-file parsing for hydraulic model ensembles.
//!
//! The modules run in pipeline order: a result file is normalized
//! ([`result_file`]), reduced to one [`PeakRow`] tagged with the
//! [`RunIdentity`] parsed from its file name ([`peak`], [`run_identity`]),
//! and the peak rows of all runs are stacked into an [`EnsembleTable`]
//! ([`ensemble`]).

mod error;
pub mod ensemble;
pub mod peak;
pub mod result_file;
pub mod run_identity;

pub use ensemble::{EnsembleRow, EnsembleTable};
pub use error::EnsembleError;
pub use peak::{LocationPeak, PeakRow};
pub use result_file::{ResultColumn, ResultTable};
pub use run_identity::RunIdentity;

use std::path::Path;

/// Normalize one result file and reduce it to its peak row.
///
/// This is the single per-file step of the batch: any error means the
/// file is left out of the ensemble.
pub fn read_peak_row(path: &Path) -> Result<PeakRow, EnsembleError> {
    let table = ResultTable::from_path(path)?;
    PeakRow::from_table(&table)
}
