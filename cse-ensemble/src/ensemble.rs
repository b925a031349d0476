//! Ensemble aggregator: stacks per-run peak rows into one table.

use cse_utils::table::{format_value, render};
use std::fmt;
use std::io::Write;

use crate::peak::{max_flow_label, PeakRow};
use crate::RunIdentity;

/// Identity columns that precede the per-location peak flows.
pub const IDENTITY_COLUMNS: [&str; 4] = ["Run ID", "Event", "Duration", "Temporal Pattern"];

/// One run of the ensemble, with a flow slot for every location in the
/// table (missing when the run does not report that location).
#[derive(Debug, Clone, PartialEq)]
pub struct EnsembleRow {
    pub run_id: String,
    pub identity: RunIdentity,
    /// Aligned with [`EnsembleTable::locations`].
    pub flows: Vec<Option<f64>>,
}

/// Peak flows for every run, one column per distinct location.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EnsembleTable {
    /// Locations in order of first appearance across runs.
    pub locations: Vec<String>,
    /// Runs in input order. Runs sharing an identity are all kept.
    pub rows: Vec<EnsembleRow>,
}

impl EnsembleTable {
    /// Stack peak rows. Columns are the union of every row's locations.
    pub fn from_peak_rows(peak_rows: &[PeakRow]) -> Self {
        let mut locations: Vec<String> = Vec::new();
        for row in peak_rows {
            for peak in &row.peaks {
                if !locations.contains(&peak.location) {
                    locations.push(peak.location.clone());
                }
            }
        }

        let rows = peak_rows
            .iter()
            .map(|row| EnsembleRow {
                run_id: row.run_id.clone(),
                identity: row.identity.clone(),
                flows: locations.iter().map(|loc| row.peak(loc)).collect(),
            })
            .collect();

        log::info!(
            "aggregated {} runs across {} locations",
            peak_rows.len(),
            locations.len()
        );

        EnsembleTable { locations, rows }
    }

    /// Column position of `location` within each row's flows.
    pub fn location_index(&self, location: &str) -> Option<usize> {
        self.locations.iter().position(|l| l == location)
    }

    /// Distinct events in order of first appearance.
    pub fn events(&self) -> Vec<String> {
        let mut events: Vec<String> = Vec::new();
        for row in &self.rows {
            if !events.contains(&row.identity.event) {
                events.push(row.identity.event.clone());
            }
        }
        events
    }

    /// All column labels: identity columns then `Max Flow <location>`.
    pub fn column_labels(&self) -> Vec<String> {
        IDENTITY_COLUMNS
            .iter()
            .map(|c| c.to_string())
            .chain(self.locations.iter().map(|l| max_flow_label(l)))
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Write the table as CSV with a header row. Missing flows are blank.
    pub fn write_csv<W: Write>(&self, writer: W) -> csv::Result<()> {
        let mut wtr = csv::Writer::from_writer(writer);
        wtr.write_record(self.column_labels())?;
        for row in &self.rows {
            let mut record = vec![
                row.run_id.clone(),
                row.identity.event.clone(),
                row.identity.duration.clone(),
                row.identity.temporal_pattern.clone(),
            ];
            record.extend(row.flows.iter().map(|f| f.map_or(String::new(), |v| v.to_string())));
            wtr.write_record(&record)?;
        }
        wtr.flush()?;
        Ok(())
    }
}

impl FromIterator<PeakRow> for EnsembleTable {
    fn from_iter<I: IntoIterator<Item = PeakRow>>(iter: I) -> Self {
        let rows: Vec<PeakRow> = iter.into_iter().collect();
        EnsembleTable::from_peak_rows(&rows)
    }
}

impl fmt::Display for EnsembleTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rows: Vec<Vec<String>> = self
            .rows
            .iter()
            .map(|row| {
                let mut cells = vec![
                    row.run_id.clone(),
                    row.identity.event.clone(),
                    row.identity.duration.clone(),
                    row.identity.temporal_pattern.clone(),
                ];
                cells.extend(row.flows.iter().map(|v| format_value(*v)));
                cells
            })
            .collect();
        write!(f, "{}", render(&self.column_labels(), &rows))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::peak::LocationPeak;

    fn peak_row(name: &str, peaks: &[(&str, Option<f64>)]) -> PeakRow {
        PeakRow {
            run_id: name.to_string(),
            identity: RunIdentity::parse(name).unwrap(),
            peaks: peaks
                .iter()
                .map(|(loc, v)| LocationPeak {
                    location: loc.to_string(),
                    max_flow: *v,
                })
                .collect(),
        }
    }

    #[test]
    fn test_column_union_with_missing_values() {
        let rows = vec![
            peak_row("M_1EY_60m_tp01_PO.csv", &[("PO_A", Some(1.0))]),
            peak_row("M_1EY_60m_tp02_PO.csv", &[("PO_A", Some(2.0)), ("PO_B", Some(5.0))]),
            peak_row("M_1EY_60m_tp03_PO.csv", &[("PO_A", Some(3.0))]),
        ];
        let table = EnsembleTable::from_peak_rows(&rows);

        assert_eq!(table.locations, vec!["PO_A", "PO_B"]);
        let b = table.location_index("PO_B").unwrap();
        let b_flows: Vec<Option<f64>> = table.rows.iter().map(|r| r.flows[b]).collect();
        assert_eq!(b_flows, vec![None, Some(5.0), None]);
    }

    #[test]
    fn test_order_preserved_and_duplicates_kept() {
        let rows = vec![
            peak_row("M_1EY_720m_tp01_PO.csv", &[("PO_A", Some(1.0))]),
            peak_row("M_1EY_90m_tp01_PO.csv", &[("PO_A", Some(2.0))]),
            peak_row("Copy_1EY_90m_tp01_PO.csv", &[("PO_A", Some(2.5))]),
        ];
        let table: EnsembleTable = rows.into_iter().collect();
        let ids: Vec<&str> = table.rows.iter().map(|r| r.run_id.as_str()).collect();
        assert_eq!(
            ids,
            vec!["M_1EY_720m_tp01_PO.csv", "M_1EY_90m_tp01_PO.csv", "Copy_1EY_90m_tp01_PO.csv"]
        );
    }

    #[test]
    fn test_events_first_appearance() {
        let rows = vec![
            peak_row("M_1EY_60m_tp01_PO.csv", &[]),
            peak_row("M_0.5EY_60m_tp01_PO.csv", &[]),
            peak_row("M_1EY_90m_tp01_PO.csv", &[]),
        ];
        let table = EnsembleTable::from_peak_rows(&rows);
        assert_eq!(table.events(), vec!["1ey", "0.5ey"]);
    }

    #[test]
    fn test_column_labels() {
        let rows = vec![peak_row("M_1EY_60m_tp01_PO.csv", &[("PO_A", Some(1.0))])];
        let table = EnsembleTable::from_peak_rows(&rows);
        assert_eq!(
            table.column_labels(),
            vec!["Run ID", "Event", "Duration", "Temporal Pattern", "Max Flow PO_A"]
        );
    }

    #[test]
    fn test_write_csv() {
        let rows = vec![
            peak_row("M_1EY_60m_tp01_PO.csv", &[("PO_A", Some(1.5))]),
            peak_row("M_1EY_60m_tp02_PO.csv", &[("PO_B", Some(2.0))]),
        ];
        let table = EnsembleTable::from_peak_rows(&rows);
        let mut buf = Vec::new();
        table.write_csv(&mut buf).unwrap();
        let text = String::from_utf8(buf).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "Run ID,Event,Duration,Temporal Pattern,Max Flow PO_A,Max Flow PO_B");
        assert_eq!(lines[1], "M_1EY_60m_tp01_PO.csv,1ey,60m,tp01,1.5,");
        assert_eq!(lines[2], "M_1EY_60m_tp02_PO.csv,1ey,60m,tp02,,2");
    }

    #[test]
    fn test_display_marks_missing() {
        let rows = vec![
            peak_row("M_1EY_60m_tp01_PO.csv", &[("PO_A", Some(1.0))]),
            peak_row("M_1EY_60m_tp02_PO.csv", &[("PO_B", Some(2.0))]),
        ];
        let text = EnsembleTable::from_peak_rows(&rows).to_string();
        assert!(text.contains("Max Flow PO_B"));
        assert!(text.contains("NaN"));
    }
}
