//! Storm-space analysis: one event at one location as a duration by
//! temporal-pattern grid of peak flows.

use cse_ensemble::peak::max_flow_label;
use cse_ensemble::EnsembleTable;
use cse_utils::stats::{mean, median};
use cse_utils::table::{format_value, render};
use serde::{Serialize, Serializer};
use std::collections::HashMap;
use std::fmt;

use crate::AnalysisError;

/// Sentinel written where no critical pattern or flow exists.
pub const NOT_AVAILABLE: &str = "NA";

/// The governing temporal pattern of a grid row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CriticalTp {
    Pattern(String),
    /// No pattern lies above the row median.
    NotAvailable,
}

impl CriticalTp {
    pub fn as_pattern(&self) -> Option<&str> {
        match self {
            CriticalTp::Pattern(p) => Some(p),
            CriticalTp::NotAvailable => None,
        }
    }
}

/// Written as the pattern name or the `NA` sentinel.
impl Serialize for CriticalTp {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl fmt::Display for CriticalTp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CriticalTp::Pattern(p) => write!(f, "{}", p),
            CriticalTp::NotAvailable => write!(f, "{}", NOT_AVAILABLE),
        }
    }
}

/// Identity of a grid, written `<event>: Max Flow <location>`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct GridTag {
    pub event: String,
    pub location: String,
}

impl fmt::Display for GridTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.event, max_flow_label(&self.location))
    }
}

/// One storm duration across all temporal patterns.
#[derive(Debug, Clone, PartialEq)]
pub struct GridRow {
    /// Duration in minutes.
    pub duration: u32,
    /// Aligned with [`StormGrid::temporal_patterns`]; `None` where the run
    /// is absent or reported no flow.
    pub flows: Vec<Option<f64>>,
    pub average: Option<f64>,
    pub median: Option<f64>,
    pub critical_tp: CriticalTp,
}

impl GridRow {
    fn new(duration: u32, patterns: &[String], flows: Vec<Option<f64>>) -> Self {
        let average = mean(&flows);
        let median = median(&flows);
        let critical_tp = critical_temporal_pattern(patterns, &flows, median);
        GridRow {
            duration,
            flows,
            average,
            median,
            critical_tp,
        }
    }
}

/// Peak flows for one (event, location) pair, rows sorted by duration.
#[derive(Debug, Clone, PartialEq)]
pub struct StormGrid {
    pub tag: GridTag,
    /// Column order, lexicographic.
    pub temporal_patterns: Vec<String>,
    pub rows: Vec<GridRow>,
}

impl StormGrid {
    /// Pivot the ensemble rows of `event` into a duration by
    /// temporal-pattern grid of `location`'s peak flows.
    ///
    /// A duration/pattern pair seen twice, or two duration labels that
    /// read as the same number of minutes, is an error.
    pub fn analyze(
        table: &EnsembleTable,
        location: &str,
        event: &str,
    ) -> Result<Self, AnalysisError> {
        let loc = table
            .location_index(location)
            .ok_or_else(|| AnalysisError::UnknownLocation {
                location: location.to_string(),
            })?;

        // (duration label, pattern) -> (run id, flow)
        let mut cells: HashMap<(&str, &str), (&str, Option<f64>)> = HashMap::new();
        let mut duration_labels: Vec<&str> = Vec::new();
        let mut patterns: Vec<String> = Vec::new();

        for row in table.rows.iter().filter(|r| r.identity.event == event) {
            let duration = row.identity.duration.as_str();
            let pattern = row.identity.temporal_pattern.as_str();
            if let Some((first_run, _)) = cells.get(&(duration, pattern)) {
                return Err(AnalysisError::DuplicateRun {
                    event: event.to_string(),
                    location: location.to_string(),
                    duration: duration.to_string(),
                    temporal_pattern: pattern.to_string(),
                    first_run: first_run.to_string(),
                    second_run: row.run_id.clone(),
                });
            }
            cells.insert((duration, pattern), (row.run_id.as_str(), row.flows[loc]));
            if !duration_labels.contains(&duration) {
                duration_labels.push(duration);
            }
            if !patterns.iter().any(|p| p == pattern) {
                patterns.push(pattern.to_string());
            }
        }
        patterns.sort();

        let mut durations: Vec<(u32, &str)> = Vec::with_capacity(duration_labels.len());
        for label in duration_labels {
            let minutes = duration_minutes(label).ok_or_else(|| AnalysisError::InvalidDuration {
                event: event.to_string(),
                location: location.to_string(),
                label: label.to_string(),
            })?;
            if let Some((_, first)) = durations.iter().find(|(m, _)| *m == minutes) {
                return Err(AnalysisError::DurationCollision {
                    event: event.to_string(),
                    location: location.to_string(),
                    first: first.to_string(),
                    second: label.to_string(),
                    minutes,
                });
            }
            durations.push((minutes, label));
        }
        durations.sort_by_key(|(minutes, _)| *minutes);

        let rows = durations
            .iter()
            .map(|(minutes, label)| {
                let flows = patterns
                    .iter()
                    .map(|p| cells.get(&(*label, p.as_str())).and_then(|(_, v)| *v))
                    .collect();
                GridRow::new(*minutes, &patterns, flows)
            })
            .collect::<Vec<_>>();

        let grid = StormGrid {
            tag: GridTag {
                event: event.to_string(),
                location: location.to_string(),
            },
            temporal_patterns: patterns,
            rows,
        };
        log::debug!(
            "{}: {} durations x {} temporal patterns",
            grid.tag,
            grid.rows.len(),
            grid.temporal_patterns.len()
        );
        Ok(grid)
    }

    /// Flow in `row` under temporal pattern `pattern`.
    pub fn value(&self, row: &GridRow, pattern: &str) -> Option<f64> {
        self.temporal_patterns
            .iter()
            .position(|p| p == pattern)
            .and_then(|i| row.flows.get(i).copied().flatten())
    }

    pub fn durations(&self) -> Vec<u32> {
        self.rows.iter().map(|r| r.duration).collect()
    }
}

impl fmt::Display for StormGrid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut headers = vec!["Duration".to_string()];
        headers.extend(self.temporal_patterns.iter().cloned());
        headers.extend(["Average", "Median", "Critical TP"].map(String::from));

        let rows: Vec<Vec<String>> = self
            .rows
            .iter()
            .map(|row| {
                let mut cells = vec![row.duration.to_string()];
                cells.extend(row.flows.iter().map(|v| format_value(*v)));
                cells.push(format_value(row.average));
                cells.push(format_value(row.median));
                cells.push(row.critical_tp.to_string());
                cells
            })
            .collect();

        writeln!(f, "{}", self.tag)?;
        write!(f, "{}", render(&headers, &rows))
    }
}

/// Minutes encoded in a duration label: every non-digit is stripped and
/// the rest read as an integer. `None` when no digits remain.
pub fn duration_minutes(label: &str) -> Option<u32> {
    let digits: String = label.chars().filter(|c| c.is_ascii_digit()).collect();
    digits.parse().ok()
}

/// The pattern whose flow is nearest above the median.
///
/// Only present flows strictly greater than `median` qualify; the one with
/// the smallest excess wins, the earlier column on a tie. This is the
/// pattern closest to the median from above, not the largest flow.
pub fn critical_temporal_pattern(
    patterns: &[String],
    flows: &[Option<f64>],
    median: Option<f64>,
) -> CriticalTp {
    let Some(median) = median else {
        return CriticalTp::NotAvailable;
    };

    let mut best: Option<(&str, f64)> = None;
    for (pattern, flow) in patterns.iter().zip(flows) {
        let Some(flow) = flow else { continue };
        let excess = flow - median;
        if excess <= 0.0 {
            continue;
        }
        match best {
            Some((_, best_excess)) if best_excess <= excess => {}
            _ => best = Some((pattern.as_str(), excess)),
        }
    }

    match best {
        Some((pattern, _)) => CriticalTp::Pattern(pattern.to_string()),
        None => CriticalTp::NotAvailable,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cse_ensemble::{LocationPeak, PeakRow, RunIdentity};

    fn run(name: &str, flow: Option<f64>) -> PeakRow {
        PeakRow {
            run_id: name.to_string(),
            identity: RunIdentity::parse(name).unwrap(),
            peaks: vec![LocationPeak {
                location: "PO_A".to_string(),
                max_flow: flow,
            }],
        }
    }

    fn patterns(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_duration_sort_is_numeric() {
        let table = EnsembleTable::from_peak_rows(&[
            run("M_1EY_720m_tp01_PO.csv", Some(1.0)),
            run("M_1EY_90m_tp01_PO.csv", Some(2.0)),
            run("M_1EY_360m_tp01_PO.csv", Some(3.0)),
        ]);
        let grid = StormGrid::analyze(&table, "PO_A", "1ey").unwrap();
        assert_eq!(grid.durations(), vec![90, 360, 720]);
        assert_eq!(grid.rows[0].flows, vec![Some(2.0)]);
    }

    #[test]
    fn test_pivot_filters_event_and_fills_missing() {
        let table = EnsembleTable::from_peak_rows(&[
            run("M_1EY_60m_tp02_PO.csv", Some(4.0)),
            run("M_1EY_60m_tp01_PO.csv", Some(3.0)),
            run("M_1EY_90m_tp01_PO.csv", Some(5.0)),
            run("M_0.5EY_60m_tp01_PO.csv", Some(50.0)),
        ]);
        let grid = StormGrid::analyze(&table, "PO_A", "1ey").unwrap();
        assert_eq!(grid.temporal_patterns, patterns(&["tp01", "tp02"]));
        assert_eq!(grid.rows[0].flows, vec![Some(3.0), Some(4.0)]);
        assert_eq!(grid.rows[1].flows, vec![Some(5.0), None]);
        assert_eq!(grid.tag.to_string(), "1ey: Max Flow PO_A");
    }

    #[test]
    fn test_duplicate_run_fails() {
        let table = EnsembleTable::from_peak_rows(&[
            run("M_1EY_60m_tp01_PO.csv", Some(1.0)),
            run("N_1EY_60m_tp01_PO.csv", Some(2.0)),
        ]);
        let err = StormGrid::analyze(&table, "PO_A", "1ey").unwrap_err();
        match err {
            AnalysisError::DuplicateRun {
                first_run,
                second_run,
                ..
            } => {
                assert_eq!(first_run, "M_1EY_60m_tp01_PO.csv");
                assert_eq!(second_run, "N_1EY_60m_tp01_PO.csv");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_colliding_durations_fail() {
        let table = EnsembleTable::from_peak_rows(&[
            run("M_1EY_60m_tp01_PO.csv", Some(1.0)),
            run("M_1EY_060m_tp02_PO.csv", Some(2.0)),
        ]);
        let err = StormGrid::analyze(&table, "PO_A", "1ey").unwrap_err();
        assert!(matches!(err, AnalysisError::DurationCollision { minutes: 60, .. }));
    }

    #[test]
    fn test_unknown_location() {
        let table = EnsembleTable::from_peak_rows(&[run("M_1EY_60m_tp01_PO.csv", Some(1.0))]);
        let err = StormGrid::analyze(&table, "PO_Z", "1ey").unwrap_err();
        assert!(matches!(err, AnalysisError::UnknownLocation { .. }));
    }

    #[test]
    fn test_average_and_median_ignore_missing() {
        let table = EnsembleTable::from_peak_rows(&[
            run("M_1EY_60m_tp01_PO.csv", Some(2.0)),
            run("M_1EY_60m_tp02_PO.csv", None),
            run("M_1EY_60m_tp03_PO.csv", Some(6.0)),
            run("M_1EY_60m_tp04_PO.csv", Some(10.0)),
        ]);
        let grid = StormGrid::analyze(&table, "PO_A", "1ey").unwrap();
        assert_eq!(grid.rows[0].average, Some(6.0));
        assert_eq!(grid.rows[0].median, Some(6.0));
        assert_eq!(grid.rows[0].critical_tp, CriticalTp::Pattern("tp04".to_string()));
    }

    #[test]
    fn test_critical_tp_nearest_above_median() {
        let flows = vec![Some(8.0), Some(10.0), Some(12.0), Some(15.0)];
        let tp = critical_temporal_pattern(
            &patterns(&["tp01", "tp02", "tp03", "tp04"]),
            &flows,
            Some(10.0),
        );
        assert_eq!(tp, CriticalTp::Pattern("tp03".to_string()));
    }

    #[test]
    fn test_critical_tp_all_equal_to_median() {
        let flows = vec![Some(5.0), Some(5.0), Some(5.0)];
        let tp = critical_temporal_pattern(&patterns(&["tp01", "tp02", "tp03"]), &flows, Some(5.0));
        assert_eq!(tp, CriticalTp::NotAvailable);
        assert_eq!(tp.to_string(), "NA");
    }

    #[test]
    fn test_critical_tp_single_value_row() {
        let flows = vec![None, Some(4.0), None];
        let tp = critical_temporal_pattern(&patterns(&["tp01", "tp02", "tp03"]), &flows, median(&flows));
        assert_eq!(tp, CriticalTp::NotAvailable);
    }

    #[test]
    fn test_critical_tp_tie_takes_first_column() {
        let flows = vec![Some(1.0), Some(3.0), Some(2.0), Some(3.0)];
        // median 2.5, tp02 and tp04 both exceed it by 0.5
        let tp = critical_temporal_pattern(
            &patterns(&["tp01", "tp02", "tp03", "tp04"]),
            &flows,
            Some(2.5),
        );
        assert_eq!(tp, CriticalTp::Pattern("tp02".to_string()));
    }

    #[test]
    fn test_critical_tp_without_median() {
        let tp = critical_temporal_pattern(&patterns(&["tp01"]), &[None], None);
        assert_eq!(tp, CriticalTp::NotAvailable);
    }

    #[test]
    fn test_duration_minutes() {
        assert_eq!(duration_minutes("720m"), Some(720));
        assert_eq!(duration_minutes("m"), None);
    }

    #[test]
    fn test_grid_tag_display() {
        let tag = GridTag {
            event: "0.5ey".to_string(),
            location: "PO:B".to_string(),
        };
        assert_eq!(tag.to_string(), "0.5ey: Max Flow PO:B");
    }

    #[test]
    fn test_value_lookup() {
        let table = EnsembleTable::from_peak_rows(&[
            run("M_1EY_60m_tp01_PO.csv", Some(1.0)),
            run("M_1EY_60m_tp02_PO.csv", Some(2.0)),
        ]);
        let grid = StormGrid::analyze(&table, "PO_A", "1ey").unwrap();
        assert_eq!(grid.value(&grid.rows[0], "tp02"), Some(2.0));
        assert_eq!(grid.value(&grid.rows[0], "tp09"), None);
    }

    #[test]
    fn test_display_includes_tag_and_stats_columns() {
        let table = EnsembleTable::from_peak_rows(&[run("M_1EY_60m_tp01_PO.csv", Some(1.0))]);
        let text = StormGrid::analyze(&table, "PO_A", "1ey").unwrap().to_string();
        let mut lines = text.lines();
        assert_eq!(lines.next(), Some("1ey: Max Flow PO_A"));
        let header = lines.next().unwrap();
        assert!(header.starts_with("Duration"));
        assert!(header.ends_with("Critical TP"));
    }
}
