//! Shared utility functions for critical storm crates.

/// File name helpers
pub mod files {
    use std::collections::HashSet;
    use std::path::Path;

    /// Characters that cannot safely appear in an output file name.
    /// Underscores and dashes are kept since result file names use them.
    pub const INVALID_FILENAME_CHARS: &str = r"%:/,\[]<>*?";

    /// Replace troublesome characters in a proposed file name with `-`.
    pub fn str_to_valid_filename(name: &str) -> String {
        name.chars()
            .map(|c| if INVALID_FILENAME_CHARS.contains(c) { '-' } else { c })
            .collect()
    }

    /// The final component of a path as a string, or the whole input
    /// when it has no file name component.
    pub fn basename(path: &Path) -> String {
        path.file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.to_string_lossy().into_owned())
    }

    /// Basenames present in `raw_inputs` but absent from `saved_inputs`,
    /// in `raw_inputs` order.
    pub fn skipped_inputs<P: AsRef<Path>, Q: AsRef<Path>>(
        raw_inputs: &[P],
        saved_inputs: &[Q],
    ) -> Vec<String> {
        let saved: HashSet<String> = saved_inputs
            .iter()
            .map(|p| basename(p.as_ref()))
            .collect();
        raw_inputs
            .iter()
            .map(|p| basename(p.as_ref()))
            .filter(|name| !saved.contains(name))
            .collect()
    }

    #[cfg(test)]
    mod tests {
        use super::*;
        use std::path::PathBuf;

        #[test]
        fn test_str_to_valid_filename() {
            assert_eq!(
                str_to_valid_filename("1%ey: Max Flow PO_1 [a/b], <x>*?"),
                "1-ey- Max Flow PO_1 -a-b-- -x---"
            );
            assert_eq!(str_to_valid_filename(r"a\b"), "a-b");
        }

        #[test]
        fn test_str_to_valid_filename_keeps_dash_and_underscore() {
            assert_eq!(str_to_valid_filename("PO_Line-1.csv"), "PO_Line-1.csv");
        }

        #[test]
        fn test_skipped_inputs_compares_basenames() {
            let raw = vec![
                PathBuf::from("/in/a_PO.csv"),
                PathBuf::from("/in/b_PO.csv"),
                PathBuf::from("/in/c_PO.csv"),
            ];
            let saved = vec![PathBuf::from("_local/a_PO.csv"), PathBuf::from("_local/c_PO.csv")];
            assert_eq!(skipped_inputs(&raw, &saved), vec!["b_PO.csv".to_string()]);
        }

        #[test]
        fn test_skipped_inputs_none_skipped() {
            let raw = vec![PathBuf::from("x/a.csv")];
            assert!(skipped_inputs(&raw, &raw).is_empty());
        }
    }
}

/// Missing-aware statistics over rows of optional values
pub mod stats {
    /// Arithmetic mean of the present values, `None` if there are none.
    pub fn mean(values: &[Option<f64>]) -> Option<f64> {
        let present: Vec<f64> = values.iter().flatten().copied().collect();
        if present.is_empty() {
            return None;
        }
        Some(present.iter().sum::<f64>() / present.len() as f64)
    }

    /// Median of the present values, `None` if there are none.
    /// An even count averages the two middle values.
    pub fn median(values: &[Option<f64>]) -> Option<f64> {
        let mut present: Vec<f64> = values.iter().flatten().copied().collect();
        if present.is_empty() {
            return None;
        }
        present.sort_by(|a, b| a.total_cmp(b));
        let mid = present.len() / 2;
        if present.len() % 2 == 0 {
            Some((present[mid - 1] + present[mid]) / 2.0)
        } else {
            Some(present[mid])
        }
    }

    /// Maximum of the present values, `None` if there are none.
    pub fn max(values: &[Option<f64>]) -> Option<f64> {
        values
            .iter()
            .flatten()
            .copied()
            .max_by(|a, b| a.total_cmp(b))
    }

}

/// Plain-text table rendering for logs and result files
pub mod table {
    /// Placeholder written for a missing numeric cell.
    pub const MISSING: &str = "NaN";

    /// Format an optional flow value with three decimals.
    pub fn format_value(value: Option<f64>) -> String {
        match value {
            Some(v) => format!("{:.3}", v),
            None => MISSING.to_string(),
        }
    }

    /// Render rows as a left-aligned, space-padded text table with a
    /// dashed rule under the header.
    pub fn render(headers: &[String], rows: &[Vec<String>]) -> String {
        let mut widths: Vec<usize> = headers.iter().map(|h| h.chars().count()).collect();
        for row in rows {
            for (i, cell) in row.iter().enumerate() {
                let len = cell.chars().count();
                match widths.get_mut(i) {
                    Some(w) => *w = (*w).max(len),
                    None => widths.push(len),
                }
            }
        }

        let format_row = |cells: &[String]| -> String {
            let line = cells
                .iter()
                .enumerate()
                .map(|(i, cell)| format!("{:<width$}", cell, width = widths[i]))
                .collect::<Vec<_>>()
                .join("  ");
            line.trim_end().to_string()
        };

        let mut out = String::new();
        out.push_str(&format_row(headers));
        out.push('\n');
        let rule: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
        out.push_str(&format_row(&rule));
        out.push('\n');
        for row in rows {
            out.push_str(&format_row(row));
            out.push('\n');
        }
        out
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[test]
        fn test_format_value() {
            assert_eq!(format_value(Some(7.0)), "7.000");
            assert_eq!(format_value(None), "NaN");
        }

        #[test]
        fn test_render_pads_columns() {
            let headers = vec!["Event".to_string(), "Flow".to_string()];
            let rows = vec![
                vec!["0.5ey".to_string(), "12.000".to_string()],
                vec!["1ey".to_string(), "9.500".to_string()],
            ];
            let text = render(&headers, &rows);
            let lines: Vec<&str> = text.lines().collect();
            assert_eq!(lines[0], "Event  Flow");
            assert_eq!(lines[1], "-----  ------");
            assert_eq!(lines[2], "0.5ey  12.000");
            assert_eq!(lines[3], "1ey    9.500");
        }
    }
}
