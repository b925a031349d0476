//! Plain-text run log.
//!
//! A batch appends blocks of text to a [`RunLog`] as it goes (file lists,
//! tables, errors) and writes the whole log to the output folder once at
//! the end, whether the batch succeeded or not.

use anyhow::Context;
use chrono::{DateTime, Utc};
use std::fmt::Display;
use std::fs;
use std::path::{Path, PathBuf};

/// An in-memory log written out as one text file.
#[derive(Debug, Clone)]
pub struct RunLog {
    started: DateTime<Utc>,
    entries: Vec<String>,
}

impl Default for RunLog {
    fn default() -> Self {
        Self::new()
    }
}

impl RunLog {
    pub fn new() -> Self {
        RunLog {
            started: Utc::now(),
            entries: Vec::new(),
        }
    }

    /// Append anything printable as its own block.
    pub fn log<T: Display>(&mut self, item: T) {
        let text = item.to_string();
        log::debug!("run log: {}", text.lines().next().unwrap_or(""));
        self.entries.push(text);
    }

    /// Append a list, one item per line. An empty list is written as `[]`.
    pub fn log_list<T: Display>(&mut self, items: &[T]) {
        if items.is_empty() {
            self.log("[]");
            return;
        }
        let text = items
            .iter()
            .map(|item| format!("  {}", item))
            .collect::<Vec<_>>()
            .join("\n");
        self.log(text);
    }

    pub fn entries(&self) -> &[String] {
        &self.entries
    }

    /// Full log text, headed by the run start time.
    pub fn contents(&self) -> String {
        let mut out = format!("[{}] run started\n\n", self.started.to_rfc3339());
        for entry in &self.entries {
            out.push_str(entry);
            if !entry.ends_with('\n') {
                out.push('\n');
            }
        }
        out
    }

    /// Write the log to `dir/name`, creating `dir` if needed.
    pub fn write_to_txt(&self, dir: &Path, name: &str) -> anyhow::Result<PathBuf> {
        fs::create_dir_all(dir)
            .with_context(|| format!("cannot create output directory {}", dir.display()))?;
        let path = dir.join(name);
        fs::write(&path, self.contents())
            .with_context(|| format!("cannot write {}", path.display()))?;
        log::info!("wrote {}", path.display());
        Ok(path)
    }
}
