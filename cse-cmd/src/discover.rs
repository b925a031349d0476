//! Result file discovery and staging into a working folder.

use anyhow::{bail, Context};
use log::info;
use std::fs;
use std::path::{Path, PathBuf};

/// Default suffix of result files, matched case-insensitively.
pub const RESULT_FILE_SUFFIX: &str = "_po.csv";

/// Default working folder that inputs are copied into.
pub const WORK_DIR: &str = "_local";

/// Find result files directly inside `input_dir` whose lowercased name
/// contains `suffix`. Sorted by file name so runs are repeatable.
pub fn find_result_files(input_dir: &Path, suffix: &str) -> anyhow::Result<Vec<PathBuf>> {
    let suffix = suffix.to_lowercase();
    let mut files = Vec::new();

    let entries = fs::read_dir(input_dir)
        .with_context(|| format!("cannot read input folder {}", input_dir.display()))?;
    for entry in entries {
        let entry = entry?;
        let name = entry.file_name().to_string_lossy().to_lowercase();
        if name.contains(&suffix) && entry.file_type()?.is_file() {
            files.push(entry.path());
        }
    }
    files.sort_by_key(|p| p.file_name().map(|n| n.to_os_string()));

    info!(
        "found {} result files in {}",
        files.len(),
        input_dir.display()
    );
    Ok(files)
}

/// Absolute form of `path` with symlinks resolved for the part that
/// already exists.
fn resolve(path: &Path) -> anyhow::Result<PathBuf> {
    let absolute = std::path::absolute(path)
        .with_context(|| format!("cannot resolve {}", path.display()))?;

    let mut existing = absolute.as_path();
    let mut missing = Vec::new();
    while !existing.exists() {
        match (existing.parent(), existing.file_name()) {
            (Some(parent), Some(name)) => {
                missing.push(name.to_os_string());
                existing = parent;
            }
            _ => return Ok(absolute),
        }
    }

    let mut resolved = fs::canonicalize(existing)
        .with_context(|| format!("cannot resolve {}", existing.display()))?;
    for name in missing.iter().rev() {
        resolved.push(name);
    }
    Ok(resolved)
}

/// Refuse a working folder whose removal would take input or output
/// files with it: it may not be, contain or sit inside `input_dir`, and
/// may not be or contain `output_dir`.
pub fn check_work_dir(work_dir: &Path, input_dir: &Path, output_dir: &Path) -> anyhow::Result<()> {
    let work = resolve(work_dir)?;
    let input = resolve(input_dir)?;
    let output = resolve(output_dir)?;

    if input.starts_with(&work) {
        bail!(
            "working folder {} is or contains the input folder {}",
            work.display(),
            input.display()
        );
    }
    if work.starts_with(&input) {
        bail!(
            "working folder {} is inside the input folder {}",
            work.display(),
            input.display()
        );
    }
    if output.starts_with(&work) {
        bail!(
            "working folder {} is or contains the output folder {}",
            work.display(),
            output.display()
        );
    }
    Ok(())
}

/// Remove and recreate `work_dir`, then copy every file into it.
/// Returns the copied paths in input order.
pub fn stage_inputs(files: &[PathBuf], work_dir: &Path) -> anyhow::Result<Vec<PathBuf>> {
    if work_dir.exists() {
        fs::remove_dir_all(work_dir)
            .with_context(|| format!("cannot clear working folder {}", work_dir.display()))?;
    }
    fs::create_dir_all(work_dir)
        .with_context(|| format!("cannot create working folder {}", work_dir.display()))?;

    let mut staged = Vec::with_capacity(files.len());
    for path in files {
        let name = path
            .file_name()
            .with_context(|| format!("{} has no file name", path.display()))?;
        let target = work_dir.join(name);
        fs::copy(path, &target).with_context(|| {
            format!("cannot copy {} to {}", path.display(), target.display())
        })?;
        staged.push(target);
    }

    info!("staged {} files in {}", staged.len(), work_dir.display());
    Ok(staged)
}
