//! Discovery of partial coverage reports on disk.

use std::collections::BTreeSet;
use std::io::Read;
use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::detect::{self, HEAD_LEN};
use crate::error::{CovmergeError, Result};

/// Where to look for partial reports.
#[derive(Debug, Clone, Default)]
pub struct ReportSources {
    /// Directories searched recursively for tracefiles.
    pub coverage_dirs: Vec<PathBuf>,
    /// File listing one report path per line.
    pub reports_file: Option<PathBuf>,
    /// Reports named explicitly; used as given.
    pub files: Vec<PathBuf>,
}

/// Collect report paths from all sources, sorted and de-duplicated.
pub fn collect_reports(sources: &ReportSources) -> Result<Vec<PathBuf>> {
    let mut found: BTreeSet<PathBuf> = sources.files.iter().cloned().collect();

    for dir in &sources.coverage_dirs {
        found.extend(scan_dir(dir)?);
    }

    if let Some(list) = &sources.reports_file {
        found.extend(read_reports_file(list)?);
    }

    if found.is_empty() {
        return Err(CovmergeError::NoReports);
    }
    log::debug!("Found {} coverage reports", found.len());
    Ok(found.into_iter().collect())
}

/// Recursively find tracefiles under `dir`.
pub fn scan_dir(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut reports = Vec::new();
    for entry in WalkDir::new(dir).follow_links(true).sort_by_file_name() {
        let entry = match entry {
            Ok(entry) => entry,
            Err(err) if err.depth() > 0 => {
                log::warn!("Skipping unreadable entry: {}", err);
                continue;
            }
            Err(err) => return Err(CovmergeError::Io(err.into())),
        };
        if !entry.file_type().is_file() {
            continue;
        }
        let path = entry.path();
        if is_report(path) {
            reports.push(path.to_path_buf());
        }
    }
    Ok(reports)
}

/// Unreadable files are logged and treated as non-reports.
fn is_report(path: &Path) -> bool {
    if detect::has_tracefile_extension(path) {
        return true;
    }
    match sniff(path) {
        Ok(found) => found,
        Err(err) => {
            log::warn!("Skipping unreadable file {}: {}", path.display(), err);
            false
        }
    }
}

fn sniff(path: &Path) -> Result<bool> {
    let mut head = Vec::with_capacity(HEAD_LEN);
    std::fs::File::open(path)?
        .take(HEAD_LEN as u64)
        .read_to_end(&mut head)?;
    Ok(detect::is_tracefile(path, &head))
}

/// Read a list of report paths, one per line. Blank lines and lines
/// starting with `#` are ignored. Relative paths are kept as written.
pub fn read_reports_file(path: &Path) -> Result<Vec<PathBuf>> {
    let content = std::fs::read_to_string(path)?;
    Ok(content
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty() && !l.starts_with('#'))
        .map(PathBuf::from)
        .collect())
}
