//! Command handler for the covmerge CLI.
//!
//! `cmd_merge` returns its summary as a `String`, making it easy to test
//! without capturing stdout.

use std::fmt::Write as _;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use regex::Regex;

use crate::collect::{self, ReportSources};
use crate::coverage::Coverage;
use crate::parsers::lcov;
use crate::writer::{self, OutputFormat};

#[derive(Debug, Clone, Default, Args)]
pub struct MergeArgs {
    /// Coverage reports to merge.
    pub files: Vec<PathBuf>,

    /// Directory searched recursively for LCOV tracefiles. Repeatable.
    #[arg(long = "coverage-dir")]
    pub coverage_dirs: Vec<PathBuf>,

    /// File listing one report path per line.
    #[arg(long)]
    pub reports_file: Option<PathBuf>,

    /// Where to write the merged report (default: stdout).
    #[arg(long, short)]
    pub output: Option<PathBuf>,

    /// Output format.
    #[arg(long, value_enum, default_value_t = OutputFormat::Lcov)]
    pub format: OutputFormat,

    /// Drop source files whose name matches this regex. Repeatable.
    #[arg(long = "filter-sources")]
    pub filter_sources: Vec<String>,
}

impl MergeArgs {
    fn sources(&self) -> ReportSources {
        ReportSources {
            coverage_dirs: self.coverage_dirs.clone(),
            reports_file: self.reports_file.clone(),
            files: self.files.clone(),
        }
    }

    fn filters(&self) -> Result<Vec<Regex>> {
        self.filter_sources
            .iter()
            .map(|p| {
                Regex::new(p)
                    .map_err(crate::error::CovmergeError::from)
                    .with_context(|| format!("Bad --filter-sources pattern '{}'", p))
            })
            .collect()
    }
}

/// Collect, parse and merge every report, then write the result.
pub fn cmd_merge(args: &MergeArgs) -> Result<String> {
    let filters = args.filters()?;
    let reports = collect::collect_reports(&args.sources()).context("Failed to collect reports")?;

    let mut records = Vec::new();
    for path in &reports {
        let parsed =
            lcov::parse_file(path).with_context(|| format!("Failed to parse {}", path.display()))?;
        records.extend(parsed);
    }
    let partial_records = records.len();

    let mut coverage = Coverage::from_records(records);
    coverage.filter_sources(&filters);

    match &args.output {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("Failed to create {}", path.display()))?;
            let mut out = BufWriter::new(file);
            writer::write(&mut out, &coverage, args.format)?;
        }
        None => {
            let stdout = std::io::stdout();
            let mut out = stdout.lock();
            writer::write(&mut out, &coverage, args.format)?;
            out.flush()?;
        }
    }

    let totals = coverage.totals();
    let mut out = String::new();
    writeln!(
        out,
        "Merged {} partial records from {} reports into {} files",
        partial_records,
        reports.len(),
        totals.files
    )
    .unwrap();
    writeln!(
        out,
        "Lines:      {}/{} ({:.1}%)",
        totals.lines_hit,
        totals.lines_found,
        totals.line_rate() * 100.0
    )
    .unwrap();
    if totals.branches_found > 0 {
        writeln!(
            out,
            "Branches:   {}/{} ({:.1}%)",
            totals.branches_hit,
            totals.branches_found,
            totals.branch_rate() * 100.0
        )
        .unwrap();
    }
    if totals.functions_found > 0 {
        writeln!(
            out,
            "Functions:  {}/{} ({:.1}%)",
            totals.functions_hit,
            totals.functions_found,
            totals.function_rate() * 100.0
        )
        .unwrap();
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write(dir: &std::path::Path, name: &str, content: &str) -> PathBuf {
        let path = dir.join(name);
        std::fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_cmd_merge_to_file() {
        let dir = tempfile::tempdir().unwrap();
        let a = write(
            dir.path(),
            "a.dat",
            "SF:/src/lib.rs\nFN:1,main\nFNDA:1,main\nDA:1,1\nDA:2,0\nend_of_record\n",
        );
        let b = write(
            dir.path(),
            "b.dat",
            "SF:/src/lib.rs\nFN:1,main\nFNDA:2,main\nDA:2,3\nend_of_record\n",
        );
        let output = dir.path().join("merged.dat");

        let args = MergeArgs {
            files: vec![a, b],
            output: Some(output.clone()),
            ..Default::default()
        };
        let summary = cmd_merge(&args).unwrap();

        assert!(summary.contains("Merged 2 partial records from 2 reports into 1 files"));
        assert!(summary.contains("Lines:      2/2 (100.0%)"));
        assert!(summary.contains("Functions:  1/1 (100.0%)"));
        assert!(!summary.contains("Branches"));

        let merged = std::fs::read_to_string(&output).unwrap();
        assert!(merged.contains("FNDA:3,main"));
        assert!(merged.contains("DA:1,1\nDA:2,3\n"));
        assert!(merged.contains("LH:2\nLF:2\n"));
    }

    #[test]
    fn test_cmd_merge_bad_filter() {
        let args = MergeArgs {
            filter_sources: vec!["(".to_string()],
            ..Default::default()
        };
        let err = cmd_merge(&args).unwrap_err();
        assert!(err.to_string().contains("Bad --filter-sources pattern"));
    }

    #[test]
    fn test_cmd_merge_reports_parse_failure_with_path() {
        let dir = tempfile::tempdir().unwrap();
        let bad = write(dir.path(), "bad.dat", "DA:1,1\n");
        let args = MergeArgs {
            files: vec![bad],
            output: Some(dir.path().join("out.dat")),
            ..Default::default()
        };
        let err = cmd_merge(&args).unwrap_err();
        assert!(format!("{:#}", err).contains("bad.dat"));
    }
}
