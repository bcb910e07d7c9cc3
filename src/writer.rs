//! Serialization of merged coverage back to LCOV, or to JSON.

use std::io::Write;

use crate::coverage::Coverage;
use crate::error::Result;
use crate::model::SourceFileCoverage;

/// Output format of the merged report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum OutputFormat {
    #[default]
    Lcov,
    Json,
}

pub fn write(out: &mut dyn Write, coverage: &Coverage, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Lcov => write_lcov(out, coverage),
        OutputFormat::Json => write_json(out, coverage),
    }
}

/// Write every file as one LCOV section, files ordered by name.
pub fn write_lcov(out: &mut dyn Write, coverage: &Coverage) -> Result<()> {
    for file in coverage.files() {
        write_section(out, file)?;
    }
    out.flush()?;
    Ok(())
}

fn write_section(out: &mut dyn Write, file: &SourceFileCoverage) -> Result<()> {
    writeln!(out, "SF:{}", file.source_file())?;

    for (name, line) in file.function_lines() {
        writeln!(out, "FN:{},{}", line, name)?;
    }
    for (name, count) in file.function_hits() {
        writeln!(out, "FNDA:{},{}", count, name)?;
    }
    writeln!(out, "FNF:{}", file.functions_found())?;
    writeln!(out, "FNH:{}", file.functions_hit())?;

    for branch in file.branches().values() {
        match branch.taken {
            Some(taken) => writeln!(
                out,
                "BRDA:{},{},{},{}",
                branch.line_number, branch.block, branch.branch, taken
            )?,
            None => writeln!(
                out,
                "BRDA:{},{},{},-",
                branch.line_number, branch.block, branch.branch
            )?,
        }
    }
    writeln!(out, "BRF:{}", file.branches_found())?;
    writeln!(out, "BRH:{}", file.branches_hit())?;

    for line in file.lines().values() {
        match &line.checksum {
            Some(checksum) => writeln!(
                out,
                "DA:{},{},{}",
                line.line_number, line.execution_count, checksum
            )?,
            None => writeln!(out, "DA:{},{}", line.line_number, line.execution_count)?,
        }
    }
    writeln!(out, "LH:{}", file.lines_hit())?;
    writeln!(out, "LF:{}", file.lines_found())?;
    writeln!(out, "end_of_record")?;
    Ok(())
}

pub fn write_json(out: &mut dyn Write, coverage: &Coverage) -> Result<()> {
    serde_json::to_writer_pretty(&mut *out, coverage)?;
    writeln!(out)?;
    out.flush()?;
    Ok(())
}
