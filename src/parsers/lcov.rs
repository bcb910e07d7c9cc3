/// Parser for the LCOV tracefile format.
///
/// Reference: https://ltp.sourceforge.net/coverage/lcov/geninfo.1.php
///
/// Key records:
///   TN:<test name>
///   SF:<absolute path to source file>
///   FN:<line>[,<end line>],<function name>
///   FNDA:<execution count>,<function name>
///   FNF:<number of functions found>
///   FNH:<number of functions hit>
///   DA:<line number>,<execution count>[,<checksum>]
///   BRDA:<line>,<block>,<branch>,<taken>   ("-" means never reached)
///   BRF:<branches found>
///   BRH:<branches hit>
///   LF:<lines found>
///   LH:<lines hit>
///   end_of_record
use std::io::BufRead;
use std::path::Path;

use crate::error::{CovmergeError, Result};
use crate::model::{BranchCoverage, Counters, LineCoverage, SourceFileCoverage};

/// Parse LCOV data from raw bytes, one record per `SF` section.
pub fn parse(input: &[u8]) -> Result<Vec<SourceFileCoverage>> {
    let mut files = Vec::new();
    parse_streaming(&mut &*input, &mut |file| {
        files.push(file);
        Ok(())
    })?;
    Ok(files)
}

/// Parse a tracefile from disk.
pub fn parse_file(path: &Path) -> Result<Vec<SourceFileCoverage>> {
    let file = std::fs::File::open(path)?;
    let mut reader = std::io::BufReader::new(file);
    let mut files = Vec::new();
    parse_streaming(&mut reader, &mut |file| {
        files.push(file);
        Ok(())
    })?;
    log::debug!("Parsed {} source files from {}", files.len(), path.display());
    Ok(files)
}

/// Summary values a section declares about itself. Only used to report
/// disagreement with the counters derived from its detail.
#[derive(Default)]
struct DeclaredCounters {
    functions_found: Option<usize>,
    functions_hit: Option<usize>,
    branches_found: Option<usize>,
    branches_hit: Option<usize>,
    lines_found: Option<usize>,
    lines_hit: Option<usize>,
}

impl DeclaredCounters {
    fn check(&self, file: &SourceFileCoverage) {
        let derived: Counters = file.counters();
        let pairs = [
            ("FNF", self.functions_found, derived.functions_found),
            ("FNH", self.functions_hit, derived.functions_hit),
            ("BRF", self.branches_found, derived.branches_found),
            ("BRH", self.branches_hit, derived.branches_hit),
            ("LF", self.lines_found, derived.lines_found),
            ("LH", self.lines_hit, derived.lines_hit),
        ];
        for (tag, declared, derived) in pairs {
            if let Some(declared) = declared {
                if declared != derived {
                    log::warn!(
                        "{}: {} declares {} but detail gives {}; using {}",
                        file.source_file(),
                        tag,
                        declared,
                        derived,
                        derived
                    );
                }
            }
        }
    }
}

fn finish(
    mut file: SourceFileCoverage,
    declared: &DeclaredCounters,
    emit: &mut dyn FnMut(SourceFileCoverage) -> Result<()>,
) -> Result<()> {
    file.recompute_counters();
    declared.check(&file);
    emit(file)
}

fn number<T: std::str::FromStr>(value: &str, what: &str, lineno: usize) -> Result<T> {
    value
        .trim()
        .parse::<T>()
        .map_err(|_| CovmergeError::parse(lineno, format!("invalid {}: '{}'", what, value)))
}

/// Streaming LCOV parser, calls `emit` once per `end_of_record`.
pub fn parse_streaming(
    reader: &mut dyn BufRead,
    emit: &mut dyn FnMut(SourceFileCoverage) -> Result<()>,
) -> Result<()> {
    let mut current_file: Option<SourceFileCoverage> = None;
    let mut declared = DeclaredCounters::default();

    let mut raw_line = String::new();
    let mut lineno = 0;
    loop {
        raw_line.clear();
        let n = reader.read_line(&mut raw_line)?;
        if n == 0 {
            break; // EOF
        }
        lineno += 1;

        let line = raw_line.trim();
        if line.is_empty() {
            continue;
        }

        if line == "end_of_record" {
            if let Some(file) = current_file.take() {
                finish(file, &declared, emit)?;
            }
            declared = DeclaredCounters::default();
            continue;
        }

        let (tag, value) = match line.split_once(':') {
            Some(pair) => pair,
            None => continue,
        };

        if tag == "SF" {
            if let Some(file) = current_file.take() {
                // Previous section was not terminated.
                finish(file, &declared, emit)?;
            }
            current_file = Some(SourceFileCoverage::new(value));
            declared = DeclaredCounters::default();
            continue;
        }
        if tag == "TN" {
            continue;
        }

        let is_known = matches!(
            tag,
            "FN" | "FNDA" | "DA" | "BRDA" | "FNF" | "FNH" | "BRF" | "BRH" | "LF" | "LH"
        );
        if !is_known {
            continue;
        }
        let file = current_file
            .as_mut()
            .ok_or_else(|| CovmergeError::parse(lineno, format!("{} record before SF", tag)))?;

        match tag {
            "FN" => {
                // FN:<line>,<name> or FN:<line>,<end line>,<name>
                let (line_str, rest) = value
                    .split_once(',')
                    .ok_or_else(|| CovmergeError::parse(lineno, "FN without function name"))?;
                let start_line = number::<u32>(line_str, "function line", lineno)?;
                let name = match rest.split_once(',') {
                    Some((end, name)) if end.parse::<u32>().is_ok() => name,
                    _ => rest,
                };
                file.add_function_line(name, start_line);
            }
            "FNDA" => {
                let (count_str, name) = value
                    .split_once(',')
                    .ok_or_else(|| CovmergeError::parse(lineno, "FNDA without function name"))?;
                let count = number::<u64>(count_str, "function execution count", lineno)?;
                file.add_function_hit(name, count);
            }
            "DA" => {
                // Negative counts mark non-instrumentable lines; skip them.
                let parts: Vec<&str> = value.splitn(3, ',').collect();
                if parts.len() < 2 {
                    return Err(CovmergeError::parse(
                        lineno,
                        format!("malformed DA: '{}'", value),
                    ));
                }
                let line_number = number::<u32>(parts[0], "line number", lineno)?;
                let count = number::<i64>(parts[1], "line execution count", lineno)?;
                if count >= 0 {
                    file.add_line(LineCoverage {
                        line_number,
                        execution_count: count as u64,
                        checksum: parts.get(2).map(|c| c.to_string()),
                    });
                }
            }
            "BRDA" => {
                let parts: Vec<&str> = value.splitn(4, ',').collect();
                if parts.len() != 4 {
                    return Err(CovmergeError::parse(
                        lineno,
                        format!("malformed BRDA: '{}'", value),
                    ));
                }
                let line_number = number::<u32>(parts[0], "branch line", lineno)?;
                let block = number::<u32>(parts[1], "branch block", lineno)?;
                let branch = number::<u32>(parts[2], "branch number", lineno)?;
                let taken = if parts[3] == "-" {
                    None
                } else {
                    Some(number::<u64>(parts[3], "branch taken count", lineno)?)
                };
                file.add_branch(BranchCoverage::new(line_number, block, branch, taken));
            }
            "FNF" => declared.functions_found = Some(number(value, "FNF", lineno)?),
            "FNH" => declared.functions_hit = Some(number(value, "FNH", lineno)?),
            "BRF" => declared.branches_found = Some(number(value, "BRF", lineno)?),
            "BRH" => declared.branches_hit = Some(number(value, "BRH", lineno)?),
            "LF" => declared.lines_found = Some(number(value, "LF", lineno)?),
            "LH" => declared.lines_hit = Some(number(value, "LH", lineno)?),
            _ => {}
        }
    }

    // Handle case where file ends without end_of_record
    if let Some(file) = current_file.take() {
        finish(file, &declared, emit)?;
    }

    Ok(())
}
