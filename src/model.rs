//! In-memory coverage record for a single source file. Parsers build a
//! `SourceFileCoverage` entry by entry; the merge driver combines two of them
//! into a new one.

use std::collections::BTreeMap;

use serde::Serialize;

/// Compute a coverage rate, returning 0.0 when the total is zero.
#[must_use]
pub fn rate(covered: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        covered as f64 / total as f64
    }
}

/// Execution outcome of one instrumented line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LineCoverage {
    pub line_number: u32,
    pub execution_count: u64,
    /// Optional checksum carried by the `DA` record.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub checksum: Option<String>,
}

impl LineCoverage {
    pub fn new(line_number: u32, execution_count: u64) -> Self {
        Self {
            line_number,
            execution_count,
            checksum: None,
        }
    }

    /// Sum the execution counts of two records for the same line.
    #[must_use]
    pub fn merge(&self, other: &LineCoverage) -> LineCoverage {
        debug_assert_eq!(self.line_number, other.line_number);
        LineCoverage {
            line_number: self.line_number,
            execution_count: self.execution_count.saturating_add(other.execution_count),
            checksum: self.checksum.clone().or_else(|| other.checksum.clone()),
        }
    }
}

/// Outcome of a conditional branch on a given line.
///
/// Records are keyed by line number only, so a file holds at most one branch
/// per line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BranchCoverage {
    pub line_number: u32,
    pub block: u32,
    pub branch: u32,
    /// `None` when the enclosing block was never reached (`-` in LCOV).
    pub taken: Option<u64>,
    pub executed: bool,
}

impl BranchCoverage {
    pub fn new(line_number: u32, block: u32, branch: u32, taken: Option<u64>) -> Self {
        Self {
            line_number,
            block,
            branch,
            taken,
            executed: taken.is_some_and(|t| t > 0),
        }
    }

    /// A branch on block 0, branch 0 that was either taken once or never.
    pub fn with_executed(line_number: u32, executed: bool) -> Self {
        Self::new(line_number, 0, 0, Some(u64::from(executed)))
    }

    pub fn was_executed(&self) -> bool {
        self.executed
    }

    /// OR the executed flags and sum the taken counts. The smaller
    /// `(block, branch)` pair is kept, so the result does not depend on
    /// argument order.
    #[must_use]
    pub fn merge(&self, other: &BranchCoverage) -> BranchCoverage {
        debug_assert_eq!(self.line_number, other.line_number);
        let (block, branch) = (self.block, self.branch).min((other.block, other.branch));
        let taken = match (self.taken, other.taken) {
            (None, None) => None,
            (a, b) => Some(a.unwrap_or(0).saturating_add(b.unwrap_or(0))),
        };
        BranchCoverage {
            line_number: self.line_number,
            block,
            branch,
            taken,
            executed: self.executed || other.executed,
        }
    }
}

/// Summary counters of a record. Always derivable from its detail.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Counters {
    pub functions_found: usize,
    pub functions_hit: usize,
    pub branches_found: usize,
    pub branches_hit: usize,
    pub lines_hit: usize,
    pub lines_found: usize,
}

/// Coverage data for a single source file.
///
/// `Clone` gives an independent deep copy: detail maps and counters are
/// duplicated, nothing is shared with the original.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SourceFileCoverage {
    source_file: String,
    /// Function name -> declaration line.
    function_lines: BTreeMap<String, u32>,
    /// Function name -> execution count.
    function_hits: BTreeMap<String, u64>,
    lines: BTreeMap<u32, LineCoverage>,
    branches: BTreeMap<u32, BranchCoverage>,
    #[serde(flatten)]
    counters: Counters,
}

impl SourceFileCoverage {
    pub fn new(source_file: impl Into<String>) -> Self {
        Self {
            source_file: source_file.into(),
            ..Default::default()
        }
    }

    pub fn source_file(&self) -> &str {
        &self.source_file
    }

    pub fn function_lines(&self) -> &BTreeMap<String, u32> {
        &self.function_lines
    }

    pub fn function_hits(&self) -> &BTreeMap<String, u64> {
        &self.function_hits
    }

    pub fn lines(&self) -> &BTreeMap<u32, LineCoverage> {
        &self.lines
    }

    pub fn branches(&self) -> &BTreeMap<u32, BranchCoverage> {
        &self.branches
    }

    pub fn add_function_line(&mut self, name: impl Into<String>, line_number: u32) {
        self.function_lines.insert(name.into(), line_number);
    }

    pub fn add_all_function_lines(&mut self, entries: BTreeMap<String, u32>) {
        self.function_lines.extend(entries);
    }

    pub fn add_function_hit(&mut self, name: impl Into<String>, execution_count: u64) {
        self.function_hits.insert(name.into(), execution_count);
    }

    pub fn add_all_function_hits(&mut self, entries: BTreeMap<String, u64>) {
        self.function_hits.extend(entries);
    }

    pub fn add_line(&mut self, line: LineCoverage) {
        self.lines.insert(line.line_number, line);
    }

    pub fn add_all_lines(&mut self, lines: BTreeMap<u32, LineCoverage>) {
        self.lines.extend(lines);
    }

    pub fn add_branch(&mut self, branch: BranchCoverage) {
        self.branches.insert(branch.line_number, branch);
    }

    pub fn add_all_branches(&mut self, branches: BTreeMap<u32, BranchCoverage>) {
        self.branches.extend(branches);
    }

    pub fn counters(&self) -> Counters {
        self.counters
    }

    pub fn functions_found(&self) -> usize {
        self.counters.functions_found
    }

    pub fn set_functions_found(&mut self, n: usize) {
        self.counters.functions_found = n;
    }

    pub fn functions_hit(&self) -> usize {
        self.counters.functions_hit
    }

    pub fn set_functions_hit(&mut self, n: usize) {
        self.counters.functions_hit = n;
    }

    pub fn branches_found(&self) -> usize {
        self.counters.branches_found
    }

    pub fn set_branches_found(&mut self, n: usize) {
        self.counters.branches_found = n;
    }

    pub fn branches_hit(&self) -> usize {
        self.counters.branches_hit
    }

    pub fn set_branches_hit(&mut self, n: usize) {
        self.counters.branches_hit = n;
    }

    pub fn lines_hit(&self) -> usize {
        self.counters.lines_hit
    }

    pub fn set_lines_hit(&mut self, n: usize) {
        self.counters.lines_hit = n;
    }

    pub fn lines_found(&self) -> usize {
        self.counters.lines_found
    }

    pub fn set_lines_found(&mut self, n: usize) {
        self.counters.lines_found = n;
    }

    /// Counters as they follow from the current detail collections.
    pub fn derived_counters(&self) -> Counters {
        Counters {
            functions_found: self.function_lines.len(),
            functions_hit: self.function_hits.len(),
            branches_found: self.branches.len(),
            branches_hit: self.branches.values().filter(|b| b.was_executed()).count(),
            lines_hit: self
                .lines
                .values()
                .filter(|l| l.execution_count > 0)
                .count(),
            lines_found: self.lines.len(),
        }
    }

    pub fn recompute_counters(&mut self) {
        self.counters = self.derived_counters();
    }

    pub fn has_consistent_counters(&self) -> bool {
        self.counters == self.derived_counters()
    }

    /// Shorthand for [`crate::merge::merge`].
    #[must_use]
    pub fn merge(&self, other: &SourceFileCoverage) -> SourceFileCoverage {
        crate::merge::merge(self, other)
    }
}
