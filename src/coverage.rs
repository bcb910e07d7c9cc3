//! Coverage for a whole source tree: one merged record per file name.

use std::collections::BTreeMap;

use rayon::prelude::*;
use regex::Regex;
use serde::Serialize;

use crate::merge::merge;
use crate::model::{rate, SourceFileCoverage};

/// Merged coverage keyed by source file name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Coverage {
    files: BTreeMap<String, SourceFileCoverage>,
}

/// Counters summed over every file in a [`Coverage`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CoverageTotals {
    pub files: usize,
    pub functions_found: usize,
    pub functions_hit: usize,
    pub branches_found: usize,
    pub branches_hit: usize,
    pub lines_found: usize,
    pub lines_hit: usize,
}

impl CoverageTotals {
    #[must_use]
    pub fn line_rate(&self) -> f64 {
        rate(self.lines_hit, self.lines_found)
    }

    #[must_use]
    pub fn branch_rate(&self) -> f64 {
        rate(self.branches_hit, self.branches_found)
    }

    #[must_use]
    pub fn function_rate(&self) -> f64 {
        rate(self.functions_hit, self.functions_found)
    }
}

impl Coverage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold a record into the set. An existing record for the same file is
    /// merged with the new one as the second input.
    pub fn add(&mut self, file: SourceFileCoverage) {
        let merged = match self.files.get(file.source_file()) {
            Some(existing) => merge(existing, &file),
            None => file,
        };
        self.files.insert(merged.source_file().to_string(), merged);
    }

    /// Build a set from partial records in processing order.
    ///
    /// Records are grouped by file name keeping their relative order, and
    /// each group is folded left to right. Groups are folded in parallel.
    pub fn from_records<I>(records: I) -> Self
    where
        I: IntoIterator<Item = SourceFileCoverage>,
    {
        let mut groups: BTreeMap<String, Vec<SourceFileCoverage>> = BTreeMap::new();
        for record in records {
            groups
                .entry(record.source_file().to_string())
                .or_default()
                .push(record);
        }

        let files = groups
            .into_par_iter()
            .filter_map(|(name, group)| {
                log::debug!("Merging {} partial records for {}", group.len(), name);
                let mut iter = group.into_iter();
                let first = iter.next()?;
                let merged = iter.fold(first, |acc, next| merge(&acc, &next));
                Some((name, merged))
            })
            .collect();

        Self { files }
    }

    /// Merge two sets file by file. `other` is the second input of every
    /// per-file merge.
    #[must_use]
    pub fn merge(&self, other: &Coverage) -> Coverage {
        let mut merged = self.clone();
        for file in other.files.values() {
            merged.add(file.clone());
        }
        merged
    }

    /// Drop every file whose name matches one of `patterns`.
    pub fn filter_sources(&mut self, patterns: &[Regex]) {
        if patterns.is_empty() {
            return;
        }
        self.files.retain(|name, _| {
            let drop = patterns.iter().any(|p| p.is_match(name));
            if drop {
                log::debug!("Filtered out {}", name);
            }
            !drop
        });
    }

    pub fn get(&self, source_file: &str) -> Option<&SourceFileCoverage> {
        self.files.get(source_file)
    }

    /// Records ordered by file name.
    pub fn files(&self) -> impl Iterator<Item = &SourceFileCoverage> {
        self.files.values()
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    pub fn totals(&self) -> CoverageTotals {
        self.files().fold(
            CoverageTotals {
                files: self.len(),
                ..Default::default()
            },
            |mut t, f| {
                t.functions_found += f.functions_found();
                t.functions_hit += f.functions_hit();
                t.branches_found += f.branches_found();
                t.branches_hit += f.branches_hit();
                t.lines_found += f.lines_found();
                t.lines_hit += f.lines_hit();
                t
            },
        )
    }
}

impl FromIterator<SourceFileCoverage> for Coverage {
    fn from_iter<I: IntoIterator<Item = SourceFileCoverage>>(iter: I) -> Self {
        Coverage::from_records(iter)
    }
}
