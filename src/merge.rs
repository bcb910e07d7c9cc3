//! Pairwise merge of two coverage records for the same source file.
//!
//! Each detail collection is merged on its own function, with a fixed
//! conflict rule per kind:
//!
//! | detail              | rule                          |
//! |---------------------|-------------------------------|
//! | function lines      | second input wins             |
//! | function executions | saturating sum                |
//! | lines               | saturating sum                |
//! | branches            | executed if either was        |
//!
//! Summary counters of the result are always derived from the merged
//! detail, never added up from the inputs.

use std::collections::BTreeMap;

use crate::model::{BranchCoverage, LineCoverage, SourceFileCoverage};

/// Union of two ordered maps; `combine` resolves keys present in both.
fn union_with<K, V, F>(
    first: &BTreeMap<K, V>,
    second: &BTreeMap<K, V>,
    combine: F,
) -> BTreeMap<K, V>
where
    K: Ord + Clone,
    V: Clone,
    F: Fn(&V, &V) -> V,
{
    let mut merged = first.clone();
    for (key, value) in second {
        match merged.get_mut(key) {
            Some(existing) => *existing = combine(&*existing, value),
            None => {
                merged.insert(key.clone(), value.clone());
            }
        }
    }
    merged
}

/// Function declarations: on conflict, the line from `s2` wins.
pub fn merge_function_lines(
    s1: &SourceFileCoverage,
    s2: &SourceFileCoverage,
) -> BTreeMap<String, u32> {
    union_with(s1.function_lines(), s2.function_lines(), |_, second| *second)
}

/// Function execution counts: summed per name.
pub fn merge_function_hits(
    s1: &SourceFileCoverage,
    s2: &SourceFileCoverage,
) -> BTreeMap<String, u64> {
    union_with(s1.function_hits(), s2.function_hits(), |a, b| a.saturating_add(*b))
}

/// Line execution counts: summed per line.
pub fn merge_lines(
    s1: &SourceFileCoverage,
    s2: &SourceFileCoverage,
) -> BTreeMap<u32, LineCoverage> {
    union_with(s1.lines(), s2.lines(), LineCoverage::merge)
}

/// Branches: combined per line with [`BranchCoverage::merge`].
pub fn merge_branches(
    s1: &SourceFileCoverage,
    s2: &SourceFileCoverage,
) -> BTreeMap<u32, BranchCoverage> {
    union_with(s1.branches(), s2.branches(), BranchCoverage::merge)
}

/// Merge two records describing the same source file into a new one.
///
/// # Panics
///
/// Panics if the two records name different source files. Callers group
/// records by file name before merging.
#[must_use]
pub fn merge(s1: &SourceFileCoverage, s2: &SourceFileCoverage) -> SourceFileCoverage {
    assert_eq!(
        s1.source_file(),
        s2.source_file(),
        "cannot merge coverage of different source files"
    );

    let mut merged = SourceFileCoverage::new(s2.source_file());
    merged.add_all_function_lines(merge_function_lines(s1, s2));
    merged.add_all_function_hits(merge_function_hits(s1, s2));
    merged.add_all_branches(merge_branches(s1, s2));
    merged.add_all_lines(merge_lines(s1, s2));
    merged.recompute_counters();
    merged
}
