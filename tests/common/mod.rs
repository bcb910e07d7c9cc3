#![allow(dead_code)]

use std::path::{Path, PathBuf};

use covmerge::model::SourceFileCoverage;

/// Write `content` to `dir/name`, creating parent directories.
pub fn write_report(dir: &Path, name: &str, content: &str) -> PathBuf {
    let path = dir.join(name);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).unwrap();
    }
    std::fs::write(&path, content).unwrap();
    path
}

/// Parse a tracefile holding exactly one source file section.
pub fn parse_one(lcov: &str) -> SourceFileCoverage {
    let mut files = covmerge::parsers::lcov::parse(lcov.as_bytes()).unwrap();
    assert_eq!(files.len(), 1);
    files.remove(0)
}
