mod common;

use covmerge::cli::{cmd_merge, MergeArgs};
use covmerge::coverage::Coverage;
use covmerge::parsers::lcov;
use covmerge::writer::{self, OutputFormat};

const SHARD_A: &str = "TN:shard_a
SF:/src/main.rs
FN:1,main
FN:8,parse_args
FNDA:1,main
FNDA:0,parse_args
FNF:2
FNH:2
BRDA:3,0,0,1
BRDA:9,0,0,-
BRF:2
BRH:1
DA:1,1
DA:2,1
DA:3,1
DA:8,0
DA:9,0
LH:3
LF:5
end_of_record
";

const SHARD_B: &str = "TN:shard_b
SF:/src/main.rs
FN:1,main
FN:8,parse_args
FNDA:1,main
FNDA:2,parse_args
BRDA:9,0,0,2
DA:1,1
DA:8,2
DA:9,2
end_of_record
SF:/external/dep.rs
DA:1,1
end_of_record
";

#[test]
fn written_lcov_parses_back_to_the_same_coverage() {
    let records = lcov::parse(SHARD_A.as_bytes())
        .unwrap()
        .into_iter()
        .chain(lcov::parse(SHARD_B.as_bytes()).unwrap());
    let coverage = Coverage::from_records(records);

    let mut out = Vec::new();
    writer::write(&mut out, &coverage, OutputFormat::Lcov).unwrap();
    let reparsed = Coverage::from_records(lcov::parse(&out).unwrap());

    assert_eq!(reparsed, coverage);
}

#[test]
fn merge_directory_of_shards() {
    let dir = tempfile::tempdir().unwrap();
    common::write_report(dir.path(), "shard_a/coverage.dat", SHARD_A);
    common::write_report(dir.path(), "shard_b/coverage.dat", SHARD_B);
    common::write_report(dir.path(), "shard_b/test.log", "PASSED\n");
    let output = dir.path().join("merged.info");

    let args = MergeArgs {
        coverage_dirs: vec![dir.path().to_path_buf()],
        output: Some(output.clone()),
        filter_sources: vec!["^/external/".to_string()],
        ..Default::default()
    };
    let summary = cmd_merge(&args).unwrap();
    assert!(summary.contains("Merged 3 partial records from 2 reports into 1 files"));
    assert!(summary.contains("Lines:      5/5 (100.0%)"));
    assert!(summary.contains("Branches:   2/2 (100.0%)"));

    let merged = common::parse_one(&std::fs::read_to_string(&output).unwrap());
    assert_eq!(merged.source_file(), "/src/main.rs");
    assert_eq!(merged.function_hits()["parse_args"], 2);
    assert_eq!(merged.branches()[&9].taken, Some(2));
    assert_eq!(merged.lines()[&8].execution_count, 2);
    assert_eq!(merged.functions_found(), 2);
    assert_eq!(merged.lines_hit(), 5);
}

#[test]
fn merge_from_reports_file_as_json() {
    let dir = tempfile::tempdir().unwrap();
    let a = common::write_report(dir.path(), "a.txt", SHARD_A);
    let list = common::write_report(dir.path(), "reports", &format!("{}\n", a.display()));
    let output = dir.path().join("merged.json");

    let args = MergeArgs {
        reports_file: Some(list),
        output: Some(output.clone()),
        format: OutputFormat::Json,
        ..Default::default()
    };
    cmd_merge(&args).unwrap();

    let json: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&output).unwrap()).unwrap();
    assert_eq!(json["/src/main.rs"]["lines_found"], 5);
    assert_eq!(json["/src/main.rs"]["branches_hit"], 1);
}
