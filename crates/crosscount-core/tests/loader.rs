use std::fs;
use std::path::PathBuf;

use crosscount_core::loader::{
    compute_hash, discover_counter_files, load_cases, load_crossing_files, load_crossing_inputs,
    load_weather, FileInput, FileStatus,
};
use crosscount_core::PipelineError;

fn data_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../crosscount-parser/tests/data")
}

fn fixture_bytes(name: &str) -> Vec<u8> {
    fs::read(data_dir().join(name)).expect("read fixture")
}

#[test]
fn identical_files_are_parsed_once() {
    let fremont = fixture_bytes("counters/fremont_bridge.csv");
    let spokane = fixture_bytes("counters/spokane_st.csv");
    let inputs = [
        FileInput {
            path: "a/fremont.csv",
            contents: &fremont,
        },
        FileInput {
            path: "b/fremont_copy.csv",
            contents: &fremont,
        },
        FileInput {
            path: "spokane.csv",
            contents: &spokane,
        },
    ];

    let batch = load_crossing_inputs(&inputs);
    assert_eq!(batch.crossings.len(), 2);
    assert_eq!(batch.reports.len(), 3);
    assert_eq!(batch.reports[1].status, FileStatus::Duplicate);
    assert_eq!(batch.reports[0].hash, batch.reports[1].hash);
    assert_eq!(batch.crossings[0].hash, compute_hash(&fremont));

    let first = &batch.reports[0];
    assert_eq!(first.status, FileStatus::Parsed);
    assert_eq!(first.crossing.as_deref(), Some("Fremont Bridge"));
    assert_eq!(first.rows, 4);
    assert_eq!(first.reading_columns, 2);
    assert_eq!(first.skipped_rows, 1);
}

#[test]
fn unparseable_files_are_reported_and_skipped() {
    let no_date = fixture_bytes("invalid/no_date.csv");
    let total_only = fixture_bytes("invalid/total_only.csv");
    let fremont = fixture_bytes("counters/fremont_bridge.csv");
    let binary = [0xff_u8, 0xfe, 0x00];
    let inputs = [
        FileInput {
            path: "no_date.csv",
            contents: &no_date,
        },
        FileInput {
            path: "total_only.csv",
            contents: &total_only,
        },
        FileInput {
            path: "binary.csv",
            contents: &binary,
        },
        FileInput {
            path: "fremont.csv",
            contents: &fremont,
        },
    ];

    let batch = load_crossing_inputs(&inputs);
    assert_eq!(batch.crossings.len(), 1);
    let failed: Vec<&str> = batch.failed().map(|report| report.path.as_str()).collect();
    assert_eq!(failed, vec!["no_date.csv", "total_only.csv", "binary.csv"]);
    assert!(batch.failed().all(|report| report.message.is_some()));
}

#[test]
fn glob_discovery_is_sorted_and_scoped() {
    let pattern = data_dir().join("counters/*.csv");
    let paths = discover_counter_files(&pattern.to_string_lossy()).expect("glob");
    assert_eq!(paths.len(), 5);
    let mut sorted = paths.clone();
    sorted.sort();
    assert_eq!(paths, sorted);
}

#[test]
fn loading_a_directory_without_counters_fails() {
    let dir = tempfile::tempdir().expect("tempdir");
    let pattern = dir.path().join("*.csv");
    let err = load_crossing_files(&pattern.to_string_lossy()).expect_err("no files");
    assert!(matches!(err, PipelineError::NoCounterFiles(_)));

    fs::copy(
        data_dir().join("invalid/total_only.csv"),
        dir.path().join("total_only.csv"),
    )
    .expect("copy fixture");
    let err = load_crossing_files(&pattern.to_string_lossy()).expect_err("nothing parsed");
    assert!(matches!(err, PipelineError::NoCounterFiles(_)));
}

#[test]
fn side_tables_load_from_disk() {
    let weather = load_weather(&data_dir().join("weather.csv")).expect("weather");
    assert_eq!(weather.len(), 4);

    let cases = load_cases(&data_dir().join("cases.csv")).expect("cases");
    assert_eq!(cases.len(), 5);

    let err = load_weather(&data_dir().join("missing.csv")).expect_err("missing file");
    assert!(matches!(err, PipelineError::Io(_)));
}
