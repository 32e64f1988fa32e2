use std::fs;
use std::path::PathBuf;

use crosscount_core::loader::FileStatus;
use crosscount_core::outputs::{write_outputs, READINGS_FILE, SUMMARY_FILE};
use crosscount_core::{run_pipeline, PipelineError, ReportConfig};
use polars::prelude::{ParquetReader, SerReader};

fn data_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../crosscount-parser/tests/data")
}

fn config_for(output_dir: PathBuf) -> ReportConfig {
    ReportConfig {
        counts_dir: data_dir().join("counters"),
        weather_path: Some(data_dir().join("weather.csv")),
        cases_path: Some(data_dir().join("cases.csv")),
        output_dir,
        state: Some("Washington".to_string()),
        ..ReportConfig::default()
    }
}

#[test]
fn pipeline_writes_readings_reports_and_summary() {
    let dir = tempfile::tempdir().expect("tempdir");
    let config = config_for(dir.path().join("out"));

    let output = run_pipeline(&config).expect("pipeline failed");
    assert_eq!(output.readings.height(), 36);
    assert_eq!(output.summary.files.len(), 5);
    assert!(output
        .summary
        .files
        .iter()
        .all(|report| report.status == FileStatus::Parsed));

    for name in [
        "timestamp",
        "crossing",
        "label",
        "count",
        "source_file_hash",
        "direction",
        "transit_type",
        "decompose_rule",
        "timestamp_utc",
        "relative_direction",
        "date",
        "precipitation",
        "avg_temperature",
        "cases",
        "new_cases",
    ] {
        assert!(output.readings.column(name).is_ok(), "missing column {name}");
    }

    let written = write_outputs(&output, &config.output_dir).expect("write outputs");
    assert_eq!(written.len(), 8);
    assert!(written.iter().all(|path| path.is_file()));

    let readings_file =
        fs::File::open(config.output_dir.join(READINGS_FILE)).expect("open readings");
    let reread = ParquetReader::new(readings_file)
        .finish()
        .expect("read parquet");
    assert_eq!(reread.height(), 36);

    let summary: serde_json::Value = serde_json::from_str(
        &fs::read_to_string(config.output_dir.join(SUMMARY_FILE)).expect("read summary"),
    )
    .expect("summary json");
    assert_eq!(summary["reading_rows"], 36);
    assert_eq!(summary["timezone"], "America/Los_Angeles");
    assert_eq!(summary["files"][0]["status"], "parsed");
    assert_eq!(summary["outputs"].as_array().map(Vec::len), Some(7));
}

#[test]
fn pipeline_runs_without_side_tables() {
    let dir = tempfile::tempdir().expect("tempdir");
    let config = ReportConfig {
        weather_path: None,
        cases_path: None,
        ..config_for(dir.path().to_path_buf())
    };

    let output = run_pipeline(&config).expect("pipeline failed");
    assert_eq!(output.readings.height(), 36);
    assert_eq!(
        output
            .readings
            .column("precipitation")
            .expect("precipitation")
            .null_count(),
        36
    );
}

#[test]
fn pipeline_rejects_unknown_time_zone() {
    let dir = tempfile::tempdir().expect("tempdir");
    let config = ReportConfig {
        timezone: "Mars/Olympus_Mons".to_string(),
        ..config_for(dir.path().to_path_buf())
    };

    let err = run_pipeline(&config).expect_err("invalid zone");
    assert!(matches!(err, PipelineError::Config(_)));
}

#[test]
fn pipeline_fails_when_no_counter_matches() {
    let dir = tempfile::tempdir().expect("tempdir");
    let config = ReportConfig {
        counts_dir: dir.path().join("empty"),
        ..config_for(dir.path().to_path_buf())
    };

    let err = run_pipeline(&config).expect_err("no counters");
    assert!(matches!(err, PipelineError::NoCounterFiles(_)));
}
