use std::path::PathBuf;

use crosscount_core::config::ReportConfig;
use crosscount_core::loader::{load_cases, load_crossing_files, load_weather};
use crosscount_core::pipeline::{build_pipeline_output, PipelineInputs, PipelineOutput};
use polars::prelude::DataFrame;

fn data_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../crosscount-parser/tests/data")
}

fn build_output(with_side_tables: bool) -> PipelineOutput {
    let pattern = data_dir().join("counters/*.csv");
    let batch = load_crossing_files(&pattern.to_string_lossy()).expect("load counters");
    let weather = load_weather(&data_dir().join("weather.csv")).expect("weather");
    let cases = load_cases(&data_dir().join("cases.csv")).expect("cases");

    let config = ReportConfig::default();
    let inputs = PipelineInputs {
        crossings: &batch.crossings,
        weather: with_side_tables.then_some(weather.rows.as_slice()),
        cases: with_side_tables.then_some(cases.rows.as_slice()),
    };
    build_pipeline_output(&inputs, &config).expect("pipeline")
}

fn strings(df: &DataFrame, name: &str) -> Vec<Option<String>> {
    df.column(name)
        .expect("column")
        .str()
        .expect("str")
        .into_iter()
        .map(|value| value.map(str::to_string))
        .collect()
}

fn ints(df: &DataFrame, name: &str) -> Vec<Option<i64>> {
    df.column(name)
        .expect("column")
        .i64()
        .expect("i64")
        .into_iter()
        .collect()
}

#[test]
fn yearly_totals_sum_counts_per_crossing() {
    let output = build_output(true);
    let yearly = &output.reports.yearly_totals;

    assert_eq!(
        strings(yearly, "crossing"),
        vec![
            Some("2nd Ave Cycletrack".to_string()),
            Some("Burke Gilman Trail".to_string()),
            Some("Elliott Bay Trail".to_string()),
            Some("Fremont Bridge".to_string()),
            Some("Spokane St Bridge".to_string()),
        ]
    );
    assert_eq!(
        ints(yearly, "total"),
        vec![Some(15), Some(36), Some(24), Some(33), Some(11)]
    );
}

#[test]
fn monthly_totals_split_by_transit_type() {
    let output = build_output(true);
    let monthly = &output.reports.monthly_by_transit;

    assert_eq!(
        strings(monthly, "transit_type"),
        vec![Some("bike".to_string()), Some("pedestrian".to_string())]
    );
    assert_eq!(ints(monthly, "total"), vec![Some(104), Some(15)]);
}

#[test]
fn hourly_profile_averages_across_days() {
    let output = build_output(true);
    let hourly = &output.reports.hourly_profile;

    assert!(hourly.height() > 0);
    assert!(hourly.column("mean_count").is_ok());
    let relative = strings(hourly, "relative_direction");
    assert!(relative.contains(&Some("Towards".to_string())));
    assert!(relative.contains(&Some("Away".to_string())));
}

#[test]
fn weather_and_case_reports_keep_only_matched_days() {
    let output = build_output(true);

    let weather = &output.reports.daily_weather;
    assert_eq!(
        strings(weather, "date"),
        vec![Some("2020-06-07".to_string()), Some("2020-06-08".to_string())]
    );
    assert_eq!(ints(weather, "total"), vec![Some(57), Some(56)]);

    let cases = &output.reports.daily_cases;
    assert_eq!(cases.height(), 2);
    assert_eq!(ints(cases, "new_cases"), vec![Some(50), Some(70)]);
}

#[test]
fn missing_side_tables_leave_daily_reports_empty() {
    let output = build_output(false);
    assert_eq!(output.reports.daily_weather.height(), 0);
    assert_eq!(output.reports.daily_cases.height(), 0);
    assert_eq!(output.summary.weather_days, 0);
    assert_eq!(output.summary.rows_with_cases, 0);
    assert_eq!(output.readings.height(), 36);
}

#[test]
fn annotated_daily_marks_dates_inside_the_window() {
    let output = build_output(true);
    let annotated = &output.reports.annotated_daily;

    assert_eq!(annotated.height(), 11);
    let dates = strings(annotated, "date");
    let labels = strings(annotated, "annotation");
    for (date, label) in dates.iter().zip(labels.iter()) {
        match date.as_deref() {
            Some("2020-06-07") => assert_eq!(label, &None),
            Some(_) => assert_eq!(label.as_deref(), Some("CHAZ/CHOP")),
            None => panic!("null date"),
        }
    }
}

#[test]
fn summary_counts_nulls_and_matches() {
    let output = build_output(true);
    let summary = &output.summary;

    assert_eq!(summary.reading_rows, 36);
    assert_eq!(summary.null_count_rows, 3);
    assert_eq!(summary.untyped_rows, 0);
    assert_eq!(summary.duplicate_keys, 0);
    assert_eq!(summary.weather_days, 2);
    assert_eq!(summary.case_days, 2);
    assert_eq!(summary.rows_with_weather, 32);
    assert_eq!(summary.rows_with_cases, 32);
}
