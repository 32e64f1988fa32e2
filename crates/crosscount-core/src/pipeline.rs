use chrono::{DateTime, Utc};
use crosscount_parser::{CaseObservation, WeatherObservation};
use polars::prelude::DataFrame;
use serde::Serialize;
use tracing::{info, warn};

use crate::config::ReportConfig;
use crate::decompose::apply_decomposition;
use crate::enrich::{case_frame, enrich_readings, join_daily, weather_frame, EnrichmentOptions};
use crate::error::{PipelineError, Result};
use crate::loader::{load_cases, load_crossing_files, load_weather, FileReport, LoadedCrossing};
use crate::normalize::{count_duplicate_keys, flatten_loaded};
use crate::report::{build_reports, ReportTables};

/// Run-level bookkeeping written next to the report tables.
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub generated_at: DateTime<Utc>,
    pub timezone: String,
    pub county: String,
    pub state: Option<String>,
    pub files: Vec<FileReport>,
    pub reading_rows: usize,
    pub null_count_rows: usize,
    pub untyped_rows: usize,
    pub duplicate_keys: usize,
    pub weather_days: usize,
    pub rows_with_weather: usize,
    pub case_days: usize,
    pub rows_with_cases: usize,
    pub outputs: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct PipelineOutput {
    pub readings: DataFrame,
    pub reports: ReportTables,
    pub summary: RunSummary,
}

/// Everything the reading table is built from, already parsed.
#[derive(Debug, Clone)]
pub struct PipelineInputs<'a> {
    pub crossings: &'a [LoadedCrossing],
    pub weather: Option<&'a [WeatherObservation]>,
    pub cases: Option<&'a [CaseObservation]>,
}

pub fn run_pipeline(config: &ReportConfig) -> Result<PipelineOutput> {
    config.validate()?;

    let pattern = config.counts_pattern();
    info!(pattern = %pattern, "loading counter files");
    let batch = load_crossing_files(&pattern)?;
    for failed in batch.failed() {
        warn!(
            path = %failed.path,
            message = failed.message.as_deref().unwrap_or_default(),
            "counter file excluded from report"
        );
    }

    let weather = config
        .weather_path
        .as_deref()
        .map(load_weather)
        .transpose()?;
    let cases = config.cases_path.as_deref().map(load_cases).transpose()?;

    let inputs = PipelineInputs {
        crossings: &batch.crossings,
        weather: weather.as_ref().map(|table| table.rows.as_slice()),
        cases: cases.as_ref().map(|table| table.rows.as_slice()),
    };

    let mut output = build_pipeline_output(&inputs, config)?;
    output.summary.files = batch.reports;
    Ok(output)
}

/// Normalizes, decomposes, enriches and aggregates already-loaded inputs.
pub fn build_pipeline_output(
    inputs: &PipelineInputs<'_>,
    config: &ReportConfig,
) -> Result<PipelineOutput> {
    let options = EnrichmentOptions {
        timezone: config.timezone()?,
        towards: config.towards.clone(),
    };

    let readings = build_readings(inputs, &options, &config.county, config.state.as_deref())?;
    let reports = build_reports(&readings, &config.annotations)?;

    let height = readings.height();
    let summary = RunSummary {
        generated_at: Utc::now(),
        timezone: config.timezone.clone(),
        county: config.county.clone(),
        state: config.state.clone(),
        files: Vec::new(),
        reading_rows: height,
        null_count_rows: readings.column("count")?.null_count(),
        untyped_rows: readings.column("transit_type")?.null_count(),
        duplicate_keys: count_duplicate_keys(&readings)?,
        weather_days: inputs
            .weather
            .map(|_| reports.daily_weather.height())
            .unwrap_or(0),
        rows_with_weather: height - readings.column("precipitation")?.null_count().min(height),
        case_days: inputs
            .cases
            .map(|_| reports.daily_cases.height())
            .unwrap_or(0),
        rows_with_cases: height - readings.column("cases")?.null_count().min(height),
        outputs: Vec::new(),
    };

    info!(
        reading_rows = summary.reading_rows,
        duplicate_keys = summary.duplicate_keys,
        rows_with_weather = summary.rows_with_weather,
        rows_with_cases = summary.rows_with_cases,
        "pipeline finished"
    );

    Ok(PipelineOutput {
        readings,
        reports,
        summary,
    })
}

/// Builds the enriched long reading table: reshape, decompose, enrich, then daily joins.
pub fn build_readings(
    inputs: &PipelineInputs<'_>,
    options: &EnrichmentOptions,
    county: &str,
    state: Option<&str>,
) -> Result<DataFrame> {
    if inputs.crossings.is_empty() {
        return Err(PipelineError::NoCounterFiles("pipeline inputs".to_string()));
    }
    let long = flatten_loaded(inputs.crossings)?;
    info!(
        crossings = inputs.crossings.len(),
        rows = long.height(),
        "reshaped counter tables"
    );

    let decomposed = apply_decomposition(&long)?;
    let enriched = enrich_readings(&decomposed, options)?;

    let weather = inputs.weather.map(weather_frame).transpose()?;
    let cases = inputs
        .cases
        .map(|rows| case_frame(rows, county, state))
        .transpose()?;

    Ok(join_daily(&enriched, weather.as_ref(), cases.as_ref())?)
}
