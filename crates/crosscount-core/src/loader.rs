use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use blake3::Hasher;
use crosscount_parser::{
    parse_case_file, parse_crossing_file, parse_weather_file, CaseObservation, CrossingTable,
    DailyTable, WeatherObservation,
};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::error::{PipelineError, Result};

#[derive(Debug)]
pub struct FileInput<'a> {
    pub path: &'a str,
    pub contents: &'a [u8],
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FileStatus {
    Duplicate,
    Parsed,
    Failed,
}

#[derive(Debug, Clone, Serialize)]
pub struct FileReport {
    pub path: String,
    pub hash: String,
    pub status: FileStatus,
    pub crossing: Option<String>,
    pub rows: usize,
    pub reading_columns: usize,
    pub skipped_rows: usize,
    pub message: Option<String>,
}

impl FileReport {
    fn new(path: &str, hash: String, status: FileStatus) -> Self {
        Self {
            path: path.to_string(),
            hash,
            status,
            crossing: None,
            rows: 0,
            reading_columns: 0,
            skipped_rows: 0,
            message: None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct LoadedCrossing {
    pub path: String,
    pub hash: String,
    pub table: CrossingTable,
}

#[derive(Debug, Default)]
pub struct LoadBatch {
    pub crossings: Vec<LoadedCrossing>,
    pub reports: Vec<FileReport>,
}

impl LoadBatch {
    pub fn failed(&self) -> impl Iterator<Item = &FileReport> {
        self.reports
            .iter()
            .filter(|report| report.status == FileStatus::Failed)
    }
}

/// Parses in-memory counter exports. Byte-identical files are only parsed once; files
/// that fail to parse are reported and skipped.
pub fn load_crossing_inputs(inputs: &[FileInput<'_>]) -> LoadBatch {
    let mut seen_hashes: HashSet<String> = HashSet::new();
    let mut batch = LoadBatch::default();

    for input in inputs {
        let hash = compute_hash(input.contents);
        if !seen_hashes.insert(hash.clone()) {
            warn!(path = input.path, "skipping duplicate counter file");
            batch
                .reports
                .push(FileReport::new(input.path, hash, FileStatus::Duplicate));
            continue;
        }

        let Ok(content) = std::str::from_utf8(input.contents) else {
            warn!(path = input.path, "counter file is not valid UTF-8");
            let mut report = FileReport::new(input.path, hash, FileStatus::Failed);
            report.message = Some("file contents were not valid UTF-8".to_string());
            batch.reports.push(report);
            continue;
        };

        match parse_crossing_file(content) {
            Ok(table) => {
                info!(
                    path = input.path,
                    crossing = table.crossing_name(),
                    rows = table.height(),
                    reading_columns = table.readings.len(),
                    skipped_rows = table.skipped_rows,
                    "parsed counter file"
                );
                let mut report = FileReport::new(input.path, hash.clone(), FileStatus::Parsed);
                report.crossing = Some(table.crossing_name().to_string());
                report.rows = table.height();
                report.reading_columns = table.readings.len();
                report.skipped_rows = table.skipped_rows;
                batch.reports.push(report);
                batch.crossings.push(LoadedCrossing {
                    path: input.path.to_string(),
                    hash,
                    table,
                });
            }
            Err(err) => {
                warn!(path = input.path, error = %err, "failed to parse counter file");
                let mut report = FileReport::new(input.path, hash, FileStatus::Failed);
                report.message = Some(err.to_string());
                batch.reports.push(report);
            }
        }
    }

    batch
}

/// Expands a glob pattern into a sorted list of files.
pub fn discover_counter_files(pattern: &str) -> Result<Vec<PathBuf>> {
    let mut paths = Vec::new();
    for entry in glob::glob(pattern)? {
        let path = entry.map_err(|err| PipelineError::Io(err.into_error()))?;
        if path.is_file() {
            paths.push(path);
        }
    }
    paths.sort();
    debug!(pattern, files = paths.len(), "discovered counter files");
    Ok(paths)
}

/// Reads every file matching `pattern` and parses it as a counter export.
pub fn load_crossing_files(pattern: &str) -> Result<LoadBatch> {
    let paths = discover_counter_files(pattern)?;
    if paths.is_empty() {
        return Err(PipelineError::NoCounterFiles(pattern.to_string()));
    }

    let mut contents = Vec::with_capacity(paths.len());
    for path in &paths {
        contents.push((path.display().to_string(), fs::read(path)?));
    }

    let inputs: Vec<FileInput<'_>> = contents
        .iter()
        .map(|(path, bytes)| FileInput {
            path: path.as_str(),
            contents: bytes.as_slice(),
        })
        .collect();

    let batch = load_crossing_inputs(&inputs);
    if batch.crossings.is_empty() {
        return Err(PipelineError::NoCounterFiles(pattern.to_string()));
    }
    Ok(batch)
}

pub fn load_weather(path: &Path) -> Result<DailyTable<WeatherObservation>> {
    let content = fs::read_to_string(path)?;
    let table = parse_weather_file(&content).map_err(|source| PipelineError::Parse {
        path: path.display().to_string(),
        source,
    })?;
    info!(
        path = %path.display(),
        rows = table.len(),
        skipped_rows = table.skipped_rows,
        "parsed weather file"
    );
    Ok(table)
}

pub fn load_cases(path: &Path) -> Result<DailyTable<CaseObservation>> {
    let content = fs::read_to_string(path)?;
    let table = parse_case_file(&content).map_err(|source| PipelineError::Parse {
        path: path.display().to_string(),
        source,
    })?;
    info!(
        path = %path.display(),
        rows = table.len(),
        skipped_rows = table.skipped_rows,
        "parsed case file"
    );
    Ok(table)
}

pub fn compute_hash(contents: &[u8]) -> String {
    let mut hasher = Hasher::new();
    hasher.update(contents);
    let hash = hasher.finalize();
    hash.to_hex().to_string()
}
