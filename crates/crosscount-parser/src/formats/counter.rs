use std::collections::HashSet;

use csv::{ReaderBuilder, StringRecord};
use polars::prelude::*;

use crate::errors::ParserError;
use crate::model::{CrossingMetadata, CrossingTable, ReadingColumn};

use super::common::{derive_crossing_name, micros, parse_count, parse_timestamp, strip_crossing_prefix};

const PARSER: &str = "COUNTER_EXPORT";
const DATE_COLUMN: &str = "Date";

/// Column layout of a counter export, resolved from its header row.
///
/// `Date` may sit anywhere; the first remaining column is the crossing total and every
/// column after it is a reading. For the usual `Date`-first export the crossing total is
/// the second column.
#[derive(Debug, Clone)]
struct CounterLayout {
    date_index: usize,
    crossing_index: usize,
    reading_indices: Vec<usize>,
    metadata: CrossingMetadata,
    labels: Vec<String>,
}

impl CounterLayout {
    fn from_header(header: &StringRecord) -> Result<Self, ParserError> {
        let date_index = header
            .iter()
            .position(|name| name.trim().eq_ignore_ascii_case(DATE_COLUMN))
            .ok_or(ParserError::MissingColumn {
                parser: PARSER,
                column: DATE_COLUMN,
            })?;

        let others: Vec<usize> = (0..header.len()).filter(|idx| *idx != date_index).collect();
        if others.len() < 2 {
            return Err(ParserError::MissingReadingColumns {
                parser: PARSER,
                found: others.len(),
            });
        }

        let crossing_index = others[0];
        let crossing_column = header.get(crossing_index).unwrap_or_default().trim();
        let crossing_name =
            derive_crossing_name(crossing_column).ok_or_else(|| ParserError::InvalidHeader {
                parser: PARSER,
                message: format!("cannot derive a crossing name from column '{crossing_column}'"),
            })?;

        let reading_indices = others[1..].to_vec();
        let mut labels = Vec::with_capacity(reading_indices.len());
        let mut seen = HashSet::new();
        for idx in &reading_indices {
            let raw = header.get(*idx).unwrap_or_default();
            let label = strip_crossing_prefix(raw, &crossing_name);
            if !label.chars().any(char::is_alphanumeric) {
                return Err(ParserError::InvalidHeader {
                    parser: PARSER,
                    message: format!("reading column {idx} has no usable header '{raw}'"),
                });
            }
            if !seen.insert(label.to_ascii_lowercase()) {
                return Err(ParserError::InvalidHeader {
                    parser: PARSER,
                    message: format!("duplicate reading column '{label}'"),
                });
            }
            labels.push(label);
        }

        Ok(Self {
            date_index,
            crossing_index,
            reading_indices,
            metadata: CrossingMetadata {
                crossing_name,
                crossing_column: crossing_column.to_string(),
                date_column: header.get(date_index).unwrap_or_default().trim().to_string(),
            },
            labels,
        })
    }
}

/// Accumulates reading values column by column, preserving header order.
struct ReadingFrameBuilder {
    labels: Vec<String>,
    values: Vec<Vec<Option<i64>>>,
}

impl ReadingFrameBuilder {
    fn new(labels: Vec<String>, capacity: usize) -> Self {
        let values = labels.iter().map(|_| Vec::with_capacity(capacity)).collect();
        Self { labels, values }
    }

    fn push_row(&mut self, record: &StringRecord, indices: &[usize]) {
        for (slot, idx) in self.values.iter_mut().zip(indices) {
            slot.push(record.get(*idx).and_then(parse_count));
        }
    }

    fn build(self, row_count: usize) -> Result<Vec<ReadingColumn>, ParserError> {
        let mut readings = Vec::with_capacity(self.labels.len());
        for (label, data) in self.labels.into_iter().zip(self.values) {
            if data.len() != row_count {
                return Err(ParserError::Validation {
                    parser: PARSER,
                    message: format!(
                        "reading column '{label}' had {} rows, expected {row_count}",
                        data.len()
                    ),
                });
            }
            let df = DataFrame::new(vec![Series::new("count".into(), data).into()]).map_err(
                |err| ParserError::Validation {
                    parser: PARSER,
                    message: format!("failed to build reading dataframe for '{label}': {err}"),
                },
            )?;
            readings.push(ReadingColumn { label, df });
        }
        Ok(readings)
    }
}

/// Parses one wide per-crossing export: a `Date` column, the crossing's total column,
/// then one column per direction/mode.
pub fn parse_crossing_file(content: &str) -> Result<CrossingTable, ParserError> {
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(content.as_bytes());

    let header = reader
        .headers()
        .map_err(|err| ParserError::csv(PARSER, err))?
        .clone();
    let layout = CounterLayout::from_header(&header)?;

    let mut timestamps: Vec<i64> = Vec::new();
    let mut totals: Vec<Option<i64>> = Vec::new();
    let mut builder = ReadingFrameBuilder::new(layout.labels.clone(), 1024);
    let mut skipped_rows = 0usize;

    for record in reader.records() {
        let record = record.map_err(|err| ParserError::csv(PARSER, err))?;
        let Some(timestamp) = record.get(layout.date_index).and_then(parse_timestamp) else {
            skipped_rows += 1;
            continue;
        };
        timestamps.push(micros(timestamp));
        totals.push(record.get(layout.crossing_index).and_then(parse_count));
        builder.push_row(&record, &layout.reading_indices);
    }

    if timestamps.is_empty() {
        return Err(ParserError::EmptyData { parser: PARSER });
    }

    let row_count = timestamps.len();
    let readings = builder.build(row_count)?;
    let df = build_crossing_dataframe(timestamps, totals)?;

    Ok(CrossingTable {
        metadata: layout.metadata,
        df,
        readings,
        skipped_rows,
    })
}

fn build_crossing_dataframe(
    timestamps: Vec<i64>,
    totals: Vec<Option<i64>>,
) -> Result<DataFrame, ParserError> {
    let ts_series = Series::new("timestamp".into(), timestamps)
        .cast(&DataType::Datetime(TimeUnit::Microseconds, None))
        .map_err(|err| ParserError::Validation {
            parser: PARSER,
            message: format!("failed to cast timestamp column: {err}"),
        })?;

    DataFrame::new(vec![
        ts_series.into(),
        Series::new("total".into(), totals).into(),
    ])
    .map_err(|err| ParserError::Validation {
        parser: PARSER,
        message: format!("failed to build crossing dataframe: {err}"),
    })
}
