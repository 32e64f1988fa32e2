use std::collections::HashMap;

use crosscount_parser::CrossingTable;
use polars::prelude::{Column, DataFrame, NamedFrom, PolarsError, Series};
use thiserror::Error;
use tracing::warn;

use crate::loader::LoadedCrossing;

/// Columns of the long reading table, in output order.
pub const LONG_COLUMNS: [&str; 4] = ["timestamp", "crossing", "label", "count"];

#[derive(Debug, Error)]
pub enum NormalizeError {
    #[error("reading '{label}' of {crossing} has {found} rows, expected {expected}")]
    LengthMismatch {
        crossing: String,
        label: String,
        expected: usize,
        found: usize,
    },
    #[error("{crossing} is missing its timestamp column")]
    MissingTimestamp { crossing: String },
    #[error(transparent)]
    Polars(#[from] PolarsError),
}

/// Reshapes wide counter tables into one long table with a row per
/// (timestamp, crossing, label). The output height is the sum of rows x reading columns.
pub fn flatten_crossings(tables: &[&CrossingTable]) -> Result<DataFrame, NormalizeError> {
    flatten_with_sources(tables.iter().map(|table| (*table, None)))
}

/// Same as [`flatten_crossings`], adding a `source_file_hash` column per reading.
pub fn flatten_loaded(crossings: &[LoadedCrossing]) -> Result<DataFrame, NormalizeError> {
    flatten_with_sources(
        crossings
            .iter()
            .map(|loaded| (&loaded.table, Some(loaded.hash.as_str()))),
    )
}

fn flatten_with_sources<'a>(
    tables: impl Iterator<Item = (&'a CrossingTable, Option<&'a str>)>,
) -> Result<DataFrame, NormalizeError> {
    let mut frames: Vec<DataFrame> = Vec::new();

    for (table, source_hash) in tables {
        let rows = table.height();
        let crossing = table.crossing_name();
        let timestamp = table
            .df
            .column("timestamp")
            .map_err(|_| NormalizeError::MissingTimestamp {
                crossing: crossing.to_string(),
            })?
            .clone();

        for reading in &table.readings {
            if reading.df.height() != rows {
                return Err(NormalizeError::LengthMismatch {
                    crossing: crossing.to_string(),
                    label: reading.label.clone(),
                    expected: rows,
                    found: reading.df.height(),
                });
            }

            let mut columns: Vec<Column> = Vec::with_capacity(5);
            columns.push(timestamp.clone());
            columns.push(Series::new("crossing".into(), vec![crossing; rows]).into());
            columns.push(Series::new("label".into(), vec![reading.label.as_str(); rows]).into());
            columns.push(reading.df.column("count")?.clone());
            if let Some(hash) = source_hash {
                columns.push(Series::new("source_file_hash".into(), vec![hash; rows]).into());
            }

            frames.push(DataFrame::new(columns)?);
        }
    }

    let mut iter = frames.into_iter();
    let Some(mut combined) = iter.next() else {
        return Ok(DataFrame::default());
    };
    for df in iter {
        combined.vstack_mut(&df)?;
    }
    Ok(combined)
}

/// Counts (timestamp, crossing, transit_type, direction) keys that occur more than once.
/// Duplicates are kept in the table; this only reports them.
pub fn count_duplicate_keys(df: &DataFrame) -> Result<usize, NormalizeError> {
    if df.is_empty() {
        return Ok(0);
    }

    let timestamps = df.column("timestamp")?.datetime()?;
    let crossings = df.column("crossing")?.str()?;
    let transit = df.column("transit_type")?.str()?;
    let directions = df.column("direction")?.str()?;

    let mut seen: HashMap<(Option<i64>, Option<&str>, Option<&str>, Option<&str>), usize> =
        HashMap::with_capacity(df.height());
    for idx in 0..df.height() {
        *seen
            .entry((
                timestamps.get(idx),
                crossings.get(idx),
                transit.get(idx),
                directions.get(idx),
            ))
            .or_insert(0) += 1;
    }

    let duplicates = seen.values().filter(|count| **count > 1).count();
    if duplicates > 0 {
        warn!(
            duplicate_keys = duplicates,
            "readings share a timestamp/crossing/transit/direction key; aggregates will sum them"
        );
    }
    Ok(duplicates)
}
