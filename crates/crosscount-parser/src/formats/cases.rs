use csv::ReaderBuilder;
use serde::Deserialize;

use crate::errors::ParserError;
use crate::model::{CaseObservation, DailyTable};

use super::common::parse_date;
use super::require_columns;

const PARSER: &str = "COVID_COUNTIES";

#[derive(Debug, Deserialize)]
struct CaseRow {
    date: String,
    county: String,
    #[serde(default)]
    state: Option<String>,
    #[serde(default, deserialize_with = "csv::invalid_option")]
    cases: Option<i64>,
}

/// Parses a county-level COVID-19 case export (`date`, `county`, `cases`, optional `state`).
/// Rows for every county are returned; filtering happens during enrichment.
pub fn parse_case_file(content: &str) -> Result<DailyTable<CaseObservation>, ParserError> {
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(content.as_bytes());

    let header = reader
        .headers()
        .map_err(|err| ParserError::csv(PARSER, err))?
        .clone();
    require_columns(PARSER, &header, &["date", "county", "cases"])?;

    let mut rows = Vec::new();
    let mut skipped_rows = 0usize;
    for result in reader.deserialize::<CaseRow>() {
        let row = result.map_err(|err| ParserError::csv(PARSER, err))?;
        let Some(date) = parse_date(&row.date) else {
            skipped_rows += 1;
            continue;
        };
        rows.push(CaseObservation {
            date,
            county: row.county.trim().to_string(),
            state: row
                .state
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty()),
            cases: row.cases,
        });
    }

    if rows.is_empty() {
        return Err(ParserError::EmptyData { parser: PARSER });
    }

    Ok(DailyTable { rows, skipped_rows })
}
