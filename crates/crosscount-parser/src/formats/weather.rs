use csv::ReaderBuilder;
use serde::Deserialize;

use crate::errors::ParserError;
use crate::model::{DailyTable, WeatherObservation};

use super::common::parse_date;
use super::require_columns;

const PARSER: &str = "NOAA_DAILY";

#[derive(Debug, Deserialize)]
struct WeatherRow {
    #[serde(rename = "DATE")]
    date: String,
    #[serde(rename = "PRCP", default, deserialize_with = "csv::invalid_option")]
    precipitation: Option<f64>,
    #[serde(rename = "TAVG", default, deserialize_with = "csv::invalid_option")]
    avg_temperature: Option<f64>,
}

/// Parses a NOAA daily summary export. Extra columns (`STATION`, `NAME`, ...) are ignored
/// and a station may contribute one row per day.
pub fn parse_weather_file(content: &str) -> Result<DailyTable<WeatherObservation>, ParserError> {
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(content.as_bytes());

    let header = reader
        .headers()
        .map_err(|err| ParserError::csv(PARSER, err))?
        .clone();
    require_columns(PARSER, &header, &["DATE"])?;

    let mut rows = Vec::new();
    let mut skipped_rows = 0usize;
    for result in reader.deserialize::<WeatherRow>() {
        let row = result.map_err(|err| ParserError::csv(PARSER, err))?;
        let Some(date) = parse_date(&row.date) else {
            skipped_rows += 1;
            continue;
        };
        rows.push(WeatherObservation {
            date,
            precipitation: row.precipitation,
            avg_temperature: row.avg_temperature,
        });
    }

    if rows.is_empty() {
        return Err(ParserError::EmptyData { parser: PARSER });
    }

    Ok(DailyTable { rows, skipped_rows })
}
