mod cases;
mod common;
mod counter;
mod weather;

use csv::StringRecord;

use crate::errors::ParserError;

pub use cases::parse_case_file;
pub use common::{derive_crossing_name, parse_date, parse_timestamp, strip_crossing_prefix};
pub use counter::parse_crossing_file;
pub use weather::parse_weather_file;

pub(crate) fn require_columns(
    parser: &'static str,
    header: &StringRecord,
    required: &[&'static str],
) -> Result<(), ParserError> {
    for &column in required {
        if !header.iter().any(|name| name.trim() == column) {
            return Err(ParserError::MissingColumn { parser, column });
        }
    }
    Ok(())
}
