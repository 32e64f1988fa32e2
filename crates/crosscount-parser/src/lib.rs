pub mod errors;
pub mod formats;
pub mod model;

pub use errors::ParserError;
pub use formats::{
    derive_crossing_name, parse_case_file, parse_crossing_file, parse_date, parse_timestamp,
    parse_weather_file, strip_crossing_prefix,
};
pub use model::{
    Cardinal, CaseObservation, CrossingMetadata, CrossingTable, DailyTable, ReadingColumn,
    TransitType, WeatherObservation,
};
