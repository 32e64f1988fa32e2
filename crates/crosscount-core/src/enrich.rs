use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fmt;

use chrono::offset::LocalResult;
use chrono::{Datelike, NaiveDate, NaiveDateTime, Offset, TimeZone as _, Timelike, Utc, Weekday};
use chrono_tz::Tz;
use crosscount_parser::{CaseObservation, WeatherObservation};
use polars::df;
use polars::prelude::*;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::config::TowardsPair;

pub const DATE_KEY_FORMAT: &str = "%Y-%m-%d";

#[derive(Debug, Error)]
pub enum EnrichmentError {
    #[error("polars operation failed: {0}")]
    Polars(#[from] PolarsError),
    #[error("invalid timestamp micros {0}")]
    InvalidTimestamp(i64),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RelativeDirection {
    Towards,
    Away,
}

impl RelativeDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            RelativeDirection::Towards => "Towards",
            RelativeDirection::Away => "Away",
        }
    }
}

impl fmt::Display for RelativeDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

pub fn relative_direction(
    crossing: &str,
    direction: &str,
    towards: &[TowardsPair],
) -> RelativeDirection {
    let crossing = crossing.trim();
    let direction = direction.trim();
    let hit = towards.iter().any(|pair| {
        pair.crossing.trim().eq_ignore_ascii_case(crossing)
            && pair.direction.trim().eq_ignore_ascii_case(direction)
    });
    if hit {
        RelativeDirection::Towards
    } else {
        RelativeDirection::Away
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CalendarFields {
    pub year: i32,
    pub month: i32,
    pub day: i32,
    pub hour: i32,
    pub weekday: Weekday,
    pub date: NaiveDate,
}

impl CalendarFields {
    pub fn is_weekend(&self) -> bool {
        matches!(self.weekday, Weekday::Sat | Weekday::Sun)
    }

    pub fn date_key(&self) -> String {
        self.date.format(DATE_KEY_FORMAT).to_string()
    }
}

/// Calendar fields of a local wall-clock reading time.
pub fn calendar_fields(local: NaiveDateTime) -> CalendarFields {
    CalendarFields {
        year: local.year(),
        month: local.month() as i32,
        day: local.day() as i32,
        hour: local.hour() as i32,
        weekday: local.weekday(),
        date: local.date(),
    }
}

pub fn weekday_name(weekday: Weekday) -> &'static str {
    match weekday {
        Weekday::Mon => "Monday",
        Weekday::Tue => "Tuesday",
        Weekday::Wed => "Wednesday",
        Weekday::Thu => "Thursday",
        Weekday::Fri => "Friday",
        Weekday::Sat => "Saturday",
        Weekday::Sun => "Sunday",
    }
}

/// UTC offset in seconds of a local time in `tz`. Ambiguous fall-back times take the larger
/// offset (first occurrence); times inside a spring-forward gap have no offset.
pub fn resolve_utc_offset(local: NaiveDateTime, tz: Tz) -> Option<i32> {
    match tz.from_local_datetime(&local) {
        LocalResult::Single(dt) => Some(dt.offset().fix().local_minus_utc()),
        LocalResult::Ambiguous(a, b) => {
            let off_a = a.offset().fix().local_minus_utc();
            let off_b = b.offset().fix().local_minus_utc();
            Some(off_a.max(off_b))
        }
        LocalResult::None => None,
    }
}

#[derive(Debug, Clone)]
pub struct EnrichmentOptions {
    pub timezone: Tz,
    pub towards: Vec<TowardsPair>,
}

/// Attaches UTC timestamps, calendar fields and the towards/away label to decomposed readings.
pub fn enrich_readings(
    df: &DataFrame,
    options: &EnrichmentOptions,
) -> Result<DataFrame, EnrichmentError> {
    let len = df.height();
    let timestamps = df.column("timestamp")?.datetime()?;
    let crossings = df.column("crossing")?.str()?;
    let directions = df.column("direction")?.str()?;

    let mut utc_micros: Vec<Option<i64>> = Vec::with_capacity(len);
    let mut offsets: Vec<Option<i32>> = Vec::with_capacity(len);
    let mut relative: Vec<&'static str> = Vec::with_capacity(len);
    let mut years: Vec<Option<i32>> = Vec::with_capacity(len);
    let mut months: Vec<Option<i32>> = Vec::with_capacity(len);
    let mut days: Vec<Option<i32>> = Vec::with_capacity(len);
    let mut hours: Vec<Option<i32>> = Vec::with_capacity(len);
    let mut weekdays: Vec<Option<&'static str>> = Vec::with_capacity(len);
    let mut weekends: Vec<Option<bool>> = Vec::with_capacity(len);
    let mut dates: Vec<Option<String>> = Vec::with_capacity(len);

    let mut offset_cache: HashMap<i64, Option<i32>> = HashMap::new();
    let mut gap_rows = 0usize;

    for idx in 0..len {
        let label = match (crossings.get(idx), directions.get(idx)) {
            (Some(crossing), Some(direction)) => {
                relative_direction(crossing, direction, &options.towards)
            }
            _ => RelativeDirection::Away,
        };
        relative.push(label.as_str());

        let Some(micros) = timestamps.get(idx) else {
            utc_micros.push(None);
            offsets.push(None);
            years.push(None);
            months.push(None);
            days.push(None);
            hours.push(None);
            weekdays.push(None);
            weekends.push(None);
            dates.push(None);
            continue;
        };

        let local = naive_from_micros(micros)?;
        let fields = calendar_fields(local);
        years.push(Some(fields.year));
        months.push(Some(fields.month));
        days.push(Some(fields.day));
        hours.push(Some(fields.hour));
        weekdays.push(Some(weekday_name(fields.weekday)));
        weekends.push(Some(fields.is_weekend()));
        dates.push(Some(fields.date_key()));

        let offset = *offset_cache
            .entry(micros)
            .or_insert_with(|| resolve_utc_offset(local, options.timezone));
        match offset {
            Some(offset) => {
                utc_micros.push(Some(micros - i64::from(offset) * 1_000_000));
                offsets.push(Some(offset));
            }
            None => {
                gap_rows += 1;
                utc_micros.push(None);
                offsets.push(None);
            }
        }
    }

    if gap_rows > 0 {
        debug!(
            rows = gap_rows,
            timezone = %options.timezone,
            "readings fall inside a DST gap and have no UTC timestamp"
        );
    }

    let timestamp_utc = Series::new("timestamp_utc".into(), utc_micros).cast(
        &DataType::Datetime(TimeUnit::Microseconds, Some(polars::prelude::TimeZone::UTC)),
    )?;

    let mut output = df.clone();
    let mut columns = [
        timestamp_utc.into(),
        Series::new("utc_offset_seconds".into(), offsets).into(),
        Series::new("relative_direction".into(), relative).into(),
        Series::new("year".into(), years).into(),
        Series::new("month".into(), months).into(),
        Series::new("day".into(), days).into(),
        Series::new("hour".into(), hours).into(),
        Series::new("weekday".into(), weekdays).into(),
        Series::new("is_weekend".into(), weekends).into(),
        Series::new("date".into(), dates).into(),
    ];
    output.hstack_mut(columns.as_mut_slice())?;
    Ok(output)
}

/// Daily weather keyed by `date`. Several stations may report the same day; their values
/// are averaged so the frame holds one row per date.
pub fn weather_frame(observations: &[WeatherObservation]) -> PolarsResult<DataFrame> {
    let dates: Vec<String> = observations
        .iter()
        .map(|obs| obs.date.format(DATE_KEY_FORMAT).to_string())
        .collect();
    let precipitation: Vec<Option<f64>> = observations.iter().map(|obs| obs.precipitation).collect();
    let temperature: Vec<Option<f64>> =
        observations.iter().map(|obs| obs.avg_temperature).collect();

    df![
        "date" => dates,
        "precipitation" => precipitation,
        "avg_temperature" => temperature,
    ]?
    .lazy()
    .group_by([col("date")])
    .agg([
        col("precipitation").mean().alias("precipitation"),
        col("avg_temperature").mean().alias("avg_temperature"),
    ])
    .sort_by_exprs([col("date")], SortMultipleOptions::default())
    .collect()
}

/// Daily cumulative cases for one county (and optionally one state), with day-over-day
/// `new_cases`. Rows sharing a date are summed.
pub fn case_frame(
    observations: &[CaseObservation],
    county: &str,
    state: Option<&str>,
) -> PolarsResult<DataFrame> {
    let county = county.trim();
    let mut per_date: BTreeMap<NaiveDate, Option<i64>> = BTreeMap::new();
    let mut states_per_date: BTreeMap<NaiveDate, BTreeSet<String>> = BTreeMap::new();

    for obs in observations {
        if !obs.county.eq_ignore_ascii_case(county) {
            continue;
        }
        if let Some(state) = state {
            let matches_state = obs
                .state
                .as_deref()
                .is_some_and(|value| value.eq_ignore_ascii_case(state.trim()));
            if !matches_state {
                continue;
            }
        }
        if let Some(obs_state) = obs.state.as_deref() {
            states_per_date
                .entry(obs.date)
                .or_default()
                .insert(obs_state.to_ascii_lowercase());
        }
        per_date
            .entry(obs.date)
            .and_modify(|total| {
                *total = match (*total, obs.cases) {
                    (Some(a), Some(b)) => Some(a + b),
                    (a, b) => a.or(b),
                }
            })
            .or_insert(obs.cases);
    }

    let mixed_dates = states_per_date
        .values()
        .filter(|states| states.len() > 1)
        .count();
    if mixed_dates > 0 {
        warn!(
            county,
            dates = mixed_dates,
            "county name matches several states; case counts are summed across them"
        );
    }

    let mut dates = Vec::with_capacity(per_date.len());
    let mut cases = Vec::with_capacity(per_date.len());
    let mut new_cases = Vec::with_capacity(per_date.len());
    let mut previous: Option<i64> = None;
    for (date, total) in per_date {
        dates.push(date.format(DATE_KEY_FORMAT).to_string());
        cases.push(total);
        new_cases.push(match (previous, total) {
            (Some(prev), Some(current)) => Some(current - prev),
            _ => None,
        });
        previous = total;
    }

    info!(county, rows = dates.len(), "selected county case counts");

    df![
        "date" => dates,
        "cases" => cases,
        "new_cases" => new_cases,
    ]
}

/// Left-joins daily weather and case counts onto readings by `date`. Every reading row is
/// kept in input order; missing side tables yield all-null columns.
pub fn join_daily(
    readings: &DataFrame,
    weather: Option<&DataFrame>,
    cases: Option<&DataFrame>,
) -> PolarsResult<DataFrame> {
    const ROW_INDEX: &str = "__row_idx";

    let height = readings.height();
    let mut lf = readings.with_row_index(ROW_INDEX.into(), None)?.lazy();

    lf = match weather {
        Some(weather) => lf.join(
            weather.clone().lazy().select([
                col("date"),
                col("precipitation"),
                col("avg_temperature"),
            ]),
            [col("date")],
            [col("date")],
            JoinArgs::new(JoinType::Left),
        ),
        None => lf.with_columns([
            lit(NULL).cast(DataType::Float64).alias("precipitation"),
            lit(NULL).cast(DataType::Float64).alias("avg_temperature"),
        ]),
    };

    lf = match cases {
        Some(cases) => lf.join(
            cases
                .clone()
                .lazy()
                .select([col("date"), col("cases"), col("new_cases")]),
            [col("date")],
            [col("date")],
            JoinArgs::new(JoinType::Left),
        ),
        None => lf.with_columns([
            lit(NULL).cast(DataType::Int64).alias("cases"),
            lit(NULL).cast(DataType::Int64).alias("new_cases"),
        ]),
    };

    let joined = lf
        .sort_by_exprs([col(ROW_INDEX)], SortMultipleOptions::default())
        .collect()?
        .drop(ROW_INDEX)?;

    if joined.height() != height {
        return Err(PolarsError::ComputeError(
            format!(
                "daily join changed the reading count from {height} to {}",
                joined.height()
            )
            .into(),
        ));
    }
    Ok(joined)
}

fn naive_from_micros(value: i64) -> Result<NaiveDateTime, EnrichmentError> {
    let secs = value.div_euclid(1_000_000);
    let micros = value.rem_euclid(1_000_000) as u32;
    chrono::DateTime::<Utc>::from_timestamp(secs, micros * 1_000)
        .map(|dt| dt.naive_utc())
        .ok_or(EnrichmentError::InvalidTimestamp(value))
}
