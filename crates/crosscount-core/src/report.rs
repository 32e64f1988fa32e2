use chrono::NaiveDate;
use polars::prelude::*;
use thiserror::Error;
use tracing::info;

use crate::config::Annotation;
use crate::enrich::DATE_KEY_FORMAT;

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("polars operation failed: {0}")]
    Polars(#[from] PolarsError),
}

/// Aggregate tables derived from the enriched reading table. Null counts never contribute
/// to a sum or mean.
#[derive(Debug, Clone)]
pub struct ReportTables {
    pub yearly_totals: DataFrame,
    pub monthly_by_transit: DataFrame,
    pub hourly_profile: DataFrame,
    pub daily_weather: DataFrame,
    pub daily_cases: DataFrame,
    pub annotated_daily: DataFrame,
}

impl ReportTables {
    pub fn named(&self) -> [(&'static str, &DataFrame); 6] {
        [
            ("yearly_totals", &self.yearly_totals),
            ("monthly_by_transit", &self.monthly_by_transit),
            ("hourly_profile", &self.hourly_profile),
            ("daily_weather", &self.daily_weather),
            ("daily_cases", &self.daily_cases),
            ("annotated_daily", &self.annotated_daily),
        ]
    }
}

pub fn build_reports(
    readings: &DataFrame,
    annotations: &[Annotation],
) -> Result<ReportTables, ReportError> {
    let daily = daily_totals(readings)?;
    Ok(ReportTables {
        yearly_totals: yearly_totals(readings)?,
        monthly_by_transit: monthly_by_transit(readings)?,
        hourly_profile: hourly_profile(readings)?,
        daily_weather: daily_weather(&daily)?,
        daily_cases: daily_cases(&daily)?,
        annotated_daily: annotated_daily(readings, annotations)?,
    })
}

pub fn yearly_totals(readings: &DataFrame) -> PolarsResult<DataFrame> {
    readings
        .clone()
        .lazy()
        .group_by([col("year"), col("crossing")])
        .agg([col("count").sum().alias("total")])
        .sort_by_exprs([col("year"), col("crossing")], SortMultipleOptions::default())
        .collect()
}

pub fn monthly_by_transit(readings: &DataFrame) -> PolarsResult<DataFrame> {
    readings
        .clone()
        .lazy()
        .group_by([col("year"), col("month"), col("transit_type")])
        .agg([col("count").sum().alias("total")])
        .sort_by_exprs(
            [col("year"), col("month"), col("transit_type")],
            SortMultipleOptions::default(),
        )
        .collect()
}

/// Mean hourly volume per (weekend?, hour, towards/away). Readings are first summed per day
/// so the mean is taken across days rather than across counters.
pub fn hourly_profile(readings: &DataFrame) -> PolarsResult<DataFrame> {
    readings
        .clone()
        .lazy()
        .group_by([
            col("date"),
            col("is_weekend"),
            col("hour"),
            col("relative_direction"),
        ])
        .agg([col("count").sum().alias("hour_total")])
        .group_by([col("is_weekend"), col("hour"), col("relative_direction")])
        .agg([
            col("hour_total").mean().alias("mean_count"),
            col("hour_total").len().alias("days"),
        ])
        .sort_by_exprs(
            [col("is_weekend"), col("hour"), col("relative_direction")],
            SortMultipleOptions::default(),
        )
        .collect()
}

/// One row per date: summed count plus the day's joined weather and case values.
pub fn daily_totals(readings: &DataFrame) -> PolarsResult<DataFrame> {
    readings
        .clone()
        .lazy()
        .group_by([col("date")])
        .agg([
            col("count").sum().alias("total"),
            col("precipitation").first().alias("precipitation"),
            col("avg_temperature").first().alias("avg_temperature"),
            col("cases").first().alias("cases"),
            col("new_cases").first().alias("new_cases"),
        ])
        .sort_by_exprs([col("date")], SortMultipleOptions::default())
        .collect()
}

/// Daily totals restricted to days that have any weather value.
pub fn daily_weather(daily: &DataFrame) -> PolarsResult<DataFrame> {
    let kept = daily
        .clone()
        .lazy()
        .filter(
            col("precipitation")
                .is_not_null()
                .or(col("avg_temperature").is_not_null()),
        )
        .select([
            col("date"),
            col("total"),
            col("precipitation"),
            col("avg_temperature"),
        ])
        .collect()?;
    log_dropped_days("daily_weather", daily.height(), kept.height());
    Ok(kept)
}

/// Daily totals restricted to days with a case count.
pub fn daily_cases(daily: &DataFrame) -> PolarsResult<DataFrame> {
    let kept = daily
        .clone()
        .lazy()
        .filter(col("cases").is_not_null())
        .select([col("date"), col("total"), col("cases"), col("new_cases")])
        .collect()?;
    log_dropped_days("daily_cases", daily.height(), kept.height());
    Ok(kept)
}

/// Daily totals per crossing with the label of the first annotation window covering the date.
pub fn annotated_daily(
    readings: &DataFrame,
    annotations: &[Annotation],
) -> PolarsResult<DataFrame> {
    let mut daily = readings
        .clone()
        .lazy()
        .group_by([col("date"), col("crossing")])
        .agg([col("count").sum().alias("total")])
        .sort_by_exprs([col("date"), col("crossing")], SortMultipleOptions::default())
        .collect()?;

    let labels: Vec<Option<&str>> = daily
        .column("date")?
        .str()?
        .into_iter()
        .map(|date| {
            let date = NaiveDate::parse_from_str(date?, DATE_KEY_FORMAT).ok()?;
            annotations
                .iter()
                .find(|annotation| annotation.contains(date))
                .map(|annotation| annotation.label.as_str())
        })
        .collect();

    let mut columns = [Series::new("annotation".into(), labels).into()];
    daily.hstack_mut(columns.as_mut_slice())?;
    Ok(daily)
}

fn log_dropped_days(report: &'static str, total_days: usize, kept_days: usize) {
    let dropped = total_days.saturating_sub(kept_days);
    if dropped > 0 {
        info!(
            report,
            dropped_days = dropped,
            kept_days,
            "days without a matching side-table row were left out"
        );
    }
}
