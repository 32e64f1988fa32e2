use std::fmt;

use chrono::NaiveDate;
use polars::prelude::*;
use serde::{Deserialize, Serialize};

/// Describes where the crossing name of a counter export came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CrossingMetadata {
    pub crossing_name: String,
    /// Header text of the per-crossing total column, as found in the file.
    pub crossing_column: String,
    pub date_column: String,
}

/// One wide counter export after parsing.
///
/// `df` holds the shared per-row columns (`timestamp`, `total`); each entry of
/// `readings` holds a single `count` column aligned row-for-row with `df`.
#[derive(Debug, Clone)]
pub struct CrossingTable {
    pub metadata: CrossingMetadata,
    pub df: DataFrame,
    pub readings: Vec<ReadingColumn>,
    pub skipped_rows: usize,
}

impl CrossingTable {
    pub fn crossing_name(&self) -> &str {
        &self.metadata.crossing_name
    }

    pub fn labels(&self) -> Vec<&str> {
        self.readings.iter().map(|r| r.label.as_str()).collect()
    }

    pub fn height(&self) -> usize {
        self.df.height()
    }
}

#[derive(Debug, Clone)]
pub struct ReadingColumn {
    /// Direction/mode header with any crossing-name prefix removed.
    pub label: String,
    pub df: DataFrame,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WeatherObservation {
    pub date: NaiveDate,
    pub precipitation: Option<f64>,
    pub avg_temperature: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaseObservation {
    pub date: NaiveDate,
    pub county: String,
    pub state: Option<String>,
    pub cases: Option<i64>,
}

/// Parsed rows of a daily side table plus the number of rows that were dropped.
#[derive(Debug, Clone)]
pub struct DailyTable<T> {
    pub rows: Vec<T>,
    pub skipped_rows: usize,
}

impl<T> DailyTable<T> {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransitType {
    Bike,
    Pedestrian,
}

impl TransitType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransitType::Bike => "bike",
            TransitType::Pedestrian => "pedestrian",
        }
    }
}

impl fmt::Display for TransitType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for TransitType {
    type Error = String;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.trim().to_ascii_lowercase().as_str() {
            "bike" | "bikes" | "bicycle" | "bicycles" | "cyclist" | "cyclists" => {
                Ok(TransitType::Bike)
            }
            "ped" | "peds" | "pedestrian" | "pedestrians" => Ok(TransitType::Pedestrian),
            other => Err(format!("unknown transit type '{other}'")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Cardinal {
    North,
    South,
    East,
    West,
}

impl Cardinal {
    pub fn as_str(&self) -> &'static str {
        match self {
            Cardinal::North => "North",
            Cardinal::South => "South",
            Cardinal::East => "East",
            Cardinal::West => "West",
        }
    }

    /// Matches full names only (`north`, `South`, ...).
    pub fn from_name(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "north" => Some(Cardinal::North),
            "south" => Some(Cardinal::South),
            "east" => Some(Cardinal::East),
            "west" => Some(Cardinal::West),
            _ => None,
        }
    }

    /// Matches bound abbreviations (`NB`, `sb`, ...).
    pub fn from_abbreviation(value: &str) -> Option<Self> {
        match value.trim().to_ascii_uppercase().as_str() {
            "NB" => Some(Cardinal::North),
            "SB" => Some(Cardinal::South),
            "EB" => Some(Cardinal::East),
            "WB" => Some(Cardinal::West),
            _ => None,
        }
    }
}

impl fmt::Display for Cardinal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
