use std::fs;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// (crossing, direction) pairs whose travel heads towards the city center.
pub const DEFAULT_TOWARDS: [(&str, &str); 4] = [
    ("Fremont Bridge", "South"),
    ("Burke Gilman Trail", "South"),
    ("Elliott Bay Trail", "South"),
    ("Spokane St Bridge", "East"),
];

pub const DEFAULT_TIMEZONE: &str = "America/Los_Angeles";
pub const DEFAULT_COUNTY: &str = "King";
pub const DEFAULT_STATE: &str = "Washington";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config TOML: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("unknown time zone '{0}'")]
    InvalidTimezone(String),
    #[error("annotation '{label}' ends ({end}) before it starts ({start})")]
    InvalidAnnotation {
        label: String,
        start: NaiveDate,
        end: NaiveDate,
    },
    #[error("towards pair #{0} has an empty crossing or direction")]
    InvalidTowardsPair(usize),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TowardsPair {
    pub crossing: String,
    pub direction: String,
}

impl TowardsPair {
    pub fn new(crossing: impl Into<String>, direction: impl Into<String>) -> Self {
        Self {
            crossing: crossing.into(),
            direction: direction.into(),
        }
    }
}

/// A labelled date window attached to daily report rows, inclusive on both ends.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Annotation {
    pub label: String,
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl Annotation {
    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.start && date <= self.end
    }
}

fn default_annotations() -> Vec<Annotation> {
    NaiveDate::from_ymd_opt(2020, 6, 8)
        .zip(NaiveDate::from_ymd_opt(2020, 7, 1))
        .map(|(start, end)| Annotation {
            label: "CHAZ/CHOP".to_string(),
            start,
            end,
        })
        .into_iter()
        .collect()
}

pub fn default_towards() -> Vec<TowardsPair> {
    DEFAULT_TOWARDS
        .iter()
        .map(|(crossing, direction)| TowardsPair::new(*crossing, *direction))
        .collect()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportConfig {
    pub counts_dir: PathBuf,
    pub counts_glob: String,
    pub weather_path: Option<PathBuf>,
    pub cases_path: Option<PathBuf>,
    pub output_dir: PathBuf,
    pub timezone: String,
    pub county: String,
    pub state: Option<String>,
    pub towards: Vec<TowardsPair>,
    pub annotations: Vec<Annotation>,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            counts_dir: PathBuf::from("data/counts"),
            counts_glob: "*.csv".to_string(),
            weather_path: None,
            cases_path: None,
            output_dir: PathBuf::from("output"),
            timezone: DEFAULT_TIMEZONE.to_string(),
            county: DEFAULT_COUNTY.to_string(),
            state: Some(DEFAULT_STATE.to_string()),
            towards: default_towards(),
            annotations: default_annotations(),
        }
    }
}

impl ReportConfig {
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: ReportConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    pub fn timezone(&self) -> Result<Tz, ConfigError> {
        self.timezone
            .parse::<Tz>()
            .map_err(|_| ConfigError::InvalidTimezone(self.timezone.clone()))
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.timezone()?;
        for (idx, pair) in self.towards.iter().enumerate() {
            if pair.crossing.trim().is_empty() || pair.direction.trim().is_empty() {
                return Err(ConfigError::InvalidTowardsPair(idx));
            }
        }
        for annotation in &self.annotations {
            if annotation.end < annotation.start {
                return Err(ConfigError::InvalidAnnotation {
                    label: annotation.label.clone(),
                    start: annotation.start,
                    end: annotation.end,
                });
            }
        }
        Ok(())
    }

    pub fn counts_pattern(&self) -> String {
        self.counts_dir
            .join(&self.counts_glob)
            .to_string_lossy()
            .into_owned()
    }
}
