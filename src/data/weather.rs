use std::fmt;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use super::poi::Site;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WeatherKind {
    Pv,
    Wind,
}

impl WeatherKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            WeatherKind::Pv => "pv",
            WeatherKind::Wind => "wind",
        }
    }

    /// Name of the observed quantity, used in error messages.
    pub fn field_name(&self) -> &'static str {
        match self {
            WeatherKind::Pv => "ghi",
            WeatherKind::Wind => "wind_speed",
        }
    }
}

impl fmt::Display for WeatherKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum MeasurementUnit {
    WattsPerSquareMetre,
    /// Irradiation summed over the sampling interval.
    JoulesPerSquareCentimetre { interval_minutes: u32 },
    MetresPerSecond,
}

/// One observation from a weather feed.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WeatherSample {
    pub timestamp: DateTime<Utc>,
    pub measurement: Option<f64>,
    pub unit: MeasurementUnit,
}

impl WeatherSample {
    pub fn new(timestamp: DateTime<Utc>, measurement: Option<f64>, unit: MeasurementUnit) -> Self {
        Self { timestamp, measurement, unit }
    }

    /// Irradiance as instantaneous power density (W/m²).
    pub fn irradiance_w_m2(&self) -> Option<f64> {
        let value = self.measurement?;
        match self.unit {
            MeasurementUnit::WattsPerSquareMetre => Some(value),
            MeasurementUnit::JoulesPerSquareCentimetre { interval_minutes } => {
                if interval_minutes == 0 {
                    return None;
                }
                Some(value * 10_000.0 / (interval_minutes as f64 * 60.0))
            }
            MeasurementUnit::MetresPerSecond => None,
        }
    }

    pub fn wind_speed_m_s(&self) -> Option<f64> {
        match self.unit {
            MeasurementUnit::MetresPerSecond => self.measurement,
            _ => None,
        }
    }
}

#[derive(Debug)]
pub enum WeatherError {
    NoDataForSite(String),
    NoDataForDate { site: String, day: NaiveDate },
    IoError(std::io::Error),
    CsvError(csv::Error),
    HttpError(String),
    ParseError(String),
}

impl From<std::io::Error> for WeatherError {
    fn from(err: std::io::Error) -> Self {
        WeatherError::IoError(err)
    }
}

impl From<csv::Error> for WeatherError {
    fn from(err: csv::Error) -> Self {
        WeatherError::CsvError(err)
    }
}

impl From<reqwest::Error> for WeatherError {
    fn from(err: reqwest::Error) -> Self {
        WeatherError::HttpError(err.to_string())
    }
}

impl fmt::Display for WeatherError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WeatherError::NoDataForSite(s) => write!(f, "No weather data for site '{}'", s),
            WeatherError::NoDataForDate { site, day } => {
                write!(f, "No weather data for site '{}' on {}", site, day)
            }
            WeatherError::IoError(e) => write!(f, "IO error: {}", e),
            WeatherError::CsvError(e) => write!(f, "CSV error: {}", e),
            WeatherError::HttpError(s) => write!(f, "HTTP error: {}", s),
            WeatherError::ParseError(s) => write!(f, "Parse error: {}", s),
        }
    }
}

impl std::error::Error for WeatherError {}

/// Source of per-site daily weather.
///
/// Implementations return the samples of one calendar day (UTC) in
/// chronological order at a fixed sampling interval.
pub trait WeatherProvider: Send + Sync {
    fn fetch(&self, site: &Site, day: NaiveDate, kind: WeatherKind) -> Result<Vec<WeatherSample>, WeatherError>;

    fn name(&self) -> &str;
}
