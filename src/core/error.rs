use chrono::{DateTime, NaiveDate, Utc};
use crate::data::power_curves::PowerBand;
use crate::data::weather::WeatherError;

#[derive(Debug, Clone, PartialEq)]
pub enum LocationError {
    LocationNotFound { name: String, reason: String },
}

impl std::fmt::Display for LocationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LocationError::LocationNotFound { name, reason } => {
                write!(f, "Location '{}' not found: {}", name, reason)
            }
        }
    }
}

impl std::error::Error for LocationError {}

/// Failure while turning one day of weather into power for one asset.
#[derive(Debug)]
pub enum SimulationError {
    MissingWeatherField {
        field: &'static str,
        timestamp: DateTime<Utc>,
    },
    UnknownTurbineClass(PowerBand),
    Weather(WeatherError),
}

impl From<WeatherError> for SimulationError {
    fn from(err: WeatherError) -> Self {
        SimulationError::Weather(err)
    }
}

impl std::fmt::Display for SimulationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SimulationError::MissingWeatherField { field, timestamp } => {
                write!(f, "Missing weather field '{}' at {}", field, timestamp)
            }
            SimulationError::UnknownTurbineClass(band) => {
                write!(f, "No turbine power curves in class '{}'", band)
            }
            SimulationError::Weather(e) => write!(f, "Weather error: {}", e),
        }
    }
}

impl std::error::Error for SimulationError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SimulationError::Weather(e) => Some(e),
            _ => None,
        }
    }
}

/// Failure of a whole simulation run.
#[derive(Debug)]
pub enum RunError {
    TaskFailed {
        asset: String,
        day: NaiveDate,
        source: SimulationError,
    },
    InvalidRequest(String),
    ThreadPool(String),
}

impl std::fmt::Display for RunError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RunError::TaskFailed { asset, day, source } => {
                write!(f, "Task for asset '{}' on {} failed: {}", asset, day, source)
            }
            RunError::InvalidRequest(s) => write!(f, "Invalid simulation request: {}", s),
            RunError::ThreadPool(s) => write!(f, "Worker pool error: {}", s),
        }
    }
}

impl std::error::Error for RunError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            RunError::TaskFailed { source, .. } => Some(source),
            _ => None,
        }
    }
}
