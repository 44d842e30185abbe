use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use serde::{Deserialize, Serialize};
use tracing::warn;
use crate::config::constants::{
    DEFAULT_CACHE_DIR, DEFAULT_SAMPLE_INTERVAL_MINUTES, GEOCODER_USER_AGENT,
};
use crate::data::geocoder::{Gazetteer, Geocoder, GeocoderChain, NominatimGeocoder};
use crate::data::station_weather::StationArchiveProvider;
use crate::data::synthetic_weather::SyntheticWeatherProvider;
use crate::data::weather::WeatherProvider;

/// What a failed (asset, day) task does to the run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailurePolicy {
    /// First failure ends the run.
    #[default]
    Abort,
    /// Record the failure and keep going.
    SkipTask,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WeatherSource {
    #[default]
    Synthetic,
    Station,
}

impl FromStr for WeatherSource {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "synthetic" => Ok(WeatherSource::Synthetic),
            "station" | "dwd" => Ok(WeatherSource::Station),
            _ => Err(format!("Unknown weather source: {}", s)),
        }
    }
}

impl fmt::Display for WeatherSource {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            WeatherSource::Synthetic => write!(f, "synthetic"),
            WeatherSource::Station => write!(f, "station"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Worker threads; `None` uses every available core.
    pub workers: Option<usize>,
    pub failure_policy: FailurePolicy,
    pub densify: bool,
    pub weather: WeatherSource,
    pub sample_interval_minutes: u32,   // synthetic provider only
    pub seed: u64,
    pub cache_dir: String,
    /// Mirror serving monthly station text files; without one the cache is never filled.
    pub station_base_url: Option<String>,
    pub geocoder_user_agent: String,
    pub offline: bool,                  // no network access for geocoding or downloads
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            workers: None,
            failure_policy: FailurePolicy::Abort,
            densify: false,
            weather: WeatherSource::Synthetic,
            sample_interval_minutes: DEFAULT_SAMPLE_INTERVAL_MINUTES,
            seed: 0,
            cache_dir: DEFAULT_CACHE_DIR.to_string(),
            station_base_url: None,
            geocoder_user_agent: GEOCODER_USER_AGENT.to_string(),
            offline: false,
        }
    }
}

impl SimulationConfig {
    pub fn worker_count(&self) -> usize {
        self.workers
            .filter(|&w| w > 0)
            .unwrap_or_else(|| std::thread::available_parallelism().map(|n| n.get()).unwrap_or(1))
    }

    pub fn weather_provider(&self) -> Arc<dyn WeatherProvider> {
        match self.weather {
            WeatherSource::Synthetic => {
                Arc::new(SyntheticWeatherProvider::new(self.seed, self.sample_interval_minutes))
            }
            WeatherSource::Station => {
                let provider = StationArchiveProvider::new(&self.cache_dir).offline(self.offline);
                match &self.station_base_url {
                    Some(base_url) => Arc::new(provider.with_base_url(base_url)),
                    None => Arc::new(provider),
                }
            }
        }
    }

    /// Built-in gazetteer, followed by Nominatim unless offline.
    pub fn geocoder(&self) -> Box<dyn Geocoder> {
        let mut chain = GeocoderChain::new().with(Box::new(Gazetteer::builtin()));
        if !self.offline {
            match NominatimGeocoder::new(Some(&self.geocoder_user_agent)) {
                Ok(nominatim) => chain = chain.with(Box::new(nominatim)),
                Err(e) => warn!(error = %e, "HTTP geocoder unavailable, using gazetteer only"),
            }
        }
        Box::new(chain)
    }
}
