use std::collections::HashMap;
use std::time::Duration;
use lazy_static::lazy_static;
use serde::Deserialize;
use tracing::{debug, warn};
use crate::config::constants::{GEOCODER_TIMEOUT_SECS, GEOCODER_USER_AGENT, NOMINATIM_SEARCH_URL};
use crate::core::error::LocationError;
use crate::data::poi::Coordinate;
use crate::utils::logging::{self, OperationCategory};

lazy_static! {
    static ref BUILTIN_SITES: HashMap<&'static str, (f64, f64)> = {
        let mut m = HashMap::new();
        m.insert("berlin", (52.5200, 13.4050));
        m.insert("hamburg", (53.5511, 9.9937));
        m.insert("münchen", (48.1351, 11.5820));
        m.insert("munich", (48.1351, 11.5820));
        m.insert("köln", (50.9375, 6.9603));
        m.insert("frankfurt am main", (50.1109, 8.6821));
        m.insert("stuttgart", (48.7758, 9.1829));
        m.insert("düsseldorf", (51.2277, 6.7735));
        m.insert("leipzig", (51.3397, 12.3731));
        m.insert("dresden", (51.0504, 13.7373));
        m.insert("hannover", (52.3759, 9.7320));
        m.insert("bremen", (53.0793, 8.8017));
        m.insert("kiel", (54.3233, 10.1228));
        m.insert("rostock", (54.0924, 12.0991));
        m.insert("emden", (53.3670, 7.2060));
        m.insert("cuxhaven", (53.8615, 8.6944));
        m.insert("magdeburg", (52.1205, 11.6276));
        m.insert("freiburg im breisgau", (47.9990, 7.8421));
        m
    };
}

/// Maps a site name to coordinates.
pub trait Geocoder: Send + Sync {
    fn geocode(&self, name: &str) -> Result<Coordinate, LocationError>;

    fn name(&self) -> &str;
}

fn normalize(name: &str) -> String {
    name.trim().to_lowercase()
}

fn not_found(name: &str, reason: impl Into<String>) -> LocationError {
    LocationError::LocationNotFound { name: name.to_string(), reason: reason.into() }
}

/// Offline lookup table of common sites.
#[derive(Debug, Clone, Default)]
pub struct Gazetteer {
    entries: HashMap<String, Coordinate>,
}

impl Gazetteer {
    pub fn builtin() -> Self {
        let entries = BUILTIN_SITES.iter()
            .map(|(name, (lat, lon))| (name.to_string(), Coordinate::new(*lat, *lon)))
            .collect();
        Self { entries }
    }

    pub fn with_entry(mut self, name: &str, coordinate: Coordinate) -> Self {
        self.entries.insert(normalize(name), coordinate);
        self
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Geocoder for Gazetteer {
    fn geocode(&self, name: &str) -> Result<Coordinate, LocationError> {
        self.entries.get(&normalize(name))
            .copied()
            .ok_or_else(|| not_found(name, "not in gazetteer"))
    }

    fn name(&self) -> &str {
        "gazetteer"
    }
}

#[derive(Debug, Deserialize)]
struct NominatimPlace {
    lat: String,
    lon: String,
}

/// OpenStreetMap Nominatim search over HTTP.
pub struct NominatimGeocoder {
    client: reqwest::blocking::Client,
    search_url: String,
}

impl NominatimGeocoder {
    pub fn new(user_agent: Option<&str>) -> Result<Self, LocationError> {
        Self::with_url(NOMINATIM_SEARCH_URL, user_agent)
    }

    pub fn with_url(search_url: &str, user_agent: Option<&str>) -> Result<Self, LocationError> {
        let client = reqwest::blocking::Client::builder()
            .user_agent(user_agent.unwrap_or(GEOCODER_USER_AGENT))
            .timeout(Duration::from_secs(GEOCODER_TIMEOUT_SECS))
            .build()
            .map_err(|e| not_found(search_url, format!("HTTP client setup failed: {}", e)))?;
        Ok(Self { client, search_url: search_url.to_string() })
    }
}

impl Geocoder for NominatimGeocoder {
    fn geocode(&self, name: &str) -> Result<Coordinate, LocationError> {
        let _timing = logging::start_timing("nominatim_geocode", OperationCategory::Geocoding);

        let places: Vec<NominatimPlace> = self.client
            .get(&self.search_url)
            .query(&[("q", name), ("format", "json"), ("limit", "1")])
            .send()
            .and_then(|r| r.error_for_status())
            .and_then(|r| r.json())
            .map_err(|e| not_found(name, e.to_string()))?;

        let place = places.first().ok_or_else(|| not_found(name, "no search result"))?;
        let latitude: f64 = place.lat.parse().map_err(|_| not_found(name, "invalid latitude in response"))?;
        let longitude: f64 = place.lon.parse().map_err(|_| not_found(name, "invalid longitude in response"))?;
        debug!(site = name, latitude, longitude, "Geocoded site");
        Ok(Coordinate::new(latitude, longitude))
    }

    fn name(&self) -> &str {
        "nominatim"
    }
}

/// Tries each geocoder in order; the first match wins.
#[derive(Default)]
pub struct GeocoderChain {
    geocoders: Vec<Box<dyn Geocoder>>,
}

impl GeocoderChain {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, geocoder: Box<dyn Geocoder>) -> Self {
        self.geocoders.push(geocoder);
        self
    }

    pub fn len(&self) -> usize {
        self.geocoders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.geocoders.is_empty()
    }
}

impl Geocoder for GeocoderChain {
    fn geocode(&self, name: &str) -> Result<Coordinate, LocationError> {
        let mut last_error = not_found(name, "no geocoder configured");
        for geocoder in &self.geocoders {
            match geocoder.geocode(name) {
                Ok(coordinate) => return Ok(coordinate),
                Err(e) => {
                    debug!(site = name, geocoder = geocoder.name(), error = %e, "Geocoder miss");
                    last_error = e;
                }
            }
        }
        warn!(site = name, "No geocoder could resolve site");
        Err(last_error)
    }

    fn name(&self) -> &str {
        "chain"
    }
}
