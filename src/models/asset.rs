use std::fmt;
use serde::{Deserialize, Serialize};
use crate::config::constants::{DEFAULT_ALBEDO, DEFAULT_DEGRADATION_RATE};
use crate::config::scenario::Scenario;
use crate::data::poi::{Coordinate, Site};
use crate::data::weather::WeatherKind;

/// Where an asset stands: a name to geocode, or explicit coordinates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SiteRef {
    Name(String),
    Coordinates {
        #[serde(default)]
        name: Option<String>,
        latitude: f64,
        longitude: f64,
    },
}

impl SiteRef {
    /// Key under which the site is resolved and cached.
    pub fn key(&self) -> String {
        match self {
            SiteRef::Name(name) => name.trim().to_string(),
            SiteRef::Coordinates { name: Some(name), .. } => name.trim().to_string(),
            SiteRef::Coordinates { name: None, latitude, longitude } => {
                format!("{:.4},{:.4}", latitude, longitude)
            }
        }
    }

    /// The site itself when no lookup is needed.
    pub fn fixed_site(&self) -> Option<Site> {
        match self {
            SiteRef::Name(_) => None,
            SiteRef::Coordinates { latitude, longitude, .. } => {
                Some(Site::new(self.key(), Coordinate::new(*latitude, *longitude)))
            }
        }
    }
}

impl fmt::Display for SiteRef {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.key())
    }
}

/// Optional PV losses; all default to none.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PvLosses {
    pub age_years: f64,
    pub degradation_rate: f64,
    pub shading: f64,
    pub soiling: f64,
}

impl Default for PvLosses {
    fn default() -> Self {
        Self {
            age_years: 0.0,
            degradation_rate: DEFAULT_DEGRADATION_RATE,
            shading: 0.0,
            soiling: 0.0,
        }
    }
}

impl PvLosses {
    pub fn factor(&self) -> f64 {
        let degradation = 1.0 - self.degradation_rate * self.age_years;
        (degradation * (1.0 - self.shading) * (1.0 - self.soiling)).clamp(0.0, 1.0)
    }
}

fn default_azimuth() -> f64 {
    180.0
}

fn default_albedo() -> f64 {
    DEFAULT_ALBEDO
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PvParameters {
    pub tilt: f64,
    #[serde(default = "default_azimuth")]
    pub azimuth: f64,
    #[serde(default = "default_albedo")]
    pub albedo: f64,
    #[serde(default)]
    pub losses: PvLosses,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WindParameters {
    pub hub_height: f64,
    /// Per-turbine rated power (MW).
    pub turbine_rated_power: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum AssetKind {
    Pv(PvParameters),
    Wind(WindParameters),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Asset {
    pub name: String,
    /// Installed capacity (MW).
    pub rated_power: f64,
    pub site: SiteRef,
    /// Overrides the scenario of the simulation request.
    #[serde(default)]
    pub scenario: Option<Scenario>,
    #[serde(flatten)]
    pub kind: AssetKind,
}

impl Asset {
    pub fn new_pv(name: impl Into<String>, rated_power: f64, site: SiteRef, params: PvParameters) -> Self {
        Self {
            name: name.into(),
            rated_power,
            site,
            scenario: None,
            kind: AssetKind::Pv(params),
        }
    }

    pub fn new_wind(name: impl Into<String>, rated_power: f64, site: SiteRef, params: WindParameters) -> Self {
        Self {
            name: name.into(),
            rated_power,
            site,
            scenario: None,
            kind: AssetKind::Wind(params),
        }
    }

    pub fn with_scenario(mut self, scenario: Scenario) -> Self {
        self.scenario = Some(scenario);
        self
    }

    pub fn weather_kind(&self) -> WeatherKind {
        match self.kind {
            AssetKind::Pv(_) => WeatherKind::Pv,
            AssetKind::Wind(_) => WeatherKind::Wind,
        }
    }

    pub fn effective_scenario(&self, requested: Scenario) -> Scenario {
        self.scenario.unwrap_or(requested)
    }

    /// Number of turbines in a wind park; `None` for PV.
    pub fn turbine_count(&self) -> Option<u32> {
        match &self.kind {
            AssetKind::Wind(w) => Some(turbine_count(self.rated_power, w.turbine_rated_power)),
            AssetKind::Pv(_) => None,
        }
    }
}

pub fn turbine_count(park_rated_power: f64, turbine_rated_power: f64) -> u32 {
    if turbine_rated_power <= 0.0 {
        return 1;
    }
    (park_rated_power / turbine_rated_power).round().max(1.0) as u32
}
