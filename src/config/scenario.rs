use std::fmt;
use std::str::FromStr;
use serde::{Deserialize, Serialize};
use crate::config::constants::{
    PV_GENERATOR_CORRECTION, PV_TEMPERATURE_CORRECTION, PV_SYSTEM_EFFICIENCY,
    WIND_SHEAR_EXPONENT, WIND_WAKE_LOSS, WIND_SYSTEM_EFFICIENCY,
};

/// Assumption profile selecting which correction tables apply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Scenario {
    Best,
    Normal,
    Worst,
}

impl Scenario {
    pub const ALL: [Scenario; 3] = [Scenario::Best, Scenario::Normal, Scenario::Worst];

    /// Column of this scenario in the constant tables.
    pub fn index(&self) -> usize {
        match self {
            Scenario::Best => 0,
            Scenario::Normal => 1,
            Scenario::Worst => 2,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Scenario::Best => "best",
            Scenario::Normal => "normal",
            Scenario::Worst => "worst",
        }
    }
}

impl FromStr for Scenario {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "best" => Ok(Scenario::Best),
            "normal" => Ok(Scenario::Normal),
            "worst" => Ok(Scenario::Worst),
            _ => Err(format!("Unknown scenario: {}", s)),
        }
    }
}

impl fmt::Display for Scenario {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Immutable empirical correction tables, owned by the generator models.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScenarioTables {
    pub pv_generator_correction: [[f64; 3]; 12],
    pub pv_temperature_correction: [f64; 12],
    pub pv_system_efficiency: [f64; 3],
    pub wind_shear_exponent: [f64; 3],
    pub wind_wake_loss: [f64; 3],
    pub wind_system_efficiency: [f64; 3],
}

impl Default for ScenarioTables {
    fn default() -> Self {
        Self {
            pv_generator_correction: PV_GENERATOR_CORRECTION,
            pv_temperature_correction: PV_TEMPERATURE_CORRECTION,
            pv_system_efficiency: PV_SYSTEM_EFFICIENCY,
            wind_shear_exponent: WIND_SHEAR_EXPONENT,
            wind_wake_loss: WIND_WAKE_LOSS,
            wind_system_efficiency: WIND_SYSTEM_EFFICIENCY,
        }
    }
}

impl ScenarioTables {
    /// `k_g(scenario, month) * k_t(month) * eta_sys(scenario)`, month in 1..=12.
    pub fn pv_performance_ratio(&self, scenario: Scenario, month: u32) -> f64 {
        let m = (month.clamp(1, 12) - 1) as usize;
        self.pv_generator_correction[m][scenario.index()]
            * self.pv_temperature_correction[m]
            * self.pv_system_efficiency[scenario.index()]
    }

    pub fn shear_exponent(&self, scenario: Scenario) -> f64 {
        self.wind_shear_exponent[scenario.index()]
    }

    pub fn wake_loss(&self, scenario: Scenario) -> f64 {
        self.wind_wake_loss[scenario.index()]
    }

    pub fn wind_system_efficiency(&self, scenario: Scenario) -> f64 {
        self.wind_system_efficiency[scenario.index()]
    }
}
