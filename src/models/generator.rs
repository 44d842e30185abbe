use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use crate::config::scenario::{Scenario, ScenarioTables};
use crate::core::error::SimulationError;
use crate::data::poi::Site;
use crate::data::power_curves::PowerCurveCatalog;
use crate::data::weather::WeatherSample;
use crate::models::asset::{Asset, AssetKind};
use crate::models::pv::PvModel;
use crate::models::wind::WindModel;
use crate::utils::logging::{self, OperationCategory, PowerCalcType};
use crate::utils::traits::PowerModel;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GeneratorType {
    Pv,
    Wind,
}

impl FromStr for GeneratorType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "pv" | "solar" => Ok(GeneratorType::Pv),
            "wind" => Ok(GeneratorType::Wind),
            _ => Err(format!("Unknown generator type: {}", s)),
        }
    }
}

impl fmt::Display for GeneratorType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            GeneratorType::Pv => write!(f, "pv"),
            GeneratorType::Wind => write!(f, "wind"),
        }
    }
}

/// Data-quality signals that do not abort a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DataQuality {
    /// Zero irradiance during operating hours.
    DarkNoon,
    /// Zero hub-height wind during operating hours.
    CalmWind,
}

impl fmt::Display for DataQuality {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            DataQuality::DarkNoon => write!(f, "zero irradiance during operating hours"),
            DataQuality::CalmWind => write!(f, "zero wind during operating hours"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PowerSample {
    pub timestamp: DateTime<Utc>,
    pub power_mw: f64,
    pub quality: Option<DataQuality>,
}

/// Concrete model for one asset, chosen by its kind.
#[derive(Debug, Clone)]
pub enum GeneratorModel {
    Pv(PvModel),
    Wind(WindModel),
}

impl GeneratorModel {
    pub fn for_asset(
        asset: &Asset,
        site: &Site,
        scenario: Scenario,
        tables: ScenarioTables,
        catalog: &Arc<PowerCurveCatalog>,
    ) -> Self {
        match &asset.kind {
            AssetKind::Pv(params) => GeneratorModel::Pv(PvModel::new(
                asset.rated_power,
                site.coordinate,
                params.clone(),
                scenario,
                tables,
            )),
            AssetKind::Wind(params) => GeneratorModel::Wind(WindModel::new(
                asset.rated_power,
                site.coordinate,
                params.clone(),
                scenario,
                tables,
                Arc::clone(catalog),
            )),
        }
    }

    pub fn generator_type(&self) -> GeneratorType {
        match self {
            GeneratorModel::Pv(_) => GeneratorType::Pv,
            GeneratorModel::Wind(_) => GeneratorType::Wind,
        }
    }

    /// Runs the model over one day of samples, preserving their order.
    pub fn simulate_day(&self, samples: &[WeatherSample]) -> Result<Vec<PowerSample>, SimulationError> {
        let subcategory = match self {
            GeneratorModel::Pv(_) => PowerCalcType::Pv,
            GeneratorModel::Wind(_) => PowerCalcType::Wind,
        };
        let _timing = logging::start_timing("simulate_day", OperationCategory::PowerCalculation { subcategory });

        samples.iter().map(|s| self.simulate(s)).collect()
    }
}

impl PowerModel for GeneratorModel {
    fn simulate(&self, sample: &WeatherSample) -> Result<PowerSample, SimulationError> {
        match self {
            GeneratorModel::Pv(m) => m.simulate(sample),
            GeneratorModel::Wind(m) => m.simulate(sample),
        }
    }
}
