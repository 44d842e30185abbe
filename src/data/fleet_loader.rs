use std::collections::HashSet;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use serde::{Deserialize, Serialize};
use tracing::info;
use crate::config::constants::{POWER_SUM_COLUMN, TIMESTAMP_COLUMN};
use crate::config::simulation_config::SimulationConfig;
use crate::models::asset::{Asset, AssetKind};
use crate::utils::logging::{self, FileIOType, OperationCategory};

#[derive(Debug)]
pub enum FleetLoadError {
    IoError(std::io::Error),
    JsonError(serde_json::Error),
    InvalidAsset(String),
    DuplicateAsset(String),
    EmptyFleet,
}

impl From<std::io::Error> for FleetLoadError {
    fn from(err: std::io::Error) -> Self {
        FleetLoadError::IoError(err)
    }
}

impl From<serde_json::Error> for FleetLoadError {
    fn from(err: serde_json::Error) -> Self {
        FleetLoadError::JsonError(err)
    }
}

impl std::fmt::Display for FleetLoadError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FleetLoadError::IoError(e) => write!(f, "IO error: {}", e),
            FleetLoadError::JsonError(e) => write!(f, "JSON error: {}", e),
            FleetLoadError::InvalidAsset(s) => write!(f, "Invalid asset: {}", s),
            FleetLoadError::DuplicateAsset(s) => write!(f, "Duplicate asset name: {}", s),
            FleetLoadError::EmptyFleet => write!(f, "Fleet contains no assets"),
        }
    }
}

impl std::error::Error for FleetLoadError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            FleetLoadError::IoError(e) => Some(e),
            FleetLoadError::JsonError(e) => Some(e),
            _ => None,
        }
    }
}

/// Fleet configuration document: the assets in output column order, plus
/// optional run settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FleetDocument {
    pub assets: Vec<Asset>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub config: Option<SimulationConfig>,
}

pub fn load_fleet(path: impl AsRef<Path>) -> Result<FleetDocument, FleetLoadError> {
    let _timing = logging::start_timing("load_fleet",
        OperationCategory::FileIO { subcategory: FileIOType::DataLoad });

    let mut file = File::open(path.as_ref())?;
    let mut contents = String::new();
    file.read_to_string(&mut contents)?;
    let fleet = parse_fleet(&contents)?;
    info!(path = %path.as_ref().display(), assets = fleet.assets.len(), "Loaded fleet");
    Ok(fleet)
}

pub fn parse_fleet(json: &str) -> Result<FleetDocument, FleetLoadError> {
    let fleet: FleetDocument = serde_json::from_str(json)?;
    validate_assets(&fleet.assets)?;
    Ok(fleet)
}

fn in_unit_range(value: f64) -> bool {
    (0.0..=1.0).contains(&value)
}

fn positive(value: f64) -> bool {
    value.is_finite() && value > 0.0
}

pub fn validate_assets(assets: &[Asset]) -> Result<(), FleetLoadError> {
    if assets.is_empty() {
        return Err(FleetLoadError::EmptyFleet);
    }

    let mut names = HashSet::new();
    for asset in assets {
        let name = asset.name.trim();
        if name.is_empty() {
            return Err(FleetLoadError::InvalidAsset("asset without a name".to_string()));
        }
        // Output tables use these as their own column names
        if [TIMESTAMP_COLUMN, POWER_SUM_COLUMN].iter().any(|r| name.eq_ignore_ascii_case(r)) {
            return Err(FleetLoadError::InvalidAsset(format!("{}: reserved column name", name)));
        }
        if !names.insert(name.to_string()) {
            return Err(FleetLoadError::DuplicateAsset(name.to_string()));
        }
        if !positive(asset.rated_power) {
            return Err(FleetLoadError::InvalidAsset(format!("{}: rated_power must be positive", name)));
        }
        if asset.site.key().is_empty() {
            return Err(FleetLoadError::InvalidAsset(format!("{}: empty site", name)));
        }

        match &asset.kind {
            AssetKind::Pv(pv) => {
                if !(0.0..=90.0).contains(&pv.tilt) {
                    return Err(FleetLoadError::InvalidAsset(format!("{}: tilt must be within 0..90", name)));
                }
                if !in_unit_range(pv.albedo) {
                    return Err(FleetLoadError::InvalidAsset(format!("{}: albedo must be within 0..1", name)));
                }
                let l = &pv.losses;
                if !in_unit_range(l.shading) || !in_unit_range(l.soiling) || l.age_years < 0.0 || l.degradation_rate < 0.0 {
                    return Err(FleetLoadError::InvalidAsset(format!("{}: loss parameters out of range", name)));
                }
            }
            AssetKind::Wind(wind) => {
                if !positive(wind.hub_height) {
                    return Err(FleetLoadError::InvalidAsset(format!("{}: hub_height must be positive", name)));
                }
                if !positive(wind.turbine_rated_power) {
                    return Err(FleetLoadError::InvalidAsset(format!("{}: turbine_rated_power must be positive", name)));
                }
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::simulation_config::FailurePolicy;

    const FLEET: &str = r#"{
        "assets": [
            {"name": "PV_Berlin", "kind": "pv", "rated_power": 100, "site": "Berlin", "tilt": 30, "azimuth": 180},
            {"name": "Wind_Kiel", "kind": "wind", "rated_power": 50, "site": "Kiel",
             "hub_height": 100, "turbine_rated_power": 3.2}
        ],
        "config": {"failure_policy": "skip_task", "densify": true}
    }"#;

    #[test]
    fn parses_fleet_in_document_order() {
        let fleet = parse_fleet(FLEET).expect("valid fleet");
        let names: Vec<&str> = fleet.assets.iter().map(|a| a.name.as_str()).collect();
        assert_eq!(names, vec!["PV_Berlin", "Wind_Kiel"]);
        let config = fleet.config.expect("config present");
        assert_eq!(config.failure_policy, FailurePolicy::SkipTask);
        assert!(config.densify);
    }

    #[test]
    fn config_section_is_optional() {
        let fleet = parse_fleet(r#"{"assets":[{"name":"A","kind":"pv","rated_power":1,"site":"Berlin","tilt":20}]}"#)
            .expect("valid fleet");
        assert!(fleet.config.is_none());
    }

    #[test]
    fn duplicate_names_are_rejected() {
        let json = r#"{"assets":[
            {"name":"A","kind":"pv","rated_power":1,"site":"Berlin","tilt":20},
            {"name":"A","kind":"pv","rated_power":2,"site":"Kiel","tilt":20}
        ]}"#;
        assert!(matches!(parse_fleet(json), Err(FleetLoadError::DuplicateAsset(n)) if n == "A"));
    }

    #[test]
    fn reserved_column_names_are_rejected() {
        for name in ["timestamp", "power_sum", "Power_Sum"] {
            let json = format!(
                r#"{{"assets":[{{"name":"{}","kind":"pv","rated_power":1,"site":"Berlin","tilt":20}}]}}"#,
                name
            );
            assert!(matches!(parse_fleet(&json), Err(FleetLoadError::InvalidAsset(_))), "{}", name);
        }
    }

    #[test]
    fn invalid_parameters_are_rejected() {
        let json = r#"{"assets":[{"name":"W","kind":"wind","rated_power":10,"site":"Kiel","hub_height":0,"turbine_rated_power":2}]}"#;
        assert!(matches!(parse_fleet(json), Err(FleetLoadError::InvalidAsset(_))));
        let json = r#"{"assets":[{"name":"P","kind":"pv","rated_power":-1,"site":"Kiel","tilt":20}]}"#;
        assert!(matches!(parse_fleet(json), Err(FleetLoadError::InvalidAsset(_))));
    }

    #[test]
    fn empty_and_malformed_documents_fail() {
        assert!(matches!(parse_fleet(r#"{"assets":[]}"#), Err(FleetLoadError::EmptyFleet)));
        assert!(matches!(parse_fleet(r#"{"assets":[{"name":"X","kind":"hydro"}]}"#), Err(FleetLoadError::JsonError(_))));
    }
}
