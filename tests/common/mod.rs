//! Shared fixtures for integration tests.

use std::path::PathBuf;
use std::sync::Arc;

use fleetgen::config::simulation_config::{FailurePolicy, SimulationConfig};
use fleetgen::core::location::LocationResolver;
use fleetgen::core::scheduler::Scheduler;
use fleetgen::data::geocoder::Gazetteer;
use fleetgen::data::power_curves::PowerCurveCatalog;
use fleetgen::data::synthetic_weather::SyntheticWeatherProvider;
use fleetgen::models::asset::{Asset, PvLosses, PvParameters, SiteRef, WindParameters};

/// 100 MW PV park in Berlin, 30° south facing.
pub fn berlin_pv() -> Asset {
    Asset::new_pv(
        "PV_Berlin",
        100.0,
        SiteRef::Name("Berlin".to_string()),
        PvParameters { tilt: 30.0, azimuth: 180.0, albedo: 0.2, losses: PvLosses::default() },
    )
}

/// 50 MW wind park in Kiel with 3.2 MW turbines at 100 m.
pub fn kiel_wind() -> Asset {
    Asset::new_wind(
        "Wind_Kiel",
        50.0,
        SiteRef::Name("Kiel".to_string()),
        WindParameters { hub_height: 100.0, turbine_rated_power: 3.2 },
    )
}

pub fn reference_fleet() -> Vec<Asset> {
    vec![berlin_pv(), kiel_wind()]
}

/// Offline settings: synthetic hourly weather, two workers, abort on failure.
pub fn offline_config() -> SimulationConfig {
    SimulationConfig {
        workers: Some(2),
        failure_policy: FailurePolicy::Abort,
        offline: true,
        seed: 42,
        ..SimulationConfig::default()
    }
}

pub fn catalog() -> Arc<PowerCurveCatalog> {
    Arc::new(PowerCurveCatalog::bundled().expect("bundled power curves parse"))
}

/// Scheduler on the built-in gazetteer and seeded synthetic weather.
pub fn synthetic_scheduler(config: SimulationConfig) -> Scheduler {
    let weather = Arc::new(SyntheticWeatherProvider::new(config.seed, config.sample_interval_minutes));
    Scheduler::new(
        config,
        LocationResolver::new(Box::new(Gazetteer::builtin())),
        weather,
        catalog(),
    )
}

/// Fresh, empty directory under the system temp dir.
pub fn temp_dir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("fleetgen_it_{}_{}", name, std::process::id()));
    let _ = std::fs::remove_dir_all(&dir);
    std::fs::create_dir_all(&dir).expect("temp dir");
    dir
}
