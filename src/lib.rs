// Main module declarations for the fleet generation simulator

// Core simulation modules
pub mod core {
    pub mod error;
    pub mod location;
    pub mod scheduler;
    pub mod densify;
    pub mod aggregator;
}

// Configuration modules
pub mod config {
    pub mod constants;
    pub mod scenario;
    pub mod simulation_config;
}

// Model definitions
pub mod models {
    pub mod asset;
    pub mod generator;
    pub mod pv;
    pub mod wind;
    pub mod solar_position;
}

// Data loaders and providers
pub mod data {
    pub mod poi;
    pub mod fleet_loader;
    pub mod power_curves;
    pub mod geocoder;
    pub mod weather;
    pub mod station_weather;
    pub mod synthetic_weather;
}

// Analysis of aggregated results
pub mod analysis {
    pub mod reference_days;
}

// Utility functions
pub mod utils {
    pub mod logging;
    pub mod csv_export;
    pub mod events;
    pub mod traits;
}

// CLI interface
pub mod cli {
    pub mod cli;
}

// Re-export commonly used modules
pub use crate::config::scenario::Scenario;
pub use crate::core::aggregator::AggregatedResult;
pub use crate::core::scheduler::{SimulationRequest, SimulationOutcome, Scheduler};
pub use crate::models::asset::{Asset, AssetKind};
pub use crate::data::power_curves::PowerCurveCatalog;
