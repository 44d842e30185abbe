// Capability shared by every generator model

use crate::core::error::SimulationError;
use crate::data::weather::WeatherSample;
use crate::models::generator::PowerSample;

pub trait PowerModel {
    /// Instantaneous power (MW) for one weather observation.
    fn simulate(&self, sample: &WeatherSample) -> Result<PowerSample, SimulationError>;
}
