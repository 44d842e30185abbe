use chrono::Datelike;
use crate::config::constants::{
    MAX_DNI_ZENITH_DEG, MIN_COS_ZENITH, OPERATING_HOURS_END, OPERATING_HOURS_START, STC_IRRADIANCE,
};
use crate::config::scenario::{Scenario, ScenarioTables};
use crate::core::error::SimulationError;
use crate::data::poi::Coordinate;
use crate::data::weather::{WeatherKind, WeatherSample};
use crate::models::asset::PvParameters;
use crate::models::generator::{DataQuality, PowerSample};
use crate::models::solar_position::{
    cos_angle_of_incidence, extraterrestrial_irradiance, local_solar_hour, solar_position, SolarPosition,
};
use crate::utils::traits::PowerModel;

#[derive(Debug, Clone)]
pub struct PvModel {
    rated_power: f64,
    coordinate: Coordinate,
    params: PvParameters,
    scenario: Scenario,
    tables: ScenarioTables,
}

impl PvModel {
    pub fn new(rated_power: f64, coordinate: Coordinate, params: PvParameters, scenario: Scenario, tables: ScenarioTables) -> Self {
        Self { rated_power, coordinate, params, scenario, tables }
    }

    /// Plane-of-array irradiance (W/m²) for a horizontal reading.
    pub fn plane_of_array(&self, ghi: f64, sun: &SolarPosition, day_of_year: u32) -> f64 {
        let (dni, dhi) = decompose_erbs(ghi, sun.zenith_deg, day_of_year);
        transpose_isotropic(dni, dhi, ghi, sun, self.params.tilt, self.params.azimuth, self.params.albedo)
    }
}

impl PowerModel for PvModel {
    fn simulate(&self, sample: &WeatherSample) -> Result<PowerSample, SimulationError> {
        let ghi = sample.irradiance_w_m2()
            .ok_or(SimulationError::MissingWeatherField {
                field: WeatherKind::Pv.field_name(),
                timestamp: sample.timestamp,
            })?
            .max(0.0);

        let quality = if ghi == 0.0 {
            let hour = local_solar_hour(&self.coordinate, sample.timestamp);
            (OPERATING_HOURS_START..=OPERATING_HOURS_END).contains(&hour).then_some(DataQuality::DarkNoon)
        } else {
            None
        };

        let sun = solar_position(&self.coordinate, sample.timestamp);
        let poa = self.plane_of_array(ghi, &sun, sample.timestamp.ordinal());
        let pr = self.tables.pv_performance_ratio(self.scenario, sample.timestamp.month());

        // No upper clamp to rating: PR stays below one across all tables.
        let power_mw = (self.rated_power * (poa / STC_IRRADIANCE) * pr * self.params.losses.factor()).max(0.0);

        Ok(PowerSample { timestamp: sample.timestamp, power_mw, quality })
    }
}

/// Erbs split of GHI into (DNI, DHI).
pub fn decompose_erbs(ghi: f64, zenith_deg: f64, day_of_year: u32) -> (f64, f64) {
    if ghi <= 0.0 {
        return (0.0, 0.0);
    }

    let cos_zenith = zenith_deg.to_radians().cos();
    let kt = (ghi / (extraterrestrial_irradiance(day_of_year) * cos_zenith.max(MIN_COS_ZENITH))).clamp(0.0, 1.0);

    let diffuse_fraction = if kt <= 0.22 {
        1.0 - 0.09 * kt
    } else if kt <= 0.80 {
        0.9511 - 0.1604 * kt + 4.388 * kt.powi(2) - 16.638 * kt.powi(3) + 12.336 * kt.powi(4)
    } else {
        0.165
    };

    let dhi = diffuse_fraction * ghi;
    let dni = if zenith_deg <= MAX_DNI_ZENITH_DEG && cos_zenith > 0.0 {
        ((ghi - dhi) / cos_zenith).max(0.0)
    } else {
        0.0
    };
    (dni, dhi)
}

/// Isotropic-sky irradiance on a tilted plane.
pub fn transpose_isotropic(
    dni: f64,
    dhi: f64,
    ghi: f64,
    sun: &SolarPosition,
    tilt_deg: f64,
    surface_azimuth_deg: f64,
    albedo: f64,
) -> f64 {
    let cos_tilt = tilt_deg.to_radians().cos();
    let beam = if sun.is_above_horizon() {
        dni * cos_angle_of_incidence(sun, tilt_deg, surface_azimuth_deg).max(0.0)
    } else {
        0.0
    };
    let sky_diffuse = dhi * (1.0 + cos_tilt) / 2.0;
    let ground_reflected = ghi * albedo * (1.0 - cos_tilt) / 2.0;
    (beam + sky_diffuse + ground_reflected).max(0.0)
}
