use std::sync::Arc;
use crate::config::constants::{
    OPERATING_HOURS_END, OPERATING_HOURS_START, WATTS_PER_MEGAWATT, WIND_REFERENCE_HEIGHT_M,
};
use crate::config::scenario::{Scenario, ScenarioTables};
use crate::core::error::SimulationError;
use crate::data::poi::Coordinate;
use crate::data::power_curves::PowerCurveCatalog;
use crate::data::weather::{WeatherKind, WeatherSample};
use crate::models::asset::{turbine_count, WindParameters};
use crate::models::generator::{DataQuality, PowerSample};
use crate::models::solar_position::local_solar_hour;
use crate::utils::traits::PowerModel;

/// Wind park model: power-law shear to hub height, class curve lookup,
/// then wake and system losses across all turbines.
#[derive(Debug, Clone)]
pub struct WindModel {
    rated_power: f64,
    coordinate: Coordinate,
    params: WindParameters,
    scenario: Scenario,
    tables: ScenarioTables,
    catalog: Arc<PowerCurveCatalog>,
}

impl WindModel {
    pub fn new(
        rated_power: f64,
        coordinate: Coordinate,
        params: WindParameters,
        scenario: Scenario,
        tables: ScenarioTables,
        catalog: Arc<PowerCurveCatalog>,
    ) -> Self {
        Self { rated_power, coordinate, params, scenario, tables, catalog }
    }

    pub fn hub_wind_speed(&self, reference_speed: f64) -> f64 {
        let alpha = self.tables.shear_exponent(self.scenario);
        reference_speed.max(0.0) * (self.params.hub_height / WIND_REFERENCE_HEIGHT_M).powf(alpha)
    }

    pub fn turbines(&self) -> u32 {
        turbine_count(self.rated_power, self.params.turbine_rated_power)
    }
}

impl PowerModel for WindModel {
    fn simulate(&self, sample: &WeatherSample) -> Result<PowerSample, SimulationError> {
        let reference_speed = sample.wind_speed_m_s()
            .ok_or(SimulationError::MissingWeatherField {
                field: WeatherKind::Wind.field_name(),
                timestamp: sample.timestamp,
            })?;
        let hub_speed = self.hub_wind_speed(reference_speed);

        let quality = if hub_speed == 0.0 {
            let hour = local_solar_hour(&self.coordinate, sample.timestamp);
            (OPERATING_HOURS_START..=OPERATING_HOURS_END).contains(&hour).then_some(DataQuality::CalmWind)
        } else {
            None
        };

        let turbine_rated_w = self.params.turbine_rated_power * WATTS_PER_MEGAWATT;
        let single_w = self.catalog
            .lookup(self.params.turbine_rated_power, hub_speed, self.scenario)?
            .clamp(0.0, turbine_rated_w.max(0.0));

        let losses = (1.0 - self.tables.wake_loss(self.scenario)) * self.tables.wind_system_efficiency(self.scenario);
        let power_mw = single_w / WATTS_PER_MEGAWATT * self.turbines() as f64 * losses;

        Ok(PowerSample { timestamp: sample.timestamp, power_mw: power_mw.max(0.0), quality })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, TimeZone, Utc};
    use crate::data::power_curves::TurbineCurve;
    use crate::data::weather::MeasurementUnit;

    fn utc(h: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 15, h, 0, 0).single().expect("valid timestamp")
    }

    fn catalog() -> Arc<PowerCurveCatalog> {
        Arc::new(PowerCurveCatalog::bundled().expect("bundled table parses"))
    }

    fn kiel_park(scenario: Scenario, hub_height: f64) -> WindModel {
        WindModel::new(
            50.0,
            Coordinate::new(54.32, 10.14),
            WindParameters { hub_height, turbine_rated_power: 3.2 },
            scenario,
            ScenarioTables::default(),
            catalog(),
        )
    }

    fn wind(timestamp: DateTime<Utc>, speed: Option<f64>) -> WeatherSample {
        WeatherSample::new(timestamp, speed, MeasurementUnit::MetresPerSecond)
    }

    #[test]
    fn shear_raises_speed_at_hub() {
        let m = kiel_park(Scenario::Normal, 100.0);
        let expected = 5.0 * 10f64.powf(0.2);
        assert!((m.hub_wind_speed(5.0) - expected).abs() < 1e-12);
        assert_eq!(m.hub_wind_speed(-1.0), 0.0);
    }

    #[test]
    fn park_output_never_exceeds_installed_turbines() {
        for scenario in Scenario::ALL {
            let m = kiel_park(scenario, 100.0);
            let cap = m.turbines() as f64 * 3.2;
            for speed in [0.0, 2.0, 4.5, 8.0, 12.0, 15.0, 18.0] {
                let out = m.simulate(&wind(utc(12), Some(speed))).expect("valid sample");
                assert!(out.power_mw >= 0.0);
                assert!(out.power_mw <= cap, "{} at {} m/s -> {}", scenario, speed, out.power_mw);
            }
        }
    }

    #[test]
    fn storm_cutout_beyond_curve_axis_is_zero() {
        let out = kiel_park(Scenario::Best, 100.0).simulate(&wind(utc(12), Some(25.0))).expect("valid sample");
        assert_eq!(out.power_mw, 0.0);
        assert_eq!(out.quality, None);
    }

    #[test]
    fn calm_noon_is_flagged() {
        let out = kiel_park(Scenario::Normal, 100.0).simulate(&wind(utc(11), Some(0.0))).expect("valid sample");
        assert_eq!(out.power_mw, 0.0);
        assert_eq!(out.quality, Some(DataQuality::CalmWind));

        let night = kiel_park(Scenario::Normal, 100.0).simulate(&wind(utc(1), Some(0.0))).expect("valid sample");
        assert_eq!(night.quality, None);
    }

    #[test]
    fn missing_wind_speed_is_an_error() {
        let err = kiel_park(Scenario::Normal, 100.0).simulate(&wind(utc(12), None));
        assert!(matches!(err, Err(SimulationError::MissingWeatherField { field: "wind_speed", .. })));
    }

    #[test]
    fn scenario_losses_scale_park_output() {
        let curve = TurbineCurve {
            model: "Flat".to_string(),
            rated_power_kw: 2000.0,
            values: vec![Some(1_000_000.0), Some(1_000_000.0)],
        };
        let flat = Arc::new(PowerCurveCatalog::from_curves(vec![0.0, 30.0], vec![curve]).expect("one class"));
        let m = WindModel::new(
            10.0,
            Coordinate::new(54.32, 10.14),
            WindParameters { hub_height: 10.0, turbine_rated_power: 2.0 },
            Scenario::Worst,
            ScenarioTables::default(),
            flat,
        );
        let out = m.simulate(&wind(utc(12), Some(7.0))).expect("valid sample");
        // 5 turbines at 1 MW, 15% wake, 90% system efficiency
        assert!((out.power_mw - 5.0 * 0.85 * 0.90).abs() < 1e-9);
    }

    #[test]
    fn turbine_without_curve_class_fails() {
        let curve = TurbineCurve {
            model: "Small".to_string(),
            rated_power_kw: 800.0,
            values: vec![Some(0.0), Some(800_000.0)],
        };
        let only_small = Arc::new(PowerCurveCatalog::from_curves(vec![0.0, 25.0], vec![curve]).expect("one class"));
        let m = WindModel::new(
            50.0,
            Coordinate::new(54.32, 10.14),
            WindParameters { hub_height: 100.0, turbine_rated_power: 3.2 },
            Scenario::Normal,
            ScenarioTables::default(),
            only_small,
        );
        let err = m.simulate(&wind(utc(12), Some(8.0)));
        assert!(matches!(err, Err(SimulationError::UnknownTurbineClass(_))));
    }
}
