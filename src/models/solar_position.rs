//! Sun position and extraterrestrial irradiance.
//!
//! Declination and equation of time follow Spencer (1971); the hour angle is
//! taken from true solar time so no time-zone table is needed.

use std::f64::consts::PI;
use chrono::{DateTime, Datelike, Timelike, Utc};
use crate::config::constants::SOLAR_CONSTANT;
use crate::data::poi::Coordinate;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SolarPosition {
    pub zenith_deg: f64,
    /// Clockwise from north.
    pub azimuth_deg: f64,
}

impl SolarPosition {
    pub fn is_above_horizon(&self) -> bool {
        self.zenith_deg < 90.0
    }
}

fn fractional_year(timestamp: DateTime<Utc>) -> f64 {
    let hour = decimal_hour(timestamp);
    2.0 * PI / 365.0 * (timestamp.ordinal() as f64 - 1.0 + (hour - 12.0) / 24.0)
}

fn decimal_hour(timestamp: DateTime<Utc>) -> f64 {
    timestamp.hour() as f64 + timestamp.minute() as f64 / 60.0 + timestamp.second() as f64 / 3600.0
}

fn declination_rad(gamma: f64) -> f64 {
    0.006918 - 0.399912 * gamma.cos() + 0.070257 * gamma.sin()
        - 0.006758 * (2.0 * gamma).cos() + 0.000907 * (2.0 * gamma).sin()
        - 0.002697 * (3.0 * gamma).cos() + 0.00148 * (3.0 * gamma).sin()
}

fn equation_of_time_min(gamma: f64) -> f64 {
    229.18 * (0.000075 + 0.001868 * gamma.cos() - 0.032077 * gamma.sin()
        - 0.014615 * (2.0 * gamma).cos() - 0.040849 * (2.0 * gamma).sin())
}

/// True solar time at the coordinate, in hours (0..24).
pub fn local_solar_hour(coordinate: &Coordinate, timestamp: DateTime<Utc>) -> f64 {
    let gamma = fractional_year(timestamp);
    let minutes = decimal_hour(timestamp) * 60.0
        + equation_of_time_min(gamma)
        + 4.0 * coordinate.longitude;
    (minutes / 60.0).rem_euclid(24.0)
}

pub fn solar_position(coordinate: &Coordinate, timestamp: DateTime<Utc>) -> SolarPosition {
    let gamma = fractional_year(timestamp);
    let decl = declination_rad(gamma);
    let lat = coordinate.latitude.to_radians();

    let hour_angle_deg = local_solar_hour(coordinate, timestamp) * 15.0 - 180.0;
    let hour_angle = hour_angle_deg.to_radians();

    let cos_zenith = (lat.sin() * decl.sin() + lat.cos() * decl.cos() * hour_angle.cos()).clamp(-1.0, 1.0);
    let zenith = cos_zenith.acos();

    let denom = lat.cos() * zenith.sin();
    let azimuth_deg = if denom.abs() < 1e-9 {
        180.0
    } else {
        let cos_az = ((lat.sin() * cos_zenith - decl.sin()) / denom).clamp(-1.0, 1.0);
        let az = cos_az.acos().to_degrees();
        if hour_angle_deg > 0.0 {
            (az + 180.0).rem_euclid(360.0)
        } else {
            (540.0 - az).rem_euclid(360.0)
        }
    };

    SolarPosition {
        zenith_deg: zenith.to_degrees(),
        azimuth_deg,
    }
}

/// Extraterrestrial normal irradiance corrected for the Earth-Sun distance (W/m²).
pub fn extraterrestrial_irradiance(day_of_year: u32) -> f64 {
    let b = 2.0 * PI * (day_of_year as f64 - 1.0) / 365.0;
    SOLAR_CONSTANT * (1.000110
        + 0.034221 * b.cos()
        + 0.001280 * b.sin()
        + 0.000719 * (2.0 * b).cos()
        + 0.000077 * (2.0 * b).sin())
}

/// Cosine of the angle of incidence between the sun and a tilted surface.
pub fn cos_angle_of_incidence(sun: &SolarPosition, tilt_deg: f64, surface_azimuth_deg: f64) -> f64 {
    let z = sun.zenith_deg.to_radians();
    let tilt = tilt_deg.to_radians();
    let az_diff = (sun.azimuth_deg - surface_azimuth_deg).to_radians();
    (z.cos() * tilt.cos() + z.sin() * tilt.sin() * az_diff.cos()).clamp(-1.0, 1.0)
}
