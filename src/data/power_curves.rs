//! Turbine power curves grouped into rated-power bands.
//!
//! Each row of the curve table is one turbine model. Gaps between two valid
//! points of a row are closed by linear interpolation within that row. Gaps
//! before the first or after the last valid point are not extrapolated and
//! count as 0 W, so a row missing its 0 m/s value never reports power in calm
//! air. Lookups outside the wind speed axis are 0 W as well.

use std::collections::BTreeMap;
use std::fmt;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use csv::ReaderBuilder;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use crate::config::constants::POWER_BAND_BREAKPOINTS_KW;
use crate::config::scenario::Scenario;
use crate::core::error::SimulationError;
use crate::utils::logging::{self, OperationCategory, FileIOType};

const BUNDLED_POWER_CURVES: &str = include_str!("../../assets/power_curves.csv");

const BAND_LABELS: [&str; 9] = [
    "<1 MW",
    "1-2 MW",
    "2.0-2.3 MW",
    "2.3-2.6 MW",
    "2.6-3.0 MW",
    "3.0-3.3 MW",
    "3.3-3.7 MW",
    "3.7-5.2 MW",
    ">=5.2 MW",
];

/// Rated-power class of a wind turbine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PowerBand(usize);

impl PowerBand {
    pub fn from_rated_kw(rated_kw: f64) -> Self {
        PowerBand(POWER_BAND_BREAKPOINTS_KW.iter().filter(|&&b| rated_kw >= b).count())
    }

    pub fn from_rated_mw(rated_mw: f64) -> Self {
        Self::from_rated_kw(rated_mw * 1000.0)
    }

    pub fn all() -> impl Iterator<Item = PowerBand> {
        (0..BAND_LABELS.len()).map(PowerBand)
    }

    pub fn label(&self) -> &'static str {
        BAND_LABELS[self.0]
    }
}

impl fmt::Display for PowerBand {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

#[derive(Debug)]
pub enum CatalogError {
    IoError(std::io::Error),
    CsvError(csv::Error),
    InvalidHeader(String),
    InvalidTurbineType(String),
    Empty,
}

impl From<std::io::Error> for CatalogError {
    fn from(err: std::io::Error) -> Self {
        CatalogError::IoError(err)
    }
}

impl From<csv::Error> for CatalogError {
    fn from(err: csv::Error) -> Self {
        CatalogError::CsvError(err)
    }
}

impl fmt::Display for CatalogError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CatalogError::IoError(e) => write!(f, "IO error: {}", e),
            CatalogError::CsvError(e) => write!(f, "CSV error: {}", e),
            CatalogError::InvalidHeader(s) => write!(f, "Invalid power curve header: {}", s),
            CatalogError::InvalidTurbineType(s) => write!(f, "Invalid turbine type: {}", s),
            CatalogError::Empty => write!(f, "Power curve table contains no usable curves"),
        }
    }
}

impl std::error::Error for CatalogError {}

/// One turbine model's power curve as read from the table, in W.
#[derive(Debug, Clone)]
pub struct TurbineCurve {
    pub model: String,
    pub rated_power_kw: f64,
    pub values: Vec<Option<f64>>,
}

impl TurbineCurve {
    fn area(&self) -> f64 {
        self.values.iter().flatten().sum()
    }

    fn has_data(&self) -> bool {
        self.values.iter().any(Option::is_some)
    }
}

/// Representative curves of one power band.
#[derive(Debug, Clone)]
pub struct PowerCurveClass {
    pub band: PowerBand,
    pub members: usize,
    pub best_model: String,
    pub worst_model: String,
    pub best: Vec<f64>,
    pub normal: Vec<f64>,
    pub worst: Vec<f64>,
}

impl PowerCurveClass {
    pub fn curve(&self, scenario: Scenario) -> &[f64] {
        match scenario {
            Scenario::Best => &self.best,
            Scenario::Normal => &self.normal,
            Scenario::Worst => &self.worst,
        }
    }
}

#[derive(Debug, Clone)]
pub struct PowerCurveCatalog {
    wind_speed_axis: Vec<f64>,
    classes: BTreeMap<PowerBand, PowerCurveClass>,
}

impl PowerCurveCatalog {
    /// Catalog built from the reference dataset shipped with the crate.
    pub fn bundled() -> Result<Self, CatalogError> {
        Self::from_reader(BUNDLED_POWER_CURVES.as_bytes())
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, CatalogError> {
        let _timing = logging::start_timing("load_power_curves",
            OperationCategory::FileIO { subcategory: FileIOType::DataLoad });

        let mut file = File::open(path.as_ref())?;
        let mut contents = String::new();
        file.read_to_string(&mut contents)?;
        info!(path = %path.as_ref().display(), "Loading turbine power curves");
        Self::from_reader(contents.as_bytes())
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Self, CatalogError> {
        let mut reader = ReaderBuilder::new()
            .has_headers(true)
            .trim(csv::Trim::All)
            .flexible(true)
            .from_reader(reader);

        let headers = reader.headers()?.clone();
        let mut columns: Vec<(usize, f64)> = Vec::new();
        for (idx, name) in headers.iter().enumerate().skip(1) {
            let speed: f64 = name.parse()
                .map_err(|_| CatalogError::InvalidHeader(format!("'{}' is not a wind speed", name)))?;
            columns.push((idx, speed));
        }
        if columns.is_empty() {
            return Err(CatalogError::InvalidHeader("no wind speed columns".to_string()));
        }
        columns.sort_by(|a, b| a.1.total_cmp(&b.1));
        let axis: Vec<f64> = columns.iter().map(|(_, speed)| *speed).collect();

        let mut curves = Vec::new();
        for result in reader.records() {
            let record = result?;
            let turbine_type = record.get(0)
                .ok_or_else(|| CatalogError::InvalidTurbineType("Missing turbine type".to_string()))?;
            let (model, rated_power_kw) = parse_turbine_type(turbine_type)?;

            let values = columns.iter()
                .map(|(idx, _)| record.get(*idx).and_then(|v| v.parse::<f64>().ok()))
                .collect();

            curves.push(TurbineCurve { model, rated_power_kw, values });
        }

        Self::from_curves(axis, curves)
    }

    pub fn from_curves(wind_speed_axis: Vec<f64>, curves: Vec<TurbineCurve>) -> Result<Self, CatalogError> {
        let mut by_band: BTreeMap<PowerBand, Vec<TurbineCurve>> = BTreeMap::new();
        for mut curve in curves {
            curve.values.resize(wind_speed_axis.len(), None);
            fill_interior_gaps(&wind_speed_axis, &mut curve.values);
            if !curve.has_data() {
                debug!(model = %curve.model, "Dropping power curve without valid points");
                continue;
            }
            by_band.entry(PowerBand::from_rated_kw(curve.rated_power_kw))
                .or_default()
                .push(curve);
        }

        if by_band.is_empty() {
            return Err(CatalogError::Empty);
        }

        let classes: BTreeMap<PowerBand, PowerCurveClass> = by_band.into_iter()
            .map(|(band, members)| (band, build_class(band, &wind_speed_axis, &members)))
            .collect();

        info!(classes = classes.len(), axis_points = wind_speed_axis.len(), "Power curve catalog ready");
        Ok(Self { wind_speed_axis, classes })
    }

    pub fn class(&self, band: PowerBand) -> Option<&PowerCurveClass> {
        self.classes.get(&band)
    }

    /// Single-turbine power in W for a turbine of the given rated power.
    pub fn lookup(&self, turbine_rated_power_mw: f64, wind_speed: f64, scenario: Scenario) -> Result<f64, SimulationError> {
        let band = PowerBand::from_rated_mw(turbine_rated_power_mw);
        let class = self.classes.get(&band)
            .ok_or(SimulationError::UnknownTurbineClass(band))?;
        Ok(interpolate(&self.wind_speed_axis, class.curve(scenario), wind_speed))
    }
}

fn parse_turbine_type(turbine_type: &str) -> Result<(String, f64), CatalogError> {
    let (model, rated) = turbine_type.rsplit_once('/')
        .ok_or_else(|| CatalogError::InvalidTurbineType(turbine_type.to_string()))?;
    let rated_kw: f64 = rated.trim().parse()
        .map_err(|_| CatalogError::InvalidTurbineType(turbine_type.to_string()))?;
    Ok((model.trim().to_string(), rated_kw))
}

/// Closes gaps that have a valid neighbour on both sides. Edge gaps stay open.
fn fill_interior_gaps(axis: &[f64], values: &mut [Option<f64>]) {
    let valid: Vec<usize> = values.iter()
        .enumerate()
        .filter_map(|(i, v)| v.map(|_| i))
        .collect();

    for pair in valid.windows(2) {
        let (lo, hi) = (pair[0], pair[1]);
        if hi - lo < 2 {
            continue;
        }
        let (Some(p_lo), Some(p_hi)) = (values[lo], values[hi]) else { continue };
        for i in (lo + 1)..hi {
            let t = (axis[i] - axis[lo]) / (axis[hi] - axis[lo]);
            values[i] = Some(p_lo + t * (p_hi - p_lo));
        }
    }
}

fn build_class(band: PowerBand, axis: &[f64], members: &[TurbineCurve]) -> PowerCurveClass {
    let mut best = &members[0];
    let mut worst = &members[0];
    for member in &members[1..] {
        if member.area() > best.area() {
            best = member;
        }
        if member.area() < worst.area() {
            worst = member;
        }
    }

    let normal = (0..axis.len())
        .map(|i| {
            let points: Vec<f64> = members.iter().filter_map(|m| m.values[i]).collect();
            if points.is_empty() {
                0.0
            } else {
                points.iter().sum::<f64>() / points.len() as f64
            }
        })
        .collect();

    let dense = |c: &TurbineCurve| c.values.iter().map(|v| v.unwrap_or(0.0)).collect::<Vec<f64>>();

    debug!(band = %band, members = members.len(), best = %best.model, worst = %worst.model, "Built power curve class");

    PowerCurveClass {
        band,
        members: members.len(),
        best_model: best.model.clone(),
        worst_model: worst.model.clone(),
        best: dense(best),
        normal,
        worst: dense(worst),
    }
}

/// Linear interpolation over `axis`, zero outside of it.
pub fn interpolate(axis: &[f64], curve: &[f64], x: f64) -> f64 {
    let (Some(&first), Some(&last)) = (axis.first(), axis.last()) else { return 0.0 };
    if x.is_nan() || x < first || x > last {
        return 0.0;
    }

    let idx = axis.partition_point(|&a| a < x);
    if axis[idx] == x {
        return curve[idx];
    }
    let (x0, x1) = (axis[idx - 1], axis[idx]);
    let (y0, y1) = (curve[idx - 1], curve[idx]);
    y0 + (x - x0) / (x1 - x0) * (y1 - y0)
}
