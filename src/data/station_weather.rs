//! Ten-minute DWD station observations read through a local cache of monthly
//! text files (`<station>_<kind>_<yyyy>_<mm>.txt`, `;`-separated, `-999` for
//! missing values).
//!
//! DWD itself publishes these observations as ZIP archives, which this crate
//! does not unpack. Cache files are placed in the cache directory ahead of a
//! run. A download is only attempted when a base URL is configured, and it
//! expects a mirror that serves the monthly text files as
//! `<base>/<solar|wind>/<file name>`.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use chrono::{Datelike, NaiveDate, NaiveDateTime};
use csv::ReaderBuilder;
use lazy_static::lazy_static;
use parking_lot::{Mutex, RwLock};
use tracing::{debug, info};
use crate::config::constants::{
    GEOCODER_USER_AGENT, STATION_MISSING_VALUE, STATION_SAMPLE_INTERVAL_MINUTES,
};
use crate::data::poi::Site;
use crate::data::weather::{MeasurementUnit, WeatherError, WeatherKind, WeatherProvider, WeatherSample};
use crate::utils::logging::{self, FileIOType, OperationCategory, WeatherSourceType};

const TIMESTAMP_COLUMN: &str = "MESS_DATUM";
const STATION_TIMESTAMP_FORMAT: &str = "%Y%m%d%H%M";
const DOWNLOAD_TIMEOUT_SECS: u64 = 60;

lazy_static! {
    // Site name (lowercase) to DWD station id
    static ref BUILTIN_STATIONS: HashMap<&'static str, &'static str> = {
        let mut m = HashMap::new();
        m.insert("berlin", "00433");
        m.insert("hamburg", "01975");
        m.insert("münchen", "03379");
        m.insert("munich", "03379");
        m.insert("köln", "02667");
        m.insert("frankfurt am main", "01420");
        m.insert("stuttgart", "04931");
        m.insert("düsseldorf", "01078");
        m.insert("leipzig", "02932");
        m.insert("dresden", "01048");
        m.insert("hannover", "02014");
        m.insert("bremen", "00691");
        m.insert("kiel", "02564");
        m.insert("rostock", "04271");
        m.insert("emden", "05839");
        m.insert("cuxhaven", "00891");
        m.insert("magdeburg", "03126");
        m.insert("freiburg im breisgau", "01443");
        m
    };
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct MonthKey {
    station: String,
    kind: WeatherKind,
    year: i32,
    month: u32,
}

impl MonthKey {
    fn file_name(&self) -> String {
        format!("{}_{}_{:04}_{:02}.txt", self.station, self.kind, self.year, self.month)
    }
}

fn kind_directory(kind: WeatherKind) -> &'static str {
    match kind {
        WeatherKind::Pv => "solar",
        WeatherKind::Wind => "wind",
    }
}

fn value_column(kind: WeatherKind) -> &'static str {
    match kind {
        WeatherKind::Pv => "GS_10",
        WeatherKind::Wind => "FF_10",
    }
}

fn unit_for(kind: WeatherKind) -> MeasurementUnit {
    match kind {
        WeatherKind::Pv => MeasurementUnit::JoulesPerSquareCentimetre { interval_minutes: STATION_SAMPLE_INTERVAL_MINUTES },
        WeatherKind::Wind => MeasurementUnit::MetresPerSecond,
    }
}

/// Ten-minute station observations in the DWD text format, read through an
/// on-disk cache of monthly files.
pub struct StationArchiveProvider {
    cache_dir: PathBuf,
    base_url: Option<String>,
    offline: bool,
    stations: HashMap<String, String>,
    months: RwLock<HashMap<MonthKey, Arc<Vec<WeatherSample>>>>,
    // One lock per month so a cold month is loaded by a single worker
    loading: Mutex<HashMap<MonthKey, Arc<Mutex<()>>>>,
}

impl StationArchiveProvider {
    pub fn new(cache_dir: impl Into<PathBuf>) -> Self {
        let stations = BUILTIN_STATIONS.iter()
            .map(|(site, station)| (site.to_string(), station.to_string()))
            .collect();
        Self {
            cache_dir: cache_dir.into(),
            base_url: None,
            offline: false,
            stations,
            months: RwLock::new(HashMap::new()),
            loading: Mutex::new(HashMap::new()),
        }
    }

    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = Some(base_url.trim_end_matches('/').to_string());
        self
    }

    /// Never download; only cached files are served.
    pub fn offline(mut self, offline: bool) -> Self {
        self.offline = offline;
        self
    }

    pub fn with_station(mut self, site_name: &str, station_id: &str) -> Self {
        self.stations.insert(site_name.trim().to_lowercase(), station_id.to_string());
        self
    }

    pub fn station_for(&self, site: &Site) -> Option<&str> {
        self.stations.get(&site.name.trim().to_lowercase()).map(String::as_str)
    }

    pub fn cache_path(&self, station: &str, kind: WeatherKind, year: i32, month: u32) -> PathBuf {
        let key = MonthKey { station: station.to_string(), kind, year, month };
        self.cache_dir.join(key.file_name())
    }

    fn cached_month(&self, key: &MonthKey) -> Option<Arc<Vec<WeatherSample>>> {
        self.months.read().get(key).map(Arc::clone)
    }

    fn month(&self, key: MonthKey) -> Result<Arc<Vec<WeatherSample>>, WeatherError> {
        if let Some(samples) = self.cached_month(&key) {
            return Ok(samples);
        }

        let gate = Arc::clone(self.loading.lock().entry(key.clone()).or_default());
        let _loading = gate.lock();
        if let Some(samples) = self.cached_month(&key) {
            return Ok(samples);
        }

        let path = self.cache_dir.join(key.file_name());
        if !path.exists() {
            let base_url = match &self.base_url {
                Some(base_url) if !self.offline => base_url,
                _ => {
                    return Err(WeatherError::NoDataForSite(format!(
                        "station {} has no cached {} data for {:04}-{:02}",
                        key.station, key.kind, key.year, key.month
                    )))
                }
            };
            self.download(base_url, &key, &path)?;
        }

        let samples = {
            let _timing = logging::start_timing("read_station_month",
                OperationCategory::FileIO { subcategory: FileIOType::CacheRead });
            Arc::new(parse_station_file(&path, key.kind)?)
        };
        debug!(station = %key.station, kind = %key.kind, samples = samples.len(), "Parsed station month");

        self.months.write().insert(key, Arc::clone(&samples));
        Ok(samples)
    }

    /// Fetches a month into the cache. The body lands in a `.part` file that is
    /// renamed into place, so readers never see a partial file.
    fn download(&self, base_url: &str, key: &MonthKey, path: &Path) -> Result<(), WeatherError> {
        let _timing = logging::start_timing("download_station_month",
            OperationCategory::FileIO { subcategory: FileIOType::CacheWrite });

        let url = format!("{}/{}/{}", base_url, kind_directory(key.kind), key.file_name());
        info!(url = %url, "Downloading station data");

        let body = reqwest::blocking::Client::builder()
            .user_agent(GEOCODER_USER_AGENT)
            .timeout(Duration::from_secs(DOWNLOAD_TIMEOUT_SECS))
            .build()?
            .get(&url)
            .send()?
            .error_for_status()?
            .text()?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let partial = path.with_file_name(format!("{}.{}.part", key.file_name(), std::process::id()));
        fs::write(&partial, body)?;
        if let Err(e) = fs::rename(&partial, path) {
            let _ = fs::remove_file(&partial);
            return Err(e.into());
        }
        Ok(())
    }
}

impl WeatherProvider for StationArchiveProvider {
    fn fetch(&self, site: &Site, day: NaiveDate, kind: WeatherKind) -> Result<Vec<WeatherSample>, WeatherError> {
        let _timing = logging::start_timing("station_fetch",
            OperationCategory::Weather { subcategory: WeatherSourceType::Station });

        let station = self.station_for(site)
            .ok_or_else(|| WeatherError::NoDataForSite(site.name.clone()))?;
        let key = MonthKey { station: station.to_string(), kind, year: day.year(), month: day.month() };
        let month = self.month(key)?;

        let samples: Vec<WeatherSample> = month.iter()
            .filter(|s| s.timestamp.date_naive() == day)
            .copied()
            .collect();
        if samples.is_empty() {
            return Err(WeatherError::NoDataForDate { site: site.name.clone(), day });
        }
        Ok(samples)
    }

    fn name(&self) -> &str {
        "station"
    }
}

/// Parses one monthly file; rows come back sorted by timestamp.
pub fn parse_station_file(path: &Path, kind: WeatherKind) -> Result<Vec<WeatherSample>, WeatherError> {
    let contents = fs::read_to_string(path)?;
    parse_station_text(&contents, kind)
}

pub fn parse_station_text(contents: &str, kind: WeatherKind) -> Result<Vec<WeatherSample>, WeatherError> {
    let mut reader = ReaderBuilder::new()
        .delimiter(b';')
        .has_headers(true)
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(contents.as_bytes());

    let headers = reader.headers()?.clone();
    let column = |name: &str| {
        headers.iter()
            .position(|h| h == name)
            .ok_or_else(|| WeatherError::ParseError(format!("missing column {}", name)))
    };
    let time_idx = column(TIMESTAMP_COLUMN)?;
    let value_idx = column(value_column(kind))?;
    let unit = unit_for(kind);

    let mut samples = Vec::new();
    for result in reader.records() {
        let record = result?;
        let raw_time = record.get(time_idx).unwrap_or_default();
        if raw_time.is_empty() {
            continue;
        }
        let timestamp = NaiveDateTime::parse_from_str(raw_time, STATION_TIMESTAMP_FORMAT)
            .map_err(|e| WeatherError::ParseError(format!("bad timestamp '{}': {}", raw_time, e)))?
            .and_utc();
        let measurement = record.get(value_idx)
            .and_then(|v| v.parse::<f64>().ok())
            .filter(|v| *v != STATION_MISSING_VALUE);
        samples.push(WeatherSample::new(timestamp, measurement, unit));
    }

    samples.sort_by_key(|s| s.timestamp);
    Ok(samples)
}
