use std::fs;
use std::path::{Path, PathBuf};
use csv::Writer;
use tracing::info;
use crate::analysis::reference_days::{EnergySummary, ReferenceDay};
use crate::config::constants::{POWER_SUM_COLUMN, TIMESTAMP_COLUMN, TIMESTAMP_FORMAT};
use crate::config::scenario::Scenario;
use crate::core::aggregator::AggregatedResult;
use crate::utils::events::{Diagnostic, DiagnosticKind};
use crate::utils::logging::{self, FileIOType, OperationCategory};

#[derive(Debug)]
pub enum ExportError {
    IoError(std::io::Error),
    CsvError(csv::Error),
}

impl From<std::io::Error> for ExportError {
    fn from(err: std::io::Error) -> Self {
        ExportError::IoError(err)
    }
}

impl From<csv::Error> for ExportError {
    fn from(err: csv::Error) -> Self {
        ExportError::CsvError(err)
    }
}

impl std::fmt::Display for ExportError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExportError::IoError(e) => write!(f, "IO error: {}", e),
            ExportError::CsvError(e) => write!(f, "CSV error: {}", e),
        }
    }
}

impl std::error::Error for ExportError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ExportError::IoError(e) => Some(e),
            ExportError::CsvError(e) => Some(e),
        }
    }
}

/// Writes the artifacts of one simulated month into `<output>/<MM>_<YYYY>/`.
pub struct CsvExporter {
    output_dir: PathBuf,
    period: String,
}

impl CsvExporter {
    pub fn new(output_dir: impl AsRef<Path>, year: i32, month: u32) -> Result<Self, ExportError> {
        let period = format!("{:02}_{:04}", month, year);
        let full_path = output_dir.as_ref().join(&period);
        fs::create_dir_all(&full_path)?;
        Ok(Self { output_dir: full_path, period })
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// `time_series_<scenario>_<MM>_<YYYY>[_<suffix>].csv`
    pub fn time_series_path(&self, scenario: Scenario, suffix: Option<&str>) -> PathBuf {
        let name = match suffix {
            Some(s) => format!("time_series_{}_{}_{}.csv", scenario, self.period, s),
            None => format!("time_series_{}_{}.csv", scenario, self.period),
        };
        self.output_dir.join(name)
    }

    pub fn export_time_series(&self, scenario: Scenario, table: &AggregatedResult) -> Result<PathBuf, ExportError> {
        let path = self.time_series_path(scenario, None);
        write_table(&path, table)?;
        info!(path = %path.display(), rows = table.len(), "Exported time series");
        Ok(path)
    }

    /// One file per reference day, each holding that day's rows.
    pub fn export_reference_days(
        &self,
        scenario: Scenario,
        table: &AggregatedResult,
        days: &[ReferenceDay],
    ) -> Result<Vec<PathBuf>, ExportError> {
        let mut paths = Vec::with_capacity(days.len());
        for day in days {
            let path = self.time_series_path(scenario, Some(day.kind.suffix()));
            write_table(&path, &table.slice_day(day.day))?;
            paths.push(path);
        }
        Ok(paths)
    }

    pub fn export_diagnostics(&self, scenario: Scenario, diagnostics: &[Diagnostic]) -> Result<PathBuf, ExportError> {
        let _timing = logging::start_timing("export_diagnostics",
            OperationCategory::FileIO { subcategory: FileIOType::ResultsSave });

        let path = self.output_dir.join(format!("diagnostics_{}_{}.csv", scenario, self.period));
        let mut writer = Writer::from_path(&path)?;
        writer.write_record(["asset", "day", "timestamp", "kind", "detail"])?;
        for d in diagnostics {
            let (kind, detail) = match &d.kind {
                DiagnosticKind::DataQuality(q) => (format!("{:?}", q), q.to_string()),
                DiagnosticKind::UnresolvedSite { site, reason } => {
                    ("UnresolvedSite".to_string(), format!("{}: {}", site, reason))
                }
            };
            writer.write_record([
                d.asset.clone(),
                d.day.map(|day| day.to_string()).unwrap_or_default(),
                d.timestamp.map(|t| t.format(TIMESTAMP_FORMAT).to_string()).unwrap_or_default(),
                kind,
                detail,
            ])?;
        }
        writer.flush()?;
        Ok(path)
    }

    pub fn export_energy_summary(&self, scenario: Scenario, summary: &EnergySummary) -> Result<PathBuf, ExportError> {
        let path = self.output_dir.join(format!("energy_{}_{}.csv", scenario, self.period));
        let mut writer = Writer::from_path(&path)?;
        writer.write_record(["asset", "energy_mwh"])?;
        for (asset, mwh) in &summary.per_asset_mwh {
            writer.write_record([asset.clone(), format!("{:.3}", mwh)])?;
        }
        writer.write_record([POWER_SUM_COLUMN.to_string(), format!("{:.3}", summary.fleet_mwh)])?;
        writer.flush()?;
        Ok(path)
    }
}

/// `timestamp,<asset…>,power_sum`
pub fn write_table(path: &Path, table: &AggregatedResult) -> Result<(), ExportError> {
    let _timing = logging::start_timing("write_table",
        OperationCategory::FileIO { subcategory: FileIOType::ResultsSave });

    let mut writer = Writer::from_path(path)?;
    let mut header = Vec::with_capacity(table.columns().len() + 2);
    header.push(TIMESTAMP_COLUMN.to_string());
    header.extend(table.columns().iter().cloned());
    header.push(POWER_SUM_COLUMN.to_string());
    writer.write_record(&header)?;

    for (timestamp, row, sum) in table.rows() {
        let mut record = Vec::with_capacity(row.len() + 2);
        record.push(timestamp.format(TIMESTAMP_FORMAT).to_string());
        record.extend(row.iter().map(|v| v.to_string()));
        record.push(sum.to_string());
        writer.write_record(&record)?;
    }
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use crate::analysis::reference_days::find_reference_days;
    use crate::core::aggregator::{aggregate, AssetSeries};

    fn temp_output(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("fleetgen_export_{}_{}", name, std::process::id()));
        let _ = fs::remove_dir_all(&dir);
        dir
    }

    fn table() -> AggregatedResult {
        let t0 = Utc.with_ymd_and_hms(2025, 6, 1, 0, 0, 0).single().expect("valid timestamp");
        let t1 = Utc.with_ymd_and_hms(2025, 6, 2, 12, 0, 0).single().expect("valid timestamp");
        aggregate(&[
            AssetSeries::new("PV_Berlin", vec![(t0, 0.0), (t1, 40.5)]),
            AssetSeries::new("Wind_Kiel", vec![(t1, 12.0)]),
        ])
    }

    #[test]
    fn time_series_layout_and_header() {
        let dir = temp_output("series");
        let exporter = CsvExporter::new(&dir, 2025, 6).expect("output dir");
        let path = exporter.export_time_series(Scenario::Normal, &table()).expect("written");

        assert!(path.ends_with("06_2025/time_series_normal_06_2025.csv"));
        let text = fs::read_to_string(&path).expect("readable");
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "timestamp,PV_Berlin,Wind_Kiel,power_sum");
        assert_eq!(lines[1], "2025-06-01 00:00:00,0,0,0");
        assert_eq!(lines[2], "2025-06-02 12:00:00,40.5,12,52.5");
        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn reference_day_extracts_use_suffixes() {
        let dir = temp_output("refdays");
        let exporter = CsvExporter::new(&dir, 2025, 6).expect("output dir");
        let t = table();
        let paths = exporter.export_reference_days(Scenario::Best, &t, &find_reference_days(&t)).expect("written");
        assert_eq!(paths.len(), 4);
        assert!(paths[0].ends_with("time_series_best_06_2025_max_day.csv"));
        let text = fs::read_to_string(&paths[0]).expect("readable");
        assert_eq!(text.lines().count(), 2);
        let _ = fs::remove_dir_all(&dir);
    }
}
