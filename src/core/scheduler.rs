use std::collections::HashMap;
use std::sync::Arc;
use chrono::{DateTime, Datelike, NaiveDate, Utc};
use rayon::prelude::*;
use serde::Serialize;
use tracing::{debug, info, warn};
use crate::config::scenario::{Scenario, ScenarioTables};
use crate::config::simulation_config::{FailurePolicy, SimulationConfig};
use crate::core::aggregator::{aggregate, AggregatedResult, AssetSeries};
use crate::core::densify::densify;
use crate::core::error::{RunError, SimulationError};
use crate::core::location::LocationResolver;
use crate::data::poi::Site;
use crate::data::power_curves::PowerCurveCatalog;
use crate::data::weather::WeatherProvider;
use crate::models::asset::Asset;
use crate::models::generator::GeneratorModel;
use crate::utils::events::{Diagnostic, DiagnosticKind, EventSink, SimulationEvent};
use crate::utils::logging::{self, OperationCategory};

/// One month of one scenario for a fleet.
#[derive(Debug, Clone)]
pub struct SimulationRequest {
    pub assets: Vec<Asset>,
    pub year: i32,
    pub month: u32,
    pub scenario: Scenario,
}

impl SimulationRequest {
    pub fn new(assets: Vec<Asset>, year: i32, month: u32, scenario: Scenario) -> Self {
        Self { assets, year, month, scenario }
    }

    pub fn days(&self) -> Result<Vec<NaiveDate>, RunError> {
        month_days(self.year, self.month)
    }
}

/// Every calendar day of a month.
pub fn month_days(year: i32, month: u32) -> Result<Vec<NaiveDate>, RunError> {
    let first = NaiveDate::from_ymd_opt(year, month, 1)
        .ok_or_else(|| RunError::InvalidRequest(format!("no such month: {:04}-{:02}", year, month)))?;
    Ok(first.iter_days().take_while(|d| d.month() == month).collect())
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SkippedAsset {
    pub asset: String,
    pub site: String,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SkippedTask {
    pub asset: String,
    pub day: NaiveDate,
    pub reason: String,
}

#[derive(Debug, Clone)]
pub struct SimulationOutcome {
    pub scenario: Scenario,
    pub table: AggregatedResult,
    pub diagnostics: Vec<Diagnostic>,
    pub skipped_assets: Vec<SkippedAsset>,
    pub skipped_tasks: Vec<SkippedTask>,
}

struct SimulationTask {
    asset_index: usize,
    asset: Asset,
    site: Site,
    day: NaiveDate,
    scenario: Scenario,
}

struct PartialSeries {
    asset_index: usize,
    day: NaiveDate,
    points: Vec<(DateTime<Utc>, f64)>,
    diagnostics: Vec<Diagnostic>,
}

struct DayRun {
    last_day: NaiveDate,
    points: Vec<(DateTime<Utc>, f64)>,
}

/// Runs a fleet month as independent (asset, day) tasks on a worker pool.
pub struct Scheduler {
    config: SimulationConfig,
    resolver: LocationResolver,
    weather: Arc<dyn WeatherProvider>,
    catalog: Arc<PowerCurveCatalog>,
    tables: ScenarioTables,
    events: EventSink,
}

impl Scheduler {
    pub fn new(
        config: SimulationConfig,
        resolver: LocationResolver,
        weather: Arc<dyn WeatherProvider>,
        catalog: Arc<PowerCurveCatalog>,
    ) -> Self {
        Self {
            config,
            resolver,
            weather,
            catalog,
            tables: ScenarioTables::default(),
            events: EventSink::disabled(),
        }
    }

    /// Geocoder and weather source as chosen by the configuration.
    pub fn from_config(config: SimulationConfig, catalog: Arc<PowerCurveCatalog>) -> Self {
        let resolver = LocationResolver::new(config.geocoder());
        let weather = config.weather_provider();
        Self::new(config, resolver, weather, catalog)
    }

    pub fn with_events(mut self, events: EventSink) -> Self {
        self.events = events;
        self
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    pub fn resolver(&self) -> &LocationResolver {
        &self.resolver
    }

    pub fn run(&self, request: &SimulationRequest) -> Result<SimulationOutcome, RunError> {
        let _timing = logging::start_timing("run_simulation", OperationCategory::Simulation);

        let days = request.days()?;
        let mut diagnostics = Vec::new();
        let mut skipped_assets = Vec::new();

        // Resolve every site before any task runs. Sites are keyed by asset
        // index: two assets may share a site name at different coordinates.
        let mut runnable: Vec<(usize, Site)> = Vec::new();
        for (index, asset) in request.assets.iter().enumerate() {
            match self.resolver.resolve_ref(&asset.site) {
                Ok(site) => runnable.push((index, site)),
                Err(e) => {
                    warn!(asset = %asset.name, site = %asset.site, error = %e, "Skipping asset with unresolved site");
                    let reason = e.to_string();
                    let diagnostic = Diagnostic {
                        asset: asset.name.clone(),
                        day: None,
                        timestamp: None,
                        kind: DiagnosticKind::UnresolvedSite { site: asset.site.key(), reason: reason.clone() },
                    };
                    self.events.emit(SimulationEvent::AssetSkipped { asset: asset.name.clone(), reason: reason.clone() });
                    self.events.emit(SimulationEvent::Diagnostic(diagnostic.clone()));
                    diagnostics.push(diagnostic);
                    skipped_assets.push(SkippedAsset { asset: asset.name.clone(), site: asset.site.key(), reason });
                }
            }
        }

        let mut tasks = Vec::with_capacity(runnable.len() * days.len());
        for (asset_index, site) in &runnable {
            let asset_index = *asset_index;
            let asset = &request.assets[asset_index];
            let scenario = asset.effective_scenario(request.scenario);
            for &day in &days {
                tasks.push(SimulationTask { asset_index, asset: asset.clone(), site: site.clone(), day, scenario });
            }
        }

        info!(
            scenario = %request.scenario,
            year = request.year,
            month = request.month,
            assets = runnable.len(),
            tasks = tasks.len(),
            workers = self.config.worker_count(),
            "Starting simulation"
        );
        self.events.emit(SimulationEvent::RunStarted { scenario: request.scenario, tasks: tasks.len() });

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.config.worker_count())
            .build()
            .map_err(|e| RunError::ThreadPool(e.to_string()))?;

        let mut skipped_tasks = Vec::new();
        let mut partials: Vec<PartialSeries> = match self.config.failure_policy {
            FailurePolicy::Abort => pool.install(|| {
                tasks.into_par_iter()
                    .map(|task| self.execute(task))
                    .collect::<Result<Vec<_>, RunError>>()
            })?,
            FailurePolicy::SkipTask => {
                let results: Vec<Result<PartialSeries, RunError>> = pool.install(|| {
                    tasks.into_par_iter().map(|task| self.execute(task)).collect()
                });
                let mut completed = Vec::with_capacity(results.len());
                for result in results {
                    match result {
                        Ok(partial) => completed.push(partial),
                        Err(RunError::TaskFailed { asset, day, source }) => {
                            warn!(asset = %asset, day = %day, error = %source, "Skipping failed task");
                            let reason = source.to_string();
                            self.events.emit(SimulationEvent::TaskSkipped { asset: asset.clone(), day, reason: reason.clone() });
                            skipped_tasks.push(SkippedTask { asset, day, reason });
                        }
                        Err(other) => return Err(other),
                    }
                }
                completed
            }
        };

        partials.sort_by_key(|p| (p.asset_index, p.day));
        skipped_tasks.sort_by(|a, b| (&a.asset, a.day).cmp(&(&b.asset, b.day)));

        // Runs of consecutive completed days per asset. A skipped day breaks the
        // run so densify never bridges it.
        let mut grouped: HashMap<usize, Vec<DayRun>> = HashMap::new();
        for partial in partials {
            for diagnostic in &partial.diagnostics {
                self.events.emit(SimulationEvent::Diagnostic(diagnostic.clone()));
            }
            diagnostics.extend(partial.diagnostics);
            let runs = grouped.entry(partial.asset_index).or_default();
            match runs.last_mut() {
                Some(run) if run.last_day.succ_opt() == Some(partial.day) => {
                    run.last_day = partial.day;
                    run.points.extend(partial.points);
                }
                _ => runs.push(DayRun { last_day: partial.day, points: partial.points }),
            }
        }

        let series: Vec<AssetSeries> = runnable.iter()
            .map(|(index, _)| {
                let points = grouped.remove(index)
                    .unwrap_or_default()
                    .into_iter()
                    .flat_map(|run| if self.config.densify { densify(&run.points) } else { run.points })
                    .collect();
                AssetSeries::new(request.assets[*index].name.clone(), points)
            })
            .collect();

        let table = aggregate(&series);
        info!(
            scenario = %request.scenario,
            rows = table.len(),
            diagnostics = diagnostics.len(),
            skipped_assets = skipped_assets.len(),
            skipped_tasks = skipped_tasks.len(),
            "Simulation finished"
        );
        self.events.emit(SimulationEvent::RunFinished { scenario: request.scenario, rows: table.len() });

        Ok(SimulationOutcome {
            scenario: request.scenario,
            table,
            diagnostics,
            skipped_assets,
            skipped_tasks,
        })
    }

    fn execute(&self, task: SimulationTask) -> Result<PartialSeries, RunError> {
        let fail = |source: SimulationError| RunError::TaskFailed {
            asset: task.asset.name.clone(),
            day: task.day,
            source,
        };

        let samples = self.weather
            .fetch(&task.site, task.day, task.asset.weather_kind())
            .map_err(|e| fail(e.into()))?;
        let model = GeneratorModel::for_asset(&task.asset, &task.site, task.scenario, self.tables, &self.catalog);
        let powers = model.simulate_day(&samples).map_err(fail)?;

        let diagnostics = powers.iter()
            .filter_map(|p| p.quality.map(|q| Diagnostic {
                asset: task.asset.name.clone(),
                day: Some(task.day),
                timestamp: Some(p.timestamp),
                kind: DiagnosticKind::DataQuality(q),
            }))
            .collect();
        let points = powers.iter().map(|p| (p.timestamp, p.power_mw)).collect();

        debug!(asset = %task.asset.name, day = %task.day, samples = samples.len(), "Task complete");
        self.events.emit(SimulationEvent::TaskCompleted { asset: task.asset.name.clone(), day: task.day });

        Ok(PartialSeries { asset_index: task.asset_index, day: task.day, points, diagnostics })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use crate::data::geocoder::Gazetteer;
    use crate::data::weather::{MeasurementUnit, WeatherError, WeatherKind, WeatherSample};
    use crate::models::asset::{PvLosses, PvParameters, SiteRef, WindParameters};
    use crate::utils::events;

    /// Constant readings every hour; fails on one chosen day.
    struct FixedWeather {
        failing_day: Option<NaiveDate>,
    }

    impl WeatherProvider for FixedWeather {
        fn fetch(&self, site: &Site, day: NaiveDate, kind: WeatherKind) -> Result<Vec<WeatherSample>, WeatherError> {
            if Some(day) == self.failing_day {
                return Err(WeatherError::NoDataForDate { site: site.name.clone(), day });
            }
            let midnight = day.and_hms_opt(0, 0, 0).expect("valid time").and_utc();
            Ok((0..24)
                .map(|h| {
                    let t = midnight + Duration::hours(h);
                    match kind {
                        WeatherKind::Pv => WeatherSample::new(t, Some(400.0), MeasurementUnit::WattsPerSquareMetre),
                        WeatherKind::Wind => WeatherSample::new(t, Some(6.0), MeasurementUnit::MetresPerSecond),
                    }
                })
                .collect())
        }

        fn name(&self) -> &str {
            "fixed"
        }
    }

    fn fleet() -> Vec<Asset> {
        vec![
            Asset::new_pv("PV_Berlin", 100.0, SiteRef::Name("Berlin".into()),
                PvParameters { tilt: 30.0, azimuth: 180.0, albedo: 0.2, losses: PvLosses::default() }),
            Asset::new_wind("Wind_Kiel", 50.0, SiteRef::Name("Kiel".into()),
                WindParameters { hub_height: 100.0, turbine_rated_power: 3.2 }),
        ]
    }

    fn scheduler(config: SimulationConfig, failing_day: Option<NaiveDate>) -> Scheduler {
        Scheduler::new(
            config,
            LocationResolver::new(Box::new(Gazetteer::builtin())),
            Arc::new(FixedWeather { failing_day }),
            Arc::new(PowerCurveCatalog::bundled().expect("bundled table parses")),
        )
    }

    fn config(policy: FailurePolicy) -> SimulationConfig {
        SimulationConfig { workers: Some(2), failure_policy: policy, ..SimulationConfig::default() }
    }

    fn june(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, d).expect("valid date")
    }

    #[test]
    fn month_days_cover_the_calendar() {
        assert_eq!(month_days(2025, 6).expect("valid").len(), 30);
        assert_eq!(month_days(2024, 2).expect("valid").len(), 29);
        assert!(matches!(month_days(2025, 13), Err(RunError::InvalidRequest(_))));
    }

    #[test]
    fn one_row_per_sample_for_the_whole_month() {
        let s = scheduler(config(FailurePolicy::Abort), None);
        let outcome = s.run(&SimulationRequest::new(fleet(), 2025, 6, Scenario::Normal)).expect("run succeeds");
        assert_eq!(outcome.table.len(), 30 * 24);
        assert_eq!(outcome.table.columns(), &["PV_Berlin".to_string(), "Wind_Kiel".to_string()]);
        assert!(outcome.skipped_assets.is_empty());
        for (_, row, sum) in outcome.table.rows() {
            assert!(row.iter().all(|v| *v >= 0.0));
            assert!((row.iter().sum::<f64>() - sum).abs() < 1e-9);
        }
    }

    #[test]
    fn unresolved_site_skips_only_that_asset() {
        let mut assets = fleet();
        assets.push(Asset::new_pv("PV_Atlantis", 5.0, SiteRef::Name("Atlantis".into()),
            PvParameters { tilt: 30.0, azimuth: 180.0, albedo: 0.2, losses: PvLosses::default() }));
        let s = scheduler(config(FailurePolicy::Abort), None);
        let outcome = s.run(&SimulationRequest::new(assets, 2025, 6, Scenario::Normal)).expect("run succeeds");

        assert_eq!(outcome.skipped_assets.len(), 1);
        assert_eq!(outcome.skipped_assets[0].asset, "PV_Atlantis");
        assert_eq!(outcome.table.columns().len(), 2);
        assert!(outcome.diagnostics.iter().any(|d| matches!(d.kind, DiagnosticKind::UnresolvedSite { .. })));
    }

    #[test]
    fn abort_policy_names_the_failing_task() {
        let s = scheduler(config(FailurePolicy::Abort), Some(june(12)));
        match s.run(&SimulationRequest::new(fleet(), 2025, 6, Scenario::Normal)) {
            Err(RunError::TaskFailed { day, source, .. }) => {
                assert_eq!(day, june(12));
                assert!(matches!(source, SimulationError::Weather(WeatherError::NoDataForDate { .. })));
            }
            other => panic!("expected a task failure, got {:?}", other.map(|o| o.table.len())),
        }
    }

    #[test]
    fn skip_policy_records_failed_tasks_and_continues() {
        let s = scheduler(config(FailurePolicy::SkipTask), Some(june(12)));
        let outcome = s.run(&SimulationRequest::new(fleet(), 2025, 6, Scenario::Normal)).expect("run succeeds");
        assert_eq!(outcome.skipped_tasks.len(), 2);
        assert!(outcome.skipped_tasks.iter().all(|t| t.day == june(12)));
        assert_eq!(outcome.table.len(), 29 * 24);
    }

    #[test]
    fn densified_run_adds_midpoints() {
        let cfg = SimulationConfig { densify: true, ..config(FailurePolicy::Abort) };
        let s = scheduler(cfg, None);
        let outcome = s.run(&SimulationRequest::new(fleet(), 2025, 6, Scenario::Normal)).expect("run succeeds");
        assert_eq!(outcome.table.len(), 2 * 30 * 24 - 1);
    }

    #[test]
    fn densify_does_not_bridge_a_skipped_day() {
        let cfg = SimulationConfig { densify: true, ..config(FailurePolicy::SkipTask) };
        let s = scheduler(cfg, Some(june(12)));
        let outcome = s.run(&SimulationRequest::new(fleet(), 2025, 6, Scenario::Normal)).expect("run succeeds");

        assert_eq!(outcome.skipped_tasks.len(), 2);
        assert!(outcome.table.timestamps().iter().all(|t| t.date_naive() != june(12)));
        // June 1-11 and June 13-30 densify separately
        assert_eq!(outcome.table.len(), (2 * 11 * 24 - 1) + (2 * 18 * 24 - 1));
    }

    #[test]
    fn assets_sharing_a_site_name_keep_their_own_coordinates() {
        let plant = |name: &str, latitude: f64, longitude: f64| Asset::new_pv(
            name,
            100.0,
            SiteRef::Coordinates { name: Some("Plant".into()), latitude, longitude },
            PvParameters { tilt: 30.0, azimuth: 180.0, albedo: 0.2, losses: PvLosses::default() },
        );
        let berlin = plant("PV_Berlin", 52.52, 13.40);
        let sydney = plant("PV_Sydney", -33.87, 151.21);
        let s = scheduler(config(FailurePolicy::Abort), None);

        let alone = s.run(&SimulationRequest::new(vec![berlin.clone()], 2025, 6, Scenario::Normal))
            .expect("run succeeds");
        let both = s.run(&SimulationRequest::new(vec![berlin, sydney], 2025, 6, Scenario::Normal))
            .expect("run succeeds");

        let berlin_alone = alone.table.column("PV_Berlin").expect("column");
        let berlin_in_fleet = both.table.column("PV_Berlin").expect("column");
        let sydney_in_fleet = both.table.column("PV_Sydney").expect("column");
        assert_eq!(berlin_alone, berlin_in_fleet);
        assert_ne!(berlin_in_fleet, sydney_in_fleet);
    }

    #[test]
    fn asset_scenario_overrides_request() {
        let wind = vec![Asset::new_wind("W", 50.0, SiteRef::Name("Kiel".into()),
            WindParameters { hub_height: 100.0, turbine_rated_power: 3.2 })];
        let pinned = vec![wind[0].clone().with_scenario(Scenario::Worst)];
        let s = scheduler(config(FailurePolicy::Abort), None);

        let best = s.run(&SimulationRequest::new(wind, 2025, 6, Scenario::Best)).expect("run succeeds");
        let forced = s.run(&SimulationRequest::new(pinned, 2025, 6, Scenario::Best)).expect("run succeeds");
        assert!(best.table.power_sum()[0] > forced.table.power_sum()[0]);
    }

    #[test]
    fn events_report_progress() {
        let (sink, rx) = events::channel();
        let s = scheduler(config(FailurePolicy::Abort), None).with_events(sink);
        s.run(&SimulationRequest::new(fleet(), 2025, 6, Scenario::Normal)).expect("run succeeds");
        drop(s);

        let events: Vec<SimulationEvent> = rx.iter().collect();
        assert!(matches!(events.first(), Some(SimulationEvent::RunStarted { tasks: 60, .. })));
        let completed = events.iter().filter(|e| matches!(e, SimulationEvent::TaskCompleted { .. })).count();
        assert_eq!(completed, 60);
        assert!(matches!(events.last(), Some(SimulationEvent::RunFinished { rows: 720, .. })));
    }

    #[test]
    fn sites_are_resolved_once_per_run() {
        let mut assets = fleet();
        assets.push(Asset::new_pv("PV_Berlin_2", 10.0, SiteRef::Name("Berlin".into()),
            PvParameters { tilt: 20.0, azimuth: 180.0, albedo: 0.2, losses: PvLosses::default() }));
        let s = scheduler(config(FailurePolicy::Abort), None);
        s.run(&SimulationRequest::new(assets, 2025, 6, Scenario::Normal)).expect("run succeeds");
        assert_eq!(s.resolver().lookups(), 2);
    }
}
