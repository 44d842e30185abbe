//! End-to-end runs of a fleet month on synthetic weather.

mod common;

use std::fs;

use fleetgen::analysis::reference_days::{energy_mwh, find_reference_days, ReferenceDayKind};
use fleetgen::config::scenario::Scenario;
use fleetgen::config::simulation_config::SimulationConfig;
use fleetgen::core::scheduler::{Scheduler, SimulationRequest};
use fleetgen::data::fleet_loader::load_fleet;
use fleetgen::models::asset::{Asset, PvLosses, PvParameters, SiteRef};
use fleetgen::utils::csv_export::CsvExporter;
use fleetgen::utils::events::DiagnosticKind;

fn june(scenario: Scenario) -> SimulationRequest {
    SimulationRequest::new(common::reference_fleet(), 2025, 6, scenario)
}

#[test]
fn june_reference_fleet_has_one_row_per_sample() {
    let scheduler = common::synthetic_scheduler(common::offline_config());
    let outcome = scheduler.run(&june(Scenario::Normal)).expect("run succeeds");
    let table = &outcome.table;

    assert_eq!(table.len(), 30 * 24);
    assert_eq!(table.columns(), &["PV_Berlin".to_string(), "Wind_Kiel".to_string()]);
    assert!(table.timestamps().windows(2).all(|w| w[0] < w[1]));
    for (_, row, sum) in table.rows() {
        assert!(row.iter().all(|v| *v >= 0.0));
        assert!((row.iter().sum::<f64>() - sum).abs() < 1e-9);
    }
    assert!(outcome.skipped_assets.is_empty());
    assert!(outcome.skipped_tasks.is_empty());
}

#[test]
fn pv_is_dark_at_midnight_and_bounded_by_its_rating() {
    let scheduler = common::synthetic_scheduler(common::offline_config());
    let outcome = scheduler.run(&june(Scenario::Best)).expect("run succeeds");
    let pv = outcome.table.column("PV_Berlin").expect("pv column");
    let wind = outcome.table.column("Wind_Kiel").expect("wind column");

    // Row 0 is 2025-06-01 00:00 UTC
    assert_eq!(pv[0], 0.0);
    assert!(pv.iter().all(|p| *p < 100.0));
    assert!(pv.iter().any(|p| *p > 10.0));
    assert!(wind.iter().all(|p| *p <= 16.0 * 3.2));
}

#[test]
fn repeated_runs_are_reproducible() {
    let a = common::synthetic_scheduler(common::offline_config()).run(&june(Scenario::Normal)).expect("run succeeds");
    let b = common::synthetic_scheduler(common::offline_config()).run(&june(Scenario::Normal)).expect("run succeeds");
    assert_eq!(a.table, b.table);
}

#[test]
fn pv_energy_follows_scenario_order() {
    let scheduler = common::synthetic_scheduler(common::offline_config());
    let energy = |scenario| {
        let outcome = scheduler.run(&june(scenario)).expect("run succeeds");
        energy_mwh(&outcome.table).per_asset_mwh[0].1
    };
    let (best, normal, worst) = (energy(Scenario::Best), energy(Scenario::Normal), energy(Scenario::Worst));
    assert!(best > normal && normal > worst, "{} {} {}", best, normal, worst);
}

#[test]
fn unknown_site_is_skipped_when_offline() {
    let mut assets = common::reference_fleet();
    assets.push(Asset::new_pv(
        "PV_Nowhere",
        10.0,
        SiteRef::Name("Nowhere-on-map".to_string()),
        PvParameters { tilt: 20.0, azimuth: 180.0, albedo: 0.2, losses: PvLosses::default() },
    ));
    let scheduler = Scheduler::from_config(common::offline_config(), common::catalog());
    let outcome = scheduler.run(&SimulationRequest::new(assets, 2025, 6, Scenario::Normal)).expect("run succeeds");

    assert_eq!(outcome.table.columns().len(), 2);
    assert_eq!(outcome.skipped_assets.len(), 1);
    assert!(matches!(
        &outcome.diagnostics[0].kind,
        DiagnosticKind::UnresolvedSite { site, .. } if site == "Nowhere-on-map"
    ));
}

#[test]
fn densified_quarter_hour_month() {
    let config = SimulationConfig { densify: true, sample_interval_minutes: 15, ..common::offline_config() };
    let scheduler = common::synthetic_scheduler(config);
    let outcome = scheduler.run(&june(Scenario::Normal)).expect("run succeeds");
    assert_eq!(outcome.table.len(), 2 * 30 * 96 - 1);
}

#[test]
fn fleet_document_to_csv_artifacts() {
    let dir = common::temp_dir("artifacts");
    let fleet_path = dir.join("fleet.json");
    fs::write(&fleet_path, r#"{
        "assets": [
            {"name": "PV_Berlin", "kind": "pv", "rated_power": 100, "site": "Berlin", "tilt": 30},
            {"name": "Wind_Kiel", "kind": "wind", "rated_power": 50, "site": "Kiel",
             "hub_height": 100, "turbine_rated_power": 3.2},
            {"name": "PV_Offshore", "kind": "pv", "rated_power": 5, "tilt": 10,
             "site": {"name": "Platform", "latitude": 54.5, "longitude": 7.0}}
        ],
        "config": {"workers": 2, "offline": true, "seed": 7}
    }"#).expect("write fleet");

    let fleet = load_fleet(&fleet_path).expect("valid fleet");
    let config = fleet.config.clone().expect("config section");
    let scheduler = common::synthetic_scheduler(config);
    let outcome = scheduler.run(&SimulationRequest::new(fleet.assets.clone(), 2025, 6, Scenario::Worst))
        .expect("run succeeds");

    let exporter = CsvExporter::new(dir.join("out"), 2025, 6).expect("output dir");
    let series = exporter.export_time_series(Scenario::Worst, &outcome.table).expect("written");
    let days = find_reference_days(&outcome.table);
    assert_eq!(days.len(), ReferenceDayKind::ALL.len());
    let extracts = exporter.export_reference_days(Scenario::Worst, &outcome.table, &days).expect("written");

    let text = fs::read_to_string(&series).expect("readable");
    assert_eq!(text.lines().next(), Some("timestamp,PV_Berlin,Wind_Kiel,PV_Offshore,power_sum"));
    assert_eq!(text.lines().count(), 1 + 30 * 24);
    for path in extracts {
        let name = path.file_name().and_then(|n| n.to_str()).unwrap_or_default().to_string();
        assert!(name.starts_with("time_series_worst_06_2025_"), "{}", name);
        assert_eq!(fs::read_to_string(&path).expect("readable").lines().count(), 1 + 24);
    }
    let _ = fs::remove_dir_all(&dir);
}
