use std::sync::Arc;
use std::thread;

use anyhow::{anyhow, Context, Result};
use clap::Parser;
use crossbeam_channel::Receiver;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::info;

use fleetgen::analysis::reference_days::{energy_mwh, find_reference_days};
use fleetgen::cli::cli::Args;
use fleetgen::config::simulation_config::{FailurePolicy, SimulationConfig};
use fleetgen::core::scheduler::{Scheduler, SimulationRequest};
use fleetgen::data::fleet_loader::load_fleet;
use fleetgen::data::power_curves::PowerCurveCatalog;
use fleetgen::utils::csv_export::CsvExporter;
use fleetgen::utils::events::{self, SimulationEvent};
use fleetgen::utils::logging::{self, FileIOType, OperationCategory};

fn main() -> Result<()> {
    let args = Args::parse();

    logging::init_logging(args.enable_timing())?;

    let fleet = load_fleet(args.config())
        .with_context(|| format!("failed to load fleet from {}", args.config()))?;
    let config = apply_overrides(fleet.config.clone().unwrap_or_default(), &args);

    let catalog = {
        let _timing = logging::start_timing("load_catalog",
            OperationCategory::FileIO { subcategory: FileIOType::DataLoad });
        match args.power_curves() {
            Some(path) => PowerCurveCatalog::from_path(path)
                .with_context(|| format!("failed to load power curves from {}", path))?,
            None => PowerCurveCatalog::bundled().context("bundled power curves are invalid")?,
        }
    };

    info!(
        assets = fleet.assets.len(),
        year = args.year(),
        month = args.month(),
        weather = %config.weather,
        workers = config.worker_count(),
        "fleetgen starting"
    );

    let (sink, receiver) = events::channel();
    let progress = thread::spawn(move || show_progress(receiver));

    let scheduler = Scheduler::from_config(config, Arc::new(catalog)).with_events(sink);
    let exporter = CsvExporter::new(args.output_dir(), args.year(), args.month())
        .with_context(|| format!("cannot create output directory under {}", args.output_dir()))?;

    for scenario in args.scenarios() {
        let request = SimulationRequest::new(fleet.assets.clone(), args.year(), args.month(), scenario);
        let outcome = scheduler.run(&request)
            .with_context(|| format!("{} scenario failed", scenario))?;

        let _timing = logging::start_timing("export_results",
            OperationCategory::FileIO { subcategory: FileIOType::ResultsSave });
        exporter.export_time_series(scenario, &outcome.table)?;
        let reference_days = find_reference_days(&outcome.table);
        exporter.export_reference_days(scenario, &outcome.table, &reference_days)?;
        exporter.export_energy_summary(scenario, &energy_mwh(&outcome.table))?;
        if !outcome.diagnostics.is_empty() {
            exporter.export_diagnostics(scenario, &outcome.diagnostics)?;
        }

        for day in &reference_days {
            info!(scenario = %scenario, kind = %day.kind, day = %day.day, value = day.value, "Reference day");
        }
    }

    // Closing the last sender ends the progress thread.
    drop(scheduler);
    progress.join().map_err(|_| anyhow!("progress display thread panicked"))?;

    info!(output = %exporter.output_dir().display(), "Done");
    logging::print_timing_report();
    Ok(())
}

fn apply_overrides(mut config: SimulationConfig, args: &Args) -> SimulationConfig {
    if let Some(workers) = args.workers() {
        config.workers = Some(workers);
    }
    if args.densify() {
        config.densify = true;
    }
    if args.skip_failed_tasks() {
        config.failure_policy = FailurePolicy::SkipTask;
    }
    if let Some(weather) = args.weather() {
        config.weather = weather;
    }
    if let Some(cache_dir) = args.cache_dir() {
        config.cache_dir = cache_dir.to_string();
    }
    if args.offline() {
        config.offline = true;
    }
    if let Some(seed) = args.seed() {
        config.seed = seed;
    }
    config
}

fn show_progress(receiver: Receiver<SimulationEvent>) {
    let mut bar: Option<ProgressBar> = None;
    for event in receiver.iter() {
        match event {
            SimulationEvent::RunStarted { scenario, tasks } => {
                let pb = ProgressBar::new(tasks as u64);
                if let Ok(style) = ProgressStyle::default_bar()
                    .template("{spinner:.green} {msg} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len}")
                {
                    pb.set_style(style);
                }
                pb.set_message(scenario.to_string());
                bar = Some(pb);
            }
            SimulationEvent::TaskCompleted { .. } => {
                if let Some(pb) = &bar {
                    pb.inc(1);
                }
            }
            SimulationEvent::TaskSkipped { asset, day, reason } => {
                if let Some(pb) = &bar {
                    pb.inc(1);
                    pb.println(format!("skipped {} on {}: {}", asset, day, reason));
                }
            }
            SimulationEvent::AssetSkipped { asset, reason } => {
                let line = format!("skipped asset {}: {}", asset, reason);
                match &bar {
                    Some(pb) => pb.println(line),
                    None => eprintln!("{}", line),
                }
            }
            SimulationEvent::Diagnostic(_) => {}
            SimulationEvent::RunFinished { scenario, rows } => {
                if let Some(pb) = bar.take() {
                    pb.finish_with_message(format!("{} done, {} rows", scenario, rows));
                }
            }
        }
    }
}
