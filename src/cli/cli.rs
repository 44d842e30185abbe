use clap::Parser;
use crate::config::scenario::Scenario;
use crate::config::simulation_config::WeatherSource;

#[derive(Parser)]
#[command(author, version, about = "Simulates the power output of a PV and wind fleet over one month", long_about = None)]
pub struct Args {
    #[arg(short, long, help = "Fleet document (JSON)")]
    config: String,

    #[arg(short, long)]
    year: i32,

    #[arg(short, long, value_parser = clap::value_parser!(u32).range(1..=12))]
    month: u32,

    #[arg(short, long, help = "Scenario to run; repeat for several (default: all)")]
    scenario: Vec<Scenario>,

    #[arg(short, long, default_value = "output")]
    output_dir: String,

    #[arg(short, long, help = "Worker threads (default: all cores)")]
    workers: Option<usize>,

    #[arg(long, default_value_t = false)]
    densify: bool,

    #[arg(long, help = "Record failed tasks and continue instead of aborting", default_value_t = false)]
    skip_failed_tasks: bool,

    #[arg(long, help = "Weather source: synthetic or station")]
    weather: Option<WeatherSource>,

    #[arg(short = 'C', long)]
    cache_dir: Option<String>,

    #[arg(long, help = "Turbine power curve table (CSV); defaults to the bundled dataset")]
    power_curves: Option<String>,

    #[arg(long, help = "No network access for geocoding or downloads", default_value_t = false)]
    offline: bool,

    #[arg(long, help = "Seed of the synthetic weather source")]
    seed: Option<u64>,

    #[arg(long, default_value_t = false)]
    enable_timing: bool,
}

impl Args {
    pub fn config(&self) -> &str {
        &self.config
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn month(&self) -> u32 {
        self.month
    }

    /// Requested scenarios in the given order, duplicates removed.
    pub fn scenarios(&self) -> Vec<Scenario> {
        if self.scenario.is_empty() {
            return Scenario::ALL.to_vec();
        }
        let mut scenarios = Vec::new();
        for s in &self.scenario {
            if !scenarios.contains(s) {
                scenarios.push(*s);
            }
        }
        scenarios
    }

    pub fn output_dir(&self) -> &str {
        &self.output_dir
    }

    pub fn workers(&self) -> Option<usize> {
        self.workers
    }

    pub fn densify(&self) -> bool {
        self.densify
    }

    pub fn skip_failed_tasks(&self) -> bool {
        self.skip_failed_tasks
    }

    pub fn weather(&self) -> Option<WeatherSource> {
        self.weather
    }

    pub fn cache_dir(&self) -> Option<&str> {
        self.cache_dir.as_deref()
    }

    pub fn power_curves(&self) -> Option<&str> {
        self.power_curves.as_deref()
    }

    pub fn offline(&self) -> bool {
        self.offline
    }

    pub fn seed(&self) -> Option<u64> {
        self.seed
    }

    pub fn enable_timing(&self) -> bool {
        self.enable_timing
    }
}
