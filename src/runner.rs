use std::path::PathBuf;

use clap::Parser;
use log::info;

use crate::error::Result;
use crate::log::LogLevelSpec;
use crate::parameters::SimulationParameters;
use crate::report::write_series;
use crate::simulation::{Simulation, StopPolicy};
use crate::stats::{peak_infected, TimeSeriesPoint};

/// Name of the series file written to `--output-dir`.
pub const SERIES_FILE_NAME: &str = "series.csv";

/// Default cli arguments for the spatial-seir runner
#[derive(Parser, Debug, Default)]
#[command(name = "spatial-seir", about = "Run a spatial SEIR simulation")]
pub struct BaseArgs {
    /// Random seed
    #[arg(short, long, default_value = "0")]
    pub random_seed: u64,

    /// Optional path to a JSON parameter file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Optional directory for the series CSV
    #[arg(short, long)]
    pub output_dir: Option<PathBuf>,

    /// Number of ticks to run
    #[arg(short, long, default_value = "1000")]
    pub ticks: u64,

    /// Stop as soon as no agent is Exposed or Infected
    #[arg(long)]
    pub stop_when_extinct: bool,

    /// Log level, e.g. `info` or `spatial_seir::contact=trace,warn`
    #[arg(short, long)]
    pub log_level: Option<String>,

    /// Override the population size
    #[arg(long)]
    pub population: Option<usize>,

    /// Override the infection radius
    #[arg(long)]
    pub infection_radius: Option<f64>,

    /// Override the per-contact transmission probability
    #[arg(long)]
    pub transmission_probability: Option<f64>,

    /// Override the vaccination rate
    #[arg(long)]
    pub vaccination_rate: Option<f64>,
}

impl BaseArgs {
    /// Loads the config file (or defaults) and applies command line overrides. The result is
    /// not validated yet; `Simulation::new` does that.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file can't be loaded.
    pub fn parameters(&self) -> Result<SimulationParameters> {
        let mut parameters = match &self.config {
            Some(path) => {
                println!("Loading parameters from: {}", path.display());
                SimulationParameters::from_json_file(path)?
            }
            None => SimulationParameters::default(),
        };
        if let Some(population) = self.population {
            parameters.population = population;
        }
        if let Some(radius) = self.infection_radius {
            parameters.infection_radius = radius;
        }
        if let Some(p) = self.transmission_probability {
            parameters.transmission_probability = p;
        }
        if let Some(rate) = self.vaccination_rate {
            parameters.vaccination_rate = rate;
        }
        Ok(parameters)
    }
}

/// What a finished run produced.
#[derive(Debug)]
pub struct RunSummary {
    pub seed: u64,
    pub series: Vec<TimeSeriesPoint>,
    pub output: Option<PathBuf>,
}

impl RunSummary {
    #[must_use]
    pub fn peak_infected(&self) -> Option<&TimeSeriesPoint> {
        peak_infected(&self.series)
    }
}

/// Runs a simulation configured by `args`.
///
/// # Errors
///
/// Returns an error if the parameters are invalid, the run hits an invariant violation, or the
/// series can't be written.
pub fn run_with_args(args: &BaseArgs) -> Result<RunSummary> {
    if let Some(levels) = &args.log_level {
        levels.parse::<LogLevelSpec>()?.apply();
    }

    let parameters = args.parameters()?;
    let stop_policy = if args.stop_when_extinct {
        StopPolicy::WhenNoActiveInfection
    } else {
        StopPolicy::RunAllTicks
    };
    let mut simulation =
        Simulation::new(parameters, args.random_seed)?.with_stop_policy(stop_policy);
    simulation.run(args.ticks)?;

    let output = match &args.output_dir {
        Some(dir) => {
            let path = dir.join(SERIES_FILE_NAME);
            write_series(&path, simulation.series())?;
            info!("wrote {} points to {}", simulation.series().len(), path.display());
            Some(path)
        }
        None => None,
    };

    Ok(RunSummary {
        seed: args.random_seed,
        series: simulation.series().to_vec(),
        output,
    })
}

/// Parses the process arguments and runs.
///
/// # Errors
///
/// See [`run_with_args`].
pub fn run() -> Result<RunSummary> {
    run_with_args(&BaseArgs::parse())
}
