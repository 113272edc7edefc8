//! Single-temperature Ising run: simulate, estimate, write a run directory.
//
//  Compile & run:  `cargo run --release --bin ising -- -r 32 -c 32 -T 2.3`

use std::path::PathBuf;
use std::time::Instant;

use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use ising_mc::report::{self, RunReport};
use ising_mc::{Dynamics, ErrorMethod, InitialState, Simulation, SimulationConfig};
use log::{info, warn};

#[derive(Parser, Debug)]
#[command(about = "Options for Ising model simulation")]
struct Cli {
    /// Number of rows in lattice.
    #[arg(short = 'r', long, default_value_t = 50)]
    row_count: usize,

    /// Number of columns in lattice.
    #[arg(short = 'c', long, default_value_t = 50)]
    column_count: usize,

    /// Temperature of the lattice.
    #[arg(short = 'T', long, default_value_t = 1.0)]
    temperature: f64,

    /// Update rule: glauber (single flip) or kawasaki (pair exchange).
    #[arg(long, default_value_t = Dynamics::Glauber)]
    dynamics: Dynamics,

    /// Shorthand for --dynamics glauber.
    #[arg(short = 'g', long = "glauber-dynamics")]
    glauber: bool,

    /// Shorthand for --dynamics kawasaki (takes precedence).
    #[arg(short = 'k', long = "kawasaki-dynamics")]
    kawasaki: bool,

    /// J constant that determines units of energy.
    #[arg(short = 'J', long, default_value_t = 1.0, allow_negative_numbers = true)]
    j_constant: f64,

    /// Boltzmann constant.
    #[arg(long, default_value_t = 1.0)]
    boltzmann_constant: f64,

    /// Number of sweeps to generate after the burn period.
    #[arg(short = 's', long, default_value_t = 10_000)]
    sweeps: usize,

    /// Number of sweeps before measurement starts.
    #[arg(short = 'b', long, default_value_t = 100)]
    burn_period: usize,

    /// How many sweeps between measurements.
    #[arg(short = 'i', long, default_value_t = 10)]
    measurement_interval: usize,

    /// Range of autocorrelation function for output.
    #[arg(short = 'C', long, default_value_t = 100)]
    autocorrelation_range: usize,

    /// Error method: naive, jackknife or bootstrap.
    #[arg(long, default_value_t = ErrorMethod::Bootstrap)]
    error_method: ErrorMethod,

    /// Resamples drawn by the bootstrap.
    #[arg(long, default_value_t = ising_mc::DEFAULT_BOOTSTRAP_ITERATIONS)]
    bootstrap_iterations: usize,

    /// Starting configuration: aligned, random or striped.
    #[arg(long)]
    initial_state: Option<InitialState>,

    /// Record |M| instead of the signed magnetisation.
    #[arg(long)]
    absolute_magnetisation: bool,

    /// Seed for the random number generator (defaults to OS entropy).
    #[arg(long)]
    seed: Option<u64>,

    /// Name of output directory (defaults to a timestamp).
    #[arg(short = 'o', long)]
    output: Option<PathBuf>,

    /// Output the lattice after each measurement sweep for animation.
    #[arg(short = 'a', long)]
    animate: bool,
}

impl Cli {
    fn config(&self) -> SimulationConfig {
        let dynamics = if self.kawasaki {
            Dynamics::Kawasaki
        } else if self.glauber {
            Dynamics::Glauber
        } else {
            self.dynamics
        };
        SimulationConfig {
            rows: self.row_count,
            cols: self.column_count,
            temperature: self.temperature,
            j_coupling: self.j_constant,
            boltzmann: self.boltzmann_constant,
            burn_period: self.burn_period,
            sweeps: self.sweeps,
            measurement_interval: self.measurement_interval,
            dynamics,
            error_method: self.error_method,
            bootstrap_iterations: self.bootstrap_iterations,
            autocorrelation_range: self.autocorrelation_range,
            initial_state: self.initial_state,
            absolute_magnetisation: self.absolute_magnetisation,
            seed: self.seed,
        }
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let timer = Instant::now();

    let args = Cli::parse();
    let config = args.config();
    let mut sim = Simulation::new(config.clone())?;

    println!("{}", config);

    let base = args
        .output
        .clone()
        .unwrap_or_else(|| PathBuf::from(report::timestamp_name()));
    let dir = report::create_run_directory(&base)?;
    info!("writing output to {}", dir.display());
    report::write_lattice(&dir.join("initial_configuration.dat"), sim.lattice())?;

    let total = config.burn_period + config.sweeps;
    let bar = ProgressBar::new(total as u64);
    bar.set_style(ProgressStyle::with_template(
        " {bar:40.cyan/blue} {pos}/{len} sweeps [{elapsed_precise}]",
    )?);

    let spins_path = dir.join("spins.dat");
    let results = sim.run_with(|sweep, lattice| {
        bar.inc(1);
        if args.animate && sweep % config.measurement_interval == 0 {
            if let Err(e) = report::write_lattice(&spins_path, lattice) {
                warn!("could not write {}: {}", spins_path.display(), e);
            }
        }
    })?;
    bar.finish();

    RunReport {
        config: &config,
        results: &results,
        energy: sim.energy_series(),
        magnetisation: sim.magnetisation_series(),
        final_lattice: sim.lattice(),
    }
    .write_to(&dir)?;

    println!("{}", results);
    println!(
        "{:<30}{:.3}",
        "Time taken to execute (s): ",
        timer.elapsed().as_secs_f64()
    );
    Ok(())
}
