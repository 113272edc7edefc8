// simulation.rs - Burn-in, measurement sweeps and final estimates for one chain

use std::fmt;
use std::str::FromStr;

use log::{debug, info, warn};
use rand::SeedableRng;
use rand_chacha::ChaCha20Rng;

use crate::dynamics::Dynamics;
use crate::error::{require_positive, IsingError, Result};
use crate::estimate::Estimate;
use crate::lattice::SpinLattice;
use crate::metropolis::Metropolis;
use crate::observables::{ErrorMethod, HeatCapacity, Mean, Observable, Susceptibility};
use crate::sample_series::{SampleSeries, DEFAULT_BOOTSTRAP_ITERATIONS};

/// Below this temperature a Kawasaki run starts from the striped ground state.
const STRIPED_START_BELOW: f64 = 1.5;

/// Width of the label column in the parameter and result tables.
const LABEL_WIDTH: usize = 30;

/// Starting configuration of the lattice.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InitialState {
    /// Every spin up.
    Aligned,
    /// Independent fair coin per site.
    Random,
    /// Half the sites up, half down (zero magnetisation).
    Striped,
}

impl fmt::Display for InitialState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InitialState::Aligned => write!(f, "Aligned"),
            InitialState::Random => write!(f, "Random"),
            InitialState::Striped => write!(f, "Striped"),
        }
    }
}

impl FromStr for InitialState {
    type Err = IsingError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "aligned" => Ok(InitialState::Aligned),
            "random" => Ok(InitialState::Random),
            "striped" | "even" => Ok(InitialState::Striped),
            _ => Err(IsingError::UnknownInitialState(s.to_string())),
        }
    }
}

/// Run-time configuration (single source of truth).
#[derive(Debug, Clone, PartialEq)]
pub struct SimulationConfig {
    pub rows: usize,
    pub cols: usize,
    pub temperature: f64,
    pub j_coupling: f64,
    pub boltzmann: f64,
    /// Sweeps discarded before the first measurement.
    pub burn_period: usize,
    /// Sweeps run after the burn period.
    pub sweeps: usize,
    pub measurement_interval: usize,
    pub dynamics: Dynamics,
    pub error_method: ErrorMethod,
    pub bootstrap_iterations: usize,
    /// Lags `0..autocorrelation_range` are reported.
    pub autocorrelation_range: usize,
    /// `None` picks a default from the dynamics and temperature.
    pub initial_state: Option<InitialState>,
    /// Record `|M|` instead of the signed magnetisation.
    pub absolute_magnetisation: bool,
    /// `None` seeds from the OS.
    pub seed: Option<u64>,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            rows: 50,
            cols: 50,
            temperature: 1.0,
            j_coupling: 1.0,
            boltzmann: 1.0,
            burn_period: 100,
            sweeps: 10_000,
            measurement_interval: 10,
            dynamics: Dynamics::Glauber,
            error_method: ErrorMethod::Bootstrap,
            bootstrap_iterations: DEFAULT_BOOTSTRAP_ITERATIONS,
            autocorrelation_range: 100,
            initial_state: None,
            absolute_magnetisation: false,
            seed: None,
        }
    }
}

impl SimulationConfig {
    /// Fail fast on anything that would make the run or its analysis meaningless.
    pub fn validate(&self) -> Result<()> {
        if self.rows < 2 || self.cols < 2 {
            return Err(IsingError::DegenerateLattice {
                rows: self.rows,
                cols: self.cols,
            });
        }
        require_positive("temperature", self.temperature)?;
        require_positive("boltzmann constant", self.boltzmann)?;
        if !self.j_coupling.is_finite() {
            return Err(IsingError::InvalidParameter {
                name: "J constant",
                value: self.j_coupling,
            });
        }
        if self.measurement_interval == 0 {
            return Err(IsingError::InvalidConfig(
                "measurement interval must be at least 1".to_string(),
            ));
        }
        // Jackknifed variances are taken over N - 1 samples.
        let required = match self.error_method {
            ErrorMethod::Jackknife => 3,
            ErrorMethod::Naive | ErrorMethod::Bootstrap => 2,
        };
        if self.sample_count() < required {
            return Err(IsingError::InvalidConfig(format!(
                "{} sweeps at interval {} give {} sample(s), {} errors need at least {}",
                self.sweeps,
                self.measurement_interval,
                self.sample_count(),
                self.error_method,
                required
            )));
        }
        if self.error_method == ErrorMethod::Bootstrap && self.bootstrap_iterations == 0 {
            return Err(IsingError::InvalidConfig(
                "bootstrap needs at least one iteration".to_string(),
            ));
        }
        if self.autocorrelation_range == 0 {
            return Err(IsingError::InvalidConfig(
                "autocorrelation range must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// Measurements taken: sweeps `burn_period + k · interval` for `k ≥ 0`.
    pub fn sample_count(&self) -> usize {
        if self.measurement_interval == 0 {
            return 0;
        }
        self.sweeps.div_ceil(self.measurement_interval)
    }

    pub fn site_count(&self) -> usize {
        self.rows * self.cols
    }

    /// The explicit initial state, or Aligned for Glauber and Striped/Random
    /// (below/above `T = 1.5`) for Kawasaki.
    pub fn resolved_initial_state(&self) -> InitialState {
        match (self.initial_state, self.dynamics) {
            (Some(state), _) => state,
            (None, Dynamics::Glauber) => InitialState::Aligned,
            (None, Dynamics::Kawasaki) if self.temperature < STRIPED_START_BELOW => InitialState::Striped,
            (None, Dynamics::Kawasaki) => InitialState::Random,
        }
    }
}

fn row(f: &mut fmt::Formatter<'_>, label: &str, value: impl fmt::Display) -> fmt::Result {
    writeln!(f, "{:<width$}{}", label, value, width = LABEL_WIDTH)
}

impl fmt::Display for SimulationConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Input Parameters...")?;
        row(f, "Rows: ", self.rows)?;
        row(f, "Columns: ", self.cols)?;
        row(f, "Dynamics: ", self.dynamics)?;
        row(f, "Initial State: ", self.resolved_initial_state())?;
        row(f, "Temperature: ", self.temperature)?;
        row(f, "J: ", self.j_coupling)?;
        row(f, "K_B: ", self.boltzmann)?;
        row(f, "Burn Period: ", self.burn_period)?;
        row(f, "Sweeps: ", self.sweeps)?;
        row(f, "Measurement Interval: ", self.measurement_interval)?;
        row(f, "Error Method: ", self.error_method)?;
        if self.error_method == ErrorMethod::Bootstrap {
            row(f, "Bootstrap Iterations: ", self.bootstrap_iterations)?;
        }
        row(f, "Autocorrelation Range: ", self.autocorrelation_range)?;
        match self.seed {
            Some(seed) => row(f, "Seed: ", seed),
            None => row(f, "Seed: ", "entropy"),
        }
    }
}

/// Final estimates of one run.
#[derive(Debug, Clone, PartialEq)]
pub struct SimulationResults {
    pub energy: Estimate,
    pub magnetisation: Estimate,
    /// Per site.
    pub heat_capacity: Estimate,
    /// Per site.
    pub susceptibility: Estimate,
    /// Lags `0..range`; empty when the energy series has zero variance.
    pub energy_autocorrelation: Vec<f64>,
    /// Lags `0..range`; empty when the magnetisation series has zero variance.
    pub magnetisation_autocorrelation: Vec<f64>,
    pub samples: usize,
    pub acceptance_rate: f64,
}

impl fmt::Display for SimulationResults {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Results...")?;
        row(f, "E: ", self.energy)?;
        row(f, "M: ", self.magnetisation)?;
        row(f, "X: ", self.susceptibility)?;
        row(f, "C: ", self.heat_capacity)?;
        row(f, "Samples: ", self.samples)?;
        row(f, "Acceptance Rate: ", format!("{:.4}", self.acceptance_rate))
    }
}

/// One Markov chain: owns the lattice, the generator and the two sample series.
pub struct Simulation {
    config: SimulationConfig,
    lattice: SpinLattice,
    metropolis: Metropolis,
    rng: ChaCha20Rng,
    energy: SampleSeries,
    magnetisation: SampleSeries,
    attempted: u64,
    accepted: u64,
}

impl Simulation {
    /// Validate the configuration, seed the generator and prepare the lattice.
    pub fn new(config: SimulationConfig) -> Result<Self> {
        let rng = match config.seed {
            Some(seed) => ChaCha20Rng::seed_from_u64(seed),
            None => ChaCha20Rng::from_entropy(),
        };
        Self::with_rng(config, rng)
    }

    /// Like [`new`](Self::new) with a caller-supplied generator.
    pub fn with_rng(config: SimulationConfig, mut rng: ChaCha20Rng) -> Result<Self> {
        config.validate()?;
        let metropolis = Metropolis::new(config.boltzmann, config.temperature)?;

        let mut lattice = SpinLattice::new(config.rows, config.cols)?;
        match config.resolved_initial_state() {
            InitialState::Aligned => {}
            InitialState::Random => lattice.randomise(&mut rng),
            InitialState::Striped => lattice.set_even_spins(),
        }

        let capacity = config.sample_count();
        Ok(Self {
            config,
            lattice,
            metropolis,
            rng,
            energy: SampleSeries::with_capacity(capacity),
            magnetisation: SampleSeries::with_capacity(capacity),
            attempted: 0,
            accepted: 0,
        })
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    pub fn lattice(&self) -> &SpinLattice {
        &self.lattice
    }

    pub fn energy_series(&self) -> &SampleSeries {
        &self.energy
    }

    pub fn magnetisation_series(&self) -> &SampleSeries {
        &self.magnetisation
    }

    pub fn acceptance_rate(&self) -> f64 {
        if self.attempted == 0 {
            0.0
        } else {
            self.accepted as f64 / self.attempted as f64
        }
    }

    /// Run every sweep, then compute the estimates.
    pub fn run(&mut self) -> Result<SimulationResults> {
        self.run_with(|_, _| {})
    }

    /// Run every sweep, calling `on_sweep(sweep, lattice)` after each one.
    pub fn run_with<F>(&mut self, mut on_sweep: F) -> Result<SimulationResults>
    where
        F: FnMut(usize, &SpinLattice),
    {
        let cfg = &self.config;
        let total = cfg.burn_period + cfg.sweeps;
        info!(
            "running {} sweeps ({} burn-in) of {} dynamics on a {}x{} lattice at T = {} (kT = {})",
            total,
            cfg.burn_period,
            cfg.dynamics,
            cfg.rows,
            cfg.cols,
            cfg.temperature,
            self.metropolis.kt()
        );

        for sweep in 0..total {
            self.sweep();
            if self.is_measurement_sweep(sweep) {
                self.measure(sweep);
            }
            on_sweep(sweep, &self.lattice);
        }

        info!(
            "collected {} samples, acceptance rate {:.4}",
            self.energy.len(),
            self.acceptance_rate()
        );
        self.results()
    }

    /// One proposal per site.
    pub fn sweep(&mut self) {
        let stats = self.config.dynamics.sweep(
            &mut self.lattice,
            self.config.j_coupling,
            &self.metropolis,
            &mut self.rng,
        );
        self.attempted += stats.attempted as u64;
        self.accepted += stats.accepted as u64;
    }

    fn is_measurement_sweep(&self, sweep: usize) -> bool {
        sweep >= self.config.burn_period
            && (sweep - self.config.burn_period) % self.config.measurement_interval == 0
    }

    fn measure(&mut self, sweep: usize) {
        let energy = self.lattice.lattice_energy(self.config.j_coupling);
        let mut magnetisation = self.lattice.total_magnetisation() as f64;
        if self.config.absolute_magnetisation {
            magnetisation = magnetisation.abs();
        }
        debug!("sweep {}: E = {}, M = {}", sweep, energy, magnetisation);
        self.energy.push(energy);
        self.magnetisation.push(magnetisation);
    }

    /// Estimates from the samples collected so far.
    ///
    /// Heat capacity and susceptibility are divided by the number of sites.
    /// Bootstrap resampling draws from the simulation's own generator.
    pub fn results(&mut self) -> Result<SimulationResults> {
        let cfg = &self.config;
        let sites = cfg.site_count() as f64;
        let method = cfg.error_method;
        let iterations = cfg.bootstrap_iterations;

        let energy = Mean.estimate(&self.energy, method, iterations, &mut self.rng)?;
        let magnetisation = Mean.estimate(&self.magnetisation, method, iterations, &mut self.rng)?;

        let heat_capacity = HeatCapacity::new(cfg.boltzmann, cfg.temperature)?
            .estimate(&self.energy, method, iterations, &mut self.rng)?
            / sites;
        let susceptibility = Susceptibility::new(cfg.boltzmann, cfg.temperature)?
            .estimate(&self.magnetisation, method, iterations, &mut self.rng)?
            / sites;

        let lags = 0..cfg.autocorrelation_range;
        let energy_autocorrelation = autocorrelation_or_empty("energy", &self.energy, lags.clone())?;
        let magnetisation_autocorrelation =
            autocorrelation_or_empty("magnetisation", &self.magnetisation, lags)?;

        Ok(SimulationResults {
            energy,
            magnetisation,
            heat_capacity,
            susceptibility,
            energy_autocorrelation,
            magnetisation_autocorrelation,
            samples: self.energy.len(),
            acceptance_rate: self.acceptance_rate(),
        })
    }
}

/// A constant series (e.g. a frozen low-temperature chain) has no
/// autocorrelation; report it as empty rather than failing the whole run.
fn autocorrelation_or_empty(
    name: &str,
    series: &SampleSeries,
    lags: std::ops::Range<usize>,
) -> Result<Vec<f64>> {
    match series.autocorrelation_range(lags) {
        Ok(values) => Ok(values),
        Err(IsingError::ZeroVariance { .. }) => {
            warn!("{} series has zero variance, autocorrelation skipped", name);
            Ok(Vec::new())
        }
        Err(e) => Err(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let cfg = SimulationConfig::default();
        cfg.validate().unwrap();
        assert_eq!(cfg.sample_count(), 1000);
        assert_eq!(cfg.resolved_initial_state(), InitialState::Aligned);
    }

    #[test]
    fn sample_count_rounds_up() {
        let cfg = SimulationConfig {
            sweeps: 25,
            measurement_interval: 10,
            ..SimulationConfig::default()
        };
        assert_eq!(cfg.sample_count(), 3);
    }

    #[test]
    fn invalid_configs_fail_fast() {
        let base = SimulationConfig::default();
        let cases = [
            SimulationConfig { rows: 1, ..base.clone() },
            SimulationConfig { temperature: 0.0, ..base.clone() },
            SimulationConfig { boltzmann: 0.0, ..base.clone() },
            SimulationConfig { measurement_interval: 0, ..base.clone() },
            SimulationConfig { sweeps: 1, ..base.clone() },
            SimulationConfig { bootstrap_iterations: 0, ..base.clone() },
            SimulationConfig { autocorrelation_range: 0, ..base.clone() },
            SimulationConfig {
                sweeps: 2,
                measurement_interval: 1,
                error_method: ErrorMethod::Jackknife,
                ..base.clone()
            },
        ];
        for cfg in cases {
            assert!(Simulation::new(cfg).is_err());
        }
    }

    #[test]
    fn jackknife_needs_three_samples_before_running() {
        let two = SimulationConfig {
            rows: 4,
            cols: 4,
            burn_period: 50_000,
            sweeps: 2,
            measurement_interval: 1,
            error_method: ErrorMethod::Jackknife,
            seed: Some(2),
            ..SimulationConfig::default()
        };
        assert!(matches!(two.validate(), Err(IsingError::InvalidConfig(_))));
        assert!(SimulationConfig { error_method: ErrorMethod::Naive, ..two.clone() }
            .validate()
            .is_ok());

        let three = SimulationConfig { sweeps: 3, burn_period: 10, ..two };
        let mut sim = Simulation::new(three).unwrap();
        let res = sim.run().unwrap();
        assert_eq!(res.samples, 3);
    }

    #[test]
    fn kawasaki_start_depends_on_temperature() {
        let cold = SimulationConfig {
            dynamics: Dynamics::Kawasaki,
            temperature: 1.0,
            ..SimulationConfig::default()
        };
        let hot = SimulationConfig { temperature: 3.0, ..cold.clone() };
        assert_eq!(cold.resolved_initial_state(), InitialState::Striped);
        assert_eq!(hot.resolved_initial_state(), InitialState::Random);
    }

    #[test]
    fn measurements_start_right_after_burn_in() {
        let cfg = SimulationConfig {
            rows: 4,
            cols: 4,
            burn_period: 7,
            sweeps: 20,
            measurement_interval: 5,
            seed: Some(1),
            ..SimulationConfig::default()
        };
        let mut sim = Simulation::new(cfg).unwrap();
        let mut visited = Vec::new();
        sim.run_with(|sweep, _| visited.push(sweep)).unwrap();
        assert_eq!(visited.len(), 27);
        assert_eq!(sim.energy_series().len(), 4);
        assert!(sim.is_measurement_sweep(7));
        assert!(sim.is_measurement_sweep(22));
        assert!(!sim.is_measurement_sweep(6));
        assert!(!sim.is_measurement_sweep(8));
    }

    #[test]
    fn tables_label_every_row() {
        let text = SimulationConfig::default().to_string();
        assert!(text.starts_with("Input Parameters..."));
        assert!(text.contains("Dynamics: "));
        assert!(text.contains("Glauber"));
    }
}
