pub mod error;
pub mod lattice;
pub mod metropolis;
pub mod dynamics;
pub mod sample_series;
pub mod estimate;
pub mod observables;
pub mod simulation;
pub mod report;
pub mod utils;

pub use dynamics::{Dynamics, SweepStats};
pub use error::{IsingError, Result};
pub use estimate::Estimate;
pub use lattice::{Spin, SpinLattice};
pub use metropolis::Metropolis;
pub use observables::{ErrorMethod, HeatCapacity, Mean, Observable, Susceptibility};
pub use sample_series::{SampleSeries, DEFAULT_BOOTSTRAP_ITERATIONS};
pub use simulation::{InitialState, Simulation, SimulationConfig, SimulationResults};
