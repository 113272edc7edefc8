// metropolis.rs - Metropolis acceptance test

use rand::Rng;

use crate::error::{require_positive, Result};

/// Accept if `u <= min(1, exp(-(after - before) / kt))`.
///
/// Pure: the caller supplies the uniform draw `u` in [0, 1).
#[inline]
pub fn accept(energy_before: f64, energy_after: f64, kt: f64, u: f64) -> bool {
    let delta = energy_after - energy_before;
    u <= (-delta / kt).exp().min(1.0)
}

/// Acceptance test at a fixed thermal energy `kT = k_B · T`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Metropolis {
    kt: f64,
}

impl Metropolis {
    /// Both constants must be positive; an infinite temperature is allowed and
    /// accepts every proposal.
    pub fn new(boltzmann: f64, temperature: f64) -> Result<Self> {
        let k = require_positive("boltzmann constant", boltzmann)?;
        let t = require_positive("temperature", temperature)?;
        Ok(Self { kt: k * t })
    }

    pub fn kt(&self) -> f64 {
        self.kt
    }

    /// Run the test with one fresh uniform draw.
    ///
    /// The draw is consumed even when the move lowers the energy, so the
    /// random stream advances identically whatever the outcome.
    pub fn test<R: Rng + ?Sized>(&self, energy_before: f64, energy_after: f64, rng: &mut R) -> bool {
        let u: f64 = rng.gen();
        accept(energy_before, energy_after, self.kt, u)
    }
}
