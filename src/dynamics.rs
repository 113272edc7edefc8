// dynamics.rs - Single-flip (Glauber) and pair-exchange (Kawasaki) proposals

use std::fmt;
use std::str::FromStr;

use rand::Rng;

use crate::error::IsingError;
use crate::lattice::SpinLattice;
use crate::metropolis::Metropolis;

/// Markov-chain update rule.
///
/// Both rules draw coordinates, mutate the lattice, compute the local energy
/// change, run the Metropolis test and undo the mutation on rejection. Random
/// numbers are consumed in a fixed order (row, col, [row, col ...], acceptance)
/// so a seeded generator reproduces the trajectory exactly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Dynamics {
    /// Flip one uniformly chosen spin. Magnetisation is not conserved.
    #[default]
    Glauber,
    /// Exchange two distinct uniformly chosen spins. Magnetisation is conserved.
    Kawasaki,
}

/// Tally of one sweep.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepStats {
    pub attempted: usize,
    pub accepted: usize,
}

impl SweepStats {
    pub fn acceptance_rate(&self) -> f64 {
        if self.attempted == 0 {
            0.0
        } else {
            self.accepted as f64 / self.attempted as f64
        }
    }
}

#[inline]
fn random_site<R: Rng + ?Sized>(lattice: &SpinLattice, rng: &mut R) -> (isize, isize) {
    let row = rng.gen_range(0..lattice.rows()) as isize;
    let col = rng.gen_range(0..lattice.cols()) as isize;
    (row, col)
}

/// One single-spin-flip proposal. Returns whether it was accepted.
pub fn glauber_step<R: Rng + ?Sized>(
    lattice: &mut SpinLattice,
    j_coupling: f64,
    metropolis: &Metropolis,
    rng: &mut R,
) -> bool {
    let (row, col) = random_site(lattice, rng);

    // Only the four bonds of this site change.
    let before = lattice.site_energy(row, col, j_coupling);
    lattice.flip(row, col);
    let after = lattice.site_energy(row, col, j_coupling);

    if metropolis.test(before, after, rng) {
        true
    } else {
        lattice.flip(row, col);
        false
    }
}

/// One pair-exchange proposal. Returns whether it was accepted.
///
/// The second site is redrawn until it differs from the first; lattice
/// construction guarantees at least four sites, so the loop terminates.
pub fn kawasaki_step<R: Rng + ?Sized>(
    lattice: &mut SpinLattice,
    j_coupling: f64,
    metropolis: &Metropolis,
    rng: &mut R,
) -> bool {
    let (row1, col1) = random_site(lattice, rng);
    let (row2, col2) = loop {
        let site = random_site(lattice, rng);
        if site != (row1, col1) {
            break site;
        }
    };

    let before = lattice.site_pair_energy(row1, col1, row2, col2, j_coupling);
    lattice.swap(row1, col1, row2, col2);
    let after = lattice.site_pair_energy(row1, col1, row2, col2, j_coupling);

    if metropolis.test(before, after, rng) {
        true
    } else {
        lattice.swap(row1, col1, row2, col2);
        false
    }
}

impl Dynamics {
    /// Attempt a single move. A rejection leaves the lattice untouched and is
    /// still one step of the chain.
    pub fn propose<R: Rng + ?Sized>(
        &self,
        lattice: &mut SpinLattice,
        j_coupling: f64,
        metropolis: &Metropolis,
        rng: &mut R,
    ) -> bool {
        match self {
            Dynamics::Glauber => glauber_step(lattice, j_coupling, metropolis, rng),
            Dynamics::Kawasaki => kawasaki_step(lattice, j_coupling, metropolis, rng),
        }
    }

    /// One proposal per lattice site.
    pub fn sweep<R: Rng + ?Sized>(
        &self,
        lattice: &mut SpinLattice,
        j_coupling: f64,
        metropolis: &Metropolis,
        rng: &mut R,
    ) -> SweepStats {
        let attempted = lattice.size();
        let accepted = (0..attempted)
            .filter(|_| self.propose(lattice, j_coupling, metropolis, rng))
            .count();
        SweepStats { attempted, accepted }
    }
}

impl fmt::Display for Dynamics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Dynamics::Glauber => write!(f, "Glauber"),
            Dynamics::Kawasaki => write!(f, "Kawasaki"),
        }
    }
}

impl FromStr for Dynamics {
    type Err = IsingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "glauber" | "g" => Ok(Dynamics::Glauber),
            "kawasaki" | "k" => Ok(Dynamics::Kawasaki),
            _ => Err(IsingError::UnknownDynamics(s.to_string())),
        }
    }
}
