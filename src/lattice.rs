// lattice.rs - Ising spins on a periodic rows x cols grid

use std::fmt;

use rand::Rng;

use crate::error::{IsingError, Result};

/// Two-state rendering of a site. Internally every site is stored as ±1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Spin {
    Up,
    Down,
}

impl Spin {
    /// The ±1 value used in every energy formula.
    #[inline(always)]
    pub fn value(self) -> i8 {
        match self {
            Spin::Up => 1,
            Spin::Down => -1,
        }
    }

    pub fn from_value(value: i8) -> Option<Self> {
        match value {
            1 => Some(Spin::Up),
            -1 => Some(Spin::Down),
            _ => None,
        }
    }
}

impl fmt::Display for Spin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Spin::Up => write!(f, "+"),
            Spin::Down => write!(f, "-"),
        }
    }
}

/// Nearest-neighbour offsets (row, col): down, up, right, left.
const NEIGHBOURS: [(isize, isize); 4] = [(1, 0), (-1, 0), (0, 1), (0, -1)];

/// A rectangular torus of ±1 spins stored row-major.
///
/// Every coordinate is reduced with `rem_euclid`, so any `isize` pair
/// (negative or past the edge) addresses a valid site. Lattices narrower
/// than 2 in either direction are rejected: a site would be its own
/// neighbour and the energy bookkeeping would silently double count.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpinLattice {
    rows: usize,
    cols: usize,
    spins: Vec<i8>,
}

impl SpinLattice {
    /// Build a fully aligned (all up) lattice.
    pub fn new(rows: usize, cols: usize) -> Result<Self> {
        Self::check_dims(rows, cols)?;
        Ok(Self {
            rows,
            cols,
            spins: vec![1; rows * cols],
        })
    }

    /// Build a lattice from an explicit row-major configuration of ±1 values.
    pub fn from_spins(rows: usize, cols: usize, spins: Vec<i8>) -> Result<Self> {
        Self::check_dims(rows, cols)?;
        if spins.len() != rows * cols {
            return Err(IsingError::SpinCountMismatch {
                len: spins.len(),
                expected: rows * cols,
            });
        }
        if let Some((index, &value)) = spins
            .iter()
            .enumerate()
            .find(|&(_, &s)| Spin::from_value(s).is_none())
        {
            return Err(IsingError::InvalidSpin { index, value });
        }
        Ok(Self { rows, cols, spins })
    }

    fn check_dims(rows: usize, cols: usize) -> Result<()> {
        if rows < 2 || cols < 2 {
            return Err(IsingError::DegenerateLattice { rows, cols });
        }
        Ok(())
    }

    #[inline(always)]
    pub fn rows(&self) -> usize {
        self.rows
    }

    #[inline(always)]
    pub fn cols(&self) -> usize {
        self.cols
    }

    /// Number of sites.
    #[inline(always)]
    pub fn size(&self) -> usize {
        self.spins.len()
    }

    /// Row-major ±1 values.
    pub fn spins(&self) -> &[i8] {
        &self.spins
    }

    /// Flat index of a (possibly out-of-range) coordinate.
    #[inline(always)]
    fn index(&self, row: isize, col: isize) -> usize {
        let r = row.rem_euclid(self.rows as isize) as usize;
        let c = col.rem_euclid(self.cols as isize) as usize;
        r * self.cols + c
    }

    /// ±1 value of a site.
    #[inline(always)]
    pub fn get(&self, row: isize, col: isize) -> i8 {
        self.spins[self.index(row, col)]
    }

    pub fn spin(&self, row: isize, col: isize) -> Spin {
        if self.get(row, col) > 0 {
            Spin::Up
        } else {
            Spin::Down
        }
    }

    pub fn set(&mut self, row: isize, col: isize, spin: Spin) {
        let idx = self.index(row, col);
        self.spins[idx] = spin.value();
    }

    /// Reverse one spin.
    #[inline(always)]
    pub fn flip(&mut self, row: isize, col: isize) {
        let idx = self.index(row, col);
        self.spins[idx] = -self.spins[idx];
    }

    /// Exchange the states of two sites.
    ///
    /// Spins are binary, so an exchange is either a no-op (equal spins) or a
    /// flip of both sites. Swapping a site with itself leaves it unchanged.
    pub fn swap(&mut self, row1: isize, col1: isize, row2: isize, col2: isize) {
        let a = self.index(row1, col1);
        let b = self.index(row2, col2);
        if self.spins[a] != self.spins[b] {
            self.spins[a] = -self.spins[a];
            self.spins[b] = -self.spins[b];
        }
    }

    /// Draw every site independently: up or down with probability 1/2.
    pub fn randomise<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        for spin in self.spins.iter_mut() {
            *spin = if rng.gen_bool(0.5) { 1 } else { -1 };
        }
    }

    /// Zero-magnetisation ground state for conserved dynamics: the first half
    /// of the sites (row-major) up, the rest down.
    pub fn set_even_spins(&mut self) {
        let half = self.spins.len() / 2;
        for (i, spin) in self.spins.iter_mut().enumerate() {
            *spin = if i < half { 1 } else { -1 };
        }
    }

    /// Sum of s·s' over the four neighbours of a site.
    #[inline(always)]
    fn neighbour_sum(&self, row: isize, col: isize) -> i32 {
        NEIGHBOURS
            .iter()
            .map(|&(dr, dc)| self.get(row + dr, col + dc) as i32)
            .sum()
    }

    /// `-J · s · Σ_nn s'` over the four toroidal nearest neighbours.
    pub fn site_energy(&self, row: isize, col: isize, j_coupling: f64) -> f64 {
        let s = self.get(row, col) as i32;
        -j_coupling * (s * self.neighbour_sum(row, col)) as f64
    }

    /// How many of the four neighbour directions of site 1 land on site 2.
    ///
    /// 0 or 1 on lattices at least 3 wide; on a dimension of exactly 2 the
    /// "up" and "down" (or "left" and "right") neighbours coincide, so two
    /// distinct sites can share two bonds.
    pub fn shared_bonds(&self, row1: isize, col1: isize, row2: isize, col2: isize) -> usize {
        let target = self.index(row2, col2);
        if self.index(row1, col1) == target {
            return 0;
        }
        NEIGHBOURS
            .iter()
            .filter(|&&(dr, dc)| self.index(row1 + dr, col1 + dc) == target)
            .count()
    }

    /// Wrap-aware adjacency test on coordinates (never on spin values).
    pub fn nearest_neighbours(&self, row1: isize, col1: isize, row2: isize, col2: isize) -> bool {
        self.shared_bonds(row1, col1, row2, col2) > 0
    }

    /// Energy of every bond touching either site, each bond counted once.
    ///
    /// Same site: the site energy. Adjacent sites: both site energies minus the
    /// bond(s) they share, which would otherwise be counted twice. Otherwise the
    /// plain sum.
    pub fn site_pair_energy(
        &self,
        row1: isize,
        col1: isize,
        row2: isize,
        col2: isize,
        j_coupling: f64,
    ) -> f64 {
        if self.index(row1, col1) == self.index(row2, col2) {
            return self.site_energy(row1, col1, j_coupling);
        }
        let sum = self.site_energy(row1, col1, j_coupling) + self.site_energy(row2, col2, j_coupling);
        let shared = self.shared_bonds(row1, col1, row2, col2);
        if shared == 0 {
            return sum;
        }
        let bond = -j_coupling * (self.get(row1, col1) as i32 * self.get(row2, col2) as i32) as f64;
        sum - shared as f64 * bond
    }

    /// `-J · Σ s·(s_right + s_down)`: each periodic bond exactly once. O(rows·cols).
    pub fn lattice_energy(&self, j_coupling: f64) -> f64 {
        let mut sum: i64 = 0;
        for row in 0..self.rows as isize {
            for col in 0..self.cols as isize {
                let s = self.get(row, col) as i64;
                sum += s * (self.get(row, col + 1) as i64 + self.get(row + 1, col) as i64);
            }
        }
        -j_coupling * sum as f64
    }

    /// Signed sum of all spins.
    pub fn total_magnetisation(&self) -> i64 {
        self.spins.iter().map(|&s| s as i64).sum()
    }
}

impl fmt::Display for SpinLattice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for row in 0..self.rows as isize {
            for col in 0..self.cols as isize {
                if col > 0 {
                    write!(f, " ")?;
                }
                write!(f, "{}", self.spin(row, col))?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}
