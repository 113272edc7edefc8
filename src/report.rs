// report.rs - Run directory and result files

use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use csv::WriterBuilder;

use crate::lattice::SpinLattice;
use crate::sample_series::SampleSeries;
use crate::simulation::{SimulationConfig, SimulationResults};

/// Highest index suffix tried before giving up on a fresh directory name.
const MAX_SUFFIX: usize = 100;

/// `run_<seconds since the Unix epoch>`
pub fn timestamp_name() -> String {
    let secs = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0);
    format!("run_{}", secs)
}

/// Create `base`, or `base(2)`, `base(3)`, ... if it already exists.
pub fn create_run_directory(base: &Path) -> io::Result<PathBuf> {
    let mut path = base.to_path_buf();
    let mut index = 2;
    while path.exists() {
        if index > MAX_SUFFIX {
            return Err(io::Error::new(
                io::ErrorKind::AlreadyExists,
                format!("no free directory name for {}", base.display()),
            ));
        }
        path = PathBuf::from(format!("{}({})", base.display(), index));
        index += 1;
    }
    fs::create_dir_all(&path)?;
    Ok(path)
}

/// `index,value` rows.
pub fn write_series(path: &Path, series: &SampleSeries) -> Result<(), Box<dyn std::error::Error>> {
    let mut wtr = WriterBuilder::new().from_path(path)?;
    wtr.write_record(["index", "value"])?;
    for (i, x) in series.iter().enumerate() {
        wtr.write_record([i.to_string(), x.to_string()])?;
    }
    wtr.flush()?;
    Ok(())
}

/// `lag,value` rows.
pub fn write_autocorrelation(path: &Path, values: &[f64]) -> Result<(), Box<dyn std::error::Error>> {
    let mut wtr = WriterBuilder::new().from_path(path)?;
    wtr.write_record(["lag", "value"])?;
    for (lag, x) in values.iter().enumerate() {
        wtr.write_record([lag.to_string(), x.to_string()])?;
    }
    wtr.flush()?;
    Ok(())
}

/// Overwrite `path` with the current configuration.
pub fn write_lattice(path: &Path, lattice: &SpinLattice) -> io::Result<()> {
    let mut file = File::create(path)?;
    write!(file, "{}", lattice)?;
    file.flush()
}

/// Every output file of a finished run.
pub struct RunReport<'a> {
    pub config: &'a SimulationConfig,
    pub results: &'a SimulationResults,
    pub energy: &'a SampleSeries,
    pub magnetisation: &'a SampleSeries,
    pub final_lattice: &'a SpinLattice,
}

impl RunReport<'_> {
    pub fn write_to(&self, dir: &Path) -> Result<(), Box<dyn std::error::Error>> {
        fs::write(dir.join("input.txt"), self.config.to_string())?;
        fs::write(dir.join("results.txt"), self.results.to_string())?;
        write_series(&dir.join("energy.csv"), self.energy)?;
        write_series(&dir.join("magnetisation.csv"), self.magnetisation)?;
        write_autocorrelation(
            &dir.join("energy_autocorrelation.csv"),
            &self.results.energy_autocorrelation,
        )?;
        write_autocorrelation(
            &dir.join("magnetisation_autocorrelation.csv"),
            &self.results.magnetisation_autocorrelation,
        )?;
        write_lattice(&dir.join("spins.dat"), self.final_lattice)?;
        Ok(())
    }
}
