// observables.rs - Derived thermodynamic quantities of a sample series

use std::fmt;
use std::str::FromStr;

use rand::Rng;

use crate::error::{require_positive, IsingError, Result};
use crate::estimate::Estimate;
use crate::sample_series::SampleSeries;

/// Resampling scheme used for the error of a derived observable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ErrorMethod {
    /// Standard error of the per-sample terms, assuming independence.
    Naive,
    Jackknife,
    #[default]
    Bootstrap,
}

impl fmt::Display for ErrorMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorMethod::Naive => write!(f, "Naive"),
            ErrorMethod::Bootstrap => write!(f, "Bootstrap"),
            ErrorMethod::Jackknife => write!(f, "Jackknife"),
        }
    }
}

impl FromStr for ErrorMethod {
    type Err = IsingError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "naive" => Ok(ErrorMethod::Naive),
            "bootstrap" => Ok(ErrorMethod::Bootstrap),
            "jackknife" | "jack-knife" => Ok(ErrorMethod::Jackknife),
            _ => Err(IsingError::UnknownErrorMethod(s.to_string())),
        }
    }
}

/// A scalar function of a whole sample series.
///
/// The same function gives the point value and, through
/// [`SampleSeries::jackknife`] / [`SampleSeries::bootstrap`], its error.
pub trait Observable {
    fn evaluate(&self, series: &SampleSeries) -> Result<f64>;

    /// Naive standard error, for observables that are the mean of a
    /// per-sample term.
    fn naive_error(&self, _series: &SampleSeries) -> Result<f64> {
        Err(IsingError::NoNaiveError("whole-series statistic"))
    }

    /// Point value with a resampled error.
    fn estimate<R: Rng + ?Sized>(
        &self,
        series: &SampleSeries,
        method: ErrorMethod,
        iterations: usize,
        rng: &mut R,
    ) -> Result<Estimate>
    where
        Self: Sized,
    {
        let value = self.evaluate(series)?;
        let error = match method {
            ErrorMethod::Naive => self.naive_error(series)?,
            ErrorMethod::Jackknife => series.jackknife(|s| self.evaluate(s))?,
            ErrorMethod::Bootstrap => series.bootstrap(|s| self.evaluate(s), rng, iterations)?,
        };
        Ok(Estimate::new(value, error))
    }
}

impl<F> Observable for F
where
    F: Fn(&SampleSeries) -> Result<f64>,
{
    fn evaluate(&self, series: &SampleSeries) -> Result<f64> {
        self(series)
    }
}

/// The sample mean.
#[derive(Debug, Clone, Copy, Default)]
pub struct Mean;

impl Observable for Mean {
    fn evaluate(&self, series: &SampleSeries) -> Result<f64> {
        series.mean()
    }

    fn naive_error(&self, series: &SampleSeries) -> Result<f64> {
        series.error()
    }
}

/// `C = var(E) / (k_B · T²)` from a series of total energies.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HeatCapacity {
    boltzmann: f64,
    temperature: f64,
}

impl HeatCapacity {
    pub fn new(boltzmann: f64, temperature: f64) -> Result<Self> {
        Ok(Self {
            boltzmann: require_positive("boltzmann constant", boltzmann)?,
            temperature: require_positive("temperature", temperature)?,
        })
    }
}

impl Observable for HeatCapacity {
    fn evaluate(&self, series: &SampleSeries) -> Result<f64> {
        Ok(series.variance()? / (self.boltzmann * self.temperature * self.temperature))
    }

    /// Spread of `(E - <E>)² / (k_B · T²)`, whose mean is the point value.
    fn naive_error(&self, series: &SampleSeries) -> Result<f64> {
        let mean = series.mean()?;
        let scale = self.boltzmann * self.temperature * self.temperature;
        series.error_with(|e| (e - mean).powi(2) / scale)
    }
}

/// `χ = var(M) / (k_B · T)` from a series of total magnetisations.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Susceptibility {
    boltzmann: f64,
    temperature: f64,
}

impl Susceptibility {
    pub fn new(boltzmann: f64, temperature: f64) -> Result<Self> {
        Ok(Self {
            boltzmann: require_positive("boltzmann constant", boltzmann)?,
            temperature: require_positive("temperature", temperature)?,
        })
    }
}

impl Observable for Susceptibility {
    fn evaluate(&self, series: &SampleSeries) -> Result<f64> {
        Ok(series.variance()? / (self.boltzmann * self.temperature))
    }

    fn naive_error(&self, series: &SampleSeries) -> Result<f64> {
        let mean = series.mean()?;
        let kt = self.boltzmann * self.temperature;
        series.error_with(|m| (m - mean).powi(2) / kt)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_method_round_trips_through_strings() {
        assert_eq!("jackknife".parse::<ErrorMethod>(), Ok(ErrorMethod::Jackknife));
        assert_eq!("Bootstrap".parse::<ErrorMethod>(), Ok(ErrorMethod::Bootstrap));
        assert!("binning".parse::<ErrorMethod>().is_err());
    }

    #[test]
    fn constants_must_be_positive() {
        assert!(HeatCapacity::new(0.0, 1.0).is_err());
        assert!(HeatCapacity::new(1.0, 0.0).is_err());
        assert!(Susceptibility::new(1.0, -2.0).is_err());
        assert!(Susceptibility::new(f64::NAN, 1.0).is_err());
    }

    #[test]
    fn naive_error_uses_per_sample_terms() {
        let series: SampleSeries = vec![1.0, 2.0, 3.0, 4.0].into();
        let chi = Susceptibility::new(1.0, 1.0).unwrap();
        let mut rng = rand::thread_rng();
        let est = chi.estimate(&series, ErrorMethod::Naive, 0, &mut rng).unwrap();
        assert_eq!(est.mean(), 1.25);
        // Terms 2.25, 0.25, 0.25, 2.25: variance 1, N - 1 = 3.
        assert!((est.error() - (1.0f64 / 3.0).sqrt()).abs() < 1e-12);
    }

    #[test]
    fn closures_have_no_naive_error() {
        let series: SampleSeries = vec![1.0, 2.0, 3.0].into();
        let sum = |s: &SampleSeries| -> Result<f64> { Ok(s.sum()) };
        assert!(matches!(sum.naive_error(&series), Err(IsingError::NoNaiveError(_))));
    }

    #[test]
    fn closures_are_observables() {
        let series: SampleSeries = vec![1.0, 2.0, 3.0].into();
        let max = |s: &SampleSeries| -> Result<f64> { Ok(s.iter().copied().fold(f64::MIN, f64::max)) };
        assert_eq!(max.evaluate(&series).unwrap(), 3.0);
    }
}
