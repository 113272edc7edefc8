// sample_series.rs - Ordered Monte Carlo measurements and their error estimators

use std::fmt;
use std::ops::{Index, Range};

use rand::Rng;

use crate::error::{IsingError, Result};
use crate::estimate::Estimate;

/// Resamples drawn by [`SampleSeries::bootstrap_error`] when the caller has no preference.
pub const DEFAULT_BOOTSTRAP_ITERATIONS: usize = 100;

#[inline(always)]
fn identity(x: f64) -> f64 {
    x
}

/// `sqrt(n · var(θ))` over a set of leave-one-out estimates.
fn jackknife_spread(estimates: &[f64]) -> f64 {
    let mut spread = Spread::default();
    estimates.iter().for_each(|&e| spread.push(e));
    (estimates.len() as f64 * spread.variance()).sqrt()
}

/// Running mean and variance, accumulated relative to the first value so
/// that identical inputs give exactly zero spread.
#[derive(Default)]
struct Spread {
    count: usize,
    shift: f64,
    sum: f64,
    sum_sq: f64,
}

impl Spread {
    fn push(&mut self, value: f64) {
        if self.count == 0 {
            self.shift = value;
        }
        let d = value - self.shift;
        self.count += 1;
        self.sum += d;
        self.sum_sq += d * d;
    }

    fn mean(&self) -> f64 {
        self.shift + self.sum / self.count as f64
    }

    /// Population variance of the pushed values.
    fn variance(&self) -> f64 {
        let k = self.count as f64;
        let d_mean = self.sum / k;
        (self.sum_sq / k - d_mean * d_mean).max(0.0)
    }

    fn std_dev(&self) -> f64 {
        self.variance().sqrt()
    }
}

/// Append-only (plus `pop`) sequence of scalar measurements, one per
/// measurement sweep, in the order they were taken.
///
/// Every aggregate has a `_with` form that applies a scalar transform to each
/// sample before aggregating. Anything built on a variance needs at least two
/// samples and returns [`IsingError::InsufficientSamples`] otherwise.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SampleSeries {
    samples: Vec<f64>,
}

impl SampleSeries {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            samples: Vec::with_capacity(capacity),
        }
    }

    pub fn reserve(&mut self, additional: usize) {
        self.samples.reserve(additional);
    }

    pub fn push(&mut self, value: f64) {
        self.samples.push(value);
    }

    pub fn pop(&mut self) -> Option<f64> {
        self.samples.pop()
    }

    pub fn clear(&mut self) {
        self.samples.clear();
    }

    #[inline(always)]
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    #[inline(always)]
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.samples
    }

    pub fn iter(&self) -> std::slice::Iter<'_, f64> {
        self.samples.iter()
    }

    fn require(&self, statistic: &'static str, required: usize) -> Result<()> {
        if self.samples.len() < required {
            return Err(IsingError::InsufficientSamples {
                statistic,
                required,
                len: self.samples.len(),
            });
        }
        Ok(())
    }

    /// `(<f(x)>, var f(x))`; the caller has checked the series is non-empty.
    fn moments<F: Fn(f64) -> f64>(&self, f: &F) -> (f64, f64) {
        let mut spread = Spread::default();
        self.samples.iter().for_each(|&x| spread.push(f(x)));
        (spread.mean(), spread.variance())
    }

    pub fn sum(&self) -> f64 {
        self.sum_with(identity)
    }

    pub fn sum_with<F: Fn(f64) -> f64>(&self, f: F) -> f64 {
        self.samples.iter().map(|&x| f(x)).sum()
    }

    pub fn mean(&self) -> Result<f64> {
        self.mean_with(identity)
    }

    pub fn mean_with<F: Fn(f64) -> f64>(&self, f: F) -> Result<f64> {
        self.require("mean", 1)?;
        Ok(self.sum_with(f) / self.samples.len() as f64)
    }

    /// `<x²>`
    pub fn square_mean(&self) -> Result<f64> {
        self.mean_with(|x| x * x)
    }

    /// Population variance `<x²> - <x>²`.
    pub fn variance(&self) -> Result<f64> {
        self.variance_with(identity)
    }

    pub fn variance_with<F: Fn(f64) -> f64>(&self, f: F) -> Result<f64> {
        self.require("variance", 2)?;
        Ok(self.moments(&f).1)
    }

    /// Naive standard error of the mean, `sqrt((<x²> - <x>²) / (N - 1))`.
    ///
    /// Assumes independent samples, so it underestimates the error of
    /// autocorrelated chains.
    pub fn error(&self) -> Result<f64> {
        self.error_with(identity)
    }

    pub fn error_with<F: Fn(f64) -> f64>(&self, f: F) -> Result<f64> {
        self.require("standard error", 2)?;
        let n = self.samples.len() as f64;
        let variance = self.variance_with(f)?;
        Ok((variance / (n - 1.0)).sqrt())
    }

    /// Mean with its naive standard error.
    pub fn estimate(&self) -> Result<Estimate> {
        Ok(Estimate::new(self.mean()?, self.error()?))
    }

    /// Jackknife error of the mean.
    ///
    /// Leave-one-out means are `(total - x_i) / (N - 1)`; the error is
    /// `sqrt(N · variance of the leave-one-out means)`.
    pub fn jackknife_error(&self) -> Result<f64> {
        self.jackknife_error_with(identity)
    }

    pub fn jackknife_error_with<F: Fn(f64) -> f64>(&self, f: F) -> Result<f64> {
        self.require("jackknife error", 2)?;
        let n = self.samples.len();
        let values: Vec<f64> = self.samples.iter().map(|&x| f(x)).collect();
        let total: f64 = values.iter().sum();
        let reduced_means: Vec<f64> = values
            .iter()
            .map(|&y| (total - y) / (n - 1) as f64)
            .collect();
        Ok(jackknife_spread(&reduced_means))
    }

    /// Jackknife error of an arbitrary statistic of the series.
    ///
    /// `statistic` is evaluated on each of the N leave-one-out series. For the
    /// mean this reproduces [`jackknife_error`](Self::jackknife_error).
    pub fn jackknife<S>(&self, statistic: S) -> Result<f64>
    where
        S: Fn(&SampleSeries) -> Result<f64>,
    {
        self.require("jackknife error", 2)?;
        let n = self.samples.len();
        let mut reduced = SampleSeries::with_capacity(n - 1);
        let mut estimates = Vec::with_capacity(n);

        for i in 0..n {
            reduced.clear();
            for (j, &x) in self.samples.iter().enumerate() {
                if i != j {
                    reduced.push(x);
                }
            }
            estimates.push(statistic(&reduced)?);
        }

        Ok(jackknife_spread(&estimates))
    }

    /// Bootstrap error of the mean over `iterations` resamples.
    ///
    /// Each resample draws N samples with replacement; the result is the
    /// standard deviation of the resample means.
    pub fn bootstrap_error<R: Rng + ?Sized>(&self, rng: &mut R, iterations: usize) -> Result<f64> {
        self.bootstrap_error_with(identity, rng, iterations)
    }

    pub fn bootstrap_error_with<F, R>(&self, f: F, rng: &mut R, iterations: usize) -> Result<f64>
    where
        F: Fn(f64) -> f64,
        R: Rng + ?Sized,
    {
        self.require("bootstrap error", 2)?;
        check_iterations(iterations)?;
        let n = self.samples.len();
        let mut spread = Spread::default();

        for _ in 0..iterations {
            let mut sum = 0.0;
            for _ in 0..n {
                sum += f(self.samples[rng.gen_range(0..n)]);
            }
            spread.push(sum / n as f64);
        }

        Ok(spread.std_dev())
    }

    /// Bootstrap error of an arbitrary statistic of the series.
    pub fn bootstrap<S, R>(&self, statistic: S, rng: &mut R, iterations: usize) -> Result<f64>
    where
        S: Fn(&SampleSeries) -> Result<f64>,
        R: Rng + ?Sized,
    {
        self.require("bootstrap error", 2)?;
        check_iterations(iterations)?;
        let n = self.samples.len();
        let mut resample = SampleSeries::with_capacity(n);
        let mut spread = Spread::default();

        for _ in 0..iterations {
            resample.clear();
            for _ in 0..n {
                resample.push(self.samples[rng.gen_range(0..n)]);
            }
            spread.push(statistic(&resample)?);
        }

        Ok(spread.std_dev())
    }

    /// Normalised autocorrelation at `lag`, wrapping circularly:
    /// `(<x_i · x_{(i+lag) mod N}> - <x>²) / (<x²> - <x>²)`.
    pub fn autocorrelation(&self, lag: usize) -> Result<f64> {
        self.autocorrelation_with(lag, identity)
    }

    pub fn autocorrelation_with<F: Fn(f64) -> f64>(&self, lag: usize, f: F) -> Result<f64> {
        let values: Vec<f64> = self.samples.iter().map(|&x| f(x)).collect();
        let (mean, norm) = self.autocorrelation_norm(&f)?;
        Ok(circular_autocorrelation(&values, lag, mean, norm))
    }

    /// Autocorrelation for each lag in a half-open range.
    pub fn autocorrelation_range(&self, lags: Range<usize>) -> Result<Vec<f64>> {
        self.autocorrelation_range_with(lags, identity)
    }

    pub fn autocorrelation_range_with<F: Fn(f64) -> f64>(
        &self,
        lags: Range<usize>,
        f: F,
    ) -> Result<Vec<f64>> {
        let values: Vec<f64> = self.samples.iter().map(|&x| f(x)).collect();
        let (mean, norm) = self.autocorrelation_norm(&f)?;
        Ok(lags
            .map(|lag| circular_autocorrelation(&values, lag, mean, norm))
            .collect())
    }

    /// `(<x>, var x)`, failing on short or constant series.
    fn autocorrelation_norm<F: Fn(f64) -> f64>(&self, f: &F) -> Result<(f64, f64)> {
        self.require("autocorrelation", 2)?;
        let (mean, norm) = self.moments(f);
        if norm <= f64::EPSILON * mean * mean {
            return Err(IsingError::ZeroVariance {
                statistic: "autocorrelation",
            });
        }
        Ok((mean, norm))
    }
}

fn check_iterations(iterations: usize) -> Result<()> {
    if iterations == 0 {
        return Err(IsingError::InvalidConfig(
            "bootstrap needs at least one iteration".to_string(),
        ));
    }
    Ok(())
}

/// Centred form of `(<x_i · x_{i+lag}> - <x>²) / var x`; equal under circular wrap.
fn circular_autocorrelation(values: &[f64], lag: usize, mean: f64, norm: f64) -> f64 {
    let n = values.len();
    let covariance = (0..n)
        .map(|i| (values[i] - mean) * (values[(i + lag) % n] - mean))
        .sum::<f64>()
        / n as f64;
    covariance / norm
}

impl Index<usize> for SampleSeries {
    type Output = f64;

    fn index(&self, index: usize) -> &f64 {
        &self.samples[index]
    }
}

impl From<Vec<f64>> for SampleSeries {
    fn from(samples: Vec<f64>) -> Self {
        Self { samples }
    }
}

impl FromIterator<f64> for SampleSeries {
    fn from_iter<I: IntoIterator<Item = f64>>(iter: I) -> Self {
        Self {
            samples: iter.into_iter().collect(),
        }
    }
}

impl Extend<f64> for SampleSeries {
    fn extend<I: IntoIterator<Item = f64>>(&mut self, iter: I) {
        self.samples.extend(iter);
    }
}

impl<'a> IntoIterator for &'a SampleSeries {
    type Item = &'a f64;
    type IntoIter = std::slice::Iter<'a, f64>;

    fn into_iter(self) -> Self::IntoIter {
        self.samples.iter()
    }
}

impl fmt::Display for SampleSeries {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, x) in self.samples.iter().enumerate() {
            writeln!(f, "{} {}", i, x)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn series(values: &[f64]) -> SampleSeries {
        values.iter().copied().collect()
    }

    #[test]
    fn push_and_pop_keep_order() {
        let mut s = SampleSeries::with_capacity(4);
        s.push(1.0);
        s.push(2.0);
        s.push(3.0);
        assert_eq!(s.pop(), Some(3.0));
        assert_eq!(s.as_slice(), &[1.0, 2.0]);
        assert_eq!(s[1], 2.0);
    }

    #[test]
    fn mean_and_sum() {
        let s = series(&[1.0, 2.0, 3.0, 4.0]);
        assert_eq!(s.sum(), 10.0);
        assert_eq!(s.mean().unwrap(), 2.5);
        assert_eq!(s.square_mean().unwrap(), 7.5);
        assert_eq!(s.mean_with(|x| 2.0 * x).unwrap(), 5.0);
    }

    #[test]
    fn naive_error_matches_formula() {
        let s = series(&[1.0, 2.0, 3.0, 4.0]);
        // <x²> - <x>² = 1.25, N - 1 = 3
        assert!((s.error().unwrap() - (1.25f64 / 3.0).sqrt()).abs() < 1e-12);
    }

    #[test]
    fn short_series_fail() {
        let s = series(&[1.0]);
        assert!(matches!(
            s.error(),
            Err(IsingError::InsufficientSamples { required: 2, len: 1, .. })
        ));
        assert!(s.jackknife_error().is_err());
        assert!(s.variance().is_err());
        assert!(SampleSeries::new().mean().is_err());
    }

    #[test]
    fn jackknife_scales_leave_one_out_variance_by_n() {
        // Leave-one-out means are 3 and 1: variance 1, times N = 2.
        let s = series(&[1.0, 3.0]);
        assert!((s.jackknife_error().unwrap() - 2f64.sqrt()).abs() < 1e-12);
    }

    #[test]
    fn statistic_jackknife_agrees_with_mean_shortcut() {
        let s = series(&[0.3, 1.7, 2.2, -0.4, 5.0, 3.3]);
        let fast = s.jackknife_error().unwrap();
        let slow = s.jackknife(|r| r.mean()).unwrap();
        assert!((fast - slow).abs() < 1e-12);
    }

    #[test]
    fn non_integer_constants_have_exactly_zero_spread() {
        for &v in &[0.1, 0.7, -2.7, -5000.3, 1e-9] {
            for &n in &[3, 100, 1000] {
                let s: SampleSeries = std::iter::repeat(v).take(n).collect();
                assert_eq!(s.jackknife_error().unwrap(), 0.0, "v = {}, n = {}", v, n);
                assert_eq!(s.jackknife(|r| r.mean()).unwrap(), 0.0, "v = {}, n = {}", v, n);
                assert_eq!(s.variance().unwrap(), 0.0);
                assert_eq!(s.error().unwrap(), 0.0);
            }
        }
    }

    #[test]
    fn bootstrap_of_constant_series_is_zero() {
        use rand::SeedableRng;
        let mut rng = rand_chacha::ChaCha20Rng::seed_from_u64(3);
        let s: SampleSeries = std::iter::repeat(0.3).take(50).collect();
        assert_eq!(s.bootstrap_error(&mut rng, 20).unwrap(), 0.0);
        assert_eq!(s.bootstrap(|r| r.variance(), &mut rng, 20).unwrap(), 0.0);
    }

    #[test]
    fn transformed_autocorrelation_range_starts_at_one() {
        let s = series(&[0.3, 1.7, 2.2, -0.4, 5.0, 3.3]);
        let acf = s.autocorrelation_range_with(0..4, |x| x * x).unwrap();
        assert_eq!(acf.len(), 4);
        assert!((acf[0] - 1.0).abs() < 1e-12);
        for (lag, &value) in acf.iter().enumerate() {
            let single = s.autocorrelation_with(lag, |x| x * x).unwrap();
            assert!((value - single).abs() < 1e-12);
        }
        // Differs from the untransformed function.
        let plain = s.autocorrelation_range(0..4).unwrap();
        assert!((acf[1] - plain[1]).abs() > 1e-6);
    }

    #[test]
    fn constant_series_has_undefined_autocorrelation() {
        let s = series(&[2.0; 10]);
        assert!(matches!(s.autocorrelation(1), Err(IsingError::ZeroVariance { .. })));
    }

    #[test]
    fn autocorrelation_wraps_circularly() {
        let s = series(&[1.0, -1.0, 1.0, -1.0]);
        assert!((s.autocorrelation(1).unwrap() + 1.0).abs() < 1e-12);
        assert!((s.autocorrelation(2).unwrap() - 1.0).abs() < 1e-12);
        assert!((s.autocorrelation(6).unwrap() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn display_numbers_each_sample() {
        let s = series(&[0.5, 1.5]);
        assert_eq!(s.to_string(), "0 0.5\n1 1.5\n");
    }
}
