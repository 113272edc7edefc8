//! Statistics of a sample series on synthetic data with known answers.

use ising_mc::{IsingError, SampleSeries};

use rand::SeedableRng;
use rand_distr::{Distribution, Normal};
use rand_pcg::Pcg64;

fn gaussian_series(n: usize, mean: f64, sigma: f64, seed: u64) -> SampleSeries {
    let mut rng = Pcg64::seed_from_u64(seed);
    let normal = Normal::new(mean, sigma).unwrap();
    (0..n).map(|_| normal.sample(&mut rng)).collect()
}

#[test]
fn sum_and_mean() {
    let series = SampleSeries::from(vec![1.0, 2.0, 3.0, 4.0]);
    assert_eq!(series.sum(), 10.0);
    assert_eq!(series.mean().unwrap(), 2.5);
    assert_eq!(series.mean_with(|x| x * x).unwrap(), 7.5);
}

#[test]
fn empty_series_has_no_mean() {
    let series = SampleSeries::new();
    assert_eq!(series.sum(), 0.0);
    assert!(matches!(
        series.mean(),
        Err(IsingError::InsufficientSamples { .. })
    ));
}

#[test]
fn naive_error_of_small_series() {
    // variance 1.25, N - 1 = 3
    let series = SampleSeries::from(vec![1.0, 2.0, 3.0, 4.0]);
    let expected = (1.25f64 / 3.0).sqrt();
    assert!((series.error().unwrap() - expected).abs() < 1e-12);
}

#[test]
fn jackknife_of_constant_series_is_zero() {
    for &value in &[-32.0, 0.1, 0.7, -2.7, -5000.3, 2500.0] {
        for &n in &[3, 100, 1000] {
            let series: SampleSeries = std::iter::repeat(value).take(n).collect();
            assert_eq!(series.jackknife_error().unwrap(), 0.0, "value {}, n {}", value, n);
            assert_eq!(series.jackknife(|s| s.mean()).unwrap(), 0.0, "value {}, n {}", value, n);
            assert_eq!(series.jackknife(|s| s.variance()).unwrap(), 0.0);
        }
    }
}

#[test]
fn transformed_autocorrelation_range_is_normalised() {
    let series = gaussian_series(400, 2.0, 0.5, 17);
    let acf = series.autocorrelation_range_with(0..5, |x| x.powi(3)).unwrap();
    assert_eq!(acf.len(), 5);
    assert!((acf[0] - 1.0).abs() < 1e-9);
    assert!(acf[1..].iter().all(|c| c.abs() < 0.3));
}

#[test]
fn jackknife_of_mean_matches_statistic_form() {
    let series = gaussian_series(200, 0.0, 1.0, 1);
    let pointwise = series.jackknife_error().unwrap();
    let generic = series.jackknife(|s| s.mean()).unwrap();
    assert!((pointwise - generic).abs() < 1e-12);
}

#[test]
fn bootstrap_converges_to_naive_error_for_independent_data() {
    let series = gaussian_series(2_000, 5.0, 2.0, 7);
    let naive = series.error().unwrap();
    let mut rng = Pcg64::seed_from_u64(99);
    let boot = series.bootstrap_error(&mut rng, 1_000).unwrap();
    let rel = (boot - naive).abs() / naive;
    assert!(rel < 0.15, "bootstrap {} vs naive {}", boot, naive);
}

#[test]
fn bootstrap_needs_iterations() {
    let series = gaussian_series(10, 0.0, 1.0, 2);
    let mut rng = Pcg64::seed_from_u64(0);
    assert!(series.bootstrap_error(&mut rng, 0).is_err());
}

#[test]
fn bootstrap_is_reproducible_under_seed() {
    let series = gaussian_series(300, 0.0, 1.0, 3);
    let a = series
        .bootstrap(|s| s.variance(), &mut Pcg64::seed_from_u64(5), 100)
        .unwrap();
    let b = series
        .bootstrap(|s| s.variance(), &mut Pcg64::seed_from_u64(5), 100)
        .unwrap();
    assert_eq!(a, b);
}

#[test]
fn autocorrelation_at_zero_lag_is_one() {
    let series = gaussian_series(500, 1.0, 0.3, 11);
    assert!((series.autocorrelation(0).unwrap() - 1.0).abs() < 1e-9);
    let with_square = series.autocorrelation_with(0, |x| x * x).unwrap();
    assert!((with_square - 1.0).abs() < 1e-9);
}

#[test]
fn autocorrelation_wraps_circularly() {
    let series = SampleSeries::from(vec![1.0, -1.0, 1.0, -1.0]);
    let acf = series.autocorrelation_range(0..6).unwrap();
    let expected = [1.0, -1.0, 1.0, -1.0, 1.0, -1.0];
    for (got, want) in acf.iter().zip(expected) {
        assert!((got - want).abs() < 1e-12);
    }
}

#[test]
fn independent_data_decorrelates() {
    let series = gaussian_series(5_000, 0.0, 1.0, 13);
    for lag in 1..10 {
        assert!(series.autocorrelation(lag).unwrap().abs() < 0.1);
    }
}

#[test]
fn constant_series_has_no_autocorrelation() {
    let series: SampleSeries = std::iter::repeat(16.0).take(20).collect();
    assert!(matches!(
        series.autocorrelation(1),
        Err(IsingError::ZeroVariance { .. })
    ));
}
