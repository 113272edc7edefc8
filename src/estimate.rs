// estimate.rs - Value with a statistical error and independent-error arithmetic

use std::fmt;
use std::ops::{Add, Div, Mul, Sub};

/// An immutable `(mean, error)` pair.
///
/// All combinators assume the two operands are independent: `+`/`-` add
/// absolute errors in quadrature, `*`/`/` add relative errors in quadrature
/// and scale back by the result. No covariance is tracked.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Estimate {
    mean: f64,
    error: f64,
}

impl Estimate {
    pub fn new(mean: f64, error: f64) -> Self {
        Self { mean, error }
    }

    #[inline(always)]
    pub fn mean(&self) -> f64 {
        self.mean
    }

    #[inline(always)]
    pub fn error(&self) -> f64 {
        self.error
    }
}

impl Add for Estimate {
    type Output = Estimate;

    fn add(self, rhs: Estimate) -> Estimate {
        Estimate::new(self.mean + rhs.mean, self.error.hypot(rhs.error))
    }
}

impl Sub for Estimate {
    type Output = Estimate;

    fn sub(self, rhs: Estimate) -> Estimate {
        Estimate::new(self.mean - rhs.mean, self.error.hypot(rhs.error))
    }
}

impl Mul for Estimate {
    type Output = Estimate;

    // |ab| · sqrt((σa/a)² + (σb/b)²), written without dividing by either mean
    fn mul(self, rhs: Estimate) -> Estimate {
        let error = (self.error * rhs.mean).hypot(self.mean * rhs.error);
        Estimate::new(self.mean * rhs.mean, error)
    }
}

impl Div for Estimate {
    type Output = Estimate;

    // |a/b| · sqrt((σa/a)² + (σb/b)²); a zero divisor gives non-finite values
    fn div(self, rhs: Estimate) -> Estimate {
        let error = (self.error / rhs.mean).hypot(self.mean * rhs.error / (rhs.mean * rhs.mean));
        Estimate::new(self.mean / rhs.mean, error)
    }
}

impl Mul<f64> for Estimate {
    type Output = Estimate;

    fn mul(self, rhs: f64) -> Estimate {
        Estimate::new(self.mean * rhs, self.error * rhs.abs())
    }
}

impl Div<f64> for Estimate {
    type Output = Estimate;

    fn div(self, rhs: f64) -> Estimate {
        Estimate::new(self.mean / rhs, self.error / rhs.abs())
    }
}

impl fmt::Display for Estimate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(precision) = f.precision() {
            write!(f, "{:.*} +/- {:.*}", precision, self.mean, precision, self.error)
        } else {
            write!(f, "{} +/- {}", self.mean, self.error)
        }
    }
}
