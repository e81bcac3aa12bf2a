//! Probability primitives
//!
//! Normal distribution helpers used to jitter story arrivals and to gate
//! population-changing stories:
//! - `erf` after Abramowitz and Stegun 7.1.26 (max error 1.5e-7)
//! - `erfinv` after Winitzki's closed form (a = 0.147)
//! - pdf, cdf and percent-point function of a normal distribution

use rand::Rng;
use std::f64::consts::{PI, SQRT_2};

const ERF_P: f64 = 0.327_591_1;
const ERF_A: [f64; 5] = [
    0.254_829_592,
    -0.284_496_736,
    1.421_413_741,
    -1.453_152_027,
    1.061_405_429,
];
const ERFINV_A: f64 = 0.147;

/// Error function
#[must_use]
pub fn erf(x: f64) -> f64 {
    let sign = if x < 0.0 { -1.0 } else { 1.0 };
    let x = x.abs();
    let t = 1.0 / (1.0 + ERF_P * x);
    let poly = ERF_A.iter().rev().fold(0.0, |acc, a| acc * t + a) * t;
    sign * (1.0 - poly * (-x * x).exp())
}

/// Inverse error function, defined on (-1, 1)
#[must_use]
pub fn erfinv(x: f64) -> f64 {
    let sign = if x < 0.0 { -1.0 } else { 1.0 };
    let ln = (1.0 - x * x).ln();
    let t = 2.0 / (PI * ERFINV_A) + ln / 2.0;
    sign * ((t * t - ln / ERFINV_A).sqrt() - t).sqrt()
}

/// Normal distribution
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Normal {
    pub mean: f64,
    pub stddev: f64,
}

impl Normal {
    #[inline]
    #[must_use]
    pub fn new(mean: f64, stddev: f64) -> Self {
        Self { mean, stddev }
    }

    /// Probability density at `x`
    #[must_use]
    pub fn pdf(&self, x: f64) -> f64 {
        let z = (x - self.mean) / self.stddev;
        (-0.5 * z * z).exp() / (self.stddev.abs() * (2.0 * PI).sqrt())
    }

    /// Probability of a draw at most `x`
    #[must_use]
    pub fn cdf(&self, x: f64) -> f64 {
        0.5 * (1.0 + erf((x - self.mean) / (self.stddev * SQRT_2)))
    }

    /// Value below which a draw falls with probability `p`, `p` in (0, 1)
    #[must_use]
    pub fn ppf(&self, p: f64) -> f64 {
        self.mean + self.stddev.abs() * SQRT_2 * erfinv(2.0 * p - 1.0)
    }
}

/// Density function of `Normal(mean, stddev)`
pub fn normal_pdf(mean: f64, stddev: f64) -> impl Fn(f64) -> f64 + Copy {
    let normal = Normal::new(mean, stddev);
    move |x| normal.pdf(x)
}

/// Cumulative distribution function of `Normal(mean, stddev)`
pub fn normal_cdf(mean: f64, stddev: f64) -> impl Fn(f64) -> f64 + Copy {
    let normal = Normal::new(mean, stddev);
    move |x| normal.cdf(x)
}

/// Percent-point function of `Normal(mean, stddev)`
pub fn normal_ppf(mean: f64, stddev: f64) -> impl Fn(f64) -> f64 + Copy {
    let normal = Normal::new(mean, stddev);
    move |p| normal.ppf(p)
}

/// True with probability `p`
pub fn with_probability<R: Rng + ?Sized>(rng: &mut R, p: f64) -> bool {
    rng.gen::<f64>() < p
}

/// Uniform draw from the open interval (0, 1)
///
/// The percent-point function diverges at both ends.
pub fn open_unit<R: Rng + ?Sized>(rng: &mut R) -> f64 {
    rng.gen_range(f64::MIN_POSITIVE..1.0)
}

/// Whether a population-changing story should grow its population
///
/// Growth stories run when [`GrowGate::grow`] says yes, shrink stories when
/// it says no.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GrowGate {
    /// No target population; always grow
    Always,
    /// Grow less and less often as the population passes the target mean
    Target(Normal),
}

impl GrowGate {
    /// Gate of a story with an optional target population
    #[must_use]
    pub fn for_target(mean: Option<f64>, stddev: Option<f64>) -> Self {
        match (mean, stddev) {
            (Some(mean), Some(stddev)) if mean != 0.0 && stddev != 0.0 => {
                Self::Target(Normal::new(mean, stddev))
            }
            _ => Self::Always,
        }
    }

    /// Grow a population of `count`, drawing from the thread rng
    #[must_use]
    pub fn grow(&self, count: u64) -> bool {
        self.grow_with(count, &mut rand::thread_rng())
    }

    /// Grow a population of `count`: true when a uniform draw is at least
    /// `cdf(count)`
    #[allow(clippy::cast_precision_loss)]
    pub fn grow_with<R: Rng + ?Sized>(&self, count: u64, rng: &mut R) -> bool {
        match self {
            Self::Always => true,
            Self::Target(normal) => !with_probability(rng, normal.cdf(count as f64)),
        }
    }
}
