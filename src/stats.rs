//! Descriptive statistics and tolerance checks.
//!
//! Small numeric helpers used by the generator.

#![allow(clippy::cast_precision_loss)]
#![allow(clippy::cast_possible_wrap)]

use serde::{Deserialize, Serialize};

/// Absolute tolerances for a sample's mean and standard deviation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Tolerance {
    /// Allowed |sample mean - target mean|.
    pub mean: f64,
    /// Allowed |sample std - target std|.
    pub std: f64,
}

impl Default for Tolerance {
    fn default() -> Self {
        Self {
            mean: 0.05,
            std: 0.05,
        }
    }
}

impl Tolerance {
    /// Returns true if the observed statistics exceed either tolerance.
    ///
    /// An undefined sample std (fewer than two values) never counts as a
    /// violation of the std tolerance.
    #[must_use]
    pub fn is_violated(&self, mean: f64, std: Option<f64>, target: &SampleStats) -> bool {
        let mean_off = (mean - target.mean).abs() > self.mean;
        let std_off = std.is_some_and(|s| (s - target.std).abs() > self.std);
        mean_off || std_off
    }
}

/// Mean and standard deviation pair.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SampleStats {
    pub mean: f64,
    pub std: f64,
}

/// Arithmetic mean, `None` for an empty sample.
#[must_use]
pub fn mean(sample: &[f64]) -> Option<f64> {
    if sample.is_empty() {
        return None;
    }
    Some(sample.iter().sum::<f64>() / sample.len() as f64)
}

/// Sample standard deviation with an `n - 1` denominator.
///
/// `None` when fewer than two values are present.
#[must_use]
pub fn sample_std(sample: &[f64]) -> Option<f64> {
    if sample.len() < 2 {
        return None;
    }
    let m = mean(sample)?;
    let ss = sample.iter().map(|x| (x - m).powi(2)).sum::<f64>();
    Some((ss / (sample.len() - 1) as f64).sqrt())
}

/// Rounds to `decimals` places, breaking ties to the even neighbour.
///
/// Scales by `10^decimals`, rounds half-to-even and scales back, which is
/// the same procedure common array libraries use for decimal rounding.
#[must_use]
pub fn round_half_even(value: f64, decimals: u32) -> f64 {
    let scale = 10f64.powi(decimals as i32);
    let scaled = value * scale;
    if !scaled.is_finite() {
        return value;
    }
    scaled.round_ties_even() / scale
}
