//! Sample statistics for z-score tests.
//!
//! All dispersion figures use the population convention (divide by N).

/// Floor for a clipped stddev, relative to `|mean|`.
pub const MIN_RELATIVE_STD_DEV: f64 = 0.01;
/// Absolute floor for a clipped stddev.
pub const MIN_STD_DEV: f64 = 1e-9;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Moments {
    pub count: usize,
    pub mean: f64,
    pub std_dev: f64,
}

impl Moments {
    /// Mean and population stddev. `None` for an empty sample.
    pub fn of<I>(values: I) -> Option<Self>
    where
        I: IntoIterator<Item = f64>,
    {
        let values: Vec<f64> = values.into_iter().collect();
        if values.is_empty() {
            return None;
        }

        let count = values.len();
        let mean = values.iter().sum::<f64>() / count as f64;
        let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / count as f64;

        Some(Self {
            count,
            mean,
            std_dev: variance.max(0.0).sqrt(),
        })
    }

    /// `(value - mean) / std_dev`; `None` when the stddev is zero.
    pub fn z_score(&self, value: f64) -> Option<f64> {
        if self.std_dev > 0.0 {
            Some((value - self.mean) / self.std_dev)
        } else {
            None
        }
    }

    /// Stddev floored at 1% of `|mean|` (and at [`MIN_STD_DEV`]), so a flat
    /// history still produces a finite z-score.
    pub fn clipped_std_dev(&self) -> f64 {
        self.std_dev
            .max(self.mean.abs() * MIN_RELATIVE_STD_DEV)
            .max(MIN_STD_DEV)
    }

    /// z-score against [`Self::clipped_std_dev`]; always defined.
    pub fn clipped_z_score(&self, value: f64) -> f64 {
        (value - self.mean) / self.clipped_std_dev()
    }

    /// `mean + k * std_dev`.
    pub fn upper_band(&self, k: f64) -> f64 {
        self.mean + k * self.std_dev
    }
}

/// Percentage change from `from` to `to`; `None` unless both are positive.
pub fn pct_change(from: f64, to: f64) -> Option<f64> {
    if from > 0.0 && to > 0.0 {
        Some((to - from) / from * 100.0)
    } else {
        None
    }
}
