//! Piecewise-linear trend with a fixed set of candidate changepoints.
//!
//! Time is measured on a scaled axis where the first observation is 0 and
//! the last is 1. The trend is
//!
//! ```text
//! g(t) = k·t + m + Σ_{s_j ≤ t} δ_j · (t − s_j)
//! ```
//!
//! where `s_j` are the changepoint times and `δ_j` the slope changes.

use chrono::NaiveDate;

/// Standard deviation of the Normal prior on the base slope and offset.
pub const BASE_PRIOR_SCALE: f64 = 5.0;

/// Mapping between calendar dates and the scaled time axis.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimeScale {
    /// Date mapped to `t = 0`
    pub start: NaiveDate,
    /// Number of days mapped to one unit of `t`
    pub span_days: f64,
}

impl TimeScale {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        let span = (end - start).num_days() as f64;
        Self {
            start,
            span_days: if span > 0.0 { span } else { 1.0 },
        }
    }

    /// Scaled time of a date.
    pub fn scale(&self, date: NaiveDate) -> f64 {
        (date - self.start).num_days() as f64 / self.span_days
    }

    /// Scaled time back to a (rounded) date.
    pub fn unscale(&self, t: f64) -> NaiveDate {
        let days = (t * self.span_days).round() as i64;
        self.start + chrono::Duration::days(days)
    }
}

/// Place candidate changepoints evenly over the first `changepoint_range`
/// of the history.
///
/// `t_hist` must be sorted. Returns scaled times, strictly increasing.
pub fn select_changepoints(
    t_hist: &[f64],
    n_changepoints: usize,
    changepoint_range: f64,
) -> Vec<f64> {
    let n = t_hist.len();
    let hist_size = ((n as f64) * changepoint_range).floor() as usize;
    if hist_size < 2 || n_changepoints == 0 {
        return Vec::new();
    }

    let count = n_changepoints.min(hist_size - 1);
    let last_idx = (hist_size - 1) as f64;

    let mut changepoints: Vec<f64> = Vec::with_capacity(count);
    for j in 1..=count {
        let idx = (j as f64 * last_idx / count as f64).round() as usize;
        let t = t_hist[idx.min(n - 1)];
        if changepoints.last().map_or(true, |&prev| t > prev) {
            changepoints.push(t);
        }
    }
    changepoints
}

/// Design row of the trend basis at scaled time `t`:
/// `[1, t, (t − s_1)+, …, (t − s_C)+]`.
pub fn design_row(t: f64, changepoints: &[f64]) -> Vec<f64> {
    let mut row = Vec::with_capacity(2 + changepoints.len());
    row.push(1.0);
    row.push(t);
    row.extend(changepoints.iter().map(|&s| (t - s).max(0.0)));
    row
}

/// Fitted trend parameters, in scaled units.
#[derive(Debug, Clone, PartialEq)]
pub struct TrendParams {
    /// Base growth rate
    pub k: f64,
    /// Offset
    pub m: f64,
    /// Slope change at each changepoint
    pub deltas: Vec<f64>,
    /// Changepoint times on the scaled axis
    pub changepoints: Vec<f64>,
}

impl TrendParams {
    /// A flat trend at level `m`.
    pub fn flat(m: f64, changepoints: Vec<f64>) -> Self {
        Self {
            k: 0.0,
            m,
            deltas: vec![0.0; changepoints.len()],
            changepoints,
        }
    }

    /// Rebuild from a coefficient vector laid out like [`design_row`].
    pub fn from_coefficients(coef: &[f64], changepoints: Vec<f64>) -> Self {
        Self {
            m: coef[0],
            k: coef[1],
            deltas: coef[2..].to_vec(),
            changepoints,
        }
    }

    /// Coefficients laid out like [`design_row`].
    pub fn coefficients(&self) -> Vec<f64> {
        let mut coef = Vec::with_capacity(2 + self.deltas.len());
        coef.push(self.m);
        coef.push(self.k);
        coef.extend_from_slice(&self.deltas);
        coef
    }

    /// Trend value at scaled time `t`.
    pub fn value(&self, t: f64) -> f64 {
        let kinks: f64 = self
            .changepoints
            .iter()
            .zip(&self.deltas)
            .filter(|(s, _)| **s <= t)
            .map(|(s, d)| d * (t - s))
            .sum();
        self.k * t + self.m + kinks
    }

    /// Slope in effect at scaled time `t`.
    pub fn slope_at(&self, t: f64) -> f64 {
        self.k
            + self
                .changepoints
                .iter()
                .zip(&self.deltas)
                .filter(|(s, _)| **s <= t)
                .map(|(_, d)| *d)
                .sum::<f64>()
    }

    /// Mean absolute slope change, the Laplace scale used to simulate future
    /// changepoints.
    pub fn mean_abs_delta(&self) -> f64 {
        if self.deltas.is_empty() {
            return 0.0;
        }
        self.deltas.iter().map(|d| d.abs()).sum::<f64>() / self.deltas.len() as f64
    }

    /// Standard deviation of the trend at `h` scaled units past the last
    /// observation.
    ///
    /// Future slope changes occur at the historical changepoint rate with
    /// Laplace(0, λ) magnitudes, so the trend deviation
    /// `Σ δ_s (h − u_s)` has variance `rate · 2λ² · h³ / 3`.
    pub fn forecast_std(&self, h: f64) -> f64 {
        if h <= 0.0 || self.changepoints.is_empty() {
            return 0.0;
        }
        let rate = self.changepoints.len() as f64;
        let lambda = self.mean_abs_delta();
        (rate * 2.0 * lambda * lambda * h.powi(3) / 3.0).sqrt()
    }
}
