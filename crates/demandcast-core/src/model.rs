//! The fitted trend + seasonality model.

use crate::config::SeasonalityMode;
use crate::seasonality::SeasonalParams;
use crate::trend::{TimeScale, TrendParams};
use chrono::NaiveDate;

/// Coefficients produced by [`crate::fit::fit`].
///
/// Internally all parameters live on a scaled axis (time in `[0, 1]` over
/// the history, values divided by the largest observation); the accessors
/// below return values in the original units.
#[derive(Debug, Clone, PartialEq)]
pub struct FittedModel {
    pub(crate) time_scale: TimeScale,
    pub(crate) y_scale: f64,
    pub(crate) trend: TrendParams,
    pub(crate) seasonal: SeasonalParams,
    pub(crate) mode: SeasonalityMode,
    pub(crate) sigma_obs: f64,
    pub(crate) first_observed: NaiveDate,
    pub(crate) last_observed: NaiveDate,
    pub(crate) history: Vec<NaiveDate>,
    pub(crate) iterations: usize,
    pub(crate) objective: f64,
}

impl FittedModel {
    pub fn trend_params(&self) -> &TrendParams {
        &self.trend
    }

    pub fn seasonal_params(&self) -> &SeasonalParams {
        &self.seasonal
    }

    pub fn seasonality_mode(&self) -> SeasonalityMode {
        self.mode
    }

    pub fn y_scale(&self) -> f64 {
        self.y_scale
    }

    pub fn first_observed(&self) -> NaiveDate {
        self.first_observed
    }

    pub fn last_observed(&self) -> NaiveDate {
        self.last_observed
    }

    /// Dates of the series the model was fitted on.
    pub fn history(&self) -> &[NaiveDate] {
        &self.history
    }

    /// Optimizer iterations used.
    pub fn iterations(&self) -> usize {
        self.iterations
    }

    /// Final value of the penalized objective.
    pub fn objective(&self) -> f64 {
        self.objective
    }

    /// Residual noise scale in original units.
    pub fn noise_scale(&self) -> f64 {
        self.sigma_obs * self.y_scale
    }

    /// Changepoint locations as calendar dates.
    pub fn changepoint_dates(&self) -> Vec<NaiveDate> {
        self.trend
            .changepoints
            .iter()
            .map(|&s| self.time_scale.unscale(s))
            .collect()
    }

    pub fn scaled_time(&self, date: NaiveDate) -> f64 {
        self.time_scale.scale(date)
    }

    /// Trend level on `date`, in original units.
    pub fn trend(&self, date: NaiveDate) -> f64 {
        self.trend.value(self.scaled_time(date)) * self.y_scale
    }

    /// Seasonal effect on `date`.
    ///
    /// Multiplicative mode returns the relative factor `s` in
    /// `trend * (1 + s)`; additive mode returns an amount in original units.
    pub fn seasonal(&self, date: NaiveDate) -> f64 {
        let s = self.seasonal.effect(date);
        match self.mode {
            SeasonalityMode::Multiplicative => s,
            SeasonalityMode::Additive => s * self.y_scale,
        }
    }

    /// Point prediction on `date`, in original units.
    pub fn predict(&self, date: NaiveDate) -> f64 {
        let g = self.trend.value(self.scaled_time(date));
        let s = self.seasonal.effect(date);
        let y = match self.mode {
            SeasonalityMode::Multiplicative => g * (1.0 + s),
            SeasonalityMode::Additive => g + s,
        };
        y * self.y_scale
    }

    /// Trend uncertainty (scaled units) at scaled horizon `h` past the last
    /// observation. Zero inside the history.
    pub fn trend_std(&self, h: f64) -> f64 {
        self.trend.forecast_std(h)
    }

    /// Predictive standard deviation on `date`, in original units.
    ///
    /// Observation noise everywhere, plus trend uncertainty that grows with
    /// the distance past the last observation.
    pub fn predictive_std(&self, date: NaiveDate) -> f64 {
        let h = self.scaled_time(date) - self.scaled_time(self.last_observed);
        let trend_std = self.trend_std(h);
        (self.sigma_obs * self.sigma_obs + trend_std * trend_std).sqrt() * self.y_scale
    }
}
