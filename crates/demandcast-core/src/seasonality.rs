//! Periodic effects as truncated Fourier series.
//!
//! Each declared period contributes `2 * fourier_order` columns
//! `[sin(2π·1·d/P), cos(2π·1·d/P), …, sin(2π·N·d/P), cos(2π·N·d/P)]`,
//! where `d` is the day number since 1970-01-01. Using an absolute day
//! number keeps weekday alignment independent of where the history starts.

use crate::config::{ForecastConfig, YearlySeasonality, YEARLY_AUTO_MIN_DAYS};
use chrono::NaiveDate;
use std::f64::consts::PI;

pub const WEEKLY_PERIOD: f64 = 7.0;
pub const YEARLY_PERIOD: f64 = 365.25;

/// Day number of a date relative to the Unix epoch.
pub fn day_number(date: NaiveDate) -> f64 {
    (date - NaiveDate::default()).num_days() as f64
}

/// Fourier features for a single day.
pub fn fourier_row(day: f64, period: f64, order: usize) -> Vec<f64> {
    let mut row = Vec::with_capacity(2 * order);
    for i in 1..=order {
        let x = 2.0 * PI * i as f64 * day / period;
        row.push(x.sin());
        row.push(x.cos());
    }
    row
}

/// Fourier feature matrix (one row per day).
pub fn fourier_series(days: &[f64], period: f64, order: usize) -> Vec<Vec<f64>> {
    days.iter()
        .map(|&d| fourier_row(d, period, order))
        .collect()
}

/// One declared seasonal period.
#[derive(Debug, Clone, PartialEq)]
pub struct SeasonalComponent {
    pub name: String,
    /// Period length in days
    pub period: f64,
    pub fourier_order: usize,
    /// Normal prior scale on this component's coefficients
    pub prior_scale: f64,
}

impl SeasonalComponent {
    pub fn new(name: &str, period: f64, fourier_order: usize, prior_scale: f64) -> Self {
        Self {
            name: name.to_string(),
            period,
            fourier_order,
            prior_scale,
        }
    }

    pub fn weekly(fourier_order: usize, prior_scale: f64) -> Self {
        Self::new("weekly", WEEKLY_PERIOD, fourier_order, prior_scale)
    }

    pub fn yearly(fourier_order: usize, prior_scale: f64) -> Self {
        Self::new("yearly", YEARLY_PERIOD, fourier_order, prior_scale)
    }

    pub fn n_columns(&self) -> usize {
        2 * self.fourier_order
    }

    pub fn features(&self, date: NaiveDate) -> Vec<f64> {
        fourier_row(day_number(date), self.period, self.fourier_order)
    }
}

/// Seasonal components implied by the configuration and history length.
///
/// Weekly is always present; yearly follows `config.yearly_seasonality`.
pub fn seasonal_components(config: &ForecastConfig, span_days: i64) -> Vec<SeasonalComponent> {
    let mut components = vec![SeasonalComponent::weekly(
        config.weekly_fourier_order,
        config.seasonality_prior_scale,
    )];

    let yearly = match config.yearly_seasonality {
        YearlySeasonality::Enabled => true,
        YearlySeasonality::Disabled => false,
        YearlySeasonality::Auto => span_days >= YEARLY_AUTO_MIN_DAYS,
    };
    if yearly {
        components.push(SeasonalComponent::yearly(
            config.yearly_fourier_order,
            config.seasonality_prior_scale,
        ));
    }

    components
}

/// Seasonal components together with their fitted coefficients.
#[derive(Debug, Clone, PartialEq)]
pub struct SeasonalParams {
    components: Vec<SeasonalComponent>,
    offsets: Vec<usize>,
    beta: Vec<f64>,
}

impl SeasonalParams {
    /// Components with all coefficients zero.
    pub fn new(components: Vec<SeasonalComponent>) -> Self {
        let mut offsets = Vec::with_capacity(components.len());
        let mut col = 0;
        for c in &components {
            offsets.push(col);
            col += c.n_columns();
        }
        Self {
            components,
            offsets,
            beta: vec![0.0; col],
        }
    }

    pub fn components(&self) -> &[SeasonalComponent] {
        &self.components
    }

    pub fn coefficients(&self) -> &[f64] {
        &self.beta
    }

    /// Replace the coefficient vector. Length must equal [`Self::n_columns`].
    pub fn set_coefficients(&mut self, beta: Vec<f64>) {
        debug_assert_eq!(beta.len(), self.beta.len());
        self.beta = beta;
    }

    pub fn n_columns(&self) -> usize {
        self.beta.len()
    }

    /// Prior scale of every column, in column order.
    pub fn column_prior_scales(&self) -> Vec<f64> {
        self.components
            .iter()
            .flat_map(|c| std::iter::repeat(c.prior_scale).take(c.n_columns()))
            .collect()
    }

    /// Concatenated Fourier features of all components.
    pub fn design_row(&self, date: NaiveDate) -> Vec<f64> {
        let mut row = Vec::with_capacity(self.n_columns());
        for c in &self.components {
            row.extend(c.features(date));
        }
        row
    }

    /// Total seasonal effect on `date`.
    pub fn effect(&self, date: NaiveDate) -> f64 {
        self.design_row(date)
            .iter()
            .zip(&self.beta)
            .map(|(x, b)| x * b)
            .sum()
    }

    /// Effect of a single named component, if declared.
    pub fn component_effect(&self, name: &str, date: NaiveDate) -> Option<f64> {
        let idx = self.components.iter().position(|c| c.name == name)?;
        let component = &self.components[idx];
        let start = self.offsets[idx];
        let beta = &self.beta[start..start + component.n_columns()];
        Some(
            component
                .features(date)
                .iter()
                .zip(beta)
                .map(|(x, b)| x * b)
                .sum(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::{assert_abs_diff_eq, assert_relative_eq};

    #[test]
    fn test_fourier_row_layout() {
        let row = fourier_row(0.0, 7.0, 3);
        assert_eq!(row.len(), 6);
        // sin terms are zero, cos terms one at day 0
        for i in 0..3 {
            assert_abs_diff_eq!(row[2 * i], 0.0, epsilon = 1e-12);
            assert_abs_diff_eq!(row[2 * i + 1], 1.0, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_fourier_series_is_periodic() {
        let days: Vec<f64> = (0..21).map(|d| d as f64).collect();
        let x = fourier_series(&days, 7.0, 3);
        for d in 0..14 {
            for j in 0..6 {
                assert_abs_diff_eq!(x[d][j], x[d + 7][j], epsilon = 1e-9);
            }
        }
    }

    #[test]
    fn test_day_number_epoch() {
        assert_eq!(day_number(NaiveDate::from_ymd_opt(1970, 1, 1).unwrap()), 0.0);
        assert_eq!(day_number(NaiveDate::from_ymd_opt(1970, 1, 8).unwrap()), 7.0);
    }

    #[test]
    fn test_seasonal_components_yearly_auto() {
        let config = ForecastConfig::default();
        let short = seasonal_components(&config, 100);
        assert_eq!(short.len(), 1);
        assert_eq!(short[0].name, "weekly");
        assert_eq!(short[0].n_columns(), 6);

        let long = seasonal_components(&config, 800);
        assert_eq!(long.len(), 2);
        assert_eq!(long[1].name, "yearly");
        assert_eq!(long[1].n_columns(), 20);

        let forced = seasonal_components(
            &config
                .clone()
                .with_yearly_seasonality(YearlySeasonality::Enabled),
            30,
        );
        assert_eq!(forced.len(), 2);
    }

    #[test]
    fn test_seasonal_params_effect() {
        let mut params = SeasonalParams::new(vec![SeasonalComponent::weekly(1, 10.0)]);
        assert_eq!(params.n_columns(), 2);
        assert_eq!(params.column_prior_scales(), vec![10.0, 10.0]);

        params.set_coefficients(vec![0.0, 0.5]);
        let epoch = NaiveDate::from_ymd_opt(1970, 1, 1).unwrap();
        assert_relative_eq!(params.effect(epoch), 0.5, epsilon = 1e-12);
        assert_relative_eq!(
            params.component_effect("weekly", epoch).unwrap(),
            0.5,
            epsilon = 1e-12
        );
        assert!(params.component_effect("yearly", epoch).is_none());

        // Same weekday a week later gives the same effect
        let later = epoch + chrono::Duration::days(7);
        assert_relative_eq!(params.effect(later), params.effect(epoch), epsilon = 1e-9);
    }
}
