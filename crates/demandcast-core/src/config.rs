//! Engine configuration.

use crate::error::{ForecastError, Result};

/// How seasonal effects combine with the trend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SeasonalityMode {
    /// `y = trend + seasonal`
    Additive,
    /// `y = trend * (1 + seasonal)`
    #[default]
    Multiplicative,
}

impl std::str::FromStr for SeasonalityMode {
    type Err = ForecastError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "additive" | "add" => Ok(SeasonalityMode::Additive),
            "multiplicative" | "mult" | "mul" => Ok(SeasonalityMode::Multiplicative),
            _ => Err(ForecastError::invalid_parameter(
                "seasonality_mode",
                s,
                "must be 'additive' or 'multiplicative'",
            )),
        }
    }
}

impl SeasonalityMode {
    pub fn name(&self) -> &'static str {
        match self {
            SeasonalityMode::Additive => "additive",
            SeasonalityMode::Multiplicative => "multiplicative",
        }
    }
}

/// Whether to add a yearly Fourier component.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum YearlySeasonality {
    /// Enabled when the history spans at least two years.
    #[default]
    Auto,
    Enabled,
    Disabled,
}

impl std::str::FromStr for YearlySeasonality {
    type Err = ForecastError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "auto" => Ok(YearlySeasonality::Auto),
            "true" | "on" | "enabled" => Ok(YearlySeasonality::Enabled),
            "false" | "off" | "disabled" => Ok(YearlySeasonality::Disabled),
            _ => Err(ForecastError::invalid_parameter(
                "yearly_seasonality",
                s,
                "must be 'auto', 'enabled' or 'disabled'",
            )),
        }
    }
}

/// Minimum history (in days) for automatic yearly seasonality.
pub const YEARLY_AUTO_MIN_DAYS: i64 = 730;

/// Longest accepted forecast horizon, one hundred years of days.
pub const MAX_PERIODS: usize = 36_525;

/// Forecast configuration.
///
/// Every field has a default; `validate` is called before any fitting work.
#[derive(Debug, Clone, PartialEq)]
pub struct ForecastConfig {
    /// Forecast horizon in days beyond the last observation
    pub periods: usize,
    /// Laplace prior scale on trend slope changes
    pub changepoint_prior_scale: f64,
    /// Normal prior scale on Fourier coefficients
    pub seasonality_prior_scale: f64,
    /// Number of sine/cosine pairs in the weekly component
    pub weekly_fourier_order: usize,
    /// Seasonality combination mode
    pub seasonality_mode: SeasonalityMode,
    /// Maximum number of candidate changepoints
    pub n_changepoints: usize,
    /// Fraction of the history in which changepoints may be placed
    pub changepoint_range: f64,
    /// Yearly seasonality toggle
    pub yearly_seasonality: YearlySeasonality,
    /// Number of sine/cosine pairs in the yearly component
    pub yearly_fourier_order: usize,
    /// Probability mass covered by the prediction interval
    pub interval_width: f64,
    /// Iteration budget for the optimizer
    pub max_iterations: usize,
    /// Relative objective change, or largest step of the scaled fitted
    /// values, at which the optimizer stops
    pub tolerance: f64,
}

impl Default for ForecastConfig {
    fn default() -> Self {
        Self {
            periods: 90,
            changepoint_prior_scale: 0.05,
            seasonality_prior_scale: 10.0,
            weekly_fourier_order: 3,
            seasonality_mode: SeasonalityMode::Multiplicative,
            n_changepoints: 25,
            changepoint_range: 0.8,
            yearly_seasonality: YearlySeasonality::Auto,
            yearly_fourier_order: 10,
            interval_width: 0.80,
            max_iterations: 500,
            tolerance: 1e-6,
        }
    }
}

impl ForecastConfig {
    pub fn with_periods(mut self, periods: usize) -> Self {
        self.periods = periods;
        self
    }

    pub fn with_changepoint_prior_scale(mut self, scale: f64) -> Self {
        self.changepoint_prior_scale = scale;
        self
    }

    pub fn with_seasonality_prior_scale(mut self, scale: f64) -> Self {
        self.seasonality_prior_scale = scale;
        self
    }

    pub fn with_weekly_fourier_order(mut self, order: usize) -> Self {
        self.weekly_fourier_order = order;
        self
    }

    pub fn with_seasonality_mode(mut self, mode: SeasonalityMode) -> Self {
        self.seasonality_mode = mode;
        self
    }

    pub fn with_yearly_seasonality(mut self, yearly: YearlySeasonality) -> Self {
        self.yearly_seasonality = yearly;
        self
    }

    pub fn with_interval_width(mut self, width: f64) -> Self {
        self.interval_width = width;
        self
    }

    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    /// Check every field against its valid domain.
    pub fn validate(&self) -> Result<()> {
        if self.periods == 0 {
            return Err(ForecastError::invalid_parameter(
                "periods",
                self.periods,
                "must be a positive integer",
            ));
        }
        if self.periods > MAX_PERIODS {
            return Err(ForecastError::invalid_parameter(
                "periods",
                self.periods,
                format!("must be at most {}", MAX_PERIODS),
            ));
        }
        check_positive("changepoint_prior_scale", self.changepoint_prior_scale)?;
        check_positive("seasonality_prior_scale", self.seasonality_prior_scale)?;
        if self.weekly_fourier_order == 0 {
            return Err(ForecastError::invalid_parameter(
                "weekly_fourier_order",
                self.weekly_fourier_order,
                "must be at least 1",
            ));
        }
        if self.yearly_seasonality != YearlySeasonality::Disabled && self.yearly_fourier_order == 0
        {
            return Err(ForecastError::invalid_parameter(
                "yearly_fourier_order",
                self.yearly_fourier_order,
                "must be at least 1 when yearly seasonality is not disabled",
            ));
        }
        if !(self.changepoint_range > 0.0 && self.changepoint_range <= 1.0) {
            return Err(ForecastError::invalid_parameter(
                "changepoint_range",
                self.changepoint_range,
                "must be in (0, 1]",
            ));
        }
        if !(self.interval_width > 0.0 && self.interval_width < 1.0) {
            return Err(ForecastError::invalid_parameter(
                "interval_width",
                self.interval_width,
                "must be in (0, 1)",
            ));
        }
        if self.max_iterations == 0 {
            return Err(ForecastError::invalid_parameter(
                "max_iterations",
                self.max_iterations,
                "must be at least 1",
            ));
        }
        check_positive("tolerance", self.tolerance)?;
        Ok(())
    }
}

fn check_positive(param: &str, value: f64) -> Result<()> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(ForecastError::invalid_parameter(
            param,
            value,
            "must be a positive finite number",
        ))
    }
}
