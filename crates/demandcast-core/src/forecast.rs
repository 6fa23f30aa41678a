//! Forecast generation: fitted model to point estimates and intervals.

use crate::clip::clip_forecast;
use crate::config::{ForecastConfig, MAX_PERIODS};
use crate::error::{ForecastError, Result};
use crate::fit::fit;
use crate::metrics::{coverage, mae, rmse, smape};
use crate::model::FittedModel;
use crate::series::{RawRow, Series, SeriesValidator};
use chrono::{Days, Duration, NaiveDate};
use statrs::distribution::{ContinuousCDF, Normal};
use tracing::{debug, info};

/// Checkpoints reported by [`horizon_summary`] by default.
pub const STANDARD_HORIZONS: [usize; 3] = [30, 60, 90];

/// Prediction for a single day.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ForecastPoint {
    pub timestamp: NaiveDate,
    pub point_estimate: f64,
    pub lower_bound: f64,
    pub upper_bound: f64,
    /// True for dates after the last observation
    pub is_future: bool,
    /// Trend level (original units)
    pub trend: f64,
    /// Seasonal effect: relative factor (multiplicative) or amount (additive)
    pub seasonal: f64,
}

impl ForecastPoint {
    pub fn interval_width(&self) -> f64 {
        self.upper_bound - self.lower_bound
    }
}

/// Predictions for every historical day followed by the forecast horizon.
#[derive(Debug, Clone, PartialEq)]
pub struct ForecastResult {
    pub points: Vec<ForecastPoint>,
    /// Last date of the fitted history
    pub last_observed: NaiveDate,
}

impl ForecastResult {
    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn historical(&self) -> impl Iterator<Item = &ForecastPoint> {
        self.points.iter().filter(|p| !p.is_future)
    }

    pub fn future(&self) -> impl Iterator<Item = &ForecastPoint> {
        self.points.iter().filter(|p| p.is_future)
    }

    /// Point on a given date, if present.
    pub fn at(&self, date: NaiveDate) -> Option<&ForecastPoint> {
        self.points
            .binary_search_by_key(&date, |p| p.timestamp)
            .ok()
            .map(|i| &self.points[i])
    }
}

/// `periods` consecutive days after `last`.
///
/// Fails with `InvalidParameter` when the horizon runs past the last
/// representable date.
pub fn make_future_dates(last: NaiveDate, periods: usize) -> Result<Vec<NaiveDate>> {
    let end = u64::try_from(periods)
        .ok()
        .and_then(|p| last.checked_add_days(Days::new(p)));
    if end.is_none() {
        return Err(ForecastError::invalid_parameter(
            "periods",
            periods,
            format!("horizon overflows the calendar after {}", last),
        ));
    }
    Ok(last.iter_days().skip(1).take(periods).collect())
}

/// Two-sided standard normal quantile for a central interval of `width`.
pub fn interval_z(width: f64) -> Result<f64> {
    if !(width > 0.0 && width < 1.0) {
        return Err(ForecastError::invalid_parameter(
            "interval_width",
            width,
            "must be in (0, 1)",
        ));
    }
    let normal = Normal::new(0.0, 1.0)
        .map_err(|e| ForecastError::ComputationError(format!("normal distribution: {}", e)))?;
    Ok(normal.inverse_cdf(0.5 + width / 2.0))
}

/// Evaluate a fitted model over its history plus `periods` future days.
///
/// Interval half-width is `z · sqrt(σ² + σ_trend(h)²)`, where `σ_trend`
/// is zero inside the history and grows with the horizon `h`, so widths never
/// shrink as the forecast moves further out. Bounds are not clipped here.
pub fn predict(model: &FittedModel, periods: usize, interval_width: f64) -> Result<ForecastResult> {
    if periods == 0 || periods > MAX_PERIODS {
        return Err(ForecastError::invalid_parameter(
            "periods",
            periods,
            format!("must be in 1..={}", MAX_PERIODS),
        ));
    }
    let z = interval_z(interval_width)?;
    let last = model.last_observed();

    let dates = model
        .history()
        .iter()
        .copied()
        .chain(make_future_dates(last, periods)?);

    let points = dates
        .map(|date| {
            let point_estimate = model.predict(date);
            let half_width = z * model.predictive_std(date);
            ForecastPoint {
                timestamp: date,
                point_estimate,
                lower_bound: point_estimate - half_width,
                upper_bound: point_estimate + half_width,
                is_future: date > last,
                trend: model.trend(date),
                seasonal: model.seasonal(date),
            }
        })
        .collect::<Vec<_>>();

    if let Some(bad) = points
        .iter()
        .find(|p| !(p.point_estimate.is_finite() && p.upper_bound.is_finite()))
    {
        return Err(ForecastError::ComputationError(format!(
            "non-finite prediction on {}",
            bad.timestamp
        )));
    }

    debug!(
        n_points = points.len(),
        periods,
        z,
        "predicted forecast points"
    );

    Ok(ForecastResult {
        points,
        last_observed: last,
    })
}

/// Full pipeline on a validated series: config check, fit, predict, clip.
pub fn forecast_series(series: &Series, config: &ForecastConfig) -> Result<ForecastResult> {
    config.validate()?;

    let model = fit(series, config)?;
    let result = clip_forecast(predict(&model, config.periods, config.interval_width)?);

    info!(
        n_obs = series.len(),
        periods = config.periods,
        iterations = model.iterations(),
        "forecast complete"
    );
    Ok(result)
}

/// Full pipeline on raw rows with the default validator.
pub fn forecast_rows(rows: &[RawRow], config: &ForecastConfig) -> Result<ForecastResult> {
    forecast_rows_with(&SeriesValidator::new(), rows, config)
}

/// Full pipeline on raw rows with a caller-supplied validator.
pub fn forecast_rows_with(
    validator: &SeriesValidator,
    rows: &[RawRow],
    config: &ForecastConfig,
) -> Result<ForecastResult> {
    config.validate()?;
    let series = validator.validate(rows)?;
    forecast_series(&series, config)
}

/// Forecast at a fixed number of days past the last observation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HorizonSummary {
    pub days_ahead: usize,
    pub date: NaiveDate,
    pub forecast: f64,
    pub lower_bound: f64,
    pub upper_bound: f64,
}

/// Summaries at each checkpoint that lies within the forecast horizon.
pub fn horizon_summary(result: &ForecastResult, horizons: &[usize]) -> Vec<HorizonSummary> {
    horizons
        .iter()
        .filter_map(|&days| {
            let target = result.last_observed + Duration::days(days as i64);
            result
                .future()
                .find(|p| p.timestamp >= target)
                .map(|p| HorizonSummary {
                    days_ahead: days,
                    date: p.timestamp,
                    forecast: p.point_estimate,
                    lower_bound: p.lower_bound,
                    upper_bound: p.upper_bound,
                })
        })
        .collect()
}

/// In-sample accuracy of a forecast against the series it was fitted on.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FitDiagnostics {
    pub mae: f64,
    pub rmse: f64,
    pub smape: f64,
    /// Share of observations inside their interval
    pub coverage: f64,
}

pub fn fit_diagnostics(series: &Series, result: &ForecastResult) -> Result<FitDiagnostics> {
    let actual = series.values();
    let historical: Vec<&ForecastPoint> = result.historical().collect();
    if historical.len() != actual.len()
        || historical
            .iter()
            .zip(series.points())
            .any(|(p, o)| p.timestamp != o.timestamp)
    {
        return Err(ForecastError::InvalidInput(
            "forecast history does not match the series".to_string(),
        ));
    }

    let fitted: Vec<f64> = historical.iter().map(|p| p.point_estimate).collect();
    let lower: Vec<f64> = historical.iter().map(|p| p.lower_bound).collect();
    let upper: Vec<f64> = historical.iter().map(|p| p.upper_bound).collect();

    Ok(FitDiagnostics {
        mae: mae(&actual, &fitted)?,
        rmse: rmse(&actual, &fitted)?,
        smape: smape(&actual, &fitted)?,
        coverage: coverage(&actual, &lower, &upper)?,
    })
}
