//! Core daily demand forecasting engine.
//!
//! Rows are validated into a [`Series`], a piecewise-linear trend with
//! weekly (and optionally yearly) Fourier seasonality is fitted to it, and the
//! model is evaluated over the history plus a forecast horizon. Forecasts
//! are clipped to non-negative demand and formatted into output records.
//!
//! ```no_run
//! use demandcast_core::{forecast_rows, format_forecast, ForecastConfig, RawRow};
//!
//! let rows: Vec<RawRow> = (1..=28)
//!     .map(|d| RawRow::new(format!("2024-02-{:02}", d), 12.0))
//!     .collect();
//! let result = forecast_rows(&rows, &ForecastConfig::default().with_periods(14)).unwrap();
//! let records = format_forecast(&result, result.last_observed);
//! assert_eq!(records.len(), 42);
//! ```

pub mod clip;
pub mod config;
pub mod error;
pub mod fit;
pub mod forecast;
pub mod format;
pub mod metrics;
pub mod model;
pub mod seasonality;
pub mod series;
pub mod trend;

// Re-exports for convenience
pub use clip::{clip_forecast, clip_point};
pub use config::{ForecastConfig, SeasonalityMode, YearlySeasonality, MAX_PERIODS};
pub use error::{ErrorKind, ForecastError, Result};
pub use fit::fit;
pub use forecast::{
    fit_diagnostics, forecast_rows, forecast_rows_with, forecast_series, horizon_summary,
    make_future_dates, predict, FitDiagnostics, ForecastPoint, ForecastResult, HorizonSummary,
    STANDARD_HORIZONS,
};
pub use format::{format_forecast, ForecastRecord};
pub use metrics::{coverage, mae, rmse, smape};
pub use model::FittedModel;
pub use seasonality::{SeasonalComponent, SeasonalParams};
pub use series::{parse_date, ObservedPoint, RawRow, Series, SeriesValidator};
pub use trend::TrendParams;
