//! Output records for downstream consumers.

use crate::forecast::ForecastResult;
use chrono::NaiveDate;

/// Date format used in output records.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// One output row.
#[derive(Debug, Clone, PartialEq)]
pub struct ForecastRecord {
    /// ISO calendar date (`YYYY-MM-DD`)
    pub date: String,
    pub forecast: f64,
    pub lower_bound: f64,
    pub upper_bound: f64,
    /// Date lies after the last observation
    pub is_forecast: bool,
    /// Date is the last observation
    pub historical_end: bool,
}

impl ForecastRecord {
    /// Output column names, in order.
    pub const COLUMNS: [&'static str; 6] = [
        "date",
        "forecast",
        "lower_bound",
        "upper_bound",
        "is_forecast",
        "historical_end",
    ];
}

/// Turn a forecast into output rows, flagging rows relative to `last_date`.
pub fn format_forecast(result: &ForecastResult, last_date: NaiveDate) -> Vec<ForecastRecord> {
    result
        .points
        .iter()
        .map(|p| ForecastRecord {
            date: p.timestamp.format(DATE_FORMAT).to_string(),
            forecast: p.point_estimate,
            lower_bound: p.lower_bound,
            upper_bound: p.upper_bound,
            is_forecast: p.timestamp > last_date,
            historical_end: p.timestamp == last_date,
        })
        .collect()
}
