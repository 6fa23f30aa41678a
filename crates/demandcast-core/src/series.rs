//! Input validation: raw rows to an ordered daily series.

use crate::error::{ForecastError, Result};
use chrono::{DateTime, NaiveDate, NaiveDateTime};

/// Minimum number of observations any series must have.
pub const MIN_OBSERVATIONS: usize = 2;

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y", "%Y%m%d"];
const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
];

/// One input row as delivered by a loader. Either field may be missing.
#[derive(Debug, Clone, PartialEq)]
pub struct RawRow {
    pub date: Option<String>,
    pub value: Option<f64>,
}

impl RawRow {
    pub fn new(date: impl Into<String>, value: f64) -> Self {
        Self {
            date: Some(date.into()),
            value: Some(value),
        }
    }
}

/// A single validated observation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ObservedPoint {
    pub timestamp: NaiveDate,
    pub value: f64,
}

/// Strictly time-ordered series of non-negative observations.
#[derive(Debug, Clone, PartialEq)]
pub struct Series {
    points: Vec<ObservedPoint>,
}

impl Series {
    /// Build a series from typed points using the default validator.
    pub fn from_points(points: Vec<(NaiveDate, f64)>) -> Result<Self> {
        SeriesValidator::new().validate_points(points)
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn points(&self) -> &[ObservedPoint] {
        &self.points
    }

    pub fn dates(&self) -> Vec<NaiveDate> {
        self.points.iter().map(|p| p.timestamp).collect()
    }

    pub fn values(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.value).collect()
    }

    pub fn first_date(&self) -> NaiveDate {
        self.points[0].timestamp
    }

    pub fn last_date(&self) -> NaiveDate {
        self.points[self.points.len() - 1].timestamp
    }

    /// Days between the first and last observation.
    pub fn span_days(&self) -> i64 {
        (self.last_date() - self.first_date()).num_days()
    }
}

/// Parse a calendar date from the common textual forms.
///
/// Datetime strings are truncated to their date.
pub fn parse_date(s: &str) -> Result<NaiveDate> {
    let s = s.trim();
    if s.is_empty() {
        return Err(ForecastError::InvalidDateFormat("empty date".to_string()));
    }

    for fmt in DATE_FORMATS {
        if let Ok(d) = NaiveDate::parse_from_str(s, fmt) {
            return Ok(d);
        }
    }
    for fmt in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Ok(dt.date());
        }
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.date_naive());
    }

    Err(ForecastError::InvalidDateFormat(s.to_string()))
}

/// Turns raw rows into a [`Series`], rejecting anything ambiguous.
#[derive(Debug, Clone)]
pub struct SeriesValidator {
    min_observations: usize,
}

impl Default for SeriesValidator {
    fn default() -> Self {
        Self::new()
    }
}

impl SeriesValidator {
    pub fn new() -> Self {
        Self {
            min_observations: MIN_OBSERVATIONS,
        }
    }

    /// Require more history than the engine minimum (values below 2 are raised to 2).
    pub fn with_min_observations(mut self, n: usize) -> Self {
        self.min_observations = n.max(MIN_OBSERVATIONS);
        self
    }

    pub fn min_observations(&self) -> usize {
        self.min_observations
    }

    /// Validate raw rows.
    pub fn validate(&self, rows: &[RawRow]) -> Result<Series> {
        let mut points = Vec::with_capacity(rows.len());

        for (i, row) in rows.iter().enumerate() {
            let date_str = row
                .date
                .as_deref()
                .ok_or_else(|| ForecastError::InvalidInput(format!("row {}: missing date", i)))?;
            let value = row
                .value
                .ok_or_else(|| ForecastError::InvalidInput(format!("row {}: missing value", i)))?;
            let date = parse_date(date_str).map_err(|e| match e {
                ForecastError::InvalidDateFormat(s) => {
                    ForecastError::InvalidDateFormat(format!("row {}: '{}'", i, s))
                }
                other => other,
            })?;
            points.push((date, value));
        }

        self.validate_points(points)
    }

    /// Validate already typed points.
    pub fn validate_points(&self, points: Vec<(NaiveDate, f64)>) -> Result<Series> {
        for (date, value) in &points {
            if !value.is_finite() {
                return Err(ForecastError::InvalidInput(format!(
                    "non-finite value on {}",
                    date
                )));
            }
            if *value < 0.0 {
                return Err(ForecastError::InvalidInput(format!(
                    "negative value {} on {}: demand cannot be negative",
                    value, date
                )));
            }
        }

        if points.len() < self.min_observations {
            return Err(ForecastError::InsufficientData {
                needed: self.min_observations,
                got: points.len(),
            });
        }

        let mut points: Vec<ObservedPoint> = points
            .into_iter()
            .map(|(timestamp, value)| ObservedPoint { timestamp, value })
            .collect();
        points.sort_by_key(|p| p.timestamp);

        if let Some(w) = points
            .windows(2)
            .find(|w| w[0].timestamp == w[1].timestamp)
        {
            return Err(ForecastError::DuplicateTimestamp(w[0].timestamp));
        }

        Ok(Series { points })
    }
}
