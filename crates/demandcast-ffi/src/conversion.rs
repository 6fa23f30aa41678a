//! Parameter conversion utilities for FFI functions.
//!
//! C callers signal "use the default" with a zero in an optional numeric
//! field or an empty mode string. Negative and non-finite values are rejected
//! with `InvalidParameter`, never replaced.

use crate::types::{buffer_to_string, ForecastOptions};
use core::ffi::{c_char, c_double, c_int};
use demandcast_core::{
    ForecastConfig, ForecastError, RawRow, Result, SeasonalityMode, SeriesValidator,
};
use std::ffi::CStr;

/// Convert an optional count: 0 becomes None, negative values are an error.
#[inline]
pub fn to_option_usize(param: &str, value: c_int) -> Result<Option<usize>> {
    match usize::try_from(value) {
        Ok(0) => Ok(None),
        Ok(v) => Ok(Some(v)),
        Err(_) => Err(ForecastError::invalid_parameter(
            param,
            value,
            "must not be negative",
        )),
    }
}

/// Convert an optional positive real: 0.0 becomes None, negative or
/// non-finite values are an error.
#[inline]
pub fn to_option_f64_positive(param: &str, value: c_double) -> Result<Option<f64>> {
    if value == 0.0 {
        Ok(None)
    } else if value.is_finite() && value > 0.0 {
        Ok(Some(value))
    } else {
        Err(ForecastError::invalid_parameter(
            param,
            value,
            "must be positive, or 0 for the default",
        ))
    }
}

/// Convert the required horizon. There is no default sentinel; negative
/// values are rejected here and 0 by `ForecastConfig::validate`.
#[inline]
pub fn to_periods(value: c_int) -> Result<usize> {
    usize::try_from(value).map_err(|_| {
        ForecastError::invalid_parameter("periods", value, "must be a positive integer")
    })
}

/// Read an optional C string. Invalid UTF-8 is replaced, not dropped, so it
/// fails date parsing instead of silently disappearing.
///
/// # Safety
/// The pointer must be null or point to a valid null-terminated string.
#[inline]
pub unsafe fn c_str_to_string(ptr: *const c_char) -> Option<String> {
    if ptr.is_null() {
        None
    } else {
        Some(CStr::from_ptr(ptr).to_string_lossy().into_owned())
    }
}

/// Whether element `index` is set in a validity bitmask (null means all valid).
///
/// # Safety
/// `validity` must be null or hold at least `index / 64 + 1` words.
#[inline]
pub unsafe fn is_valid(validity: *const u64, index: usize) -> bool {
    if validity.is_null() {
        return true;
    }
    let word = *validity.add(index / 64);
    (word >> (index % 64)) & 1 == 1
}

/// Build input rows from parallel C arrays.
///
/// A null date pointer or a cleared validity bit marks the field as missing.
///
/// # Safety
/// When `length > 0`, `dates` and `values` must point to `length` elements and
/// `validity` must be null or hold `ceil(length / 64)` words.
pub unsafe fn build_rows(
    dates: *const *const c_char,
    values: *const c_double,
    validity: *const u64,
    length: usize,
) -> Vec<RawRow> {
    if length == 0 {
        return Vec::new();
    }
    let date_slice = std::slice::from_raw_parts(dates, length);
    let value_slice = std::slice::from_raw_parts(values, length);

    (0..length)
        .map(|i| RawRow {
            date: c_str_to_string(date_slice[i]),
            value: if is_valid(validity, i) {
                Some(value_slice[i])
            } else {
                None
            },
        })
        .collect()
}

/// Translate FFI options to an engine configuration and validator.
///
/// An unknown seasonality mode is an error, never a silent fallback.
pub fn options_to_config(options: &ForecastOptions) -> Result<(ForecastConfig, SeriesValidator)> {
    let defaults = ForecastConfig::default();

    let mode_str = buffer_to_string(&options.seasonality_mode);
    let mode = if mode_str.trim().is_empty() {
        defaults.seasonality_mode
    } else {
        mode_str.parse::<SeasonalityMode>()?
    };

    let config = ForecastConfig {
        periods: to_periods(options.periods)?,
        changepoint_prior_scale: to_option_f64_positive(
            "changepoint_prior_scale",
            options.changepoint_prior_scale,
        )?
        .unwrap_or(defaults.changepoint_prior_scale),
        seasonality_prior_scale: to_option_f64_positive(
            "seasonality_prior_scale",
            options.seasonality_prior_scale,
        )?
        .unwrap_or(defaults.seasonality_prior_scale),
        weekly_fourier_order: to_option_usize(
            "weekly_fourier_order",
            options.weekly_fourier_order,
        )?
        .unwrap_or(defaults.weekly_fourier_order),
        seasonality_mode: mode,
        interval_width: to_option_f64_positive("interval_width", options.interval_width)?
            .unwrap_or(defaults.interval_width),
        ..defaults
    };
    config.validate()?;

    let mut validator = SeriesValidator::new();
    if let Some(n) = to_option_usize("min_observations", options.min_observations)? {
        validator = validator.with_min_observations(n);
    }

    Ok((config, validator))
}
