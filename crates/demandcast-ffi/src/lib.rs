//! C ABI for the demandcast forecasting engine.
//!
//! A host (upload handler, CSV reader, database extension) passes parallel
//! arrays of date strings and values and receives formatted forecast rows,
//! either as C arrays or as a JSON document.

pub mod allocation;
pub mod conversion;
pub mod error_handling;
pub mod types;

use allocation::{alloc_and_copy_array, alloc_string_array, free_string_array};
use conversion::{build_rows, options_to_config};
use demandcast_core::{format_forecast, forecast_rows_with, ForecastRecord};
use error_handling::{check_null_pointers, ffi_try, init_error, set_error};
use libc::{c_char, c_double, size_t};
use std::ffi::CString;
use std::ptr;

pub use types::*;

// ============================================================================
// Helper Functions
// ============================================================================

/// Validate, fit, forecast and format rows handed over from C.
///
/// # Safety
/// See [`demandcast_forecast`].
unsafe fn run_forecast(
    dates: *const *const c_char,
    values: *const c_double,
    validity: *const u64,
    length: size_t,
    options: *const ForecastOptions,
    out_error: *mut DemandError,
) -> Option<Vec<ForecastRecord>> {
    if length > 0
        && check_null_pointers(
            out_error,
            &[
                dates as *const core::ffi::c_void,
                values as *const core::ffi::c_void,
            ],
        )
    {
        return None;
    }

    ffi_try(out_error, || {
        let default_options = ForecastOptions::default();
        let opts = if options.is_null() {
            &default_options
        } else {
            &*options
        };
        let (config, validator) = options_to_config(opts)?;
        let rows = build_rows(dates, values, validity, length);
        let result = forecast_rows_with(&validator, &rows, &config)?;
        Ok(format_forecast(&result, result.last_observed))
    })
}

/// Copy formatted rows into a C result, freeing partial allocations on failure.
unsafe fn write_result(
    records: &[ForecastRecord],
    out_result: *mut ForecastResult,
    out_error: *mut DemandError,
) -> bool {
    let dates: Vec<&str> = records.iter().map(|r| r.date.as_str()).collect();
    let forecast: Vec<f64> = records.iter().map(|r| r.forecast).collect();
    let lower: Vec<f64> = records.iter().map(|r| r.lower_bound).collect();
    let upper: Vec<f64> = records.iter().map(|r| r.upper_bound).collect();
    let is_forecast: Vec<bool> = records.iter().map(|r| r.is_forecast).collect();
    let historical_end: Vec<bool> = records.iter().map(|r| r.historical_end).collect();

    let mut out = ForecastResult {
        n_rows: records.len(),
        ..ForecastResult::default()
    };

    let ok = alloc_string_array(&dates, &mut out.dates, out_error)
        && alloc_and_copy_array(&forecast, &mut out.forecast, out_error)
        && alloc_and_copy_array(&lower, &mut out.lower_bound, out_error)
        && alloc_and_copy_array(&upper, &mut out.upper_bound, out_error)
        && alloc_and_copy_array(&is_forecast, &mut out.is_forecast, out_error)
        && alloc_and_copy_array(&historical_end, &mut out.historical_end, out_error);

    if !ok {
        demandcast_free_forecast_result(&mut out);
        return false;
    }

    *out_result = out;
    true
}

fn records_to_json(records: &[ForecastRecord]) -> serde_json::Value {
    let [date, forecast, lower_bound, upper_bound, is_forecast, historical_end] =
        ForecastRecord::COLUMNS;
    serde_json::Value::Array(
        records
            .iter()
            .map(|r| {
                let mut row = serde_json::Map::new();
                row.insert(date.to_string(), serde_json::json!(r.date));
                row.insert(forecast.to_string(), serde_json::json!(r.forecast));
                row.insert(lower_bound.to_string(), serde_json::json!(r.lower_bound));
                row.insert(upper_bound.to_string(), serde_json::json!(r.upper_bound));
                row.insert(is_forecast.to_string(), serde_json::json!(r.is_forecast));
                row.insert(
                    historical_end.to_string(),
                    serde_json::json!(r.historical_end),
                );
                serde_json::Value::Object(row)
            })
            .collect(),
    )
}

// ============================================================================
// Forecast Functions
// ============================================================================

/// Forecast a daily demand series.
///
/// `dates[i]` is a date string (null marks a missing date) and `values[i]`
/// its demand; bit `i` of `validity[i / 64]` cleared marks a missing value
/// (null `validity` means all present). `options` may be null for defaults.
/// On success `out_result` owns newly allocated arrays that must be released
/// with [`demandcast_free_forecast_result`].
///
/// # Safety
/// When `length > 0`, `dates` and `values` must point to `length` elements and
/// `validity` must be null or hold `ceil(length / 64)` words. Every non-null
/// date must be a valid null-terminated string. `out_result` must be valid;
/// `out_error` must be valid or null.
#[no_mangle]
pub unsafe extern "C" fn demandcast_forecast(
    dates: *const *const c_char,
    values: *const c_double,
    validity: *const u64,
    length: size_t,
    options: *const ForecastOptions,
    out_result: *mut ForecastResult,
    out_error: *mut DemandError,
) -> bool {
    init_error(out_error);

    if out_result.is_null() {
        set_error(out_error, ErrorCode::NullPointer, "Null pointer argument");
        return false;
    }

    match run_forecast(dates, values, validity, length, options, out_error) {
        Some(records) => write_result(&records, out_result, out_error),
        None => false,
    }
}

/// Forecast a daily demand series and return the rows as a JSON array.
///
/// Each element is an object with the keys `date`, `forecast`,
/// `lower_bound`, `upper_bound`, `is_forecast` and `historical_end`.
/// Returns null on error. Free the string with [`demandcast_free_string`].
///
/// # Safety
/// Same requirements as [`demandcast_forecast`].
#[no_mangle]
pub unsafe extern "C" fn demandcast_forecast_json(
    dates: *const *const c_char,
    values: *const c_double,
    validity: *const u64,
    length: size_t,
    options: *const ForecastOptions,
    out_error: *mut DemandError,
) -> *mut c_char {
    init_error(out_error);

    let Some(records) = run_forecast(dates, values, validity, length, options, out_error) else {
        return ptr::null_mut();
    };

    match CString::new(records_to_json(&records).to_string()) {
        Ok(s) => s.into_raw(),
        Err(_) => {
            set_error(
                out_error,
                ErrorCode::InternalError,
                "JSON output contained a NUL byte",
            );
            ptr::null_mut()
        }
    }
}

// ============================================================================
// Memory Management
// ============================================================================

/// Free a ForecastResult.
///
/// # Safety
/// The result pointer must be valid or null.
#[no_mangle]
pub unsafe extern "C" fn demandcast_free_forecast_result(result: *mut ForecastResult) {
    if result.is_null() {
        return;
    }
    let r = &mut *result;

    free_string_array(r.dates, r.n_rows);
    r.dates = ptr::null_mut();
    free_fields!(r, forecast, lower_bound, upper_bound, is_forecast, historical_end);
    r.n_rows = 0;
}

/// Free a string returned by [`demandcast_forecast_json`].
///
/// # Safety
/// The pointer must be null or come from [`demandcast_forecast_json`].
#[no_mangle]
pub unsafe extern "C" fn demandcast_free_string(s: *mut c_char) {
    if !s.is_null() {
        drop(CString::from_raw(s));
    }
}

// ============================================================================
// Version
// ============================================================================

#[no_mangle]
pub extern "C" fn demandcast_version() -> *const c_char {
    static VERSION: &str = concat!(env!("CARGO_PKG_VERSION"), "\0");
    VERSION.as_ptr() as *const c_char
}
