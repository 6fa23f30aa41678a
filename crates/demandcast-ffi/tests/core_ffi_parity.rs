//! Core-vs-FFI parity integration tests.
//!
//! Every scenario runs the Rust core pipeline directly and the C entry point
//! `demandcast_forecast()` with identical inputs. Both must produce
//! bit-identical rows since the FFI layer is a thin translation shim.

use std::ffi::{c_char, c_double, CStr, CString};

use chrono::{Duration, NaiveDate};
use demandcast_core::{
    format_forecast, forecast_rows, ForecastConfig, ForecastRecord, RawRow, SeasonalityMode,
};
use demandcast_ffi::types::{DemandError, ErrorCode, ForecastOptions, ForecastResult};

// Defined in demandcast_ffi/src/lib.rs
extern "C" {
    fn demandcast_forecast(
        dates: *const *const c_char,
        values: *const c_double,
        validity: *const u64,
        length: usize,
        options: *const ForecastOptions,
        out_result: *mut ForecastResult,
        out_error: *mut DemandError,
    ) -> bool;

    fn demandcast_forecast_json(
        dates: *const *const c_char,
        values: *const c_double,
        validity: *const u64,
        length: usize,
        options: *const ForecastOptions,
        out_error: *mut DemandError,
    ) -> *mut c_char;

    fn demandcast_free_forecast_result(result: *mut ForecastResult);

    fn demandcast_free_string(s: *mut c_char);
}

// ── Synthetic data generators ──────────────────────────────────────────

fn start() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()
}

fn date_strings(n: usize) -> Vec<String> {
    (0..n)
        .map(|i| {
            (start() + Duration::days(i as i64))
                .format("%Y-%m-%d")
                .to_string()
        })
        .collect()
}

/// Weekly demand: busy weekends, trend, deterministic "noise".
fn weekly_data() -> Vec<f64> {
    (0..70)
        .map(|i| {
            let trend = 40.0 + 0.2 * i as f64;
            let weekend = if i % 7 >= 5 { 1.6 } else { 1.0 };
            let noise = ((i * 7 + 3) % 11) as f64 * 0.3 - 1.5;
            trend * weekend + noise
        })
        .collect()
}

/// Intermittent demand: mostly zeros with sporadic sales.
fn intermittent_data() -> Vec<f64> {
    let pattern = [0.0, 0.0, 3.0, 0.0, 0.0, 0.0, 5.0, 0.0, 2.0, 0.0, 0.0, 7.0, 0.0, 1.0];
    pattern.iter().cycle().take(42).copied().collect()
}

// ── Helpers ────────────────────────────────────────────────────────────

struct Inputs {
    _owned: Vec<CString>,
    dates: Vec<*const c_char>,
    values: Vec<f64>,
}

fn make_inputs(values: &[f64]) -> Inputs {
    let owned: Vec<CString> = date_strings(values.len())
        .into_iter()
        .map(|s| CString::new(s).unwrap())
        .collect();
    let dates = owned.iter().map(|s| s.as_ptr()).collect();
    Inputs {
        _owned: owned,
        dates,
        values: values.to_vec(),
    }
}

fn core_rows(values: &[f64]) -> Vec<RawRow> {
    date_strings(values.len())
        .into_iter()
        .zip(values)
        .map(|(d, &v)| RawRow::new(d, v))
        .collect()
}

fn core_records(values: &[f64], config: &ForecastConfig) -> Vec<ForecastRecord> {
    let result = forecast_rows(&core_rows(values), config).unwrap();
    format_forecast(&result, result.last_observed)
}

fn call_ffi(values: &[f64], opts: &ForecastOptions) -> Result<Vec<ForecastRecord>, DemandError> {
    let inputs = make_inputs(values);
    let mut result = ForecastResult::default();
    let mut error = DemandError::default();

    let ok = unsafe {
        demandcast_forecast(
            inputs.dates.as_ptr(),
            inputs.values.as_ptr(),
            std::ptr::null(),
            inputs.values.len(),
            opts as *const _,
            &mut result as *mut _,
            &mut error as *mut _,
        )
    };
    if !ok {
        return Err(error);
    }

    let n = result.n_rows;
    let records = (0..n)
        .map(|i| unsafe {
            ForecastRecord {
                date: CStr::from_ptr(*result.dates.add(i))
                    .to_str()
                    .unwrap()
                    .to_string(),
                forecast: *result.forecast.add(i),
                lower_bound: *result.lower_bound.add(i),
                upper_bound: *result.upper_bound.add(i),
                is_forecast: *result.is_forecast.add(i),
                historical_end: *result.historical_end.add(i),
            }
        })
        .collect();

    unsafe {
        demandcast_free_forecast_result(&mut result as *mut _);
    }
    assert!(result.forecast.is_null());

    Ok(records)
}

fn assert_records_eq(label: &str, core: &[ForecastRecord], ffi: &[ForecastRecord]) {
    assert_eq!(core.len(), ffi.len(), "[{label}] row count mismatch");
    for (i, (c, f)) in core.iter().zip(ffi).enumerate() {
        assert_eq!(c.date, f.date, "[{label}] date[{i}]");
        assert_eq!(c.forecast.to_bits(), f.forecast.to_bits(), "[{label}] forecast[{i}]");
        assert_eq!(c.lower_bound.to_bits(), f.lower_bound.to_bits(), "[{label}] lower[{i}]");
        assert_eq!(c.upper_bound.to_bits(), f.upper_bound.to_bits(), "[{label}] upper[{i}]");
        assert_eq!(c.is_forecast, f.is_forecast, "[{label}] is_forecast[{i}]");
        assert_eq!(c.historical_end, f.historical_end, "[{label}] historical_end[{i}]");
    }
}

// ── Tests ──────────────────────────────────────────────────────────────

#[test]
fn parity_default_options() {
    let values = weekly_data();
    let core = core_records(&values, &ForecastConfig::default());
    let ffi = call_ffi(&values, &ForecastOptions::default()).unwrap();
    assert_records_eq("default", &core, &ffi);
    assert_eq!(ffi.len(), 70 + 90);
    assert_eq!(ffi.iter().filter(|r| r.historical_end).count(), 1);
}

#[test]
fn parity_additive_short_horizon() {
    let values = weekly_data();
    let config = ForecastConfig::default()
        .with_periods(14)
        .with_seasonality_mode(SeasonalityMode::Additive)
        .with_interval_width(0.95);

    let mut opts = ForecastOptions::default();
    opts.periods = 14;
    opts.interval_width = 0.95;
    opts.set_seasonality_mode("additive");

    let core = core_records(&values, &config);
    let ffi = call_ffi(&values, &opts).unwrap();
    assert_records_eq("additive", &core, &ffi);
}

#[test]
fn parity_intermittent() {
    let values = intermittent_data();
    let config = ForecastConfig::default().with_periods(30);
    let mut opts = ForecastOptions::default();
    opts.periods = 30;

    let core = core_records(&values, &config);
    let ffi = call_ffi(&values, &opts).unwrap();
    assert_records_eq("intermittent", &core, &ffi);
    assert!(ffi.iter().all(|r| r.lower_bound >= 0.0));
}

#[test]
fn ffi_reports_error_kinds() {
    // Too short
    let err = call_ffi(&[5.0], &ForecastOptions::default()).unwrap_err();
    assert_eq!(err.code, ErrorCode::InvalidInput);

    // Interval width outside (0, 1)
    let mut opts = ForecastOptions::default();
    opts.interval_width = 1.5;
    let err = call_ffi(&weekly_data(), &opts).unwrap_err();
    assert_eq!(err.code, ErrorCode::InvalidConfig);
    let msg = unsafe { CStr::from_ptr(err.message.as_ptr()) };
    assert!(msg.to_str().unwrap().contains("interval_width"));

    // Unknown seasonality mode
    let mut opts = ForecastOptions::default();
    opts.set_seasonality_mode("exponential");
    let err = call_ffi(&weekly_data(), &opts).unwrap_err();
    assert_eq!(err.code, ErrorCode::InvalidConfig);

    // Negative and zero horizons are rejected, not defaulted
    for periods in [-5, 0] {
        let mut opts = ForecastOptions::default();
        opts.periods = periods;
        let err = call_ffi(&weekly_data(), &opts).unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidConfig);
        assert!(err.message_str().contains("periods"));
    }

    // Negative interval width is rejected
    let mut opts = ForecastOptions::default();
    opts.interval_width = -0.5;
    let err = call_ffi(&weekly_data(), &opts).unwrap_err();
    assert_eq!(err.code, ErrorCode::InvalidConfig);

    // Minimum history enforced
    let mut opts = ForecastOptions::default();
    opts.min_observations = 100;
    let err = call_ffi(&weekly_data(), &opts).unwrap_err();
    assert_eq!(err.code, ErrorCode::InvalidInput);
    assert_eq!(err.detail, 3);
}

#[test]
fn ffi_missing_values_rejected() {
    let inputs = make_inputs(&weekly_data());
    // Clear bit 3
    let validity = vec![!(1u64 << 3), u64::MAX];
    let mut result = ForecastResult::default();
    let mut error = DemandError::default();

    let ok = unsafe {
        demandcast_forecast(
            inputs.dates.as_ptr(),
            inputs.values.as_ptr(),
            validity.as_ptr(),
            inputs.values.len(),
            std::ptr::null(),
            &mut result,
            &mut error,
        )
    };
    assert!(!ok);
    assert_eq!(error.code, ErrorCode::InvalidInput);
    let msg = unsafe { CStr::from_ptr(error.message.as_ptr()) };
    assert!(msg.to_str().unwrap().contains("row 3"));
}

#[test]
fn json_output_matches_core() {
    let values = weekly_data();
    let mut opts = ForecastOptions::default();
    opts.periods = 7;
    let inputs = make_inputs(&values);
    let mut error = DemandError::default();

    let ptr = unsafe {
        demandcast_forecast_json(
            inputs.dates.as_ptr(),
            inputs.values.as_ptr(),
            std::ptr::null(),
            inputs.values.len(),
            &opts,
            &mut error,
        )
    };
    assert!(!ptr.is_null());
    let text = unsafe { CStr::from_ptr(ptr) }.to_str().unwrap().to_string();
    unsafe { demandcast_free_string(ptr) };

    let json: serde_json::Value = serde_json::from_str(&text).unwrap();
    let rows = json.as_array().unwrap();
    let core = core_records(&values, &ForecastConfig::default().with_periods(7));
    assert_eq!(rows.len(), core.len());
    for (row, c) in rows.iter().zip(&core) {
        assert_eq!(row["date"], c.date.as_str());
        let forecast = row["forecast"].as_f64().unwrap();
        assert!((forecast - c.forecast).abs() <= 1e-12 * c.forecast.abs().max(1.0));
        assert_eq!(row["is_forecast"], c.is_forecast);
    }
}

#[test]
fn json_error_returns_null() {
    let mut error = DemandError::default();
    let ptr = unsafe {
        demandcast_forecast_json(
            std::ptr::null(),
            std::ptr::null(),
            std::ptr::null(),
            0,
            std::ptr::null(),
            &mut error,
        )
    };
    assert!(ptr.is_null());
    assert_eq!(error.code, ErrorCode::InvalidInput);
}
