//! C-compatible type definitions for the FFI boundary.

use demandcast_core::{ErrorKind, ForecastError};
use libc::{c_char, c_double, c_int, size_t};

/// Error codes for FFI boundary.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    Success = 0,
    NullPointer = 1,
    /// Malformed or insufficient input rows
    InvalidInput = 2,
    /// Option outside its valid domain
    InvalidConfig = 3,
    /// Optimization failed or produced a degenerate model
    FitFailed = 4,
    AllocationError = 5,
    PanicCaught = 6,
    InternalError = 7,
}

impl From<&ForecastError> for ErrorCode {
    fn from(e: &ForecastError) -> Self {
        match e.kind() {
            ErrorKind::Validation => ErrorCode::InvalidInput,
            ErrorKind::Config => ErrorCode::InvalidConfig,
            ErrorKind::Fit => ErrorCode::FitFailed,
        }
    }
}

/// Error structure with message buffer for FFI.
#[repr(C)]
#[derive(Debug)]
pub struct DemandError {
    pub code: ErrorCode,
    /// Engine error code (`ForecastError::to_code`), 0 when not applicable
    pub detail: c_int,
    pub message: [c_char; 256],
}

impl DemandError {
    /// Create a success error (no error).
    pub fn success() -> Self {
        Self {
            code: ErrorCode::Success,
            detail: 0,
            message: [0; 256],
        }
    }

    /// Set an error with code and message.
    pub fn set_error(&mut self, code: ErrorCode, msg: &str) {
        self.code = code;
        copy_str_to_buffer(msg, &mut self.message);
    }

    /// Set an error from an engine error.
    pub fn set_forecast_error(&mut self, e: &ForecastError) {
        self.set_error(ErrorCode::from(e), &e.to_string());
        self.detail = e.to_code();
    }

    /// Message as a Rust string (up to the first NUL).
    pub fn message_str(&self) -> String {
        buffer_to_string(&self.message)
    }
}

impl Default for DemandError {
    fn default() -> Self {
        Self::success()
    }
}

/// Forecast options.
///
/// A zero in any numeric field except `periods`, and an empty mode string,
/// select the engine default. Negative values and `periods == 0` are rejected
/// with `ErrorCode::InvalidConfig`.
#[repr(C)]
#[derive(Debug)]
pub struct ForecastOptions {
    /// Forecast horizon in days, must be positive
    pub periods: c_int,
    /// Laplace prior scale on trend changes
    pub changepoint_prior_scale: c_double,
    /// Normal prior scale on seasonal coefficients
    pub seasonality_prior_scale: c_double,
    /// Weekly Fourier order
    pub weekly_fourier_order: c_int,
    /// "multiplicative" or "additive" (null-terminated)
    pub seasonality_mode: [c_char; 32],
    /// Probability mass of the prediction interval (0-1)
    pub interval_width: c_double,
    /// Minimum accepted number of observations
    pub min_observations: c_int,
}

impl ForecastOptions {
    /// Set the seasonality mode string.
    pub fn set_seasonality_mode(&mut self, mode: &str) {
        copy_str_to_buffer(mode, &mut self.seasonality_mode);
    }
}

impl Default for ForecastOptions {
    fn default() -> Self {
        let mut options = Self {
            periods: 90,
            changepoint_prior_scale: 0.05,
            seasonality_prior_scale: 10.0,
            weekly_fourier_order: 3,
            seasonality_mode: [0; 32],
            interval_width: 0.80,
            min_observations: 2,
        };
        options.set_seasonality_mode("multiplicative");
        options
    }
}

/// Formatted forecast rows.
///
/// All arrays hold `n_rows` elements and are allocated with `malloc`; release
/// them with `demandcast_free_forecast_result`.
#[repr(C)]
pub struct ForecastResult {
    /// ISO dates (`YYYY-MM-DD`), null-terminated strings
    pub dates: *mut *mut c_char,
    pub forecast: *mut c_double,
    pub lower_bound: *mut c_double,
    pub upper_bound: *mut c_double,
    pub is_forecast: *mut bool,
    pub historical_end: *mut bool,
    pub n_rows: size_t,
}

impl Default for ForecastResult {
    fn default() -> Self {
        Self {
            dates: std::ptr::null_mut(),
            forecast: std::ptr::null_mut(),
            lower_bound: std::ptr::null_mut(),
            upper_bound: std::ptr::null_mut(),
            is_forecast: std::ptr::null_mut(),
            historical_end: std::ptr::null_mut(),
            n_rows: 0,
        }
    }
}

/// Copy a string to a fixed-size char buffer, truncating and NUL-terminating.
pub fn copy_str_to_buffer(s: &str, buffer: &mut [c_char]) {
    if buffer.is_empty() {
        return;
    }
    let bytes = s.as_bytes();
    let len = bytes.len().min(buffer.len() - 1);
    for (i, &b) in bytes[..len].iter().enumerate() {
        buffer[i] = b as c_char;
    }
    buffer[len] = 0;
}

/// Read a NUL-terminated fixed-size buffer.
pub fn buffer_to_string(buffer: &[c_char]) -> String {
    let bytes: Vec<u8> = buffer
        .iter()
        .take_while(|&&c| c != 0)
        .map(|&c| c as u8)
        .collect();
    String::from_utf8_lossy(&bytes).into_owned()
}
