//! Non-negativity constraint on forecasts.
//!
//! Demand cannot be negative. After clipping every point satisfies
//! `0 <= lower_bound <= point_estimate <= upper_bound`, for historical and
//! future dates alike. Raising the lower bound to zero shifts the band up
//! instead of narrowing it, so the clipped width equals the unclipped one and
//! widths keep growing with the horizon.

use crate::forecast::{ForecastPoint, ForecastResult};

/// Clip a single point.
pub fn clip_point(point: ForecastPoint) -> ForecastPoint {
    let width = (point.upper_bound - point.lower_bound).max(0.0);
    let lower_bound = point.lower_bound.max(0.0);
    let point_estimate = point.point_estimate.max(lower_bound);
    let upper_bound = point
        .upper_bound
        .max(point_estimate)
        .max(lower_bound + width);
    ForecastPoint {
        lower_bound,
        point_estimate,
        upper_bound,
        ..point
    }
}

/// Clip every point of a forecast.
pub fn clip_forecast(result: ForecastResult) -> ForecastResult {
    ForecastResult {
        points: result.points.into_iter().map(clip_point).collect(),
        last_observed: result.last_observed,
    }
}
