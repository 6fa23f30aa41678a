//! Fitting and forecasting cost across history lengths.
//!
//! Run with: cargo bench --bench fit_perf

use chrono::{Duration as Days, NaiveDate};
use demandcast_core::{fit, forecast_series, ForecastConfig, SeasonalityMode, Series};
use std::time::{Duration, Instant};

fn generate_demand_series(n: usize) -> Series {
    let start = NaiveDate::from_ymd_opt(2020, 1, 6).unwrap_or_default();
    let points = (0..n)
        .map(|i| {
            let trend = 50.0 + 0.02 * i as f64;
            let weekly = if i % 7 >= 5 { 1.4 } else { 0.9 };
            let yearly = 1.0 + 0.2 * (2.0 * std::f64::consts::PI * i as f64 / 365.25).sin();
            let noise = ((i * 37 + 11) % 13) as f64 * 0.3;
            (start + Days::days(i as i64), trend * weekly * yearly + noise)
        })
        .collect();
    Series::from_points(points).expect("generated series is valid")
}

fn benchmark_fn<F, R>(name: &str, iterations: usize, mut f: F) -> Duration
where
    F: FnMut() -> R,
{
    // Warmup
    let _ = f();

    let start = Instant::now();
    for _ in 0..iterations {
        let _ = std::hint::black_box(f());
    }
    let elapsed = start.elapsed();
    let per_iter = elapsed / iterations as u32;
    println!(
        "{}: total={:?}, per_iter={:?}, iters={}",
        name, elapsed, per_iter, iterations
    );
    elapsed
}

fn main() {
    println!("=== Demand Fit Benchmark ===\n");

    let history_lengths = [60, 180, 365, 730, 1460];

    println!("--- 1. Fit (multiplicative) ---\n");
    for &n in &history_lengths {
        let series = generate_demand_series(n);
        let config = ForecastConfig::default();
        let iters = if n <= 365 { 20 } else { 5 };
        benchmark_fn(&format!("fit n={}", n), iters, || fit(&series, &config));
    }

    println!("\n--- 2. Fit (additive) ---\n");
    for &n in &history_lengths {
        let series = generate_demand_series(n);
        let config = ForecastConfig::default().with_seasonality_mode(SeasonalityMode::Additive);
        let iters = if n <= 365 { 20 } else { 5 };
        benchmark_fn(&format!("fit additive n={}", n), iters, || {
            fit(&series, &config)
        });
    }

    println!("\n--- 3. Full pipeline, 90-day horizon ---\n");
    for &n in &history_lengths {
        let series = generate_demand_series(n);
        let config = ForecastConfig::default().with_periods(90);
        let iters = if n <= 365 { 20 } else { 5 };
        benchmark_fn(&format!("forecast n={}", n), iters, || {
            forecast_series(&series, &config)
        });
    }
}
