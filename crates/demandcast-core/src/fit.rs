//! Joint estimation of trend and seasonal coefficients.
//!
//! The fitter computes the maximum-a-posteriori estimate of
//!
//! ```text
//! y_i = g(t_i) · (1 + s(d_i)) + ε_i      (multiplicative)
//! y_i = g(t_i) + s(d_i) + ε_i            (additive)
//! ```
//!
//! with `ε ~ N(0, σ²)`, Normal(0, 5) priors on the base slope and offset,
//! Laplace(0, τ) priors on the slope changes and Normal(0, σ_s) priors on the
//! Fourier coefficients. The negative log posterior is
//!
//! ```text
//! J = RSS / (2σ²) + n·ln σ + (k² + m²) / 50 + Σ|δ| / τ + Σ β² / (2σ_s²)
//! ```
//!
//! It is minimized by block-coordinate descent: every block update is an
//! exact minimization (a ridge solve), and the `|δ|` terms are replaced by
//! their quadratic majorizer at the current iterate, so `J` never increases.
//! Iteration stops once either the relative change of `J` or the largest
//! step of the fitted values falls below the tolerance; on near-exact fits
//! trend and seasonality can keep trading the same signal without moving
//! the fit.
//!
//! `σ` is floored at the standard error of the mean level, `sd(y) / √n`.
//! No randomness is involved; the same series and configuration always give
//! the same coefficients.

use crate::config::{ForecastConfig, SeasonalityMode};
use crate::error::{ForecastError, Result};
use crate::model::FittedModel;
use crate::seasonality::{seasonal_components, SeasonalParams};
use crate::series::Series;
use crate::trend::{design_row, select_changepoints, TimeScale, TrendParams, BASE_PRIOR_SCALE};
use faer::linalg::solvers::Solve;
use faer::{Mat, Side};
use tracing::{debug, warn};

/// Absolute floor on the noise scale (scaled units).
const SIGMA_MIN: f64 = 1e-3;

/// Floor on `|δ|` in the L1 majorizer.
const L1_EPS: f64 = 1e-6;

/// Relative diagonal jitter added to every normal-equation system.
const RIDGE_JITTER: f64 = 1e-10;

/// Minimum number of iterations before convergence may be declared.
const MIN_ITERATIONS: usize = 2;

/// Fit the model to a validated series.
pub fn fit(series: &Series, config: &ForecastConfig) -> Result<FittedModel> {
    config.validate()?;

    let dates = series.dates();
    let values = series.values();
    let n = values.len();
    if n < 2 {
        return Err(ForecastError::InsufficientData { needed: 2, got: n });
    }

    let time_scale = TimeScale::new(series.first_date(), series.last_date());
    let t: Vec<f64> = dates.iter().map(|&d| time_scale.scale(d)).collect();

    let max_abs = values.iter().fold(0.0_f64, |acc, v| acc.max(v.abs()));
    let y_scale = if max_abs > 0.0 { max_abs } else { 1.0 };
    let y: Vec<f64> = values.iter().map(|v| v / y_scale).collect();

    let changepoints = select_changepoints(&t, config.n_changepoints, config.changepoint_range);
    let mut seasonal = SeasonalParams::new(seasonal_components(config, series.span_days()));

    debug!(
        n_obs = n,
        n_changepoints = changepoints.len(),
        n_seasonal_columns = seasonal.n_columns(),
        mode = config.seasonality_mode.name(),
        "fitting demand model"
    );

    let problem = Problem {
        y: &y,
        trend_x: t.iter().map(|&ti| design_row(ti, &changepoints)).collect(),
        season_x: dates.iter().map(|&d| seasonal.design_row(d)).collect(),
        season_prior: seasonal.column_prior_scales(),
        tau: config.changepoint_prior_scale,
        mode: config.seasonality_mode,
    };

    let sigma_floor = noise_floor(&y);
    let (trend_coef, beta, sigma2, iterations, objective) =
        problem.optimize(config.max_iterations, config.tolerance, sigma_floor)?;

    seasonal.set_coefficients(beta);

    debug!(
        iterations,
        objective,
        sigma_obs = sigma2.sqrt(),
        "fit converged"
    );

    Ok(FittedModel {
        time_scale,
        y_scale,
        trend: TrendParams::from_coefficients(&trend_coef, changepoints),
        seasonal,
        mode: config.seasonality_mode,
        sigma_obs: sigma2.sqrt(),
        first_observed: series.first_date(),
        last_observed: series.last_date(),
        history: dates,
        iterations,
        objective,
    })
}

/// Design matrices and prior settings for one fit.
struct Problem<'a> {
    y: &'a [f64],
    trend_x: Vec<Vec<f64>>,
    season_x: Vec<Vec<f64>>,
    season_prior: Vec<f64>,
    tau: f64,
    mode: SeasonalityMode,
}

impl Problem<'_> {
    fn n(&self) -> usize {
        self.y.len()
    }

    fn n_trend(&self) -> usize {
        self.trend_x.first().map_or(2, |r| r.len())
    }

    /// Returns `(trend coefficients, seasonal coefficients, σ², iterations, J)`.
    fn optimize(
        &self,
        max_iterations: usize,
        tolerance: f64,
        sigma_floor: f64,
    ) -> Result<(Vec<f64>, Vec<f64>, f64, usize, f64)> {
        let n = self.n() as f64;
        let min_sigma2 = sigma_floor * sigma_floor;
        let mut beta = vec![0.0; self.season_prior.len()];

        let mean = self.y.iter().sum::<f64>() / n;
        let var = self.y.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
        let mut sigma2 = var.max(min_sigma2);

        // Start from a Gaussian approximation of the Laplace prior so the
        // majorizer does not pin the slope changes at zero.
        let gaussian_delta = vec![1.0 / (self.tau * self.tau); self.n_trend() - 2];
        let mut theta = self.solve_trend(&beta, &gaussian_delta, sigma2)?;

        let mut prev = self.objective(&theta, &beta, sigma2);
        let mut prev_fitted = self.fitted_values(&theta, &beta);

        for iter in 1..=max_iterations {
            let delta_precision: Vec<f64> = theta[2..]
                .iter()
                .map(|d| 1.0 / (self.tau * d.abs().max(L1_EPS)))
                .collect();

            match self.mode {
                SeasonalityMode::Multiplicative => {
                    theta = self.solve_trend(&beta, &delta_precision, sigma2)?;
                    beta = self.solve_seasonal(&theta, sigma2)?;
                }
                SeasonalityMode::Additive => {
                    let (t, b) = self.solve_joint(&delta_precision, sigma2)?;
                    theta = t;
                    beta = b;
                }
            }

            let fitted = self.fitted_values(&theta, &beta);
            let rss = self.rss_of(&fitted);
            sigma2 = (rss / n).max(min_sigma2);

            let obj = self.objective(&theta, &beta, sigma2);
            if !obj.is_finite() {
                return Err(ForecastError::ComputationError(
                    "objective became non-finite".to_string(),
                ));
            }

            let change = (prev - obj).abs() / prev.abs().max(1.0);
            let step = fitted
                .iter()
                .zip(&prev_fitted)
                .fold(0.0_f64, |acc, (a, b)| acc.max((a - b).abs()));
            if iter >= MIN_ITERATIONS && (change < tolerance || step < tolerance) {
                return Ok((theta, beta, sigma2, iter, obj));
            }
            prev = obj;
            prev_fitted = fitted;
        }

        warn!(max_iterations, "fit did not converge");
        Err(ForecastError::NotConverged {
            iterations: max_iterations,
        })
    }

    fn trend_at(&self, theta: &[f64], i: usize) -> f64 {
        dot(&self.trend_x[i], theta)
    }

    fn season_at(&self, beta: &[f64], i: usize) -> f64 {
        dot(&self.season_x[i], beta)
    }

    fn fitted(&self, theta: &[f64], beta: &[f64], i: usize) -> f64 {
        let g = self.trend_at(theta, i);
        let s = self.season_at(beta, i);
        match self.mode {
            SeasonalityMode::Multiplicative => g * (1.0 + s),
            SeasonalityMode::Additive => g + s,
        }
    }

    fn fitted_values(&self, theta: &[f64], beta: &[f64]) -> Vec<f64> {
        (0..self.n()).map(|i| self.fitted(theta, beta, i)).collect()
    }

    fn rss_of(&self, fitted: &[f64]) -> f64 {
        self.y
            .iter()
            .zip(fitted)
            .map(|(y, f)| (y - f).powi(2))
            .sum()
    }

    fn rss(&self, theta: &[f64], beta: &[f64]) -> f64 {
        self.rss_of(&self.fitted_values(theta, beta))
    }

    fn objective(&self, theta: &[f64], beta: &[f64], sigma2: f64) -> f64 {
        let n = self.n() as f64;
        let base_var = BASE_PRIOR_SCALE * BASE_PRIOR_SCALE;

        let likelihood = self.rss(theta, beta) / (2.0 * sigma2) + 0.5 * n * sigma2.ln();
        let base = (theta[0] * theta[0] + theta[1] * theta[1]) / (2.0 * base_var);
        let changes = theta[2..].iter().map(|d| d.abs()).sum::<f64>() / self.tau;
        let seasonal: f64 = beta
            .iter()
            .zip(&self.season_prior)
            .map(|(b, s)| b * b / (2.0 * s * s))
            .sum();

        likelihood + base + changes + seasonal
    }

    fn trend_penalty(&self, delta_precision: &[f64], sigma2: f64) -> Vec<f64> {
        let base = 1.0 / (BASE_PRIOR_SCALE * BASE_PRIOR_SCALE);
        let mut penalty = vec![sigma2 * base, sigma2 * base];
        penalty.extend(delta_precision.iter().map(|p| sigma2 * p));
        penalty
    }

    fn seasonal_penalty(&self, sigma2: f64) -> Vec<f64> {
        self.season_prior
            .iter()
            .map(|s| sigma2 / (s * s))
            .collect()
    }

    /// Trend block with the seasonal coefficients held fixed.
    fn solve_trend(&self, beta: &[f64], delta_precision: &[f64], sigma2: f64) -> Result<Vec<f64>> {
        let penalty = self.trend_penalty(delta_precision, sigma2);
        let (rows, target): (Vec<Vec<f64>>, Vec<f64>) = (0..self.n())
            .map(|i| {
                let s = self.season_at(beta, i);
                match self.mode {
                    SeasonalityMode::Multiplicative => {
                        let w = 1.0 + s;
                        (self.trend_x[i].iter().map(|x| x * w).collect(), self.y[i])
                    }
                    SeasonalityMode::Additive => (self.trend_x[i].clone(), self.y[i] - s),
                }
            })
            .unzip();
        penalized_least_squares(&rows, &target, &penalty)
    }

    /// Seasonal block with the trend held fixed (multiplicative mode).
    fn solve_seasonal(&self, theta: &[f64], sigma2: f64) -> Result<Vec<f64>> {
        let penalty = self.seasonal_penalty(sigma2);
        let (rows, target): (Vec<Vec<f64>>, Vec<f64>) = (0..self.n())
            .map(|i| {
                let g = self.trend_at(theta, i);
                (
                    self.season_x[i].iter().map(|x| x * g).collect(),
                    self.y[i] - g,
                )
            })
            .unzip();
        penalized_least_squares(&rows, &target, &penalty)
    }

    /// Both blocks at once over the combined basis (additive mode).
    fn solve_joint(&self, delta_precision: &[f64], sigma2: f64) -> Result<(Vec<f64>, Vec<f64>)> {
        let mut penalty = self.trend_penalty(delta_precision, sigma2);
        penalty.extend(self.seasonal_penalty(sigma2));

        let rows: Vec<Vec<f64>> = (0..self.n())
            .map(|i| {
                let mut row = self.trend_x[i].clone();
                row.extend_from_slice(&self.season_x[i]);
                row
            })
            .collect();

        let coef = penalized_least_squares(&rows, self.y, &penalty)?;
        let split = self.n_trend();
        Ok((coef[..split].to_vec(), coef[split..].to_vec()))
    }
}

/// Lower bound on `σ` for scaled observations `y`.
fn noise_floor(y: &[f64]) -> f64 {
    let n = y.len() as f64;
    let mean = y.iter().sum::<f64>() / n;
    let sd = (y.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n).sqrt();
    (sd / n.sqrt()).max(SIGMA_MIN)
}

fn dot(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

/// Solve `min Σ (target_i − row_i·θ)² + Σ penalty_j θ_j²` through its normal
/// equations `(XᵀX + diag(penalty)) θ = Xᵀy` with a Cholesky factorization.
fn penalized_least_squares(rows: &[Vec<f64>], target: &[f64], penalty: &[f64]) -> Result<Vec<f64>> {
    let p = penalty.len();
    if p == 0 {
        return Ok(Vec::new());
    }

    // Lower triangle of XᵀX
    let mut gram = vec![0.0; p * p];
    let mut rhs = vec![0.0; p];
    for (row, &y) in rows.iter().zip(target) {
        for i in 0..p {
            let xi = row[i];
            if xi == 0.0 {
                continue;
            }
            rhs[i] += xi * y;
            for j in 0..=i {
                gram[i * p + j] += xi * row[j];
            }
        }
    }

    let trace: f64 = (0..p).map(|i| gram[i * p + i] + penalty[i]).sum();
    let jitter = RIDGE_JITTER * (trace / p as f64).max(f64::MIN_POSITIVE);

    let a = Mat::from_fn(p, p, |i, j| {
        let (r, c) = if i >= j { (i, j) } else { (j, i) };
        let mut v = gram[r * p + c];
        if i == j {
            v += penalty[i] + jitter;
        }
        v
    });
    let b = Mat::from_fn(p, 1, |i, _| rhs[i]);

    let llt = a.llt(Side::Lower).map_err(|_| {
        ForecastError::ComputationError("normal equations are not positive definite".to_string())
    })?;
    let x = llt.solve(b.as_ref());

    let coef: Vec<f64> = (0..p).map(|i| x[(i, 0)]).collect();
    if coef.iter().any(|c| !c.is_finite()) {
        return Err(ForecastError::ComputationError(
            "non-finite coefficients".to_string(),
        ));
    }
    Ok(coef)
}
