//! Return matrices, covariance estimators and expected-return models.

use nalgebra::{DMatrix, DVector};

use super::{CovModel, ReturnModel};

/// Trading days in the momentum lookback (about twelve months).
const MOMENTUM_LOOKBACK: usize = 252;
/// Most recent trading days skipped by momentum (about one month).
const MOMENTUM_SKIP: usize = 21;

/// Simple returns between consecutive rows. A non-positive previous price
/// yields a zero return.
pub(crate) fn returns_matrix(prices: &DMatrix<f64>) -> DMatrix<f64> {
    let (rows, cols) = prices.shape();
    if rows < 2 {
        return DMatrix::zeros(0, cols);
    }
    DMatrix::from_fn(rows - 1, cols, |i, j| {
        let prev = prices[(i, j)];
        if prev > 0.0 {
            prices[(i + 1, j)] / prev - 1.0
        } else {
            0.0
        }
    })
}

fn column_means(returns: &DMatrix<f64>) -> DVector<f64> {
    DVector::from_fn(returns.ncols(), |j, _| returns.column(j).mean())
}

fn demeaned(returns: &DMatrix<f64>) -> DMatrix<f64> {
    let means = column_means(returns);
    DMatrix::from_fn(returns.nrows(), returns.ncols(), |i, j| returns[(i, j)] - means[j])
}

/// Unbiased sample covariance (divides by `T - 1`).
pub(crate) fn sample_cov(returns: &DMatrix<f64>) -> DMatrix<f64> {
    let (t, n) = returns.shape();
    if t < 2 {
        return DMatrix::identity(n, n);
    }
    let x = demeaned(returns);
    x.tr_mul(&x) / (t - 1) as f64
}

/// Ledoit-Wolf style shrinkage of the biased sample covariance toward
/// `trace / n` times the identity.
pub(crate) fn shrinkage_cov(returns: &DMatrix<f64>) -> DMatrix<f64> {
    let (t, n) = returns.shape();
    if t < 2 {
        return DMatrix::identity(n, n);
    }
    let t = t as f64;
    let x = demeaned(returns);
    let cross = x.tr_mul(&x);
    let sample = &cross / t;
    let prior = DMatrix::identity(n, n) * (sample.trace() / n as f64);

    let squared = x.component_mul(&x);
    let phi_mat = squared.tr_mul(&squared) / t - cross.component_mul(&sample) * (2.0 / t)
        + sample.component_mul(&sample);
    let phi = phi_mat.sum();
    let gamma = (&sample - &prior).norm_squared();
    let kappa = if gamma > 0.0 { phi / gamma } else { 0.0 };
    let kappa = if kappa.is_finite() { kappa } else { 0.0 };
    let shrink = (kappa / t).clamp(0.0, 1.0);

    prior * shrink + sample * (1.0 - shrink)
}

/// Exponentially weighted covariance; the newest return has weight
/// proportional to `1 - decay`, each older one `decay` times the next.
pub(crate) fn ewma_cov(returns: &DMatrix<f64>, decay: f64) -> DMatrix<f64> {
    let (t, n) = returns.shape();
    if t < 2 {
        return DMatrix::identity(n, n);
    }
    let raw = DVector::from_fn(t, |i, _| (1.0 - decay) * decay.powi((t - 1 - i) as i32));
    let weights = &raw / raw.sum();
    let x = demeaned(returns);
    let weighted = DMatrix::from_fn(t, n, |i, j| x[(i, j)] * weights[i]);
    weighted.tr_mul(&x)
}

pub(crate) fn estimate(model: CovModel, returns: &DMatrix<f64>, decay: f64) -> DMatrix<f64> {
    match model {
        CovModel::Sample => sample_cov(returns),
        CovModel::Shrinkage => shrinkage_cov(returns),
        CovModel::Ewma => ewma_cov(returns, decay),
    }
}

/// Annualized expected return per column.
///
/// Momentum needs more than a month of history; shorter windows fall back
/// to the historical mean.
pub(crate) fn expected_returns(
    prices: &DMatrix<f64>,
    returns: &DMatrix<f64>,
    model: ReturnModel,
    trading_days_per_year: f64,
) -> DVector<f64> {
    if returns.nrows() == 0 {
        return DVector::zeros(prices.ncols());
    }
    let annual_mean = column_means(returns) * trading_days_per_year;
    match model {
        ReturnModel::HistoricalMean => annual_mean,
        ReturnModel::ShrunkMean => annual_mean * 0.5,
        ReturnModel::Momentum => {
            let rows = prices.nrows();
            let lookback = (rows - 1).min(MOMENTUM_LOOKBACK);
            if lookback <= MOMENTUM_SKIP {
                return annual_mean;
            }
            let first = prices.row(rows - lookback);
            let latest = prices.row(rows - MOMENTUM_SKIP - 1);
            DVector::from_fn(prices.ncols(), |j, _| {
                if first[j] > 0.0 {
                    latest[j] / first[j] - 1.0
                } else {
                    0.0
                }
            })
        }
    }
}
