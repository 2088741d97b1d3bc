use std::collections::VecDeque;

use nalgebra::{DMatrix, DVector};

use super::OptimizeMethod;

/// Variance floor applied before taking square roots or inverses.
const VARIANCE_FLOOR: f64 = 1e-12;

pub(crate) fn equal_weights(n: usize) -> DVector<f64> {
    DVector::from_element(n, 1.0 / n.max(1) as f64)
}

/// Clip negatives and rescale to sum to one. Nothing positive left means
/// equal weights.
pub(crate) fn project_simplex(weights: &DVector<f64>) -> DVector<f64> {
    if weights.is_empty() {
        return weights.clone();
    }
    let clipped = weights.map(|w| if w.is_finite() { w.max(0.0) } else { 0.0 });
    let total = clipped.sum();
    if total > 0.0 && total.is_finite() {
        clipped / total
    } else {
        equal_weights(weights.len())
    }
}

pub(crate) fn apply_weight_limits(
    weights: &DVector<f64>,
    min: Option<f64>,
    max: Option<f64>,
) -> DVector<f64> {
    let limited = weights.map(|w| {
        let w = max.map_or(w, |max| w.min(max));
        min.map_or(w, |min| w.max(min))
    });
    project_simplex(&limited)
}

/// Move `target` back toward `current` until the total absolute change is at
/// most `max_turnover`.
pub(crate) fn enforce_turnover(
    target: &DVector<f64>,
    current: &DVector<f64>,
    max_turnover: f64,
) -> DVector<f64> {
    let delta = target - current;
    let turnover: f64 = delta.iter().map(|d| d.abs()).sum();
    if turnover <= max_turnover + 1e-8 {
        return target.clone();
    }
    let blend = (max_turnover / turnover).max(0.0);
    project_simplex(&(current + delta * blend))
}

fn volatilities(cov: &DMatrix<f64>) -> DVector<f64> {
    cov.diagonal().map(|v| v.max(VARIANCE_FLOOR).sqrt())
}

fn inverse_vol(cov: &DMatrix<f64>) -> DVector<f64> {
    project_simplex(&volatilities(cov).map(|v| 1.0 / v))
}

/// Global minimum variance: `pinv(cov) * 1`, long-only after projection.
fn gmv(cov: &DMatrix<f64>) -> DVector<f64> {
    let n = cov.nrows();
    let regularized = cov + DMatrix::identity(n, n) * 1e-8;
    match regularized.pseudo_inverse(1e-12) {
        Ok(inverse) => project_simplex(&(inverse * DVector::from_element(n, 1.0))),
        Err(_) => equal_weights(n),
    }
}

/// Equal risk contribution by damped fixed-point iteration.
fn risk_parity(cov: &DMatrix<f64>) -> DVector<f64> {
    let n = cov.nrows();
    let mut w = equal_weights(n);
    for _ in 0..500 {
        let marginal = cov * &w;
        let target = w.dot(&marginal) / n as f64;
        let gradient = w.component_mul(&marginal).map(|rc| rc - target);
        if gradient.iter().all(|g| g.abs() < 1e-6) {
            break;
        }
        let step = gradient.component_div(&marginal.map(|m| m + VARIANCE_FLOOR)) * 0.05;
        w = project_simplex(&(w - step));
    }
    w
}

/// Gradient ascent on `(vol . w) / sqrt(w' cov w)`.
fn max_diversification(cov: &DMatrix<f64>) -> DVector<f64> {
    let vol = volatilities(cov);
    let mut w = equal_weights(cov.nrows());
    for _ in 0..400 {
        let cw = cov * &w;
        let variance = w.dot(&cw) + VARIANCE_FLOOR;
        let port_vol = variance.sqrt();
        let ratio = vol.dot(&w) / port_vol;
        let grad = &vol / port_vol - cw * (ratio / variance);
        w = project_simplex(&(w + grad * 0.1));
    }
    w
}

fn correlation_distance(cov: &DMatrix<f64>) -> DMatrix<f64> {
    let vol = volatilities(cov);
    let n = cov.nrows();
    DMatrix::from_fn(n, n, |i, j| {
        let corr = if i == j { 1.0 } else { cov[(i, j)] / (vol[i] * vol[j]) };
        (0.5 * (1.0 - corr)).max(0.0).sqrt()
    })
}

/// Leaf order of an average-linkage agglomerative clustering.
fn cluster_order(cov: &DMatrix<f64>) -> Vec<usize> {
    let dist = correlation_distance(cov);
    let linkage = |a: &[usize], b: &[usize]| {
        let mut total = 0.0;
        let mut count = 0usize;
        for &i in a {
            for &j in b {
                if i != j {
                    total += dist[(i, j)];
                    count += 1;
                }
            }
        }
        if count == 0 {
            0.0
        } else {
            total / count as f64
        }
    };

    let mut clusters: Vec<Vec<usize>> = (0..cov.nrows()).map(|i| vec![i]).collect();
    while clusters.len() > 1 {
        let mut best: Option<(usize, usize, f64)> = None;
        for i in 0..clusters.len() {
            for j in i + 1..clusters.len() {
                let d = linkage(&clusters[i], &clusters[j]);
                if best.map_or(true, |(_, _, best_d)| d < best_d) {
                    best = Some((i, j, d));
                }
            }
        }
        let Some((i, j, _)) = best else { break };
        // j > i, so removing j first keeps i valid.
        let right = clusters.remove(j);
        let mut merged = clusters.remove(i);
        merged.extend(right);
        clusters.push(merged);
    }
    clusters.pop().unwrap_or_default()
}

/// Hierarchical risk parity: recursive bisection of the clustered order,
/// splitting weight by inverse cluster variance.
fn hrp(cov: &DMatrix<f64>) -> DVector<f64> {
    let order = cluster_order(cov);
    let n = order.len();
    let ordered = DMatrix::from_fn(n, n, |i, j| cov[(order[i], order[j])]);
    let cluster_variance = |indices: &[usize]| {
        let sub = DMatrix::from_fn(indices.len(), indices.len(), |i, j| {
            ordered[(indices[i], indices[j])]
        });
        let ivp = sub.diagonal().map(|v| 1.0 / v.max(VARIANCE_FLOOR));
        let ivp = &ivp / ivp.sum();
        ivp.dot(&(&sub * &ivp))
    };

    let mut w = DVector::from_element(n, 1.0);
    let mut queue: VecDeque<Vec<usize>> = VecDeque::from([(0..n).collect()]);
    while let Some(cluster) = queue.pop_front() {
        if cluster.len() <= 1 {
            continue;
        }
        let (left, right) = cluster.split_at(cluster.len() / 2);
        let var_left = cluster_variance(left);
        let var_right = cluster_variance(right);
        let alloc_left = if var_left + var_right > 0.0 {
            1.0 - var_left / (var_left + var_right)
        } else {
            0.5
        };
        left.iter().for_each(|&k| w[k] *= alloc_left);
        right.iter().for_each(|&k| w[k] *= 1.0 - alloc_left);
        queue.push_back(left.to_vec());
        queue.push_back(right.to_vec());
    }

    let mut raw = DVector::zeros(n);
    for (position, &asset) in order.iter().enumerate() {
        raw[asset] = w[position];
    }
    project_simplex(&raw)
}

pub(crate) fn optimize_weights(method: OptimizeMethod, cov: &DMatrix<f64>) -> DVector<f64> {
    match method {
        OptimizeMethod::EqualWeight => equal_weights(cov.nrows()),
        OptimizeMethod::InverseVol => inverse_vol(cov),
        OptimizeMethod::Gmv => gmv(cov),
        OptimizeMethod::RiskParity => risk_parity(cov),
        OptimizeMethod::Hrp => hrp(cov),
        OptimizeMethod::MaxDiversification => max_diversification(cov),
    }
}
