//! Return and risk statistics over a windowed value series.

use std::collections::HashMap;

use chrono::NaiveDate;

use crate::models::{Metrics, RelativeMetrics, Valued};

/// Calendar conventions used for annualization.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MetricParams {
    /// Sampling periods per year used to scale daily return statistics.
    pub trading_days_per_year: f64,
    /// Calendar days per year used to annualize the total return.
    pub days_per_year: f64,
    /// Shortest calendar span (in days) for which `annualized` is reported.
    pub min_annualization_days: i64,
}

impl Default for MetricParams {
    fn default() -> Self {
        Self {
            trading_days_per_year: 252.0,
            days_per_year: 365.0,
            min_annualization_days: 30,
        }
    }
}

fn finite(value: f64) -> Option<f64> {
    value.is_finite().then_some(value)
}

fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// Population standard deviation (divides by N).
pub(crate) fn population_stddev(values: &[f64]) -> Option<f64> {
    let m = mean(values)?;
    let var = values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / values.len() as f64;
    Some(var.sqrt())
}

/// Simple returns between consecutive samples.
///
/// Pairs whose previous value is not positive are skipped, not counted as 0.
pub fn daily_returns<T: Valued>(series: &[T]) -> Vec<f64> {
    series
        .windows(2)
        .filter_map(|pair| {
            let prev = pair[0].value();
            let curr = pair[1].value();
            (prev > 0.0).then(|| curr / prev - 1.0)
        })
        .collect()
}

/// Largest peak-to-trough decline, as a positive fraction of the peak.
///
/// `None` for an empty series; `0` for a single point or a series that never
/// falls below its running peak.
pub fn max_drawdown<T: Valued>(series: &[T]) -> Option<f64> {
    let first = series.first()?;
    let mut peak = first.value();
    let mut worst = 0.0_f64;
    for point in series {
        let value = point.value();
        if value > peak {
            peak = value;
        }
        if peak > 0.0 {
            let drawdown = (peak - value) / peak;
            if drawdown > worst {
                worst = drawdown;
            }
        }
    }
    Some(worst.abs())
}

/// Return/risk statistics for an already-windowed series.
///
/// Fewer than two samples yields all-`None` metrics. `beta` and
/// `correlation` are left empty; see [`compute_relative_metrics`].
pub fn compute_metrics<T: Valued>(series: &[T], params: &MetricParams) -> Metrics {
    let (first, last) = match series {
        [first, .., last] => (first, last),
        _ => return Metrics::default(),
    };

    let total_return = (first.value() > 0.0)
        .then(|| last.value() / first.value() - 1.0)
        .and_then(finite);
    let total_abs = finite(last.value() - first.value());

    let returns = daily_returns(series);
    let volatility = population_stddev(&returns)
        .map(|sd| sd * params.trading_days_per_year.sqrt())
        .and_then(finite);
    let sharpe = match (mean(&returns), volatility) {
        (Some(m), Some(vol)) if vol > 0.0 => finite(m * params.trading_days_per_year / vol),
        _ => None,
    };

    let days = (last.date() - first.date()).num_days();
    let annualized = match total_return {
        Some(tr) if days >= params.min_annualization_days && days > 0 => {
            finite((1.0 + tr).powf(params.days_per_year / days as f64) - 1.0)
        }
        _ => None,
    };

    Metrics {
        total_return,
        total_abs,
        annualized,
        volatility,
        max_drawdown: max_drawdown(series),
        sharpe,
        beta: None,
        correlation: None,
    }
}

/// Daily returns of two series paired by date.
///
/// Only portfolio dates that also carry a benchmark value take part; each
/// such date is paired with the previous such date. A pair contributes only
/// when both previous values are positive.
pub fn aligned_returns<P: Valued, B: Valued>(portfolio: &[P], benchmark: &[B]) -> (Vec<f64>, Vec<f64>) {
    let bench_by_date: HashMap<NaiveDate, f64> =
        benchmark.iter().map(|p| (p.date(), p.value())).collect();

    let mut port_returns = Vec::new();
    let mut bench_returns = Vec::new();
    let mut prev: Option<(f64, f64)> = None;

    for point in portfolio {
        let Some(&bench) = bench_by_date.get(&point.date()) else {
            continue;
        };
        if let Some((prev_port, prev_bench)) = prev {
            if prev_port > 0.0 && prev_bench > 0.0 {
                port_returns.push(point.value() / prev_port - 1.0);
                bench_returns.push(bench / prev_bench - 1.0);
            }
        }
        prev = Some((point.value(), bench));
    }

    (port_returns, bench_returns)
}

/// Pearson correlation and population beta of `xs` against `ys`.
pub(crate) fn beta_and_correlation(xs: &[f64], ys: &[f64]) -> RelativeMetrics {
    if xs.is_empty() || xs.len() != ys.len() {
        return RelativeMetrics::default();
    }
    let n = xs.len() as f64;
    let (Some(mx), Some(my)) = (mean(xs), mean(ys)) else {
        return RelativeMetrics::default();
    };

    let mut sxy = 0.0;
    let mut sxx = 0.0;
    let mut syy = 0.0;
    for (x, y) in xs.iter().zip(ys) {
        let dx = x - mx;
        let dy = y - my;
        sxy += dx * dy;
        sxx += dx * dx;
        syy += dy * dy;
    }

    let denom = (sxx * syy).sqrt();
    let correlation = (denom > 0.0).then(|| sxy / denom).and_then(finite);

    let var_y = syy / n;
    let beta = (var_y > 0.0).then(|| (sxy / n) / var_y).and_then(finite);

    RelativeMetrics { beta, correlation }
}

/// Beta and correlation of a portfolio series against a benchmark series.
pub fn compute_relative_metrics<P: Valued, B: Valued>(
    portfolio: &[P],
    benchmark: &[B],
) -> RelativeMetrics {
    let (port_returns, bench_returns) = aligned_returns(portfolio, benchmark);
    beta_and_correlation(&port_returns, &bench_returns)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{PortfolioPoint, PricePoint};

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 1, day).unwrap()
    }

    fn values(vals: &[f64]) -> Vec<PortfolioPoint> {
        vals.iter()
            .enumerate()
            .map(|(i, v)| PortfolioPoint::from_value(d(i as u32 + 1), *v))
            .collect()
    }

    #[test]
    fn short_series_yields_empty_metrics() {
        let params = MetricParams::default();
        assert!(compute_metrics::<PortfolioPoint>(&[], &params).is_empty());
        assert!(compute_metrics(&values(&[100.0]), &params).is_empty());
    }

    #[test]
    fn three_point_scenario() {
        let m = compute_metrics(&values(&[100.0, 110.0, 99.0]), &MetricParams::default());
        assert!((m.total_return.unwrap() + 0.01).abs() < 1e-12);
        assert!((m.total_abs.unwrap() + 1.0).abs() < 1e-12);
        assert!((m.max_drawdown.unwrap() - 0.1).abs() < 1e-12);
        assert_eq!(m.annualized, None);
        assert!(m.volatility.unwrap() > 0.0);
        assert!(m.sharpe.is_some());
    }

    #[test]
    fn volatility_uses_population_stddev() {
        // Returns +10% then -10%: mean 0, population sd 0.1.
        let m = compute_metrics(&values(&[100.0, 110.0, 99.0]), &MetricParams::default());
        let expected = 0.1 * 252f64.sqrt();
        assert!((m.volatility.unwrap() - expected).abs() < 1e-9);
        assert!(m.sharpe.unwrap().abs() < 1e-9);
    }

    #[test]
    fn zero_start_value_has_no_total_return() {
        let m = compute_metrics(&values(&[0.0, 50.0, 60.0]), &MetricParams::default());
        assert_eq!(m.total_return, None);
        assert_eq!(m.total_abs, Some(60.0));
        // The 0 -> 50 pair is skipped; only 50 -> 60 counts.
        assert_eq!(daily_returns(&values(&[0.0, 50.0, 60.0])).len(), 1);
        assert_eq!(m.annualized, None);
    }

    #[test]
    fn flat_series_has_zero_volatility_and_no_sharpe() {
        let m = compute_metrics(&values(&[100.0, 100.0, 100.0]), &MetricParams::default());
        assert_eq!(m.volatility, Some(0.0));
        assert_eq!(m.sharpe, None);
        assert_eq!(m.max_drawdown, Some(0.0));
    }

    #[test]
    fn annualized_requires_thirty_day_span() {
        let start = NaiveDate::from_ymd_opt(2025, 1, 1).unwrap();
        let series = vec![
            PricePoint::new(start, 100.0),
            PricePoint::new(start + chrono::Duration::days(29), 101.0),
        ];
        let m = compute_metrics(&series, &MetricParams::default());
        assert_eq!(m.annualized, None);

        let series = vec![
            PricePoint::new(start, 100.0),
            PricePoint::new(start + chrono::Duration::days(365), 110.0),
        ];
        let m = compute_metrics(&series, &MetricParams::default());
        assert!((m.annualized.unwrap() - 0.1).abs() < 1e-12);
    }

    #[test]
    fn max_drawdown_of_decreasing_series_is_one_minus_min_over_max() {
        let series = values(&[200.0, 150.0, 120.0, 50.0]);
        assert!((max_drawdown(&series).unwrap() - (1.0 - 50.0 / 200.0)).abs() < 1e-12);
        assert_eq!(max_drawdown(&values(&[1.0, 2.0, 3.0])), Some(0.0));
        assert_eq!(max_drawdown::<PortfolioPoint>(&[]), None);
    }

    #[test]
    fn relative_metrics_of_identical_series() {
        let port = values(&[100.0, 102.0, 101.0, 105.0]);
        let bench: Vec<PricePoint> = port.iter().map(|p| PricePoint::new(p.date, p.value)).collect();
        let rel = compute_relative_metrics(&port, &bench);
        assert!((rel.beta.unwrap() - 1.0).abs() < 1e-12);
        assert!((rel.correlation.unwrap() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn relative_metrics_of_levered_series() {
        let bench = vec![
            PricePoint::new(d(1), 100.0),
            PricePoint::new(d(2), 101.0),
            PricePoint::new(d(3), 99.0),
            PricePoint::new(d(4), 102.0),
        ];
        // Portfolio returns are exactly twice the benchmark's.
        let mut port = vec![PortfolioPoint::from_value(d(1), 1000.0)];
        for pair in bench.windows(2) {
            let r = pair[1].value / pair[0].value - 1.0;
            let prev = port.last().unwrap().value;
            port.push(PortfolioPoint::from_value(pair[1].date, prev * (1.0 + 2.0 * r)));
        }
        let rel = compute_relative_metrics(&port, &bench);
        assert!((rel.beta.unwrap() - 2.0).abs() < 1e-9);
        assert!((rel.correlation.unwrap() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn relative_metrics_align_by_date() {
        let port = values(&[100.0, 110.0, 121.0]);
        let bench = vec![PricePoint::new(d(1), 50.0), PricePoint::new(d(3), 55.0)];
        let (p, b) = aligned_returns(&port, &bench);
        assert_eq!(p.len(), 1);
        assert!((p[0] - 0.21).abs() < 1e-12);
        assert!((b[0] - 0.1).abs() < 1e-12);
        // One pair has no dispersion.
        assert_eq!(compute_relative_metrics(&port, &bench), RelativeMetrics::default());
    }

    #[test]
    fn relative_metrics_without_overlap_are_empty() {
        let port = values(&[100.0, 110.0]);
        let bench = vec![PricePoint::new(d(10), 50.0), PricePoint::new(d(11), 55.0)];
        assert_eq!(compute_relative_metrics(&port, &bench), RelativeMetrics::default());
    }

    #[test]
    fn non_positive_previous_values_are_skipped() {
        let port = values(&[0.0, 100.0, 110.0, 99.0]);
        let bench = vec![
            PricePoint::new(d(1), 10.0),
            PricePoint::new(d(2), 10.0),
            PricePoint::new(d(3), 11.0),
            PricePoint::new(d(4), 10.0),
        ];
        let (p, b) = aligned_returns(&port, &bench);
        assert_eq!(p.len(), 2);
        assert_eq!(b.len(), 2);
    }
}
