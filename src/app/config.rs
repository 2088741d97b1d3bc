use std::path::Path;

use crate::config::Config;

pub fn config_output(config_path: &Path, config: &Config) -> serde_json::Value {
    serde_json::json!({
        "config_file": config_path.display().to_string(),
        "backend": {
            "performance_url": config.backend.performance_url(),
            "timeout_secs": config.backend.timeout_secs
        },
        "analytics": {
            "benchmarks": config.analytics.benchmarks,
            "trading_days_per_year": config.analytics.trading_days_per_year,
            "days_per_year": config.analytics.days_per_year,
            "min_annualization_days": config.analytics.min_annualization_days,
            "chart_mode": config.analytics.chart_mode,
            "default_range": config.analytics.default_range
        },
        "display": config.display,
        "reconstruct": config.reconstruct
    })
}
