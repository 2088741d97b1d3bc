use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::analytics::optimize::{CovModel, OptimizeMethod, OptimizeParams, ReturnModel};
use crate::analytics::{ChartMode, MetricParams};
use crate::range::RangePreset;

/// Upper bound for `reconstruct.market_data_delay_minutes` (one week).
pub const MAX_MARKET_DATA_DELAY_MINUTES: i64 = 7 * 24 * 60;

/// Default benchmarks compared against the portfolio.
fn default_benchmarks() -> Vec<String> {
    vec!["SPY".to_string(), "IWM".to_string()]
}

/// Backend that serves performance payloads.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BackendConfig {
    /// Base URL of the backend API.
    pub base_url: String,

    /// Path of the performance endpoint, appended to `base_url`.
    pub performance_path: String,

    /// Request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8001".to_string(),
            performance_path: "/performance".to_string(),
            timeout_secs: 20,
        }
    }
}

impl BackendConfig {
    /// Full URL of the performance endpoint.
    pub fn performance_url(&self) -> String {
        let base = self.base_url.trim_end_matches('/');
        let path = self.performance_path.trim_start_matches('/');
        format!("{base}/{path}")
    }

    pub fn timeout(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.timeout_secs)
    }
}

/// Metric conventions and dashboard defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalyticsConfig {
    /// Benchmarks in preference order; the first one present in a payload
    /// drives beta and correlation.
    #[serde(default = "default_benchmarks")]
    pub benchmarks: Vec<String>,

    /// Periods per year used to annualize daily volatility and Sharpe.
    pub trading_days_per_year: f64,

    /// Calendar days per year used to annualize the total return.
    pub days_per_year: f64,

    /// Windows shorter than this many calendar days get no annualized return.
    pub min_annualization_days: i64,

    /// Default chart mode.
    pub chart_mode: ChartMode,

    /// Window used when a report names neither dates nor a range.
    pub default_range: RangePreset,
}

impl Default for AnalyticsConfig {
    fn default() -> Self {
        let params = MetricParams::default();
        Self {
            benchmarks: default_benchmarks(),
            trading_days_per_year: params.trading_days_per_year,
            days_per_year: params.days_per_year,
            min_annualization_days: params.min_annualization_days,
            chart_mode: ChartMode::default(),
            default_range: RangePreset::All,
        }
    }
}

impl AnalyticsConfig {
    pub fn metric_params(&self) -> MetricParams {
        MetricParams {
            trading_days_per_year: self.trading_days_per_year,
            days_per_year: self.days_per_year,
            min_annualization_days: self.min_annualization_days,
        }
    }
}

/// Display/output formatting configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    /// Decimal places for percentages (returns, volatility, drawdown).
    pub percent_decimals: u32,

    /// Decimal places for ratios (Sharpe, beta, correlation).
    pub ratio_decimals: u32,

    /// If set, currency values are rounded to this many decimal places.
    pub currency_decimals: Option<u32>,

    /// When true, render currency values with thousands separators.
    pub currency_grouping: bool,

    /// Optional currency symbol (e.g. "$") for display rendering.
    pub currency_symbol: Option<String>,

    /// When true and `currency_decimals` is set, pad to exactly that many
    /// decimal places.
    pub currency_fixed_decimals: bool,

    /// Text shown for values that could not be computed.
    pub placeholder: String,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            percent_decimals: 2,
            ratio_decimals: 2,
            currency_decimals: Some(2),
            currency_grouping: true,
            currency_symbol: Some("$".to_string()),
            currency_fixed_decimals: true,
            placeholder: "—".to_string(),
        }
    }
}

/// Settings for rebuilding series from brokerage exports.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReconstructConfig {
    /// Market data younger than this is not trusted to be final; the
    /// reconstruction end date is clamped to `now - delay`.
    pub market_data_delay_minutes: i64,

    /// Flat price used for a benchmark with no bars at all.
    pub fallback_benchmark_price: f64,

    /// Uniform market shocks for the risk scenarios.
    pub scenario_shocks: Vec<f64>,

    /// Number of positions listed in the concentration summary.
    pub top_positions: usize,
}

impl Default for ReconstructConfig {
    fn default() -> Self {
        Self {
            market_data_delay_minutes: 20,
            fallback_benchmark_price: 100.0,
            scenario_shocks: crate::analytics::risk::DEFAULT_SHOCKS.to_vec(),
            top_positions: 5,
        }
    }
}

impl ReconstructConfig {
    /// The configured delay, clamped to `0..=MAX_MARKET_DATA_DELAY_MINUTES`.
    pub fn market_data_delay(&self) -> chrono::Duration {
        let minutes = self
            .market_data_delay_minutes
            .clamp(0, MAX_MARKET_DATA_DELAY_MINUTES);
        chrono::Duration::try_minutes(minutes).unwrap_or_else(chrono::Duration::zero)
    }
}

/// Portfolio optimization defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OptimizeConfig {
    pub method: OptimizeMethod,
    pub cov_model: CovModel,
    pub return_model: ReturnModel,

    /// Price history used for the covariance estimate, counted back from the
    /// last position date.
    pub lookback: RangePreset,

    /// Symbols with fewer in-window prices are dropped from the universe.
    pub min_history_points: usize,

    /// Fewer common dates across the universe is an error.
    pub min_overlap_points: usize,

    /// Decay factor for the EWMA covariance.
    pub ewma_decay: f64,
}

impl Default for OptimizeConfig {
    fn default() -> Self {
        Self {
            method: OptimizeMethod::Hrp,
            cov_model: CovModel::Shrinkage,
            return_model: ReturnModel::ShrunkMean,
            lookback: RangePreset::Years(1),
            min_history_points: 30,
            min_overlap_points: 5,
            ewma_decay: 0.94,
        }
    }
}

impl OptimizeConfig {
    pub fn params(&self, analytics: &AnalyticsConfig) -> OptimizeParams {
        OptimizeParams {
            trading_days_per_year: analytics.trading_days_per_year,
            days_per_year: analytics.days_per_year,
            min_history_points: self.min_history_points,
            min_overlap_points: self.min_overlap_points,
            ewma_decay: self.ewma_decay,
        }
    }
}

/// Application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Backend connection settings.
    pub backend: BackendConfig,

    /// Metric conventions.
    pub analytics: AnalyticsConfig,

    /// Display/output formatting settings.
    pub display: DisplayConfig,

    /// Reconstruction and risk settings.
    pub reconstruct: ReconstructConfig,

    /// Optimization defaults.
    pub optimize: OptimizeConfig,
}

impl Config {
    /// Load config from a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        config.validate()?;
        Ok(config)
    }

    /// Load config from a file, or return default config if file doesn't exist.
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if path.exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    fn validate(&self) -> Result<()> {
        if self.analytics.trading_days_per_year <= 0.0 {
            anyhow::bail!("analytics.trading_days_per_year must be positive");
        }
        if self.analytics.days_per_year <= 0.0 {
            anyhow::bail!("analytics.days_per_year must be positive");
        }
        if self.analytics.min_annualization_days < 1 {
            anyhow::bail!("analytics.min_annualization_days must be at least 1");
        }
        if !(0..=MAX_MARKET_DATA_DELAY_MINUTES).contains(&self.reconstruct.market_data_delay_minutes) {
            anyhow::bail!(
                "reconstruct.market_data_delay_minutes must be between 0 and {MAX_MARKET_DATA_DELAY_MINUTES}"
            );
        }
        if !(self.optimize.ewma_decay > 0.0 && self.optimize.ewma_decay < 1.0) {
            anyhow::bail!("optimize.ewma_decay must be between 0 and 1 (exclusive)");
        }
        if self.optimize.min_overlap_points < 3 {
            anyhow::bail!("optimize.min_overlap_points must be at least 3");
        }
        Ok(())
    }
}

/// Returns the default config file path.
///
/// Resolution order:
/// 1. `./wealthwise.toml` if it exists in current directory
/// 2. `~/.config/wealthwise/wealthwise.toml` (XDG config directory)
pub fn default_config_path() -> PathBuf {
    let local_config = PathBuf::from("wealthwise.toml");
    if local_config.exists() {
        return local_config;
    }

    if let Some(config_dir) = dirs::config_dir() {
        return config_dir.join("wealthwise").join("wealthwise.toml");
    }

    local_config
}
