use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};
use wealthwise::analytics::optimize::{Constraints, CovModel, OptimizeMethod, ReturnModel};
use wealthwise::analytics::ChartMode;
use wealthwise::app::{self, OptimizeArgs, ReconstructInputs, ReportRequest, WindowArgs};
use wealthwise::clock::SystemClock;
use wealthwise::config::{default_config_path, Config};
use wealthwise::format::{format_currency, format_percent};
use wealthwise::payload::PerformancePayload;
use wealthwise::provider::{HttpSeriesProvider, JsonFileProvider, SeriesProvider};
use wealthwise::range::RangePreset;

#[derive(Parser)]
#[command(name = "wealthwise")]
#[command(about = "Windowed portfolio performance analytics")]
#[command(version, long_version = concat!(env!("CARGO_PKG_VERSION"), " (", env!("GIT_COMMIT_HASH"), ")"))]
struct Cli {
    /// Path to config file
    #[arg(short, long, global = true, default_value_os_t = default_config_path())]
    config: PathBuf,

    /// Print machine-readable JSON instead of tables
    #[arg(long, global = true)]
    json: bool,

    /// Emit logs as JSON lines on stderr
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Args)]
struct SourceArgs {
    /// Performance payload JSON file
    #[arg(long, conflicts_with = "remote")]
    input: Option<PathBuf>,

    /// Fetch the payload from the backend
    #[arg(long)]
    remote: bool,

    /// Override the backend base URL from the config
    #[arg(long, requires = "remote")]
    backend_url: Option<String>,

    /// Override the backend request timeout (seconds)
    #[arg(long, requires = "remote")]
    timeout: Option<u64>,
}

#[derive(Args)]
struct WindowCliArgs {
    /// First day of the window (YYYY-MM-DD)
    #[arg(long)]
    start: Option<NaiveDate>,

    /// Last day of the window (YYYY-MM-DD)
    #[arg(long)]
    end: Option<NaiveDate>,

    /// Lookback such as 7d, 4w, 3m, 1y, ytd or all
    #[arg(long)]
    range: Option<RangePreset>,

    /// Benchmark for beta and correlation
    #[arg(long)]
    benchmark: Option<String>,
}

impl WindowCliArgs {
    fn request(&self) -> ReportRequest {
        ReportRequest {
            window: WindowArgs {
                start: self.start,
                end: self.end,
                range: self.range,
            },
            benchmark: self.benchmark.clone(),
            ..Default::default()
        }
    }
}

#[derive(Subcommand)]
enum Command {
    /// Show current configuration
    Config,

    /// Portfolio metrics over a window
    Report {
        #[command(flatten)]
        source: SourceArgs,
        #[command(flatten)]
        window: WindowCliArgs,
    },

    /// Per-holding value and gain over a window
    Holdings {
        #[command(flatten)]
        source: SourceArgs,
        #[command(flatten)]
        window: WindowCliArgs,
    },

    /// Chart rows for the portfolio, benchmarks and overlays
    Chart {
        #[command(flatten)]
        source: SourceArgs,
        #[command(flatten)]
        window: WindowCliArgs,

        /// Price series to draw next to the portfolio (repeatable)
        #[arg(long = "overlay")]
        overlays: Vec<String>,

        /// indexed or value
        #[arg(long)]
        mode: Option<ChartMode>,
    },

    /// Parse a brokerage positions CSV export
    ImportPositions {
        /// Positions CSV file
        file: PathBuf,
    },

    /// Rebuild a performance payload from brokerage exports
    Reconstruct {
        /// Positions CSV export
        #[arg(long)]
        positions: PathBuf,

        /// Transactions JSON export
        #[arg(long)]
        transactions: PathBuf,

        /// Daily bars JSON ({"SYMBOL": [{"t", "o", "h", "l", "c", "v"}]})
        #[arg(long)]
        bars: Option<PathBuf>,

        /// Write the payload here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Suggest a long-only allocation for the current holdings
    Optimize {
        #[command(flatten)]
        source: SourceArgs,

        /// List the available methods and exit
        #[arg(long)]
        list_methods: bool,

        /// equal_weight, inverse_vol, gmv, risk_parity, hrp or max_diversification
        #[arg(long)]
        method: Option<OptimizeMethod>,

        /// Price history to use, counted back from --end (e.g. 1y, 3y, all)
        #[arg(long)]
        lookback: Option<RangePreset>,

        /// Holdings date (YYYY-MM-DD); defaults to the last position snapshot
        #[arg(long)]
        end: Option<NaiveDate>,

        /// sample, shrinkage or ewma
        #[arg(long)]
        cov_model: Option<CovModel>,

        /// historical_mean, shrunk_mean or momentum
        #[arg(long)]
        return_model: Option<ReturnModel>,

        /// Benchmark curve for the backtest
        #[arg(long)]
        benchmark: Option<String>,

        /// Symbols to allocate across instead of current holdings (repeatable)
        #[arg(long)]
        universe: Vec<String>,

        /// Smallest weight per position (0-1)
        #[arg(long)]
        min_position: Option<f64>,

        /// Largest weight per position (0-1)
        #[arg(long)]
        max_position: Option<f64>,

        /// Cap on total absolute weight change (0-2)
        #[arg(long)]
        max_turnover: Option<f64>,

        /// Currency budget for buys
        #[arg(long)]
        budget: Option<f64>,
    },

    /// Concentration, stress scenarios and market risk of a positions export
    Risk {
        /// Positions CSV export
        #[arg(long)]
        positions: PathBuf,

        /// Daily bars JSON used for volatility, drawdown and beta
        #[arg(long)]
        bars: Option<PathBuf>,
    },
}

async fn load_payload(source: &SourceArgs, config: &Config) -> Result<PerformancePayload> {
    let provider: Box<dyn SeriesProvider> = match (&source.input, source.remote) {
        (Some(path), _) => Box::new(JsonFileProvider::new(path)),
        (None, true) => {
            let mut provider = HttpSeriesProvider::new(&config.backend)?;
            if let Some(url) = &source.backend_url {
                provider = provider.with_base_url(url);
            }
            if let Some(secs) = source.timeout {
                provider = provider.with_timeout(Duration::from_secs(secs))?;
            }
            Box::new(provider)
        }
        (None, false) => anyhow::bail!("Pass --input <payload.json> or --remote"),
    };
    tracing::debug!(provider = provider.name(), "loading payload");
    provider.load().await
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn print_warnings(warnings: &[String]) {
    for warning in warnings {
        eprintln!("warning: {warning}");
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let layer = fmt::layer().with_writer(std::io::stderr).with_target(true);
    if cli.log_json {
        tracing_subscriber::registry()
            .with(filter)
            .with(layer.json())
            .init();
    } else {
        tracing_subscriber::registry().with(filter).with(layer).init();
    }

    let config = Config::load_or_default(&cli.config)
        .with_context(|| format!("Failed to load config: {}", cli.config.display()))?;

    match cli.command {
        Command::Config => {
            let output = app::config_output(&cli.config, &config);
            if cli.json {
                print_json(&output)?;
            } else {
                println!("Config file: {}", cli.config.display());
                println!("Backend: {}", config.backend.performance_url());
                println!("Benchmarks: {}", config.analytics.benchmarks.join(", "));
                println!("Default range: {}", config.analytics.default_range);
                println!("Chart mode: {}", config.analytics.chart_mode);
                println!("Optimizer: {} ({} covariance)", config.optimize.method, config.optimize.cov_model);
            }
        }

        Command::Report { source, window } => {
            let payload = load_payload(&source, &config).await?;
            let output = app::performance_report(&payload, &config, &window.request());
            if cli.json {
                return print_json(&output);
            }
            println!("Window: {} ({} points)", output.window, output.portfolio_points);
            if let Some(benchmark) = &output.benchmark {
                println!("Benchmark: {benchmark}");
            }
            for (label, value) in output.display.rows() {
                println!("  {label:<14} {value:>14}");
            }
            print_warnings(&output.warnings);
        }

        Command::Holdings { source, window } => {
            let payload = load_payload(&source, &config).await?;
            let output = app::holdings_report(&payload, &config, &window.request());
            if cli.json {
                return print_json(&output);
            }
            let display = &config.display;
            println!("Window: {}", output.window);
            println!(
                "{:<8} {:<28} {:>12} {:>16} {:>14} {:>9}",
                "Symbol", "Description", "Shares", "Value", "Gain", "Gain %"
            );
            for h in &output.holdings {
                println!(
                    "{:<8} {:<28} {:>12.4} {:>16} {:>14} {:>9}",
                    h.symbol,
                    h.description.chars().take(28).collect::<String>(),
                    h.shares,
                    format_currency(Some(h.current_value), display),
                    format_currency(h.gain_abs, display),
                    format_percent(h.gain_pct, display.percent_decimals, &display.placeholder),
                );
            }
            println!("Total: {}", format_currency(Some(output.total_value), display));
            print_warnings(&output.warnings);
        }

        Command::Chart {
            source,
            window,
            overlays,
            mode,
        } => {
            let payload = load_payload(&source, &config).await?;
            let request = ReportRequest {
                overlays,
                mode,
                ..window.request()
            };
            let output = app::chart_report(&payload, &config, &request);
            if cli.json {
                return print_json(&output);
            }
            println!("date,{}", output.series.join(","));
            for row in &output.rows {
                let cells: Vec<String> = output
                    .series
                    .iter()
                    .map(|key| row.get(key).map(|v| format!("{v:.4}")).unwrap_or_default())
                    .collect();
                println!("{},{}", row.date, cells.join(","));
            }
            print_warnings(&output.warnings);
        }

        Command::ImportPositions { file } => {
            let output = app::import_positions(&file)?;
            if cli.json {
                return print_json(&output);
            }
            if let Some(name) = &output.account_name {
                println!("Account: {name}");
            }
            if let Some(as_of) = &output.as_of {
                println!("As of: {as_of}");
            }
            println!("Positions: {}", output.symbols.join(", "));
            println!("Cash: {}", output.cash);
            println!("Rows: {}", output.rows.len());
        }

        Command::Reconstruct {
            positions,
            transactions,
            bars,
            output,
        } => {
            let payload = app::reconstruct_payload(
                &config,
                &SystemClock,
                ReconstructInputs {
                    positions_csv: &positions,
                    transactions_json: &transactions,
                    bars_json: bars.as_deref(),
                },
            )?;
            let json = payload.to_json_pretty()?;
            match output {
                Some(path) => {
                    std::fs::write(&path, json)
                        .with_context(|| format!("Failed to write {}", path.display()))?;
                    tracing::info!(path = %path.display(), "wrote performance payload");
                }
                None => println!("{json}"),
            }
            print_warnings(&payload.warnings);
        }

        Command::Optimize {
            source,
            list_methods,
            method,
            lookback,
            end,
            cov_model,
            return_model,
            benchmark,
            universe,
            min_position,
            max_position,
            max_turnover,
            budget,
        } => {
            if list_methods {
                let methods = app::optimization_methods();
                if cli.json {
                    return print_json(&methods);
                }
                for m in &methods {
                    println!("{:<20} {:<18} {}", m.key, m.goal, m.description);
                }
                return Ok(());
            }
            let payload = load_payload(&source, &config).await?;
            let args = OptimizeArgs {
                end,
                lookback,
                method,
                cov_model,
                return_model,
                benchmark,
                universe,
                constraints: Constraints {
                    min_position_pct: min_position,
                    max_position_pct: max_position,
                    max_turnover,
                    rebalance_budget: budget,
                },
            };
            let output = app::optimize_portfolio(&payload, &config, &args)?;
            if cli.json {
                return print_json(&output);
            }
            let result = &output.result;
            let display = &config.display;
            let pct = |v: f64| format_percent(Some(v), display.percent_decimals, &display.placeholder);
            println!(
                "{} ({}) over {} [{} covariance]",
                result.method.label(),
                result.goal,
                result.window,
                output.covariance_model
            );
            println!("{:<8} {:>10} {:>10} {:>10}", "Symbol", "Target", "Current", "Equal");
            for symbol in &result.universe {
                let weight = |w: &std::collections::BTreeMap<String, f64>| {
                    pct(w.get(symbol).copied().unwrap_or_default())
                };
                println!(
                    "{:<8} {:>10} {:>10} {:>10}",
                    symbol,
                    weight(&result.weights.recommended),
                    weight(&result.weights.current),
                    weight(&result.weights.equal_weight),
                );
            }
            println!("Trades:");
            for t in &result.trades {
                println!(
                    "  {:<8} {:<4} {:>12.4} {:>16}",
                    t.symbol,
                    t.action.to_string(),
                    t.shares,
                    format_currency(Some(t.notional), display)
                );
            }
            for (name, m) in &result.metrics {
                println!(
                    "  {:<14} return {:>9}  vol {:>9}  sharpe {:>6}",
                    name,
                    format_percent(m.metrics.total_return, display.percent_decimals, &display.placeholder),
                    format_percent(m.metrics.volatility, display.percent_decimals, &display.placeholder),
                    m.metrics
                        .sharpe
                        .map(|s| format!("{s:.2}"))
                        .unwrap_or_else(|| display.placeholder.clone()),
                );
            }
            print_warnings(&result.warnings);
        }

        Command::Risk { positions, bars } => {
            let output = app::risk_report(&config, &positions, bars.as_deref())?;
            if cli.json {
                return print_json(&output);
            }
            let display = &config.display;
            println!(
                "Portfolio value: {}",
                format_currency(Some(output.portfolio_value), display)
            );
            println!("Herfindahl index: {:.4}", output.herfindahl_index);
            println!("Top positions:");
            for p in &output.top_positions {
                println!(
                    "  {:<8} {:>9}",
                    p.symbol,
                    format_percent(Some(p.weight), display.percent_decimals, &display.placeholder)
                );
            }
            println!("Scenarios:");
            for s in &output.scenarios {
                println!(
                    "  {:>8} {:>16}",
                    format_percent(Some(s.shock), 0, &display.placeholder),
                    format_currency(Some(s.portfolio_change), display)
                );
            }
            if let Some(market) = &output.market {
                let pct = |v| format_percent(v, display.percent_decimals, &display.placeholder);
                println!("Market risk vs {} ({} days):", market.benchmark, market.coverage_days);
                println!("  Volatility    {:>10}", pct(market.volatility));
                println!("  Max drawdown  {:>10}", pct(market.max_drawdown));
                println!(
                    "  Beta          {:>10}",
                    market.beta.map(|b| format!("{b:.2}")).unwrap_or_else(|| display.placeholder.clone())
                );
            }
            print_warnings(&output.warnings);
        }
    }

    Ok(())
}
