//! CLI definition and dispatch.

use clap::{Parser, Subcommand};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use crate::adapters::csv_adapter::CsvAdapter;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::adapters::trade_log::TracingTradeLog;
use crate::domain::backtest::{BacktestConfig, BacktestEngine, BacktestResult};
use crate::domain::config_validation::{
    parse_optional_date, validate_backtest_config, validate_strategy_config,
};
use crate::domain::error::BacktestError;
use crate::domain::price_series::PriceSeries;
use crate::domain::strategy::{Strategy, StrategyKind, StrategyParams};
use crate::domain::vectorized::{run_vectorized, VectorizedResult};
use crate::ports::config_port::ConfigPort;
use crate::ports::data_port::DataPort;
use crate::ports::trade_observer::TradeObserver;

const RULE_WIDTH: usize = 55;

#[derive(Parser, Debug)]
#[command(name = "bartrader", about = "Event-driven single-asset strategy backtester")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run one strategy over a price series
    Backtest {
        #[arg(short, long)]
        config: PathBuf,
        /// CSV price file, overriding [data] path
        #[arg(short, long)]
        data: Option<PathBuf>,
        /// sma, momentum or mean_reversion, overriding [strategy] kind
        #[arg(short, long)]
        strategy: Option<String>,
        /// Log every trade
        #[arg(short, long)]
        verbose: bool,
    },
    /// Run all three strategies on one engine and compare them
    Compare {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(short, long)]
        data: Option<PathBuf>,
        #[arg(short, long)]
        verbose: bool,
    },
    /// Validate a configuration file
    Validate {
        #[arg(short, long)]
        config: PathBuf,
    },
}

pub fn run(cli: Cli) -> ExitCode {
    let outcome = match cli.command {
        Command::Backtest {
            config,
            data,
            strategy,
            verbose,
        } => run_backtest(&config, data.as_deref(), strategy.as_deref(), verbose),
        Command::Compare {
            config,
            data,
            verbose,
        } => run_compare(&config, data.as_deref(), verbose),
        Command::Validate { config } => run_validate(&config),
    };

    match outcome {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            (&e).into()
        }
    }
}

pub fn load_config(path: &Path) -> Result<FileConfigAdapter, BacktestError> {
    tracing::info!("Loading config from {}", path.display());
    let adapter = FileConfigAdapter::from_file(path)?;
    validate_backtest_config(&adapter)?;
    validate_strategy_config(&adapter)?;
    Ok(adapter)
}

fn run_validate(config_path: &Path) -> Result<(), BacktestError> {
    let adapter = load_config(config_path)?;
    let config = build_backtest_config(&adapter);
    let strategy = resolve_strategy(None, &adapter)?;
    strategy.validate()?;
    writeln!(
        io::stdout().lock(),
        "{}: ok ({} | initial amount {:.2} | fixed costs {} | proportional costs {})",
        config_path.display(),
        strategy,
        config.initial_amount,
        config.fixed_cost,
        config.proportional_cost
    )?;
    Ok(())
}

fn run_backtest(
    config_path: &Path,
    data_override: Option<&Path>,
    strategy_override: Option<&str>,
    verbose: bool,
) -> Result<(), BacktestError> {
    let adapter = load_config(config_path)?;
    let mut config = build_backtest_config(&adapter);
    config.verbose |= verbose;
    let strategy = resolve_strategy(strategy_override, &adapter)?;

    let series = load_series(&adapter, data_override)?;
    let mut engine = BacktestEngine::new(series, &config);
    let mut log = TracingTradeLog::new();

    let result = engine.run(&strategy, Some(&mut log as &mut dyn TradeObserver))?;
    io::stdout()
        .lock()
        .write_all(format_run_report(&result, &config).as_bytes())?;
    Ok(())
}

fn run_compare(
    config_path: &Path,
    data_override: Option<&Path>,
    verbose: bool,
) -> Result<(), BacktestError> {
    let adapter = load_config(config_path)?;
    let mut config = build_backtest_config(&adapter);
    config.verbose |= verbose;
    let params = build_strategy_params(&adapter);
    let strategies: Vec<Strategy> = StrategyKind::ALL
        .iter()
        .map(|&kind| Strategy::from_kind(kind, &params))
        .collect();

    let series = load_series(&adapter, data_override)?;
    let mut engine = BacktestEngine::new(series, &config);
    let mut log = TracingTradeLog::new();
    let results = engine.run_all(&strategies, Some(&mut log as &mut dyn TradeObserver))?;

    let mut out = io::stdout().lock();
    for result in &results {
        let check = run_vectorized(
            engine.series(),
            &result.strategy,
            config.initial_amount,
            config.proportional_cost,
        )?;
        write_comparison(&mut out, result, &check, &config)?;
    }
    Ok(())
}

/// Run report followed by the buy-and-hold benchmark and vectorized check.
pub fn write_comparison<W: Write>(
    out: &mut W,
    result: &BacktestResult,
    check: &VectorizedResult,
    config: &BacktestConfig,
) -> Result<(), BacktestError> {
    out.write_all(format_run_report(result, config).as_bytes())?;
    writeln!(out, "Buy and hold    [%] {:.2}", result.buy_and_hold_pct)?;
    writeln!(out, "Outperformance  [%] {:+.2}", result.outperformance_pct())?;
    writeln!(
        out,
        "Vectorized      [$] {:.2} (vs buy and hold {:+.2})",
        check.absolute, check.outperformance
    )?;
    Ok(())
}

/// Header plus summary block for one strategy run.
pub fn format_run_report(result: &BacktestResult, config: &BacktestConfig) -> String {
    format!(
        "\nRunning {} strategy | {}\nfixed costs {} | proportional costs {}\n{}\n{}\n",
        result.strategy.name(),
        result.strategy,
        config.fixed_cost,
        config.proportional_cost,
        "=".repeat(RULE_WIDTH),
        result.summary
    )
}

pub fn build_backtest_config(adapter: &dyn ConfigPort) -> BacktestConfig {
    let defaults = BacktestConfig::default();
    BacktestConfig {
        initial_amount: adapter.get_double("backtest", "initial_amount", defaults.initial_amount),
        fixed_cost: adapter.get_double("backtest", "fixed_cost", defaults.fixed_cost),
        proportional_cost: adapter.get_double(
            "backtest",
            "proportional_cost",
            defaults.proportional_cost,
        ),
        verbose: adapter.get_bool("backtest", "verbose", defaults.verbose),
        strict: adapter.get_bool("backtest", "strict", defaults.strict),
    }
}

pub fn build_strategy_params(adapter: &dyn ConfigPort) -> StrategyParams {
    let defaults = StrategyParams::default();
    StrategyParams {
        sma1: adapter.get_usize("strategy", "sma1", defaults.sma1),
        sma2: adapter.get_usize("strategy", "sma2", defaults.sma2),
        momentum: adapter.get_usize("strategy", "momentum", defaults.momentum),
        sma: adapter.get_usize("strategy", "sma", defaults.sma),
        threshold: adapter.get_double("strategy", "threshold", defaults.threshold),
    }
}

/// Strategy kind from the override, else `[strategy] kind`, else SMA crossover.
pub fn resolve_strategy(
    kind_override: Option<&str>,
    adapter: &dyn ConfigPort,
) -> Result<Strategy, BacktestError> {
    let kind = match kind_override
        .map(str::to_string)
        .or_else(|| adapter.get_string("strategy", "kind"))
    {
        Some(name) => name.parse::<StrategyKind>().map_err(|reason| {
            BacktestError::ConfigInvalid {
                section: "strategy".into(),
                key: "kind".into(),
                reason,
            }
        })?,
        None => StrategyKind::SmaCrossover,
    };
    Ok(Strategy::from_kind(kind, &build_strategy_params(adapter)))
}

pub fn resolve_data_path(
    data_override: Option<&Path>,
    adapter: &dyn ConfigPort,
) -> Result<PathBuf, BacktestError> {
    match data_override {
        Some(path) => Ok(path.to_path_buf()),
        None => adapter
            .get_string("data", "path")
            .filter(|p| !p.trim().is_empty())
            .map(PathBuf::from)
            .ok_or_else(|| BacktestError::ConfigMissing {
                section: "data".into(),
                key: "path".into(),
            }),
    }
}

pub fn load_series(
    adapter: &dyn ConfigPort,
    data_override: Option<&Path>,
) -> Result<PriceSeries, BacktestError> {
    let path = resolve_data_path(data_override, adapter)?;
    let price_column = adapter
        .get_string("data", "price_column")
        .unwrap_or_else(|| "close".to_string());
    let start = parse_optional_date(adapter, "start_date")?;
    let end = parse_optional_date(adapter, "end_date")?;

    tracing::info!("Loading {} prices from {}", price_column, path.display());
    let data_port = CsvAdapter::new(path, price_column);
    let series = data_port.fetch_prices(start, end)?;
    tracing::info!(bars = series.len(), "series loaded");
    Ok(series)
}
