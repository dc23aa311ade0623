//! CLI definition and dispatch.

use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::info;

use crate::adapters::csv_adapter::CsvAdapter;
use crate::adapters::csv_report_adapter::CsvReportAdapter;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::domain::config_validation::{
    parse_optional_date, validate_backtest_config, validate_label_config,
};
use crate::domain::ensemble::majority_quorum;
use crate::domain::error::VoteTraderError;
use crate::domain::execution::SimulationParams;
use crate::domain::labeling::{label, label_distribution, LabelParams};
use crate::domain::price_series::PriceSeries;
use crate::domain::runner::{backtest_universe, SymbolBacktest, SymbolRun};
use crate::domain::universe::{load_universe, parse_models, parse_symbols};
use crate::ports::config_port::ConfigPort;
use crate::ports::data_port::DataPort;
use crate::ports::report_port::ReportPort;

const DEFAULT_OUTPUT_DIR: &str = "reports";

#[derive(Parser, Debug)]
#[command(
    name = "votetrader",
    about = "Triple-barrier labeling and ensemble-signal backtesting"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Label price series with triple-barrier outcomes
    Label {
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// Directory holding `{SYMBOL}.csv` price files
        #[arg(long)]
        data_dir: Option<PathBuf>,
        /// Comma-separated symbols
        #[arg(long)]
        symbols: Option<String>,
        #[arg(long)]
        look_forward: Option<usize>,
        #[arg(long)]
        take_profit: Option<f64>,
        #[arg(long)]
        stop_loss: Option<f64>,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Run the ensemble backtest
    Backtest {
        #[arg(short, long)]
        config: PathBuf,
        /// Comma-separated symbols, overriding [data] symbols
        #[arg(long)]
        symbols: Option<String>,
        /// Votes needed for a buy, overriding [ensemble] quorum
        #[arg(long)]
        quorum: Option<usize>,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Validate a configuration file
    Validate {
        #[arg(short, long)]
        config: PathBuf,
    },
    /// List symbols with a price file in a data directory
    ListSymbols {
        #[arg(long)]
        data_dir: PathBuf,
    },
}

pub fn run(cli: Cli) -> ExitCode {
    match cli.command {
        Command::Label {
            config,
            data_dir,
            symbols,
            look_forward,
            take_profit,
            stop_loss,
            output,
        } => run_label(
            config.as_ref(),
            LabelOverrides {
                data_dir,
                symbols,
                look_forward,
                take_profit,
                stop_loss,
                output,
            },
        ),
        Command::Backtest {
            config,
            symbols,
            quorum,
            output,
        } => run_backtest(&config, symbols.as_deref(), quorum, output.as_ref()),
        Command::Validate { config } => run_validate(&config),
        Command::ListSymbols { data_dir } => run_list_symbols(&data_dir),
    }
}

fn fail(err: &VoteTraderError) -> ExitCode {
    eprintln!("error: {err}");
    err.into()
}

pub fn load_config(path: &Path) -> Result<FileConfigAdapter, VoteTraderError> {
    FileConfigAdapter::from_file(path).map_err(|e| VoteTraderError::ConfigParse {
        file: path.display().to_string(),
        reason: e.to_string(),
    })
}

pub fn build_simulation_params(config: &dyn ConfigPort) -> Result<SimulationParams, VoteTraderError> {
    let defaults = SimulationParams::default();
    let window = config.get_int("simulation", "volume_window", defaults.volume_window as i64);
    let params = SimulationParams {
        initial_cash: config.get_double("simulation", "initial_cash", defaults.initial_cash),
        stop_loss_pct: config.get_double("simulation", "stop_loss_pct", defaults.stop_loss_pct),
        take_profit_pct: config.get_double(
            "simulation",
            "take_profit_pct",
            defaults.take_profit_pct,
        ),
        volume_threshold: config.get_double(
            "simulation",
            "volume_threshold",
            defaults.volume_threshold,
        ),
        investment_fraction: config.get_double(
            "simulation",
            "investment_fraction",
            defaults.investment_fraction,
        ),
        volume_window: usize::try_from(window).unwrap_or(0),
    };
    params.validate()?;
    Ok(params)
}

pub fn build_label_params(config: &dyn ConfigPort) -> LabelParams {
    let defaults = LabelParams::default();
    let look_forward = config.get_int("labeling", "look_forward", defaults.look_forward as i64);
    LabelParams {
        look_forward: usize::try_from(look_forward).unwrap_or(0),
        take_profit_return: config.get_double(
            "labeling",
            "take_profit_return",
            defaults.take_profit_return,
        ),
        stop_loss_return: config.get_double(
            "labeling",
            "stop_loss_return",
            defaults.stop_loss_return,
        ),
    }
}

/// CLI override, then `[ensemble] quorum`, then a simple majority.
pub fn resolve_quorum(quorum_override: Option<usize>, config: &dyn ConfigPort, models: usize) -> usize {
    if let Some(q) = quorum_override {
        return q;
    }
    match config.get_int("ensemble", "quorum", 0) {
        q if q > 0 => q as usize,
        _ => majority_quorum(models),
    }
}

pub fn resolve_symbols(
    symbols_override: Option<&str>,
    config: &dyn ConfigPort,
) -> Result<Vec<String>, VoteTraderError> {
    let raw = match symbols_override {
        Some(s) => s.to_string(),
        None => config
            .get_string("data", "symbols")
            .ok_or_else(|| VoteTraderError::ConfigMissing {
                section: "data".into(),
                key: "symbols".into(),
            })?,
    };
    parse_symbols(&raw).map_err(|e| VoteTraderError::ConfigInvalid {
        section: "data".into(),
        key: "symbols".into(),
        reason: e.to_string(),
    })
}

fn resolve_data_dir(
    dir_override: Option<PathBuf>,
    config: &dyn ConfigPort,
) -> Result<PathBuf, VoteTraderError> {
    dir_override
        .or_else(|| config.get_string("data", "directory").map(PathBuf::from))
        .ok_or_else(|| VoteTraderError::ConfigMissing {
            section: "data".into(),
            key: "directory".into(),
        })
}

fn resolve_output_dir(output_override: Option<PathBuf>, config: &dyn ConfigPort) -> PathBuf {
    output_override
        .or_else(|| config.get_string("report", "output_dir").map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT_DIR))
}

fn date_range(config: &dyn ConfigPort) -> Result<(NaiveDate, NaiveDate), VoteTraderError> {
    let start = parse_optional_date(config, "start_date")?.unwrap_or(NaiveDate::MIN);
    let end = parse_optional_date(config, "end_date")?.unwrap_or(NaiveDate::MAX);
    Ok((start, end))
}

pub struct LabelOverrides {
    pub data_dir: Option<PathBuf>,
    pub symbols: Option<String>,
    pub look_forward: Option<usize>,
    pub take_profit: Option<f64>,
    pub stop_loss: Option<f64>,
    pub output: Option<PathBuf>,
}

fn run_label(config_path: Option<&PathBuf>, overrides: LabelOverrides) -> ExitCode {
    match label_symbols(config_path, overrides) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => fail(&e),
    }
}

fn label_symbols(
    config_path: Option<&PathBuf>,
    overrides: LabelOverrides,
) -> Result<(), VoteTraderError> {
    let config = match config_path {
        Some(path) => {
            eprintln!("Loading config from {}", path.display());
            let config = load_config(path)?;
            validate_label_config(&config)?;
            config
        }
        None => FileConfigAdapter::empty(),
    };

    let mut params = build_label_params(&config);
    if let Some(lf) = overrides.look_forward {
        params.look_forward = lf;
    }
    if let Some(tp) = overrides.take_profit {
        params.take_profit_return = tp;
    }
    if let Some(sl) = overrides.stop_loss {
        params.stop_loss_return = sl;
    }
    params.validate()?;

    let data_dir = resolve_data_dir(overrides.data_dir, &config)?;
    let symbols = resolve_symbols(overrides.symbols.as_deref(), &config)?;
    let (start, end) = date_range(&config)?;
    let data_port = CsvAdapter::new(data_dir);
    let report = CsvReportAdapter::new(resolve_output_dir(overrides.output, &config));

    eprintln!(
        "Labeling {} symbols: look_forward={}, take_profit={}, stop_loss={}",
        symbols.len(),
        params.look_forward,
        params.take_profit_return,
        params.stop_loss_return,
    );

    for symbol in &symbols {
        let series = PriceSeries::new(data_port.fetch_ohlcv(symbol, start, end)?)?;
        let labels = label(&series, &params)?;
        info!(%symbol, bars = series.len(), labels = labels.len(), "labeled");

        let dist = label_distribution(&labels);
        eprintln!(
            "  {}:  {} labels, {} take-profit, {} stop-loss, {} expired ({:.1}% positive)",
            symbol,
            dist.total(),
            dist.take_profit,
            dist.stop_loss,
            dist.expired,
            dist.positive_rate() * 100.0,
        );

        report.write_labels(symbol, &labels)?;
        eprintln!("  Labels written to: {}", report.labels_path(symbol).display());
    }

    Ok(())
}

fn run_backtest(
    config_path: &Path,
    symbols_override: Option<&str>,
    quorum_override: Option<usize>,
    output_path: Option<&PathBuf>,
) -> ExitCode {
    // Stage 1: Load and validate config
    eprintln!("Loading config from {}", config_path.display());
    let config = match load_config(config_path) {
        Ok(c) => c,
        Err(e) => return fail(&e),
    };
    if let Err(e) = validate_backtest_config(&config) {
        return fail(&e);
    }

    match run_backtest_pipeline(&config, symbols_override, quorum_override, output_path) {
        Ok(code) => code,
        Err(e) => fail(&e),
    }
}

pub fn run_backtest_pipeline(
    config: &dyn ConfigPort,
    symbols_override: Option<&str>,
    quorum_override: Option<usize>,
    output_path: Option<&PathBuf>,
) -> Result<ExitCode, VoteTraderError> {
    // Stage 2: Resolve parameters
    let params = build_simulation_params(config)?;
    let symbols = resolve_symbols(symbols_override, config)?;
    let models_raw = config.get_string("data", "models").unwrap_or_default();
    let models = parse_models(&models_raw).map_err(|e| VoteTraderError::ConfigInvalid {
        section: "data".into(),
        key: "models".into(),
        reason: e.to_string(),
    })?;
    let quorum = resolve_quorum(quorum_override, config, models.len());
    let risk_free_rate = config.get_double("report", "risk_free_rate", 0.0);
    let (start, end) = date_range(config)?;
    let data_dir = resolve_data_dir(None, config)?;

    // Stage 3: Load prices and model signals
    let adapter = CsvAdapter::new(data_dir);
    let universe = load_universe(&adapter, &adapter, &symbols, &models, start, end)?;

    eprintln!(
        "Running backtest: {} symbols, {} models, quorum {} of {}",
        universe.loaded.len(),
        models.len(),
        quorum,
        models.len(),
    );
    for skipped in &universe.skipped {
        eprintln!("warning: skipping {} ({})", skipped.symbol, skipped.reason);
    }

    // Stage 4: Simulate each symbol
    let runs = backtest_universe(&universe.loaded, quorum, &params, risk_free_rate);

    // Stage 5: Console summary
    print_summary(&runs);

    // Stage 6: Write reports
    let report = CsvReportAdapter::new(resolve_output_dir(output_path.cloned(), config));
    let mut completed = 0usize;
    for backtest in runs.iter().filter_map(SymbolRun::completed) {
        report.write_backtest(&backtest.symbol, &backtest.result, &backtest.metrics)?;
        completed += 1;
    }

    if completed == 0 {
        // every symbol failed on a parameter, or none had overlapping dates
        if let Some(SymbolRun::Failed { error, .. }) =
            runs.iter().find(|r| matches!(r, SymbolRun::Failed { .. }))
        {
            return Ok(fail(error));
        }
        return Err(VoteTraderError::NoData {
            symbol: symbols.join(","),
        });
    }

    eprintln!("\nReports written to: {}", report.output_dir().display());
    Ok(ExitCode::SUCCESS)
}

fn print_backtest(b: &SymbolBacktest) {
    let m = &b.metrics;
    eprintln!("\n=== {} ===", b.symbol);
    eprintln!("Final Equity:     {:.2}", b.result.final_equity());
    eprintln!("Total Return:     {:.2}%", m.total_return * 100.0);
    eprintln!("Buy & Hold:       {:.2}%", m.buy_and_hold_return * 100.0);
    eprintln!("Excess Return:    {:.2}%", m.excess_return * 100.0);
    eprintln!("Annualized:       {:.2}%", m.annualized_return * 100.0);
    eprintln!("Sharpe Ratio:     {:.2}", m.sharpe_ratio);
    eprintln!("Sortino Ratio:    {:.2}", m.sortino_ratio);
    eprintln!("Max Drawdown:     -{:.1}%", m.max_drawdown * 100.0);
    eprintln!("Total Trades:     {}", m.total_trades);
    eprintln!("Win Rate:         {:.1}%", m.win_rate * 100.0);
    eprintln!("Profit Factor:    {:.2}", m.profit_factor);
    eprintln!(
        "Exits:            {} stop-loss, {} take-profit, {} signal",
        m.stop_loss_exits, m.take_profit_exits, m.signal_exits
    );
    if b.result.skipped_signal_dates > 0 {
        eprintln!(
            "Skipped Dates:    {} signal dates without prices",
            b.result.skipped_signal_dates
        );
    }
}

fn print_summary(runs: &[SymbolRun]) {
    for run in runs {
        match run {
            SymbolRun::Completed(b) => print_backtest(b),
            SymbolRun::NoData {
                symbol,
                skipped_signal_dates,
            } => eprintln!(
                "\n=== {} ===\nNo overlapping dates ({} signal dates without prices)",
                symbol, skipped_signal_dates
            ),
            SymbolRun::Failed { symbol, error } => {
                eprintln!("\n=== {} ===\nerror: {}", symbol, error)
            }
        }
    }
}

fn run_validate(config_path: &Path) -> ExitCode {
    eprintln!("Validating config: {}", config_path.display());
    let config = match load_config(config_path) {
        Ok(c) => c,
        Err(e) => return fail(&e),
    };

    if let Err(e) = validate_backtest_config(&config) {
        return fail(&e);
    }
    if let Err(e) = validate_label_config(&config) {
        return fail(&e);
    }

    // validation above guarantees these resolve
    let symbols = resolve_symbols(None, &config).unwrap_or_default();
    let models = config
        .get_string("data", "models")
        .and_then(|m| parse_models(&m).ok())
        .unwrap_or_default();
    let quorum = resolve_quorum(None, &config, models.len());
    let params = match build_simulation_params(&config) {
        Ok(p) => p,
        Err(e) => return fail(&e),
    };
    let labels = build_label_params(&config);

    eprintln!("\nUniverse:");
    eprintln!("  symbols: {}", symbols.join(", "));
    eprintln!("  models:  {} (quorum {})", models.join(", "), quorum);
    eprintln!("\nSimulation:");
    eprintln!("  initial_cash:        {}", params.initial_cash);
    eprintln!("  stop_loss_pct:       {}", params.stop_loss_pct);
    eprintln!("  take_profit_pct:     {}", params.take_profit_pct);
    eprintln!("  volume_threshold:    {}", params.volume_threshold);
    eprintln!("  investment_fraction: {}", params.investment_fraction);
    eprintln!("  volume_window:       {}", params.volume_window);
    eprintln!("\nLabeling:");
    eprintln!("  look_forward:        {}", labels.look_forward);
    eprintln!("  take_profit_return:  {}", labels.take_profit_return);
    eprintln!("  stop_loss_return:    {}", labels.stop_loss_return);

    eprintln!("\nConfiguration is valid.");
    ExitCode::SUCCESS
}

fn run_list_symbols(data_dir: &Path) -> ExitCode {
    let adapter = CsvAdapter::new(data_dir.to_path_buf());
    let symbols = match adapter.list_symbols() {
        Ok(s) => s,
        Err(e) => return fail(&e),
    };

    if symbols.is_empty() {
        eprintln!("No price files found in {}", data_dir.display());
    } else {
        for symbol in &symbols {
            println!("{}", symbol);
        }
        eprintln!("{} symbols found", symbols.len());
    }
    ExitCode::SUCCESS
}
