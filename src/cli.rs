//! CLI definition and dispatch.

use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use crate::adapters::csv_adapter::CsvAdapter;
use crate::adapters::csv_report_adapter::CsvReportAdapter;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::domain::backtest::BacktestConfig;
use crate::domain::config::{DEFAULT_DOLLAR_VOLUME_WINDOW, Eligibility, IndexConfig, Weighting};
use crate::domain::config_validation::{
    parse_date, validate_backtest_config, validate_index_config,
};
use crate::domain::error::IndexError;
use crate::domain::performance::Performance;
use crate::domain::pipeline::{IndexPipeline, PipelineOutput};
use crate::domain::universe::{SkippedCode, load_panel, parse_names, resolve_universe};
use crate::ports::config_port::ConfigPort;
use crate::ports::data_port::DataPort;
use crate::ports::report_port::ReportPort;

#[derive(Parser, Debug)]
#[command(name = "idxbench", about = "Benchmark index backtester")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Build the configured index and report its returns
    Backtest {
        #[arg(short, long)]
        config: PathBuf,
        /// Write daily returns to this CSV file
        #[arg(short, long)]
        output: Option<PathBuf>,
        #[arg(long)]
        dry_run: bool,
    },
    /// Validate an index configuration
    Validate {
        #[arg(short, long)]
        config: PathBuf,
    },
    /// List instruments available for a data source
    ListSymbols {
        #[arg(short, long)]
        config: PathBuf,
        /// Data source identifier; defaults to [index] db
        #[arg(long)]
        db: Option<String>,
    },
}

/// Installs the stderr log subscriber. `RUST_LOG` overrides the default
/// `info` level.
pub fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

pub fn run(cli: Cli) -> ExitCode {
    let result = match cli.command {
        Command::Backtest {
            config,
            output,
            dry_run,
        } => {
            if dry_run {
                run_dry_run(&config)
            } else {
                run_backtest(&config, output.as_deref())
            }
        }
        Command::Validate { config } => run_validate(&config),
        Command::ListSymbols { config, db } => run_list_symbols(&config, db.as_deref()),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e}");
            (&e).into()
        }
    }
}

pub fn load_config(path: &Path) -> Result<FileConfigAdapter, IndexError> {
    FileConfigAdapter::from_file(path).map_err(|e| IndexError::ConfigParse {
        file: path.display().to_string(),
        reason: e.to_string(),
    })
}

pub fn build_backtest_config(adapter: &dyn ConfigPort) -> Result<BacktestConfig, IndexError> {
    let start_date = parse_date(
        adapter.get_string("backtest", "start_date").as_deref(),
        "start_date",
    )?;
    let end_date = parse_date(
        adapter.get_string("backtest", "end_date").as_deref(),
        "end_date",
    )?;
    let data_path = adapter
        .get_string("data", "path")
        .filter(|s| !s.trim().is_empty())
        .ok_or_else(|| IndexError::ConfigMissing {
            section: "data".into(),
            key: "path".into(),
        })?;

    Ok(BacktestConfig {
        start_date,
        end_date,
        data_path: PathBuf::from(data_path.trim()),
        risk_free_rate: adapter.get_double("backtest", "risk_free_rate", 0.0),
    })
}

pub fn build_index_config(adapter: &dyn ConfigPort) -> Result<IndexConfig, IndexError> {
    let required = |key: &str| {
        adapter
            .get_string("index", key)
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .ok_or_else(|| IndexError::ConfigMissing {
                section: "index".into(),
                key: key.into(),
            })
    };
    let invalid = |key: &str, reason: String| IndexError::ConfigInvalid {
        section: "index".into(),
        key: key.into(),
        reason,
    };

    let weighting = match adapter.get_string("index", "weighting") {
        Some(s) => s
            .parse::<Weighting>()
            .map_err(|reason| invalid("weighting", reason))?,
        None => Weighting::Equal,
    };

    let mut config = IndexConfig::new(required("code")?, required("db")?, weighting);

    if let Some(fields) = adapter.get_string("index", "fields") {
        config.fields = parse_names(&fields);
    }
    if let Some(universes) = adapter.get_string("index", "universes") {
        config.universes = parse_names(&universes);
    }
    if let Some(excluded) = adapter.get_string("index", "exclude_universes") {
        config.exclude_universes = parse_names(&excluded);
    }

    let window = adapter.get_int(
        "index",
        "dollar_volume_window",
        DEFAULT_DOLLAR_VOLUME_WINDOW as i64,
    );
    config.dollar_volume_window = usize::try_from(window)
        .ok()
        .filter(|w| *w >= 1)
        .ok_or_else(|| invalid("dollar_volume_window", "must be at least 1".into()))?;

    config.min_dollar_volume = adapter
        .get_opt_double("index", "min_dollar_volume")
        .map_err(|raw| invalid("min_dollar_volume", format!("not a number: {raw}")))?
        .unwrap_or(0.0);
    config.dollar_volume_top_n_pct = adapter
        .get_opt_double("index", "dollar_volume_top_n_pct")
        .map_err(|raw| invalid("dollar_volume_top_n_pct", format!("not a number: {raw}")))?;

    Ok(config)
}

/// Loads, validates and builds both configuration records.
pub fn load_run_config(
    adapter: &dyn ConfigPort,
) -> Result<(IndexConfig, BacktestConfig), IndexError> {
    validate_index_config(adapter)?;
    validate_backtest_config(adapter)?;
    Ok((build_index_config(adapter)?, build_backtest_config(adapter)?))
}

pub struct BacktestRun {
    pub output: PipelineOutput,
    pub performance: Performance,
    pub skipped: Vec<SkippedCode>,
}

/// Resolves the universe, loads the panel and runs the pipeline.
pub fn execute_backtest(
    data_port: &dyn DataPort,
    config_port: &dyn ConfigPort,
    index: &IndexConfig,
    bt_config: &BacktestConfig,
) -> Result<BacktestRun, IndexError> {
    let universe = resolve_universe(index, config_port, data_port)?;
    info!(codes = universe.count(), db = %universe.db, "resolved universe");

    let loaded = load_panel(
        data_port,
        &universe,
        bt_config.start_date,
        bt_config.end_date,
    )?;

    let pipeline = IndexPipeline::new(index.clone());
    let output = pipeline.run(&loaded.panel)?;
    let performance = Performance::compute(
        &output.gross_returns,
        &output.positions,
        bt_config.risk_free_rate,
    );

    Ok(BacktestRun {
        output,
        performance,
        skipped: loaded.skipped,
    })
}

fn print_summary(index: &IndexConfig, run: &BacktestRun) {
    let p = &run.performance;
    println!("=== {} ({} weighted) ===", index.code, index.weighting);
    println!("Instruments:      {}", run.output.gross_returns.n_instruments());
    println!("Skipped:          {}", run.skipped.len());
    println!("Trading Days:     {}", p.trading_days);
    println!("Avg Holdings:     {:.1}", p.avg_holdings);
    println!("Total Return:     {:.2}%", p.total_return * 100.0);
    println!("Annualized:       {:.2}%", p.annualized_return * 100.0);
    println!("Sharpe Ratio:     {:.2}", p.sharpe_ratio);
    println!("Max Drawdown:     -{:.1}%", p.max_drawdown * 100.0);
    println!("Drawdown Days:    {}", p.max_drawdown_duration);
}

fn run_backtest(config_path: &Path, output_path: Option<&Path>) -> Result<(), IndexError> {
    info!(path = %config_path.display(), "loading config");
    let adapter = load_config(config_path)?;
    let (index, bt_config) = load_run_config(&adapter)?;

    let data_port = CsvAdapter::new(bt_config.data_path.clone());
    let run = execute_backtest(&data_port, &adapter, &index, &bt_config)?;
    print_summary(&index, &run);

    if let Some(path) = output_path {
        CsvReportAdapter.write(&run.output, &index, path)?;
    }
    Ok(())
}

fn describe_rule(index: &IndexConfig) -> String {
    match index.eligibility() {
        Eligibility::TopPercent(pct) => format!("top {pct}% by average dollar volume"),
        Eligibility::MinDollarVolume(min) => format!("average dollar volume >= {min}"),
    }
}

fn run_dry_run(config_path: &Path) -> Result<(), IndexError> {
    let adapter = load_config(config_path)?;
    let (index, bt_config) = load_run_config(&adapter)?;

    println!("code:        {}", index.code);
    println!("db:          {}", index.db);
    println!("fields:      {}", index.fields.join(", "));
    println!("weighting:   {}", index.weighting);
    println!("window:      {}", index.dollar_volume_window);
    println!("eligibility: {}", describe_rule(&index));
    if index.universes.is_empty() {
        println!("universes:   (all symbols in {})", index.db);
    } else {
        println!("universes:   {}", index.universes.join(", "));
    }
    if !index.exclude_universes.is_empty() {
        println!("excluded:    {}", index.exclude_universes.join(", "));
    }
    println!(
        "range:       {} to {}",
        bt_config.start_date, bt_config.end_date
    );
    println!("data:        {}", bt_config.data_path.display());
    info!("dry run complete: configuration is valid");
    Ok(())
}

fn run_validate(config_path: &Path) -> Result<(), IndexError> {
    let adapter = load_config(config_path)?;
    validate_index_config(&adapter)?;
    let index = build_index_config(&adapter)?;
    println!(
        "{}: valid ({} weighted, {})",
        index.code,
        index.weighting,
        describe_rule(&index)
    );
    Ok(())
}

fn run_list_symbols(config_path: &Path, db: Option<&str>) -> Result<(), IndexError> {
    let adapter = load_config(config_path)?;
    let data_path = adapter
        .get_string("data", "path")
        .ok_or_else(|| IndexError::ConfigMissing {
            section: "data".into(),
            key: "path".into(),
        })?;
    let db = match db {
        Some(d) => d.to_string(),
        None => adapter
            .get_string("index", "db")
            .map(|s| s.trim().to_string())
            .ok_or_else(|| IndexError::ConfigMissing {
                section: "index".into(),
                key: "db".into(),
            })?,
    };

    let symbols = CsvAdapter::new(PathBuf::from(data_path.trim())).list_symbols(&db)?;
    for symbol in &symbols {
        println!("{}", symbol);
    }
    info!(count = symbols.len(), db = %db, "listed symbols");
    Ok(())
}
