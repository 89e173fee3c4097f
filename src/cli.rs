//! CLI definition and dispatch.

use clap::{Parser, Subcommand};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Instant;

use crate::adapters::csv_adapter::CsvAdapter;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::domain::config_validation::{build_data_config, build_run_config, DataConfig};
use crate::domain::context::{RunConfig, RunContext};
use crate::domain::error::EngineError;
use crate::domain::indicator::transform::close;
use crate::domain::indicator::IndicatorSpec;
use crate::domain::lookup::try_lookup;
use crate::domain::series::FloatSeries;
use crate::ports::data_port::DataPort;

#[derive(Parser, Debug)]
#[command(name = "tsengine", about = "Lazy time-series indicator engine")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Compute indicators for one symbol and write them as CSV to stdout
    Compute {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(short, long)]
        symbol: String,
        /// Directory of <SYMBOL>.csv files; overrides [data] path
        #[arg(short, long)]
        data: Option<PathBuf>,
        /// Indicator such as sma:20, bollinger:20:2 or var:21:0.95 (repeatable)
        #[arg(short, long = "indicator")]
        indicator: Vec<String>,
    },
    /// List symbols available in the data directory
    ListSymbols {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(short, long)]
        data: Option<PathBuf>,
    },
}

pub fn run(cli: Cli) -> ExitCode {
    let result = match cli.command {
        Command::Compute {
            config,
            symbol,
            data,
            indicator,
        } => run_compute(&config, &symbol, data, &indicator),
        Command::ListSymbols { config, data } => run_list_symbols(&config, data),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "command failed");
            eprintln!("error: {e}");
            (&e).into()
        }
    }
}

pub fn load_config(path: &Path) -> Result<FileConfigAdapter, EngineError> {
    tracing::info!(path = %path.display(), "loading config");
    FileConfigAdapter::from_file(path)
}

/// Parses every `--indicator` argument, failing on the first bad one.
pub fn parse_indicators(specs: &[String]) -> Result<Vec<IndicatorSpec>, EngineError> {
    specs.iter().map(|s| s.parse()).collect()
}

fn resolve_data_dir(
    override_path: Option<PathBuf>,
    data_config: &DataConfig,
) -> Result<PathBuf, EngineError> {
    override_path
        .or_else(|| data_config.path.clone())
        .ok_or_else(|| EngineError::ConfigMissing {
            section: "data".into(),
            key: "path".into(),
        })
}

fn run_compute(
    config_path: &Path,
    symbol: &str,
    data_override: Option<PathBuf>,
    indicators: &[String],
) -> Result<(), EngineError> {
    let config = load_config(config_path)?;
    let run_config = build_run_config(&config)?;
    let data_config = build_data_config(&config)?;
    let specs = parse_indicators(indicators)?;
    let data_port = CsvAdapter::new(resolve_data_dir(data_override, &data_config)?);

    let stdout = io::stdout();
    let mut out = stdout.lock();
    run_compute_pipeline(
        &data_port,
        &run_config,
        &data_config,
        symbol,
        &specs,
        &mut out,
    )?;
    out.flush()?;
    Ok(())
}

/// Loads `symbol`, builds every indicator in `specs` on one run context,
/// materializes them in parallel and writes one CSV row per bar to `out`.
///
/// Columns are `date`, `close`, then one per indicator output. A cell is
/// empty when its series has no value at or before the row's date.
pub fn run_compute_pipeline(
    data_port: &dyn DataPort,
    run_config: &RunConfig,
    data_config: &DataConfig,
    symbol: &str,
    specs: &[IndicatorSpec],
    out: &mut dyn Write,
) -> Result<(), EngineError> {
    let bars = data_port.fetch_bars(symbol, data_config.start_date, data_config.end_date)?;
    if bars.is_empty() {
        return Err(EngineError::NoData {
            symbol: symbol.to_string(),
        });
    }
    tracing::info!(symbol, bars = bars.len(), "loaded bars");

    let grid = bars.iter().map(|b| b.date).collect();
    let ctx = RunContext::with_config(run_config.clone())?.with_grid(grid)?;
    let asset = ctx.register_asset(symbol, bars)?;

    let mut columns: Vec<(String, FloatSeries)> = vec![("close".to_string(), close(&ctx, &asset)?)];
    for spec in specs {
        columns.extend(spec.evaluate(&ctx, &asset)?);
    }

    let started = Instant::now();
    let series: Vec<FloatSeries> = columns.iter().map(|(_, s)| s.clone()).collect();
    ctx.materialize(&series)?;
    let stats = ctx.stats();
    tracing::info!(
        columns = columns.len(),
        elapsed_ms = started.elapsed().as_millis() as u64,
        hits = stats.hits,
        misses = stats.misses,
        cached = stats.data_entries,
        "materialized indicators"
    );

    write_csv(&ctx, &columns, out)
}

fn write_csv(
    ctx: &RunContext,
    columns: &[(String, FloatSeries)],
    out: &mut dyn Write,
) -> Result<(), EngineError> {
    let mut wtr = csv::Writer::from_writer(out);

    let mut header = vec!["date".to_string()];
    header.extend(columns.iter().map(|(label, _)| label.clone()));
    wtr.write_record(&header).map_err(io::Error::from)?;

    for date in ctx.grid() {
        let mut row = vec![date.format("%Y-%m-%d").to_string()];
        for (_, series) in columns {
            let cell = try_lookup(series, *date)?
                .map(|v| v.to_string())
                .unwrap_or_default();
            row.push(cell);
        }
        wtr.write_record(&row).map_err(io::Error::from)?;
    }

    wtr.flush()?;
    Ok(())
}

fn run_list_symbols(config_path: &Path, data_override: Option<PathBuf>) -> Result<(), EngineError> {
    let config = load_config(config_path)?;
    let data_config = build_data_config(&config)?;
    let adapter = CsvAdapter::new(resolve_data_dir(data_override, &data_config)?);

    let symbols = adapter.list_symbols()?;
    if symbols.is_empty() {
        eprintln!("No symbols found");
    } else {
        for symbol in &symbols {
            println!("{}", symbol);
        }
        eprintln!("{} symbols found", symbols.len());
    }
    Ok(())
}
