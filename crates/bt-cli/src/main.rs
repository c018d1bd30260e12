//! `run_backtest`: loads a layered config, a single-file or
//! dataset-directory feed, drives one engine run to completion, and writes
//! the full run-directory artifact bundle. The experiment grid and strategy
//! business logic live outside this workspace's core — this binary exists
//! to give the simulation pipeline a runnable front door, wired against a
//! no-op strategy until a real plugin loader is someone else's concern.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::Parser;
use uuid::Uuid;

use bt_artifacts::{write_all, write_run_status_failure};
use bt_config::load_and_resolve;
use bt_data::{parse_manifest, BarSource, Bar, CsvFileSource, DataFeed, DataError};
use bt_engine::{run, EngineError};
use bt_strategy::{Signal, Strategy, StrategyContext};

#[derive(Parser)]
#[command(name = "run_backtest")]
#[command(about = "Bar-by-bar market-data backtesting engine", long_about = None)]
struct Cli {
    /// Path to a single CSV/Parquet file, or a dataset directory containing manifest.yaml
    #[arg(long)]
    data: Option<PathBuf>,

    /// Base layered config (required)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Additional override overlays, applied in the order given
    #[arg(long = "override")]
    overrides: Vec<PathBuf>,

    /// Final overlay, applied after every --override
    #[arg(long = "local-config")]
    local_config: Option<PathBuf>,

    /// Run directory to write artifacts into
    #[arg(long)]
    out: Option<PathBuf>,
}

/// The one strategy this binary ships: emits nothing, ever. Enough to drive
/// the feed/execution/portfolio/writer plumbing end to end through the
/// empty-feed and no-signals boundary cases; real strategies are a
/// collaborator this crate only specifies the contract for.
struct NoopStrategy;

impl Strategy for NoopStrategy {
    fn on_bars(
        &mut self,
        _ts: i64,
        _bars_by_symbol: &BTreeMap<String, Bar>,
        _tradeable_universe: &[String],
        _ctx: &StrategyContext,
    ) -> Vec<Signal> {
        Vec::new()
    }
}

fn main() {
    // Silent if the file does not exist; production injects env vars directly.
    let _ = dotenvy::from_filename(".env.local");
    init_tracing();

    let cli = Cli::parse();
    match run_cli(cli) {
        Ok(()) => std::process::exit(0),
        Err(e) => {
            eprintln!("run_backtest: {e:#}");
            std::process::exit(1);
        }
    }
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();
}

fn run_cli(cli: Cli) -> Result<()> {
    let data_path = cli
        .data
        .or_else(|| std::env::var("BT_DATA_ROOT").ok().map(PathBuf::from))
        .context("--data is required (or set BT_DATA_ROOT)")?;
    let config_path = cli
        .config
        .context("--config is required")?;
    let out_dir = cli
        .out
        .or_else(|| std::env::var("BT_OUT_ROOT").ok().map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from("./out"));

    let run_id = Uuid::new_v4().to_string();

    // Overlay order: base config, then each --override in the order given,
    // then --local-config last.
    let mut overlay_paths: Vec<String> = vec![config_path.to_string_lossy().into_owned()];
    overlay_paths.extend(cli.overrides.iter().map(|p| p.to_string_lossy().into_owned()));
    if let Some(local) = &cli.local_config {
        overlay_paths.push(local.to_string_lossy().into_owned());
    }
    let overlay_refs: Vec<&str> = overlay_paths.iter().map(String::as_str).collect();

    let resolved = match load_and_resolve(&overlay_refs) {
        Ok(cfg) => cfg,
        Err(e) => {
            // Config errors are fatal before the run directory necessarily
            // exists; write the failure status anyway.
            write_run_status_failure(&out_dir, &run_id, "ConfigError", &e.to_string())
                .context("writing failure run_status.json")?;
            return Err(e);
        }
    };

    let by_symbol = match load_bars(&data_path) {
        Ok(b) => b,
        Err(e) => {
            write_run_status_failure(&out_dir, &run_id, "DataError", &e.to_string())
                .context("writing failure run_status.json")?;
            bail!(e);
        }
    };

    let feed = match DataFeed::new(by_symbol, &resolved.data, &resolved.htf_resampler) {
        Ok(f) => f,
        Err(e) => {
            write_run_status_failure(&out_dir, &run_id, "DataError", &e.to_string())
                .context("writing failure run_status.json")?;
            bail!(e);
        }
    };

    let mut strategy = NoopStrategy;
    let outcome = match run(feed, &mut strategy, &resolved) {
        Ok(o) => o,
        Err(e) => {
            let error_type = match &e {
                EngineError::Config(_) => "ConfigError",
                EngineError::Data(_) => "DataError",
                EngineError::StrategyContract(_) => "StrategyContractError",
                EngineError::Execution(_) => "ExecutionError",
                EngineError::Portfolio(_) => "PortfolioError",
            };
            write_run_status_failure(&out_dir, &run_id, error_type, &e.to_string())
                .context("writing failure run_status.json")?;
            bail!(e);
        }
    };

    write_all(&out_dir, &resolved, &outcome, &run_id).context("writing run artifacts")?;

    println!("run_id={run_id}");
    println!("out_dir={}", out_dir.display());
    println!("final_equity={}", outcome.final_state.equity);
    println!("trades={}", outcome.trades.len());

    Ok(())
}

/// Dispatches `--data` to the single-file or dataset-directory mode.
/// Dataset directories resolve their manifest to
/// `(symbol, path)` pairs; actually reading a referenced Parquet file is an
/// external collaborator out of scope for this workspace, so only
/// CSV-backed manifest entries are loadable here.
fn load_bars(data_path: &Path) -> Result<BTreeMap<String, Vec<Bar>>, DataError> {
    if data_path.is_dir() {
        load_dataset_directory(data_path)
    } else {
        CsvFileSource::new(data_path).load()
    }
}

fn load_dataset_directory(dir: &Path) -> Result<BTreeMap<String, Vec<Bar>>, DataError> {
    let manifest_path = dir.join("manifest.yaml");
    let manifest_yaml = std::fs::read_to_string(&manifest_path)
        .map_err(|e| DataError::Io(format!("{}: {e}", manifest_path.display())))?;
    let entries = parse_manifest(&manifest_yaml)?;

    let mut by_symbol = BTreeMap::new();
    for entry in entries {
        let path = dir.join(&entry.path);
        if path.extension().and_then(|e| e.to_str()) != Some("csv") {
            return Err(DataError::ManifestParse(format!(
                "{}: on-disk Parquet reading is an external collaborator out of scope for this workspace; only .csv manifest entries are loadable",
                path.display()
            )));
        }
        let source = CsvFileSource::new(path.as_path()).load()?;
        for (symbol, bars) in source {
            by_symbol.entry(if symbol.is_empty() { entry.symbol.clone() } else { symbol }).or_insert(bars);
        }
    }
    Ok(by_symbol)
}
