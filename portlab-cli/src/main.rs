//! PortLab CLI: portfolio backtests, single-asset backtests, and config scaffolding.
//!
//! Commands:
//! - `run`: portfolio backtest from a TOML config file
//! - `compare`: the same config under every rebalancing schedule, in parallel
//! - `single`: one ticker through one signal rule
//! - `init`: write a sample config

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand, ValueEnum};
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use portlab_core::rebalance::Rebalancing;
use portlab_core::signals::SignalRule;
use portlab_core::single::SingleAssetReport;
use portlab_runner::export::{export_json, save_artifacts};
use portlab_runner::{
    load_universe, run_batch_with_progress, run_from_config, run_single_from_config, BatchJob,
    DataConfig, PortfolioConfig, PortfolioInput, PortfolioResult, RunConfig,
};

#[derive(Parser)]
#[command(
    name = "portlab",
    version,
    about = "PortLab CLI: multi-asset portfolio backtesting and rebalancing"
)]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a portfolio backtest from a TOML config file.
    Run {
        /// Path to a TOML config file.
        config: PathBuf,

        /// Override the allocation method: equal, market_cap, optimized, custom.
        #[arg(long)]
        allocation: Option<String>,

        /// Override the rebalancing schedule: none, monthly, quarterly, threshold.
        #[arg(long)]
        rebalancing: Option<String>,

        /// Write result.json, equity.csv, weights.csv and report.md here.
        #[arg(long)]
        output_dir: Option<PathBuf>,

        /// Print the full result as JSON instead of the summary.
        #[arg(long, default_value_t = false)]
        json: bool,
    },
    /// Run a config under every rebalancing schedule and compare.
    Compare {
        /// Path to a TOML config file.
        config: PathBuf,

        /// Worker threads.
        #[arg(long, default_value_t = 4)]
        workers: usize,
    },
    /// Backtest one signal rule on one ticker.
    Single {
        /// Ticker to test.
        ticker: String,

        /// Directory holding <TICKER>.csv.
        #[arg(long)]
        data_dir: Option<PathBuf>,

        /// Use synthetic prices (requires --start and --end).
        #[arg(long, default_value_t = false)]
        synthetic: bool,

        /// Start date (YYYY-MM-DD).
        #[arg(long)]
        start: Option<NaiveDate>,

        /// End date (YYYY-MM-DD).
        #[arg(long)]
        end: Option<NaiveDate>,

        /// Signal rule.
        #[arg(long, value_enum, default_value_t = RuleKind::SmaCross)]
        rule: RuleKind,

        /// Fast window for sma_cross.
        #[arg(long, default_value_t = 50)]
        short_window: usize,

        /// Slow window for sma_cross.
        #[arg(long, default_value_t = 200)]
        long_window: usize,

        /// Lookback for momentum.
        #[arg(long, default_value_t = 20)]
        lookback: usize,

        /// Print the report as JSON.
        #[arg(long, default_value_t = false)]
        json: bool,
    },
    /// Write a sample config file.
    Init {
        /// Destination path.
        #[arg(default_value = "portlab.toml")]
        path: PathBuf,

        /// Overwrite an existing file.
        #[arg(long, default_value_t = false)]
        force: bool,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
#[value(rename_all = "snake_case")]
enum RuleKind {
    BuyAndHold,
    Flat,
    SmaCross,
    Momentum,
}

impl Cli {
    fn init_logging(&self) -> Result<()> {
        let level = match self.verbose {
            0 => Level::WARN,
            1 => Level::INFO,
            2 => Level::DEBUG,
            _ => Level::TRACE,
        };

        let subscriber = FmtSubscriber::builder()
            .with_max_level(level)
            .with_target(false)
            .with_writer(std::io::stderr)
            .finish();

        tracing::subscriber::set_global_default(subscriber)
            .context("failed to set tracing subscriber")
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    cli.init_logging()?;

    match cli.command {
        Commands::Run {
            config,
            allocation,
            rebalancing,
            output_dir,
            json,
        } => run_portfolio_cmd(
            &config,
            allocation.as_deref(),
            rebalancing.as_deref(),
            output_dir.as_deref(),
            json,
        ),
        Commands::Compare { config, workers } => run_compare_cmd(&config, workers),
        Commands::Single {
            ticker,
            data_dir,
            synthetic,
            start,
            end,
            rule,
            short_window,
            long_window,
            lookback,
            json,
        } => {
            let rule = match rule {
                RuleKind::BuyAndHold => SignalRule::BuyAndHold,
                RuleKind::Flat => SignalRule::Flat,
                RuleKind::SmaCross => SignalRule::SmaCross {
                    short_window,
                    long_window,
                },
                RuleKind::Momentum => SignalRule::Momentum { lookback },
            };
            let data = DataConfig {
                dir: data_dir,
                synthetic,
                start,
                end,
            };
            run_single_cmd(&ticker, &data, &rule, json)
        }
        Commands::Init { path, force } => run_init(&path, force),
    }
}

fn run_portfolio_cmd(
    config_path: &Path,
    allocation: Option<&str>,
    rebalancing: Option<&str>,
    output_dir: Option<&Path>,
    json: bool,
) -> Result<()> {
    let mut config = RunConfig::load(config_path)?;
    if let Some(name) = allocation {
        config.portfolio.allocation_method = name.parse()?;
    }
    if let Some(name) = rebalancing {
        config.portfolio.rebalancing = name.parse()?;
    }

    let result = run_from_config(&config)?;

    if json {
        println!("{}", export_json(&result)?);
    } else {
        print_summary(&result);
    }

    if let Some(dir) = output_dir {
        let run_dir = save_artifacts(&result, dir)?;
        println!("Artifacts saved to: {}", run_dir.display());
    }

    Ok(())
}

fn run_compare_cmd(config_path: &Path, workers: usize) -> Result<()> {
    let config = RunConfig::load(config_path)?;
    let loaded = load_universe(&config.universe.tickers, &config.data)?;
    let input = PortfolioInput::with_rule(
        config.universe.tickers.clone(),
        loaded.histories,
        &config.signal,
    );

    let schedules = [
        Rebalancing::None,
        Rebalancing::Monthly,
        Rebalancing::Quarterly,
        Rebalancing::Threshold,
    ];
    let jobs: Vec<BatchJob<'_>> = schedules
        .iter()
        .map(|&schedule| BatchJob {
            label: schedule.to_string(),
            input: &input,
            config: PortfolioConfig {
                rebalancing: schedule,
                ..config.portfolio.clone()
            },
        })
        .collect();

    let outcomes = run_batch_with_progress(&jobs, workers, |idx, total, _| {
        info!(job = idx + 1, total, "schedule finished");
    })?;

    println!();
    println!(
        "{:<10} {:>10} {:>10} {:>8} {:>10} {:>6} {:>10}",
        "Schedule", "Return", "Vol", "Sharpe", "Max DD", "Rebal", "Costs"
    );
    println!("{}", "-".repeat(70));
    for (job, outcome) in jobs.iter().zip(&outcomes) {
        match outcome {
            Ok(r) => {
                let m = &r.portfolio_metrics;
                println!(
                    "{:<10} {:>9.2}% {:>9.2}% {:>8.3} {:>9.2}% {:>6} {:>10.6}",
                    job.label,
                    m.total_return * 100.0,
                    m.volatility * 100.0,
                    m.sharpe_ratio,
                    m.max_drawdown * 100.0,
                    m.num_rebalances,
                    m.total_transaction_costs,
                );
            }
            Err(e) => println!("{:<10} error: {e}", job.label),
        }
    }
    if loaded.synthetic {
        println!();
        println!("WARNING: Results based on SYNTHETIC data");
    }
    println!();

    if outcomes.iter().all(|o| o.is_err()) {
        bail!("every schedule failed");
    }
    Ok(())
}

fn run_single_cmd(ticker: &str, data: &DataConfig, rule: &SignalRule, json: bool) -> Result<()> {
    if data.dir.is_none() && !data.synthetic {
        bail!("one of --data-dir or --synthetic is required");
    }
    let report = run_single_from_config(ticker, data, rule)?;
    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_single(&report, rule);
    }
    Ok(())
}

fn run_init(path: &Path, force: bool) -> Result<()> {
    if path.exists() && !force {
        bail!(
            "{} already exists (pass --force to overwrite)",
            path.display()
        );
    }
    let toml = RunConfig::sample().to_toml()?;
    std::fs::write(path, toml).with_context(|| format!("failed to write {}", path.display()))?;
    println!("Wrote sample config to {}", path.display());
    Ok(())
}

fn print_summary(result: &PortfolioResult) {
    let m = &result.portfolio_metrics;
    println!();
    println!("=== Portfolio Result ===");
    println!("Tickers:        {}", result.tickers.join(", "));
    println!(
        "Period:         {} to {}",
        result.start_date, result.end_date
    );
    println!("Days:           {}", result.equity_curve.len());
    println!("Rebalances:     {}", m.num_rebalances);
    println!();
    println!("--- Performance ---");
    println!("Total Return:   {:.2}%", m.total_return * 100.0);
    println!("Annualized:     {:.2}%", m.annualized_return * 100.0);
    println!("Volatility:     {:.2}%", m.volatility * 100.0);
    println!("Sharpe:         {:.3}", m.sharpe_ratio);
    println!("Max Drawdown:   {:.2}%", m.max_drawdown * 100.0);
    println!("Win Rate:       {:.1}%", m.win_rate * 100.0);
    println!("Diversif.:      {:.3}", m.diversification_ratio);
    println!("Avg Turnover:   {:.4}", m.turnover);
    println!(
        "Costs:          {:.6} ({:.3}% of gross)",
        m.total_transaction_costs, m.transaction_cost_impact_pct
    );
    println!();
    println!("--- Assets ---");
    println!(
        "{:<8} {:>8} {:>10} {:>10} {:>8} {:>12}",
        "Ticker", "Weight", "Return", "Vol", "Sharpe", "Contrib"
    );
    for a in &result.asset_metrics {
        println!(
            "{:<8} {:>7.2}% {:>9.2}% {:>9.2}% {:>8.3} {:>11.2}%",
            a.ticker,
            a.weight * 100.0,
            a.total_return * 100.0,
            a.volatility * 100.0,
            a.sharpe_ratio,
            a.contribution_to_return * 100.0,
        );
    }
    if result.synthetic {
        println!();
        println!("WARNING: Results based on SYNTHETIC data");
    }
    for warn in &result.warnings {
        println!("WARNING: {warn}");
    }
    println!();
}

fn print_single(report: &SingleAssetReport, rule: &SignalRule) {
    println!();
    println!("=== Single-Asset Result ===");
    println!("Ticker:         {}", report.ticker);
    println!("Rule:           {}", rule.name());
    println!("Trades:         {}", report.num_trades);
    println!();
    println!("Total Return:   {:.2}%", report.total_return * 100.0);
    println!("Sharpe:         {:.3}", report.sharpe_ratio);
    println!("Max Drawdown:   {:.2}%", report.max_drawdown * 100.0);
    println!("Win Rate:       {:.1}%", report.win_rate * 100.0);
    if let Some(last) = report.trade_signals.last() {
        println!(
            "Last Signal:    {:?} on {} at {:.2}",
            last.side, last.date, last.price
        );
    }
    println!();
}
