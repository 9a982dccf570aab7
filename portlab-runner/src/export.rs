//! Reporting and export: JSON, CSV, and Markdown artifacts.
//!
//! Provides three export formats for portfolio results:
//! - **JSON**: full round-trip serialization with schema versioning
//! - **CSV**: equity curve and weight timeline for external tools
//! - **Markdown**: human-readable run summary
//!
//! Persisted results carry a `schema_version`. Newer versions are rejected
//! on load.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use portlab_core::domain::WeightSnapshot;
use portlab_core::equity::EquityPoint;

use crate::result::{PortfolioResult, SCHEMA_VERSION};

// ─── JSON export ────────────────────────────────────────────────────

/// Serialize a `PortfolioResult` to pretty JSON.
pub fn export_json(result: &PortfolioResult) -> Result<String> {
    serde_json::to_string_pretty(result).context("failed to serialize PortfolioResult to JSON")
}

/// Deserialize a `PortfolioResult` from JSON, rejecting unknown schema versions.
pub fn import_json(json: &str) -> Result<PortfolioResult> {
    let result: PortfolioResult =
        serde_json::from_str(json).context("failed to deserialize PortfolioResult from JSON")?;
    if result.schema_version > SCHEMA_VERSION {
        bail!(
            "unsupported schema version {} (max supported: {})",
            result.schema_version,
            SCHEMA_VERSION
        );
    }
    Ok(result)
}

// ─── CSV export ─────────────────────────────────────────────────────

/// Equity curve as `date,equity`.
pub fn export_equity_csv(curve: &[EquityPoint]) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record(["date", "equity"])?;
    for p in curve {
        wtr.write_record([p.date.to_string(), format!("{:.6}", p.equity)])?;
    }
    let data = wtr.into_inner().context("failed to flush CSV writer")?;
    String::from_utf8(data).context("CSV output is not valid UTF-8")
}

/// Weight timeline as `date,rebalance,<ticker>...`, one column per ticker.
pub fn export_weights_csv(tickers: &[String], timeline: &[WeightSnapshot]) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    let mut header = vec!["date".to_string(), "rebalance".to_string()];
    header.extend(tickers.iter().cloned());
    wtr.write_record(&header)?;

    for snap in timeline {
        let mut row = Vec::with_capacity(tickers.len() + 2);
        row.push(snap.date.to_string());
        row.push(snap.rebalance.to_string());
        row.extend(tickers.iter().map(|t| format!("{:.6}", snap.weights.get(t))));
        wtr.write_record(&row)?;
    }
    let data = wtr.into_inner().context("failed to flush CSV writer")?;
    String::from_utf8(data).context("CSV output is not valid UTF-8")
}

// ─── Artifact bundle ────────────────────────────────────────────────

/// Write the full artifact set for one run into `output_dir`.
///
/// Creates the directory if needed and writes:
/// - `result.json`: the full `PortfolioResult`
/// - `equity.csv`: daily equity curve
/// - `weights.csv`: weight timeline
/// - `report.md`: Markdown summary
pub fn save_artifacts(result: &PortfolioResult, output_dir: &Path) -> Result<PathBuf> {
    std::fs::create_dir_all(output_dir)
        .with_context(|| format!("failed to create artifact dir: {}", output_dir.display()))?;

    std::fs::write(output_dir.join("result.json"), export_json(result)?)?;
    std::fs::write(
        output_dir.join("equity.csv"),
        export_equity_csv(&result.equity_curve)?,
    )?;
    std::fs::write(
        output_dir.join("weights.csv"),
        export_weights_csv(&result.tickers, &result.weights_timeline)?,
    )?;
    std::fs::write(output_dir.join("report.md"), generate_report(result))?;

    Ok(output_dir.to_path_buf())
}

/// Load a `PortfolioResult` from an artifact directory.
pub fn load_artifacts(dir: &Path) -> Result<PortfolioResult> {
    let path = dir.join("result.json");
    let json = std::fs::read_to_string(&path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    import_json(&json)
}

// ─── Markdown report ────────────────────────────────────────────────

/// Markdown summary of one portfolio run.
pub fn generate_report(result: &PortfolioResult) -> String {
    let mut md = String::with_capacity(2048);

    md.push_str("# Portfolio Report\n\n");

    md.push_str("## Metadata\n\n");
    md.push_str("| Field | Value |\n");
    md.push_str("| --- | --- |\n");
    md.push_str(&format!("| Tickers | {} |\n", result.tickers.join(", ")));
    md.push_str(&format!(
        "| Period | {} to {} |\n",
        result.start_date, result.end_date
    ));
    md.push_str(&format!("| Days | {} |\n", result.equity_curve.len()));
    if let Some(ref id) = result.run_id {
        md.push_str(&format!("| Run ID | {} |\n", &id[..id.len().min(16)]));
    }
    if result.synthetic {
        md.push_str("| Data | **SYNTHETIC** |\n");
    }
    md.push('\n');

    let m = &result.portfolio_metrics;
    md.push_str("## Performance Summary\n\n");
    md.push_str("| Metric | Value |\n");
    md.push_str("| --- | --- |\n");
    md.push_str(&format!("| Total Return | {} |\n", pct(m.total_return)));
    md.push_str(&format!(
        "| Annualized Return | {} |\n",
        pct(m.annualized_return)
    ));
    md.push_str(&format!("| Volatility | {} |\n", pct(m.volatility)));
    md.push_str(&format!("| Sharpe | {:.3} |\n", m.sharpe_ratio));
    md.push_str(&format!("| Max Drawdown | {} |\n", pct(m.max_drawdown)));
    md.push_str(&format!("| Win Rate | {:.1}% |\n", m.win_rate * 100.0));
    md.push_str(&format!(
        "| Diversification Ratio | {:.3} |\n",
        m.diversification_ratio
    ));
    md.push_str(&format!("| Rebalances | {} |\n", m.num_rebalances));
    md.push_str(&format!("| Avg Turnover | {:.4} |\n", m.turnover));
    md.push_str(&format!(
        "| Transaction Costs | {:.6} ({:.3}%) |\n",
        m.total_transaction_costs, m.transaction_cost_impact_pct
    ));
    md.push('\n');

    md.push_str("## Assets\n\n");
    md.push_str("| Ticker | Weight | Return | Volatility | Sharpe | Max DD | Contribution |\n");
    md.push_str("| --- | ---: | ---: | ---: | ---: | ---: | ---: |\n");
    for a in &result.asset_metrics {
        md.push_str(&format!(
            "| {} | {:.2}% | {} | {} | {:.3} | {} | {} |\n",
            a.ticker,
            a.weight * 100.0,
            pct(a.total_return),
            pct(a.volatility),
            a.sharpe_ratio,
            pct(a.max_drawdown),
            pct(a.contribution_to_return),
        ));
    }
    md.push_str("\nContribution is isolated return × target weight; it does not sum to the portfolio return.\n\n");

    if !result.warnings.is_empty() {
        md.push_str("## Warnings\n\n");
        for w in &result.warnings {
            md.push_str(&format!("- {w}\n"));
        }
        md.push('\n');
    }

    md
}

fn pct(v: f64) -> String {
    format!("{:.2}%", v * 100.0)
}
