//! CSV report adapter implementing ReportPort.
//!
//! Writes one file per artifact into the output directory:
//! `{SYMBOL}_equity.csv`, `{SYMBOL}_trades.csv`, `{SYMBOL}_metrics.csv` and
//! `{SYMBOL}_labels.csv`.

use std::fs;
use std::path::{Path, PathBuf};

use crate::domain::backtest::BacktestResult;
use crate::domain::error::VoteTraderError;
use crate::domain::labeling::Label;
use crate::domain::metrics::Metrics;
use crate::domain::position::TradeAction;
use crate::ports::report_port::ReportPort;

pub struct CsvReportAdapter {
    output_dir: PathBuf,
}

impl CsvReportAdapter {
    pub fn new(output_dir: PathBuf) -> Self {
        Self { output_dir }
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    pub fn equity_path(&self, symbol: &str) -> PathBuf {
        self.output_dir.join(format!("{}_equity.csv", symbol))
    }

    pub fn trades_path(&self, symbol: &str) -> PathBuf {
        self.output_dir.join(format!("{}_trades.csv", symbol))
    }

    pub fn metrics_path(&self, symbol: &str) -> PathBuf {
        self.output_dir.join(format!("{}_metrics.csv", symbol))
    }

    pub fn labels_path(&self, symbol: &str) -> PathBuf {
        self.output_dir.join(format!("{}_labels.csv", symbol))
    }

    fn ensure_dir(&self) -> Result<(), VoteTraderError> {
        fs::create_dir_all(&self.output_dir)?;
        Ok(())
    }
}

fn csv_error(path: &Path, e: csv::Error) -> VoteTraderError {
    VoteTraderError::Data {
        reason: format!("failed to write {}: {}", path.display(), e),
    }
}

fn write_rows<I>(path: &Path, header: &[&str], rows: I) -> Result<(), VoteTraderError>
where
    I: IntoIterator<Item = Vec<String>>,
{
    let mut wtr = csv::Writer::from_path(path).map_err(|e| csv_error(path, e))?;
    wtr.write_record(header).map_err(|e| csv_error(path, e))?;
    for row in rows {
        wtr.write_record(&row).map_err(|e| csv_error(path, e))?;
    }
    wtr.flush()?;
    Ok(())
}

fn action_columns(action: TradeAction) -> (&'static str, &'static str) {
    match action {
        TradeAction::Buy => ("buy", ""),
        TradeAction::Sell(reason) => ("sell", reason.name()),
    }
}

fn metric_rows(metrics: &Metrics) -> Vec<Vec<String>> {
    let float = |name: &str, v: f64| vec![name.to_string(), format!("{:.6}", v)];
    let count = |name: &str, v: usize| vec![name.to_string(), v.to_string()];
    vec![
        float("total_return", metrics.total_return),
        float("buy_and_hold_return", metrics.buy_and_hold_return),
        float("excess_return", metrics.excess_return),
        float("annualized_return", metrics.annualized_return),
        float("sharpe_ratio", metrics.sharpe_ratio),
        float("sortino_ratio", metrics.sortino_ratio),
        float("max_drawdown", metrics.max_drawdown),
        count("max_drawdown_duration", metrics.max_drawdown_duration),
        count("total_trades", metrics.total_trades),
        count("trades_won", metrics.trades_won),
        count("trades_lost", metrics.trades_lost),
        float("win_rate", metrics.win_rate),
        float("profit_factor", metrics.profit_factor),
        float("avg_trade_return", metrics.avg_trade_return),
        float("avg_holding_days", metrics.avg_holding_days),
        count("stop_loss_exits", metrics.stop_loss_exits),
        count("take_profit_exits", metrics.take_profit_exits),
        count("signal_exits", metrics.signal_exits),
    ]
}

impl ReportPort for CsvReportAdapter {
    fn write_backtest(
        &self,
        symbol: &str,
        result: &BacktestResult,
        metrics: &Metrics,
    ) -> Result<(), VoteTraderError> {
        self.ensure_dir()?;

        write_rows(
            &self.equity_path(symbol),
            &["date", "equity", "buy_and_hold"],
            result
                .equity_curve
                .iter()
                .zip(&result.buy_and_hold_curve)
                .map(|(p, bh)| {
                    vec![
                        p.date.to_string(),
                        format!("{:.4}", p.equity),
                        format!("{:.4}", bh.equity),
                    ]
                }),
        )?;

        write_rows(
            &self.trades_path(symbol),
            &["date", "action", "reason", "price", "shares", "cash"],
            result.trades.iter().map(|t| {
                let (action, reason) = action_columns(t.action);
                vec![
                    t.date.to_string(),
                    action.to_string(),
                    reason.to_string(),
                    format!("{:.4}", t.price),
                    format!("{:.6}", t.shares),
                    format!("{:.4}", t.cash_after),
                ]
            }),
        )?;

        write_rows(
            &self.metrics_path(symbol),
            &["metric", "value"],
            metric_rows(metrics),
        )
    }

    fn write_labels(&self, symbol: &str, labels: &[Label]) -> Result<(), VoteTraderError> {
        self.ensure_dir()?;
        write_rows(
            &self.labels_path(symbol),
            &["date", "label", "outcome", "bars"],
            labels.iter().map(|l| {
                vec![
                    l.date.to_string(),
                    l.value().to_string(),
                    l.outcome.name().to_string(),
                    l.outcome.bars().map(|b| b.to_string()).unwrap_or_default(),
                ]
            }),
        )
    }
}
