//! Performance metrics over a completed backtest.

use super::backtest::BacktestResult;
use super::portfolio::EquityPoint;
use super::position::ExitReason;

const TRADING_DAYS_PER_YEAR: f64 = 252.0;

#[derive(Debug, Clone, PartialEq)]
pub struct Metrics {
    pub total_return: f64,
    pub buy_and_hold_return: f64,
    pub excess_return: f64,
    pub annualized_return: f64,
    pub sharpe_ratio: f64,
    pub sortino_ratio: f64,
    pub max_drawdown: f64,
    pub max_drawdown_duration: usize,
    pub total_trades: usize,
    pub trades_won: usize,
    pub trades_lost: usize,
    pub win_rate: f64,
    pub profit_factor: f64,
    pub avg_trade_return: f64,
    /// Mean calendar days between entry and exit.
    pub avg_holding_days: f64,
    pub stop_loss_exits: usize,
    pub take_profit_exits: usize,
    pub signal_exits: usize,
}

impl Metrics {
    pub fn compute(result: &BacktestResult, risk_free_rate: f64) -> Self {
        let curve = &result.equity_curve;

        let years = curve.len() as f64 / TRADING_DAYS_PER_YEAR;
        let annualized_return = if years > 0.0 && result.total_return > -1.0 {
            (1.0 + result.total_return).powf(1.0 / years) - 1.0
        } else {
            0.0
        };

        let (max_drawdown, max_drawdown_duration) = compute_drawdown(curve);
        let (sharpe_ratio, sortino_ratio) =
            compute_risk_adjusted(curve, risk_free_rate / TRADING_DAYS_PER_YEAR);

        let trades = &result.closed_trades;
        let total_trades = trades.len();
        let trades_won = trades.iter().filter(|t| t.pnl > 0.0).count();
        let trades_lost = trades.iter().filter(|t| t.pnl < 0.0).count();
        let gross_profit: f64 = trades.iter().map(|t| t.pnl).filter(|p| *p > 0.0).sum();
        let gross_loss: f64 = trades.iter().map(|t| t.pnl).filter(|p| *p < 0.0).map(f64::abs).sum();

        let win_rate = if total_trades > 0 {
            trades_won as f64 / total_trades as f64
        } else {
            0.0
        };

        let profit_factor = if gross_loss > 0.0 {
            gross_profit / gross_loss
        } else if gross_profit > 0.0 {
            f64::INFINITY
        } else {
            0.0
        };

        let (avg_trade_return, avg_holding_days) = if total_trades > 0 {
            let n = total_trades as f64;
            (
                trades.iter().map(|t| t.return_pct()).sum::<f64>() / n,
                trades.iter().map(|t| t.holding_days() as f64).sum::<f64>() / n,
            )
        } else {
            (0.0, 0.0)
        };

        let exits = |reason: ExitReason| trades.iter().filter(|t| t.exit_reason == reason).count();

        Metrics {
            total_return: result.total_return,
            buy_and_hold_return: result.buy_and_hold_return,
            excess_return: result.total_return - result.buy_and_hold_return,
            annualized_return,
            sharpe_ratio,
            sortino_ratio,
            max_drawdown,
            max_drawdown_duration,
            total_trades,
            trades_won,
            trades_lost,
            win_rate,
            profit_factor,
            avg_trade_return,
            avg_holding_days,
            stop_loss_exits: exits(ExitReason::StopLoss),
            take_profit_exits: exits(ExitReason::TakeProfit),
            signal_exits: exits(ExitReason::Signal),
        }
    }
}

/// Largest peak-to-trough decline as a fraction of the peak, and the longest
/// run of consecutive points spent below a prior peak.
fn compute_drawdown(curve: &[EquityPoint]) -> (f64, usize) {
    let mut peak = match curve.first() {
        Some(p) => p.equity,
        None => return (0.0, 0),
    };
    let mut max_dd = 0.0_f64;
    let mut run = 0usize;
    let mut longest = 0usize;

    for point in curve {
        if point.equity >= peak {
            peak = point.equity;
            run = 0;
            continue;
        }
        max_dd = max_dd.max((peak - point.equity) / peak);
        run += 1;
        longest = longest.max(run);
    }

    (max_dd, longest)
}

/// Annualised Sharpe and Sortino ratios from daily equity returns.
fn compute_risk_adjusted(curve: &[EquityPoint], daily_rf: f64) -> (f64, f64) {
    let returns: Vec<f64> = curve
        .windows(2)
        .map(|w| (w[1].equity - w[0].equity) / w[0].equity)
        .collect();
    if returns.is_empty() {
        return (0.0, 0.0);
    }

    let n = returns.len() as f64;
    let mean = returns.iter().sum::<f64>() / n;
    let excess = mean - daily_rf;
    let annualise = TRADING_DAYS_PER_YEAR.sqrt();

    let stddev = (returns.iter().map(|r| (r - mean).powi(2)).sum::<f64>() / n).sqrt();
    let downside = (returns
        .iter()
        .filter(|&&r| r < daily_rf)
        .map(|r| (r - daily_rf).powi(2))
        .sum::<f64>()
        / n)
        .sqrt();

    let ratio = |dev: f64| if dev > 0.0 { excess / dev * annualise } else { 0.0 };
    (ratio(stddev), ratio(downside))
}
