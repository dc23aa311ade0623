//! Backtest engine: replays an ensemble signal against a price series.
//!
//! Only dates present in both the signal and the series are simulated, in
//! date order, one day fully resolved before the next. The run is
//! sequential by nature; independent runs share nothing and may execute in
//! parallel.

use tracing::{debug, warn};

use super::error::VoteTraderError;
use super::execution::{step, SimulationParams};
use super::indicator::calculate_volume_sma;
use super::ohlcv::OhlcvBar;
use super::portfolio::{EquityPoint, PortfolioState};
use super::position::{pair_round_trips, ClosedTrade, TradeAction, TradeRecord};
use super::price_series::PriceSeries;
use super::signal::EnsembleSignal;

#[derive(Debug, Clone, PartialEq)]
pub struct BacktestResult {
    pub initial_cash: f64,
    pub equity_curve: Vec<EquityPoint>,
    /// `initial_cash` fully invested at the first simulated close.
    pub buy_and_hold_curve: Vec<EquityPoint>,
    pub trades: Vec<TradeRecord>,
    pub closed_trades: Vec<ClosedTrade>,
    pub final_state: PortfolioState,
    pub total_return: f64,
    pub buy_and_hold_return: f64,
    /// Signal dates with no matching bar in the price series.
    pub skipped_signal_dates: usize,
}

impl BacktestResult {
    pub fn final_equity(&self) -> f64 {
        self.equity_curve
            .last()
            .map(|p| p.equity)
            .unwrap_or(self.initial_cash)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SimulationOutcome {
    /// The signal and the series share no dates.
    NoData { skipped_signal_dates: usize },
    Completed(BacktestResult),
}

impl SimulationOutcome {
    pub fn completed(self) -> Option<BacktestResult> {
        match self {
            SimulationOutcome::Completed(result) => Some(result),
            SimulationOutcome::NoData { .. } => None,
        }
    }
}

/// Run one backtest.
///
/// Fails only on invalid parameters. An empty intersection of signal and
/// price dates is reported as [`SimulationOutcome::NoData`].
pub fn run_backtest(
    series: &PriceSeries,
    signal: &EnsembleSignal,
    params: &SimulationParams,
) -> Result<SimulationOutcome, VoteTraderError> {
    params.validate()?;

    let (aligned, skipped_signal_dates) = signal.align_to(series);
    if skipped_signal_dates > 0 {
        warn!(
            skipped = skipped_signal_dates,
            "signal dates not found in price series were skipped"
        );
    }

    // trailing volume over the whole series, not just the signal dates
    let volume_ma = calculate_volume_sma(series.bars(), params.volume_window);
    let days: Vec<(&OhlcvBar, Option<f64>)> = series
        .bars()
        .iter()
        .zip(&volume_ma)
        .filter(|(bar, _)| aligned.get(bar.date).is_some())
        .map(|(bar, ma)| (bar, ma.value()))
        .collect();

    let (first, last) = match (days.first(), days.last()) {
        (Some(&(first, _)), Some(&(last, _))) => (first, last),
        _ => {
            return Ok(SimulationOutcome::NoData {
                skipped_signal_dates,
            });
        }
    };

    let mut state = PortfolioState::new(params.initial_cash);
    let mut equity_curve = Vec::with_capacity(days.len());
    let mut buy_and_hold_curve = Vec::with_capacity(days.len());
    let mut trades = Vec::new();

    for &(bar, ma) in &days {
        let buy = aligned.get(bar.date).unwrap_or(false);
        let day = step(state, bar, buy, ma, params);

        for trade in &day.trades {
            match trade.action {
                TradeAction::Buy => debug!(
                    date = %trade.date,
                    price = trade.price,
                    shares = trade.shares,
                    "buy"
                ),
                TradeAction::Sell(reason) => debug!(
                    date = %trade.date,
                    price = trade.price,
                    shares = trade.shares,
                    reason = reason.name(),
                    "sell"
                ),
            }
        }

        state = day.state;
        trades.extend(day.trades);
        equity_curve.push(day.equity);
        buy_and_hold_curve.push(EquityPoint {
            date: bar.date,
            equity: params.initial_cash / first.close * bar.close,
        });
    }

    let final_equity = equity_curve
        .last()
        .map(|p| p.equity)
        .unwrap_or(params.initial_cash);
    let total_return = (final_equity - params.initial_cash) / params.initial_cash;
    let buy_and_hold_return = last.close_return(first.close);
    let closed_trades = pair_round_trips(&trades);

    Ok(SimulationOutcome::Completed(BacktestResult {
        initial_cash: params.initial_cash,
        equity_curve,
        buy_and_hold_curve,
        trades,
        closed_trades,
        final_state: state,
        total_return,
        buy_and_hold_return,
        skipped_signal_dates,
    }))
}
