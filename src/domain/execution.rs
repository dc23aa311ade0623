//! Daily trade execution.
//!
//! Implements the risk exit (stop-loss/take-profit at the open), the
//! volume-gated signal entry with proportional sizing, and signal exits.
//! Every function takes the portfolio state by value and returns the next
//! state; nothing is mutated behind the caller's back.

use chrono::NaiveDate;

use super::barrier::{BarrierPriority, Barriers, Touch};
use super::error::VoteTraderError;
use super::ohlcv::OhlcvBar;
use super::portfolio::{EquityPoint, PortfolioState};
use super::position::{ExitReason, Position, TradeAction, TradeRecord};

/// Simulation parameters. Percentages are fractions (0.03 = 3%).
#[derive(Debug, Clone, PartialEq)]
pub struct SimulationParams {
    pub initial_cash: f64,
    pub stop_loss_pct: f64,
    pub take_profit_pct: f64,
    pub volume_threshold: f64,
    pub investment_fraction: f64,
    pub volume_window: usize,
}

impl Default for SimulationParams {
    fn default() -> Self {
        SimulationParams {
            initial_cash: 10_000.0,
            stop_loss_pct: 0.03,
            take_profit_pct: 0.07,
            volume_threshold: 1.5,
            investment_fraction: 0.5,
            volume_window: 20,
        }
    }
}

impl SimulationParams {
    pub fn validate(&self) -> Result<(), VoteTraderError> {
        if !self.initial_cash.is_finite() || self.initial_cash <= 0.0 {
            return Err(VoteTraderError::invalid_parameter(
                "initial_cash",
                "must be positive",
            ));
        }
        if !self.stop_loss_pct.is_finite() || self.stop_loss_pct <= 0.0 || self.stop_loss_pct >= 1.0
        {
            return Err(VoteTraderError::invalid_parameter(
                "stop_loss_pct",
                "must be between 0 and 1 (exclusive)",
            ));
        }
        if !self.take_profit_pct.is_finite() || self.take_profit_pct <= 0.0 {
            return Err(VoteTraderError::invalid_parameter(
                "take_profit_pct",
                "must be positive",
            ));
        }
        if !self.volume_threshold.is_finite() || self.volume_threshold < 0.0 {
            return Err(VoteTraderError::invalid_parameter(
                "volume_threshold",
                "must be non-negative",
            ));
        }
        if !self.investment_fraction.is_finite()
            || self.investment_fraction <= 0.0
            || self.investment_fraction > 1.0
        {
            return Err(VoteTraderError::invalid_parameter(
                "investment_fraction",
                "must be in (0, 1]",
            ));
        }
        if self.volume_window == 0 {
            return Err(VoteTraderError::invalid_parameter(
                "volume_window",
                "must be at least 1",
            ));
        }
        Ok(())
    }
}

/// Stop-loss or take-profit decision for the open price. Stop-loss is
/// checked first; at most one fires.
pub fn check_risk_exit(position: &Position, open: f64, params: &SimulationParams) -> Option<ExitReason> {
    let entry_price = position.entry_price()?;
    let barriers = Barriers::from_pcts(entry_price, params.take_profit_pct, params.stop_loss_pct);
    match barriers.touch(open, BarrierPriority::LowerFirst)? {
        Touch::Lower => Some(ExitReason::StopLoss),
        Touch::Upper => Some(ExitReason::TakeProfit),
    }
}

/// `volume > volume_ma * threshold`. A day without a moving-average value
/// never passes.
pub fn volume_gate_open(volume: u64, volume_ma: Option<f64>, threshold: f64) -> bool {
    match volume_ma {
        Some(ma) => volume as f64 > ma * threshold,
        None => false,
    }
}

/// Buy `investment / price` shares, where `investment = sizing_base * fraction`.
/// Returns `None` when already long or when cash does not cover the full
/// investment; there are no partial fills.
pub fn enter_long(
    state: PortfolioState,
    date: NaiveDate,
    price: f64,
    sizing_base: f64,
    fraction: f64,
) -> Option<(PortfolioState, TradeRecord)> {
    if state.position.is_long() {
        return None;
    }

    let investment = sizing_base * fraction;
    if investment <= 0.0 || state.cash < investment {
        return None;
    }

    let shares = investment / price;
    let next = PortfolioState {
        cash: state.cash - investment,
        position: Position::Long {
            shares,
            entry_price: price,
            entry_date: date,
        },
    };

    let record = TradeRecord {
        date,
        action: TradeAction::Buy,
        price,
        shares,
        cash_after: next.cash,
    };

    Some((next, record))
}

/// Sell the whole position at `price`. Returns `None` when flat.
pub fn liquidate(
    state: PortfolioState,
    date: NaiveDate,
    price: f64,
    reason: ExitReason,
) -> Option<(PortfolioState, TradeRecord)> {
    let shares = match state.position {
        Position::Flat => return None,
        Position::Long { shares, .. } => shares,
    };

    let next = PortfolioState {
        cash: state.cash + shares * price,
        position: Position::Flat,
    };

    let record = TradeRecord {
        date,
        action: TradeAction::Sell(reason),
        price,
        shares,
        cash_after: next.cash,
    };

    Some((next, record))
}

/// Everything one simulated day produced.
#[derive(Debug, Clone, PartialEq)]
pub struct DayStep {
    pub state: PortfolioState,
    pub trades: Vec<TradeRecord>,
    pub equity: EquityPoint,
}

/// Resolve one day completely.
///
/// 1. Size any entry off the value at the open.
/// 2. Apply a stop-loss/take-profit exit at the open.
/// 3. Act on the signal using the post-exit state, so a same-day re-entry
///    after a risk exit is possible.
/// 4. Mark to the close.
pub fn step(
    state: PortfolioState,
    bar: &OhlcvBar,
    signal: bool,
    volume_ma: Option<f64>,
    params: &SimulationParams,
) -> DayStep {
    let value_at_open = state.total_value(bar.open);
    let mut state = state;
    let mut trades = Vec::new();

    if let Some(reason) = check_risk_exit(&state.position, bar.open, params) {
        if let Some((next, record)) = liquidate(state, bar.date, bar.open, reason) {
            state = next;
            trades.push(record);
        }
    }

    if signal {
        if state.position.is_flat()
            && volume_gate_open(bar.volume, volume_ma, params.volume_threshold)
        {
            if let Some((next, record)) = enter_long(
                state,
                bar.date,
                bar.open,
                value_at_open,
                params.investment_fraction,
            ) {
                state = next;
                trades.push(record);
            }
        }
    } else if let Some((next, record)) = liquidate(state, bar.date, bar.open, ExitReason::Signal) {
        state = next;
        trades.push(record);
    }

    let equity = EquityPoint {
        date: bar.date,
        equity: state.total_value(bar.close),
    };

    DayStep {
        state,
        trades,
        equity,
    }
}
