//! Position state and trade records.

use chrono::NaiveDate;

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum Position {
    #[default]
    Flat,
    Long {
        shares: f64,
        entry_price: f64,
        entry_date: NaiveDate,
    },
}

impl Position {
    pub fn is_long(&self) -> bool {
        matches!(self, Position::Long { .. })
    }

    pub fn is_flat(&self) -> bool {
        matches!(self, Position::Flat)
    }

    pub fn shares(&self) -> f64 {
        match self {
            Position::Flat => 0.0,
            Position::Long { shares, .. } => *shares,
        }
    }

    pub fn entry_price(&self) -> Option<f64> {
        match self {
            Position::Flat => None,
            Position::Long { entry_price, .. } => Some(*entry_price),
        }
    }

    pub fn market_value(&self, price: f64) -> f64 {
        self.shares() * price
    }
}

/// Why a long position was liquidated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExitReason {
    StopLoss,
    TakeProfit,
    Signal,
}

impl ExitReason {
    pub fn name(&self) -> &'static str {
        match self {
            ExitReason::StopLoss => "stop_loss",
            ExitReason::TakeProfit => "take_profit",
            ExitReason::Signal => "signal",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TradeAction {
    Buy,
    Sell(ExitReason),
}

/// One executed cash/position mutation.
#[derive(Debug, Clone, PartialEq)]
pub struct TradeRecord {
    pub date: NaiveDate,
    pub action: TradeAction,
    pub price: f64,
    pub shares: f64,
    pub cash_after: f64,
}

/// A completed entry/exit round trip.
#[derive(Debug, Clone, PartialEq)]
pub struct ClosedTrade {
    pub shares: f64,
    pub entry_price: f64,
    pub exit_price: f64,
    pub entry_date: NaiveDate,
    pub exit_date: NaiveDate,
    pub exit_reason: ExitReason,
    pub pnl: f64,
}

impl ClosedTrade {
    pub fn return_pct(&self) -> f64 {
        (self.exit_price - self.entry_price) / self.entry_price
    }

    pub fn holding_days(&self) -> i64 {
        (self.exit_date - self.entry_date).num_days()
    }
}

/// Pair buys with the sells that follow them. A trailing buy with no exit
/// is still open and produces no closed trade.
pub fn pair_round_trips(trades: &[TradeRecord]) -> Vec<ClosedTrade> {
    let mut closed = Vec::new();
    let mut open: Option<&TradeRecord> = None;

    for trade in trades {
        match trade.action {
            TradeAction::Buy => open = Some(trade),
            TradeAction::Sell(reason) => {
                if let Some(entry) = open.take() {
                    closed.push(ClosedTrade {
                        shares: entry.shares,
                        entry_price: entry.price,
                        exit_price: trade.price,
                        entry_date: entry.date,
                        exit_date: trade.date,
                        exit_reason: reason,
                        pnl: entry.shares * (trade.price - entry.price),
                    });
                }
            }
        }
    }

    closed
}
