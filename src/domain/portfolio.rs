//! Portfolio state and equity tracking.

use chrono::NaiveDate;

use super::position::Position;

#[derive(Debug, Clone, PartialEq)]
pub struct EquityPoint {
    pub date: NaiveDate,
    pub equity: f64,
}

/// Cash plus the single-instrument position. Passed by value through the
/// daily step and returned, so any day can be replayed from a saved state.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PortfolioState {
    pub cash: f64,
    pub position: Position,
}

impl PortfolioState {
    pub fn new(initial_cash: f64) -> Self {
        PortfolioState {
            cash: initial_cash,
            position: Position::Flat,
        }
    }

    pub fn shares(&self) -> f64 {
        self.position.shares()
    }

    /// `cash + shares * price`.
    pub fn total_value(&self, price: f64) -> f64 {
        self.cash + self.position.market_value(price)
    }
}
