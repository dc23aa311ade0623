//! Date-indexed price series.
//!
//! A `PriceSeries` owns bars in strictly increasing date order. Every join
//! against labels, signals or the equity curve goes through the date index,
//! never through positional offsets.

use crate::domain::error::VoteTraderError;
use crate::domain::ohlcv::OhlcvBar;
use chrono::NaiveDate;
use std::collections::HashMap;

#[derive(Debug, Clone, Default)]
pub struct PriceSeries {
    bars: Vec<OhlcvBar>,
    date_index: HashMap<NaiveDate, usize>,
}

impl PriceSeries {
    /// Build a series, rejecting out-of-order or duplicate dates and
    /// non-positive prices.
    pub fn new(bars: Vec<OhlcvBar>) -> Result<Self, VoteTraderError> {
        for (i, bar) in bars.iter().enumerate() {
            if !bar.has_valid_prices() {
                return Err(VoteTraderError::InvalidSeries {
                    reason: format!("non-positive or non-finite price on {}", bar.date),
                });
            }
            if i > 0 && bars[i - 1].date >= bar.date {
                return Err(VoteTraderError::InvalidSeries {
                    reason: format!(
                        "dates not strictly increasing: {} followed by {}",
                        bars[i - 1].date,
                        bar.date
                    ),
                });
            }
        }

        let date_index = bars
            .iter()
            .enumerate()
            .map(|(i, bar)| (bar.date, i))
            .collect();
        Ok(Self { bars, date_index })
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    pub fn bars(&self) -> &[OhlcvBar] {
        &self.bars
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.date_index.contains_key(&date)
    }
}
