//! Price data access port.

use crate::domain::error::VoteTraderError;
use crate::domain::ohlcv::OhlcvBar;
use chrono::NaiveDate;

pub trait DataPort {
    /// Bars for `symbol` within `[start_date, end_date]`, sorted by date.
    fn fetch_ohlcv(
        &self,
        symbol: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Vec<OhlcvBar>, VoteTraderError>;

    fn list_symbols(&self) -> Result<Vec<String>, VoteTraderError>;
}
