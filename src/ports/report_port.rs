//! Backtest report output port.

use crate::domain::backtest::BacktestResult;
use crate::domain::error::VoteTraderError;
use crate::domain::labeling::Label;
use crate::domain::metrics::Metrics;

pub trait ReportPort {
    fn write_backtest(
        &self,
        symbol: &str,
        result: &BacktestResult,
        metrics: &Metrics,
    ) -> Result<(), VoteTraderError>;

    fn write_labels(&self, symbol: &str, labels: &[Label]) -> Result<(), VoteTraderError>;
}
