//! Multi-symbol backtest runs.
//!
//! Each symbol owns its own series, signals and portfolio state, so symbols
//! are simulated in parallel. Results come back in input order.

use rayon::prelude::*;
use tracing::{info, warn};

use super::backtest::{run_backtest, BacktestResult, SimulationOutcome};
use super::ensemble::combine;
use super::error::VoteTraderError;
use super::execution::SimulationParams;
use super::metrics::Metrics;
use super::universe::SymbolData;

#[derive(Debug, Clone)]
pub struct SymbolBacktest {
    pub symbol: String,
    pub result: BacktestResult,
    pub metrics: Metrics,
}

/// How one symbol's run ended.
#[derive(Debug)]
pub enum SymbolRun {
    Completed(SymbolBacktest),
    NoData {
        symbol: String,
        skipped_signal_dates: usize,
    },
    Failed {
        symbol: String,
        error: VoteTraderError,
    },
}

impl SymbolRun {
    pub fn symbol(&self) -> &str {
        match self {
            SymbolRun::Completed(b) => &b.symbol,
            SymbolRun::NoData { symbol, .. } | SymbolRun::Failed { symbol, .. } => symbol,
        }
    }

    pub fn completed(&self) -> Option<&SymbolBacktest> {
        match self {
            SymbolRun::Completed(b) => Some(b),
            _ => None,
        }
    }
}

/// Combine one symbol's model signals and replay the ensemble. Only
/// parameter errors fail; an empty overlap is [`SymbolRun::NoData`].
pub fn backtest_symbol(
    data: &SymbolData,
    quorum: usize,
    params: &SimulationParams,
    risk_free_rate: f64,
) -> Result<SymbolRun, VoteTraderError> {
    let ensemble = combine(&data.signals, quorum)?;
    info!(
        symbol = %data.symbol,
        dates = ensemble.len(),
        buys = ensemble.buy_count(),
        quorum,
        "ensemble combined"
    );

    match run_backtest(&data.series, &ensemble, params)? {
        SimulationOutcome::NoData {
            skipped_signal_dates,
        } => {
            warn!(
                symbol = %data.symbol,
                skipped_signal_dates,
                "no signal dates overlap the price series"
            );
            Ok(SymbolRun::NoData {
                symbol: data.symbol.clone(),
                skipped_signal_dates,
            })
        }
        SimulationOutcome::Completed(result) => {
            let metrics = Metrics::compute(&result, risk_free_rate);
            Ok(SymbolRun::Completed(SymbolBacktest {
                symbol: data.symbol.clone(),
                result,
                metrics,
            }))
        }
    }
}

pub fn backtest_universe(
    symbols: &[SymbolData],
    quorum: usize,
    params: &SimulationParams,
    risk_free_rate: f64,
) -> Vec<SymbolRun> {
    symbols
        .par_iter()
        .map(|data| {
            backtest_symbol(data, quorum, params, risk_free_rate).unwrap_or_else(|error| {
                warn!(symbol = %data.symbol, %error, "backtest failed");
                SymbolRun::Failed {
                    symbol: data.symbol.clone(),
                    error,
                }
            })
        })
        .collect()
}
