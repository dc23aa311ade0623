//! Symbol and model lists for a backtest run, and loading of each symbol's
//! prices and model signals through the ports.

use crate::domain::error::VoteTraderError;
use crate::domain::price_series::PriceSeries;
use crate::domain::signal::ModelSignal;
use crate::ports::data_port::DataPort;
use crate::ports::signal_port::SignalPort;
use chrono::NaiveDate;
use std::collections::HashSet;
use tracing::{info, warn};

#[derive(Debug, Clone, thiserror::Error, PartialEq)]
pub enum UniverseError {
    #[error("empty token in list")]
    EmptyToken,

    #[error("duplicate entry: {0}")]
    Duplicate(String),
}

fn parse_list(input: &str, normalise: fn(&str) -> String) -> Result<Vec<String>, UniverseError> {
    let mut items = Vec::new();
    let mut seen = HashSet::new();

    for token in input.split(',') {
        let trimmed = token.trim();
        if trimmed.is_empty() {
            return Err(UniverseError::EmptyToken);
        }
        let item = normalise(trimmed);
        if !seen.insert(item.clone()) {
            return Err(UniverseError::Duplicate(item));
        }
        items.push(item);
    }

    Ok(items)
}

/// Comma-separated ticker symbols, upper-cased.
pub fn parse_symbols(input: &str) -> Result<Vec<String>, UniverseError> {
    parse_list(input, str::to_uppercase)
}

/// Comma-separated model names, lower-cased.
pub fn parse_models(input: &str) -> Result<Vec<String>, UniverseError> {
    parse_list(input, str::to_lowercase)
}

/// Everything one symbol's backtest needs.
#[derive(Debug, Clone)]
pub struct SymbolData {
    pub symbol: String,
    pub series: PriceSeries,
    pub signals: Vec<ModelSignal>,
}

pub fn load_symbol(
    data_port: &dyn DataPort,
    signal_port: &dyn SignalPort,
    symbol: &str,
    models: &[String],
    start_date: NaiveDate,
    end_date: NaiveDate,
) -> Result<SymbolData, VoteTraderError> {
    let bars = data_port.fetch_ohlcv(symbol, start_date, end_date)?;
    let series = PriceSeries::new(bars)?;

    let signals = models
        .iter()
        .map(|model| signal_port.fetch_signal(symbol, model))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(SymbolData {
        symbol: symbol.to_string(),
        series,
        signals,
    })
}

#[derive(Debug, Clone)]
pub struct SkippedSymbol {
    pub symbol: String,
    pub reason: String,
}

pub struct UniverseLoadResult {
    pub loaded: Vec<SymbolData>,
    pub skipped: Vec<SkippedSymbol>,
}

/// Load every symbol, skipping (and logging) those whose data cannot be
/// read. Fails only when nothing could be loaded.
pub fn load_universe(
    data_port: &dyn DataPort,
    signal_port: &dyn SignalPort,
    symbols: &[String],
    models: &[String],
    start_date: NaiveDate,
    end_date: NaiveDate,
) -> Result<UniverseLoadResult, VoteTraderError> {
    let mut loaded = Vec::new();
    let mut skipped = Vec::new();

    for symbol in symbols {
        match load_symbol(data_port, signal_port, symbol, models, start_date, end_date) {
            Ok(data) if data.series.is_empty() => {
                warn!(%symbol, "skipping: no price data in range");
                skipped.push(SkippedSymbol {
                    symbol: symbol.clone(),
                    reason: "no price data in range".to_string(),
                });
            }
            Ok(data) => {
                info!(%symbol, bars = data.series.len(), models = data.signals.len(), "loaded");
                loaded.push(data);
            }
            Err(e) => {
                warn!(%symbol, error = %e, "skipping");
                skipped.push(SkippedSymbol {
                    symbol: symbol.clone(),
                    reason: e.to_string(),
                });
            }
        }
    }

    if loaded.is_empty() {
        return Err(VoteTraderError::NoData {
            symbol: symbols.join(","),
        });
    }

    Ok(UniverseLoadResult { loaded, skipped })
}
