#![allow(dead_code)]

use chrono::NaiveDate;
use std::collections::HashMap;
pub use votetrader::domain::ohlcv::OhlcvBar;
use votetrader::domain::error::VoteTraderError;
use votetrader::domain::price_series::PriceSeries;
use votetrader::domain::signal::ModelSignal;
use votetrader::ports::data_port::DataPort;
use votetrader::ports::signal_port::SignalPort;

pub struct MockDataPort {
    pub data: HashMap<String, Vec<OhlcvBar>>,
    pub errors: HashMap<String, String>,
}

impl MockDataPort {
    pub fn new() -> Self {
        Self {
            data: HashMap::new(),
            errors: HashMap::new(),
        }
    }

    pub fn with_bars(mut self, symbol: &str, bars: Vec<OhlcvBar>) -> Self {
        self.data.insert(symbol.to_string(), bars);
        self
    }

    pub fn with_error(mut self, symbol: &str, reason: &str) -> Self {
        self.errors.insert(symbol.to_string(), reason.to_string());
        self
    }
}

impl DataPort for MockDataPort {
    fn fetch_ohlcv(
        &self,
        symbol: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Vec<OhlcvBar>, VoteTraderError> {
        if let Some(reason) = self.errors.get(symbol) {
            return Err(VoteTraderError::Data {
                reason: reason.clone(),
            });
        }
        Ok(self
            .data
            .get(symbol)
            .map(|bars| {
                bars.iter()
                    .filter(|b| b.date >= start_date && b.date <= end_date)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }

    fn list_symbols(&self) -> Result<Vec<String>, VoteTraderError> {
        let mut symbols: Vec<String> = self.data.keys().cloned().collect();
        symbols.sort();
        Ok(symbols)
    }
}

/// Signals keyed by `(symbol, model)`; an unknown pair is a data error.
pub struct MockSignalPort {
    pub signals: HashMap<(String, String), ModelSignal>,
}

impl MockSignalPort {
    pub fn new() -> Self {
        Self {
            signals: HashMap::new(),
        }
    }

    pub fn with_signal(mut self, symbol: &str, model: &str, values: Vec<(NaiveDate, bool)>) -> Self {
        self.signals.insert(
            (symbol.to_string(), model.to_string()),
            ModelSignal::with_values(model, values),
        );
        self
    }
}

impl SignalPort for MockSignalPort {
    fn fetch_signal(&self, symbol: &str, model: &str) -> Result<ModelSignal, VoteTraderError> {
        self.signals
            .get(&(symbol.to_string(), model.to_string()))
            .cloned()
            .ok_or_else(|| VoteTraderError::Data {
                reason: format!("no signal for {} {}", symbol, model),
            })
    }
}

pub fn date(i: usize) -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 1, 1).unwrap() + chrono::Duration::days(i as i64)
}

pub fn parse_date(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
}

/// A bar on day `i` with every price equal to `close`.
pub fn make_bar(i: usize, close: f64) -> OhlcvBar {
    make_bar_full(i, close, close, 1_000)
}

pub fn make_bar_full(i: usize, open: f64, close: f64, volume: u64) -> OhlcvBar {
    OhlcvBar {
        date: date(i),
        open,
        high: open.max(close),
        low: open.min(close),
        close,
        volume,
    }
}

pub fn series_from_closes(closes: &[f64]) -> PriceSeries {
    let bars = closes
        .iter()
        .enumerate()
        .map(|(i, &c)| make_bar(i, c))
        .collect();
    PriceSeries::new(bars).unwrap()
}

/// One value per day starting at day 0.
pub fn daily_signal(values: &[bool]) -> Vec<(NaiveDate, bool)> {
    values
        .iter()
        .enumerate()
        .map(|(i, &v)| (date(i), v))
        .collect()
}
