//! Core domain types and logic.

pub mod ohlcv;
pub mod price_series;
pub mod barrier;
pub mod labeling;
pub mod signal;
pub mod ensemble;
pub mod indicator;
pub mod position;
pub mod portfolio;
pub mod execution;
pub mod backtest;
pub mod runner;
pub mod metrics;
pub mod universe;
pub mod config_validation;
pub mod error;
