//! Configuration validation.
//!
//! Validates INI fields before any data is loaded, so that a bad value is
//! reported against its section and key rather than as an algorithm error.

use crate::domain::error::VoteTraderError;
use crate::domain::universe::{parse_models, parse_symbols};
use crate::ports::config_port::ConfigPort;
use chrono::NaiveDate;

fn invalid(section: &str, key: &str, reason: &str) -> VoteTraderError {
    VoteTraderError::ConfigInvalid {
        section: section.to_string(),
        key: key.to_string(),
        reason: reason.to_string(),
    }
}

fn missing(section: &str, key: &str) -> VoteTraderError {
    VoteTraderError::ConfigMissing {
        section: section.to_string(),
        key: key.to_string(),
    }
}

pub fn validate_backtest_config(config: &dyn ConfigPort) -> Result<(), VoteTraderError> {
    validate_data_section(config)?;
    validate_dates(config)?;
    validate_quorum(config)?;
    validate_simulation_section(config)?;
    validate_risk_free_rate(config)?;
    Ok(())
}

pub fn validate_label_config(config: &dyn ConfigPort) -> Result<(), VoteTraderError> {
    let look_forward = config.get_int("labeling", "look_forward", 10);
    if look_forward < 1 {
        return Err(invalid(
            "labeling",
            "look_forward",
            "look_forward must be at least 1",
        ));
    }
    let tp = config.get_double("labeling", "take_profit_return", 0.05);
    if !tp.is_finite() || tp <= 0.0 {
        return Err(invalid(
            "labeling",
            "take_profit_return",
            "take_profit_return must be positive",
        ));
    }
    let sl = config.get_double("labeling", "stop_loss_return", -0.02);
    if !sl.is_finite() || sl >= 0.0 {
        return Err(invalid(
            "labeling",
            "stop_loss_return",
            "stop_loss_return must be negative",
        ));
    }
    Ok(())
}

fn validate_data_section(config: &dyn ConfigPort) -> Result<(), VoteTraderError> {
    match config.get_string("data", "directory") {
        Some(s) if !s.trim().is_empty() => {}
        _ => return Err(missing("data", "directory")),
    }

    let symbols = config
        .get_string("data", "symbols")
        .filter(|s| !s.trim().is_empty())
        .ok_or_else(|| missing("data", "symbols"))?;
    parse_symbols(&symbols).map_err(|e| invalid("data", "symbols", &e.to_string()))?;

    let models = config
        .get_string("data", "models")
        .filter(|s| !s.trim().is_empty())
        .ok_or_else(|| missing("data", "models"))?;
    parse_models(&models).map_err(|e| invalid("data", "models", &e.to_string()))?;

    Ok(())
}

/// Dates are optional; when both are given the start must precede the end.
fn validate_dates(config: &dyn ConfigPort) -> Result<(), VoteTraderError> {
    let start = parse_optional_date(config, "start_date")?;
    let end = parse_optional_date(config, "end_date")?;

    if let (Some(start), Some(end)) = (start, end) {
        if start >= end {
            return Err(invalid(
                "data",
                "start_date",
                "start_date must be before end_date",
            ));
        }
    }
    Ok(())
}

pub fn parse_optional_date(
    config: &dyn ConfigPort,
    key: &str,
) -> Result<Option<NaiveDate>, VoteTraderError> {
    match config.get_string("data", key) {
        None => Ok(None),
        Some(s) if s.trim().is_empty() => Ok(None),
        Some(s) => NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
            .map(Some)
            .map_err(|_| {
                invalid(
                    "data",
                    key,
                    &format!("invalid {} format, expected YYYY-MM-DD", key),
                )
            }),
    }
}

fn validate_quorum(config: &dyn ConfigPort) -> Result<(), VoteTraderError> {
    if config.get_string("ensemble", "quorum").is_none() {
        return Ok(());
    }
    let models = config
        .get_string("data", "models")
        .and_then(|m| parse_models(&m).ok())
        .map(|m| m.len())
        .unwrap_or(0) as i64;
    let quorum = config.get_int("ensemble", "quorum", 0);
    if quorum < 1 || quorum > models {
        return Err(invalid(
            "ensemble",
            "quorum",
            &format!("quorum must be between 1 and {}", models),
        ));
    }
    Ok(())
}

fn validate_simulation_section(config: &dyn ConfigPort) -> Result<(), VoteTraderError> {
    let cash = config.get_double("simulation", "initial_cash", 10_000.0);
    if !cash.is_finite() || cash <= 0.0 {
        return Err(invalid(
            "simulation",
            "initial_cash",
            "initial_cash must be positive",
        ));
    }

    let sl = config.get_double("simulation", "stop_loss_pct", 0.03);
    if !sl.is_finite() || sl <= 0.0 || sl >= 1.0 {
        return Err(invalid(
            "simulation",
            "stop_loss_pct",
            "stop_loss_pct must be between 0 and 1",
        ));
    }

    let tp = config.get_double("simulation", "take_profit_pct", 0.07);
    if !tp.is_finite() || tp <= 0.0 {
        return Err(invalid(
            "simulation",
            "take_profit_pct",
            "take_profit_pct must be positive",
        ));
    }

    let threshold = config.get_double("simulation", "volume_threshold", 1.5);
    if !threshold.is_finite() || threshold < 0.0 {
        return Err(invalid(
            "simulation",
            "volume_threshold",
            "volume_threshold must be non-negative",
        ));
    }

    let fraction = config.get_double("simulation", "investment_fraction", 0.5);
    if !fraction.is_finite() || fraction <= 0.0 || fraction > 1.0 {
        return Err(invalid(
            "simulation",
            "investment_fraction",
            "investment_fraction must be in (0, 1]",
        ));
    }

    let window = config.get_int("simulation", "volume_window", 20);
    if window < 1 {
        return Err(invalid(
            "simulation",
            "volume_window",
            "volume_window must be at least 1",
        ));
    }

    Ok(())
}

fn validate_risk_free_rate(config: &dyn ConfigPort) -> Result<(), VoteTraderError> {
    let value = config.get_double("report", "risk_free_rate", 0.0);
    if !(0.0..1.0).contains(&value) {
        return Err(invalid(
            "report",
            "risk_free_rate",
            "risk_free_rate must be between 0 and 1",
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::file_config_adapter::FileConfigAdapter;

    const VALID: &str = r#"
[data]
directory = ./data
symbols = AAPL,MSFT
models = lstm,gru,lgbm
start_date = 2023-01-01
end_date = 2024-12-31

[ensemble]
quorum = 2

[simulation]
initial_cash = 10000
stop_loss_pct = 0.03
take_profit_pct = 0.07
volume_threshold = 1.5
investment_fraction = 0.5
volume_window = 20
"#;

    fn with_override(section: &str, key: &str, value: &str) -> FileConfigAdapter {
        let header = format!("[{}]", section);
        let prefix = format!("{} =", key);
        let mut content = String::new();
        for line in VALID.lines().filter(|l| !l.starts_with(&prefix)) {
            content.push_str(line);
            content.push('\n');
            if line == header {
                content.push_str(&format!("{} = {}\n", key, value));
            }
        }
        FileConfigAdapter::from_string(&content).unwrap()
    }

    fn assert_invalid(adapter: &FileConfigAdapter, key: &str) {
        match validate_backtest_config(adapter) {
            Err(VoteTraderError::ConfigInvalid { key: k, .. }) => assert_eq!(k, key),
            other => panic!("expected ConfigInvalid for {key}, got {other:?}"),
        }
    }

    #[test]
    fn valid_config_passes() {
        let adapter = FileConfigAdapter::from_string(VALID).unwrap();
        assert!(validate_backtest_config(&adapter).is_ok());
    }

    #[test]
    fn minimal_config_uses_defaults() {
        let adapter = FileConfigAdapter::from_string(
            "[data]\ndirectory = d\nsymbols = AAPL\nmodels = a,b,c\n",
        )
        .unwrap();
        assert!(validate_backtest_config(&adapter).is_ok());
    }

    #[test]
    fn missing_symbols() {
        let adapter =
            FileConfigAdapter::from_string("[data]\ndirectory = d\nmodels = a\n").unwrap();
        assert!(matches!(
            validate_backtest_config(&adapter),
            Err(VoteTraderError::ConfigMissing { ref key, .. }) if key == "symbols"
        ));
    }

    #[test]
    fn duplicate_models_rejected() {
        let adapter = with_override("data", "models", "lstm,LSTM");
        assert_invalid(&adapter, "models");
    }

    #[test]
    fn bad_date_format() {
        let adapter = with_override("data", "start_date", "01/02/2023");
        assert_invalid(&adapter, "start_date");
    }

    #[test]
    fn start_after_end() {
        let adapter = with_override("data", "start_date", "2025-01-01");
        assert_invalid(&adapter, "start_date");
    }

    #[test]
    fn quorum_above_model_count() {
        let adapter = with_override("ensemble", "quorum", "4");
        assert_invalid(&adapter, "quorum");
    }

    #[test]
    fn simulation_values_checked() {
        assert_invalid(&with_override("simulation", "initial_cash", "0"), "initial_cash");
        assert_invalid(&with_override("simulation", "stop_loss_pct", "1.2"), "stop_loss_pct");
        assert_invalid(&with_override("simulation", "take_profit_pct", "-0.1"), "take_profit_pct");
        assert_invalid(
            &with_override("simulation", "investment_fraction", "0"),
            "investment_fraction",
        );
        assert_invalid(&with_override("simulation", "volume_window", "0"), "volume_window");
        assert_invalid(
            &with_override("simulation", "volume_threshold", "-1"),
            "volume_threshold",
        );
    }

    #[test]
    fn label_config_defaults_pass() {
        let adapter = FileConfigAdapter::from_string("[labeling]\n").unwrap();
        assert!(validate_label_config(&adapter).is_ok());
    }

    #[test]
    fn label_config_rejects_positive_stop() {
        let adapter =
            FileConfigAdapter::from_string("[labeling]\nstop_loss_return = 0.02\n").unwrap();
        assert!(matches!(
            validate_label_config(&adapter),
            Err(VoteTraderError::ConfigInvalid { ref key, .. }) if key == "stop_loss_return"
        ));
    }
}
