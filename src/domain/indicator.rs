//! Volume moving average used by the entry gate.
//!
//! VOLUME_SMA(n)[i] = sum(V[i-j] for j in 0..n) / n
//! Warmup: first (n-1) bars are invalid.

use crate::domain::ohlcv::OhlcvBar;
use chrono::NaiveDate;

#[derive(Debug, Clone, PartialEq)]
pub struct IndicatorPoint {
    pub date: NaiveDate,
    pub valid: bool,
    pub value: f64,
}

impl IndicatorPoint {
    pub fn value(&self) -> Option<f64> {
        self.valid.then_some(self.value)
    }
}

pub fn calculate_volume_sma(bars: &[OhlcvBar], period: usize) -> Vec<IndicatorPoint> {
    let mut values = Vec::with_capacity(bars.len());
    if period == 0 {
        return values;
    }
    let warmup = period - 1;

    for i in 0..bars.len() {
        let valid = i >= warmup;
        let value = if valid {
            // integer sum keeps the average exact up to the final division
            let sum: u128 = bars[i + 1 - period..=i]
                .iter()
                .map(|b| b.volume as u128)
                .sum();
            sum as f64 / period as f64
        } else {
            0.0
        };

        values.push(IndicatorPoint {
            date: bars[i].date,
            valid,
            value,
        });
    }

    values
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_bars(volumes: &[u64]) -> Vec<OhlcvBar> {
        volumes
            .iter()
            .enumerate()
            .map(|(i, &volume)| OhlcvBar {
                date: NaiveDate::from_ymd_opt(2024, 1, (i + 1) as u32).unwrap(),
                open: 10.0,
                high: 10.0,
                low: 10.0,
                close: 10.0,
                volume,
            })
            .collect()
    }

    #[test]
    fn volume_sma_warmup() {
        let bars = make_bars(&[100, 200, 300, 400, 500]);
        let series = calculate_volume_sma(&bars, 3);

        assert_eq!(series.len(), 5);
        assert_eq!(series[0].value(), None);
        assert_eq!(series[1].value(), None);
        assert!(series[2].valid);
    }

    #[test]
    fn volume_sma_includes_current_bar() {
        let bars = make_bars(&[100, 200, 300, 400, 500]);
        let series = calculate_volume_sma(&bars, 3);

        assert_eq!(series[2].value(), Some(200.0));
        assert_eq!(series[3].value(), Some(300.0));
        assert_eq!(series[4].value(), Some(400.0));
    }

    #[test]
    fn volume_sma_period_one_is_volume() {
        let bars = make_bars(&[7, 9]);
        let series = calculate_volume_sma(&bars, 1);
        assert_eq!(series[0].value(), Some(7.0));
        assert_eq!(series[1].value(), Some(9.0));
    }

    #[test]
    fn volume_sma_short_input() {
        let bars = make_bars(&[100, 200]);
        let series = calculate_volume_sma(&bars, 20);
        assert!(series.iter().all(|p| !p.valid));
    }

    #[test]
    fn volume_sma_zero_period() {
        let bars = make_bars(&[100]);
        assert!(calculate_volume_sma(&bars, 0).is_empty());
    }
}
