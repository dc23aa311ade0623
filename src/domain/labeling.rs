//! Triple-barrier labeling.
//!
//! Each date with a full look-forward window gets a binary label: 1 when the
//! closing price reaches the take-profit barrier before the stop-loss barrier
//! inside the window, 0 when the stop-loss is reached first or neither
//! barrier is touched. Only closing prices are scanned; intraday high/low are
//! ignored so labels are reproducible from daily bars alone.

use crate::domain::barrier::{BarrierPriority, Barriers, Touch};
use crate::domain::error::VoteTraderError;
use crate::domain::price_series::PriceSeries;
use chrono::NaiveDate;

#[derive(Debug, Clone, PartialEq)]
pub struct LabelParams {
    pub look_forward: usize,
    pub take_profit_return: f64,
    pub stop_loss_return: f64,
}

impl Default for LabelParams {
    fn default() -> Self {
        LabelParams {
            look_forward: 10,
            take_profit_return: 0.05,
            stop_loss_return: -0.02,
        }
    }
}

impl LabelParams {
    pub fn validate(&self) -> Result<(), VoteTraderError> {
        if self.look_forward == 0 {
            return Err(VoteTraderError::invalid_parameter(
                "look_forward",
                "must be positive",
            ));
        }
        if !self.take_profit_return.is_finite() || self.take_profit_return <= 0.0 {
            return Err(VoteTraderError::invalid_parameter(
                "take_profit_return",
                "must be a positive return",
            ));
        }
        if !self.stop_loss_return.is_finite() || self.stop_loss_return >= 0.0 {
            return Err(VoteTraderError::invalid_parameter(
                "stop_loss_return",
                "must be a negative return",
            ));
        }
        Ok(())
    }
}

/// How the look-forward window resolved. `bars` is the 1-based position in
/// the window of the close that touched the barrier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BarrierOutcome {
    TakeProfit { bars: usize },
    StopLoss { bars: usize },
    Expired,
}

impl BarrierOutcome {
    pub fn name(&self) -> &'static str {
        match self {
            BarrierOutcome::TakeProfit { .. } => "take_profit",
            BarrierOutcome::StopLoss { .. } => "stop_loss",
            BarrierOutcome::Expired => "expired",
        }
    }

    pub fn bars(&self) -> Option<usize> {
        match self {
            BarrierOutcome::TakeProfit { bars } | BarrierOutcome::StopLoss { bars } => Some(*bars),
            BarrierOutcome::Expired => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Label {
    pub date: NaiveDate,
    pub outcome: BarrierOutcome,
}

impl Label {
    /// 1 for a take-profit hit, 0 for a stop-out or an expired window.
    pub fn value(&self) -> u8 {
        match self.outcome {
            BarrierOutcome::TakeProfit { .. } => 1,
            BarrierOutcome::StopLoss { .. } | BarrierOutcome::Expired => 0,
        }
    }
}

/// Label every date that has `look_forward` closes after it.
///
/// The result holds `series.len() - look_forward` labels (none when the
/// series is not longer than the window).
pub fn label(series: &PriceSeries, params: &LabelParams) -> Result<Vec<Label>, VoteTraderError> {
    params.validate()?;

    let bars = series.bars();
    let labelled = bars.len().saturating_sub(params.look_forward);
    let mut labels = Vec::with_capacity(labelled);

    for i in 0..labelled {
        let barriers = Barriers::from_returns(
            bars[i].close,
            params.take_profit_return,
            params.stop_loss_return,
        );
        let window = bars[i + 1..=i + params.look_forward].iter().map(|b| b.close);

        let outcome = match barriers.first_touch(window, BarrierPriority::UpperFirst) {
            Some((offset, Touch::Upper)) => BarrierOutcome::TakeProfit { bars: offset + 1 },
            Some((offset, Touch::Lower)) => BarrierOutcome::StopLoss { bars: offset + 1 },
            None => BarrierOutcome::Expired,
        };

        labels.push(Label {
            date: bars[i].date,
            outcome,
        });
    }

    Ok(labels)
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LabelDistribution {
    pub take_profit: usize,
    pub stop_loss: usize,
    pub expired: usize,
}

impl LabelDistribution {
    pub fn total(&self) -> usize {
        self.take_profit + self.stop_loss + self.expired
    }

    /// Fraction of labels equal to 1.
    pub fn positive_rate(&self) -> f64 {
        let total = self.total();
        if total == 0 {
            0.0
        } else {
            self.take_profit as f64 / total as f64
        }
    }
}

pub fn label_distribution(labels: &[Label]) -> LabelDistribution {
    let mut dist = LabelDistribution::default();
    for l in labels {
        match l.outcome {
            BarrierOutcome::TakeProfit { .. } => dist.take_profit += 1,
            BarrierOutcome::StopLoss { .. } => dist.stop_loss += 1,
            BarrierOutcome::Expired => dist.expired += 1,
        }
    }
    dist
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ohlcv::OhlcvBar;

    fn series_from_closes(closes: &[f64]) -> PriceSeries {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let bars = closes
            .iter()
            .enumerate()
            .map(|(i, &close)| OhlcvBar {
                date: start + chrono::Duration::days(i as i64),
                open: close,
                high: close,
                low: close,
                close,
                volume: 1000,
            })
            .collect();
        PriceSeries::new(bars).unwrap()
    }

    fn params(look_forward: usize, tp: f64, sl: f64) -> LabelParams {
        LabelParams {
            look_forward,
            take_profit_return: tp,
            stop_loss_return: sl,
        }
    }

    #[test]
    fn upper_barrier_touched_first() {
        // entry 100, barriers 105/98; window [103, 106, 95] hits 106 first
        let series = series_from_closes(&[100.0, 103.0, 106.0, 95.0, 101.0]);
        let labels = label(&series, &params(3, 0.05, -0.02)).unwrap();

        assert_eq!(labels.len(), 2);
        assert_eq!(labels[0].value(), 1);
        assert_eq!(labels[0].outcome, BarrierOutcome::TakeProfit { bars: 2 });
    }

    #[test]
    fn second_date_stops_out() {
        // entry 103, barriers 108.15/100.94; window [106, 95, 101] hits 95
        let series = series_from_closes(&[100.0, 103.0, 106.0, 95.0, 101.0]);
        let labels = label(&series, &params(3, 0.05, -0.02)).unwrap();

        assert_eq!(labels[1].value(), 0);
        assert_eq!(labels[1].outcome, BarrierOutcome::StopLoss { bars: 2 });
    }

    #[test]
    fn untouched_window_defaults_to_zero() {
        let series = series_from_closes(&[100.0, 101.0, 102.0, 101.5]);
        let labels = label(&series, &params(3, 0.05, -0.02)).unwrap();

        assert_eq!(labels.len(), 1);
        assert_eq!(labels[0].outcome, BarrierOutcome::Expired);
        assert_eq!(labels[0].value(), 0);
    }

    #[test]
    fn barrier_touch_is_inclusive() {
        let series = series_from_closes(&[100.0, 105.0]);
        let labels = label(&series, &params(1, 0.05, -0.02)).unwrap();
        assert_eq!(labels[0].value(), 1);

        let series = series_from_closes(&[100.0, 98.0]);
        let labels = label(&series, &params(1, 0.05, -0.02)).unwrap();
        assert_eq!(labels[0].outcome, BarrierOutcome::StopLoss { bars: 1 });
    }

    #[test]
    fn labels_are_dated_by_entry_day() {
        let series = series_from_closes(&[100.0, 103.0, 106.0, 95.0, 101.0]);
        let labels = label(&series, &params(2, 0.05, -0.02)).unwrap();
        let dates: Vec<NaiveDate> = labels.iter().map(|l| l.date).collect();
        let expected: Vec<NaiveDate> = series.bars()[..3].iter().map(|b| b.date).collect();
        assert_eq!(dates, expected);
    }

    #[test]
    fn short_series_yields_no_labels() {
        let series = series_from_closes(&[100.0, 101.0, 102.0]);
        assert!(label(&series, &params(3, 0.05, -0.02)).unwrap().is_empty());
        assert!(label(&series, &params(10, 0.05, -0.02)).unwrap().is_empty());
    }

    #[test]
    fn empty_series_yields_no_labels() {
        let series = PriceSeries::new(vec![]).unwrap();
        assert!(label(&series, &LabelParams::default()).unwrap().is_empty());
    }

    #[test]
    fn zero_look_forward_rejected() {
        let series = series_from_closes(&[100.0, 101.0]);
        let result = label(&series, &params(0, 0.05, -0.02));
        assert!(matches!(
            result,
            Err(VoteTraderError::InvalidParameter { ref name, .. }) if name == "look_forward"
        ));
    }

    #[test]
    fn non_negative_stop_loss_rejected() {
        let series = series_from_closes(&[100.0, 101.0]);
        assert!(label(&series, &params(1, 0.05, 0.0)).is_err());
        assert!(label(&series, &params(1, 0.0, -0.02)).is_err());
    }

    #[test]
    fn distribution_counts() {
        let series = series_from_closes(&[100.0, 103.0, 106.0, 95.0, 101.0, 102.0]);
        let labels = label(&series, &params(2, 0.05, -0.02)).unwrap();
        let dist = label_distribution(&labels);

        assert_eq!(dist.total(), labels.len());
        assert_eq!(
            dist.take_profit,
            labels.iter().filter(|l| l.value() == 1).count()
        );
    }

    #[test]
    fn distribution_empty() {
        let dist = label_distribution(&[]);
        assert_eq!(dist.total(), 0);
        assert_eq!(dist.positive_rate(), 0.0);
    }
}
