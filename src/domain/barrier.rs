//! First-touch barrier scan.
//!
//! Both label generation and the simulator's risk exit decide outcomes by
//! walking prices in date order and stopping at the first price that crosses
//! an upper or lower barrier. They share this scan so that a price sitting on
//! both barriers is resolved the same way in both places, given the same
//! priority.

/// Which barrier a price crossed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Touch {
    Upper,
    Lower,
}

/// Evaluation order when a single price satisfies both barriers. That can
/// only happen when `upper <= lower`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BarrierPriority {
    UpperFirst,
    LowerFirst,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Barriers {
    pub upper: f64,
    pub lower: f64,
}

impl Barriers {
    /// Barriers at `entry * (1 + upper_return)` and `entry * (1 + lower_return)`.
    /// `lower_return` is expected to be negative.
    pub fn from_returns(entry: f64, upper_return: f64, lower_return: f64) -> Self {
        Barriers {
            upper: entry * (1.0 + upper_return),
            lower: entry * (1.0 + lower_return),
        }
    }

    /// Barriers at `entry * (1 + take_profit_pct)` and `entry * (1 - stop_loss_pct)`,
    /// both percentages given as positive fractions.
    pub fn from_pcts(entry: f64, take_profit_pct: f64, stop_loss_pct: f64) -> Self {
        Barriers {
            upper: entry * (1.0 + take_profit_pct),
            lower: entry * (1.0 - stop_loss_pct),
        }
    }

    /// Upper touches on `price >= upper`, lower on `price <= lower`.
    pub fn touch(&self, price: f64, priority: BarrierPriority) -> Option<Touch> {
        let upper = price >= self.upper;
        let lower = price <= self.lower;
        match priority {
            BarrierPriority::UpperFirst if upper => Some(Touch::Upper),
            BarrierPriority::UpperFirst if lower => Some(Touch::Lower),
            BarrierPriority::LowerFirst if lower => Some(Touch::Lower),
            BarrierPriority::LowerFirst if upper => Some(Touch::Upper),
            _ => None,
        }
    }

    /// Scan `prices` in order and return the zero-based offset of the first
    /// touch together with the barrier that was hit.
    pub fn first_touch<I>(&self, prices: I, priority: BarrierPriority) -> Option<(usize, Touch)>
    where
        I: IntoIterator<Item = f64>,
    {
        prices
            .into_iter()
            .enumerate()
            .find_map(|(offset, price)| self.touch(price, priority).map(|t| (offset, t)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn from_returns_levels() {
        let b = Barriers::from_returns(100.0, 0.05, -0.02);
        assert_relative_eq!(b.upper, 105.0);
        assert_relative_eq!(b.lower, 98.0);
    }

    #[test]
    fn from_pcts_levels() {
        let b = Barriers::from_pcts(100.0, 0.07, 0.03);
        assert_relative_eq!(b.upper, 107.0);
        assert_relative_eq!(b.lower, 97.0);
    }

    #[test]
    fn touch_is_inclusive() {
        let b = Barriers {
            upper: 105.0,
            lower: 98.0,
        };
        assert_eq!(b.touch(105.0, BarrierPriority::UpperFirst), Some(Touch::Upper));
        assert_eq!(b.touch(98.0, BarrierPriority::UpperFirst), Some(Touch::Lower));
        assert_eq!(b.touch(101.0, BarrierPriority::UpperFirst), None);
    }

    #[test]
    fn first_touch_stops_at_first_crossing() {
        let b = Barriers::from_returns(100.0, 0.05, -0.02);
        // 106 crosses the upper barrier before 95 crosses the lower one
        let hit = b.first_touch([103.0, 106.0, 95.0], BarrierPriority::UpperFirst);
        assert_eq!(hit, Some((1, Touch::Upper)));
    }

    #[test]
    fn first_touch_lower_before_upper() {
        let b = Barriers::from_returns(100.0, 0.05, -0.02);
        let hit = b.first_touch([99.0, 97.0, 110.0], BarrierPriority::UpperFirst);
        assert_eq!(hit, Some((1, Touch::Lower)));
    }

    #[test]
    fn first_touch_none_within_window() {
        let b = Barriers::from_returns(100.0, 0.05, -0.02);
        assert_eq!(
            b.first_touch([101.0, 102.0, 99.0], BarrierPriority::UpperFirst),
            None
        );
        assert_eq!(
            b.first_touch(std::iter::empty(), BarrierPriority::LowerFirst),
            None
        );
    }

    #[test]
    fn overlapping_barriers_follow_priority() {
        let b = Barriers {
            upper: 95.0,
            lower: 105.0,
        };
        assert_eq!(b.touch(100.0, BarrierPriority::UpperFirst), Some(Touch::Upper));
        assert_eq!(b.touch(100.0, BarrierPriority::LowerFirst), Some(Touch::Lower));
    }
}
