//! Per-date model and ensemble signals.

use crate::domain::price_series::PriceSeries;
use chrono::NaiveDate;
use std::collections::BTreeMap;

/// Sparse 0/1 predictions from one model. Dates absent from `values` are
/// missing (the model made no prediction), which is distinct from 0.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ModelSignal {
    pub name: String,
    pub values: BTreeMap<NaiveDate, bool>,
}

impl ModelSignal {
    pub fn new(name: impl Into<String>) -> Self {
        ModelSignal {
            name: name.into(),
            values: BTreeMap::new(),
        }
    }

    pub fn with_values<I>(name: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = (NaiveDate, bool)>,
    {
        ModelSignal {
            name: name.into(),
            values: values.into_iter().collect(),
        }
    }

    pub fn get(&self, date: NaiveDate) -> Option<bool> {
        self.values.get(&date).copied()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Dense 0/1 buy signal keyed by date, the simulator's input.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct EnsembleSignal {
    pub values: BTreeMap<NaiveDate, bool>,
}

impl EnsembleSignal {
    pub fn from_values<I>(values: I) -> Self
    where
        I: IntoIterator<Item = (NaiveDate, bool)>,
    {
        EnsembleSignal {
            values: values.into_iter().collect(),
        }
    }

    pub fn get(&self, date: NaiveDate) -> Option<bool> {
        self.values.get(&date).copied()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn buy_count(&self) -> usize {
        self.values.values().filter(|&&v| v).count()
    }

    /// Keep only dates present in `series`. Returns the aligned signal and
    /// the number of dates that were dropped.
    pub fn align_to(&self, series: &PriceSeries) -> (EnsembleSignal, usize) {
        let aligned: BTreeMap<NaiveDate, bool> = self
            .values
            .iter()
            .filter(|(date, _)| series.contains(**date))
            .map(|(&d, &v)| (d, v))
            .collect();
        let dropped = self.values.len() - aligned.len();
        (EnsembleSignal { values: aligned }, dropped)
    }
}
