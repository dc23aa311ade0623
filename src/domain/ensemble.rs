//! Majority-vote ensembling of model signals.

use crate::domain::error::VoteTraderError;
use crate::domain::signal::{EnsembleSignal, ModelSignal};
use chrono::NaiveDate;
use std::collections::BTreeSet;

/// Smallest vote count that is a strict majority of `models`.
pub fn majority_quorum(models: usize) -> usize {
    models / 2 + 1
}

/// Combine model signals into one buy signal.
///
/// The output covers the union of all input dates. On each date a model
/// without a prediction votes 0; the ensemble is 1 when at least `quorum`
/// models vote 1. No calendar alignment happens here; callers intersect
/// with the price series via [`EnsembleSignal::align_to`].
pub fn combine(signals: &[ModelSignal], quorum: usize) -> Result<EnsembleSignal, VoteTraderError> {
    if signals.is_empty() {
        return Ok(EnsembleSignal::default());
    }
    if quorum == 0 || quorum > signals.len() {
        return Err(VoteTraderError::invalid_parameter(
            "quorum",
            format!("must be between 1 and {}", signals.len()),
        ));
    }

    let dates: BTreeSet<NaiveDate> = signals
        .iter()
        .flat_map(|s| s.values.keys().copied())
        .collect();

    let values = dates.into_iter().map(|date| {
        let votes = signals
            .iter()
            .filter(|s| s.get(date).unwrap_or(false))
            .count();
        (date, votes >= quorum)
    });

    Ok(EnsembleSignal::from_values(values))
}
