//! Model signal access port.

use crate::domain::error::VoteTraderError;
use crate::domain::signal::ModelSignal;

pub trait SignalPort {
    fn fetch_signal(&self, symbol: &str, model: &str) -> Result<ModelSignal, VoteTraderError>;
}
