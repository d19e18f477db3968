use std::collections::TryReserveError;
use std::time::Duration;

use adapters::{AccumulatorError, TransportError};
use market::{MarketError, ParseError};
use thiserror::Error;

/// Everything a refresh or quote cycle can fail with. All of these are
/// handled by the loop that hit them; none stops a loop.
#[derive(Error, Debug)]
pub enum PollError {
    #[error("shared lock not acquired within {0:?}")]
    LockTimeout(Duration),

    #[error("transport error: {0}")]
    Transport(TransportError),

    #[error("parse error: {0}")]
    Parse(#[from] ParseError),

    #[error("response buffer overflow: {attempted} bytes do not fit in {capacity}")]
    BufferOverflow { capacity: usize, attempted: usize },

    #[error("allocation failed: {0}")]
    Allocation(TryReserveError),
}

impl From<AccumulatorError> for PollError {
    fn from(err: AccumulatorError) -> Self {
        match err {
            AccumulatorError::Overflow {
                capacity,
                attempted,
            } => PollError::BufferOverflow {
                capacity,
                attempted,
            },
            other => PollError::Transport(TransportError::Sink(other)),
        }
    }
}

impl From<TransportError> for PollError {
    fn from(err: TransportError) -> Self {
        match err {
            TransportError::Sink(inner) => inner.into(),
            other => PollError::Transport(other),
        }
    }
}

impl From<MarketError> for PollError {
    fn from(err: MarketError) -> Self {
        match err {
            MarketError::Parse(e) => PollError::Parse(e),
            MarketError::Allocation(e) => PollError::Allocation(e),
        }
    }
}

impl PollError {
    /// Failures that are expected under contention rather than faults.
    pub fn is_lock_timeout(&self) -> bool {
        matches!(self, PollError::LockTimeout(_))
    }
}
