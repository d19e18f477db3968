//! Streaming response accumulator.
//!
//! Concatenates the data chunks of one in-flight request into a single
//! fixed-capacity buffer. The buffer is allocated once and reused for every
//! request; only the write cursor is reset at request boundaries.
//!
//! State machine:
//!
//! ```text
//! Idle ──begin──▶ Accumulating ──finish──▶ Complete
//!                     │  │
//!                     │  └──chunk past capacity──▶ Overflow
//!                     └──transport error──▶ Errored
//! ```
//!
//! Any state returns to `Accumulating` on `begin`.

use tracing::{debug, warn};

use super::{AccumulatorError, EventSink, TransportEvent};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccumulatorState {
    Idle,
    Accumulating,
    Complete,
    /// A chunk was refused; `attempted` is the size the buffer would have needed.
    Overflow { attempted: usize },
    Errored,
}

impl AccumulatorState {
    pub fn as_str(&self) -> &'static str {
        match self {
            AccumulatorState::Idle => "idle",
            AccumulatorState::Accumulating => "accumulating",
            AccumulatorState::Complete => "complete",
            AccumulatorState::Overflow { .. } => "overflow",
            AccumulatorState::Errored => "errored",
        }
    }
}

pub struct ResponseAccumulator {
    buf: Box<[u8]>,
    cursor: usize,
    state: AccumulatorState,
}

impl ResponseAccumulator {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buf: vec![0u8; capacity].into_boxed_slice(),
            cursor: 0,
            state: AccumulatorState::Idle,
        }
    }

    pub fn capacity(&self) -> usize {
        self.buf.len()
    }

    /// Bytes written in the current cycle.
    pub fn len(&self) -> usize {
        self.cursor
    }

    pub fn is_empty(&self) -> bool {
        self.cursor == 0
    }

    pub fn state(&self) -> AccumulatorState {
        self.state
    }

    /// Start a new cycle: clears what the previous cycle wrote and rewinds the cursor.
    pub fn on_begin(&mut self) {
        self.buf[..self.cursor].fill(0);
        self.cursor = 0;
        self.state = AccumulatorState::Accumulating;
    }

    /// Append `chunk` at the cursor. A chunk that does not fit is refused
    /// whole and the accumulator moves to `Overflow`.
    pub fn on_chunk(&mut self, chunk: &[u8]) -> Result<(), AccumulatorError> {
        if self.state != AccumulatorState::Accumulating {
            return Err(AccumulatorError::NotAccumulating(self.state.as_str()));
        }

        let capacity = self.capacity();
        let end = match self.cursor.checked_add(chunk.len()) {
            Some(end) if end <= capacity => end,
            _ => {
                let attempted = self.cursor.saturating_add(chunk.len());
                self.state = AccumulatorState::Overflow { attempted };
                warn!(capacity, attempted, "response does not fit in buffer");
                return Err(AccumulatorError::Overflow {
                    capacity,
                    attempted,
                });
            }
        };

        self.buf[self.cursor..end].copy_from_slice(chunk);
        self.cursor = end;
        Ok(())
    }

    /// Mark the cycle finished and return bytes `[0, cursor)`.
    /// Zero bytes written yields an empty payload. A second completion
    /// without a new `on_begin` is rejected.
    pub fn on_complete(&mut self) -> Result<&[u8], AccumulatorError> {
        match self.state {
            AccumulatorState::Accumulating => {
                self.state = AccumulatorState::Complete;
                Ok(&self.buf[..self.cursor])
            }
            AccumulatorState::Overflow { attempted } => Err(AccumulatorError::Overflow {
                capacity: self.capacity(),
                attempted,
            }),
            other => Err(AccumulatorError::NotAccumulating(other.as_str())),
        }
    }

    /// The transport reported a failure. An overflow is kept as the more
    /// specific cause.
    pub fn on_error(&mut self) {
        if !matches!(self.state, AccumulatorState::Overflow { .. }) {
            self.state = AccumulatorState::Errored;
        }
    }

    /// The finished payload. Only readable once the cycle is `Complete`.
    pub fn payload(&self) -> Result<&[u8], AccumulatorError> {
        match self.state {
            AccumulatorState::Complete => Ok(&self.buf[..self.cursor]),
            other => Err(AccumulatorError::Incomplete(other.as_str())),
        }
    }
}

impl EventSink for ResponseAccumulator {
    fn on_event(&mut self, event: TransportEvent<'_>) -> Result<(), AccumulatorError> {
        match event {
            TransportEvent::Connected => {
                debug!("HTTP_EVENT_ON_CONNECTED");
                self.on_begin();
                Ok(())
            }
            TransportEvent::HeaderSent => {
                debug!("HTTP_EVENT_HEADER_SENT");
                Ok(())
            }
            TransportEvent::Header { key, value } => {
                debug!(key, value, "HTTP_EVENT_ON_HEADER");
                Ok(())
            }
            TransportEvent::Data(chunk) => {
                debug!(len = chunk.len(), "HTTP_EVENT_ON_DATA");
                self.on_chunk(chunk)
            }
            TransportEvent::Finish => {
                debug!(len = self.cursor, "HTTP_EVENT_ON_FINISH");
                self.on_complete().map(|_| ())
            }
            TransportEvent::Redirect { location } => {
                // body of the 3xx is not part of the payload
                debug!(location, "HTTP_EVENT_REDIRECT");
                self.on_begin();
                Ok(())
            }
            TransportEvent::Error => {
                debug!("HTTP_EVENT_ERROR");
                self.on_error();
                Ok(())
            }
        }
    }
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(500))]
        #[test]
        fn accumulation_matches_concatenation_or_stops_at_overflow(
            capacity in 0usize..512,
            chunks in prop::collection::vec(prop::collection::vec(any::<u8>(), 0..64), 0..24)
        ) {
            let mut acc = ResponseAccumulator::with_capacity(capacity);
            acc.on_begin();

            let mut expected: Vec<u8> = Vec::new();
            let mut overflowed_at = None;

            for (i, chunk) in chunks.iter().enumerate() {
                match acc.on_chunk(chunk) {
                    Ok(()) => expected.extend_from_slice(chunk),
                    Err(AccumulatorError::Overflow { capacity: c, attempted }) => {
                        prop_assert_eq!(c, capacity);
                        prop_assert_eq!(attempted, expected.len() + chunk.len());
                        overflowed_at = Some(i);
                        break;
                    }
                    Err(other) => prop_assert!(false, "unexpected error {:?}", other),
                }
            }

            let total: usize = chunks.iter().map(Vec::len).sum();

            match overflowed_at {
                None => {
                    prop_assert!(total <= capacity);
                    prop_assert_eq!(acc.on_complete().unwrap(), expected.as_slice());
                }
                Some(i) => {
                    // the first chunk whose cumulative length passes capacity
                    let before: usize = chunks[..i].iter().map(Vec::len).sum();
                    prop_assert!(before <= capacity);
                    prop_assert!(before + chunks[i].len() > capacity);
                    prop_assert_eq!(acc.len(), before);
                    prop_assert_eq!(acc.capacity(), capacity);
                    prop_assert_eq!(&acc.buf[..before], expected.as_slice());
                }
            }
        }
    }
}
