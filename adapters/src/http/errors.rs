use thiserror::Error;

/// Failures of the streaming response accumulator.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AccumulatorError {
    /// Appending the chunk would write past the end of the buffer.
    /// Nothing is written when this is returned.
    #[error("response buffer overflow: {attempted} bytes do not fit in {capacity}")]
    Overflow { capacity: usize, attempted: usize },

    /// A data/finish event arrived without a preceding begin.
    #[error("accumulator is not accumulating (state: {0})")]
    NotAccumulating(&'static str),

    /// The payload was requested before the transport signalled completion.
    #[error("response is not complete (state: {0})")]
    Incomplete(&'static str),
}

#[derive(Error, Debug)]
pub enum TransportError {
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("request timed out")]
    Timeout,

    #[error("unexpected status code {0}")]
    Status(u16),

    #[error("redirect limit of {0} exceeded")]
    TooManyRedirects(usize),

    #[error("redirect response without a usable Location header")]
    MissingRedirectLocation,

    /// The event sink refused an event; the request was aborted.
    #[error("response sink rejected event: {0}")]
    Sink(#[from] AccumulatorError),
}

impl TransportError {
    /// Classify a reqwest failure, keeping timeouts distinct.
    ///
    /// The url is stripped: quote urls carry the access token in their query.
    pub fn from_reqwest(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            TransportError::Timeout
        } else {
            TransportError::Http(err.without_url())
        }
    }
}
