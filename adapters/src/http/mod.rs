//! HTTP transport collaborator.
//!
//! A `Transport` performs one request and reports its progress as an ordered
//! stream of `TransportEvent`s pushed into an `EventSink`:
//!
//! ```text
//! Connected → HeaderSent → Header* → (Redirect → Connected → ...)* → Data* → Finish
//! ```
//!
//! On failure the sink sees a single `Error` event instead of `Finish`, and
//! `perform` returns the error. The sink may reject an event (e.g. the
//! accumulation buffer is full), which aborts the request.

pub mod accumulator;
pub mod errors;
pub mod reqwest_transport;

use std::fmt;

use async_trait::async_trait;

pub use accumulator::{AccumulatorState, ResponseAccumulator};
pub use errors::{AccumulatorError, TransportError};
pub use reqwest_transport::ReqwestTransport;

/// Progress notification for one in-flight request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportEvent<'a> {
    Connected,
    HeaderSent,
    Header { key: &'a str, value: &'a str },
    Data(&'a [u8]),
    Finish,
    Redirect { location: &'a str },
    Error,
}

/// Receiver of transport events. Invoked from whichever task drives the
/// transport, so implementations own their buffers for the whole request.
pub trait EventSink: Send {
    fn on_event(&mut self, event: TransportEvent<'_>) -> Result<(), AccumulatorError>;
}

/// Query parameters whose values never appear in `Debug` output.
const REDACTED_QUERY_KEYS: &[&str] = &["token"];

/// A GET request: base url, query parameters and extra headers.
///
/// `Debug` masks the values of credential-bearing query parameters.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct HttpRequest {
    pub url: String,
    pub query: Vec<(String, String)>,
    pub headers: Vec<(String, String)>,
}

impl HttpRequest {
    pub fn get(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Self::default()
        }
    }

    pub fn with_query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((key.into(), value.into()));
        self
    }

    pub fn with_header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((key.into(), value.into()));
        self
    }

    /// Value of the first query parameter named `key`.
    pub fn query_value(&self, key: &str) -> Option<&str> {
        self.query
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }
}

impl fmt::Debug for HttpRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let query: Vec<(&str, &str)> = self
            .query
            .iter()
            .map(|(k, v)| {
                if REDACTED_QUERY_KEYS.contains(&k.as_str()) {
                    (k.as_str(), "***")
                } else {
                    (k.as_str(), v.as_str())
                }
            })
            .collect();

        f.debug_struct("HttpRequest")
            .field("url", &self.url)
            .field("query", &query)
            .field("headers", &self.headers)
            .finish()
    }
}

/// Summary of a completed request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResponseMeta {
    pub status: u16,
    pub content_length: Option<u64>,
    pub bytes_delivered: usize,
}

/// Redirect handling. Disabled by default; when enabled every hop carries
/// the `From` and `Accept` headers below.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RedirectPolicy {
    pub follow: bool,
    pub max_hops: usize,
    pub from: String,
    pub accept: String,
}

impl Default for RedirectPolicy {
    fn default() -> Self {
        Self {
            follow: false,
            max_hops: 5,
            from: "user@example.com".to_string(),
            accept: "text/html".to_string(),
        }
    }
}

impl RedirectPolicy {
    pub fn following() -> Self {
        Self {
            follow: true,
            ..Self::default()
        }
    }

    /// Headers injected into a redirected request.
    pub fn injected_headers(&self) -> [(&str, &str); 2] {
        [("From", self.from.as_str()), ("Accept", self.accept.as_str())]
    }
}

#[async_trait]
pub trait Transport: Send + Sync {
    async fn perform(
        &self,
        request: &HttpRequest,
        sink: &mut dyn EventSink,
    ) -> Result<ResponseMeta, TransportError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_builder_collects_query_and_headers() {
        let req = HttpRequest::get("https://finnhub.io/api/v1/quote")
            .with_query("symbol", "AAPL")
            .with_query("token", "secret")
            .with_header("Accept", "application/json");

        assert_eq!(req.query_value("symbol"), Some("AAPL"));
        assert_eq!(req.query_value("token"), Some("secret"));
        assert_eq!(req.query_value("missing"), None);
        assert_eq!(req.headers.len(), 1);
    }

    #[test]
    fn debug_output_masks_the_token() {
        let req = HttpRequest::get("https://finnhub.io/api/v1/quote")
            .with_query("symbol", "AAPL")
            .with_query("token", "s3cret-token");

        let printed = format!("{req:?}");
        assert!(!printed.contains("s3cret-token"));
        assert!(printed.contains("\"AAPL\""));
        assert!(printed.contains("\"***\""));
        assert_eq!(req.query_value("token"), Some("s3cret-token"));
    }

    #[test]
    fn redirect_policy_defaults_to_disabled() {
        let policy = RedirectPolicy::default();
        assert!(!policy.follow);
        assert_eq!(
            policy.injected_headers(),
            [("From", "user@example.com"), ("Accept", "text/html")]
        );
        assert!(RedirectPolicy::following().follow);
    }
}
