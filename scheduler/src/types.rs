//! Configuration shared by both loops.

use std::fmt;
use std::time::Duration;

/// Quote endpoint token. Never printed: `Debug` and `Display` are redacted.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential(String);

impl Credential {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Credential(***)")
    }
}

impl fmt::Display for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("***")
    }
}

/// Endpoints, intervals and limits for the dual poller.
#[derive(Clone, Debug)]
pub struct PollerConfig {
    /// Full URL of the symbol-list endpoint, e.g. `http://192.168.1.77:8000/symbols`.
    pub symbols_url: String,

    /// Full URL of the quote endpoint, e.g. `https://finnhub.io/api/v1/quote`.
    pub quote_url: String,

    pub quote_token: Credential,

    /// Bounded wait for the shared lock. Timing out skips the iteration.
    pub lock_timeout: Duration,

    /// Upper bound for one request/response cycle, on top of whatever the
    /// transport enforces itself.
    pub request_timeout: Duration,

    /// Quote loop tick. Values below 1ms are raised to 1ms.
    pub quote_interval: Duration,

    /// Symbol loop delay after a failed refresh.
    pub symbol_retry_interval: Duration,

    /// Symbol loop delay after a successful refresh.
    pub symbol_resync_interval: Duration,

    /// Capacity of the shared accumulation buffer, in bytes.
    pub buffer_capacity: usize,
}

impl PollerConfig {
    /// Config with the stock timings: 1s lock wait, 5s request timeout,
    /// 1s quote tick, 1s symbol retry, 24h symbol resync, 2 KiB buffer.
    pub fn new(
        symbols_url: impl Into<String>,
        quote_url: impl Into<String>,
        quote_token: Credential,
    ) -> Self {
        Self {
            symbols_url: symbols_url.into(),
            quote_url: quote_url.into(),
            quote_token,
            lock_timeout: Duration::from_millis(1000),
            request_timeout: Duration::from_millis(5000),
            quote_interval: Duration::from_millis(1000),
            symbol_retry_interval: Duration::from_millis(1000),
            symbol_resync_interval: Duration::from_secs(24 * 60 * 60),
            buffer_capacity: 2048,
        }
    }
}
