use std::str::FromStr;
use std::time::Duration;

use adapters::RedirectPolicy;
use scheduler::{Credential, PollerConfig};

use crate::error::ConfigError;

#[derive(Clone, Debug)]
pub struct AppConfig {
    // =========================
    // Symbol list endpoint
    // =========================
    /// Host of the symbol-list service. Plain HTTP.
    pub symbols_host: String,

    pub symbols_port: u16,

    /// Path of the symbol-list resource, including the leading slash.
    pub symbols_path: String,

    // =========================
    // Quote endpoint
    // =========================
    /// Scheme and host of the quote service; `/api/v1/quote` is appended.
    pub quote_base_url: String,

    /// Access token sent as the `token` query parameter.
    ///
    /// Required. There is no default and it is never logged.
    pub quote_token: Credential,

    // =========================
    // Timing
    // =========================
    /// Quote loop tick.
    pub quote_poll_interval: Duration,

    /// Symbol loop delay after a failed refresh.
    ///
    /// Until the first refresh succeeds this is how often the symbol list
    /// is re-requested.
    pub symbol_retry_interval: Duration,

    /// Symbol loop delay after a successful refresh.
    pub symbol_resync_interval: Duration,

    /// Bounded wait for the shared lock.
    ///
    /// A loop that cannot get the lock within this window skips its
    /// iteration and tries again on its next tick.
    pub lock_timeout: Duration,

    /// Upper bound for one request/response cycle.
    pub request_timeout: Duration,

    // =========================
    // Transport
    // =========================
    /// Size of the shared response buffer in bytes. Larger bodies are
    /// rejected as overflows.
    pub response_buffer_capacity: usize,

    /// Follow 3xx responses. Off by default.
    pub follow_redirects: bool,

    /// `APP_ENV=production` switches logs to JSON.
    pub production: bool,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from any key/value source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let text = |key: &'static str, default: &str| {
            lookup(key)
                .filter(|v| !v.trim().is_empty())
                .unwrap_or_else(|| default.to_string())
        };

        let quote_token = lookup("QUOTE_TOKEN")
            .filter(|v| !v.trim().is_empty())
            .ok_or(ConfigError::Missing("QUOTE_TOKEN"))?;

        Ok(Self {
            symbols_host: text("SYMBOLS_HOST", "192.168.1.77"),
            symbols_port: parse(&lookup, "SYMBOLS_PORT", "port number", 8000)?,
            symbols_path: text("SYMBOLS_PATH", "/symbols"),

            quote_base_url: text("QUOTE_BASE_URL", "https://finnhub.io")
                .trim_end_matches('/')
                .to_string(),
            quote_token: Credential::new(quote_token),

            quote_poll_interval: millis(&lookup, "QUOTE_POLL_INTERVAL_MS", 1000)?,
            symbol_retry_interval: millis(&lookup, "SYMBOL_RETRY_INTERVAL_MS", 1000)?,
            symbol_resync_interval: Duration::from_secs(parse(
                &lookup,
                "SYMBOL_RESYNC_INTERVAL_SECS",
                "number of seconds",
                86_400,
            )?),
            lock_timeout: millis(&lookup, "LOCK_TIMEOUT_MS", 1000)?,
            request_timeout: millis(&lookup, "REQUEST_TIMEOUT_MS", 5000)?,

            response_buffer_capacity: parse(
                &lookup,
                "RESPONSE_BUFFER_CAPACITY",
                "byte count",
                2048,
            )?,
            follow_redirects: flag(&lookup, "FOLLOW_REDIRECTS", false)?,

            production: lookup("APP_ENV").as_deref() == Some("production"),
        })
    }

    /// `http://{host}:{port}{path}`
    pub fn symbols_url(&self) -> String {
        format!(
            "http://{}:{}{}",
            self.symbols_host, self.symbols_port, self.symbols_path
        )
    }

    pub fn quote_url(&self) -> String {
        format!("{}/api/v1/quote", self.quote_base_url)
    }

    pub fn redirect_policy(&self) -> RedirectPolicy {
        if self.follow_redirects {
            RedirectPolicy::following()
        } else {
            RedirectPolicy::default()
        }
    }

    pub fn poller_config(&self) -> PollerConfig {
        let mut cfg = PollerConfig::new(
            self.symbols_url(),
            self.quote_url(),
            self.quote_token.clone(),
        );
        cfg.lock_timeout = self.lock_timeout;
        cfg.request_timeout = self.request_timeout;
        cfg.quote_interval = self.quote_poll_interval;
        cfg.symbol_retry_interval = self.symbol_retry_interval;
        cfg.symbol_resync_interval = self.symbol_resync_interval;
        cfg.buffer_capacity = self.response_buffer_capacity;
        cfg
    }
}

fn parse<T: FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    var: &'static str,
    expected: &'static str,
    default: T,
) -> Result<T, ConfigError> {
    match lookup(var) {
        None => Ok(default),
        Some(v) if v.trim().is_empty() => Ok(default),
        Some(v) => v.trim().parse().map_err(|_| ConfigError::Invalid {
            var,
            expected,
            value: v,
        }),
    }
}

fn millis(
    lookup: &impl Fn(&str) -> Option<String>,
    var: &'static str,
    default: u64,
) -> Result<Duration, ConfigError> {
    let ms: u64 = parse(lookup, var, "number of milliseconds", default)?;
    if ms == 0 {
        return Err(ConfigError::Invalid {
            var,
            expected: "non-zero number of milliseconds",
            value: ms.to_string(),
        });
    }
    Ok(Duration::from_millis(ms))
}

fn flag(
    lookup: &impl Fn(&str) -> Option<String>,
    var: &'static str,
    default: bool,
) -> Result<bool, ConfigError> {
    match lookup(var).as_deref().map(str::trim) {
        None | Some("") => Ok(default),
        Some("1" | "true" | "yes") => Ok(true),
        Some("0" | "false" | "no") => Ok(false),
        Some(other) => Err(ConfigError::Invalid {
            var,
            expected: "boolean",
            value: other.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_need_only_a_token() {
        let cfg = AppConfig::from_lookup(lookup(&[("QUOTE_TOKEN", "abc")])).unwrap();

        assert_eq!(cfg.symbols_url(), "http://192.168.1.77:8000/symbols");
        assert_eq!(cfg.quote_url(), "https://finnhub.io/api/v1/quote");
        assert_eq!(cfg.quote_token.expose(), "abc");
        assert_eq!(cfg.quote_poll_interval, Duration::from_secs(1));
        assert_eq!(cfg.symbol_retry_interval, Duration::from_secs(1));
        assert_eq!(cfg.symbol_resync_interval, Duration::from_secs(86_400));
        assert_eq!(cfg.lock_timeout, Duration::from_secs(1));
        assert_eq!(cfg.request_timeout, Duration::from_secs(5));
        assert_eq!(cfg.response_buffer_capacity, 2048);
        assert!(!cfg.follow_redirects);
        assert!(!cfg.production);
    }

    #[test]
    fn missing_token_is_an_error() {
        let err = AppConfig::from_lookup(lookup(&[])).unwrap_err();
        assert_eq!(err, ConfigError::Missing("QUOTE_TOKEN"));

        let err = AppConfig::from_lookup(lookup(&[("QUOTE_TOKEN", "  ")])).unwrap_err();
        assert_eq!(err, ConfigError::Missing("QUOTE_TOKEN"));
    }

    #[test]
    fn overrides_are_applied() {
        let cfg = AppConfig::from_lookup(lookup(&[
            ("QUOTE_TOKEN", "abc"),
            ("SYMBOLS_HOST", "localhost"),
            ("SYMBOLS_PORT", "9000"),
            ("SYMBOLS_PATH", "/v2/symbols"),
            ("QUOTE_BASE_URL", "http://127.0.0.1:7000/"),
            ("QUOTE_POLL_INTERVAL_MS", "250"),
            ("SYMBOL_RESYNC_INTERVAL_SECS", "60"),
            ("RESPONSE_BUFFER_CAPACITY", "4096"),
            ("FOLLOW_REDIRECTS", "true"),
            ("APP_ENV", "production"),
        ]))
        .unwrap();

        assert_eq!(cfg.symbols_url(), "http://localhost:9000/v2/symbols");
        assert_eq!(cfg.quote_url(), "http://127.0.0.1:7000/api/v1/quote");
        assert!(cfg.redirect_policy().follow);
        assert!(cfg.production);

        let poller = cfg.poller_config();
        assert_eq!(poller.quote_interval, Duration::from_millis(250));
        assert_eq!(poller.symbol_resync_interval, Duration::from_secs(60));
        assert_eq!(poller.buffer_capacity, 4096);
        assert_eq!(poller.symbols_url, "http://localhost:9000/v2/symbols");
    }

    #[test]
    fn invalid_numbers_name_the_variable() {
        let err = AppConfig::from_lookup(lookup(&[
            ("QUOTE_TOKEN", "abc"),
            ("SYMBOLS_PORT", "eighty"),
        ]))
        .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { var: "SYMBOLS_PORT", .. }));
        assert!(err.to_string().contains("SYMBOLS_PORT"));

        let err = AppConfig::from_lookup(lookup(&[
            ("QUOTE_TOKEN", "abc"),
            ("LOCK_TIMEOUT_MS", "0"),
        ]))
        .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { var: "LOCK_TIMEOUT_MS", .. }));

        let err = AppConfig::from_lookup(lookup(&[
            ("QUOTE_TOKEN", "abc"),
            ("FOLLOW_REDIRECTS", "maybe"),
        ]))
        .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { var: "FOLLOW_REDIRECTS", .. }));
    }

    #[test]
    fn token_is_not_printed() {
        let cfg = AppConfig::from_lookup(lookup(&[("QUOTE_TOKEN", "very-secret")])).unwrap();
        assert!(!format!("{cfg:?}").contains("very-secret"));
        assert!(!format!("{:?}", cfg.poller_config()).contains("very-secret"));
    }
}
