use chrono::{DateTime, Utc};
use serde::Deserialize;

/// Tradable instrument as served by the symbol-list endpoint.
/// Fields are private: a `Symbol` never changes after construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Symbol {
    id: u32,
    ticker: String,
    display_name: String,
}

impl Symbol {
    pub fn new(id: u32, ticker: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self {
            id,
            ticker: ticker.into(),
            display_name: display_name.into(),
        }
    }

    pub fn id(&self) -> u32 {
        self.id
    }

    pub fn ticker(&self) -> &str {
        &self.ticker
    }

    pub fn display_name(&self) -> &str {
        &self.display_name
    }
}

/// Typed representation of the quote endpoint body
/// `{"c":..,"h":..,"l":..,"o":..,"pc":..,"t":..}`.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct Quote {
    #[serde(rename = "c")]
    pub current: f64,
    #[serde(rename = "h")]
    pub high: f64,
    #[serde(rename = "l")]
    pub low: f64,
    #[serde(rename = "o")]
    pub open: f64,
    #[serde(rename = "pc")]
    pub previous_close: f64,
    /// Unix seconds.
    #[serde(rename = "t")]
    pub timestamp: i64,
}

impl Quote {
    /// `timestamp` as a UTC instant, if it is in chrono's range.
    pub fn observed_at(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.timestamp, 0)
    }
}
