//! Payload parsers for the two endpoints.
//!
//! Symbol list: a top-level array of `{"id": int, "symbol": string, "name": string}`.
//! Every entry is checked field by field; the first bad entry fails the whole
//! payload with its index, so a caller never sees a partially decoded list.
//!
//! Quote: a single object with six required numeric fields, decoded through
//! serde. A missing or non-numeric field is a `ParseError::Json`.

use serde_json::{Map, Value};

use crate::error::{MarketError, ParseError};
use crate::types::{Quote, Symbol};

pub fn parse_symbols(payload: &[u8]) -> Result<Vec<Symbol>, MarketError> {
    let root: Value = serde_json::from_slice(payload).map_err(ParseError::Json)?;
    let entries = root.as_array().ok_or(ParseError::NotAnArray)?;

    if entries.is_empty() {
        return Err(ParseError::EmptyList.into());
    }

    let mut symbols = Vec::new();
    symbols.try_reserve_exact(entries.len())?;

    for (index, entry) in entries.iter().enumerate() {
        symbols.push(symbol_from_entry(index, entry)?);
    }

    Ok(symbols)
}

pub fn parse_quote(payload: &[u8]) -> Result<Quote, ParseError> {
    Ok(serde_json::from_slice(payload)?)
}

fn symbol_from_entry(index: usize, entry: &Value) -> Result<Symbol, ParseError> {
    let obj = entry.as_object().ok_or(ParseError::NotAnObject { index })?;

    let id = required(obj, index, "id")?
        .as_u64()
        .and_then(|v| u32::try_from(v).ok())
        .ok_or(ParseError::InvalidField {
            index,
            field: "id",
            expected: "an unsigned 32-bit integer",
        })?;
    let ticker = required_str(obj, index, "symbol")?;
    let name = required_str(obj, index, "name")?;

    Ok(Symbol::new(id, ticker, name))
}

fn required<'a>(
    obj: &'a Map<String, Value>,
    index: usize,
    field: &'static str,
) -> Result<&'a Value, ParseError> {
    obj.get(field)
        .ok_or(ParseError::MissingField { index, field })
}

fn required_str<'a>(
    obj: &'a Map<String, Value>,
    index: usize,
    field: &'static str,
) -> Result<&'a str, ParseError> {
    required(obj, index, field)?
        .as_str()
        .ok_or(ParseError::InvalidField {
            index,
            field,
            expected: "a string",
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_single_symbol() {
        let symbols = parse_symbols(br#"[{"id":1,"symbol":"AAPL","name":"Apple"}]"#).unwrap();
        assert_eq!(symbols, vec![Symbol::new(1, "AAPL", "Apple")]);
    }

    #[test]
    fn keeps_payload_order() {
        let payload = br#"[
            {"id":3,"symbol":"TSLA","name":"Tesla"},
            {"id":1,"symbol":"AAPL","name":"Apple"},
            {"id":2,"symbol":"MSFT","name":"Microsoft"}
        ]"#;
        let tickers: Vec<String> = parse_symbols(payload)
            .unwrap()
            .iter()
            .map(|s| s.ticker().to_string())
            .collect();
        assert_eq!(tickers, ["TSLA", "AAPL", "MSFT"]);
    }

    #[test]
    fn ignores_unknown_fields() {
        let symbols =
            parse_symbols(br#"[{"id":1,"symbol":"AAPL","name":"Apple","exchange":"NASDAQ"}]"#)
                .unwrap();
        assert_eq!(symbols.len(), 1);
    }

    #[test]
    fn missing_field_names_the_entry() {
        let err = parse_symbols(
            br#"[{"id":1,"symbol":"AAPL","name":"Apple"},{"id":2,"name":"Microsoft"}]"#,
        )
        .unwrap_err();
        assert!(matches!(
            err,
            MarketError::Parse(ParseError::MissingField {
                index: 1,
                field: "symbol"
            })
        ));
    }

    #[test]
    fn wrong_types_are_rejected() {
        let err = parse_symbols(br#"[{"id":"1","symbol":"AAPL","name":"Apple"}]"#).unwrap_err();
        assert!(matches!(
            err,
            MarketError::Parse(ParseError::InvalidField { field: "id", .. })
        ));

        let err = parse_symbols(br#"[{"id":1,"symbol":42,"name":"Apple"}]"#).unwrap_err();
        assert!(matches!(
            err,
            MarketError::Parse(ParseError::InvalidField {
                field: "symbol",
                ..
            })
        ));

        let err = parse_symbols(br#"[{"id":-4,"symbol":"AAPL","name":"Apple"}]"#).unwrap_err();
        assert!(matches!(
            err,
            MarketError::Parse(ParseError::InvalidField { field: "id", .. })
        ));
    }

    #[test]
    fn non_array_and_non_object_entries_are_rejected() {
        assert!(matches!(
            parse_symbols(br#"{"id":1}"#),
            Err(MarketError::Parse(ParseError::NotAnArray))
        ));
        assert!(matches!(
            parse_symbols(br#"[1]"#),
            Err(MarketError::Parse(ParseError::NotAnObject { index: 0 }))
        ));
        assert!(matches!(
            parse_symbols(b"[]"),
            Err(MarketError::Parse(ParseError::EmptyList))
        ));
        assert!(matches!(
            parse_symbols(b"[{\"id\":1,"),
            Err(MarketError::Parse(ParseError::Json(_)))
        ));
    }

    #[test]
    fn parses_quote() {
        let quote = parse_quote(
            br#"{"c":150.0,"h":151.0,"l":149.0,"o":149.5,"pc":148.0,"t":1690000000}"#,
        )
        .unwrap();
        assert_eq!(
            quote,
            Quote {
                current: 150.0,
                high: 151.0,
                low: 149.0,
                open: 149.5,
                previous_close: 148.0,
                timestamp: 1_690_000_000,
            }
        );
    }

    #[test]
    fn quote_accepts_integer_prices_and_extra_fields() {
        let quote =
            parse_quote(br#"{"c":150,"d":2,"dp":1.3,"h":151,"l":149,"o":149,"pc":148,"t":1}"#)
                .unwrap();
        assert_eq!(quote.current, 150.0);
    }

    #[test]
    fn quote_missing_field_is_an_error() {
        let err = parse_quote(br#"{"c":150.0,"h":151.0,"l":149.0,"o":149.5,"t":1}"#).unwrap_err();
        assert!(matches!(err, ParseError::Json(_)));
        assert!(err.to_string().contains("pc"));
    }

    #[test]
    fn quote_null_field_is_an_error() {
        let err = parse_quote(br#"{"c":null,"h":1,"l":1,"o":1,"pc":1,"t":1}"#).unwrap_err();
        assert!(matches!(err, ParseError::Json(_)));
    }
}
