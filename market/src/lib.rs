//! Market data model for the symbol/quote poller.
//!
//! - `types`: `Symbol` and `Quote`
//! - `parser`: JSON payloads → typed values, rejecting malformed records
//! - `store`: `SymbolTable`, the wholesale-replaced symbol list + readiness flag
//! - `error`: `ParseError` / `MarketError`

pub mod error;
pub mod parser;
pub mod store;
pub mod types;

pub use error::{MarketError, ParseError};
pub use parser::{parse_quote, parse_symbols};
pub use store::SymbolTable;
pub use types::{Quote, Symbol};
