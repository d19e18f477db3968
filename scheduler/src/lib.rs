//! Dual poller.
//!
//! Two periodic loops share one `PollerContext`:
//!   • `symbol_loop`: fetches the symbol list until it succeeds, then resyncs rarely
//!   • `quote_loop`: every tick, requests one quote per symbol of the current table
//!
//! Both go through the same bounded-wait lock, which guards the symbol table
//! and the response buffer as a single critical section. At most one
//! request/accumulate cycle is in flight system-wide.

pub mod context;
pub mod error;
pub mod quote_loop;
pub mod symbol_loop;
pub mod types;

pub use context::{PollerContext, SharedState};
pub use error::PollError;
pub use quote_loop::{PassReport, QuoteOutcome, poll_quotes, run_quote_poll_loop};
pub use symbol_loop::{SymbolFetchState, refresh_symbols, run_symbol_fetch_loop};
pub use types::{Credential, PollerConfig};
