use std::sync::Arc;

use tracing::{debug, info, instrument, warn};

use crate::error::{MarketError, ParseError};
use crate::types::Symbol;

/// Current symbol list plus readiness flag.
///
/// Guarantees:
/// - `is_ready()` implies the table is non-empty and every symbol has a
///   non-empty ticker and display name.
/// - The list is only ever replaced wholesale by `install`; a rejected
///   refresh leaves the previous list and readiness untouched.
/// - `snapshot()` hands out an `Arc<[Symbol]>`, so a reader iterating a
///   snapshot never observes a later replacement.
///
/// Not synchronized on its own: callers share it behind a lock.
#[derive(Debug)]
pub struct SymbolTable {
    symbols: Arc<[Symbol]>,
    ready: bool,
    /// Bumped on every successful install.
    generation: u64,
    /// Refresh attempts since the last successful install.
    pending_attempts: u32,
}

impl Default for SymbolTable {
    fn default() -> Self {
        Self::new()
    }
}

impl SymbolTable {
    pub fn new() -> Self {
        Self {
            symbols: Arc::from(Vec::new()),
            ready: false,
            generation: 0,
            pending_attempts: 0,
        }
    }

    /// Mark the start of a refresh cycle. Returns the attempt number since
    /// the last successful install (1-based).
    pub fn begin_refresh(&mut self) -> u32 {
        self.pending_attempts = self.pending_attempts.saturating_add(1);
        debug!(
            attempt = self.pending_attempts,
            generation = self.generation,
            ready = self.ready,
            "symbol refresh started"
        );
        self.pending_attempts
    }

    /// Validate and swap in `new_symbols`, then flip readiness.
    ///
    /// Fails without touching the table if the list is empty or any symbol
    /// has an empty ticker or display name.
    #[instrument(skip(self, new_symbols), fields(count = new_symbols.len()), target = "symbol_table")]
    pub fn install(&mut self, new_symbols: Vec<Symbol>) -> Result<u64, MarketError> {
        if let Err(e) = validate(&new_symbols) {
            warn!(error = %e, "symbol refresh rejected; keeping previous table");
            return Err(e.into());
        }

        self.symbols = Arc::from(new_symbols);
        self.generation += 1;
        self.pending_attempts = 0;
        self.ready = true;

        info!(
            generation = self.generation,
            count = self.symbols.len(),
            "symbol table installed"
        );

        Ok(self.generation)
    }

    pub fn is_ready(&self) -> bool {
        self.ready
    }

    /// Cheap owned view of the current list; stays valid after the lock is released.
    pub fn snapshot(&self) -> Arc<[Symbol]> {
        Arc::clone(&self.symbols)
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn pending_attempts(&self) -> u32 {
        self.pending_attempts
    }
}

fn validate(symbols: &[Symbol]) -> Result<(), ParseError> {
    if symbols.is_empty() {
        return Err(ParseError::EmptyList);
    }

    for (index, s) in symbols.iter().enumerate() {
        if s.ticker().trim().is_empty() {
            return Err(ParseError::EmptyField {
                index,
                field: "symbol",
            });
        }
        if s.display_name().trim().is_empty() {
            return Err(ParseError::EmptyField {
                index,
                field: "name",
            });
        }
    }

    Ok(())
}
