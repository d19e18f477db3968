//! Symbol fetch loop.
//!
//! ```text
//! NOT_READY ──refresh ok──▶ READY
//!     ▲  │                    │
//!     └──┘ retry interval     └── resync interval, then refresh again
//! ```
//!
//! A failed resync keeps the installed table (and readiness) and falls back
//! to the retry interval until a refresh succeeds again.

use std::sync::Arc;
use std::time::Duration;

use common::{TraceId, root_span};
use market::parse_symbols;
use tokio::time::sleep;
use tracing::{Instrument, debug, error, info, warn};

use crate::context::{PollerContext, SharedState};
use crate::error::PollError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SymbolFetchState {
    NotReady,
    Ready,
}

impl SymbolFetchState {
    /// Delay before the next refresh, given whether the last one succeeded.
    pub fn next_delay(self, last_ok: bool, ctx: &PollerContext) -> Duration {
        let cfg = ctx.config();
        match (self, last_ok) {
            (SymbolFetchState::Ready, true) => cfg.symbol_resync_interval,
            _ => cfg.symbol_retry_interval,
        }
    }
}

/// One refresh cycle: lock, request, parse, install, unlock.
///
/// Returns the number of installed symbols. On any error the previously
/// installed table is left exactly as it was.
pub async fn refresh_symbols(ctx: &PollerContext) -> Result<usize, PollError> {
    let trace_id = TraceId::new();

    async move {
        let mut guard = ctx.acquire().await?;
        let SharedState { table, buffer } = &mut *guard;

        let attempt = table.begin_refresh();
        debug!(attempt, "requesting symbol list");

        let request = ctx.symbols_request();
        let payload = ctx.fetch(&request, buffer).await?;

        let symbols = parse_symbols(payload)?;
        table.install(symbols)?;

        Ok(table.len())
    }
    .instrument(root_span("symbol_refresh", &trace_id))
    .await
}

/// Runs the symbol fetch loop forever.
pub async fn run_symbol_fetch_loop(ctx: Arc<PollerContext>) {
    let mut state = SymbolFetchState::NotReady;

    info!(
        url = %ctx.config().symbols_url,
        retry_ms = ctx.config().symbol_retry_interval.as_millis() as u64,
        resync_secs = ctx.config().symbol_resync_interval.as_secs(),
        "symbol fetch loop started"
    );

    loop {
        let last_ok = match refresh_symbols(&ctx).await {
            Ok(count) => {
                if state == SymbolFetchState::NotReady {
                    info!(count, "symbols ready");
                } else {
                    info!(count, "symbols resynced");
                }
                state = SymbolFetchState::Ready;
                true
            }
            Err(e) if e.is_lock_timeout() => {
                info!("Not ready to send http requests");
                false
            }
            Err(e) => {
                match state {
                    SymbolFetchState::NotReady => error!(error = %e, "symbol refresh failed"),
                    SymbolFetchState::Ready => {
                        warn!(error = %e, "symbol resync failed; keeping current table")
                    }
                }
                false
            }
        };

        sleep(state.next_delay(last_ok, &ctx)).await;
    }
}
