//! Quote poll loop.
//!
//! Every tick: take the lock, and if the symbol table is ready, run one
//! quote cycle per symbol in table order over a single snapshot of the
//! table. A failing symbol is logged and skipped; the pass carries on with
//! the next one. A table replaced while a pass is running is picked up on
//! the next tick.

use std::sync::Arc;
use std::time::Duration;

use adapters::ResponseAccumulator;
use common::{TraceId, child_span, root_span};
use market::{Quote, Symbol, parse_quote};
use tokio::time::{MissedTickBehavior, interval};
use tracing::{Instrument, debug, error, info, warn};

use crate::context::{PollerContext, SharedState};
use crate::error::PollError;

/// Floor for the quote tick; `interval` rejects a zero period.
const MIN_QUOTE_INTERVAL: Duration = Duration::from_millis(1);

/// Result of one quote cycle.
#[derive(Debug)]
pub struct QuoteOutcome {
    pub symbol: Symbol,
    pub result: Result<Quote, PollError>,
}

/// What a single pass of the quote loop did.
#[derive(Debug)]
pub enum PassReport {
    /// The table was not ready; no request was made.
    NotReady,
    /// One outcome per symbol, in table order.
    Polled {
        generation: u64,
        outcomes: Vec<QuoteOutcome>,
    },
}

impl PassReport {
    pub fn outcomes(&self) -> &[QuoteOutcome] {
        match self {
            PassReport::NotReady => &[],
            PassReport::Polled { outcomes, .. } => outcomes,
        }
    }

    pub fn failed(&self) -> usize {
        self.outcomes().iter().filter(|o| o.result.is_err()).count()
    }
}

/// One pass over the current symbol table, holding the lock throughout.
pub async fn poll_quotes(ctx: &PollerContext) -> Result<PassReport, PollError> {
    let trace_id = TraceId::new();

    async move {
        let mut guard = ctx.acquire().await?;
        let SharedState { table, buffer } = &mut *guard;

        if !table.is_ready() {
            debug!("symbol table not ready; skipping pass");
            return Ok(PassReport::NotReady);
        }

        let generation = table.generation();
        let symbols = table.snapshot();
        let mut outcomes = Vec::with_capacity(symbols.len());

        for symbol in symbols.iter() {
            let result = quote_cycle(ctx, symbol, buffer)
                .instrument(child_span("quote", symbol.ticker()))
                .await;

            match &result {
                Ok(quote) => log_quote(symbol, quote),
                Err(e) => warn!(
                    symbol = symbol.ticker(),
                    error = %e,
                    "quote cycle failed; continuing with next symbol"
                ),
            }

            outcomes.push(QuoteOutcome {
                symbol: symbol.clone(),
                result,
            });
        }

        Ok(PassReport::Polled {
            generation,
            outcomes,
        })
    }
    .instrument(root_span("quote_pass", &trace_id))
    .await
}

async fn quote_cycle(
    ctx: &PollerContext,
    symbol: &Symbol,
    buffer: &mut ResponseAccumulator,
) -> Result<Quote, PollError> {
    let request = ctx.quote_request(symbol.ticker());
    let payload = ctx.fetch(&request, buffer).await?;
    Ok(parse_quote(payload)?)
}

fn log_quote(symbol: &Symbol, quote: &Quote) {
    let observed_at = quote
        .observed_at()
        .map(|t| t.to_rfc3339())
        .unwrap_or_else(|| "out of range".to_string());

    info!(
        symbol = symbol.ticker(),
        name = symbol.display_name(),
        current = quote.current,
        high = quote.high,
        low = quote.low,
        open = quote.open,
        previous_close = quote.previous_close,
        timestamp = quote.timestamp,
        observed_at = %observed_at,
        "quote received"
    );
}

/// Runs the quote poll loop forever, one pass per `quote_interval`.
pub async fn run_quote_poll_loop(ctx: Arc<PollerContext>) {
    let period = ctx.config().quote_interval.max(MIN_QUOTE_INTERVAL);
    if period != ctx.config().quote_interval {
        warn!(
            configured_ms = ctx.config().quote_interval.as_millis() as u64,
            "quote interval too small; using 1ms"
        );
    }

    let mut ticker = interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    info!(
        url = %ctx.config().quote_url,
        every_ms = period.as_millis() as u64,
        "quote poll loop started"
    );

    loop {
        ticker.tick().await;

        match poll_quotes(&ctx).await {
            Ok(PassReport::NotReady) => {}
            Ok(report @ PassReport::Polled { .. }) => {
                debug!(
                    requested = report.outcomes().len(),
                    failed = report.failed(),
                    "quote pass finished"
                );
            }
            Err(e) if e.is_lock_timeout() => info!("Not ready to send http requests"),
            Err(e) => error!(error = %e, "quote pass failed"),
        }
    }
}
