use std::sync::Arc;

use adapters::{ReqwestTransport, Transport};
use scheduler::{PollerContext, run_quote_poll_loop, run_symbol_fetch_loop};
use tokio::task::JoinHandle;

use crate::config::AppConfig;

/// The two running loops. Dropping this does not stop them; call
/// [`Pollers::shutdown`].
pub struct Pollers {
    pub ctx: Arc<PollerContext>,
    symbols: JoinHandle<()>,
    quotes: JoinHandle<()>,
}

impl Pollers {
    /// Starts the symbol fetch loop and the quote poll loop on `ctx`.
    pub fn spawn(ctx: Arc<PollerContext>) -> Self {
        let symbols = tokio::spawn(run_symbol_fetch_loop(Arc::clone(&ctx)));
        let quotes = tokio::spawn(run_quote_poll_loop(Arc::clone(&ctx)));

        Self {
            ctx,
            symbols,
            quotes,
        }
    }

    /// Aborts both loops and waits for them to unwind.
    pub async fn shutdown(self) {
        self.symbols.abort();
        self.quotes.abort();
        let _ = self.symbols.await;
        let _ = self.quotes.await;
        tracing::info!("pollers stopped");
    }
}

/// Wires the production transport to a fresh context.
pub fn build_context(cfg: &AppConfig) -> anyhow::Result<Arc<PollerContext>> {
    let transport: Arc<dyn Transport> = Arc::new(ReqwestTransport::new(
        cfg.request_timeout,
        cfg.redirect_policy(),
    )?);

    Ok(PollerContext::new(cfg.poller_config(), transport))
}
