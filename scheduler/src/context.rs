//! PollerContext
//!
//! Owned by the process root and handed to both loops as `Arc<PollerContext>`.
//! It holds the transport, the configuration and the one lock both loops
//! contend for. The lock guards `SharedState` (the symbol table *and* the
//! accumulation buffer) as a single critical section: whoever holds it may
//! run request cycles through the buffer and read or replace the table.

use std::sync::Arc;

use adapters::{HttpRequest, ResponseAccumulator, Transport, TransportError};
use market::SymbolTable;
use tokio::sync::{Mutex, MutexGuard};
use tokio::time::timeout;
use tracing::debug;

use crate::error::PollError;
use crate::types::PollerConfig;

/// The (table, buffer) pair protected by the context lock.
pub struct SharedState {
    pub table: SymbolTable,
    pub buffer: ResponseAccumulator,
}

pub struct PollerContext {
    cfg: PollerConfig,
    transport: Arc<dyn Transport>,
    shared: Mutex<SharedState>,
}

impl PollerContext {
    pub fn new(cfg: PollerConfig, transport: Arc<dyn Transport>) -> Arc<Self> {
        let shared = SharedState {
            table: SymbolTable::new(),
            buffer: ResponseAccumulator::with_capacity(cfg.buffer_capacity),
        };

        Arc::new(Self {
            cfg,
            transport,
            shared: Mutex::new(shared),
        })
    }

    pub fn config(&self) -> &PollerConfig {
        &self.cfg
    }

    /// Acquire the shared lock, waiting at most `lock_timeout`.
    pub async fn acquire(&self) -> Result<MutexGuard<'_, SharedState>, PollError> {
        timeout(self.cfg.lock_timeout, self.shared.lock())
            .await
            .map_err(|_| PollError::LockTimeout(self.cfg.lock_timeout))
    }

    pub(crate) fn symbols_request(&self) -> HttpRequest {
        HttpRequest::get(&self.cfg.symbols_url).with_header("Content-Type", "application/json")
    }

    pub(crate) fn quote_request(&self, ticker: &str) -> HttpRequest {
        HttpRequest::get(&self.cfg.quote_url)
            .with_query("symbol", ticker)
            .with_query("token", self.cfg.quote_token.expose())
    }

    /// One request/response/accumulate cycle into `buffer`.
    ///
    /// `buffer` comes out of a held `SharedState` guard, so no other cycle can
    /// write it concurrently. The cursor is rewound here, before the transport
    /// runs, whatever events the transport goes on to deliver. The returned
    /// slice is the complete payload.
    pub(crate) async fn fetch<'b>(
        &self,
        request: &HttpRequest,
        buffer: &'b mut ResponseAccumulator,
    ) -> Result<&'b [u8], PollError> {
        buffer.on_begin();

        let outcome = timeout(
            self.cfg.request_timeout,
            self.transport.perform(request, &mut *buffer),
        )
        .await;

        let meta = match outcome {
            Ok(result) => result?,
            Err(_) => {
                buffer.on_error();
                return Err(TransportError::Timeout.into());
            }
        };

        let payload = buffer.payload()?;

        debug!(
            status = meta.status,
            content_length = meta.content_length,
            body = %String::from_utf8_lossy(payload),
            "HTTP GET response"
        );

        Ok(payload)
    }
}
