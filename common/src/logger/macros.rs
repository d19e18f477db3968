use tracing::Span;

use super::TraceId;

/// Root span for one refresh cycle or one quote pass.
pub fn root_span(name: &'static str, trace_id: &TraceId) -> Span {
    tracing::info_span!("cycle", name = %name, trace_id = %trace_id)
}

/// Child span for a single request inside a cycle (inherits trace_id).
pub fn child_span(name: &'static str, symbol: &str) -> Span {
    tracing::info_span!("request", name = %name, symbol = %symbol)
}
