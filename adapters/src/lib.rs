pub mod http;

pub use http::{
    AccumulatorError, AccumulatorState, EventSink, HttpRequest, RedirectPolicy,
    ReqwestTransport, ResponseAccumulator, ResponseMeta, Transport, TransportError,
    TransportEvent,
};
