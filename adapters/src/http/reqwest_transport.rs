use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, header::LOCATION, redirect};
use tracing::{debug, instrument};

use super::{
    EventSink, HttpRequest, RedirectPolicy, ResponseMeta, Transport, TransportError,
    TransportEvent,
};

/// `Transport` backed by a pooled reqwest client.
///
/// Automatic redirects are switched off at the client so that every hop is
/// visible to the sink and can carry the injected headers.
#[derive(Clone)]
pub struct ReqwestTransport {
    http: Client,
    redirects: RedirectPolicy,
}

impl ReqwestTransport {
    pub fn new(request_timeout: Duration, redirects: RedirectPolicy) -> Result<Self, TransportError> {
        let http = Client::builder()
            .timeout(request_timeout)
            .pool_idle_timeout(Duration::from_secs(30))
            .tcp_keepalive(Duration::from_secs(30))
            .redirect(redirect::Policy::none())
            .build()?;

        Ok(Self { http, redirects })
    }

    async fn perform_hops(
        &self,
        request: &HttpRequest,
        sink: &mut dyn EventSink,
    ) -> Result<ResponseMeta, TransportError> {
        let mut url = request.url.clone();
        let mut hops = 0usize;

        loop {
            let mut builder = self.http.get(&url);
            // a redirect Location already carries its own query
            if hops == 0 {
                builder = builder.query(&request.query);
            }
            for (key, value) in &request.headers {
                builder = builder.header(key.as_str(), value.as_str());
            }
            if hops > 0 {
                for (key, value) in self.redirects.injected_headers() {
                    builder = builder.header(key, value);
                }
            }

            let mut resp = builder.send().await.map_err(TransportError::from_reqwest)?;

            sink.on_event(TransportEvent::Connected)?;
            sink.on_event(TransportEvent::HeaderSent)?;
            for (key, value) in resp.headers() {
                if let Ok(value) = value.to_str() {
                    sink.on_event(TransportEvent::Header {
                        key: key.as_str(),
                        value,
                    })?;
                }
            }

            let status = resp.status();

            if status.is_redirection() && self.redirects.follow {
                hops += 1;
                if hops > self.redirects.max_hops {
                    return Err(TransportError::TooManyRedirects(self.redirects.max_hops));
                }

                let next = resp
                    .headers()
                    .get(LOCATION)
                    .and_then(|v| v.to_str().ok())
                    .and_then(|location| resp.url().join(location).ok())
                    .ok_or(TransportError::MissingRedirectLocation)?;

                sink.on_event(TransportEvent::Redirect {
                    location: next.as_str(),
                })?;
                url = next.to_string();
                continue;
            }

            if !status.is_success() {
                return Err(TransportError::Status(status.as_u16()));
            }

            let content_length = resp.content_length();
            let mut delivered = 0usize;

            while let Some(chunk) = resp.chunk().await.map_err(TransportError::from_reqwest)? {
                delivered += chunk.len();
                sink.on_event(TransportEvent::Data(&chunk))?;
            }

            sink.on_event(TransportEvent::Finish)?;

            debug!(
                status = status.as_u16(),
                content_length,
                delivered,
                "HTTP GET completed"
            );

            return Ok(ResponseMeta {
                status: status.as_u16(),
                content_length,
                bytes_delivered: delivered,
            });
        }
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    #[instrument(skip(self, request, sink), fields(url = %request.url), level = "debug")]
    async fn perform(
        &self,
        request: &HttpRequest,
        sink: &mut dyn EventSink,
    ) -> Result<ResponseMeta, TransportError> {
        match self.perform_hops(request, sink).await {
            Ok(meta) => Ok(meta),
            Err(e) => {
                // the request has already failed; the sink cannot change that
                let _ = sink.on_event(TransportEvent::Error);
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_with_default_policy() {
        let transport = ReqwestTransport::new(Duration::from_secs(5), RedirectPolicy::default());
        assert!(transport.is_ok());
    }
}
