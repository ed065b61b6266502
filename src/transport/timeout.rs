//! Timeout layer for RPC requests.

use alloy::{
    rpc::json_rpc::{RequestPacket, ResponsePacket},
    transports::{Transport, TransportError, TransportErrorKind, TransportFut},
};
use futures::FutureExt;
use std::{
    task::{Context, Poll},
    time::Duration,
};
use tower::{Layer, Service};
use tracing::warn;

/// A [`tower::Layer`] that adds a timeout to requests.
#[derive(Debug, Clone, Copy)]
pub struct TimeoutLayer {
    timeout: Duration,
}

impl TimeoutLayer {
    /// Create a new [`TimeoutLayer`] with the given timeout duration.
    pub const fn new(timeout: Duration) -> Self {
        Self { timeout }
    }
}

impl<T> Layer<T> for TimeoutLayer {
    type Service = TimeoutService<T>;

    fn layer(&self, inner: T) -> Self::Service {
        TimeoutService { inner, timeout: self.timeout }
    }
}

/// A service that wraps another service with a timeout.
#[derive(Debug, Clone)]
pub struct TimeoutService<T> {
    inner: T,
    timeout: Duration,
}

impl<T> Service<RequestPacket> for TimeoutService<T>
where
    T: Transport + Clone,
{
    type Response = ResponsePacket;
    type Error = TransportError;
    type Future = TransportFut<'static>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, req: RequestPacket) -> Self::Future {
        let method = match &req {
            RequestPacket::Single(req) => req.method().to_string(),
            RequestPacket::Batch(reqs) => format!("batch({})", reqs.len()),
        };

        let fut = self.inner.call(req);
        let timeout = self.timeout;

        async move {
            match tokio::time::timeout(timeout, fut).await {
                Ok(result) => result,
                Err(_) => {
                    warn!(%method, timeout_ms = timeout.as_millis() as u64, "RPC request timeout");
                    Err(TransportErrorKind::custom_str(&format!(
                        "request timeout: method={method}"
                    )))
                }
            }
        }
        .boxed()
    }
}
