//! RPC transport construction.

use alloy::{
    providers::{DynProvider, Provider, ProviderBuilder},
    rpc::client::ClientBuilder,
    transports::layers::RetryBackoffLayer,
};
use std::time::Duration;
use url::Url;

pub mod error;
pub use error::TransportErrExt;

mod timeout;
pub use timeout::{TimeoutLayer, TimeoutService};

/// [`RetryBackoffLayer`] for configured providers: 10 retries, 800ms initial backoff, no
/// compute unit budget.
pub const RETRY_LAYER: RetryBackoffLayer = RetryBackoffLayer::new(10, 800, u64::MAX);

/// Creates an HTTP [`DynProvider`] for `endpoint`.
///
/// Every request is bounded by `timeout`; rate limited requests are retried.
pub fn http_provider(endpoint: Url, timeout: Duration) -> DynProvider {
    let client = ClientBuilder::default()
        .layer(RETRY_LAYER)
        .layer(TimeoutLayer::new(timeout))
        .http(endpoint);
    ProviderBuilder::new().connect_client(client).erased()
}
