//! HTTP client abstraction for testability

use super::types::ProviderError;
use std::future::Future;
use std::time::Duration;
use tracing::{debug, trace, warn};

/// Default request timeout for tile downloads.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_millis(5000);

/// Default User-Agent string for HTTP requests.
/// Tile servers with usage policies (OpenStreetMap among them) reject
/// requests that do not identify the client.
const DEFAULT_USER_AGENT: &str = concat!("tileloader/", env!("CARGO_PKG_VERSION"));

/// Network seam of the loader.
///
/// Workers only ever call [`get`](Self::get); tests substitute a client that
/// returns canned bodies and counts requests.
pub trait AsyncHttpClient: Send + Sync {
    /// GET `url` and return the body. Non-2xx statuses and empty bodies
    /// are errors.
    fn get(&self, url: &str) -> impl Future<Output = Result<Vec<u8>, ProviderError>> + Send;
}

/// Async HTTP client implementation using reqwest.
///
/// The configured timeout is the only per-request deadline the loader
/// applies; it covers connect, send and body read.
#[derive(Clone)]
pub struct AsyncReqwestClient {
    client: reqwest::Client,
}

impl AsyncReqwestClient {
    /// Creates a new client with the default 5 second timeout.
    pub fn new() -> Result<Self, ProviderError> {
        Self::with_timeout(DEFAULT_REQUEST_TIMEOUT)
    }

    /// Creates a new client with a custom timeout.
    pub fn with_timeout(timeout: Duration) -> Result<Self, ProviderError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(DEFAULT_USER_AGENT)
            .pool_max_idle_per_host(32)
            .pool_idle_timeout(Duration::from_secs(90))
            .tcp_nodelay(true)
            .build()
            .map_err(|e| {
                ProviderError::HttpError(format!("Failed to create async HTTP client: {}", e))
            })?;

        Ok(Self { client })
    }
}

impl AsyncHttpClient for AsyncReqwestClient {
    async fn get(&self, url: &str) -> Result<Vec<u8>, ProviderError> {
        trace!(url, "Tile request");

        let response = self.client.get(url).send().await.map_err(|e| {
            warn!(url, error = %e, timeout = e.is_timeout(), "Tile request failed");
            ProviderError::HttpError(format!("request to {} failed: {}", url, e))
        })?;

        let status = response.status();
        if !status.is_success() {
            debug!(url, status = status.as_u16(), "Tile server refused request");
            return Err(ProviderError::HttpError(format!("HTTP {} from {}", status, url)));
        }

        let body = response.bytes().await.map_err(|e| {
            ProviderError::HttpError(format!("reading body from {} failed: {}", url, e))
        })?;
        if body.is_empty() {
            return Err(ProviderError::InvalidResponse(format!("empty body from {}", url)));
        }

        trace!(url, bytes = body.len(), "Tile body received");
        Ok(body.to_vec())
    }
}

#[cfg(test)]
pub mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    /// Mock async HTTP client for testing.
    ///
    /// Returns a canned response after an optional delay and counts calls so
    /// tests can assert how many downloads actually happened.
    #[derive(Clone)]
    pub struct MockAsyncHttpClient {
        pub response: Result<Vec<u8>, ProviderError>,
        pub delay: Duration,
        pub calls: Arc<AtomicUsize>,
    }

    impl MockAsyncHttpClient {
        pub fn ok(body: Vec<u8>) -> Self {
            Self {
                response: Ok(body),
                delay: Duration::ZERO,
                calls: Arc::new(AtomicUsize::new(0)),
            }
        }

        pub fn failing(message: &str) -> Self {
            Self {
                response: Err(ProviderError::HttpError(message.to_string())),
                delay: Duration::ZERO,
                calls: Arc::new(AtomicUsize::new(0)),
            }
        }

        pub fn with_delay(mut self, delay: Duration) -> Self {
            self.delay = delay;
            self
        }

        pub fn call_count(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    impl AsyncHttpClient for MockAsyncHttpClient {
        async fn get(&self, _url: &str) -> Result<Vec<u8>, ProviderError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
            self.response.clone()
        }
    }

    #[tokio::test]
    async fn test_mock_async_client_success() {
        let mock = MockAsyncHttpClient::ok(vec![1, 2, 3, 4]);

        let result = mock.get("http://example.com").await;
        assert_eq!(result.unwrap(), vec![1, 2, 3, 4]);
        assert_eq!(mock.call_count(), 1);
    }

    #[tokio::test]
    async fn test_mock_async_client_error() {
        let mock = MockAsyncHttpClient::failing("Test error");

        let result = mock.get("http://example.com").await;
        assert!(result.is_err());
        assert_eq!(mock.call_count(), 1);
    }

    #[tokio::test]
    async fn test_reqwest_client_builds_with_timeout() {
        let client = AsyncReqwestClient::with_timeout(Duration::from_millis(250));
        assert!(client.is_ok());
    }
}
