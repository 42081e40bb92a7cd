//! The store client boundary: executing native requests.
//!
//! [`NativeStore`] is the single suspension point of the request pipeline.
//! The trait is object-safe so handlers can hold `Arc<dyn NativeStore>`;
//! [`HttpNativeStore`] is the production implementation over a hyper client.
//! Transport failures and timeouts are reported as [`StoreError`] and mapped
//! by the translator to the service-unavailable error class; retry policy, if
//! any, belongs to the surrounding service, not this layer.

use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use bytes::Bytes;
use http::{HeaderMap, StatusCode};
use http_body_util::{BodyExt, Full};
use hyper_util::client::legacy::Client;
use hyper_util::client::legacy::connect::HttpConnector;
use hyper_util::rt::TokioExecutor;
use rustgate_core::GatewayConfig;
use tracing::debug;

use crate::native::NativeRequest;

/// The backend's reply, fully buffered.
#[derive(Debug, Clone)]
pub struct NativeResponse {
    /// The backend status code, in the backend's own vocabulary.
    pub status: StatusCode,
    /// Response headers, including any identity headers.
    pub headers: HeaderMap,
    /// The response body.
    pub body: Bytes,
}

/// A failure to reach the backend at all. Distinct from a backend reply with
/// an error status; the translator maps both.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The connection or transfer failed.
    #[error("backend transport failure: {0}")]
    Transport(String),
    /// The call exceeded the configured timeout.
    #[error("backend call timed out")]
    Timeout,
}

/// An executor of native requests.
pub trait NativeStore: Send + Sync + 'static {
    /// Execute one native request and buffer its reply.
    fn execute(
        &self,
        request: NativeRequest,
    ) -> Pin<Box<dyn Future<Output = Result<NativeResponse, StoreError>> + Send>>;
}

/// HTTP implementation of [`NativeStore`] over the hyper legacy client.
#[derive(Clone)]
pub struct HttpNativeStore {
    endpoint: String,
    timeout: Duration,
    client: Client<HttpConnector, Full<Bytes>>,
}

impl std::fmt::Debug for HttpNativeStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpNativeStore")
            .field("endpoint", &self.endpoint)
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

impl HttpNativeStore {
    /// Create a store client for the configured backend endpoint.
    #[must_use]
    pub fn new(config: &GatewayConfig) -> Self {
        Self {
            endpoint: config.backend_endpoint.trim_end_matches('/').to_owned(),
            timeout: Duration::from_secs(config.backend_timeout_secs),
            client: Client::builder(TokioExecutor::new()).build_http(),
        }
    }
}

impl NativeStore for HttpNativeStore {
    fn execute(
        &self,
        request: NativeRequest,
    ) -> Pin<Box<dyn Future<Output = Result<NativeResponse, StoreError>> + Send>> {
        let client = self.client.clone();
        let endpoint = self.endpoint.clone();
        let timeout = self.timeout;

        Box::pin(async move {
            let uri = if request.query.is_empty() {
                format!("{endpoint}{}", request.path)
            } else {
                format!("{endpoint}{}?{}", request.path, request.query)
            };

            debug!(
                method = %request.method,
                uri = %uri,
                source = request.source,
                "executing backend request"
            );

            let mut builder = http::Request::builder()
                .method(request.method.clone())
                .uri(&uri);
            for (name, value) in &request.headers {
                builder = builder.header(name, value);
            }
            let http_request = builder
                .body(Full::new(request.body))
                .map_err(|e| StoreError::Transport(e.to_string()))?;

            let response = tokio::time::timeout(timeout, client.request(http_request))
                .await
                .map_err(|_| StoreError::Timeout)?
                .map_err(|e| StoreError::Transport(e.to_string()))?;

            let (parts, body) = response.into_parts();
            let body = body
                .collect()
                .await
                .map_err(|e| StoreError::Transport(e.to_string()))?
                .to_bytes();

            Ok(NativeResponse {
                status: parts.status,
                headers: parts.headers,
                body,
            })
        })
    }
}
