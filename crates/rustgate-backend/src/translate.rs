//! Mapping backend replies into gateway success or typed errors.
//!
//! The backend and the inbound protocol disagree about what status codes
//! mean, per method and per resource level. Two tables keyed by
//! `(ResourceKind, Method)` resolve the disagreement: a success set and an
//! error mapping, with four universal fallbacks behind them. Any status
//! neither table nor fallback covers is a programming-error signal (the
//! tables are exhaustive for every reachable code) and is reported loudly
//! as an internal error, never treated as success.

use std::collections::BTreeMap;

use bytes::Bytes;
use http::{HeaderMap, Method};
use rustgate_core::GatewayError;
use rustgate_http::{ResourceKind, S3Request};
use tracing::{debug, warn};

use crate::client::{NativeResponse, NativeStore};
use crate::native::to_native_request;

/// Execute a request against the store and translate the reply.
///
/// `method` overrides the inbound verb for internal sub-requests; `query` is
/// the explicit native query mapping. The request's resolved identity is set
/// from the backend's identity headers (or the access key) before status
/// classification, so it is available on both success and error paths.
///
/// # Errors
///
/// Returns the typed [`GatewayError`] the backend status maps to. A transport
/// failure or timeout is the service-unavailable class; an unmapped status is
/// an internal error naming the unexpected code.
pub async fn get_response(
    req: &mut S3Request,
    store: &dyn NativeStore,
    method: Option<Method>,
    query: Option<&BTreeMap<String, Option<String>>>,
    body: Bytes,
) -> Result<NativeResponse, GatewayError> {
    let method = method.unwrap_or_else(|| req.method.clone());
    let native = to_native_request(req, Some(&method), query, body);

    let response = match store.execute(native).await {
        Ok(response) => response,
        Err(err) => {
            warn!(error = %err, "backend call failed");
            return Err(GatewayError::ServiceUnavailable);
        }
    };

    req.user_id = Some(resolve_user_id(&response.headers, &req.access_key));

    let resource = req.resource_kind();
    let status = response.status.as_u16();

    if success_statuses(resource, &method).contains(&status) {
        return Ok(response);
    }

    if let Some(error) = classify_error(
        resource,
        &method,
        status,
        req.container.as_deref(),
        req.object.as_deref(),
    ) {
        debug!(status, error = %error, "translated backend error status");
        return Err(error);
    }

    match status {
        400 => Err(GatewayError::BadBackendRequest {
            reason: String::from_utf8_lossy(&response.body).into_owned(),
        }),
        401 => Err(GatewayError::SignatureDoesNotMatch),
        403 => Err(GatewayError::AccessDenied),
        503 => Err(GatewayError::ServiceUnavailable),
        other => {
            warn!(status = other, "unmapped backend status");
            Err(GatewayError::internal(format!(
                "unexpected status code {other}"
            )))
        }
    }
}

/// Backend statuses that count as success for this method and resource level.
fn success_statuses(resource: ResourceKind, method: &Method) -> &'static [u16] {
    match resource {
        ResourceKind::Service => match *method {
            Method::GET => &[200],
            _ => &[],
        },
        ResourceKind::Bucket => match *method {
            Method::HEAD => &[204],
            Method::GET => &[200, 204],
            Method::PUT => &[201],
            Method::POST => &[204],
            Method::DELETE => &[204],
            _ => &[],
        },
        ResourceKind::Object => match *method {
            Method::HEAD | Method::GET => &[200, 206, 304],
            Method::PUT => &[201],
            Method::DELETE => &[204],
            _ => &[],
        },
    }
}

/// Backend statuses with a specific gateway error for this method and
/// resource level, parameterized with the container or object name.
fn classify_error(
    resource: ResourceKind,
    method: &Method,
    status: u16,
    container: Option<&str>,
    object: Option<&str>,
) -> Option<GatewayError> {
    let bucket = container.unwrap_or_default();
    let key = object.unwrap_or_default();

    match resource {
        ResourceKind::Service => None,
        ResourceKind::Bucket => match (method, status) {
            (&Method::HEAD | &Method::GET | &Method::POST | &Method::DELETE, 404) => {
                Some(GatewayError::no_such_bucket(bucket))
            }
            (&Method::PUT, 202) => Some(GatewayError::bucket_already_exists(bucket)),
            (&Method::DELETE, 409) => Some(GatewayError::BucketNotEmpty),
            _ => None,
        },
        ResourceKind::Object => match (method, status) {
            (&Method::HEAD | &Method::GET | &Method::DELETE, 404) => {
                Some(GatewayError::no_such_key(key))
            }
            (&Method::HEAD | &Method::GET, 412) => Some(GatewayError::PreconditionFailed),
            (&Method::GET, 416) => Some(GatewayError::InvalidRange),
            (&Method::PUT, 404) => Some(GatewayError::no_such_bucket(bucket)),
            (&Method::PUT, 422) => Some(GatewayError::InvalidDigest),
            (&Method::PUT, 413) => Some(GatewayError::EntityTooLarge),
            (&Method::PUT, 411) => Some(GatewayError::MissingContentLength),
            _ => None,
        },
    }
}

/// Resolve the caller's identity from the backend reply.
///
/// Federated deployments attach tenant and user name headers; both must be
/// present to form the combined identity. Otherwise the access key stands in.
fn resolve_user_id(headers: &HeaderMap, access_key: &str) -> String {
    let tenant = headers.get("x-tenant-name").and_then(|v| v.to_str().ok());
    let user = headers.get("x-user-name").and_then(|v| v.to_str().ok());
    match (tenant, user) {
        (Some(tenant), Some(user)) => format!("{tenant}:{user}"),
        _ => access_key.to_owned(),
    }
}

#[cfg(test)]
mod tests {
    use std::future::Future;
    use std::pin::Pin;

    use chrono::Utc;
    use http::StatusCode;
    use rustgate_core::GatewayConfig;

    use super::*;
    use crate::client::StoreError;
    use crate::native::NativeRequest;

    /// A store that replies with a fixed status, headers, and body.
    struct FixedStore {
        status: u16,
        headers: Vec<(&'static str, &'static str)>,
        body: &'static str,
    }

    impl FixedStore {
        fn status(status: u16) -> Self {
            Self {
                status,
                headers: Vec::new(),
                body: "",
            }
        }
    }

    impl NativeStore for FixedStore {
        fn execute(
            &self,
            _request: NativeRequest,
        ) -> Pin<Box<dyn Future<Output = Result<NativeResponse, StoreError>> + Send>> {
            let status = StatusCode::from_u16(self.status).unwrap();
            let mut headers = HeaderMap::new();
            for (name, value) in &self.headers {
                headers.insert(*name, value.parse().unwrap());
            }
            let body = Bytes::from_static(self.body.as_bytes());
            Box::pin(async move {
                Ok(NativeResponse {
                    status,
                    headers,
                    body,
                })
            })
        }
    }

    /// A store whose transport always fails.
    struct DownStore;

    impl NativeStore for DownStore {
        fn execute(
            &self,
            _request: NativeRequest,
        ) -> Pin<Box<dyn Future<Output = Result<NativeResponse, StoreError>> + Send>> {
            Box::pin(async { Err(StoreError::Timeout) })
        }
    }

    fn request_for(method: &str, uri: &str) -> S3Request {
        let date = Utc::now().to_rfc2822();
        let (parts, ()) = http::Request::builder()
            .method(method)
            .uri(uri)
            .header("Authorization", "AWS AKIAEXAMPLE:c2ln")
            .header("Date", &date)
            .body(())
            .unwrap()
            .into_parts();
        S3Request::from_parts(&parts, &GatewayConfig::default()).unwrap()
    }

    async fn run(method: &str, uri: &str, store: &dyn NativeStore) -> Result<NativeResponse, GatewayError> {
        let mut req = request_for(method, uri);
        get_response(&mut req, store, None, None, Bytes::new()).await
    }

    #[tokio::test]
    async fn test_should_accept_object_get_success_statuses() {
        for status in [200, 206, 304] {
            let result = run("GET", "/bucket/key", &FixedStore::status(status)).await;
            assert!(result.is_ok(), "status {status}");
        }
    }

    #[tokio::test]
    async fn test_should_translate_object_get_404_to_no_such_key() {
        let err = run("GET", "/bucket/photos/cat.jpg", &FixedStore::status(404))
            .await
            .unwrap_err();
        assert_eq!(
            err,
            GatewayError::NoSuchKey {
                key: "photos/cat.jpg".to_owned()
            }
        );
    }

    #[tokio::test]
    async fn test_should_translate_object_preconditions_and_ranges() {
        let err = run("HEAD", "/bucket/key", &FixedStore::status(412))
            .await
            .unwrap_err();
        assert_eq!(err, GatewayError::PreconditionFailed);

        let err = run("GET", "/bucket/key", &FixedStore::status(416))
            .await
            .unwrap_err();
        assert_eq!(err, GatewayError::InvalidRange);
    }

    #[tokio::test]
    async fn test_should_translate_object_put_statuses() {
        let err = run("PUT", "/bucket/key", &FixedStore::status(404))
            .await
            .unwrap_err();
        // A missing container on object PUT names the bucket, not the key.
        assert_eq!(
            err,
            GatewayError::NoSuchBucket {
                bucket: "bucket".to_owned()
            }
        );

        let err = run("PUT", "/bucket/key", &FixedStore::status(422))
            .await
            .unwrap_err();
        assert_eq!(err, GatewayError::InvalidDigest);

        let err = run("PUT", "/bucket/key", &FixedStore::status(413))
            .await
            .unwrap_err();
        assert_eq!(err, GatewayError::EntityTooLarge);

        let err = run("PUT", "/bucket/key", &FixedStore::status(411))
            .await
            .unwrap_err();
        assert_eq!(err, GatewayError::MissingContentLength);
    }

    #[tokio::test]
    async fn test_should_translate_bucket_put_202_to_already_exists() {
        let err = run("PUT", "/bucket", &FixedStore::status(202))
            .await
            .unwrap_err();
        assert_eq!(
            err,
            GatewayError::BucketAlreadyExists {
                bucket: "bucket".to_owned()
            }
        );
    }

    #[tokio::test]
    async fn test_should_translate_bucket_delete_statuses() {
        let err = run("DELETE", "/bucket", &FixedStore::status(409))
            .await
            .unwrap_err();
        assert_eq!(err, GatewayError::BucketNotEmpty);

        let err = run("DELETE", "/bucket", &FixedStore::status(404))
            .await
            .unwrap_err();
        assert_eq!(
            err,
            GatewayError::NoSuchBucket {
                bucket: "bucket".to_owned()
            }
        );

        let ok = run("DELETE", "/bucket", &FixedStore::status(204)).await;
        assert!(ok.is_ok());
    }

    #[tokio::test]
    async fn test_should_apply_universal_fallbacks() {
        let err = run(
            "GET",
            "/bucket/key",
            &FixedStore {
                status: 400,
                headers: Vec::new(),
                body: "path is not valid",
            },
        )
        .await
        .unwrap_err();
        assert_eq!(
            err,
            GatewayError::BadBackendRequest {
                reason: "path is not valid".to_owned()
            }
        );

        let err = run("GET", "/bucket/key", &FixedStore::status(401))
            .await
            .unwrap_err();
        assert_eq!(err, GatewayError::SignatureDoesNotMatch);

        let err = run("GET", "/bucket/key", &FixedStore::status(403))
            .await
            .unwrap_err();
        assert_eq!(err, GatewayError::AccessDenied);

        let err = run("GET", "/bucket/key", &FixedStore::status(503))
            .await
            .unwrap_err();
        assert_eq!(err, GatewayError::ServiceUnavailable);
    }

    #[tokio::test]
    async fn test_should_report_unmapped_status_as_internal_error() {
        let err = run("GET", "/bucket/key", &FixedStore::status(418))
            .await
            .unwrap_err();
        assert_eq!(
            err,
            GatewayError::internal("unexpected status code 418")
        );
    }

    #[tokio::test]
    async fn test_should_surface_transport_failure_as_service_unavailable() {
        let err = run("GET", "/bucket/key", &DownStore).await.unwrap_err();
        assert_eq!(err, GatewayError::ServiceUnavailable);
    }

    #[tokio::test]
    async fn test_should_resolve_federated_identity() {
        let store = FixedStore {
            status: 200,
            headers: vec![("x-tenant-name", "acme"), ("x-user-name", "alice")],
            body: "",
        };
        let mut req = request_for("GET", "/bucket/key");
        get_response(&mut req, &store, None, None, Bytes::new())
            .await
            .unwrap();
        assert_eq!(req.user_id.as_deref(), Some("acme:alice"));
    }

    #[tokio::test]
    async fn test_should_fall_back_to_access_key_identity() {
        // No identity headers at all.
        let mut req = request_for("GET", "/bucket/key");
        get_response(&mut req, &FixedStore::status(200), None, None, Bytes::new())
            .await
            .unwrap();
        assert_eq!(req.user_id.as_deref(), Some("AKIAEXAMPLE"));

        // A tenant name alone is not a federated identity.
        let store = FixedStore {
            status: 200,
            headers: vec![("x-tenant-name", "acme")],
            body: "",
        };
        let mut req = request_for("GET", "/bucket/key");
        get_response(&mut req, &store, None, None, Bytes::new())
            .await
            .unwrap();
        assert_eq!(req.user_id.as_deref(), Some("AKIAEXAMPLE"));
    }

    #[tokio::test]
    async fn test_should_set_identity_even_when_translation_fails() {
        let store = FixedStore {
            status: 404,
            headers: vec![("x-tenant-name", "acme"), ("x-user-name", "alice")],
            body: "",
        };
        let mut req = request_for("GET", "/bucket/key");
        let result = get_response(&mut req, &store, None, None, Bytes::new()).await;
        assert!(result.is_err());
        assert_eq!(req.user_id.as_deref(), Some("acme:alice"));
    }

    #[tokio::test]
    async fn test_should_classify_with_overridden_method() {
        // An internal HEAD sub-request uses HEAD's tables even though the
        // inbound verb was PUT.
        let mut req = request_for("PUT", "/bucket/key");
        let err = get_response(
            &mut req,
            &FixedStore::status(404),
            Some(Method::HEAD),
            None,
            Bytes::new(),
        )
        .await
        .unwrap_err();
        assert_eq!(
            err,
            GatewayError::NoSuchKey {
                key: "key".to_owned()
            }
        );

        let ok = get_response(
            &mut req,
            &FixedStore::status(200),
            Some(Method::HEAD),
            None,
            Bytes::new(),
        )
        .await;
        assert!(ok.is_ok());
    }

    #[tokio::test]
    async fn test_should_accept_service_get_success() {
        let ok = run("GET", "/", &FixedStore::status(200)).await;
        assert!(ok.is_ok());

        // Anything else at the service level is unmapped and loud.
        let err = run("GET", "/", &FixedStore::status(204)).await.unwrap_err();
        assert_eq!(err, GatewayError::internal("unexpected status code 204"));
    }
}
