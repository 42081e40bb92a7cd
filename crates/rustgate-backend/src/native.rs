//! Rewriting a validated inbound request into the backend's native shape.
//!
//! The native store speaks its own dialect: user metadata lives under
//! `x-object-meta-*`, copies are driven by `x-copy-from`, authentication is a
//! single `x-auth-token` header, and resources live at
//! `/v1/<account>[/<container>[/<object>]]`. This module owns that
//! translation; nothing here talks to the network.

use std::collections::BTreeMap;

use bytes::Bytes;
use http::header::{HeaderName, HeaderValue};
use http::{HeaderMap, Method};
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use rustgate_http::S3Request;

/// Version prefix of the native store's REST API.
pub const API_VERSION: &str = "v1";

/// The backend credential header carrying the signing token.
pub const AUTH_TOKEN_HEADER: &str = "x-auth-token";

/// Inbound prefix for user metadata headers.
const USER_METADATA_PREFIX: &str = "x-amz-meta-";

/// The backend's native prefix for user metadata headers.
const NATIVE_METADATA_PREFIX: &str = "x-object-meta-";

/// Inbound copy-source header and its native equivalent.
const COPY_SOURCE_HEADER: &str = "x-amz-copy-source";
const NATIVE_COPY_FROM_HEADER: &str = "x-copy-from";

/// Characters percent-encoded in native paths and query values. RFC 3986
/// unreserved characters and `/` pass through untouched.
const QUOTE_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~')
    .remove(b'/');

/// A request in the backend's native shape, ready for a
/// [`NativeStore`](crate::client::NativeStore) to execute.
#[derive(Debug, Clone)]
pub struct NativeRequest {
    /// The method to execute, possibly overridden from the inbound verb.
    pub method: Method,
    /// Percent-encoded native resource path.
    pub path: String,
    /// Rendered query string; empty when no explicit parameters were given.
    pub query: String,
    /// Rewritten headers, auth token included.
    pub headers: HeaderMap,
    /// The request body, forwarded unmodified.
    pub body: Bytes,
    /// Request-origin marker for backend-side accounting.
    pub source: &'static str,
}

/// Build the backend-native request from a validated inbound request.
///
/// `method` overrides the inbound verb when a handler issues an internal
/// sub-request (e.g. a HEAD to check existence before a conditional copy).
/// `query` is an explicit parameter mapping, not the inbound query string:
/// `Some(value)` renders as `key=value` with the value percent-encoded,
/// `None` as a bare `key`, in sorted key order.
#[must_use]
pub fn to_native_request(
    req: &S3Request,
    method: Option<&Method>,
    query: Option<&BTreeMap<String, Option<String>>>,
    body: Bytes,
) -> NativeRequest {
    let mut headers = HeaderMap::with_capacity(req.headers.len() + 1);
    for (name, value) in &req.headers {
        if let Some(suffix) = name.as_str().strip_prefix(USER_METADATA_PREFIX) {
            let native = format!("{NATIVE_METADATA_PREFIX}{suffix}");
            let native = HeaderName::from_bytes(native.as_bytes())
                .expect("metadata suffix is a valid header name");
            headers.append(native, value.clone());
        } else if name == COPY_SOURCE_HEADER {
            headers.append(
                HeaderName::from_static(NATIVE_COPY_FROM_HEADER),
                value.clone(),
            );
        } else {
            headers.append(name.clone(), value.clone());
        }
    }
    headers.insert(
        HeaderName::from_static(AUTH_TOKEN_HEADER),
        HeaderValue::from_str(&req.token).expect("signing token is base64"),
    );

    let mut path = format!("/{API_VERSION}/{}", req.access_key);
    if let Some(container) = &req.container {
        path.push('/');
        path.push_str(container);
        if let Some(object) = &req.object {
            path.push('/');
            path.push_str(object);
        }
    }
    let path = utf8_percent_encode(&path, QUOTE_SET).to_string();

    let query = match query {
        Some(params) => params
            .iter()
            .map(|(key, value)| match value {
                Some(value) => {
                    format!("{key}={}", utf8_percent_encode(value, QUOTE_SET))
                }
                None => key.clone(),
            })
            .collect::<Vec<_>>()
            .join("&"),
        None => String::new(),
    };

    NativeRequest {
        method: method.unwrap_or(&req.method).clone(),
        path,
        query,
        headers,
        body,
        source: "S3",
    }
}
