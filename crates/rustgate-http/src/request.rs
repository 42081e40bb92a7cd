//! The gateway's inbound request model.
//!
//! [`S3Request`] is constructed once per inbound request. Construction runs
//! the full ingress pipeline synchronously: query parsing, credential
//! extraction, virtual-host bucket recovery, resource-path splitting, header
//! validation (fixed order, first failure wins), and canonical-token
//! computation. A request that survives construction is protocol-valid; its
//! identifying fields never change afterwards.

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use chrono::{DateTime, Duration, Utc};
use http::header::{CONTENT_LENGTH, DATE, HOST};
use http::{HeaderMap, Method};
use percent_encoding::percent_decode_str;
use rustgate_auth::{canonical_string, extract_credentials, signing_token};
use rustgate_core::{GatewayConfig, GatewayError, RecognizeError};
use tracing::debug;

use crate::router::{HandlerKind, ResourceKind, dispatch};

/// Maximum tolerated difference between the request `Date` and current time,
/// in seconds.
const MAX_CLOCK_SKEW_SECS: i64 = 5 * 60;

/// A validated inbound request.
///
/// Identifying fields are immutable after construction; only
/// [`user_id`](Self::user_id) is set later, once the backend has responded.
#[derive(Debug, Clone)]
pub struct S3Request {
    /// The HTTP verb.
    pub method: Method,
    /// Owned copy of the inbound headers. Pre-signed authorization
    /// synthesizes `Date` and `Authorization` entries into this map.
    pub headers: HeaderMap,
    /// Decoded query parameters; bare keys carry an empty value.
    pub query_params: Vec<(String, String)>,
    /// The raw (undecoded) request path, as signed by the client.
    pub raw_path: String,
    /// Whether the request carried a query string at all.
    pub has_query: bool,
    /// The client's access key id.
    pub access_key: String,
    /// The request signature, verified downstream by the auth collaborator.
    pub signature: String,
    /// Bucket recovered from virtual-hosted addressing, if any.
    pub bucket_in_host: Option<String>,
    /// The container (bucket) this request addresses, if any.
    pub container: Option<String>,
    /// The object this request addresses; only meaningful with a container.
    pub object: Option<String>,
    /// Hex digest decoded from a valid `Content-MD5` header, kept for
    /// downstream ETag comparison.
    pub content_md5_hex: Option<String>,
    /// The opaque signing token, computed once from the canonical string and
    /// later injected as the backend auth credential.
    pub token: String,
    /// Resolved identity; populated after a successful backend call.
    pub user_id: Option<String>,
}

impl S3Request {
    /// Construct a validated request from raw HTTP request parts.
    ///
    /// # Errors
    ///
    /// Returns [`RecognizeError::NotS3Request`] for requests that do not
    /// speak this protocol (the caller may delegate them), and a typed
    /// [`GatewayError`] for genuine protocol violations.
    pub fn from_parts(
        parts: &http::request::Parts,
        config: &GatewayConfig,
    ) -> Result<Self, RecognizeError> {
        let raw_query = parts.uri.query();
        let query_params = parse_query_params(raw_query.unwrap_or(""));
        let has_query = raw_query.is_some();

        let mut headers = parts.headers.clone();
        let credentials = extract_credentials(&mut headers, &query_params)?;

        let bucket_in_host =
            parse_virtual_host_bucket(&headers, config.storage_domain.as_deref());
        let raw_path = parts.uri.path().to_owned();
        let (container, object) = parse_resource_path(&raw_path, bucket_in_host.as_deref());

        let content_md5_hex = validate_headers(&headers, &query_params)?;

        let canonical_path = match &bucket_in_host {
            Some(bucket) => format!("/{bucket}{raw_path}"),
            None => raw_path.clone(),
        };
        let canonical = canonical_string(
            &parts.method,
            &headers,
            &canonical_path,
            has_query.then_some(query_params.as_slice()),
        );
        let token = signing_token(&canonical);

        let request = Self {
            method: parts.method.clone(),
            headers,
            query_params,
            raw_path,
            has_query,
            access_key: credentials.access_key,
            signature: credentials.signature,
            bucket_in_host,
            container,
            object,
            content_md5_hex,
            token,
            user_id: None,
        };

        debug!(
            method = %request.method,
            access_key = %request.access_key,
            container = ?request.container,
            object = ?request.object,
            handler = request.handler_kind().as_str(),
            "constructed gateway request"
        );

        Ok(request)
    }

    /// Which handler owns this request.
    #[must_use]
    pub fn handler_kind(&self) -> HandlerKind {
        dispatch(
            self.container.as_deref(),
            self.object.as_deref(),
            &self.query_params,
        )
    }

    /// Which resource level this request addresses.
    #[must_use]
    pub fn resource_kind(&self) -> ResourceKind {
        ResourceKind::of(self.container.as_deref(), self.object.as_deref())
    }
}

/// Enforce protocol preconditions on the validated header set.
///
/// Checks run in a fixed order; the first failure determines the error.
/// Returns the hex digest decoded from `Content-MD5` when present.
fn validate_headers(
    headers: &HeaderMap,
    query_params: &[(String, String)],
) -> Result<Option<String>, GatewayError> {
    if let Some(value) = headers.get(CONTENT_LENGTH) {
        let raw = value.to_str().unwrap_or("");
        match raw.parse::<i64>() {
            Ok(length) if length >= 0 => {}
            _ => return Err(GatewayError::invalid_argument("Content-Length", raw)),
        }
    }

    if headers.contains_key(DATE) {
        validate_date(headers, query_params)?;
    }

    let content_md5_hex = match headers.get("content-md5") {
        Some(value) => {
            let raw = value.to_str().unwrap_or("");
            if raw.is_empty() {
                return Err(GatewayError::InvalidDigest);
            }
            let digest = BASE64.decode(raw).map_err(|_| GatewayError::InvalidDigest)?;
            Some(hex::encode(digest))
        }
        None => None,
    };

    if let Some(value) = headers.get("x-amz-metadata-directive") {
        let raw = value.to_str().unwrap_or("");
        if raw != "COPY" && raw != "REPLACE" {
            return Err(GatewayError::invalid_argument_with(
                "x-amz-metadata-directive",
                raw,
                "Unknown metadata directive.",
            ));
        }
    }

    if let Some(value) = headers.get("x-amz-storage-class") {
        // Only STANDARD is supported.
        if value.to_str().unwrap_or("") != "STANDARD" {
            return Err(GatewayError::InvalidStorageClass);
        }
    }

    if headers.contains_key("x-amz-mfa") {
        return Err(GatewayError::not_implemented("MFA Delete is not supported."));
    }

    if headers.contains_key("x-amz-server-side-encryption") {
        return Err(GatewayError::not_implemented(
            "Server-side encryption is not supported.",
        ));
    }

    if headers.contains_key("x-amz-website-redirect-location") {
        return Err(GatewayError::not_implemented(
            "Website redirection is not supported.",
        ));
    }

    Ok(content_md5_hex)
}

/// Validate the `Date` header, or the `Expires` expiry for pre-signed
/// requests (which synthesized `Date` from it).
fn validate_date(
    headers: &HeaderMap,
    query_params: &[(String, String)],
) -> Result<(), GatewayError> {
    let now = Utc::now();

    if let Some(expires) = query_value(query_params, "Expires") {
        let epoch = expires
            .parse::<f64>()
            .ok()
            .filter(|secs| secs.is_finite())
            .ok_or(GatewayError::AccessDenied)?;
        #[allow(clippy::cast_possible_truncation)]
        let expiry = DateTime::<Utc>::from_timestamp(epoch as i64, 0)
            .ok_or(GatewayError::AccessDenied)?;
        if now > expiry {
            return Err(GatewayError::RequestExpired);
        }
        return Ok(());
    }

    let raw = headers
        .get(DATE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");
    let date = parse_http_date(raw).ok_or(GatewayError::AccessDenied)?;

    if date.timestamp() < 0 {
        return Err(GatewayError::AccessDenied);
    }

    // A Date too far ahead or behind is a skew error, not a generic
    // auth failure.
    if date.signed_duration_since(now).abs() > Duration::seconds(MAX_CLOCK_SKEW_SECS) {
        return Err(GatewayError::RequestTimeTooSkewed);
    }

    Ok(())
}

/// Parse an HTTP date string into a `DateTime<Utc>`.
///
/// Accepts RFC 2822 (e.g. `Sat, 28 Feb 2026 12:00:00 +0000`) and the common
/// HTTP `GMT` form.
fn parse_http_date(s: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc2822(s) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = chrono::NaiveDateTime::parse_from_str(s, "%a, %d %b %Y %H:%M:%S GMT") {
        return Some(dt.and_utc());
    }
    None
}

/// Extract the bucket name from a virtual-hosted-style `Host` header.
///
/// With a storage domain of `example.com`, a Host of
/// `mybucket.example.com:8080` yields `Some("mybucket")`.
fn parse_virtual_host_bucket(headers: &HeaderMap, storage_domain: Option<&str>) -> Option<String> {
    let domain = storage_domain?;
    if domain.is_empty() {
        return None;
    }
    let suffix = if domain.starts_with('.') {
        domain.to_owned()
    } else {
        format!(".{domain}")
    };

    let host = headers.get(HOST)?.to_str().ok()?;
    let host = match host.rsplit_once(':') {
        Some((name, _port)) => name,
        None => host,
    };

    let bucket = host.strip_suffix(&suffix)?;
    if bucket.is_empty() {
        None
    } else {
        Some(bucket.to_owned())
    }
}

/// Split the request path into container and object identifiers.
///
/// With virtual-hosted addressing the whole path (minus the leading slash)
/// is the object; otherwise the first segment is the container and the rest
/// of the path, slashes included, is the object.
fn parse_resource_path(
    path: &str,
    bucket_in_host: Option<&str>,
) -> (Option<String>, Option<String>) {
    if let Some(bucket) = bucket_in_host {
        let raw_object = path.strip_prefix('/').unwrap_or(path);
        let object = if raw_object.is_empty() {
            None
        } else {
            Some(decode_uri_component(raw_object))
        };
        return (Some(bucket.to_owned()), object);
    }

    let trimmed = path.strip_prefix('/').unwrap_or(path);
    if trimmed.is_empty() {
        return (None, None);
    }

    if let Some(pos) = trimmed.find('/') {
        let container = decode_uri_component(&trimmed[..pos]);
        let raw_object = &trimmed[pos + 1..];
        let object = if raw_object.is_empty() {
            None
        } else {
            Some(decode_uri_component(raw_object))
        };
        (Some(container), object)
    } else {
        (Some(decode_uri_component(trimmed)), None)
    }
}

/// Decode a percent-encoded URI component.
fn decode_uri_component(s: &str) -> String {
    percent_decode_str(s).decode_utf8_lossy().into_owned()
}

/// Parse a query string into decoded key-value pairs.
fn parse_query_params(query: &str) -> Vec<(String, String)> {
    if query.is_empty() {
        return Vec::new();
    }

    query
        .split('&')
        .filter(|s| !s.is_empty())
        .map(|pair| {
            if let Some(pos) = pair.find('=') {
                (
                    decode_uri_component(&pair[..pos]),
                    decode_uri_component(&pair[pos + 1..]),
                )
            } else {
                (decode_uri_component(pair), String::new())
            }
        })
        .collect()
}

/// Look up a query parameter value by exact key.
fn query_value<'a>(params: &'a [(String, String)], key: &str) -> Option<&'a str> {
    params
        .iter()
        .find(|(k, _)| k == key)
        .map(|(_, v)| v.as_str())
}
