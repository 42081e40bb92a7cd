//! Canonical string construction and signing-token derivation.
//!
//! The string-to-sign for the legacy AWS header scheme is:
//!
//! ```text
//! HTTP-Verb + "\n" +
//! Content-MD5 + "\n" +
//! Content-Type + "\n" +
//! Date + "\n" +
//! CanonicalizedAmzHeaders +
//! CanonicalizedResource
//! ```
//!
//! The gateway does not compute the HMAC itself; it encodes the canonical
//! string into an opaque token that the backend's authentication collaborator
//! signs with the caller's secret key and compares against the request
//! signature. Every byte of the canonical string is significant.

use std::collections::BTreeMap;

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE as BASE64_URL_SAFE;
use http::{HeaderMap, Method};

/// Query parameters that identify a sub-resource and are therefore part of
/// the signed string. Kept sorted; everything else in the query string is
/// dropped from the signature because it does not change which resource the
/// request addresses.
pub const SIGNED_SUB_RESOURCES: &[&str] = &[
    "acl",
    "cors",
    "delete",
    "lifecycle",
    "location",
    "logging",
    "notification",
    "partNumber",
    "policy",
    "requestPayment",
    "response-cache-control",
    "response-content-disposition",
    "response-content-encoding",
    "response-content-language",
    "response-content-type",
    "response-expires",
    "restore",
    "tagging",
    "torrent",
    "uploadId",
    "uploads",
    "versionId",
    "versioning",
    "versions",
    "website",
];

/// Build the canonical string for a request.
///
/// `canonical_path` is the raw request path, already prefixed with
/// `/<bucket>` when the bucket was addressed through the host name. `query`
/// is `Some` exactly when the request carried a query string; its decoded
/// parameters are filtered to [`SIGNED_SUB_RESOURCES`] and appended sorted.
///
/// The output is a pure function of its inputs: same request, same bytes.
#[must_use]
pub fn canonical_string(
    method: &Method,
    headers: &HeaderMap,
    canonical_path: &str,
    query: Option<&[(String, String)]>,
) -> String {
    let mut buf = format!(
        "{}\n{}\n{}\n",
        method.as_str(),
        header_value(headers, "content-md5"),
        header_value(headers, "content-type"),
    );

    // Vendor headers, keyed by lowercase name. HeaderName is already
    // lowercase; duplicate headers fold into one comma-joined value.
    let mut amz_headers: BTreeMap<String, String> = BTreeMap::new();
    for (name, value) in headers {
        let name = name.as_str();
        if name.starts_with("x-amz-") {
            let val = value.to_str().unwrap_or("").trim();
            amz_headers
                .entry(name.to_owned())
                .and_modify(|existing| {
                    existing.push(',');
                    existing.push_str(val);
                })
                .or_insert_with(|| val.to_owned());
        }
    }

    // The date line: a client that signs with x-amz-date leaves it blank.
    if amz_headers.contains_key("x-amz-date") {
        buf.push('\n');
    } else if headers.contains_key(http::header::DATE) {
        buf.push_str(&header_value(headers, "date"));
        buf.push('\n');
    }

    for (name, value) in &amz_headers {
        buf.push_str(name);
        buf.push(':');
        buf.push_str(value);
        buf.push('\n');
    }

    buf.push_str(canonical_path);

    if let Some(params) = query {
        let mut kept: BTreeMap<&str, &str> = BTreeMap::new();
        for (key, value) in params {
            if SIGNED_SUB_RESOURCES.binary_search(&key.as_str()).is_ok() {
                kept.insert(key.as_str(), value.as_str());
            }
        }

        if !kept.is_empty() {
            let rendered: Vec<String> = kept
                .iter()
                .map(|(key, value)| {
                    if value.is_empty() {
                        (*key).to_owned()
                    } else {
                        format!("{key}={value}")
                    }
                })
                .collect();
            buf.push('?');
            buf.push_str(&rendered.join("&"));
        }
    }

    buf
}

/// Encode a canonical string into the opaque signing token carried to the
/// backend as its auth credential.
#[must_use]
pub fn signing_token(canonical: &str) -> String {
    BASE64_URL_SAFE.encode(canonical)
}

/// Extract a header value as a string, empty when absent.
fn header_value(headers: &HeaderMap, name: &str) -> String {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("")
        .to_owned()
}
