//! Credential extraction from the `Authorization` header or pre-signed query.
//!
//! The header value has the format `AWS <AccessKeyId>:<Signature>`. A missing
//! header or an unrecognized scheme means the request belongs to some other
//! protocol and is reported as [`RecognizeError::NotS3Request`] so the caller
//! can delegate; only a malformed header on a request that *is* ours becomes a
//! protocol error.
//!
//! Pre-signed requests carry `AWSAccessKeyId`, `Signature`, and `Expires` as
//! query parameters instead. Those are rewritten into equivalent `Date` and
//! `Authorization` headers up front, so that expiry validation and the
//! canonical string both see the same request a header-authenticated client
//! would have sent.

use http::HeaderMap;
use http::header::{AUTHORIZATION, DATE, HeaderValue};
use rustgate_core::{GatewayError, RecognizeError};
use tracing::debug;

/// The credential pair extracted from a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    /// The client's access key id. May itself contain colons.
    pub access_key: String,
    /// The base64 request signature. Never contains a colon.
    pub signature: String,
}

/// Extract the credential pair from the request.
///
/// When the pre-signed query form is in use, this synthesizes `Date` and
/// `Authorization` headers into `headers` before falling through to
/// header-based parsing; later validation and signing stages observe the
/// synthesized entries.
///
/// # Errors
///
/// Returns [`RecognizeError::NotS3Request`] when the request carries no
/// `Authorization` header or an unrecognized scheme, and a
/// [`GatewayError`] for requests that are ours but malformed.
pub fn extract_credentials(
    headers: &mut HeaderMap,
    query_params: &[(String, String)],
) -> Result<Credentials, RecognizeError> {
    if let Some(access_key_id) = query_value(query_params, "AWSAccessKeyId") {
        let signature =
            query_value(query_params, "Signature").ok_or(GatewayError::AccessDenied)?;
        let expires = query_value(query_params, "Expires").ok_or(GatewayError::AccessDenied)?;

        debug!(access_key_id, "synthesizing headers for pre-signed request");

        // The expiry stands in for the Date header: it drives both the
        // expiration check and the date line of the canonical string.
        headers.insert(
            DATE,
            HeaderValue::from_str(expires).map_err(|_| GatewayError::AccessDenied)?,
        );
        let auth = format!("AWS {access_key_id}:{signature}");
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&auth).map_err(|_| GatewayError::AccessDenied)?,
        );
    }

    let Some(auth_header) = headers.get(AUTHORIZATION) else {
        return Err(RecognizeError::NotS3Request);
    };
    let auth_header = auth_header
        .to_str()
        .map_err(|_| GatewayError::AccessDenied)?;

    let Some((scheme, info)) = auth_header.split_once(' ') else {
        return Err(GatewayError::AccessDenied.into());
    };

    if scheme != "AWS" {
        return Err(RecognizeError::NotS3Request);
    }

    // The signature is base64 and never contains a colon; the access key may.
    let Some((access_key, signature)) = info.rsplit_once(':') else {
        return Err(GatewayError::invalid_argument_with(
            "Authorization",
            auth_header,
            "AWS authorization header is invalid.  Expected AwsAccessKeyId:signature",
        )
        .into());
    };

    Ok(Credentials {
        access_key: access_key.to_owned(),
        signature: signature.to_owned(),
    })
}

/// Look up a query parameter value by exact key.
fn query_value<'a>(params: &'a [(String, String)], key: &str) -> Option<&'a str> {
    params
        .iter()
        .find(|(k, _)| k == key)
        .map(|(_, v)| v.as_str())
}
