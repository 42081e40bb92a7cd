//! Error types for the gateway.
//!
//! Every protocol violation and every classified backend failure resolves to
//! one [`GatewayError`] variant. Each variant carries the parameters needed to
//! render a correct client-facing message and maps to a machine-readable error
//! code plus an outward HTTP status. The taxonomy is closed: downstream layers
//! match exhaustively on it.

use http::StatusCode;

/// Convenience result type for gateway operations.
pub type GatewayResult<T> = Result<T, GatewayError>;

/// A typed gateway error.
///
/// Variants are pure data; the response-serialization layer turns them into
/// wire-level status and body via [`code`](GatewayError::code),
/// [`status_code`](GatewayError::status_code), and
/// [`resource`](GatewayError::resource).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GatewayError {
    /// The request is not authorized to perform the operation.
    #[error("access denied")]
    AccessDenied,

    /// A pre-signed request's expiry time has passed.
    #[error("request has expired")]
    RequestExpired,

    /// A header or parameter carried a value the protocol does not allow.
    #[error("invalid argument {name}={value}: {message}")]
    InvalidArgument {
        /// Name of the offending header or parameter.
        name: String,
        /// The value as received.
        value: String,
        /// Human-readable reason.
        message: String,
    },

    /// The `Content-MD5` header was empty or not valid base64.
    #[error("the Content-MD5 you specified was invalid")]
    InvalidDigest,

    /// The request `Date` is more than five minutes from the current time.
    #[error("the difference between the request time and the current time is too large")]
    RequestTimeTooSkewed,

    /// The backend rejected the signing token.
    #[error("the request signature we calculated does not match the signature you provided")]
    SignatureDoesNotMatch,

    /// The backend is unreachable, timed out, or returned 503.
    #[error("service unavailable")]
    ServiceUnavailable,

    /// A bucket-create collided with an existing bucket.
    #[error("bucket {bucket} already exists")]
    BucketAlreadyExists {
        /// The bucket that already exists.
        bucket: String,
    },

    /// A bucket-delete was attempted on a non-empty bucket.
    #[error("the bucket you tried to delete is not empty")]
    BucketNotEmpty,

    /// The proposed upload exceeds the maximum allowed object size.
    #[error("the proposed upload exceeds the maximum allowed object size")]
    EntityTooLarge,

    /// The named bucket does not exist.
    #[error("the specified bucket {bucket} does not exist")]
    NoSuchBucket {
        /// The bucket that was requested.
        bucket: String,
    },

    /// The named object does not exist.
    #[error("the specified key {key} does not exist")]
    NoSuchKey {
        /// The object key that was requested.
        key: String,
    },

    /// A conditional request's precondition did not hold.
    #[error("at least one of the preconditions you specified did not hold")]
    PreconditionFailed,

    /// The requested byte range cannot be satisfied.
    #[error("the requested range is not satisfiable")]
    InvalidRange,

    /// The request requires a `Content-Length` header.
    #[error("you must provide the Content-Length HTTP header")]
    MissingContentLength,

    /// A storage class other than the single supported one was requested.
    #[error("the storage class you specified is not valid")]
    InvalidStorageClass,

    /// The request asked for a feature this gateway does not implement.
    #[error("{feature}")]
    NotImplemented {
        /// Description of the unsupported feature.
        feature: String,
    },

    /// The backend considered the rewritten request malformed (backend 400).
    #[error("the backend rejected the request: {reason}")]
    BadBackendRequest {
        /// The backend's response body.
        reason: String,
    },

    /// A programming-error signal: an unexpected, unmapped condition.
    #[error("internal error: {message}")]
    Internal {
        /// What went wrong.
        message: String,
    },
}

impl GatewayError {
    /// Machine-readable error code string, as exposed to clients.
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::AccessDenied | Self::RequestExpired => "AccessDenied",
            Self::InvalidArgument { .. } => "InvalidArgument",
            Self::InvalidDigest => "InvalidDigest",
            Self::RequestTimeTooSkewed => "RequestTimeTooSkewed",
            Self::SignatureDoesNotMatch => "SignatureDoesNotMatch",
            Self::ServiceUnavailable => "ServiceUnavailable",
            Self::BucketAlreadyExists { .. } => "BucketAlreadyExists",
            Self::BucketNotEmpty => "BucketNotEmpty",
            Self::EntityTooLarge => "EntityTooLarge",
            Self::NoSuchBucket { .. } => "NoSuchBucket",
            Self::NoSuchKey { .. } => "NoSuchKey",
            Self::PreconditionFailed => "PreconditionFailed",
            Self::InvalidRange => "InvalidRange",
            Self::MissingContentLength => "MissingContentLength",
            Self::InvalidStorageClass => "InvalidStorageClass",
            Self::NotImplemented { .. } => "NotImplemented",
            Self::BadBackendRequest { .. } => "InvalidRequest",
            Self::Internal { .. } => "InternalError",
        }
    }

    /// The outward HTTP status for this error.
    #[must_use]
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidArgument { .. }
            | Self::InvalidDigest
            | Self::EntityTooLarge
            | Self::InvalidStorageClass
            | Self::BadBackendRequest { .. } => StatusCode::BAD_REQUEST,
            Self::AccessDenied
            | Self::RequestExpired
            | Self::RequestTimeTooSkewed
            | Self::SignatureDoesNotMatch => StatusCode::FORBIDDEN,
            Self::NoSuchBucket { .. } | Self::NoSuchKey { .. } => StatusCode::NOT_FOUND,
            Self::BucketAlreadyExists { .. } | Self::BucketNotEmpty => StatusCode::CONFLICT,
            Self::MissingContentLength => StatusCode::LENGTH_REQUIRED,
            Self::PreconditionFailed => StatusCode::PRECONDITION_FAILED,
            Self::InvalidRange => StatusCode::RANGE_NOT_SATISFIABLE,
            Self::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            Self::NotImplemented { .. } => StatusCode::NOT_IMPLEMENTED,
            Self::ServiceUnavailable => StatusCode::SERVICE_UNAVAILABLE,
        }
    }

    /// The resource (bucket or object name) this error is about, if any.
    #[must_use]
    pub fn resource(&self) -> Option<&str> {
        match self {
            Self::BucketAlreadyExists { bucket } | Self::NoSuchBucket { bucket } => Some(bucket),
            Self::NoSuchKey { key } => Some(key),
            _ => None,
        }
    }

    /// Create an invalid-argument error with the default reason.
    #[must_use]
    pub fn invalid_argument(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self::InvalidArgument {
            name: name.into(),
            value: value.into(),
            message: "Invalid Argument.".to_owned(),
        }
    }

    /// Create an invalid-argument error with an explicit reason.
    #[must_use]
    pub fn invalid_argument_with(
        name: impl Into<String>,
        value: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::InvalidArgument {
            name: name.into(),
            value: value.into(),
            message: message.into(),
        }
    }

    /// Create a no-such-bucket error naming the bucket.
    #[must_use]
    pub fn no_such_bucket(bucket: impl Into<String>) -> Self {
        Self::NoSuchBucket {
            bucket: bucket.into(),
        }
    }

    /// Create a no-such-key error naming the object.
    #[must_use]
    pub fn no_such_key(key: impl Into<String>) -> Self {
        Self::NoSuchKey { key: key.into() }
    }

    /// Create a bucket-already-exists error naming the bucket.
    #[must_use]
    pub fn bucket_already_exists(bucket: impl Into<String>) -> Self {
        Self::BucketAlreadyExists {
            bucket: bucket.into(),
        }
    }

    /// Create a not-implemented error describing the unsupported feature.
    #[must_use]
    pub fn not_implemented(feature: impl Into<String>) -> Self {
        Self::NotImplemented {
            feature: feature.into(),
        }
    }

    /// Create an internal error. Internal errors are programming-error
    /// signals and should be loud, never swallowed.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }
}

/// The outcome of deciding whether an inbound request speaks this protocol.
///
/// A request without AWS-style authorization is not an error: the caller may
/// delegate it to another middleware. Everything else is a genuine protocol
/// violation carried as a [`GatewayError`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RecognizeError {
    /// The request carries no AWS-style authorization; it belongs to someone
    /// else's protocol and should be passed along, not failed.
    #[error("request does not carry AWS-style authorization")]
    NotS3Request,

    /// The request is ours but violates the protocol.
    #[error(transparent)]
    Gateway(#[from] GatewayError),
}
