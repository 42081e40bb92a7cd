//! Inbound request model, header validation, and handler dispatch.
//!
//! This crate owns the first half of a request's life:
//!
//! - **Request construction** ([`request`]): builds an [`S3Request`] from raw
//!   HTTP request parts. Construction authenticates (credential extraction),
//!   recovers the bucket from virtual-hosted addressing, splits the resource
//!   path, validates protocol preconditions in a fixed order, and computes the
//!   signing token exactly once. Any violation aborts construction with a
//!   typed failure.
//!
//! - **Dispatch** ([`router`]): a pure function from the validated request's
//!   resource identifiers and query parameters to a closed [`HandlerKind`]
//!   enumeration, evaluated as a fixed priority list. The same final rule
//!   yields the [`ResourceKind`] that drives backend status translation.
//!
//! Resource-specific handlers themselves live behind this boundary and are
//! not part of this crate.

pub mod request;
pub mod router;

pub use request::S3Request;
pub use router::{HandlerKind, ResourceKind, dispatch};
