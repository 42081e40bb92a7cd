//! Native request rewriting, the store client boundary, and response
//! translation for the gateway.
//!
//! The second half of a request's life:
//!
//! - **Rewriting** ([`native`]): translates a validated
//!   [`S3Request`](rustgate_http::S3Request) into the backend's native
//!   request shape: renamed metadata headers, the injected auth token, the
//!   `/v1/<account>/<container>/<object>` path, and a canonical sorted query
//!   string built from an explicit parameter map.
//!
//! - **Execution** ([`client`]): the [`NativeStore`](client::NativeStore)
//!   trait is the single suspension point of the whole pipeline.
//!   [`HttpNativeStore`](client::HttpNativeStore) implements it over a hyper
//!   client with a per-request timeout; transport failures surface as the
//!   service-unavailable error class and are never retried here.
//!
//! - **Translation** ([`translate`]): maps the backend's status code through
//!   per-method, per-resource tables into a success result or one typed
//!   gateway error, resolving the caller's identity along the way. Unmapped
//!   statuses are loud internal errors, never silently swallowed.

pub mod client;
pub mod native;
pub mod translate;

pub use client::{HttpNativeStore, NativeResponse, NativeStore, StoreError};
pub use native::{NativeRequest, to_native_request};
pub use translate::get_response;
