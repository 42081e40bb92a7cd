//! Authorization extraction and canonical-string signing for the gateway.
//!
//! Inbound requests authenticate with the legacy AWS header scheme:
//!
//! ```text
//! Authorization: AWS <AccessKeyId>:<Signature>
//! ```
//!
//! or the equivalent pre-signed query form (`AWSAccessKeyId`, `Signature`,
//! `Expires`). This crate pulls the credential pair out of either form
//! ([`authorization`]) and builds the deterministic string-to-sign from the
//! request ([`canonical`]). The gateway never verifies the signature itself;
//! it derives an opaque signing token from the canonical string and forwards
//! it to the backend's authentication collaborator, which owns the secret
//! keys. The canonical string must therefore match what a correct client
//! computed byte for byte, or all authentication fails downstream.

pub mod authorization;
pub mod canonical;

pub use authorization::{Credentials, extract_credentials};
pub use canonical::{SIGNED_SUB_RESOURCES, canonical_string, signing_token};
