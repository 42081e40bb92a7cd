//! Configuration and the typed error vocabulary for the rustgate gateway.
//!
//! This crate provides the foundational pieces shared by every layer of the
//! gateway: the immutable [`GatewayConfig`] passed explicitly into the
//! components that need it, and the closed [`GatewayError`] taxonomy that
//! every protocol violation and backend failure resolves to.

mod config;
mod error;

pub use config::GatewayConfig;
pub use error::{GatewayError, GatewayResult, RecognizeError};
