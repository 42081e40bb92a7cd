//! Gateway configuration.
//!
//! All configuration is driven by environment variables. The config value is
//! immutable after startup and is passed explicitly into the components that
//! consume it; there is no ambient global lookup.

/// Process-wide configuration for the gateway.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GatewayConfig {
    /// Domain suffix for virtual-hosted-style bucket addressing
    /// (e.g. `example.com` lets `mybucket.example.com` name a bucket).
    /// `None` disables host-based bucket recovery entirely.
    pub storage_domain: Option<String>,
    /// Base URL of the native object store, e.g. `http://127.0.0.1:8080`.
    pub backend_endpoint: String,
    /// Per-request timeout for backend calls, in seconds.
    pub backend_timeout_secs: u64,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            storage_domain: None,
            backend_endpoint: "http://127.0.0.1:8080".to_owned(),
            backend_timeout_secs: 60,
        }
    }
}

impl GatewayConfig {
    /// Load configuration from environment variables.
    #[must_use]
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(v) = std::env::var("STORAGE_DOMAIN") {
            config.storage_domain = if v.is_empty() { None } else { Some(v) };
        }
        if let Ok(v) = std::env::var("BACKEND_ENDPOINT") {
            config.backend_endpoint = v;
        }
        if let Ok(v) = std::env::var("BACKEND_TIMEOUT_SECS") {
            if let Ok(secs) = v.parse() {
                config.backend_timeout_secs = secs;
            }
        }

        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_should_create_default_config() {
        let config = GatewayConfig::default();
        assert!(config.storage_domain.is_none());
        assert_eq!(config.backend_endpoint, "http://127.0.0.1:8080");
        assert_eq!(config.backend_timeout_secs, 60);
    }
}
