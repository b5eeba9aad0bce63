use serde::{Deserialize, Serialize};

/// HTTP server bind address, namespace scope, and shutdown grace period.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Namespace the server's informer caches watch (spec.md §5, single
    /// namespace scope per deployment).
    pub namespace: String,
    pub shutdown_timeout_seconds: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_owned(),
            port: 8080,
            namespace: "default".to_owned(),
            shutdown_timeout_seconds: 10,
        }
    }
}
