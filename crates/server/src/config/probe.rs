use serde::{Deserialize, Serialize};

/// Tuning for the Model-List Access Filter's backend probes (spec.md §4.5).
/// The retry count, timeout, and concurrency cap are spec-mandated
/// constants (see `crate::probe`); only TLS verification is
/// deployment-specific enough to belong in config.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ProbeConfig {
    /// Disabled for intra-cluster probes where the gateway is already the
    /// trust boundary (spec.md §4.5 "trust boundary the design accepts").
    pub verify_tls: bool,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self { verify_tls: true }
    }
}
