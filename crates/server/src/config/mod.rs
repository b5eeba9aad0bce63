//! TOML configuration layer (spec.md §6), grounded on the teacher's
//! `config/` module: a root `ServerConfig` loaded from `maas.toml`, with
//! `clap` CLI flags overriding `host`/`port`/`config path`.

pub mod probe;
pub mod server;

pub use probe::ProbeConfig;
pub use server::ServerConfig;

use std::path::Path;

use serde::{Deserialize, Serialize};

/// Top-level config document; everything else nests under it.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub probe: ProbeConfig,
    #[serde(default)]
    pub auth: AuthConfig,
}

/// Auth/signing material. `token_signing_secret` follows the teacher's
/// `ENC[...]`-capable config-secret convention via `maas-crypto`; it is
/// decrypted once at startup if wrapped.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct AuthConfig {
    pub token_signing_secret: String,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self { token_signing_secret: "dev-only-insecure-signing-secret".to_owned() }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read { path: String, source: std::io::Error },
    #[error("failed to parse config file {path}: {source}")]
    Parse { path: String, source: toml::de::Error },
}

impl AppConfig {
    /// Loads `maas.toml` (or the given path) if present, else returns
    /// built-in defaults -- config is optional in dev, following the
    /// teacher's `config::load` fallback behavior.
    ///
    /// # Errors
    /// Returns `ConfigError` if the file exists but is unreadable or
    /// malformed.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read { path: path.display().to_string(), source })?;
        toml::from_str(&raw).map_err(|source| ConfigError::Parse { path: path.display().to_string(), source })
    }
}
