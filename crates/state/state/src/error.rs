use thiserror::Error;

/// Errors a `PolicyStore` backend can surface.
#[derive(Debug, Error)]
pub enum StateError {
    #[error("policy entry serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("backend error: {0}")]
    Backend(String),
}
