use thiserror::Error;

/// Error taxonomy for the reconcile loops (spec.md §7), narrowed to the
/// subset a controller can raise: `ValidationError`, `Unsupported`,
/// `Transient`, and `Fatal` all apply here; `Denied`/`NotFound` are
/// hot-path-only and live in `maas-server`.
#[derive(Debug, Error)]
pub enum ControllerError {
    #[error("validation failed: {0}")]
    Validation(String),

    /// Backend kind has no registered handler (spec.md §4.2's `External`
    /// stub returns this).
    #[error("backend kind not implemented: {0}")]
    Unsupported(String),

    /// Kubernetes API error, store conflict, or any other condition that
    /// clears itself on retry. Recovered locally with backoff, never
    /// surfaced past the reconciler (spec.md §7 "Propagation policy").
    #[error("transient error: {0}")]
    Transient(String),

    #[error(transparent)]
    Kube(#[from] kube::Error),

    #[error("state store error: {0}")]
    Store(#[from] maas_state::StateError),
}

impl ControllerError {
    #[must_use]
    pub fn is_unsupported(&self) -> bool {
        matches!(self, Self::Unsupported(_))
    }

    #[must_use]
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }

    /// The typed `reason` a reconciler attaches to its `Ready` condition for
    /// this error (spec.md §4.2).
    #[must_use]
    pub fn reason(&self) -> maas_core::Reason {
        match self {
            Self::Validation(_) => maas_core::Reason::Validation,
            Self::Unsupported(_) => maas_core::Reason::Unsupported,
            Self::Transient(_) | Self::Kube(_) | Self::Store(_) => maas_core::Reason::ReconcileFailed,
        }
    }
}
