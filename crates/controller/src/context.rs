use std::sync::Arc;

use kube::Client;
use maas_state::PolicyStore;

use crate::backend::BackendRegistry;

/// Shared context threaded through every reconciler (spec.md §4.2).
pub struct Context {
    pub client: Client,
    pub store: Arc<dyn PolicyStore>,
    pub backends: BackendRegistry,
    /// Kubernetes namespace all three CR kinds are reconciled within.
    pub namespace: String,
}

impl Context {
    #[must_use]
    pub fn new(client: Client, store: Arc<dyn PolicyStore>, namespace: impl Into<String>) -> Arc<Self> {
        Arc::new(Self {
            client,
            store,
            backends: BackendRegistry::new(),
            namespace: namespace.into(),
        })
    }
}
