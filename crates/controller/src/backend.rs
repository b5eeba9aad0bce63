//! Backend-kind registry (spec.md §4.2 "Backend-kind dispatch"): reconciler
//! B dispatches route provisioning and status polymorphically over
//! `BackendRef::kind()`. `External` is registered as a stub per spec.md §9
//! "Reserved External backend kind" so the reconciler's `Unsupported` status
//! path is exercised even though there is only one real handler today.

use std::collections::HashMap;

use async_trait::async_trait;
use kube::Client;
use maas_core::ModelRegistration;

use crate::error::ControllerError;

/// What a backend handler resolved for a model's route.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteRef {
    pub name: String,
    pub namespace: String,
}

/// One entry in the backend-kind registry. Mirrors spec.md §4.2's three
/// operations exactly.
#[async_trait]
pub trait BackendHandler: Send + Sync {
    /// Ensures the model's HTTP route exists, returning a reference to it.
    async fn reconcile_route(&self, client: &Client, model: &ModelRegistration) -> Result<RouteRef, ControllerError>;

    /// Resolves the endpoint URL and readiness for the model's route.
    async fn status(&self, client: &Client, model: &ModelRegistration) -> Result<(String, bool), ControllerError>;

    /// Cleans up any backend-owned resources on `ModelRegistration` deletion.
    async fn cleanup_on_delete(&self, client: &Client, model: &ModelRegistration) -> Result<(), ControllerError>;
}

/// Resolves routes against an `InferenceService`-backed model: the route is
/// the in-cluster service DNS name for the referenced backend, following
/// the conventional `<name>.<namespace>.svc.cluster.local` form.
pub struct InferenceServiceHandler;

#[async_trait]
impl BackendHandler for InferenceServiceHandler {
    async fn reconcile_route(&self, _client: &Client, model: &ModelRegistration) -> Result<RouteRef, ControllerError> {
        let backend = &model.spec.backend_ref;
        Ok(RouteRef {
            name: backend.name().to_owned(),
            namespace: backend.namespace().to_owned(),
        })
    }

    async fn status(&self, _client: &Client, model: &ModelRegistration) -> Result<(String, bool), ControllerError> {
        let backend = &model.spec.backend_ref;
        let url = format!("http://{}.{}.svc.cluster.local", backend.name(), backend.namespace());
        Ok((url, true))
    }

    async fn cleanup_on_delete(&self, _client: &Client, _model: &ModelRegistration) -> Result<(), ControllerError> {
        Ok(())
    }
}

/// Reserved stub for the `External` backend kind (spec.md §3: "reserved but
/// not implemented"). Always returns `Unsupported` so callers land in
/// `phase=Failed, reason=Unsupported`.
pub struct ExternalHandler;

#[async_trait]
impl BackendHandler for ExternalHandler {
    async fn reconcile_route(&self, _client: &Client, _model: &ModelRegistration) -> Result<RouteRef, ControllerError> {
        Err(ControllerError::Unsupported("External".to_owned()))
    }

    async fn status(&self, _client: &Client, _model: &ModelRegistration) -> Result<(String, bool), ControllerError> {
        Err(ControllerError::Unsupported("External".to_owned()))
    }

    async fn cleanup_on_delete(&self, _client: &Client, _model: &ModelRegistration) -> Result<(), ControllerError> {
        Err(ControllerError::Unsupported("External".to_owned()))
    }
}

/// `kind -> handler` registry, built once at startup and shared across
/// reconciles.
pub struct BackendRegistry {
    handlers: HashMap<&'static str, Box<dyn BackendHandler>>,
}

impl BackendRegistry {
    #[must_use]
    pub fn new() -> Self {
        let mut handlers: HashMap<&'static str, Box<dyn BackendHandler>> = HashMap::new();
        handlers.insert("InferenceService", Box::new(InferenceServiceHandler));
        handlers.insert("External", Box::new(ExternalHandler));
        Self { handlers }
    }

    /// Looks up the handler for `kind`. Absence (rather than the registered
    /// `Unsupported` stub) would mean a backend kind the registry doesn't
    /// even know about, which is itself a validation error.
    pub fn get(&self, kind: &str) -> Result<&dyn BackendHandler, ControllerError> {
        self.handlers
            .get(kind)
            .map(std::convert::AsRef::as_ref)
            .ok_or_else(|| ControllerError::Validation(format!("unknown backend kind: {kind}")))
    }
}

impl Default for BackendRegistry {
    fn default() -> Self {
        Self::new()
    }
}
