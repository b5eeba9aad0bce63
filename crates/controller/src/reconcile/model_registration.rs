//! Reconciler B: `ModelRegistration` (spec.md §4.2).

use std::sync::Arc;
use std::time::Duration;

use kube::api::{Api, Patch, PatchParams};
use kube::runtime::controller::Action;
use kube::{Client, ResourceExt};
use maas_core::{Condition, ConditionStatus, ModelRegistration, ModelRegistrationStatus, Phase, Reason, reconcile_backoff};
use tracing::{info, warn};

use crate::context::Context;
use crate::error::ControllerError;
use crate::finalizer::{add_finalizer, cascade_delete, has_finalizer};

const REQUEUE_READY: Duration = Duration::from_secs(300);

/// # Errors
/// Never returns `Err` directly -- all failures are folded into a status
/// write and a backoff requeue, per spec.md §7's reconciler propagation
/// policy. The `Result` exists to surface genuinely unrecoverable
/// Kubernetes API failures on the status write itself.
pub async fn reconcile(model: Arc<ModelRegistration>, ctx: Arc<Context>) -> Result<Action, ControllerError> {
    let name = model.name_any();
    let namespace = model.namespace().unwrap_or_else(|| ctx.namespace.clone());

    if model.meta().deletion_timestamp.is_some() {
        info!(model = %name, "model_registration_deleting");
        cascade_delete(&ctx.client, ctx.store.as_ref(), &namespace, &model).await?;
        return Ok(Action::await_change());
    }

    if !has_finalizer(&model) {
        add_finalizer(&ctx.client, &namespace, &model).await?;
    }

    let generation = model.meta().generation;
    let already_reconciled = model.status.as_ref().and_then(|s| s.observed_generation) == generation;
    if already_reconciled {
        return Ok(Action::requeue(REQUEUE_READY));
    }

    let kind = model.spec.backend_ref.kind();
    let outcome = dispatch(&ctx, &model, &namespace).await;

    let status = match outcome {
        Ok((endpoint_url, ready)) => ModelRegistrationStatus {
            phase: if ready { Phase::Ready } else { Phase::Pending },
            endpoint_url: Some(endpoint_url),
            conditions: vec![Condition::ready(
                ConditionStatus::True,
                Reason::Succeeded,
                format!("backend kind {kind} reconciled"),
                generation,
            )],
            observed_generation: generation,
        },
        Err(ref err) if err.is_unsupported() => ModelRegistrationStatus {
            phase: Phase::Failed,
            endpoint_url: None,
            conditions: vec![Condition::ready(
                ConditionStatus::False,
                Reason::Unsupported,
                format!("backend kind {kind} is not implemented"),
                generation,
            )],
            observed_generation: generation,
        },
        Err(ref err) => ModelRegistrationStatus {
            phase: Phase::Failed,
            endpoint_url: None,
            conditions: vec![Condition::ready(ConditionStatus::False, err.reason(), err.to_string(), generation)],
            observed_generation: generation,
        },
    };

    write_status(&ctx.client, &namespace, &name, &status).await?;

    match outcome {
        Ok(_) => Ok(Action::requeue(REQUEUE_READY)),
        Err(err) if err.is_unsupported() || err.is_validation() => Ok(Action::await_change()),
        Err(_) => Ok(Action::requeue(reconcile_backoff(0, rand::random()))),
    }
}

async fn dispatch(ctx: &Context, model: &ModelRegistration, namespace: &str) -> Result<(String, bool), ControllerError> {
    let handler = ctx.backends.get(model.spec.backend_ref.kind())?;
    handler.reconcile_route(&ctx.client, model).await?;
    handler.status(&ctx.client, model).await
}

async fn write_status(client: &Client, namespace: &str, name: &str, status: &ModelRegistrationStatus) -> Result<(), ControllerError> {
    let api: Api<ModelRegistration> = Api::namespaced(client.clone(), namespace);
    let patch = serde_json::json!({ "status": status });
    api.patch_status(name, &PatchParams::apply("maas-controller"), &Patch::Merge(&patch)).await?;
    Ok(())
}

pub fn error_policy(_model: Arc<ModelRegistration>, error: &ControllerError, _ctx: Arc<Context>) -> Action {
    warn!(error = %error, "model_registration_reconcile_error");
    Action::requeue(reconcile_backoff(0, rand::random()))
}
