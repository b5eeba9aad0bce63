//! Reconciler C: `AccessPolicy` (spec.md §4.2).

use std::sync::Arc;
use std::time::Duration;

use kube::api::{Api, Patch, PatchParams};
use kube::runtime::controller::Action;
use kube::{Client, ResourceExt};
use maas_core::{AccessPolicy, AccessPolicyStatus, Condition, ConditionStatus, Phase, Reason, reconcile_backoff};
use tracing::warn;

use crate::context::Context;
use crate::error::ControllerError;
use crate::recompute::recompute_model;

const REQUEUE_STEADY: Duration = Duration::from_secs(300);

/// # Errors
/// See [`crate::reconcile::model_registration::reconcile`] -- failures are
/// folded into the status write, not propagated.
pub async fn reconcile(policy: Arc<AccessPolicy>, ctx: Arc<Context>) -> Result<Action, ControllerError> {
    let name = policy.name_any();
    let namespace = policy.namespace().unwrap_or_else(|| ctx.namespace.clone());
    let generation = policy.meta().generation;

    let mut models: Vec<&str> = policy.spec.model_refs.iter().map(|r| r.name.as_str()).collect();
    models.sort_unstable();
    models.dedup();

    let mut first_err: Option<ControllerError> = None;
    for model in &models {
        if let Err(err) = recompute_model(&ctx, model).await {
            warn!(policy = %name, model = %model, error = %err, "access_policy_recompute_failed");
            first_err.get_or_insert(err);
        }
    }

    let status = match &first_err {
        None => AccessPolicyStatus {
            phase: Phase::Ready,
            conditions: vec![Condition::ready(ConditionStatus::True, Reason::Succeeded, "aggregated", generation)],
            observed_generation: generation,
        },
        Some(err) => AccessPolicyStatus {
            phase: Phase::Failed,
            conditions: vec![Condition::ready(ConditionStatus::False, err.reason(), err.to_string(), generation)],
            observed_generation: generation,
        },
    };

    write_status(&ctx.client, &namespace, &name, &status).await?;

    match first_err {
        None => Ok(Action::requeue(REQUEUE_STEADY)),
        Some(_) => Ok(Action::requeue(reconcile_backoff(0, rand::random()))),
    }
}

async fn write_status(client: &Client, namespace: &str, name: &str, status: &AccessPolicyStatus) -> Result<(), ControllerError> {
    let api: Api<AccessPolicy> = Api::namespaced(client.clone(), namespace);
    let patch = serde_json::json!({ "status": status });
    api.patch_status(name, &PatchParams::apply("maas-controller"), &Patch::Merge(&patch)).await?;
    Ok(())
}

pub fn error_policy(_policy: Arc<AccessPolicy>, error: &ControllerError, _ctx: Arc<Context>) -> Action {
    warn!(error = %error, "access_policy_reconcile_error");
    Action::requeue(reconcile_backoff(0, rand::random()))
}
