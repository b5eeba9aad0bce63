//! Reconciler D: `Subscription` (spec.md §4.2).
//!
//! Structurally identical to reconciler C (§4.2's three reconcilers "follow
//! the same loop shape"); the difference is purely in which CR kind
//! triggers the recompute -- both land on the same
//! [`crate::recompute::recompute_model`] writer.

use std::sync::Arc;
use std::time::Duration;

use kube::api::{Api, Patch, PatchParams};
use kube::runtime::controller::Action;
use kube::{Client, ResourceExt};
use maas_core::{Condition, ConditionStatus, Phase, Reason, Subscription, SubscriptionStatus, reconcile_backoff};
use tracing::warn;

use crate::context::Context;
use crate::error::ControllerError;
use crate::recompute::recompute_model;

const REQUEUE_STEADY: Duration = Duration::from_secs(300);

/// # Errors
/// See [`crate::reconcile::model_registration::reconcile`].
pub async fn reconcile(subscription: Arc<Subscription>, ctx: Arc<Context>) -> Result<Action, ControllerError> {
    let name = subscription.name_any();
    let namespace = subscription.namespace().unwrap_or_else(|| ctx.namespace.clone());
    let generation = subscription.meta().generation;

    let mut seen = std::collections::HashSet::new();
    for model_ref in &subscription.spec.model_refs {
        if !seen.insert(model_ref.name.clone()) {
            return reject_duplicate(&ctx, &namespace, &name, generation, &model_ref.name).await;
        }
    }

    let mut models: Vec<&str> = subscription.spec.model_refs.iter().map(|r| r.name.as_str()).collect();
    models.sort_unstable();
    models.dedup();

    let mut first_err: Option<ControllerError> = None;
    for model in &models {
        if let Err(err) = recompute_model(&ctx, model).await {
            warn!(subscription = %name, model = %model, error = %err, "subscription_recompute_failed");
            first_err.get_or_insert(err);
        }
    }

    let status = match &first_err {
        None => SubscriptionStatus {
            phase: Phase::Ready,
            conditions: vec![Condition::ready(ConditionStatus::True, Reason::Succeeded, "aggregated", generation)],
            observed_generation: generation,
        },
        Some(err) => SubscriptionStatus {
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

/// Spec.md §3 invariant: "for any (subscription, model) pair there is
/// exactly one `{tokenLimit, window}`; the reconciler rejects duplicates."
async fn reject_duplicate(ctx: &Context, namespace: &str, name: &str, generation: Option<i64>, model: &str) -> Result<Action, ControllerError> {
    let status = SubscriptionStatus {
        phase: Phase::Failed,
        conditions: vec![Condition::ready(
            ConditionStatus::False,
            Reason::Validation,
            format!("duplicate modelRefs entry for {model}"),
            generation,
        )],
        observed_generation: generation,
    };
    write_status(&ctx.client, namespace, name, &status).await?;
    Ok(Action::await_change())
}

async fn write_status(client: &Client, namespace: &str, name: &str, status: &SubscriptionStatus) -> Result<(), ControllerError> {
    let api: Api<Subscription> = Api::namespaced(client.clone(), namespace);
    let patch = serde_json::json!({ "status": status });
    api.patch_status(name, &PatchParams::apply("maas-controller"), &Patch::Merge(&patch)).await?;
    Ok(())
}

pub fn error_policy(_subscription: Arc<Subscription>, error: &ControllerError, _ctx: Arc<Context>) -> Action {
    warn!(error = %error, "subscription_reconcile_error");
    Action::requeue(reconcile_backoff(0, rand::random()))
}
