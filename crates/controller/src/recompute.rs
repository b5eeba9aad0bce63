//! Shared recompute step used by reconcilers C and D (spec.md §4.2 step 3).
//!
//! `maas_policy::aggregate` is a joint pure function over *all*
//! `AccessPolicy` and `Subscription` objects targeting a model -- it always
//! produces the auth document and the rate-limit document together, since
//! both read the same sorted input sets. Rather than have C only ever
//! touch `PolicyEntry.auth` and D only ever touch `.rate_limit` (which
//! would let the two halves of one model's entry drift to different
//! input snapshots under concurrent reconciles), both reconcilers call this
//! same function and `compare_and_swap` the whole entry. This is the
//! resolution to spec.md's "many-to-many aggregation" requirement recorded
//! in DESIGN.md: one writer path, shared by both trigger kinds, keeps the
//! two documents mutually consistent.

use kube::Api;
use kube::ResourceExt;
use kube::api::ListParams;
use maas_core::{AccessPolicy, Subscription};
use maas_policy::{PolicySource, SubscriptionSource, aggregate};
use maas_state::{CasResult, PolicyEntry, PolicyKey, PolicyStore};

use crate::context::Context;
use crate::error::ControllerError;

/// Lists every `AccessPolicy`/`Subscription` in `namespace` that references
/// `model`, recomputes the aggregated pair, and writes it through
/// compare-and-swap if it differs from what's stored (skipping `managed=false`
/// entries per spec.md §4.2 step 4).
///
/// # Errors
/// Propagates Kubernetes list errors and store errors.
pub async fn recompute_model(ctx: &Context, model: &str) -> Result<(), ControllerError> {
    let policy_api: Api<AccessPolicy> = Api::namespaced(ctx.client.clone(), &ctx.namespace);
    let sub_api: Api<Subscription> = Api::namespaced(ctx.client.clone(), &ctx.namespace);

    let mut policies: Vec<PolicySource> = policy_api
        .list(&ListParams::default())
        .await?
        .into_iter()
        .filter(|p| p.spec.model_refs.iter().any(|r| r.name == model))
        .map(|p| PolicySource {
            name: p.name_any(),
            spec: p.spec,
        })
        .collect();
    policies.sort_by(|a, b| a.name.cmp(&b.name));

    let mut subscriptions: Vec<SubscriptionSource> = sub_api
        .list(&ListParams::default())
        .await?
        .into_iter()
        .filter(|s| s.spec.model_ref(model).is_some())
        .map(|s| SubscriptionSource {
            name: s.name_any(),
            spec: s.spec,
        })
        .collect();
    subscriptions.sort_by(|a, b| a.name.cmp(&b.name));

    let (auth, rate_limit) = aggregate(model, &policies, &subscriptions);

    let key = PolicyKey::new(&ctx.namespace, model);
    let current = ctx.store.get(&key).await?;

    if let Some(existing) = &current {
        if !existing.managed {
            return Ok(());
        }
        if existing.auth == auth && existing.rate_limit == rate_limit {
            return Ok(());
        }
    }

    let expected_version = current.as_ref().map_or(0, |e| e.version);
    let next_version = expected_version + 1;
    let entry = PolicyEntry::new(auth, rate_limit, next_version);

    match ctx.store.compare_and_swap(&key, expected_version, entry).await? {
        CasResult::Ok => Ok(()),
        CasResult::Conflict { .. } => Err(ControllerError::Transient(format!("policy entry for {model} changed concurrently"))),
    }
}
