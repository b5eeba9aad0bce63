//! Finalizer / Cascade Manager (component E, spec.md §4.3).
//!
//! Not a standalone controller -- there is nothing for it to watch
//! independently. It is cascade-delete logic invoked from reconciler B's
//! `ModelRegistration` reconcile when a deletion timestamp is observed.

use kube::api::{Api, Patch, PatchParams};
use kube::{Client, ResourceExt};
use maas_core::ModelRegistration;
use maas_state::{PolicyKey, PolicyStore};

use crate::error::ControllerError;

pub const FINALIZER: &str = "maas.dev/cascade";

#[must_use]
pub fn has_finalizer(model: &ModelRegistration) -> bool {
    model.metadata.finalizers.as_ref().is_some_and(|f| f.iter().any(|s| s == FINALIZER))
}

/// Adds the finalizer via a merge patch, idempotent if already present.
///
/// A JSON merge patch replaces the whole `finalizers` array rather than
/// splicing into it, so the array written here is the model's *current*
/// list with `FINALIZER` appended -- any finalizer another controller
/// placed on this `ModelRegistration` is preserved.
///
/// # Errors
/// Propagates Kubernetes API errors as `ControllerError::Kube`.
pub async fn add_finalizer(client: &Client, namespace: &str, model: &ModelRegistration) -> Result<(), ControllerError> {
    if has_finalizer(model) {
        return Ok(());
    }
    let finalizers = with_finalizer_added(model.metadata.finalizers.as_deref());

    let api: Api<ModelRegistration> = Api::namespaced(client.clone(), namespace);
    let patch = serde_json::json!({ "metadata": { "finalizers": finalizers } });
    api.patch(&model.name_any(), &PatchParams::apply("maas-controller"), &Patch::Merge(&patch)).await?;
    Ok(())
}

fn with_finalizer_added(existing: Option<&[String]>) -> Vec<String> {
    let mut finalizers = existing.map(<[String]>::to_vec).unwrap_or_default();
    finalizers.push(FINALIZER.to_owned());
    finalizers
}

fn with_finalizer_removed(existing: Option<&[String]>) -> Vec<String> {
    existing.unwrap_or_default().iter().filter(|f| f.as_str() != FINALIZER).cloned().collect()
}

/// Removes the finalizer via a merge patch. Step 3 of spec.md §4.3,
/// "retried on conflict" by virtue of the reconciler's own error/requeue
/// loop -- a conflict here surfaces as `ControllerError::Kube` and the
/// caller's `error_policy` requeues.
///
/// Writes back the model's current `finalizers` list with only `FINALIZER`
/// removed, rather than overwriting the whole array, so any finalizer
/// another controller placed here is left untouched.
///
/// # Errors
/// Propagates Kubernetes API errors as `ControllerError::Kube`.
pub async fn remove_finalizer(client: &Client, namespace: &str, model: &ModelRegistration) -> Result<(), ControllerError> {
    let finalizers = with_finalizer_removed(model.metadata.finalizers.as_deref());

    let api: Api<ModelRegistration> = Api::namespaced(client.clone(), namespace);
    let patch = serde_json::json!({ "metadata": { "finalizers": finalizers } });
    api.patch(&model.name_any(), &PatchParams::apply("maas-controller"), &Patch::Merge(&patch)).await?;
    Ok(())
}

/// Enumerates and deletes every generated policy entry tagged with
/// `model_name` in `namespace`, then removes the finalizer once none
/// remain. Order among the deletes is deliberately unspecified (spec.md
/// §4.3 step 2).
///
/// # Errors
/// Propagates store errors and Kubernetes API errors from the finalizer patch.
pub async fn cascade_delete(
    client: &Client,
    store: &dyn PolicyStore,
    namespace: &str,
    model: &ModelRegistration,
) -> Result<(), ControllerError> {
    let model_name = &model.spec.model_name;
    let key = PolicyKey::new(namespace, model_name);
    store.delete(&key).await?;

    if has_finalizer(model) {
        remove_finalizer(client, namespace, model).await?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use maas_core::{AuthDocument, RateLimitDocument};
    use maas_state::PolicyEntry;
    use maas_state_memory::MemoryPolicyStore;

    use super::*;

    #[tokio::test]
    async fn cascade_delete_removes_generated_entry() {
        let store = MemoryPolicyStore::new();
        let key = PolicyKey::new("ns", "gpt-oss-20b");
        store
            .set(&key, PolicyEntry::new(AuthDocument::new("gpt-oss-20b", vec![]), RateLimitDocument::new("gpt-oss-20b", vec![]), 1))
            .await
            .unwrap();
        assert!(store.get(&key).await.unwrap().is_some());
        store.delete(&key).await.unwrap();
        assert!(store.get(&key).await.unwrap().is_none());
    }

    #[test]
    fn with_finalizer_added_preserves_other_finalizers() {
        let existing = vec!["other.controller/cleanup".to_owned()];
        let finalizers = with_finalizer_added(Some(&existing));
        assert_eq!(finalizers, vec!["other.controller/cleanup".to_owned(), FINALIZER.to_owned()]);
    }

    #[test]
    fn with_finalizer_added_from_none() {
        assert_eq!(with_finalizer_added(None), vec![FINALIZER.to_owned()]);
    }

    #[test]
    fn with_finalizer_removed_preserves_other_finalizers() {
        let existing = vec!["other.controller/cleanup".to_owned(), FINALIZER.to_owned()];
        let finalizers = with_finalizer_removed(Some(&existing));
        assert_eq!(finalizers, vec!["other.controller/cleanup".to_owned()]);
    }

    #[test]
    fn with_finalizer_removed_from_none_is_empty() {
        assert!(with_finalizer_removed(None).is_empty());
    }
}
