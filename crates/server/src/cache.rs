//! Informer caches backing the Subscription Selector (F) and Model-List
//! Access Filter (G) (spec.md §4.4, §4.5, §5 "Cache freshness").
//!
//! All reads in F and G go through these reflector-backed caches, never the
//! Kubernetes API directly, to meet hot-path latency. `maas-server` keeps
//! its own caches independent of `maas-controller`'s -- they are separate
//! processes/binaries -- each populated by its own `watcher` stream.

use futures::StreamExt;
use kube::runtime::reflector::{self, Store};
use kube::runtime::watcher;
use kube::{Api, Client};
use maas_core::{AccessPolicy, ModelRegistration, Subscription};
use tracing::{error, info};

/// The three reflector stores `maas-server`'s handlers read from.
#[derive(Clone)]
pub struct Caches {
    pub models: Store<ModelRegistration>,
    pub access_policies: Store<AccessPolicy>,
    pub subscriptions: Store<Subscription>,
}

impl Caches {
    /// Spawns one watcher task per kind and returns the caches once each
    /// has completed its initial list (so handlers never read an empty
    /// cache right after startup).
    pub async fn start(client: Client, namespace: &str) -> Self {
        let (models, models_writer) = reflector::store();
        let (access_policies, ap_writer) = reflector::store();
        let (subscriptions, sub_writer) = reflector::store();

        let mr_api: Api<ModelRegistration> = Api::namespaced(client.clone(), namespace);
        let ap_api: Api<AccessPolicy> = Api::namespaced(client.clone(), namespace);
        let sub_api: Api<Subscription> = Api::namespaced(client.clone(), namespace);

        spawn_reflector("model_registration", mr_api, models_writer);
        spawn_reflector("access_policy", ap_api, ap_writer);
        spawn_reflector("subscription", sub_api, sub_writer);

        models.wait_until_ready().await.ok();
        access_policies.wait_until_ready().await.ok();
        subscriptions.wait_until_ready().await.ok();

        info!(namespace, "maas-server informer caches ready");

        Self { models, access_policies, subscriptions }
    }
}

fn spawn_reflector<K>(label: &'static str, api: Api<K>, writer: reflector::store::Writer<K>)
where
    K: kube::Resource + Clone + std::fmt::Debug + Send + Sync + 'static + serde::de::DeserializeOwned,
    K::DynamicType: Default + Eq + std::hash::Hash + Clone,
{
    let stream = reflector::reflector(writer, watcher::watcher(api, watcher::Config::default()));
    tokio::spawn(async move {
        let mut stream = Box::pin(stream);
        while let Some(event) = stream.next().await {
            if let Err(err) = event {
                error!(kind = label, error = %err, "informer_watch_error");
            }
        }
    });
}

/// Test-only seeding: builds a `Store<K>` with a fixed snapshot and no
/// backing watch stream, for handler tests that exercise F/G without a
/// live cluster.
#[cfg(feature = "test-util")]
fn seeded_store<K>(items: Vec<K>) -> Store<K>
where
    K: kube::Resource + Clone + std::fmt::Debug + 'static,
    K::DynamicType: Default + Eq + std::hash::Hash + Clone,
{
    let (store, mut writer) = reflector::store();
    writer.apply_watcher_event(&watcher::Event::Init);
    for item in items {
        writer.apply_watcher_event(&watcher::Event::InitApply(item));
    }
    writer.apply_watcher_event(&watcher::Event::InitDone);
    store
}

#[cfg(feature = "test-util")]
impl Caches {
    /// Builds `Caches` directly from fixed snapshots, bypassing `start`'s
    /// `watcher`/kube client entirely. For handler-level tests only.
    #[must_use]
    pub fn seeded(models: Vec<ModelRegistration>, access_policies: Vec<AccessPolicy>, subscriptions: Vec<Subscription>) -> Self {
        Self {
            models: seeded_store(models),
            access_policies: seeded_store(access_policies),
            subscriptions: seeded_store(subscriptions),
        }
    }
}
