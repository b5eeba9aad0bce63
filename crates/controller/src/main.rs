use std::sync::Arc;
use std::time::Duration;

use futures::StreamExt;
use kube::runtime::Controller;
use kube::runtime::reflector::ObjectRef;
use kube::runtime::watcher;
use kube::{Api, Client};
use maas_core::{AccessPolicy, ModelRegistration, Subscription};
use maas_state::PolicyStore;
use maas_state_memory::MemoryPolicyStore;
use tracing::{error, info, warn};

use maas_controller::Context;
use maas_controller::reconcile::{access_policy, model_registration, subscription};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")))
        .init();

    let client = Client::try_default().await?;
    let namespace = std::env::var("MAAS_NAMESPACE").unwrap_or_else(|_| "default".to_owned());

    // The generated-policy store is shared with `maas-server` in single-node
    // deployments via an external backend (spec.md §5 "no global locks" --
    // the store's own compare-and-swap is the only coordination needed). A
    // pluggable backend can replace `MemoryPolicyStore` without touching any
    // reconciler: the controllers only depend on `dyn PolicyStore`.
    let store: Arc<dyn PolicyStore> = Arc::new(MemoryPolicyStore::new());

    let ctx = Context::new(client.clone(), store, namespace.clone());

    let mr_api: Api<ModelRegistration> = Api::namespaced(client.clone(), &namespace);
    let ap_api: Api<AccessPolicy> = Api::namespaced(client.clone(), &namespace);
    let sub_api: Api<Subscription> = Api::namespaced(client.clone(), &namespace);

    let mr_controller = Controller::new(mr_api.clone(), watcher::Config::default());

    let ap_controller = Controller::new(ap_api.clone(), watcher::Config::default());
    let ap_store = ap_controller.store();
    let ap_controller = ap_controller.watches(mr_api.clone(), watcher::Config::default(), move |mr: ModelRegistration| {
        ap_store
            .state()
            .iter()
            .filter(|p| p.spec.model_refs.iter().any(|r| r.name == mr.spec.model_name))
            .map(|p| ObjectRef::from_obj(p.as_ref()))
            .collect::<Vec<_>>()
    });

    let sub_controller = Controller::new(sub_api.clone(), watcher::Config::default());
    let sub_store = sub_controller.store();
    let sub_controller = sub_controller.watches(mr_api.clone(), watcher::Config::default(), move |mr: ModelRegistration| {
        sub_store
            .state()
            .iter()
            .filter(|s| s.spec.model_ref(&mr.spec.model_name).is_some())
            .map(|s| ObjectRef::from_obj(s.as_ref()))
            .collect::<Vec<_>>()
    });

    info!(namespace = %namespace, "maas-controller starting reconcile loops");

    let mr_ctx = ctx.clone();
    let mr_task = tokio::spawn(
        mr_controller
            .run(model_registration::reconcile, model_registration::error_policy, mr_ctx)
            .for_each(|res| async move {
                if let Err(err) = res {
                    error!(error = %err, "model_registration_dispatch_error");
                }
            }),
    );

    let ap_ctx = ctx.clone();
    let ap_task = tokio::spawn(
        ap_controller
            .run(access_policy::reconcile, access_policy::error_policy, ap_ctx)
            .for_each(|res| async move {
                if let Err(err) = res {
                    error!(error = %err, "access_policy_dispatch_error");
                }
            }),
    );

    let sub_ctx = ctx.clone();
    let sub_task = tokio::spawn(
        sub_controller
            .run(subscription::reconcile, subscription::error_policy, sub_ctx)
            .for_each(|res| async move {
                if let Err(err) = res {
                    error!(error = %err, "subscription_dispatch_error");
                }
            }),
    );

    tokio::select! {
        _ = mr_task => warn!("model_registration controller stream ended"),
        _ = ap_task => warn!("access_policy controller stream ended"),
        _ = sub_task => warn!("subscription controller stream ended"),
        () = shutdown_signal() => info!("shutdown signal received"),
    }

    // Give in-flight reconciles a moment to finish their current status
    // write before the process exits.
    tokio::time::sleep(Duration::from_millis(200)).await;
    info!("maas-controller stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c().await.expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {}
        () = terminate => {}
    }
}
