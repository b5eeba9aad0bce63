//! `GET /metrics` -- Prometheus text exposition (spec.md §2 "which counters
//! and labels the policy engine must emit" is in-scope even though the
//! collector pipeline is not). Grounded on the `LazyLock<Registry>` +
//! `TextEncoder` pattern used by the retrieval pack's kube-rs operator
//! example.

use std::sync::LazyLock;

use axum::http::StatusCode;
use axum::response::IntoResponse;
use prometheus::{Encoder, IntCounter, IntCounterVec, Registry, TextEncoder};

static REGISTRY: LazyLock<Registry> = LazyLock::new(Registry::new);

pub static TOKENS_MINTED_TOTAL: LazyLock<IntCounter> = LazyLock::new(|| {
    let counter = IntCounter::new("maas_tokens_minted_total", "Total ephemeral bearer tokens minted").expect("metric definition is valid");
    REGISTRY.register(Box::new(counter.clone())).expect("metric not yet registered");
    counter
});

pub static API_KEYS_CREATED_TOTAL: LazyLock<IntCounter> = LazyLock::new(|| {
    let counter = IntCounter::new("maas_api_keys_created_total", "Total API keys created").expect("metric definition is valid");
    REGISTRY.register(Box::new(counter.clone())).expect("metric not yet registered");
    counter
});

pub static API_KEY_VALIDATIONS_TOTAL: LazyLock<IntCounterVec> = LazyLock::new(|| {
    let counter = IntCounterVec::new(
        prometheus::Opts::new("maas_api_key_validations_total", "API key validation outcomes"),
        &["result"],
    )
    .expect("metric definition is valid");
    REGISTRY.register(Box::new(counter.clone())).expect("metric not yet registered");
    counter
});

pub static SUBSCRIPTION_SELECTIONS_TOTAL: LazyLock<IntCounterVec> = LazyLock::new(|| {
    let counter = IntCounterVec::new(
        prometheus::Opts::new("maas_subscription_selections_total", "Subscription selector outcomes"),
        &["outcome"],
    )
    .expect("metric definition is valid");
    REGISTRY.register(Box::new(counter.clone())).expect("metric not yet registered");
    counter
});

pub static MODEL_LIST_REQUESTS_TOTAL: LazyLock<IntCounter> = LazyLock::new(|| {
    let counter = IntCounter::new("maas_model_list_requests_total", "Total GET /v1/models requests served").expect("metric definition is valid");
    REGISTRY.register(Box::new(counter.clone())).expect("metric not yet registered");
    counter
});

/// Registers every metric with the global registry so they appear on
/// `/metrics` even before their first increment.
pub fn init() {
    LazyLock::force(&TOKENS_MINTED_TOTAL);
    LazyLock::force(&API_KEYS_CREATED_TOTAL);
    LazyLock::force(&API_KEY_VALIDATIONS_TOTAL);
    LazyLock::force(&SUBSCRIPTION_SELECTIONS_TOTAL);
    LazyLock::force(&MODEL_LIST_REQUESTS_TOTAL);
}

pub async fn metrics_handler() -> impl IntoResponse {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = Vec::new();

    match encoder.encode(&metric_families, &mut buffer) {
        Ok(()) => match String::from_utf8(buffer) {
            Ok(body) => (StatusCode::OK, body),
            Err(_) => (StatusCode::INTERNAL_SERVER_ERROR, "metrics encoding error".to_owned()),
        },
        Err(_) => (StatusCode::INTERNAL_SERVER_ERROR, "metrics encoding error".to_owned()),
    }
}
