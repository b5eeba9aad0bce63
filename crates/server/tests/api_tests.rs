//! End-to-end HTTP surface tests (spec.md §8 scenarios S1-S4, S6), in the
//! teacher's `tests/api_tests.rs` style: build an `AppState`, build the
//! router, drive it with `axum-test`.

#![cfg(feature = "test-util")]

use std::net::SocketAddr;
use std::sync::Arc;

use axum_test::TestServer;
use jsonwebtoken::EncodingKey;
use kube::api::ObjectMeta;
use maas_core::{
    BackendRef, ModelRegistration, ModelRegistrationSpec, ModelRegistrationStatus, Phase, RateLimitWindow, Subjects, Subscription,
    SubscriptionModelRef, SubscriptionSpec,
};
use maas_server::api::{self, AppState};
use maas_server::auth::{ApiKeyService, InMemoryApiKeyStore};
use maas_server::cache::Caches;
use maas_server::probe;

fn model_registration(name: &str, endpoint_url: Option<&str>, ready: bool) -> ModelRegistration {
    ModelRegistration {
        metadata: ObjectMeta { name: Some(name.to_owned()), namespace: Some("default".to_owned()), ..Default::default() },
        spec: ModelRegistrationSpec {
            model_name: name.to_owned(),
            backend_ref: BackendRef::InferenceService { name: name.to_owned(), namespace: "default".to_owned() },
        },
        status: Some(ModelRegistrationStatus {
            phase: if ready { Phase::Ready } else { Phase::Pending },
            endpoint_url: endpoint_url.map(str::to_owned),
            conditions: vec![],
            observed_generation: Some(1),
        }),
    }
}

fn subscription(name: &str, owner_groups: &[&str], model: &str, token_limit: u64) -> Subscription {
    Subscription {
        metadata: ObjectMeta { name: Some(name.to_owned()), namespace: Some("default".to_owned()), ..Default::default() },
        spec: SubscriptionSpec {
            owner: Subjects { groups: owner_groups.iter().map(|s| (*s).to_owned()).collect(), users: vec![] },
            model_refs: vec![SubscriptionModelRef {
                name: model.to_owned(),
                token_limit,
                window: RateLimitWindow::Hour,
                cost_per_token: None,
                hint: None,
            }],
        },
        status: None,
    }
}

fn build_state(models: Vec<ModelRegistration>, subscriptions: Vec<Subscription>) -> AppState {
    AppState {
        caches: Caches::seeded(models, vec![], subscriptions),
        api_keys: Arc::new(ApiKeyService::new(Arc::new(InMemoryApiKeyStore::new()))),
        probe_client: probe::build_client(true),
        token_signing_key: Arc::new(EncodingKey::from_secret(b"test-signing-secret")),
    }
}

fn build_server(state: AppState) -> TestServer {
    TestServer::new(api::router(state)).expect("router should build into a test server")
}

/// S1: single matching subscription with no hint auto-selects.
#[tokio::test]
async fn s1_single_subscription_auto_selects() {
    let state = build_state(vec![], vec![subscription("free", &["free-users"], "sim-a", 100)]);
    let server = build_server(state);

    let response = server
        .post("/v1/subscriptions/select")
        .json(&serde_json::json!({"userId": "alice", "groups": ["free-users"], "model": "sim-a", "hint": ""}))
        .await;

    response.assert_status_ok();
    response.assert_json(&serde_json::json!({"subscription": "free"}));
}

/// S2: two candidate subscriptions require a hint; a matching hint resolves.
#[tokio::test]
async fn s2_ambiguous_requires_hint_then_resolves() {
    let state = build_state(
        vec![],
        vec![subscription("free", &["free-users"], "sim-a", 100), subscription("premium", &["premium-users"], "sim-a", 50_000)],
    );

    let no_hint = build_server(state.clone())
        .post("/v1/subscriptions/select")
        .json(&serde_json::json!({"userId": "alice", "groups": ["free-users", "premium-users"], "model": "sim-a", "hint": ""}))
        .await;
    no_hint.assert_status_forbidden();
    let body: serde_json::Value = no_hint.json();
    assert_eq!(body["reason"], "ambiguous");
    assert_eq!(body["hintRequired"], true);

    let with_hint = build_server(state)
        .post("/v1/subscriptions/select")
        .json(&serde_json::json!({"userId": "alice", "groups": ["free-users", "premium-users"], "model": "sim-a", "hint": "premium"}))
        .await;
    with_hint.assert_status_ok();
    with_hint.assert_json(&serde_json::json!({"subscription": "premium"}));
}

/// S3: no matching subscription for the caller's groups denies.
#[tokio::test]
async fn s3_no_candidate_subscription_denies() {
    let state = build_state(vec![], vec![subscription("free", &["free-users"], "sim-a", 100)]);
    let server = build_server(state);

    let response = server
        .post("/v1/subscriptions/select")
        .json(&serde_json::json!({"userId": "bob", "groups": ["other"], "model": "sim-a", "hint": ""}))
        .await;

    response.assert_status_forbidden();
    let body: serde_json::Value = response.json();
    assert_eq!(body["reason"], "no-subscription");
    assert!(body.get("hintRequired").is_none());
}

/// S4: `GET /v1/models` keeps only endpoints that grant access, in name
/// order, dropping models without an endpoint entirely. Backed by four
/// real loopback listeners standing in for the model backends so the
/// probe step exercises actual classification rather than a stub.
#[tokio::test]
async fn s4_model_list_filters_by_probe_outcome() {
    let granting = spawn_fixed_status(axum::http::StatusCode::OK).await;
    let denying = spawn_fixed_status(axum::http::StatusCode::FORBIDDEN).await;
    let method_not_allowed = spawn_fixed_status(axum::http::StatusCode::METHOD_NOT_ALLOWED).await;

    let models = vec![
        model_registration("sim-a", Some(&format!("http://{granting}")), true),
        model_registration("sim-b", Some(&format!("http://{denying}")), true),
        model_registration("sim-c", Some(&format!("http://{method_not_allowed}")), true),
        model_registration("sim-d", None, true),
    ];

    let state = build_state(models, vec![]);
    let server = build_server(state);

    let response = server
        .get("/v1/models")
        .add_header(axum::http::HeaderName::from_static("x-identity-user"), axum::http::HeaderValue::from_static("alice"))
        .add_header(axum::http::HeaderName::from_static("x-identity-groups"), axum::http::HeaderValue::from_static("[]"))
        .await;

    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    let ids: Vec<&str> = body["data"].as_array().unwrap().iter().map(|item| item["id"].as_str().unwrap()).collect();
    assert_eq!(ids, vec!["sim-a", "sim-c"]);
}

/// S6: create, validate, revoke, validate-again-denies.
#[tokio::test]
async fn s6_api_key_lifecycle() {
    let state = build_state(vec![], vec![]);
    let server = build_server(state);

    let created = server
        .post("/v1/api-keys")
        .add_header(axum::http::HeaderName::from_static("x-identity-user"), axum::http::HeaderValue::from_static("alice"))
        .add_header(axum::http::HeaderName::from_static("x-identity-groups"), axum::http::HeaderValue::from_static("[]"))
        .json(&serde_json::json!({"name": "k1"}))
        .await;
    created.assert_status_ok();
    let created_body: serde_json::Value = created.json();
    let plaintext = created_body["plaintext"].as_str().unwrap().to_owned();
    let id = created_body["id"].as_str().unwrap().to_owned();

    let valid = server.post("/v1/api-keys/validate").json(&serde_json::json!({"key": plaintext})).await;
    valid.assert_status_ok();
    assert_eq!(valid.json::<serde_json::Value>()["valid"], true);

    server
        .delete(&format!("/v1/api-keys/{id}"))
        .add_header(axum::http::HeaderName::from_static("x-identity-user"), axum::http::HeaderValue::from_static("alice"))
        .add_header(axum::http::HeaderName::from_static("x-identity-groups"), axum::http::HeaderValue::from_static("[]"))
        .await
        .assert_status_no_content();

    let revoked = server.post("/v1/api-keys/validate").json(&serde_json::json!({"key": plaintext})).await;
    revoked.assert_status_ok();
    let revoked_body: serde_json::Value = revoked.json();
    assert_eq!(revoked_body["valid"], false);
    assert_eq!(revoked_body["reason"], "key revoked or expired");
}

#[tokio::test]
async fn healthz_returns_ok() {
    let state = build_state(vec![], vec![]);
    let server = build_server(state);
    server.get("/healthz").await.assert_status_ok();
}

#[tokio::test]
async fn metrics_returns_prometheus_text() {
    let state = build_state(vec![], vec![]);
    let server = build_server(state);
    let response = server.get("/metrics").await;
    response.assert_status_ok();
}

#[tokio::test]
async fn missing_identity_headers_fail_closed_with_500() {
    let state = build_state(vec![], vec![]);
    let server = build_server(state);
    let response = server.get("/v1/models").await;
    response.assert_status(axum::http::StatusCode::INTERNAL_SERVER_ERROR);
    let body: serde_json::Value = response.json();
    assert_eq!(body["refId"], "001");
}

/// Spins up a tiny axum server on an ephemeral loopback port that answers
/// every `GET` with a fixed status, standing in for a model backend during
/// probe tests.
async fn spawn_fixed_status(status: axum::http::StatusCode) -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.expect("bind ephemeral port");
    let addr = listener.local_addr().expect("listener has a local address");
    let app = axum::Router::new().route("/v1/models", axum::routing::get(move || async move { status }));
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    addr
}
