//! HTTP API surface (spec.md §6), grounded on the teacher's `api/`
//! one-file-per-route-group layout and `AppState`-via-`axum::extract::State`
//! pattern.

pub mod api_keys;
pub mod health;
pub mod models;
#[cfg(feature = "openapi")]
pub mod openapi;
pub mod prometheus;
pub mod schemas;
pub mod subscriptions;
pub mod tokens;

use std::sync::Arc;

use axum::Router;
use axum::middleware;
use axum::routing::{delete, get, post};
use jsonwebtoken::EncodingKey;
use reqwest::Client;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::auth::ApiKeyService;
use crate::cache::Caches;
use crate::identity::require_identity;

/// Shared application state, cloned cheaply into every handler (spec.md §6,
/// mirroring `acteon-server`'s `AppState`).
#[derive(Clone)]
pub struct AppState {
    pub caches: Caches,
    pub api_keys: Arc<ApiKeyService>,
    pub probe_client: Client,
    pub token_signing_key: Arc<EncodingKey>,
}

pub fn router(state: AppState) -> Router {
    let protected = Router::new()
        .route("/v1/tokens", post(tokens::mint_token))
        .route("/v1/api-keys", post(api_keys::create_api_key).get(api_keys::list_api_keys))
        .route("/v1/api-keys/{id}", delete(api_keys::revoke_api_key))
        .route("/v1/models", get(models::list_models))
        .layer(middleware::from_fn(require_identity));

    let internal = Router::new()
        .route("/v1/api-keys/validate", post(api_keys::validate_api_key))
        .route("/v1/subscriptions/select", post(subscriptions::select_subscription));

    let public = Router::new().route("/healthz", get(health::healthz)).route("/metrics", get(prometheus::metrics_handler));

    let mut app = Router::new().merge(protected).merge(internal).merge(public).with_state(state);

    #[cfg(feature = "openapi")]
    {
        use utoipa::OpenApi;
        use utoipa_swagger_ui::SwaggerUi;
        app = app.merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", openapi::ApiDoc::openapi()));
    }

    app.layer(TraceLayer::new_for_http()).layer(CorsLayer::permissive())
}
