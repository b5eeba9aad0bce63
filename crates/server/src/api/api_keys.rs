//! `/v1/api-keys` CRUD + validate (component I, spec.md §4.7, §6).

use axum::extract::{Path, Query, State};
use axum::{Extension, Json};
use chrono::Utc;
use maas_core::CallerIdentity;

use crate::api::AppState;
use crate::api::prometheus::{API_KEY_VALIDATIONS_TOTAL, API_KEYS_CREATED_TOTAL};
use crate::api::schemas::{
    ApiKeySummary, CreateApiKeyRequest, CreateApiKeyResponse, ListApiKeysQuery, ListApiKeysResponse, ValidateApiKeyRequest, ValidateApiKeyResponse,
};
use crate::auth::{Pagination, ValidateOutcome};
use crate::error::ServerError;

#[cfg_attr(feature = "openapi", utoipa::path(post, path = "/v1/api-keys", request_body = CreateApiKeyRequest, responses((status = 200, body = CreateApiKeyResponse))))]
pub async fn create_api_key(
    Extension(identity): Extension<CallerIdentity>,
    State(state): State<AppState>,
    Json(request): Json<CreateApiKeyRequest>,
) -> Result<Json<CreateApiKeyResponse>, ServerError> {
    if request.name.trim().is_empty() {
        return Err(ServerError::Validation("name must not be empty".to_owned()));
    }

    let created = state
        .api_keys
        .create(&identity.user_id, &identity.groups, &request.name, request.description, request.expires_in, Utc::now())
        .await;

    API_KEYS_CREATED_TOTAL.inc();

    Ok(Json(CreateApiKeyResponse {
        id: created.id,
        plaintext: created.plaintext,
        prefix: created.prefix,
        created_at: created.created_at,
        expires_at: created.expires_at,
    }))
}

#[cfg_attr(feature = "openapi", utoipa::path(get, path = "/v1/api-keys", responses((status = 200, body = ListApiKeysResponse))))]
pub async fn list_api_keys(
    Extension(identity): Extension<CallerIdentity>,
    State(state): State<AppState>,
    Query(query): Query<ListApiKeysQuery>,
) -> Json<ListApiKeysResponse> {
    let page = Pagination::clamp(query.limit, query.offset);
    let listed = state.api_keys.list(&identity.user_id, page).await;

    let keys = listed
        .keys
        .into_iter()
        .map(|record| ApiKeySummary {
            id: record.id,
            name: record.name,
            prefix: record.display_prefix,
            created_at: record.created_at,
            expires_at: record.expires_at,
            revoked: record.revoked,
        })
        .collect();

    Json(ListApiKeysResponse { keys, has_more: listed.has_more })
}

#[cfg_attr(feature = "openapi", utoipa::path(delete, path = "/v1/api-keys/{id}", responses((status = 204))))]
pub async fn revoke_api_key(
    Extension(identity): Extension<CallerIdentity>,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<axum::http::StatusCode, ServerError> {
    if state.api_keys.revoke(&id, &identity.user_id).await {
        Ok(axum::http::StatusCode::NO_CONTENT)
    } else {
        Err(ServerError::NotFound(format!("api key {id} not found")))
    }
}

/// Internal-only: the gateway's callback for every inference request
/// (spec.md §6, §4.7). Not gated by the identity extractor -- the caller
/// here is the gateway itself, authenticating a *different* credential.
#[cfg_attr(feature = "openapi", utoipa::path(post, path = "/v1/api-keys/validate", request_body = ValidateApiKeyRequest, responses((status = 200, body = ValidateApiKeyResponse))))]
pub async fn validate_api_key(State(state): State<AppState>, Json(request): Json<ValidateApiKeyRequest>) -> Json<ValidateApiKeyResponse> {
    let outcome = state.api_keys.validate(&request.key, Utc::now()).await;

    let response = match outcome {
        ValidateOutcome::Valid { key_id, user_id, groups } => {
            API_KEY_VALIDATIONS_TOTAL.with_label_values(&["valid"]).inc();
            ValidateApiKeyResponse { valid: true, user_id: Some(user_id), groups: Some(groups), key_id: Some(key_id), reason: None }
        }
        ValidateOutcome::Invalid { reason } => {
            API_KEY_VALIDATIONS_TOTAL.with_label_values(&["invalid"]).inc();
            ValidateApiKeyResponse { valid: false, user_id: None, groups: None, key_id: None, reason: Some(reason) }
        }
    };

    Json(response)
}
