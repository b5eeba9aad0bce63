//! `POST /v1/tokens` -- mint an ephemeral bearer credential (spec.md §6).

use axum::Extension;
use axum::Json;
use chrono::Utc;
use maas_core::CallerIdentity;

use crate::api::AppState;
use crate::api::prometheus::TOKENS_MINTED_TOTAL;
use crate::api::schemas::{MintTokenRequest, MintTokenResponse};
use crate::auth::token;
use crate::error::ServerError;

#[cfg_attr(feature = "openapi", utoipa::path(post, path = "/v1/tokens", request_body = MintTokenRequest, responses((status = 200, body = MintTokenResponse))))]
pub async fn mint_token(
    Extension(identity): Extension<CallerIdentity>,
    axum::extract::State(state): axum::extract::State<AppState>,
    Json(request): Json<MintTokenRequest>,
) -> Result<Json<MintTokenResponse>, ServerError> {
    let minted = token::mint(&state.token_signing_key, &identity.user_id, &identity.groups, request.expiration, Utc::now())
        .map_err(|err| ServerError::Internal(err.to_string()))?;

    TOKENS_MINTED_TOTAL.inc();

    Ok(Json(MintTokenResponse { token: minted.token, expires_at: minted.expires_at, jti: minted.jti }))
}
