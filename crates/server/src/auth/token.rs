//! Ephemeral bearer token minting for `POST /v1/tokens` (spec.md §6).
//!
//! Unlike API keys, these are signed, short-lived JWTs the caller mints for
//! itself from already-established gateway identity -- there is no
//! persisted record, only the signing secret.

use chrono::{DateTime, Utc};
use jsonwebtoken::{EncodingKey, Header, encode};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

const DEFAULT_EXPIRATION_SECONDS: i64 = 3_600;
const MAX_EXPIRATION_SECONDS: i64 = 86_400;

#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    sub: String,
    groups: Vec<String>,
    jti: String,
    iat: i64,
    exp: i64,
}

pub struct MintedToken {
    pub token: String,
    pub jti: String,
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, thiserror::Error)]
#[error("failed to sign token: {0}")]
pub struct TokenError(#[from] jsonwebtoken::errors::Error);

/// Mints a signed bearer token for `(user_id, groups)`, clamping the
/// requested lifetime to `(0, MAX_EXPIRATION_SECONDS]`.
///
/// # Errors
/// Returns `TokenError` if JWT signing fails (malformed key material).
pub fn mint(
    signing_key: &EncodingKey,
    user_id: &str,
    groups: &[String],
    requested_expiration_seconds: Option<i64>,
    now: DateTime<Utc>,
) -> Result<MintedToken, TokenError> {
    let lifetime = requested_expiration_seconds.filter(|s| *s > 0).unwrap_or(DEFAULT_EXPIRATION_SECONDS).min(MAX_EXPIRATION_SECONDS);
    let expires_at = now + chrono::Duration::seconds(lifetime);
    let jti = Uuid::new_v4().to_string();

    let claims = Claims {
        sub: user_id.to_owned(),
        groups: groups.to_vec(),
        jti: jti.clone(),
        iat: now.timestamp(),
        exp: expires_at.timestamp(),
    };

    let token = encode(&Header::default(), &claims, signing_key)?;
    Ok(MintedToken { token, jti, expires_at })
}
