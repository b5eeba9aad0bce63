//! Identity Extractor (component H, spec.md §4.6).
//!
//! Shared middleware invoked on every non-public endpoint: parses
//! `X-Identity-User`/`X-Identity-Groups`, injected by the upstream gateway,
//! into a [`maas_core::CallerIdentity`] attached to the request extensions.

use axum::extract::Request;
use axum::http::HeaderMap;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use maas_core::CallerIdentity;

use crate::error::ServerError;

const USER_HEADER: &str = "x-identity-user";
const GROUPS_HEADER: &str = "x-identity-groups";

/// Parses `X-Identity-Groups` in either JSON-array form (`["g1","g2"]`) or
/// the whitespace-separated bracketed form (`[g1 g2]`) the upstream gateway
/// actually emits. Both must be accepted (spec.md §4.6); whitespace around
/// each group is trimmed.
///
/// # Errors
/// Returns the raw string on malformed input for the caller to wrap in a
/// typed `ServerError`.
pub fn parse_groups(raw: &str) -> Result<Vec<String>, String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(Vec::new());
    }

    if let Ok(groups) = serde_json::from_str::<Vec<String>>(trimmed) {
        return Ok(groups.into_iter().map(|g| g.trim().to_owned()).collect());
    }

    if trimmed.starts_with('[') && trimmed.ends_with(']') {
        let inner = &trimmed[1..trimmed.len() - 1];
        return Ok(inner.split_whitespace().map(str::trim).filter(|s| !s.is_empty()).map(str::to_owned).collect());
    }

    Err(format!("unrecognized X-Identity-Groups format: {raw}"))
}

/// Extracts `(userId, groups)` from request headers, per spec.md §4.6's
/// three typed failure modes.
///
/// # Errors
/// Returns `ServerError::UpstreamConfig` with the spec's refId (001/002/003)
/// for each of the three ways the upstream gateway can misconfigure these
/// headers.
pub fn extract_identity(headers: &HeaderMap) -> Result<CallerIdentity, ServerError> {
    let user = headers
        .get(USER_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(ServerError::missing_user)?;

    let groups_header = headers.get(GROUPS_HEADER).ok_or_else(ServerError::missing_groups)?;
    let groups_raw = groups_header.to_str().map_err(ServerError::group_parse_failure)?;
    let groups = parse_groups(groups_raw).map_err(ServerError::group_parse_failure)?;

    Ok(CallerIdentity::new(user, groups))
}

/// Axum middleware that extracts the caller identity and inserts it into
/// the request extensions for downstream handlers. Fails closed with a 500
/// on any of the three upstream misconfiguration modes, per spec.md §4.6.
pub async fn require_identity(mut request: Request, next: Next) -> Response {
    match extract_identity(request.headers()) {
        Ok(identity) => {
            request.extensions_mut().insert(identity);
            next.run(request).await
        }
        Err(err) => err.into_response(),
    }
}
