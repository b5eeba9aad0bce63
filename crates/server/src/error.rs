use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use thiserror::Error;

/// Errors the MaaS HTTP API surfaces, mapped to spec.md §7's taxonomy at
/// the HTTP boundary.
#[derive(Debug, Error)]
pub enum ServerError {
    /// Malformed request body (spec.md §7 `ValidationError`).
    #[error("validation failed: {0}")]
    Validation(String),

    /// `X-Identity-User`/`X-Identity-Groups` missing or malformed
    /// (spec.md §4.6, §7 `UpstreamConfigError`). Carries the typed refId
    /// the spec names.
    #[error("{message}")]
    UpstreamConfig { ref_id: &'static str, message: String },

    /// Unknown model or key (spec.md §7 `NotFound`).
    #[error("not found: {0}")]
    NotFound(String),

    /// Authorization or subscription-selection denial (spec.md §7 `Denied`).
    #[error("denied: {reason}")]
    Denied { status: StatusCode, reason: String, hint_required: bool },

    /// Internal error that doesn't fit the taxonomy above (store
    /// failures, etc). Never a `Transient` surfaced to the caller on the
    /// first attempt per spec.md §7 -- hot-path handlers deny and let the
    /// client retry rather than retrying themselves.
    #[error("internal error: {0}")]
    Internal(String),
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ErrorBody {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    ref_id: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    reason: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    hint_required: Option<bool>,
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            Self::Validation(message) => {
                (StatusCode::BAD_REQUEST, ErrorBody { error: message, ref_id: None, reason: None, hint_required: None })
            }
            Self::UpstreamConfig { ref_id, message } => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorBody { error: message, ref_id: Some(ref_id), reason: None, hint_required: None },
            ),
            Self::NotFound(message) => {
                (StatusCode::NOT_FOUND, ErrorBody { error: message, ref_id: None, reason: None, hint_required: None })
            }
            Self::Denied { status, reason, hint_required } => (
                status,
                ErrorBody {
                    error: "denied".to_owned(),
                    ref_id: None,
                    reason: Some(reason),
                    hint_required: if hint_required { Some(true) } else { None },
                },
            ),
            Self::Internal(message) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorBody { error: message, ref_id: None, reason: None, hint_required: None },
            ),
        };

        (status, Json(body)).into_response()
    }
}

impl ServerError {
    /// spec.md §4.6: missing/empty `X-Identity-User` (refId 001).
    #[must_use]
    pub fn missing_user() -> Self {
        Self::UpstreamConfig { ref_id: "001", message: "missing or empty X-Identity-User header".to_owned() }
    }

    /// spec.md §4.6: missing `X-Identity-Groups` (refId 002).
    #[must_use]
    pub fn missing_groups() -> Self {
        Self::UpstreamConfig { ref_id: "002", message: "missing X-Identity-Groups header".to_owned() }
    }

    /// spec.md §4.6: group header parse failure (refId 003).
    #[must_use]
    pub fn group_parse_failure(detail: impl std::fmt::Display) -> Self {
        Self::UpstreamConfig { ref_id: "003", message: format!("failed to parse X-Identity-Groups: {detail}") }
    }
}
