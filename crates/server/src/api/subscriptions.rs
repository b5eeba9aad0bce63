//! `POST /v1/subscriptions/select` -- Subscription Selector (component F,
//! spec.md §4.4). Internal-only: called by the gateway on the hot path, not
//! by end users, so it is not gated by the identity extractor -- the caller
//! identity arrives in the request body, not via `X-Identity-*` headers.

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use kube::ResourceExt;

use crate::api::AppState;
use crate::api::prometheus::SUBSCRIPTION_SELECTIONS_TOTAL;
use crate::api::schemas::{SelectSubscriptionRequest, SelectSubscriptionResponse};
use crate::error::ServerError;

#[cfg_attr(feature = "openapi", utoipa::path(post, path = "/v1/subscriptions/select", request_body = SelectSubscriptionRequest, responses((status = 200, body = SelectSubscriptionResponse))))]
pub async fn select_subscription(
    State(state): State<AppState>,
    Json(request): Json<SelectSubscriptionRequest>,
) -> Result<Json<SelectSubscriptionResponse>, ServerError> {
    let mut candidates: Vec<String> = state
        .caches
        .subscriptions
        .state()
        .iter()
        .filter(|sub| sub.spec.model_ref(&request.model).is_some())
        .filter(|sub| {
            sub.spec.owner.users.iter().any(|u| u == &request.user_id) || request.groups.iter().any(|g| sub.spec.owner.groups.contains(g))
        })
        .map(|sub| sub.name_any())
        .collect();
    candidates.sort();
    candidates.dedup();

    let hint = request.hint.trim();

    let outcome = if candidates.is_empty() {
        Err(denied(StatusCode::FORBIDDEN, "no-subscription", false))
    } else if !hint.is_empty() {
        if candidates.iter().any(|c| c == hint) {
            Ok(hint.to_owned())
        } else {
            Err(denied(StatusCode::FORBIDDEN, "hint-not-authorized", false))
        }
    } else if candidates.len() == 1 {
        Ok(candidates[0].clone())
    } else {
        Err(denied(StatusCode::FORBIDDEN, "ambiguous", true))
    };

    match &outcome {
        Ok(_) => SUBSCRIPTION_SELECTIONS_TOTAL.with_label_values(&["selected"]).inc(),
        Err(_) => SUBSCRIPTION_SELECTIONS_TOTAL.with_label_values(&["denied"]).inc(),
    }

    outcome.map(|subscription| Json(SelectSubscriptionResponse { subscription }))
}

fn denied(status: StatusCode, reason: &str, hint_required: bool) -> ServerError {
    ServerError::Denied { status, reason: reason.to_owned(), hint_required }
}
