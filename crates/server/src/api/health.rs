//! `GET /healthz` -- liveness, public, no identity required (spec.md §6).

use axum::http::StatusCode;

pub async fn healthz() -> StatusCode {
    StatusCode::OK
}
