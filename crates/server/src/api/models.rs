//! `GET /v1/models` -- Model-List Access Filter (component G, spec.md §4.5).

use std::collections::HashMap;

use axum::extract::State;
use axum::http::HeaderMap;
use axum::{Extension, Json};
use kube::ResourceExt;
use maas_core::{CallerIdentity, Phase};

use crate::api::AppState;
use crate::api::prometheus::MODEL_LIST_REQUESTS_TOTAL;
use crate::api::schemas::{ModelListItem, ModelListResponse};
use crate::probe;

struct ModelMeta {
    url: String,
    ready: bool,
    created: i64,
}

#[cfg_attr(feature = "openapi", utoipa::path(get, path = "/v1/models", responses((status = 200, body = ModelListResponse))))]
pub async fn list_models(
    Extension(_identity): Extension<CallerIdentity>,
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Json<ModelListResponse> {
    MODEL_LIST_REQUESTS_TOTAL.inc();

    let authorization = headers.get(axum::http::header::AUTHORIZATION).and_then(|v| v.to_str().ok()).map(str::to_owned);

    let mut targets: Vec<(String, String)> = Vec::new();
    let mut meta_by_name: HashMap<String, ModelMeta> = HashMap::new();

    for model in state.caches.models.state() {
        let Some(endpoint_url) = model.status.as_ref().and_then(|s| s.endpoint_url.clone()) else {
            continue;
        };
        let name = model.spec.model_name.clone();
        let ready = model.status.as_ref().is_some_and(|s| s.phase == Phase::Ready);
        let created = model.creation_timestamp().map_or(0, |t| t.0.timestamp());

        targets.push((name.clone(), endpoint_url.clone()));
        meta_by_name.insert(name, ModelMeta { url: endpoint_url, ready, created });
    }

    let granted = probe::probe_all(&state.probe_client, targets, authorization.as_deref()).await;

    let data = granted
        .into_iter()
        .filter_map(|name| {
            meta_by_name.remove(&name).map(|meta| ModelListItem { id: name, url: meta.url, ready: meta.ready, owned_by: "maas".to_owned(), created: meta.created })
        })
        .collect();

    Json(ModelListResponse { object: "list", data })
}
