use axum::{
    extract::{
        rejection::{FormRejection, JsonRejection},
        State,
    },
    response::{IntoResponse, Response},
    Form, Json,
};
use grid_client::{domain::Feature, index::switch_queries};
use serde::{Deserialize, Serialize};
use serde_json::json;

use super::{
    error::{observed, ApiError, Identifier},
    response::{map_link, Sanitized},
    AppState, SharedState,
};

#[derive(Debug, Deserialize)]
pub struct SuggestForm {
    input: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SwitchRequest {
    rastavljac: Option<String>,
}

#[derive(Debug, Serialize)]
struct SwitchResponse<'a> {
    features: Vec<&'a Feature>,
    center: Option<[f64; 2]>,
    total: usize,
    url: Option<String>,
}

#[tracing::instrument(skip(state, payload))]
pub async fn suggest(State(state): State<SharedState>, payload: Result<Form<SuggestForm>, FormRejection>) -> Response {
    let body = payload.map_err(ApiError::from).map(|Form(form)| {
        let fragment = form.input.unwrap_or_default();
        Json(json!({ "suggestions": switch_queries::switch_suggestions(&state.index, &fragment) }))
    });
    observed("suggest_rastavljac", body).into_response()
}

#[tracing::instrument(skip(state, payload))]
pub async fn lookup(State(state): State<SharedState>, payload: Result<Json<SwitchRequest>, JsonRejection>) -> Response {
    observed("get_rastavljac", switches(&state, payload)).into_response()
}

fn switches(state: &AppState, payload: Result<Json<SwitchRequest>, JsonRejection>) -> Result<Response, ApiError> {
    let Json(req) = payload?;
    let query = req
        .rastavljac
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or(ApiError::NotSupplied(Identifier::Switch))?;

    let found = switch_queries::find_switches(&state.index, query);
    if found.is_empty() {
        return Err(ApiError::NotFound(Identifier::Switch));
    }
    let at = switch_queries::switches_center(&found);

    Ok(Sanitized(SwitchResponse {
        total: found.len(),
        features: found.iter().map(|s| &s.feature).collect(),
        center: at.map(|c| c.lat_lon()),
        url: at.map(|c| map_link(&state.maps.base_url, c)),
    })
    .into_response())
}
