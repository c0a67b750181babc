use axum::{
    extract::{
        rejection::{FormRejection, JsonRejection},
        State,
    },
    response::{IntoResponse, Response},
    Form, Json,
};
use grid_client::{
    domain::{Feature, SubstationInfo},
    index::substation_queries,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map};

use super::{
    error::{observed, ApiError, Identifier},
    response::{map_link, MapView, Sanitized},
    AppState, SharedState,
};

#[derive(Debug, Deserialize)]
pub struct SuggestForm {
    input: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SubstationRequest {
    trafostanica: Option<String>,
}

#[derive(Debug, Serialize)]
struct SubstationResponse<'a> {
    #[serde(flatten)]
    info: &'a SubstationInfo,
    url: Option<String>,
    center: Option<[f64; 2]>,
}

#[tracing::instrument(skip(state, payload))]
pub async fn suggest(State(state): State<SharedState>, payload: Result<Form<SuggestForm>, FormRejection>) -> Response {
    let body = payload.map_err(ApiError::from).map(|Form(form)| {
        let fragment = form.input.unwrap_or_default();
        Json(json!({ "suggestions": substation_queries::substation_suggestions(&state.index, &fragment) }))
    });
    observed("suggest_trafostanica", body).into_response()
}

#[tracing::instrument(skip(state, payload))]
pub async fn lookup(
    State(state): State<SharedState>,
    payload: Result<Json<SubstationRequest>, JsonRejection>,
) -> Response {
    observed("get_trafostanica", substation(&state, payload)).into_response()
}

fn substation(state: &AppState, payload: Result<Json<SubstationRequest>, JsonRejection>) -> Result<Response, ApiError> {
    let Json(req) = payload?;
    let name = req
        .trafostanica
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or(ApiError::NotSupplied(Identifier::Substation))?;
    let info =
        substation_queries::substation_by_name(&state.index, name).ok_or(ApiError::NotFound(Identifier::Substation))?;

    Ok(Sanitized(SubstationResponse {
        info,
        url: info.coordinates.map(|at| map_link(&state.maps.base_url, at)),
        center: info.coordinates.map(|at| at.lat_lon()),
    })
    .into_response())
}

#[tracing::instrument(skip(state))]
pub async fn all(State(state): State<SharedState>) -> Response {
    let substations = substation_queries::all_substations(&state.index);
    let features: Vec<Feature> = substations
        .iter()
        .filter_map(|s| {
            let at = s.coordinates?;
            let mut props = Map::new();
            props.insert("naziv".into(), json!(s.name));
            props.insert("snaga".into(), json!(s.power_rating));
            Some(Feature::point(at, props))
        })
        .collect();
    let center = substation_queries::substations_center(substations)
        .map(|c| c.lat_lon())
        .unwrap_or(state.maps.default_center);

    let view = MapView {
        total: features.len(),
        features,
        center,
    };
    observed("get_all_trafostanice", Ok::<_, ApiError>(Sanitized(view))).into_response()
}
