//! Map views over meter records grouped by organizational unit or by the
//! substation a meter is attached to. Meters without a position are left out.

use axum::{
    extract::{rejection::QueryRejection, Path, Query, State},
    response::{IntoResponse, Response},
    Json,
};
use grid_client::index::meter_queries::{self, PlacedMeter};
use serde::Deserialize;
use serde_json::Value;

use super::{
    error::{observed, ApiError, Identifier},
    response::{code_value, meter_feature, MapView, Sanitized},
    AppState, SharedState,
};

#[derive(Debug, Deserialize)]
pub struct OrgUnitQuery {
    oj: Option<String>,
    oh: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct NameSearch {
    search: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SubstationNameQuery {
    ts_naziv: Option<String>,
}

fn supplied(raw: Option<&str>) -> Option<&str> {
    raw.map(str::trim).filter(|s| !s.is_empty())
}

fn map_view(meters: &[PlacedMeter<'_>], empty: Identifier) -> Result<Response, ApiError> {
    let features = meters.iter().map(meter_feature).collect();
    let view = MapView::centered_on_first(features).ok_or(ApiError::NotFound(empty))?;
    Ok(Sanitized(view).into_response())
}

#[tracing::instrument(skip(state))]
pub async fn sub_units(State(state): State<SharedState>, Path(oj_value): Path<String>) -> Response {
    let codes: Vec<Value> = meter_queries::sub_units(&state.index, oj_value.trim())
        .iter()
        .map(|c| code_value(c))
        .collect();
    observed("get_oh_values", Ok::<_, ApiError>(Json(codes))).into_response()
}

#[tracing::instrument(skip(state, query))]
pub async fn org_unit_meters(
    State(state): State<SharedState>,
    query: Result<Query<OrgUnitQuery>, QueryRejection>,
) -> Response {
    observed("get_oj_oh_data", org_unit_view(&state, query)).into_response()
}

fn org_unit_view(state: &AppState, query: Result<Query<OrgUnitQuery>, QueryRejection>) -> Result<Response, ApiError> {
    let Query(q) = query?;
    let (Some(oj), Some(oh)) = (supplied(q.oj.as_deref()), supplied(q.oh.as_deref())) else {
        return Err(ApiError::NotSupplied(Identifier::OrgUnit));
    };
    map_view(&meter_queries::meters_in_unit(&state.index, oj, oh), Identifier::OrgUnit)
}

#[tracing::instrument(skip(state, query))]
pub async fn substation_names(
    State(state): State<SharedState>,
    query: Result<Query<NameSearch>, QueryRejection>,
) -> Response {
    let names = query.map_err(ApiError::from).map(|Query(q)| {
        let names: Vec<String> = meter_queries::substation_names(&state.index, supplied(q.search.as_deref()))
            .into_iter()
            .map(str::to_owned)
            .collect();
        Json(names)
    });
    observed("get_ts_nazivi", names).into_response()
}

#[tracing::instrument(skip(state, query))]
pub async fn substation_name_meters(
    State(state): State<SharedState>,
    query: Result<Query<SubstationNameQuery>, QueryRejection>,
) -> Response {
    observed("get_ts_naziv_data", substation_name_view(&state, query)).into_response()
}

fn substation_name_view(
    state: &AppState,
    query: Result<Query<SubstationNameQuery>, QueryRejection>,
) -> Result<Response, ApiError> {
    let Query(q) = query?;
    let name = supplied(q.ts_naziv.as_deref()).ok_or(ApiError::NotSupplied(Identifier::SubstationName))?;
    map_view(&meter_queries::meters_at_substation(&state.index, name), Identifier::SubstationName)
}
