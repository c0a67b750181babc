pub mod browse;
pub mod documents;
pub mod error;
pub mod meters;
pub mod response;
pub mod substations;
pub mod switches;

use std::sync::Arc;

use axum::{
    extract::State,
    routing::{get, post},
    Json, Router,
};
use grid_client::GridIndex;
use serde_json::{json, Value};
use time::{format_description::well_known::Rfc3339, OffsetDateTime};

use crate::config::{DocumentsConfig, MapsConfig};

/// Everything a handler reads. Built once at startup and never mutated.
pub struct AppState {
    pub index: GridIndex,
    pub maps: MapsConfig,
    pub documents: DocumentsConfig,
    pub loaded_at: OffsetDateTime,
}

pub type SharedState = Arc<AppState>;

pub fn build_router(state: SharedState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/get_coordinates", post(meters::by_code))
        .route("/get_coordinates_by_serial", post(meters::by_serial))
        .route("/suggest_kupac", post(meters::suggest_customers))
        .route("/get_coordinates_by_kupac", post(meters::by_customer))
        .route("/get_oh_values/:oj_value", get(browse::sub_units))
        .route("/get_oj_oh_data", get(browse::org_unit_meters))
        .route("/get_ts_nazivi", get(browse::substation_names))
        .route("/get_ts_naziv_data", get(browse::substation_name_meters))
        .route("/suggest_trafostanica", post(substations::suggest))
        .route("/get_trafostanica", post(substations::lookup))
        .route("/get_all_trafostanice", get(substations::all))
        .route("/suggest_rastavljac", post(switches::suggest))
        .route("/get_rastavljac", post(switches::lookup))
        .route("/documents", get(documents::list))
        .route("/download/:filename", get(documents::download))
        .with_state(state)
}

async fn health(State(state): State<SharedState>) -> Json<Value> {
    let idx = &state.index;
    Json(json!({
        "status": "ok",
        "loaded_at": state.loaded_at.format(&Rfc3339).ok(),
        "meters": idx.meter_count(),
        "located_meters": idx.location_count(),
        "customers": idx.customer_count(),
        "substations": idx.substation_count(),
        "switches": idx.switch_count(),
    }))
}
