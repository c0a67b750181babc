use axum::{
    response::{IntoResponse, Response},
    Json,
};
use grid_client::{
    domain::{Coordinates, Feature},
    index::meter_queries::PlacedMeter,
    sanitize,
};
use serde::Serialize;
use serde_json::{json, Map, Value};

use super::error::ApiError;

/// JSON body passed through [`sanitize::json_value`] on its way out.
pub struct Sanitized<T>(pub T);

impl<T: Serialize> IntoResponse for Sanitized<T> {
    fn into_response(self) -> Response {
        match serde_json::to_value(&self.0) {
            Ok(v) => Json(sanitize::json_value(v)).into_response(),
            Err(e) => ApiError::Internal(format!("failed to serialize response: {e}")).into_response(),
        }
    }
}

/// Map link for a position; the query value is `lat,lon`.
pub fn map_link(base_url: &str, at: Coordinates) -> String {
    let [lat, lon] = at.lat_lon();
    format!("{base_url}?q={lat},{lon}")
}

/// Features to draw, the `[lat, lon]` to center on, and how many there are.
#[derive(Debug, Serialize)]
pub struct MapView {
    pub features: Vec<Feature>,
    pub center: [f64; 2],
    pub total: usize,
}

impl MapView {
    /// Centered on the first feature. `None` when there is nothing to show.
    pub fn centered_on_first(features: Vec<Feature>) -> Option<Self> {
        let center = features.first()?.coordinates()?.lat_lon();
        Some(Self {
            total: features.len(),
            features,
            center,
        })
    }
}

/// A meter as drawn on the map.
pub fn meter_feature(m: &PlacedMeter<'_>) -> Feature {
    let r = m.record;
    let mut props = Map::new();
    props.insert("kupac".into(), json!(r.customer));
    props.insert("adresa".into(), json!(r.address));
    props.insert("sifra".into(), json!(r.code));
    props.insert("serijski_broj".into(), json!(r.serial));
    props.insert("tip_brojila".into(), json!(r.device_type));
    props.insert("hijerarhija".into(), json!(r.hierarchy));
    Feature::point(m.coordinates, props)
}

/// A code rendered as a JSON number when it is one.
pub fn code_value(code: &str) -> Value {
    sanitize::scalar(&Value::String(code.to_string())).unwrap_or(Value::Null)
}
