use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use crate::sanitize;

/// A WGS84 position. Stored in GeoJSON order (longitude first); map links and
/// `center` fields use [`Coordinates::lat_lon`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coordinates {
    pub lon: f64,
    pub lat: f64,
}

impl Coordinates {
    pub fn new(lon: f64, lat: f64) -> Self {
        Self { lon, lat }
    }

    pub fn lon_lat(&self) -> [f64; 2] {
        [self.lon, self.lat]
    }

    pub fn lat_lon(&self) -> [f64; 2] {
        [self.lat, self.lon]
    }

    pub fn is_valid(&self) -> bool {
        self.lon.is_finite()
            && self.lat.is_finite()
            && (-180.0..=180.0).contains(&self.lon)
            && (-90.0..=90.0).contains(&self.lat)
    }

    /// Reads a GeoJSON position (`[lon, lat, ...]`).
    pub fn from_position(value: &Value) -> Option<Self> {
        let items = value.as_array()?;
        let lon = items.first()?.as_f64()?;
        let lat = items.get(1)?.as_f64()?;
        Some(Self::new(lon, lat))
    }

    /// Arithmetic mean of the given points.
    pub fn mean<'a>(points: impl IntoIterator<Item = &'a Coordinates>) -> Option<Self> {
        let (mut lon, mut lat, mut n) = (0.0, 0.0, 0usize);
        for p in points {
            lon += p.lon;
            lat += p.lat;
            n += 1;
        }
        (n > 0).then(|| Self::new(lon / n as f64, lat / n as f64))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeatureCollection {
    #[serde(rename = "type", default = "feature_collection_kind")]
    pub kind: String,
    #[serde(default)]
    pub features: Vec<Feature>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Feature {
    #[serde(rename = "type", default = "feature_kind")]
    pub kind: String,
    #[serde(default)]
    pub geometry: Option<Geometry>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub properties: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Geometry {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub coordinates: Value,
}

impl FeatureCollection {
    pub fn new(features: Vec<Feature>) -> Self {
        Self {
            kind: feature_collection_kind(),
            features,
        }
    }
}

impl Feature {
    pub fn point(at: Coordinates, properties: Map<String, Value>) -> Self {
        Self {
            kind: feature_kind(),
            geometry: Some(Geometry::point(at)),
            properties,
        }
    }

    pub fn property_text(&self, key: &str) -> Option<String> {
        self.properties.get(key).and_then(sanitize::value_text)
    }

    pub fn property_integer(&self, key: &str) -> Option<i64> {
        self.properties.get(key).and_then(sanitize::value_integer)
    }

    pub fn property_scalar(&self, key: &str) -> Option<Value> {
        self.properties.get(key).and_then(sanitize::scalar)
    }

    /// First position of the geometry, if it has a usable one.
    pub fn coordinates(&self) -> Option<Coordinates> {
        self.geometry
            .as_ref()
            .and_then(Geometry::representative_point)
            .filter(Coordinates::is_valid)
    }
}

impl Geometry {
    pub fn point(at: Coordinates) -> Self {
        Self {
            kind: "Point".to_string(),
            coordinates: Value::from(at.lon_lat().to_vec()),
        }
    }

    /// The point itself for `Point` geometries, the first vertex otherwise.
    pub fn representative_point(&self) -> Option<Coordinates> {
        first_position(&self.coordinates)
    }
}

fn first_position(value: &Value) -> Option<Coordinates> {
    let items = value.as_array()?;
    match items.first()? {
        Value::Number(_) => Coordinates::from_position(value),
        nested => first_position(nested),
    }
}

fn feature_collection_kind() -> String {
    "FeatureCollection".to_string()
}

fn feature_kind() -> String {
    "Feature".to_string()
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<Map<String, Value>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Map<String, Value>>::deserialize(deserializer)?.unwrap_or_default())
}
