use serde::Serialize;
use serde_json::Value;

use super::{Coordinates, Feature};

/// Descriptive record of a substation ("trafostanica").
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SubstationInfo {
    #[serde(rename = "naziv")]
    pub name: String,
    #[serde(skip)]
    pub coordinates: Option<Coordinates>,
    #[serde(rename = "snaga")]
    pub power_rating: Option<Value>,
    #[serde(rename = "broj_transformatora")]
    pub transformer_count: Option<Value>,
    #[serde(rename = "konfiguracija")]
    pub configuration: Option<String>,
    #[serde(rename = "napojna_ts")]
    pub feeding_substation: Option<String>,
    #[serde(rename = "izvod")]
    pub feeder: Option<String>,
    #[serde(rename = "tip")]
    pub kind: Option<String>,
    #[serde(rename = "poslovna_jedinica")]
    pub business_unit: Option<String>,
    #[serde(rename = "vrsta_kucista")]
    pub enclosure: Option<String>,
    #[serde(rename = "vrsta_izolacije")]
    pub insulation: Option<String>,
    #[serde(rename = "vlasnik")]
    pub owner: Option<String>,
    #[serde(rename = "godina_izgradnje")]
    pub year_built: Option<Value>,
}

impl SubstationInfo {
    /// Builds the record from a substation feature; features without a name
    /// cannot be looked up and yield `None`.
    pub fn from_feature(feature: &Feature) -> Option<Self> {
        Some(Self {
            name: feature.property_text("Naziv")?,
            coordinates: feature.coordinates(),
            power_rating: feature.property_scalar("Snaga"),
            transformer_count: feature.property_scalar("Broj transformatora"),
            configuration: feature.property_text("Konfiguracija"),
            feeding_substation: feature.property_text("Napojna TS"),
            feeder: feature.property_text("Izvod"),
            kind: feature.property_text("Tip"),
            business_unit: feature.property_text("Poslovna jedinica"),
            enclosure: feature.property_text("Vrsta kućišta"),
            insulation: feature.property_text("Vrsta izolacije"),
            owner: feature.property_text("Vlasnik"),
            year_built: feature.property_scalar("Godina izgradnje"),
        })
    }
}
