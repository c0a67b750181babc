use super::{Coordinates, Feature};

/// A disconnect switch ("rastavljač") with the attributes it can be searched by.
#[derive(Debug, Clone, PartialEq)]
pub struct DisconnectSwitch {
    pub code: Option<String>,
    pub substation: Option<String>,
    pub feeder: Option<String>,
    pub business_unit: Option<String>,
    pub control_type: Option<String>,
    pub feeder_code: Option<String>,
    pub feature: Feature,
}

impl DisconnectSwitch {
    pub fn from_feature(feature: Feature) -> Self {
        Self {
            code: feature.property_text("Šifra"),
            substation: feature.property_text("Naziv TS"),
            feeder: feature.property_text("Izvod"),
            business_unit: feature.property_text("Poslovna jedinica"),
            control_type: feature.property_text("Vrsta upravljanja"),
            feeder_code: feature.property_text("Šifra izvoda"),
            feature,
        }
    }

    /// Fields matched by suggestions and lookups, in priority order.
    pub fn search_fields(&self) -> impl Iterator<Item = &str> {
        [&self.code, &self.substation, &self.feeder, &self.feeder_code]
            .into_iter()
            .filter_map(|f| f.as_deref())
    }

    pub fn coordinates(&self) -> Option<Coordinates> {
        self.feature.coordinates()
    }
}
