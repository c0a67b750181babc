pub mod geojson;
pub mod meter;
pub mod substation;
pub mod switch;

pub use geojson::{Coordinates, Feature, FeatureCollection, Geometry};
pub use meter::{CustomerMeter, MeterLocation, MeterRecord};
pub use substation::SubstationInfo;
pub use switch::DisconnectSwitch;
