//! Domain types and the read-only lookup index for grid equipment: meters,
//! substations and disconnect switches joined by the meter code.

pub mod domain;
pub mod index;
pub mod sanitize;

pub use index::{Datasets, DedupReport, GridIndex};
