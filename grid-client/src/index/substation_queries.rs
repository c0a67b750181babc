use super::{contains_ci, suggestion_needle, GridIndex, SUGGESTION_LIMIT};
use crate::domain::{Coordinates, SubstationInfo};

pub fn substation_suggestions<'a>(index: &'a GridIndex, fragment: &str) -> Vec<&'a str> {
    let Some(needle) = suggestion_needle(fragment) else {
        return Vec::new();
    };

    let mut out: Vec<&str> = Vec::new();
    for s in &index.substations {
        if out.len() == SUGGESTION_LIMIT {
            break;
        }
        if contains_ci(&s.name, &needle) && !out.contains(&s.name.as_str()) {
            out.push(&s.name);
        }
    }
    out
}

/// Exact-name lookup.
pub fn substation_by_name<'a>(index: &'a GridIndex, name: &str) -> Option<&'a SubstationInfo> {
    index
        .substation_by_name
        .get(name.trim())
        .map(|&i| &index.substations[i])
}

pub fn all_substations(index: &GridIndex) -> &[SubstationInfo] {
    &index.substations
}

/// Mean position of every substation that has one.
pub fn substations_center(substations: &[SubstationInfo]) -> Option<Coordinates> {
    Coordinates::mean(substations.iter().filter_map(|s| s.coordinates.as_ref()))
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;
    use crate::index::Datasets;

    fn substation(name: &str, at: Option<(f64, f64)>) -> SubstationInfo {
        SubstationInfo {
            name: name.to_string(),
            coordinates: at.map(|(lon, lat)| Coordinates::new(lon, lat)),
            power_rating: Some(serde_json::json!(630)),
            transformer_count: None,
            configuration: None,
            feeding_substation: None,
            feeder: None,
            kind: None,
            business_unit: None,
            enclosure: None,
            insulation: None,
            owner: None,
            year_built: None,
        }
    }

    fn fixture() -> GridIndex {
        let mut substations = vec![
            substation("TS Centar 1", Some((18.0, 44.0))),
            substation("TS Centar 2", Some((19.0, 45.0))),
            substation("TS Bez lokacije", None),
        ];
        substations.extend((0..15).map(|i| substation(&format!("Rudnik {i}"), None)));
        GridIndex::build(Datasets { substations, ..Default::default() }, HashMap::new()).0
    }

    #[test]
    fn suggestions_match_substring_and_cap() {
        let index = fixture();
        assert_eq!(substation_suggestions(&index, "centar"), ["TS Centar 1", "TS Centar 2"]);
        assert_eq!(substation_suggestions(&index, "rudnik").len(), SUGGESTION_LIMIT);
        assert!(substation_suggestions(&index, "TS").is_empty());
    }

    #[test]
    fn lookup_is_exact() {
        let index = fixture();
        assert!(substation_by_name(&index, "TS Centar 1").is_some());
        assert!(substation_by_name(&index, " TS Centar 1 ").is_some());
        assert!(substation_by_name(&index, "ts centar 1").is_none());
    }

    #[test]
    fn center_is_mean_of_located_substations() {
        let index = fixture();
        let c = substations_center(all_substations(&index)).unwrap();
        assert_eq!(c, Coordinates::new(18.5, 44.5));
        assert_eq!(substations_center(&[]), None);
    }
}
