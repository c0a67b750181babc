use super::{contains_ci, eq_ci, suggestion_needle, GridIndex, SUGGESTION_LIMIT};
use crate::domain::{Coordinates, DisconnectSwitch};

/// Distinct field values (code, substation, feeder, feeder code) containing
/// the fragment.
pub fn switch_suggestions<'a>(index: &'a GridIndex, fragment: &str) -> Vec<&'a str> {
    let Some(needle) = suggestion_needle(fragment) else {
        return Vec::new();
    };

    let mut out: Vec<&str> = Vec::new();
    for value in index.switches.iter().flat_map(DisconnectSwitch::search_fields) {
        if out.len() == SUGGESTION_LIMIT {
            break;
        }
        if contains_ci(value, &needle) && !out.contains(&value) {
            out.push(value);
        }
    }
    out
}

/// Switches matching a code or name. Exact (case-insensitive) matches on any
/// search field win; otherwise the query is matched as a substring of all
/// search fields joined together.
pub fn find_switches<'a>(index: &'a GridIndex, query: &str) -> Vec<&'a DisconnectSwitch> {
    let query = query.trim();
    if query.is_empty() {
        return Vec::new();
    }

    let exact: Vec<&DisconnectSwitch> = index
        .switches
        .iter()
        .filter(|s| s.search_fields().any(|f| eq_ci(f, query)))
        .collect();
    if !exact.is_empty() {
        return exact;
    }

    let needle = query.to_lowercase();
    index
        .switches
        .iter()
        .filter(|s| contains_ci(&s.search_fields().collect::<Vec<_>>().join(" "), &needle))
        .collect()
}

/// Position of the first switch that has usable coordinates.
pub fn switches_center(switches: &[&DisconnectSwitch]) -> Option<Coordinates> {
    switches.iter().find_map(|s| s.coordinates())
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use serde_json::json;

    use super::*;
    use crate::domain::Feature;
    use crate::index::Datasets;

    fn switch(code: &str, ts: &str, feeder: &str, feeder_code: &str, at: Option<[f64; 2]>) -> DisconnectSwitch {
        let feature: Feature = serde_json::from_value(json!({
            "type": "Feature",
            "geometry": at.map(|c| json!({"type": "Point", "coordinates": c})),
            "properties": {
                "Šifra": code,
                "Naziv TS": ts,
                "Izvod": feeder,
                "Šifra izvoda": feeder_code,
                "Vrsta upravljanja": "daljinsko"
            }
        }))
        .unwrap();
        DisconnectSwitch::from_feature(feature)
    }

    fn fixture() -> GridIndex {
        let switches = vec![
            switch("R-101", "TS Centar 1", "Izvod Sjever", "IZ-1", None),
            switch("R-102", "TS Centar 1", "Izvod Jug", "IZ-2", Some([18.5, 44.5])),
            switch("R-201", "TS Luke", "Izvod Sjever", "IZ-3", Some([18.7, 44.6])),
        ];
        GridIndex::build(Datasets { switches, ..Default::default() }, HashMap::new()).0
    }

    #[test]
    fn suggestions_draw_from_all_fields_without_duplicates() {
        let index = fixture();
        assert_eq!(switch_suggestions(&index, "sjever"), ["Izvod Sjever"]);
        assert_eq!(switch_suggestions(&index, "r-1"), ["R-101", "R-102"]);
        assert_eq!(switch_suggestions(&index, "centar"), ["TS Centar 1"]);
        assert!(switch_suggestions(&index, "r1").is_empty());
    }

    #[test]
    fn suggestions_are_capped() {
        let switches = (1..=15)
            .map(|i| switch(&format!("R-{i:03}"), &format!("TS Polje {i}"), "Izvod", "IZ", None))
            .collect();
        let index = GridIndex::build(Datasets { switches, ..Default::default() }, HashMap::new()).0;

        let codes = switch_suggestions(&index, "r-0");
        assert_eq!(codes.len(), SUGGESTION_LIMIT);
        assert_eq!(codes[0], "R-001");
        assert_eq!(switch_suggestions(&index, "polje").len(), SUGGESTION_LIMIT);
    }

    #[test]
    fn exact_match_wins_over_substring() {
        let index = fixture();
        let found = find_switches(&index, "r-101");
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].code.as_deref(), Some("R-101"));

        let by_ts = find_switches(&index, "TS Centar 1");
        assert_eq!(by_ts.len(), 2);
    }

    #[test]
    fn falls_back_to_joined_substring() {
        let index = fixture();
        let found = find_switches(&index, "luke izvod");
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].code.as_deref(), Some("R-201"));
        assert!(find_switches(&index, "nepostojeći").is_empty());
        assert!(find_switches(&index, "  ").is_empty());
    }

    #[test]
    fn center_skips_switches_without_position() {
        let index = fixture();
        let found = find_switches(&index, "TS Centar 1");
        assert_eq!(switches_center(&found), Some(Coordinates::new(18.5, 44.5)));
    }
}
