use serde::Serialize;

use super::{contains_ci, eq_ci, sort_codes, suggestion_needle, GridIndex, SUGGESTION_LIMIT};
use crate::domain::{Coordinates, CustomerMeter, MeterRecord};

/// A meter record together with its position, when one is known.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MeterLookup<'a> {
    pub record: &'a MeterRecord,
    pub coordinates: Option<Coordinates>,
}

/// A meter record that has a position; used by the map browsing queries.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlacedMeter<'a> {
    pub record: &'a MeterRecord,
    pub coordinates: Coordinates,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CustomerSuggestion {
    #[serde(rename = "kupac")]
    pub customer: String,
    #[serde(rename = "serijski_broj")]
    pub serial: Option<i64>,
    #[serde(rename = "adresa")]
    pub address: Option<String>,
}

/// Fetch the record stored for a meter code.
pub fn meter_by_code(index: &GridIndex, code: i64) -> Option<MeterLookup<'_>> {
    let record = index.records.get(&code)?;
    Some(MeterLookup {
        record,
        coordinates: index.locations.get(&code).copied(),
    })
}

pub fn code_for_serial(index: &GridIndex, serial: i64) -> Option<i64> {
    index.serial_to_code.get(&serial).copied()
}

/// Customers whose name contains the fragment, one entry per owned meter.
pub fn customer_suggestions(index: &GridIndex, fragment: &str) -> Vec<CustomerSuggestion> {
    let Some(needle) = suggestion_needle(fragment) else {
        return Vec::new();
    };

    index
        .customers
        .iter()
        .filter(|(name, _)| contains_ci(name, &needle))
        .flat_map(|(name, meters)| {
            meters.iter().map(move |m| CustomerSuggestion {
                customer: name.clone(),
                serial: m.serial,
                address: m.address.clone(),
            })
        })
        .take(SUGGESTION_LIMIT)
        .collect()
}

/// All meters owned by a customer. The name is matched exactly first and
/// case-insensitively second, mirroring how suggestions match.
pub fn customer_meters<'a>(index: &'a GridIndex, name: &str) -> Option<(&'a str, &'a [CustomerMeter])> {
    let name = name.trim();
    index
        .customers
        .get_key_value(name)
        .or_else(|| index.customers.iter().find(|(k, _)| eq_ci(k, name)))
        .map(|(k, v)| (k.as_str(), v.as_slice()))
}

fn expand_org_unit<'a>(index: &'a GridIndex, org_unit: &'a str) -> Vec<&'a str> {
    match index.org_unit_aliases.get(org_unit) {
        Some(raw) => raw.iter().map(String::as_str).collect(),
        None => vec![org_unit],
    }
}

/// Distinct sub-unit codes of an organizational unit, ascending.
pub fn sub_units(index: &GridIndex, org_unit: &str) -> Vec<String> {
    let org_unit = org_unit.trim();
    let units = expand_org_unit(index, org_unit);

    let mut codes: Vec<String> = index
        .records
        .values()
        .filter(|r| r.org_unit.as_deref().is_some_and(|oj| units.contains(&oj)))
        .filter_map(|r| r.sub_unit.clone())
        .collect();
    sort_codes(&mut codes);
    codes.dedup();
    codes
}

/// Meters with a position under an (organizational unit, sub-unit) pair.
/// Records without coordinates are left out.
pub fn meters_in_unit<'a>(index: &'a GridIndex, org_unit: &str, sub_unit: &str) -> Vec<PlacedMeter<'a>> {
    let org_unit = org_unit.trim();
    let sub_unit = sub_unit.trim();
    let units = expand_org_unit(index, org_unit);

    placed(
        index,
        index.records.values().filter(|r| {
            r.org_unit.as_deref().is_some_and(|oj| units.contains(&oj))
                && r.sub_unit.as_deref() == Some(sub_unit)
        }),
    )
}

/// Distinct substation names referenced by meter records, sorted.
pub fn substation_names<'a>(index: &'a GridIndex, search: Option<&str>) -> Vec<&'a str> {
    let needle = search.map(|s| s.trim().to_lowercase()).filter(|s| !s.is_empty());

    let mut names: Vec<&str> = index
        .records
        .values()
        .filter_map(|r| r.substation.as_deref())
        .filter(|name| needle.as_deref().map_or(true, |n| contains_ci(name, n)))
        .collect();
    names.sort_unstable();
    names.dedup();
    names
}

/// Meters with a position fed by the named substation. Exact name match
/// first, case-insensitive match only when no record carries the exact name.
/// The choice is made before meters without a position are dropped.
pub fn meters_at_substation<'a>(index: &'a GridIndex, name: &str) -> Vec<PlacedMeter<'a>> {
    let name = name.trim();
    let exact_known = index
        .records
        .values()
        .any(|r| r.substation.as_deref() == Some(name));

    if exact_known {
        placed(
            index,
            index.records.values().filter(|r| r.substation.as_deref() == Some(name)),
        )
    } else {
        placed(
            index,
            index
                .records
                .values()
                .filter(|r| r.substation.as_deref().is_some_and(|ts| eq_ci(ts, name))),
        )
    }
}

fn placed<'a>(index: &'a GridIndex, records: impl Iterator<Item = &'a MeterRecord>) -> Vec<PlacedMeter<'a>> {
    records
        .filter_map(|record| {
            index
                .locations
                .get(&record.code)
                .map(|c| PlacedMeter { record, coordinates: *c })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;
    use crate::domain::MeterLocation;
    use crate::index::tests::record;
    use crate::index::{Datasets, SUGGESTION_LIMIT};

    fn unit_record(code: i64, oj: &str, oh: &str, ts: &str) -> MeterRecord {
        MeterRecord {
            org_unit: Some(oj.to_string()),
            sub_unit: Some(oh.to_string()),
            hierarchy: Some(format!("{oj}-{oh}")),
            ..record(code, code + 5000, &format!("Kupac {code}"), Some(ts))
        }
    }

    fn fixture() -> GridIndex {
        let records = vec![
            record(1001, 5001, "Petrović Marko", None),
            record(1001, 5001, "Petrović Marko", Some("TS Centar 1")),
            record(1002, 5002, "Petrović Marko", Some("TS Centar 1")),
            record(1003, 5003, "Jovanović Ana", Some("TS Luke")),
            unit_record(2001, "303", "12", "TS Sjever"),
            unit_record(2002, "304", "3", "TS Sjever"),
            unit_record(2003, "304", "12", "ts sjever"),
            unit_record(2004, "305", "7", "TS Jug"),
        ];
        let locations = [1001, 1003, 2001, 2002, 2004]
            .into_iter()
            .map(|code| MeterLocation {
                code,
                coordinates: Some(Coordinates::new(18.0 + code as f64 / 10_000.0, 44.0)),
            })
            .collect();
        let aliases = HashMap::from([("303".to_string(), vec!["303".to_string(), "304".to_string()])]);
        GridIndex::build(Datasets { locations, records, ..Default::default() }, aliases).0
    }

    #[test]
    fn lookup_reports_missing_coordinates_separately() {
        let index = fixture();
        let with = meter_by_code(&index, 1001).unwrap();
        assert_eq!(with.record.substation.as_deref(), Some("TS Centar 1"));
        assert!(with.coordinates.is_some());

        let without = meter_by_code(&index, 1002).unwrap();
        assert!(without.coordinates.is_none());

        assert!(meter_by_code(&index, 9999).is_none());
    }

    #[test]
    fn serial_resolves_to_same_record_as_code() {
        let index = fixture();
        let code = code_for_serial(&index, 5003).unwrap();
        assert_eq!(code, 1003);
        assert_eq!(meter_by_code(&index, code).unwrap().record.customer.as_deref(), Some("Jovanović Ana"));
        assert_eq!(code_for_serial(&index, 1), None);
    }

    #[test]
    fn customer_owning_two_meters_keeps_both_tuples() {
        let index = fixture();
        let (name, meters) = customer_meters(&index, "petrović marko").unwrap();
        assert_eq!(name, "Petrović Marko");
        assert_eq!(meters.len(), 2);
        assert_ne!(meters[0], meters[1]);
        assert_eq!(meters.iter().map(|m| m.code).collect::<Vec<_>>(), [1001, 1002]);
    }

    #[test]
    fn suggestions_need_three_chars_and_are_capped() {
        let index = fixture();
        assert!(customer_suggestions(&index, "pe").is_empty());
        assert!(customer_suggestions(&index, "  pe  ").is_empty());
        assert_eq!(customer_suggestions(&index, "ROVIĆ").len(), 2);
        assert!(customer_suggestions(&index, "Kupac").len() <= SUGGESTION_LIMIT);

        let many: Vec<MeterRecord> = (0..25).map(|i| record(i, 100 + i, &format!("Marković {i}"), Some("TS"))).collect();
        let (big, _) = GridIndex::build(Datasets { records: many, ..Default::default() }, HashMap::new());
        assert_eq!(customer_suggestions(&big, "mark").len(), SUGGESTION_LIMIT);
    }

    #[test]
    fn alias_unit_lists_union_of_raw_units() {
        let index = fixture();
        assert_eq!(sub_units(&index, "303"), ["3", "12"]);
        assert_eq!(sub_units(&index, "304"), ["3", "12"]);
        assert_eq!(sub_units(&index, "305"), ["7"]);
        assert!(sub_units(&index, "999").is_empty());
    }

    #[test]
    fn unit_browse_skips_meters_without_position() {
        let index = fixture();
        let placed = meters_in_unit(&index, "303", "12");
        assert_eq!(placed.len(), 1);
        assert_eq!(placed[0].record.code, 2001);
    }

    #[test]
    fn substation_names_are_distinct_and_filterable() {
        let index = fixture();
        assert_eq!(
            substation_names(&index, None),
            ["TS Centar 1", "TS Jug", "TS Luke", "TS Sjever", "ts sjever"]
        );
        assert_eq!(substation_names(&index, Some("sjev")), ["TS Sjever", "ts sjever"]);
    }

    #[test]
    fn substation_browse_falls_back_to_case_insensitive() {
        let index = fixture();
        let exact = meters_at_substation(&index, "TS Sjever");
        assert_eq!(exact.len(), 2);

        let folded = meters_at_substation(&index, "TS LUKE");
        assert_eq!(folded.len(), 1);
        assert_eq!(folded[0].record.code, 1003);

        assert!(meters_at_substation(&index, "TS Nema").is_empty());
    }

    #[test]
    fn exact_name_without_positions_does_not_borrow_other_casing() {
        let index = fixture();
        // Only 2003 is filed under "ts sjever", and it has no position.
        assert!(meters_at_substation(&index, "ts sjever").is_empty());
    }
}
