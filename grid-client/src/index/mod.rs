//! The in-memory index every lookup reads from. It is built once from the
//! loaded datasets and never mutated afterwards.

use std::collections::{BTreeMap, HashMap, HashSet};

use crate::domain::{Coordinates, CustomerMeter, DisconnectSwitch, MeterLocation, MeterRecord, SubstationInfo};

pub mod meter_queries;
pub mod substation_queries;
pub mod switch_queries;

/// Fragments shorter than this never produce suggestions.
pub const SUGGESTION_MIN_CHARS: usize = 3;
/// Upper bound on suggestions returned for one fragment.
pub const SUGGESTION_LIMIT: usize = 10;

/// Raw datasets as produced by the loader.
#[derive(Debug, Default, Clone)]
pub struct Datasets {
    pub locations: Vec<MeterLocation>,
    pub records: Vec<MeterRecord>,
    pub substations: Vec<SubstationInfo>,
    pub switches: Vec<DisconnectSwitch>,
}

/// What the meter record dedup dropped, per rule.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct DedupReport {
    pub input_rows: usize,
    pub missing_substation: usize,
    pub duplicate_pairs: usize,
    pub conflicting_codes: usize,
}

impl DedupReport {
    pub fn kept(&self) -> usize {
        self.input_rows - self.missing_substation - self.duplicate_pairs - self.conflicting_codes
    }
}

#[derive(Debug, Default)]
pub struct GridIndex {
    pub(crate) locations: HashMap<i64, Coordinates>,
    pub(crate) records: BTreeMap<i64, MeterRecord>,
    pub(crate) serial_to_code: HashMap<i64, i64>,
    pub(crate) customers: BTreeMap<String, Vec<CustomerMeter>>,
    pub(crate) substations: Vec<SubstationInfo>,
    pub(crate) substation_by_name: HashMap<String, usize>,
    pub(crate) switches: Vec<DisconnectSwitch>,
    pub(crate) org_unit_aliases: HashMap<String, Vec<String>>,
}

impl GridIndex {
    /// Builds every lookup table. `org_unit_aliases` maps an organizational
    /// unit value to the raw values it stands for in the export.
    pub fn build(datasets: Datasets, org_unit_aliases: HashMap<String, Vec<String>>) -> (Self, DedupReport) {
        let mut locations = HashMap::with_capacity(datasets.locations.len());
        for loc in &datasets.locations {
            if let Some(c) = loc.coordinates {
                locations.entry(loc.code).or_insert(c);
            }
        }

        let (records, report) = dedup_meter_records(datasets.records);

        let mut serial_to_code = HashMap::with_capacity(records.len());
        let mut customers: BTreeMap<String, Vec<CustomerMeter>> = BTreeMap::new();
        for r in &records {
            if let Some(serial) = r.serial {
                serial_to_code.entry(serial).or_insert(r.code);
            }
            if let Some(name) = &r.customer {
                let owned = customers.entry(name.clone()).or_default();
                let meter = CustomerMeter::from(r);
                if !owned.contains(&meter) {
                    owned.push(meter);
                }
            }
        }

        let mut substation_by_name = HashMap::with_capacity(datasets.substations.len());
        for (i, s) in datasets.substations.iter().enumerate() {
            substation_by_name.entry(s.name.clone()).or_insert(i);
        }

        let index = Self {
            locations,
            records: records.into_iter().map(|r| (r.code, r)).collect(),
            serial_to_code,
            customers,
            substations: datasets.substations,
            substation_by_name,
            switches: datasets.switches,
            org_unit_aliases,
        };
        (index, report)
    }

    pub fn meter_count(&self) -> usize {
        self.records.len()
    }

    pub fn location_count(&self) -> usize {
        self.locations.len()
    }

    pub fn customer_count(&self) -> usize {
        self.customers.len()
    }

    pub fn substation_count(&self) -> usize {
        self.substations.len()
    }

    pub fn switch_count(&self) -> usize {
        self.switches.len()
    }
}

/// Reduces the export to one row per code.
///
/// Rules, applied in order:
/// - a row whose code is duplicated and which has no substation name is
///   dropped when another row for that code has one;
/// - rows repeating an earlier (serial, code) pair are dropped;
/// - any code still duplicated keeps its first row.
pub fn dedup_meter_records(rows: Vec<MeterRecord>) -> (Vec<MeterRecord>, DedupReport) {
    let mut report = DedupReport {
        input_rows: rows.len(),
        ..Default::default()
    };

    let mut per_code: HashMap<i64, usize> = HashMap::new();
    let mut with_substation: HashSet<i64> = HashSet::new();
    for r in &rows {
        *per_code.entry(r.code).or_default() += 1;
        if r.substation.is_some() {
            with_substation.insert(r.code);
        }
    }

    let mut seen_pairs: HashSet<(Option<i64>, i64)> = HashSet::new();
    let mut seen_codes: HashSet<i64> = HashSet::new();
    let mut kept = Vec::with_capacity(rows.len());
    for r in rows {
        if per_code[&r.code] > 1 && r.substation.is_none() && with_substation.contains(&r.code) {
            report.missing_substation += 1;
            continue;
        }
        if !seen_pairs.insert((r.serial, r.code)) {
            report.duplicate_pairs += 1;
            continue;
        }
        if !seen_codes.insert(r.code) {
            report.conflicting_codes += 1;
            continue;
        }
        kept.push(r);
    }

    (kept, report)
}

/// Lowercased, trimmed fragment if it is long enough to search with.
pub(crate) fn suggestion_needle(fragment: &str) -> Option<String> {
    let trimmed = fragment.trim();
    (trimmed.chars().count() >= SUGGESTION_MIN_CHARS).then(|| trimmed.to_lowercase())
}

pub(crate) fn contains_ci(haystack: &str, needle_lower: &str) -> bool {
    haystack.to_lowercase().contains(needle_lower)
}

pub(crate) fn eq_ci(a: &str, b: &str) -> bool {
    a.trim().to_lowercase() == b.trim().to_lowercase()
}

/// Ascending numeric order when every code is an integer, text order otherwise.
pub(crate) fn sort_codes(codes: &mut [String]) {
    let numeric: Option<Vec<i64>> = codes.iter().map(|c| c.parse().ok()).collect();
    if numeric.is_some() {
        codes.sort_by_key(|c| c.parse::<i64>().unwrap_or_default());
    } else {
        codes.sort();
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn record(code: i64, serial: i64, customer: &str, substation: Option<&str>) -> MeterRecord {
        MeterRecord {
            code,
            serial: Some(serial),
            customer: Some(customer.to_string()),
            address: Some(format!("Ulica {code}")),
            device_type: Some("ME162".to_string()),
            substation: substation.map(str::to_string),
            ..Default::default()
        }
    }

    #[test]
    fn dedup_prefers_row_with_substation() {
        let rows = vec![
            record(1001, 5001, "Petrović", None),
            record(1001, 5001, "Petrović", Some("TS Centar 1")),
            record(1002, 5002, "Jovanović", None),
        ];
        let (kept, report) = dedup_meter_records(rows);
        assert_eq!(kept.len(), 2);
        assert_eq!(kept[0].code, 1001);
        assert_eq!(kept[0].substation.as_deref(), Some("TS Centar 1"));
        assert_eq!(report.missing_substation, 1);
        assert_eq!(report.kept(), 2);
    }

    #[test]
    fn dedup_keeps_one_row_when_no_duplicate_has_substation() {
        let rows = vec![record(7, 70, "A", None), record(7, 70, "A", None)];
        let (kept, report) = dedup_meter_records(rows);
        assert_eq!(kept.len(), 1);
        assert_eq!(report.duplicate_pairs, 1);
    }

    #[test]
    fn codes_are_unique_after_dedup() {
        let rows = vec![
            record(9, 90, "A", Some("TS 1")),
            record(9, 91, "B", Some("TS 2")),
        ];
        let (kept, report) = dedup_meter_records(rows);
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].serial, Some(90));
        assert_eq!(report.conflicting_codes, 1);
    }

    #[test]
    fn build_indexes_serials_and_customers() {
        let datasets = Datasets {
            locations: vec![MeterLocation { code: 1001, coordinates: Some(Coordinates::new(18.4, 43.8)) }],
            records: vec![
                record(1001, 5001, "Petrović", Some("TS 1")),
                record(1002, 5002, "Petrović", Some("TS 1")),
            ],
            ..Default::default()
        };
        let (index, _) = GridIndex::build(datasets, HashMap::new());
        assert_eq!(index.meter_count(), 2);
        assert_eq!(index.location_count(), 1);
        assert_eq!(index.serial_to_code.get(&5002), Some(&1002));
        assert_eq!(index.customers["Petrović"].len(), 2);
    }

    #[test]
    fn codes_sort_numerically_when_possible() {
        let mut codes = vec!["10".to_string(), "9".to_string(), "100".to_string()];
        sort_codes(&mut codes);
        assert_eq!(codes, ["9", "10", "100"]);

        let mut mixed = vec!["b".to_string(), "10".to_string(), "a".to_string()];
        sort_codes(&mut mixed);
        assert_eq!(mixed, ["10", "a", "b"]);
    }
}
