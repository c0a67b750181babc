//! Startup load: runs one pipeline per dataset and builds the index. Any
//! error aborts startup; the service never serves a partial index.

use std::{collections::HashMap, path::Path, sync::Arc};

use grid_client::{
    domain::{DisconnectSwitch, Feature, MeterLocation, MeterRecord, SubstationInfo},
    Datasets, GridIndex,
};

use crate::{
    config::DatasetsConfig,
    pipeline::{Pipeline, PipelineError},
    sources::{GeoJsonFileSource, MeterRecordCsvSource},
    transform::{FeatureValidation, MeterRecordValidation},
};

/// Property of the meter location features holding the meter code.
pub const METER_CODE_PROPERTY: &str = "SIFRA";

pub async fn load_index(
    cfg: &DatasetsConfig,
    org_unit_aliases: HashMap<String, Vec<String>>,
) -> Result<GridIndex, PipelineError> {
    let delimiter = u8::try_from(cfg.csv_delimiter)
        .map_err(|_| PipelineError::Source(format!("csv_delimiter '{}' is not ASCII", cfg.csv_delimiter)))?;

    let locations = load_features(Some(cfg.meter_locations.as_path()));
    let records = Pipeline::<_, MeterRecord>::new(MeterRecordCsvSource::new(&cfg.meter_records, delimiter))
        .with_transform(Arc::new(MeterRecordValidation))
        .collect();
    let substations = load_features(cfg.substations.as_deref());
    let switches = load_features(cfg.disconnect_switches.as_deref());

    let (locations, records, substations, switches) =
        tokio::try_join!(locations, records, substations, switches)?;

    for (dataset, path) in [
        ("meter_locations", Some(cfg.meter_locations.as_path())),
        ("meter_records", Some(cfg.meter_records.as_path())),
        ("substations", cfg.substations.as_deref()),
        ("disconnect_switches", cfg.disconnect_switches.as_deref()),
    ] {
        if let Some(path) = path {
            let digest = fingerprint(path).await?;
            tracing::info!(dataset, path = %path.display(), blake3 = %digest, "dataset fingerprint");
        }
    }

    let datasets = Datasets {
        locations: meter_locations(locations),
        records,
        substations: substation_infos(&substations),
        switches: switches.into_iter().map(DisconnectSwitch::from_feature).collect(),
    };
    record_loaded("meter_locations", datasets.locations.len());
    record_loaded("meter_records", datasets.records.len());
    record_loaded("substations", datasets.substations.len());
    record_loaded("disconnect_switches", datasets.switches.len());

    let (index, report) = GridIndex::build(datasets, org_unit_aliases);
    tracing::info!(
        input_rows = report.input_rows,
        dropped_missing_substation = report.missing_substation,
        dropped_duplicate_pairs = report.duplicate_pairs,
        dropped_conflicting_codes = report.conflicting_codes,
        kept = report.kept(),
        "meter records deduplicated"
    );
    tracing::info!(
        meters = index.meter_count(),
        located_meters = index.location_count(),
        customers = index.customer_count(),
        substations = index.substation_count(),
        switches = index.switch_count(),
        "grid index built"
    );

    Ok(index)
}

async fn load_features(path: Option<&Path>) -> Result<Vec<Feature>, PipelineError> {
    match path {
        Some(path) => {
            Pipeline::<_, Feature>::new(GeoJsonFileSource::new(path))
                .with_transform(Arc::new(FeatureValidation))
                .collect()
                .await
        }
        None => Ok(Vec::new()),
    }
}

fn meter_locations(features: Vec<Feature>) -> Vec<MeterLocation> {
    let mut out = Vec::with_capacity(features.len());
    for f in features {
        match f.property_integer(METER_CODE_PROPERTY) {
            Some(code) => out.push(MeterLocation {
                code,
                coordinates: f.coordinates(),
            }),
            None => record_skipped("meter_locations"),
        }
    }
    out
}

fn substation_infos(features: &[Feature]) -> Vec<SubstationInfo> {
    features
        .iter()
        .filter_map(|f| {
            let info = SubstationInfo::from_feature(f);
            if info.is_none() {
                record_skipped("substations");
            }
            info
        })
        .collect()
}

async fn fingerprint(path: &Path) -> Result<String, PipelineError> {
    let bytes = tokio::fs::read(path)
        .await
        .map_err(|e| PipelineError::Source(format!("failed to read {}: {e}", path.display())))?;
    Ok(blake3::hash(&bytes).to_hex().to_string())
}

fn record_loaded(dataset: &'static str, rows: usize) {
    metrics::counter!("dataset_rows_loaded_total", "dataset" => dataset).increment(rows as u64);
}

fn record_skipped(dataset: &'static str) {
    metrics::counter!("dataset_rows_skipped_total", "dataset" => dataset).increment(1);
    tracing::debug!(dataset, "skipping feature without identifier");
}
