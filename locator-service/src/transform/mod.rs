use crate::pipeline::{Envelope, PipelineError, Transform};
use grid_client::domain::{Feature, MeterRecord};

/// Pure validation of a `MeterRecord` row.
///
/// Rules:
/// - code must be positive.
/// - serial, when present, must be positive.
/// - contracted power, when present, must be non-negative.
pub fn validate_meter_record(env: Envelope<MeterRecord>) -> Result<Envelope<MeterRecord>, PipelineError> {
    let m = &env.payload;

    if m.code <= 0 {
        return Err(PipelineError::Transform(format!("{}: code must be positive", env.origin)));
    }

    if m.serial.is_some_and(|s| s <= 0) {
        return Err(PipelineError::Transform(format!("{}: serial must be positive", env.origin)));
    }

    if m.contracted_power.is_some_and(|p| p < 0.0) {
        return Err(PipelineError::Transform(format!(
            "{}: contracted power must be non-negative",
            env.origin
        )));
    }

    Ok(env)
}

/// Pure validation of a feature's geometry.
///
/// Rules:
/// - features without geometry are accepted (their position is unknown).
/// - a geometry's first position must be finite and inside WGS84 bounds;
///   swapped or projected coordinates are rejected here.
pub fn validate_feature(env: Envelope<Feature>) -> Result<Envelope<Feature>, PipelineError> {
    let point = env
        .payload
        .geometry
        .as_ref()
        .and_then(|g| g.representative_point());

    match point {
        Some(p) if !p.is_valid() => Err(PipelineError::Transform(format!(
            "{}: coordinates {:?} outside WGS84 bounds",
            env.origin,
            p.lon_lat()
        ))),
        _ => Ok(env),
    }
}

#[derive(Clone, Default)]
pub struct MeterRecordValidation;

#[async_trait::async_trait]
impl Transform<MeterRecord, MeterRecord> for MeterRecordValidation {
    async fn apply(&self, input: Envelope<MeterRecord>) -> Result<Envelope<MeterRecord>, PipelineError> {
        match validate_meter_record(input) {
            Ok(env) => Ok(env),
            Err(e) => {
                metrics::counter!("validation_meter_record_rejected_total").increment(1);
                Err(e)
            }
        }
    }
}

#[derive(Clone, Default)]
pub struct FeatureValidation;

#[async_trait::async_trait]
impl Transform<Feature, Feature> for FeatureValidation {
    async fn apply(&self, input: Envelope<Feature>) -> Result<Envelope<Feature>, PipelineError> {
        match validate_feature(input) {
            Ok(env) => Ok(env),
            Err(e) => {
                metrics::counter!("validation_feature_rejected_total").increment(1);
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use grid_client::domain::Coordinates;
    use serde_json::Map;

    fn meter(code: i64, serial: Option<i64>) -> Envelope<MeterRecord> {
        Envelope::new(
            MeterRecord {
                code,
                serial,
                ..Default::default()
            },
            "brojila.csv:2".to_string(),
        )
    }

    #[test]
    fn meter_record_validation_accepts_valid_record() {
        assert!(validate_meter_record(meter(1001, Some(5001))).is_ok());
        assert!(validate_meter_record(meter(1001, None)).is_ok());
    }

    #[test]
    fn meter_record_validation_rejects_non_positive_ids() {
        assert!(matches!(
            validate_meter_record(meter(0, Some(1))),
            Err(PipelineError::Transform(_))
        ));
        let err = validate_meter_record(meter(7, Some(-3))).unwrap_err();
        assert_eq!(err.to_string(), "transform error: brojila.csv:2: serial must be positive");
    }

    #[test]
    fn feature_validation_rejects_out_of_range_coordinates() {
        let ok = Feature::point(Coordinates::new(18.4, 43.8), Map::new());
        assert!(validate_feature(Envelope::new(ok, "a#0".to_string())).is_ok());

        let projected = Feature::point(Coordinates::new(6_540_000.0, 4_850_000.0), Map::new());
        assert!(validate_feature(Envelope::new(projected, "a#1".to_string())).is_err());
    }

    #[test]
    fn feature_without_geometry_is_accepted() {
        let f = Feature {
            kind: "Feature".to_string(),
            geometry: None,
            properties: Map::new(),
        };
        assert!(validate_feature(Envelope::new(f, "a#2".to_string())).is_ok());
    }
}
