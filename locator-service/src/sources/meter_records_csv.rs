use std::{collections::HashMap, fs::File, path::PathBuf};

use csv::StringRecord;
use grid_client::{
    domain::{meter::parse_date, MeterRecord},
    sanitize::{self, clean_code, clean_text},
};

use crate::pipeline::{Envelope, EnvelopeStream, PipelineError, Source};

pub const CODE: &str = "Šifra";
pub const DEVICE_TYPE: &str = "Tip brojila";
pub const MANUFACTURED_ON: &str = "Datum proizvodnje";
pub const CALIBRATED_ON: &str = "Datum baždarenja";
pub const INSTALLED_ON: &str = "Datum ugradnje";
pub const SERIAL: &str = "Serijski broj";
pub const CUSTOMER: &str = "Kupac";
pub const ADDRESS: &str = "Adresa";
pub const TARIFF_GROUP: &str = "Tarifna grupa";
pub const CONTRACTED_POWER: &str = "Angažovana snaga";
pub const SUBSTATION: &str = "Naziv TS";
pub const ORG_UNIT: &str = "OJ";
pub const SUB_UNIT: &str = "OH";
pub const HIERARCHY: &str = "Hijerarhija";

/// CSV source for the meter/customer export.
///
/// Header names are trimmed; columns with an empty header or a spreadsheet
/// placeholder header (`Unnamed: 3`) are ignored. Only the code column is
/// required. Rows with a blank code are skipped; a code or serial that is
/// not an integer fails the load.
pub struct MeterRecordCsvSource {
    path: PathBuf,
    delimiter: u8,
}

impl MeterRecordCsvSource {
    pub fn new<P: Into<PathBuf>>(path: P, delimiter: u8) -> Self {
        Self {
            path: path.into(),
            delimiter,
        }
    }
}

/// Header name → column position, after cleaning.
#[derive(Debug)]
struct Columns(HashMap<String, usize>);

impl Columns {
    fn from_headers(headers: &StringRecord) -> Result<Self, PipelineError> {
        let mut map = HashMap::new();
        for (idx, raw) in headers.iter().enumerate() {
            let name = raw.trim_start_matches('\u{feff}').trim();
            if name.is_empty() || name.starts_with("Unnamed:") {
                continue;
            }
            map.entry(name.to_string()).or_insert(idx);
        }
        if !map.contains_key(CODE) {
            return Err(PipelineError::Source(format!("missing column '{CODE}' in CSV header")));
        }
        Ok(Self(map))
    }

    fn get<'r>(&self, record: &'r StringRecord, name: &str) -> &'r str {
        self.0
            .get(name)
            .and_then(|&idx| record.get(idx))
            .unwrap_or("")
    }
}

fn parse_id(raw: &str, column: &str, origin: &str) -> Result<Option<i64>, PipelineError> {
    sanitize::parse_integer(raw)
        .map_err(|e| PipelineError::Source(format!("{origin}: invalid {column}: {e}")))
}

fn record_to_meter_record(
    record: &StringRecord,
    columns: &Columns,
    origin: &str,
) -> Result<Option<MeterRecord>, PipelineError> {
    let get = |name: &str| columns.get(record, name);

    let Some(code) = parse_id(get(CODE), CODE, origin)? else {
        return Ok(None);
    };
    let serial = parse_id(get(SERIAL), SERIAL, origin)?;

    let contracted_power = match sanitize::parse_decimal(get(CONTRACTED_POWER)) {
        Ok(v) => v,
        Err(e) => {
            tracing::warn!(%origin, error = %e, "ignoring unreadable contracted power");
            None
        }
    };

    Ok(Some(MeterRecord {
        code,
        device_type: clean_text(get(DEVICE_TYPE)),
        manufactured_on: parse_date(get(MANUFACTURED_ON)),
        calibrated_on: parse_date(get(CALIBRATED_ON)),
        installed_on: parse_date(get(INSTALLED_ON)),
        serial,
        customer: clean_text(get(CUSTOMER)),
        address: clean_text(get(ADDRESS)),
        tariff_group: clean_code(get(TARIFF_GROUP)),
        contracted_power,
        substation: clean_text(get(SUBSTATION)),
        org_unit: clean_code(get(ORG_UNIT)),
        sub_unit: clean_code(get(SUB_UNIT)),
        hierarchy: clean_code(get(HIERARCHY)),
    }))
}

#[async_trait::async_trait]
impl Source<MeterRecord> for MeterRecordCsvSource {
    async fn stream(&self) -> EnvelopeStream<MeterRecord> {
        // This source uses a blocking CSV reader but is wrapped in a single async task.
        // The export is read once at startup, before the listener is bound.
        let path = self.path.clone();
        let delimiter = self.delimiter;
        let s = async_stream::try_stream! {
            let file = File::open(&path)
                .map_err(|e| PipelineError::Source(format!("failed to open {}: {e}", path.display())))?;
            let mut rdr = csv::ReaderBuilder::new()
                .delimiter(delimiter)
                .flexible(true)
                .from_reader(file);
            let headers = rdr
                .headers()
                .map_err(|e| PipelineError::Source(format!("failed to read CSV headers: {e}")))?
                .clone();
            let columns = Columns::from_headers(&headers)?;
            let name = path.file_name().map(|n| n.to_string_lossy().into_owned()).unwrap_or_default();

            for result in rdr.records() {
                let record = result.map_err(|e| PipelineError::Source(format!(
                    "failed to read CSV record: {e}"
                )))?;
                let line = record.position().map(|p| p.line()).unwrap_or_default();
                let origin = format!("{name}:{line}");

                let parsed = match record_to_meter_record(&record, &columns, &origin) {
                    Ok(r) => r,
                    Err(e) => {
                        metrics::counter!("meter_records_csv_parse_errors_total").increment(1);
                        Err(e)?
                    }
                };

                match parsed {
                    Some(meter) => {
                        yield Envelope::new(meter, origin);
                    }
                    None => {
                        metrics::counter!("dataset_rows_skipped_total", "dataset" => "meter_records").increment(1);
                        tracing::debug!(%origin, "skipping row without code");
                    }
                }
            }
        };

        Box::pin(s)
    }
}
