use serde::{Serialize, Serializer};
use time::{macros::format_description, Date};

use super::Coordinates;

/// Position of a metering point, keyed by its code ("Šifra").
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MeterLocation {
    pub code: i64,
    pub coordinates: Option<Coordinates>,
}

/// One row of the meter/customer export.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct MeterRecord {
    #[serde(rename = "sifra")]
    pub code: i64,
    #[serde(rename = "tip_brojila")]
    pub device_type: Option<String>,
    #[serde(rename = "datum_proizvodnje", serialize_with = "display_date")]
    pub manufactured_on: Option<Date>,
    #[serde(rename = "datum_bazdarenja", serialize_with = "display_date")]
    pub calibrated_on: Option<Date>,
    #[serde(rename = "datum_ugradnje", serialize_with = "display_date")]
    pub installed_on: Option<Date>,
    #[serde(rename = "serijski_broj")]
    pub serial: Option<i64>,
    #[serde(rename = "kupac")]
    pub customer: Option<String>,
    #[serde(rename = "adresa")]
    pub address: Option<String>,
    #[serde(rename = "tarifna_grupa")]
    pub tariff_group: Option<String>,
    #[serde(rename = "angazovana_snaga")]
    pub contracted_power: Option<f64>,
    #[serde(rename = "naziv_ts")]
    pub substation: Option<String>,
    #[serde(skip)]
    pub org_unit: Option<String>,
    #[serde(skip)]
    pub sub_unit: Option<String>,
    #[serde(skip)]
    pub hierarchy: Option<String>,
}

/// One meter owned by a customer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CustomerMeter {
    #[serde(rename = "serijski_broj")]
    pub serial: Option<i64>,
    #[serde(rename = "adresa")]
    pub address: Option<String>,
    #[serde(rename = "sifra")]
    pub code: i64,
}

impl From<&MeterRecord> for CustomerMeter {
    fn from(r: &MeterRecord) -> Self {
        CustomerMeter {
            serial: r.serial,
            address: r.address.clone(),
            code: r.code,
        }
    }
}

/// Parses the date spellings found in the exports: `1.2.2020`, `01.02.2020.`,
/// `2020-02-01` and any of those followed by a time part.
pub fn parse_date(raw: &str) -> Option<Date> {
    let day_part = raw.trim().split([' ', 'T']).next()?.trim_end_matches('.');
    if day_part.is_empty() {
        return None;
    }
    let dotted = format_description!("[day padding:none].[month padding:none].[year]");
    let iso = format_description!("[year]-[month padding:none]-[day padding:none]");
    Date::parse(day_part, dotted)
        .or_else(|_| Date::parse(day_part, iso))
        .ok()
}

fn display_date<S: Serializer>(date: &Option<Date>, serializer: S) -> Result<S::Ok, S::Error> {
    match date {
        Some(d) => {
            let text = d
                .format(format_description!("[day].[month].[year]"))
                .map_err(serde::ser::Error::custom)?;
            serializer.serialize_str(&text)
        }
        None => serializer.serialize_none(),
    }
}
