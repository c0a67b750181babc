pub mod geojson_file;
pub mod meter_records_csv;

pub use geojson_file::GeoJsonFileSource;
pub use meter_records_csv::MeterRecordCsvSource;
