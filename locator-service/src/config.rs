use serde::{Deserialize, Serialize};
use std::{collections::HashMap, fs, path::PathBuf};

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub bind_addr: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatasetsConfig {
    /// Feature collection of meter positions keyed by `SIFRA`.
    pub meter_locations: PathBuf,
    /// Tabular meter/customer export.
    pub meter_records: PathBuf,
    pub substations: Option<PathBuf>,
    pub disconnect_switches: Option<PathBuf>,
    #[serde(default = "default_csv_delimiter")]
    pub csv_delimiter: char,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MapsConfig {
    #[serde(default = "default_maps_base_url")]
    pub base_url: String,
    /// `[lat, lon]` used when there is nothing to center on.
    #[serde(default = "default_center")]
    pub default_center: [f64; 2],
}

#[derive(Debug, Clone, Deserialize)]
pub struct OrgUnitsConfig {
    #[serde(default = "default_org_unit_aliases")]
    pub aliases: HashMap<String, Vec<String>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AllowedDocument {
    pub filename: String,
    pub label: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DocumentsConfig {
    #[serde(default = "default_documents_dir")]
    pub dir: PathBuf,
    #[serde(default)]
    pub allowed: Vec<AllowedDocument>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MetricsConfig {
    pub bind_addr: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub datasets: DatasetsConfig,
    #[serde(default)]
    pub maps: MapsConfig,
    #[serde(default)]
    pub org_units: OrgUnitsConfig,
    #[serde(default)]
    pub documents: DocumentsConfig,
    pub metrics: Option<MetricsConfig>,
}

impl AppConfig {
    pub fn load() -> anyhow::Result<Self> {
        use std::env;

        let path = env::var("LOCATOR_CONFIG").unwrap_or_else(|_| "locator-config.toml".to_string());
        let contents = fs::read_to_string(&path)
            .map_err(|e| anyhow::anyhow!("failed to read config {path}: {e}"))?;
        Self::from_toml(&contents)
    }

    pub fn from_toml(contents: &str) -> anyhow::Result<Self> {
        let cfg: AppConfig = toml::from_str(contents)?;
        Ok(cfg)
    }
}

impl Default for MapsConfig {
    fn default() -> Self {
        Self {
            base_url: default_maps_base_url(),
            default_center: default_center(),
        }
    }
}

impl Default for OrgUnitsConfig {
    fn default() -> Self {
        Self {
            aliases: default_org_unit_aliases(),
        }
    }
}

impl Default for DocumentsConfig {
    fn default() -> Self {
        Self {
            dir: default_documents_dir(),
            allowed: Vec::new(),
        }
    }
}

fn default_csv_delimiter() -> char {
    ','
}

fn default_maps_base_url() -> String {
    "https://www.google.com/maps".to_string()
}

fn default_center() -> [f64; 2] {
    [43.8563, 18.4131]
}

// OJ 303 was split in two in the export but is still browsed as one unit.
fn default_org_unit_aliases() -> HashMap<String, Vec<String>> {
    HashMap::from([("303".to_string(), vec!["303".to_string(), "304".to_string()])])
}

fn default_documents_dir() -> PathBuf {
    PathBuf::from("static/docs")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minimal_config_gets_defaults() {
        let cfg = AppConfig::from_toml(
            r#"
            [server]
            bind_addr = "127.0.0.1:5000"

            [datasets]
            meter_locations = "data/data.json"
            meter_records = "data/brojila.csv"
            "#,
        )
        .unwrap();

        assert_eq!(cfg.datasets.csv_delimiter, ',');
        assert!(cfg.datasets.substations.is_none());
        assert_eq!(cfg.maps.base_url, "https://www.google.com/maps");
        assert_eq!(cfg.org_units.aliases["303"], ["303", "304"]);
        assert!(cfg.documents.allowed.is_empty());
        assert!(cfg.metrics.is_none());
    }

    #[test]
    fn full_config_parses() {
        let cfg = AppConfig::from_toml(
            r#"
            [server]
            bind_addr = "0.0.0.0:8080"

            [datasets]
            meter_locations = "a.geojson"
            meter_records = "b.csv"
            substations = "ts.geojson"
            disconnect_switches = "r.geojson"
            csv_delimiter = ";"

            [maps]
            base_url = "https://maps.example.org"
            default_center = [44.5, 18.6]

            [org_units.aliases]
            "100" = ["101", "102"]

            [documents]
            dir = "docs"
            allowed = [{ filename = "Uputstvo.pdf", label = "Uputstvo" }]

            [metrics]
            bind_addr = "0.0.0.0:9100"
            "#,
        )
        .unwrap();

        assert_eq!(cfg.datasets.csv_delimiter, ';');
        assert_eq!(cfg.maps.default_center, [44.5, 18.6]);
        assert!(!cfg.org_units.aliases.contains_key("303"));
        assert_eq!(cfg.documents.allowed[0].filename, "Uputstvo.pdf");
        assert_eq!(cfg.metrics.unwrap().bind_addr, "0.0.0.0:9100");
    }
}
