//! Loads the configured datasets exactly as the server would and exits.
//! A non-zero exit status means the server would refuse to start.

use anyhow::Result;
use locator_service::{config::AppConfig, loader, observability};

#[tokio::main]
async fn main() -> Result<()> {
    observability::init_tracing();

    let cfg = AppConfig::load()?;
    let index = loader::load_index(&cfg.datasets, cfg.org_units.aliases.clone()).await?;

    println!(
        "ok: {} meters ({} located), {} customers, {} substations, {} switches",
        index.meter_count(),
        index.location_count(),
        index.customer_count(),
        index.substation_count(),
        index.switch_count(),
    );
    Ok(())
}
