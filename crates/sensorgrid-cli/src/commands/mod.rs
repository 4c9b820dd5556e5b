pub mod ingest;
pub mod query;

use std::path::Path;

use anyhow::Context;
use sensorgrid_core::SensorGridConfig;
use sensorgrid_core::SensorService;
use sensorgrid_state::RedbTable;

/// Open the configured store and wrap it in a service.
pub fn open_service(config: &SensorGridConfig) -> anyhow::Result<SensorService<RedbTable>> {
    let table = RedbTable::from_config(&config.store).with_context(|| {
        format!("opening store at {}", config.store.database_path().display())
    })?;
    Ok(SensorService::new(table))
}

/// Print `value` as pretty JSON on stdout.
pub fn print_json<T: serde::Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

pub fn init(path: &Path) -> anyhow::Result<()> {
    if path.exists() {
        anyhow::bail!("{} already exists", path.display());
    }
    std::fs::write(path, SensorGridConfig::default().to_toml_string()?)?;
    eprintln!("wrote {}", path.display());
    Ok(())
}
