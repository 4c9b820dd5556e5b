use std::io::Read;
use std::path::Path;

use sensorgrid_core::{KeyPolicy, SensorGridConfig};
use tracing::info;

use super::{open_service, print_json};

pub fn ingest(config: &SensorGridConfig, file: Option<&Path>, policy: KeyPolicy) -> anyhow::Result<()> {
    let payload = read_payload(file)?;
    let service = open_service(config)?;
    let ack = service.ingest(&payload, policy)?;
    info!("{ack}");
    print_json(&ack)
}

fn read_payload(file: Option<&Path>) -> anyhow::Result<Vec<u8>> {
    match file {
        Some(path) if path != Path::new("-") => Ok(std::fs::read(path)?),
        _ => {
            let mut buf = Vec::new();
            std::io::stdin().read_to_end(&mut buf)?;
            Ok(buf)
        }
    }
}
