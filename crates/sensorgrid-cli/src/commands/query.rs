use sensorgrid_core::SensorGridConfig;

use super::{open_service, print_json};

pub fn averages(config: &SensorGridConfig, sensor: &str) -> anyhow::Result<()> {
    let service = open_service(config)?;
    print_json(&service.averages(sensor)?)
}

pub fn series(config: &SensorGridConfig, sensor: &str, period: &str) -> anyhow::Result<()> {
    let service = open_service(config)?;
    print_json(&service.time_series(sensor, period)?)
}
