use std::path::PathBuf;

use clap::{Parser, Subcommand};
use sensorgrid_core::{KeyPolicy, SensorGridConfig};

mod commands;

#[derive(Parser)]
#[command(
    name = "sensorgrid",
    about = "SensorGrid — partitioned sensor reading store",
    version,
    propagate_version = true,
)]
struct Cli {
    /// Path to sensorgrid.toml (defaults are used when omitted)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,
    /// Override [store].data_dir
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,
    /// Override [store].table
    #[arg(long, global = true)]
    table: Option<String>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Ingest one JSON reading: {"id", "name", "temperature", "humidity"}
    Ingest {
        /// File holding the payload; reads stdin when omitted or "-"
        #[arg(short, long)]
        file: Option<PathBuf>,
        /// Key policy: append (new row per call) or upsert (replace by id).
        /// Defaults to [ingest].key_policy.
        #[arg(short, long)]
        policy: Option<KeyPolicy>,
    },
    /// Average temperature and humidity over the last hour and day
    Averages {
        /// Sensor name
        sensor: String,
    },
    /// Ordered readings over the last hour or day
    Series {
        /// Sensor name
        sensor: String,
        /// "hour", anything else means a day
        #[arg(default_value = "day")]
        period: String,
    },
    /// Write a sensorgrid.toml with default settings
    Init {
        #[arg(short, long, default_value = "sensorgrid.toml")]
        path: PathBuf,
    },
}

impl Cli {
    fn load_config(&self) -> anyhow::Result<SensorGridConfig> {
        let mut config = match &self.config {
            Some(path) => SensorGridConfig::from_file(path)?,
            None => SensorGridConfig::default(),
        };
        if let Some(dir) = &self.data_dir {
            config.store.data_dir = dir.clone();
        }
        if let Some(table) = &self.table {
            config.store.table = table.clone();
        }
        config.validate()?;
        Ok(config)
    }
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("sensorgrid=info".parse()?)
        )
        .init();

    let cli = Cli::parse();

    if let Commands::Init { path } = &cli.command {
        return commands::init(path);
    }

    let config = cli.load_config()?;
    match cli.command {
        Commands::Ingest { file, policy } => {
            let policy = policy.unwrap_or(config.ingest.key_policy);
            commands::ingest::ingest(&config, file.as_deref(), policy)
        }
        Commands::Averages { sensor } => commands::query::averages(&config, &sensor),
        Commands::Series { sensor, period } => {
            commands::query::series(&config, &sensor, &period)
        }
        Commands::Init { .. } => unreachable!("handled before loading config"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn flags_override_config_file() {
        let dir = tempfile::tempdir().unwrap();
        let config_path = dir.path().join("sensorgrid.toml");
        std::fs::write(&config_path, "[store]\ntable = \"FromFile\"\n").unwrap();

        let cli = Cli::parse_from([
            "sensorgrid",
            "--config",
            config_path.to_str().unwrap(),
            "--data-dir",
            "/tmp/override",
            "series",
            "s1",
        ]);
        let config = cli.load_config().unwrap();
        assert_eq!(config.store.table, "FromFile");
        assert_eq!(config.store.data_dir, PathBuf::from("/tmp/override"));
    }

    #[test]
    fn policy_flag_parses() {
        let cli = Cli::parse_from(["sensorgrid", "ingest", "--policy", "upsert"]);
        match cli.command {
            Commands::Ingest { policy, file } => {
                assert_eq!(policy, Some(KeyPolicy::Upsert));
                assert!(file.is_none());
            }
            _ => panic!("expected ingest"),
        }
    }

    #[test]
    fn series_period_defaults_to_day() {
        let cli = Cli::parse_from(["sensorgrid", "series", "s1"]);
        match cli.command {
            Commands::Series { period, .. } => assert_eq!(period, "day"),
            _ => panic!("expected series"),
        }
    }
}
