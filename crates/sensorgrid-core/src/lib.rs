//! sensorgrid-core — storage and query core for SensorGrid.
//!
//! Readings arrive as JSON, are validated leniently, keyed into a
//! partition per sensor, and written through the [`PartitionedTable`]
//! contract. Queries scan one partition from a cutoff instant and either
//! average the window or project it into an ordered time series.
//!
//! # Architecture
//!
//! ```text
//! ingest:  reading::parse_reading -> KeyPolicy::derive -> PartitionedTable::write
//! query:   PartitionedTable::range_query -> aggregate::window_average
//!                                        -> series::format_series
//! ```
//!
//! [`SensorService`] wires these together around an explicitly passed
//! table handle. [`MemoryTable`] is the in-process implementation; the
//! redb-backed one lives in `sensorgrid-state`.

pub mod aggregate;
pub mod config;
pub mod error;
pub mod keys;
pub mod reading;
pub mod series;
pub mod service;
pub mod table;
pub mod types;

pub use config::SensorGridConfig;
pub use error::{SensorError, SensorResult};
pub use keys::{EntityKey, KeyPolicy, WriteMode};
pub use service::SensorService;
pub use table::{EntityScan, MemoryTable, PartitionedTable};
pub use types::*;
