//! SensorService — ingestion and query orchestration over a table handle.
//!
//! Every operation has a `*_at` variant taking the reference instant
//! explicitly; the plain variants capture `Utc::now()` once and delegate.

use chrono::{DateTime, Utc};
use tracing::{debug, info};

use crate::aggregate::window_average;
use crate::error::SensorResult;
use crate::keys::KeyPolicy;
use crate::reading::{parse_reading, validate_name};
use crate::series::format_series;
use crate::table::PartitionedTable;
use crate::types::{IngestAck, Reading, SensorAverages, TimeSeriesPoint, Window};

/// Ingests readings into and queries readings out of one table.
///
/// Holds no mutable state of its own; clone the table handle (e.g. an
/// `Arc`) to share a service across threads.
#[derive(Debug, Clone)]
pub struct SensorService<T> {
    table: T,
}

impl<T: PartitionedTable> SensorService<T> {
    pub fn new(table: T) -> Self {
        Self { table }
    }

    pub fn table(&self) -> &T {
        &self.table
    }

    // ── Ingestion ──────────────────────────────────────────────────

    /// Validate `payload` and store it under `policy`.
    pub fn ingest(&self, payload: &[u8], policy: KeyPolicy) -> SensorResult<IngestAck> {
        self.ingest_at(payload, policy, Utc::now())
    }

    pub fn ingest_at(
        &self,
        payload: &[u8],
        policy: KeyPolicy,
        now: DateTime<Utc>,
    ) -> SensorResult<IngestAck> {
        info!(%policy, bytes = payload.len(), "received sensor payload");
        let reading = parse_reading(payload)?;
        self.store_reading_at(&reading, policy, now)
    }

    /// Store an already-validated reading.
    pub fn store_reading_at(
        &self,
        reading: &Reading,
        policy: KeyPolicy,
        now: DateTime<Utc>,
    ) -> SensorResult<IngestAck> {
        validate_name(&reading.name)?;
        self.table.ensure_namespace()?;

        let (entity, mode) = policy.entity(reading, now);
        let outcome = self.table.write(&entity, mode)?;
        debug!(
            sensor = %entity.partition_key,
            row_key = %entity.row_key,
            ?outcome,
            "sensor reading stored"
        );
        Ok(IngestAck {
            table: self.table.name().to_string(),
            partition_key: entity.partition_key,
            row_key: entity.row_key,
            outcome,
        })
    }

    // ── Queries ────────────────────────────────────────────────────

    /// Last-hour and last-day averages for `sensor`.
    pub fn averages(&self, sensor: &str) -> SensorResult<SensorAverages> {
        self.averages_at(sensor, Utc::now())
    }

    pub fn averages_at(&self, sensor: &str, now: DateTime<Utc>) -> SensorResult<SensorAverages> {
        info!(%sensor, "calculating averages");
        self.table.ensure_namespace()?;

        let avg_last_hour = window_average(
            self.table
                .range_query(sensor, Window::Hour.cutoff(now))?,
        )?;
        let avg_last_day = window_average(
            self.table
                .range_query(sensor, Window::Day.cutoff(now))?,
        )?;

        Ok(SensorAverages {
            sensor_name: sensor.to_string(),
            avg_last_hour,
            avg_last_day,
        })
    }

    /// Ordered readings for `sensor` over the window named by `period`.
    pub fn time_series(&self, sensor: &str, period: &str) -> SensorResult<Vec<TimeSeriesPoint>> {
        self.time_series_at(sensor, period, Utc::now())
    }

    pub fn time_series_at(
        &self,
        sensor: &str,
        period: &str,
        now: DateTime<Utc>,
    ) -> SensorResult<Vec<TimeSeriesPoint>> {
        let window = Window::from_period(period);
        info!(%sensor, %window, "fetching time series");
        self.table.ensure_namespace()?;

        let points = format_series(self.table.range_query(sensor, window.cutoff(now))?)?;
        debug!(%sensor, points = points.len(), "time series fetched");
        Ok(points)
    }
}
