//! Time-series projection of a range-query sequence.

use crate::error::SensorResult;
use crate::types::{StoredEntity, TimeSeriesPoint};

/// Materialize `scan` into points sorted ascending by timestamp.
///
/// The sort does not trust storage order: upsert row keys are external ids
/// and say nothing about time. Points sharing a timestamp keep scan order.
pub fn format_series<I>(scan: I) -> SensorResult<Vec<TimeSeriesPoint>>
where
    I: IntoIterator<Item = SensorResult<StoredEntity>>,
{
    let mut points = scan
        .into_iter()
        .map(|entity| entity.map(TimeSeriesPoint::from))
        .collect::<SensorResult<Vec<_>>>()?;
    points.sort_by_key(|p| p.timestamp);
    Ok(points)
}
