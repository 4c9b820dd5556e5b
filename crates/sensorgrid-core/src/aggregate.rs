//! Window aggregation over a range-query sequence.

use crate::error::SensorResult;
use crate::types::{StoredEntity, WindowAverage};

/// Running sums for one window.
#[derive(Debug, Default, Clone, Copy)]
struct Accumulator {
    temperature: f64,
    humidity: f64,
    count: u64,
}

impl Accumulator {
    fn push(&mut self, entity: &StoredEntity) {
        self.temperature += entity.temperature;
        self.humidity += f64::from(entity.humidity);
        self.count += 1;
    }

    fn finish(self) -> WindowAverage {
        if self.count == 0 {
            return WindowAverage::default();
        }
        let n = self.count as f64;
        WindowAverage {
            temperature: Some(self.temperature / n),
            humidity: Some(self.humidity / n),
        }
    }
}

/// Mean temperature and humidity across every entity in `scan`.
///
/// An empty sequence yields `None` for both values. The first scan error
/// aborts the aggregation and is returned as-is.
pub fn window_average<I>(scan: I) -> SensorResult<WindowAverage>
where
    I: IntoIterator<Item = SensorResult<StoredEntity>>,
{
    let mut acc = Accumulator::default();
    for entity in scan {
        acc.push(&entity?);
    }
    Ok(acc.finish())
}
