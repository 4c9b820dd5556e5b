//! The partitioned table contract and an in-memory implementation.
//!
//! A table is a namespace of entities grouped by partition key (sensor
//! name) and ordered by row key within each partition. Implementations
//! must be safe to share across threads; callers hold no locks of their
//! own.

use std::collections::{BTreeMap, VecDeque};
use std::ops::Bound;
use std::sync::{Arc, RwLock};

use chrono::{DateTime, Utc};
use tracing::debug;

use crate::error::{SensorError, SensorResult};
use crate::keys::WriteMode;
use crate::types::{StoredEntity, WriteOutcome};

/// Default number of entities fetched per page of a range scan.
pub const DEFAULT_SCAN_PAGE_SIZE: usize = 256;

/// Lazy, finite sequence of entities produced by a range query.
pub type EntityScan<'a> = Box<dyn Iterator<Item = SensorResult<StoredEntity>> + 'a>;

/// Storage contract used by [`crate::SensorService`].
pub trait PartitionedTable: Send + Sync {
    /// Namespace (table) name.
    fn name(&self) -> &str;

    /// Create the namespace if it does not exist yet. Idempotent.
    fn ensure_namespace(&self) -> SensorResult<()>;

    /// Persist one entity. With [`WriteMode::InsertOnly`] an existing
    /// `(partition_key, row_key)` fails with [`SensorError::Conflict`] and
    /// nothing is written.
    fn write(&self, entity: &StoredEntity, mode: WriteMode) -> SensorResult<WriteOutcome>;

    /// Entities of `partition` whose timestamp is at or after `since`, in
    /// row-key order. The sequence is fetched lazily; dropping it early is
    /// always safe.
    fn range_query(&self, partition: &str, since: DateTime<Utc>) -> SensorResult<EntityScan<'_>>;
}

impl<T: PartitionedTable + ?Sized> PartitionedTable for Arc<T> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn ensure_namespace(&self) -> SensorResult<()> {
        (**self).ensure_namespace()
    }

    fn write(&self, entity: &StoredEntity, mode: WriteMode) -> SensorResult<WriteOutcome> {
        (**self).write(entity, mode)
    }

    fn range_query(&self, partition: &str, since: DateTime<Utc>) -> SensorResult<EntityScan<'_>> {
        (**self).range_query(partition, since)
    }
}

// ── Paged scans ───────────────────────────────────────────────────

type FetchPage<'a> = Box<dyn FnMut(Option<&str>, usize) -> SensorResult<Vec<StoredEntity>> + 'a>;

/// Cursor-driven scan over one partition.
///
/// `fetch(after, limit)` returns up to `limit` entities whose row key sorts
/// strictly after `after` (or from the start of the partition). A short
/// page ends the scan. Entities older than `since` are skipped here so
/// backends only need to know about row keys.
pub struct PagedScan<'a> {
    fetch: FetchPage<'a>,
    page_size: usize,
    since: DateTime<Utc>,
    cursor: Option<String>,
    buffer: VecDeque<StoredEntity>,
    done: bool,
}

impl<'a> PagedScan<'a> {
    pub fn new<F>(page_size: usize, since: DateTime<Utc>, fetch: F) -> Self
    where
        F: FnMut(Option<&str>, usize) -> SensorResult<Vec<StoredEntity>> + 'a,
    {
        Self {
            fetch: Box::new(fetch),
            page_size: page_size.max(1),
            since,
            cursor: None,
            buffer: VecDeque::new(),
            done: false,
        }
    }

    fn fill(&mut self) -> SensorResult<()> {
        let page = (self.fetch)(self.cursor.as_deref(), self.page_size)?;
        if page.len() < self.page_size {
            self.done = true;
        }
        if let Some(last) = page.last() {
            self.cursor = Some(last.row_key.clone());
        }
        let since = self.since;
        self.buffer
            .extend(page.into_iter().filter(|e| e.timestamp >= since));
        Ok(())
    }
}

impl Iterator for PagedScan<'_> {
    type Item = SensorResult<StoredEntity>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(entity) = self.buffer.pop_front() {
                return Some(Ok(entity));
            }
            if self.done {
                return None;
            }
            if let Err(e) = self.fill() {
                self.done = true;
                return Some(Err(e));
            }
        }
    }
}

// ── In-memory table ───────────────────────────────────────────────

#[derive(Debug, Default)]
struct MemoryState {
    created: bool,
    partitions: BTreeMap<String, BTreeMap<String, StoredEntity>>,
}

/// In-process table backed by ordered maps behind an `RwLock`.
///
/// Each scan page takes the read lock on its own, so a long scan does not
/// block writers.
#[derive(Debug)]
pub struct MemoryTable {
    name: String,
    page_size: usize,
    state: RwLock<MemoryState>,
}

impl MemoryTable {
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_page_size(name, DEFAULT_SCAN_PAGE_SIZE)
    }

    pub fn with_page_size(name: impl Into<String>, page_size: usize) -> Self {
        Self {
            name: name.into(),
            page_size,
            state: RwLock::new(MemoryState::default()),
        }
    }

    /// Whether the namespace has been created.
    pub fn exists(&self) -> bool {
        self.state.read().map(|s| s.created).unwrap_or(false)
    }

    /// Number of entities stored in `partition`.
    pub fn partition_len(&self, partition: &str) -> usize {
        self.state
            .read()
            .map(|s| s.partitions.get(partition).map_or(0, BTreeMap::len))
            .unwrap_or(0)
    }
}

fn poisoned<E>(_: E) -> SensorError {
    SensorError::InfrastructureUnavailable("memory table lock poisoned".to_string())
}

impl PartitionedTable for MemoryTable {
    fn name(&self) -> &str {
        &self.name
    }

    fn ensure_namespace(&self) -> SensorResult<()> {
        let mut state = self.state.write().map_err(poisoned)?;
        if !state.created {
            state.created = true;
            debug!(table = %self.name, "memory table created");
        }
        Ok(())
    }

    fn write(&self, entity: &StoredEntity, mode: WriteMode) -> SensorResult<WriteOutcome> {
        let mut state = self.state.write().map_err(poisoned)?;
        state.created = true;
        let partition = state
            .partitions
            .entry(entity.partition_key.clone())
            .or_default();
        if mode == WriteMode::InsertOnly && partition.contains_key(&entity.row_key) {
            return Err(SensorError::Conflict {
                partition: entity.partition_key.clone(),
                row_key: entity.row_key.clone(),
            });
        }
        let previous = partition.insert(entity.row_key.clone(), entity.clone());
        Ok(if previous.is_some() {
            WriteOutcome::Replaced
        } else {
            WriteOutcome::Created
        })
    }

    fn range_query(&self, partition: &str, since: DateTime<Utc>) -> SensorResult<EntityScan<'_>> {
        let partition = partition.to_string();
        let scan = PagedScan::new(self.page_size, since, move |after, limit| {
            let state = self.state.read().map_err(poisoned)?;
            let Some(rows) = state.partitions.get(&partition) else {
                return Ok(Vec::new());
            };
            let lower = match after {
                Some(key) => Bound::Excluded(key),
                None => Bound::Unbounded,
            };
            Ok(rows
                .range::<str, _>((lower, Bound::Unbounded))
                .take(limit)
                .map(|(_, entity)| entity.clone())
                .collect())
        });
        Ok(Box::new(scan))
    }
}
