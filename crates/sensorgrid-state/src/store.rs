//! RedbTable — redb-backed partitioned reading store.
//!
//! Implements [`PartitionedTable`] over a single redb table. Values are
//! JSON-serialized [`StoredEntity`] records. The store supports both
//! on-disk and in-memory backends (the latter for testing). The table is
//! created on first use, not on open.

use std::ops::Bound;
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use chrono::{DateTime, Utc};
use redb::{Database, ReadableDatabase, ReadableTable, TableDefinition};
use sensorgrid_core::config::StoreConfig;
use sensorgrid_core::table::{DEFAULT_SCAN_PAGE_SIZE, PagedScan};
use sensorgrid_core::{
    EntityScan, PartitionedTable, SensorResult, StoredEntity, WriteMode, WriteOutcome,
};
use tracing::debug;

use crate::error::{StateError, StateResult};
use crate::tables::{entities, entity_key, partition_range};

/// Convert any `Display` error into a `StateError` variant via a closure factory.
macro_rules! map_err {
    ($variant:ident) => {
        |e| StateError::$variant(e.to_string())
    };
}

/// Thread-safe partitioned table backed by redb.
#[derive(Clone)]
pub struct RedbTable {
    db: Arc<Database>,
    name: String,
    page_size: usize,
    namespace_ready: Arc<AtomicBool>,
}

impl RedbTable {
    /// Open (or create) a persistent database at `path` holding table `name`.
    pub fn open(path: &Path, name: &str) -> StateResult<Self> {
        let db = Database::create(path).map_err(map_err!(Open))?;
        debug!(?path, table = name, "reading store opened");
        Ok(Self::from_database(db, name))
    }

    /// Create an ephemeral in-memory store (for testing).
    pub fn open_in_memory(name: &str) -> StateResult<Self> {
        let backend = redb::backends::InMemoryBackend::new();
        let db = Database::builder()
            .create_with_backend(backend)
            .map_err(map_err!(Open))?;
        debug!(table = name, "in-memory reading store opened");
        Ok(Self::from_database(db, name))
    }

    /// Open the store described by `config`, creating its data directory.
    pub fn from_config(config: &StoreConfig) -> StateResult<Self> {
        std::fs::create_dir_all(&config.data_dir).map_err(map_err!(Open))?;
        Ok(Self::open(&config.database_path(), &config.table)?.with_page_size(config.scan_page_size))
    }

    fn from_database(db: Database, name: &str) -> Self {
        Self {
            db: Arc::new(db),
            name: name.to_string(),
            page_size: DEFAULT_SCAN_PAGE_SIZE,
            namespace_ready: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Set how many entities a range scan reads per page.
    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    fn definition(&self) -> TableDefinition<'_, &'static str, &'static [u8]> {
        entities(&self.name)
    }

    /// Create the entity table if it doesn't exist yet.
    pub fn create_table(&self) -> StateResult<()> {
        if self.namespace_ready.load(Ordering::Acquire) {
            return Ok(());
        }
        let txn = self.db.begin_write().map_err(map_err!(Transaction))?;
        // Opening a table in a write transaction creates it if absent.
        txn.open_table(self.definition()).map_err(map_err!(Table))?;
        txn.commit().map_err(map_err!(Transaction))?;
        self.namespace_ready.store(true, Ordering::Release);
        debug!(table = %self.name, "table ensured");
        Ok(())
    }

    /// Insert an entity, or replace it when `mode` allows.
    pub fn put_entity(&self, entity: &StoredEntity, mode: WriteMode) -> StateResult<WriteOutcome> {
        let key = entity_key(&entity.partition_key, &entity.row_key);
        let value = serde_json::to_vec(entity).map_err(map_err!(Serialize))?;
        let txn = self.db.begin_write().map_err(map_err!(Transaction))?;
        let replaced = {
            let mut table = txn.open_table(self.definition()).map_err(map_err!(Table))?;
            let exists = table.get(key.as_str()).map_err(map_err!(Read))?.is_some();
            if exists && mode == WriteMode::InsertOnly {
                None
            } else {
                table
                    .insert(key.as_str(), value.as_slice())
                    .map_err(map_err!(Write))?;
                Some(exists)
            }
        };
        let Some(replaced) = replaced else {
            txn.abort().map_err(map_err!(Transaction))?;
            return Err(StateError::Conflict {
                partition: entity.partition_key.clone(),
                row_key: entity.row_key.clone(),
            });
        };
        txn.commit().map_err(map_err!(Transaction))?;
        self.namespace_ready.store(true, Ordering::Release);
        debug!(
            partition = %entity.partition_key,
            row_key = %entity.row_key,
            replaced,
            "entity stored"
        );
        Ok(if replaced {
            WriteOutcome::Replaced
        } else {
            WriteOutcome::Created
        })
    }

    /// Get one entity by partition and row key.
    pub fn get_entity(&self, partition: &str, row_key: &str) -> StateResult<Option<StoredEntity>> {
        let txn = self.db.begin_read().map_err(map_err!(Transaction))?;
        let table = match txn.open_table(self.definition()) {
            Ok(table) => table,
            Err(redb::TableError::TableDoesNotExist(_)) => return Ok(None),
            Err(e) => return Err(StateError::Table(e.to_string())),
        };
        match table
            .get(entity_key(partition, row_key).as_str())
            .map_err(map_err!(Read))?
        {
            Some(guard) => {
                let entity: StoredEntity =
                    serde_json::from_slice(guard.value()).map_err(map_err!(Deserialize))?;
                Ok(Some(entity))
            }
            None => Ok(None),
        }
    }

    /// Lazily scan `partition` for entities stamped at or after `since`.
    ///
    /// All pages are read from one snapshot taken when the scan starts.
    pub fn scan_partition(&self, partition: &str, since: DateTime<Utc>) -> StateResult<PagedScan<'static>> {
        let txn = self.db.begin_read().map_err(map_err!(Transaction))?;
        let table = match txn.open_table(self.definition()) {
            Ok(table) => table,
            Err(redb::TableError::TableDoesNotExist(_)) => {
                return Ok(PagedScan::new(self.page_size, since, |_, _| Ok(Vec::new())));
            }
            Err(e) => return Err(StateError::Table(e.to_string())),
        };

        let partition = partition.to_string();
        let (start, end) = partition_range(&partition);
        Ok(PagedScan::new(self.page_size, since, move |after, limit| {
            let lower_key = after.map(|row_key| entity_key(&partition, row_key));
            let lower = match &lower_key {
                Some(key) => Bound::Excluded(key.as_str()),
                None => Bound::Included(start.as_str()),
            };
            let range = table
                .range::<&str>((lower, Bound::Excluded(end.as_str())))
                .map_err(map_err!(Read))?;

            let mut page = Vec::with_capacity(limit);
            for entry in range.take(limit) {
                let (_, value) = entry.map_err(map_err!(Read))?;
                let entity: StoredEntity =
                    serde_json::from_slice(value.value()).map_err(map_err!(Deserialize))?;
                page.push(entity);
            }
            Ok(page)
        }))
    }
}

impl PartitionedTable for RedbTable {
    fn name(&self) -> &str {
        &self.name
    }

    fn ensure_namespace(&self) -> SensorResult<()> {
        Ok(self.create_table()?)
    }

    fn write(&self, entity: &StoredEntity, mode: WriteMode) -> SensorResult<WriteOutcome> {
        Ok(self.put_entity(entity, mode)?)
    }

    fn range_query(&self, partition: &str, since: DateTime<Utc>) -> SensorResult<EntityScan<'_>> {
        Ok(Box::new(self.scan_partition(partition, since)?))
    }
}
