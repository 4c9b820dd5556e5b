//! sensorgrid-state — embedded reading store for SensorGrid.
//!
//! Backed by [redb](https://docs.rs/redb), provides a persistent or
//! in-memory implementation of [`sensorgrid_core::PartitionedTable`].
//!
//! # Architecture
//!
//! Each namespace is one redb table with `&str` keys and JSON-serialized
//! `StoredEntity` values. Keys are `{partition}\0{row_key}`, so one sensor's
//! readings form a contiguous key range that is scanned page by page.
//!
//! `RedbTable` is `Clone` + `Send` + `Sync` (backed by `Arc<Database>`) and
//! can be shared across threads.

pub mod error;
pub mod store;
pub mod tables;

pub use error::{StateError, StateResult};
pub use store::RedbTable;
