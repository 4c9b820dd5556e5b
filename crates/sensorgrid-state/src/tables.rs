//! redb table definitions and key layout for the SensorGrid state store.
//!
//! Tables use `&str` keys and `&[u8]` values (JSON-serialized entities).
//! Keys follow the pattern `{partition}\0{row_key}`. Partition keys never
//! contain control characters, so `[{partition}\0, {partition}\x01)` holds
//! exactly one partition.

use redb::TableDefinition;

/// Separates the partition key from the row key.
pub const KEY_SEPARATOR: char = '\0';

const PARTITION_END: char = '\u{1}';

/// Definition of the entity table named `name`.
pub fn entities(name: &str) -> TableDefinition<'_, &'static str, &'static [u8]> {
    TableDefinition::new(name)
}

/// Storage key for one entity.
pub fn entity_key(partition: &str, row_key: &str) -> String {
    format!("{partition}{KEY_SEPARATOR}{row_key}")
}

/// Half-open key range `[start, end)` covering every row of `partition`.
pub fn partition_range(partition: &str) -> (String, String) {
    (
        format!("{partition}{KEY_SEPARATOR}"),
        format!("{partition}{PARTITION_END}"),
    )
}
