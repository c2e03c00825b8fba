//! Representation conversion between mapping and sequence tables.

use crate::record::Record;
use crate::table::RecordMap;
use tracing::warn;

/// Keys each record by its own `key` field.
///
/// Later duplicates overwrite earlier ones. Records without a `key` field
/// cannot be addressed in a mapping and are dropped.
#[must_use]
pub fn sequence_to_mapping(records: Vec<Record>) -> RecordMap {
    let mut map = RecordMap::new();
    for record in records {
        match record.key.clone() {
            Some(key) => {
                map.insert(key, record);
            }
            None => warn!("dropping record without a key during conversion to mapping"),
        }
    }
    map
}

/// Lists the mapping's records in insertion order.
///
/// Sequence lookups go through the `key` field, so a record stored without
/// one gets its mapping key written back into it.
#[must_use]
pub fn mapping_to_sequence(map: RecordMap) -> Vec<Record> {
    map.into_iter()
        .map(|(key, mut record)| {
            if record.key.is_none() {
                record.key = Some(key);
            }
            record
        })
        .collect()
}
