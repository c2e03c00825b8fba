//! Table documents in mapping or sequence shape.

use crate::convert::{mapping_to_sequence, sequence_to_mapping};
use crate::record::Record;
use serde::de::{MapAccess, SeqAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

/// Process-wide table representation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataStyle {
    /// JSON object keyed by composed key.
    #[default]
    Mapping,
    /// JSON array in insertion order.
    Sequence,
}

impl DataStyle {
    /// Returns the canonical name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Mapping => "mapping",
            Self::Sequence => "sequence",
        }
    }
}

impl fmt::Display for DataStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DataStyle {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "mapping" | "object" => Ok(Self::Mapping),
            "sequence" | "array" => Ok(Self::Sequence),
            other => Err(format!(
                "unknown data style: {other} (expected mapping or sequence)"
            )),
        }
    }
}

/// An insertion-ordered map from composed key to record.
///
/// Keys are unique. Replacing an entry keeps its position; removing an
/// entry keeps the relative order of the rest.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecordMap {
    entries: Vec<(String, Record)>,
    index: HashMap<String, usize>,
}

impl RecordMap {
    /// Creates an empty map.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true when the map holds no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Looks up a record by key.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Record> {
        self.index.get(key).map(|&i| &self.entries[i].1)
    }

    /// Returns true if `key` is present.
    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.index.contains_key(key)
    }

    /// Inserts or replaces. Returns the replaced record.
    pub fn insert(&mut self, key: String, record: Record) -> Option<Record> {
        if let Some(&i) = self.index.get(&key) {
            return Some(std::mem::replace(&mut self.entries[i].1, record));
        }
        self.index.insert(key.clone(), self.entries.len());
        self.entries.push((key, record));
        None
    }

    /// Removes an entry by key.
    pub fn remove(&mut self, key: &str) -> Option<Record> {
        let i = self.index.remove(key)?;
        let (_, record) = self.entries.remove(i);
        self.reindex();
        Some(record)
    }

    /// Removes every entry matching `pred`, returning them in order.
    pub fn drain_where<F>(&mut self, mut pred: F) -> Vec<(String, Record)>
    where
        F: FnMut(&str, &Record) -> bool,
    {
        let (removed, kept): (Vec<_>, Vec<_>) = std::mem::take(&mut self.entries)
            .into_iter()
            .partition(|(k, r)| pred(k, r));
        self.entries = kept;
        self.reindex();
        removed
    }

    /// Iterates entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Record)> {
        self.entries.iter().map(|(k, r)| (k.as_str(), r))
    }

    /// Iterates keys in insertion order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    fn reindex(&mut self) {
        self.index = self
            .entries
            .iter()
            .enumerate()
            .map(|(i, (k, _))| (k.clone(), i))
            .collect();
    }
}

impl FromIterator<(String, Record)> for RecordMap {
    fn from_iter<I: IntoIterator<Item = (String, Record)>>(iter: I) -> Self {
        let mut map = Self::new();
        for (key, record) in iter {
            map.insert(key, record);
        }
        map
    }
}

impl IntoIterator for RecordMap {
    type Item = (String, Record);
    type IntoIter = std::vec::IntoIter<(String, Record)>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

impl Serialize for RecordMap {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (key, record) in &self.entries {
            map.serialize_entry(key, record)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for RecordMap {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_map(RecordMapVisitor)
    }
}

struct RecordMapVisitor;

impl<'de> Visitor<'de> for RecordMapVisitor {
    type Value = RecordMap;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a JSON object of records")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
        let mut map = RecordMap::new();
        while let Some((key, record)) = access.next_entry::<String, Record>()? {
            map.insert(key, record);
        }
        Ok(map)
    }
}

/// The full contents of one table.
#[derive(Debug, Clone, PartialEq)]
pub enum TableData {
    /// Records keyed by composed key.
    Mapping(RecordMap),
    /// Records in insertion order, addressed by their `key` field.
    Sequence(Vec<Record>),
}

impl TableData {
    /// Creates an empty table of the given style.
    #[must_use]
    pub fn empty(style: DataStyle) -> Self {
        match style {
            DataStyle::Mapping => Self::Mapping(RecordMap::new()),
            DataStyle::Sequence => Self::Sequence(Vec::new()),
        }
    }

    /// Returns the representation of this table.
    #[must_use]
    pub fn style(&self) -> DataStyle {
        match self {
            Self::Mapping(_) => DataStyle::Mapping,
            Self::Sequence(_) => DataStyle::Sequence,
        }
    }

    /// Number of records.
    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            Self::Mapping(map) => map.len(),
            Self::Sequence(seq) => seq.len(),
        }
    }

    /// Returns true when the table holds no records.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Looks up a record by its storage key.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Record> {
        match self {
            Self::Mapping(map) => map.get(key),
            Self::Sequence(seq) => seq.iter().find(|r| r.key.as_deref() == Some(key)),
        }
    }

    /// Writes `record` under `key`, replacing any record already stored
    /// there. Returns the replaced record.
    pub fn upsert(&mut self, key: &str, record: Record) -> Option<Record> {
        match self {
            Self::Mapping(map) => map.insert(key.to_string(), record),
            Self::Sequence(seq) => {
                match seq.iter_mut().find(|r| r.key.as_deref() == Some(key)) {
                    Some(slot) => Some(std::mem::replace(slot, record)),
                    None => {
                        seq.push(record);
                        None
                    }
                }
            }
        }
    }

    /// Removes the record stored under `key`.
    pub fn remove(&mut self, key: &str) -> Option<Record> {
        match self {
            Self::Mapping(map) => map.remove(key),
            Self::Sequence(seq) => {
                let pos = seq.iter().position(|r| r.key.as_deref() == Some(key))?;
                Some(seq.remove(pos))
            }
        }
    }

    /// Removes every record matching `pred`, in representation order.
    ///
    /// Mapping entries carry their storage key; sequence entries carry the
    /// record's own `key` field.
    pub fn drain_where<F>(&mut self, mut pred: F) -> Vec<(Option<String>, Record)>
    where
        F: FnMut(&Record) -> bool,
    {
        match self {
            Self::Mapping(map) => map
                .drain_where(|_, r| pred(r))
                .into_iter()
                .map(|(k, r)| (Some(k), r))
                .collect(),
            Self::Sequence(seq) => {
                let (removed, kept): (Vec<_>, Vec<_>) =
                    std::mem::take(seq).into_iter().partition(|r| pred(r));
                *seq = kept;
                removed.into_iter().map(|r| (r.key.clone(), r)).collect()
            }
        }
    }

    /// Iterates `(storage key, record)` pairs in representation order.
    pub fn entries(&self) -> Box<dyn Iterator<Item = (Option<&str>, &Record)> + '_> {
        match self {
            Self::Mapping(map) => Box::new(map.iter().map(|(k, r)| (Some(k), r))),
            Self::Sequence(seq) => Box::new(seq.iter().map(|r| (r.key.as_deref(), r))),
        }
    }

    /// Converts to the given style. A no-op when already in that style.
    #[must_use]
    pub fn into_style(self, style: DataStyle) -> Self {
        match (self, style) {
            (Self::Sequence(seq), DataStyle::Mapping) => Self::Mapping(sequence_to_mapping(seq)),
            (Self::Mapping(map), DataStyle::Sequence) => Self::Sequence(mapping_to_sequence(map)),
            (data, _) => data,
        }
    }
}

impl Serialize for TableData {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Mapping(map) => map.serialize(serializer),
            Self::Sequence(seq) => seq.serialize(serializer),
        }
    }
}

impl<'de> Deserialize<'de> for TableData {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(TableDataVisitor)
    }
}

struct TableDataVisitor;

impl<'de> Visitor<'de> for TableDataVisitor {
    type Value = TableData;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a JSON object or array of records")
    }

    fn visit_map<A: MapAccess<'de>>(self, access: A) -> Result<Self::Value, A::Error> {
        RecordMapVisitor.visit_map(access).map(TableData::Mapping)
    }

    fn visit_seq<A: SeqAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
        let mut seq = Vec::with_capacity(access.size_hint().unwrap_or(0));
        while let Some(record) = access.next_element::<Record>()? {
            seq.push(record);
        }
        Ok(TableData::Sequence(seq))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(key: &str, value: serde_json::Value) -> Record {
        Record {
            kind: Some("string".to_string()),
            key: Some(key.to_string()),
            value: Some(value),
            ttl: None,
        }
    }

    #[test]
    fn record_map_keeps_insertion_order() {
        let mut map = RecordMap::new();
        map.insert("b".into(), record("b", json!(1)));
        map.insert("a".into(), record("a", json!(2)));
        map.insert("c".into(), record("c", json!(3)));

        let keys: Vec<_> = map.keys().collect();
        assert_eq!(keys, vec!["b", "a", "c"]);
    }

    #[test]
    fn record_map_replace_keeps_position() {
        let mut map = RecordMap::new();
        map.insert("a".into(), record("a", json!(1)));
        map.insert("b".into(), record("b", json!(2)));

        let old = map.insert("a".into(), record("a", json!(9)));
        assert_eq!(old.unwrap().value, Some(json!(1)));
        assert_eq!(map.keys().collect::<Vec<_>>(), vec!["a", "b"]);
        assert_eq!(map.get("a").unwrap().value, Some(json!(9)));
    }

    #[test]
    fn record_map_remove_reindexes() {
        let mut map: RecordMap = ["a", "b", "c"]
            .iter()
            .map(|k| (k.to_string(), record(k, json!(k))))
            .collect();

        assert!(map.remove("a").is_some());
        assert!(map.remove("a").is_none());
        assert_eq!(map.get("c").unwrap().key.as_deref(), Some("c"));
        assert_eq!(map.len(), 2);
    }

    #[test]
    fn sequence_upsert_replaces_in_place() {
        let mut table = TableData::empty(DataStyle::Sequence);
        assert!(table.upsert("a", record("a", json!(1))).is_none());
        assert!(table.upsert("b", record("b", json!(2))).is_none());
        let old = table.upsert("a", record("a", json!(3)));

        assert_eq!(old.unwrap().value, Some(json!(1)));
        assert_eq!(table.len(), 2);
        assert_eq!(table.get("a").unwrap().value, Some(json!(3)));
    }

    #[test]
    fn sequence_remove_by_key() {
        let mut table = TableData::Sequence(vec![record("a", json!(1)), record("b", json!(2))]);
        assert!(table.remove("a").is_some());
        assert!(table.remove("missing").is_none());
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn drain_where_removes_valueless_records() {
        let mut table = TableData::empty(DataStyle::Mapping);
        table.upsert("a", record("a", json!(1)));
        table.upsert(
            "b",
            Record {
                key: Some("b".into()),
                ..Record::default()
            },
        );

        let removed = table.drain_where(|r| r.value.is_none());
        assert_eq!(removed.len(), 1);
        assert_eq!(removed[0].0.as_deref(), Some("b"));
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn deserializes_both_shapes() {
        let mapping: TableData =
            serde_json::from_str(r#"{"a":{"type":"number","key":"a","value":1}}"#).unwrap();
        assert_eq!(mapping.style(), DataStyle::Mapping);

        let sequence: TableData =
            serde_json::from_str(r#"[{"type":"number","key":"a","value":1}]"#).unwrap();
        assert_eq!(sequence.style(), DataStyle::Sequence);

        assert!(serde_json::from_str::<TableData>("42").is_err());
    }

    #[test]
    fn mapping_serializes_in_insertion_order() {
        let mut table = TableData::empty(DataStyle::Mapping);
        table.upsert("z", Record { key: Some("z".into()), ..Record::default() });
        table.upsert("a", Record { key: Some("a".into()), ..Record::default() });
        let text = serde_json::to_string(&table).unwrap();
        assert_eq!(text, r#"{"z":{"key":"z"},"a":{"key":"a"}}"#);
    }

    #[test]
    fn data_style_parses_aliases() {
        assert_eq!("object".parse::<DataStyle>().unwrap(), DataStyle::Mapping);
        assert_eq!("array".parse::<DataStyle>().unwrap(), DataStyle::Sequence);
        assert!("table".parse::<DataStyle>().is_err());
    }
}
