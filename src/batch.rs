// Batch of entries submitted through `/putall`, plus the adapter that turns
// it into the JSON array the endpoint expects.

use crate::entry::{normalize_key, KeyValueEntry, ValidationError};
use serde_json::Value;
use std::collections::HashMap;

/// Entries deduplicated by key. A later insert with an existing key
/// replaces the earlier value but keeps its position.
#[derive(Debug, Clone, Default)]
pub struct Batch {
    entries: Vec<KeyValueEntry>,
    index: HashMap<String, usize>,
}

impl Batch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a batch from raw key/value pairs, failing on the first blank key.
    pub fn try_from_pairs<K, V, I>(pairs: I) -> Result<Self, ValidationError>
    where
        K: AsRef<str>,
        V: Into<Value>,
        I: IntoIterator<Item = (K, V)>,
    {
        let mut batch = Batch::new();
        for (index, (key, value)) in pairs.into_iter().enumerate() {
            let key = normalize_key(key.as_ref())
                .map_err(|_| ValidationError::InvalidBatchEntry { index })?;
            batch.insert(KeyValueEntry::new(key, value)?);
        }
        Ok(batch)
    }

    /// Insert an entry. Returns true if the key was already present.
    pub fn insert(&mut self, entry: KeyValueEntry) -> bool {
        match self.index.get(entry.key()) {
            Some(&pos) => {
                self.entries[pos] = entry;
                true
            }
            None => {
                self.index.insert(entry.key().to_string(), self.entries.len());
                self.entries.push(entry);
                false
            }
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &KeyValueEntry> {
        self.entries.iter()
    }

    /// Wire body for `/putall`: a JSON array of `{key, value}` objects.
    /// An empty batch is rejected before anything touches the network.
    pub fn to_wire(&self) -> Result<Value, ValidationError> {
        if self.entries.is_empty() {
            return Err(ValidationError::EmptyBatch);
        }
        let records = self
            .entries
            .iter()
            .map(|e| {
                serde_json::json!({
                    "key": e.key(),
                    "value": e.value(),
                })
            })
            .collect();
        Ok(Value::Array(records))
    }
}

impl FromIterator<KeyValueEntry> for Batch {
    fn from_iter<I: IntoIterator<Item = KeyValueEntry>>(iter: I) -> Self {
        let mut batch = Batch::new();
        for entry in iter {
            batch.insert(entry);
        }
        batch
    }
}
