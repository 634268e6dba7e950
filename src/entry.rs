// Key/value entry: the unit every write operation sends to the backend.
// Keys are trimmed on construction and can never be empty afterwards,
// so the client never has to re-check an entry it was handed.

use serde::Serialize;
use serde_json::Value;
use std::hash::{Hash, Hasher};
use thiserror::Error;

/// Local, pre-flight failures. Returning one of these means no request
/// was sent.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Key cannot be empty")]
    EmptyKey,
    #[error("No data provided for batch save")]
    EmptyBatch,
    #[error("Key at index {index} cannot be empty")]
    InvalidBatchEntry { index: usize },
}

/// A key/value pair destined for the remote store.
///
/// Equality and hashing look at the key only, which is what lets a
/// [`Batch`](crate::batch::Batch) collapse duplicates.
#[derive(Serialize, Debug, Clone)]
pub struct KeyValueEntry {
    key: String,
    value: Value,
}

impl KeyValueEntry {
    pub fn new(key: impl AsRef<str>, value: impl Into<Value>) -> Result<Self, ValidationError> {
        let key = normalize_key(key.as_ref())?;
        Ok(KeyValueEntry {
            key,
            value: value.into(),
        })
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn value(&self) -> &Value {
        &self.value
    }
}

impl PartialEq for KeyValueEntry {
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key
    }
}

impl Eq for KeyValueEntry {}

impl Hash for KeyValueEntry {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.key.hash(state);
    }
}

/// Trim a caller-supplied key, rejecting blank ones.
pub fn normalize_key(raw: &str) -> Result<String, ValidationError> {
    let key = raw.trim();
    if key.is_empty() {
        return Err(ValidationError::EmptyKey);
    }
    Ok(key.to_string())
}
