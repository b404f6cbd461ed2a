//! Change tracking between polling cycles
//!
//! The [`ChangeCache`] remembers the last value that actually made it
//! to the broker, per field. Diffing a fresh snapshot against it gives
//! the minimal set of fields to republish.
//!
//! The cache is a plain owned value: the engine holds exactly one and
//! nothing else touches it, so there is no locking. It is never
//! persisted; a restart republishes the full status once, which is
//! harmless with retained topics.

use std::collections::HashMap;

use crate::parser::StatusSnapshot;

/// Last successfully published value for one field
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheEntry {
    /// The payload as it went out on the wire
    pub value: String,
    /// When the publish succeeded
    pub published_at: chrono::DateTime<chrono::Utc>,
}

/// Map of field name to last published value
#[derive(Debug, Default)]
pub struct ChangeCache {
    entries: HashMap<String, CacheEntry>,
}

impl ChangeCache {
    /// Create an empty cache
    ///
    /// An empty cache makes every snapshot field count as changed, so
    /// the first cycle after startup publishes the full status.
    pub fn new() -> Self {
        Self::default()
    }

    /// Fields whose value differs from the last published one
    ///
    /// Comparison is exact string equality on the normalized value.
    /// Fields the cache has never seen count as changed. Fields present
    /// in the cache but absent from the snapshot are not reported;
    /// their retained topics keep the stale value.
    pub fn diff(&self, snapshot: &StatusSnapshot) -> Vec<(String, String)> {
        snapshot
            .fields
            .iter()
            .filter(|(field, value)| self.entries.get(field).map(|e| &e.value) != Some(value))
            .cloned()
            .collect()
    }

    /// Record a successful publish
    ///
    /// Must be called only after the transport accepted the message;
    /// a failed publish leaves the entry untouched so the field is
    /// re-reported next cycle.
    pub fn commit(&mut self, field: impl Into<String>, value: impl Into<String>) {
        self.entries.insert(
            field.into(),
            CacheEntry {
                value: value.into(),
                published_at: chrono::Utc::now(),
            },
        );
    }

    /// Last published value for a field, if any
    pub fn get(&self, field: &str) -> Option<&str> {
        self.entries.get(field).map(|e| e.value.as_str())
    }

    /// Full cache entry for a field, if any
    pub fn entry(&self, field: &str) -> Option<&CacheEntry> {
        self.entries.get(field)
    }

    /// Number of fields ever published
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True before the first successful publish
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
