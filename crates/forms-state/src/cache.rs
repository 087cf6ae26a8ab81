//! Record cache for one compilation run.

use chrono::{DateTime, Utc};
use forms_core::Fields;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// A cached record body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CachedRecord {
    /// The field values of the record.
    pub fields: Fields,

    /// When the record was fetched from the store.
    pub fetched_at: DateTime<Utc>,
}

/// Mapping from record identifier to its fields.
///
/// Entries are never invalidated: once a record is cached, every later lookup
/// in the same run observes the same fields.
#[derive(Debug, Clone, Default)]
pub struct RecordCache {
    records: IndexMap<String, CachedRecord>,
}

impl RecordCache {
    /// Create an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the fields cached under an identifier.
    pub fn get(&self, id: &str) -> Option<&Fields> {
        self.records.get(id).map(|entry| &entry.fields)
    }

    /// Get the full cache entry.
    pub fn entry(&self, id: &str) -> Option<&CachedRecord> {
        self.records.get(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.records.contains_key(id)
    }

    /// Cache the fields of a record, replacing an older entry.
    pub fn insert(&mut self, id: impl Into<String>, fields: Fields) -> &Fields {
        let id = id.into();
        tracing::debug!(record_id = %id, fields = fields.len(), "Caching record");

        let entry = CachedRecord {
            fields,
            fetched_at: Utc::now(),
        };
        let index = self.records.insert_full(id, entry).0;
        &self.records[index].fields
    }

    /// Identifiers in the order they were first cached.
    pub fn ids(&self) -> Vec<&str> {
        self.records.keys().map(String::as_str).collect()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
