//! # In-Memory Record Store

use std::collections::HashMap;
use std::sync::RwLock;

use super::backend::RecordStore;
use super::errors::{RecordStoreError, RecordStoreResult};
use super::record::{has_updatable, Attributes, Record};

/// Map of live records with the write rules shared by every backend
#[derive(Debug, Default)]
pub(crate) struct RecordTable {
    records: HashMap<String, Record>,
}

impl RecordTable {
    pub(crate) fn get(&self, id: &str) -> RecordStoreResult<Record> {
        self.records
            .get(id)
            .cloned()
            .ok_or_else(|| RecordStoreError::NotFound(id.to_string()))
    }

    /// Build the record a `put` would produce without storing it
    pub(crate) fn prepare_put(&self, id: &str, attributes: Attributes) -> Record {
        let mut record = Record::new(id, attributes);
        if let Some(existing) = self.records.get(id) {
            record.version = existing.version + 1;
        }
        record
    }

    /// Build the record an `update_fields` would produce without storing it
    pub(crate) fn prepare_update(
        &self,
        id: &str,
        changes: &Attributes,
        expected_version: Option<u64>,
    ) -> RecordStoreResult<Record> {
        if !has_updatable(changes) {
            return Err(RecordStoreError::EmptyUpdate(id.to_string()));
        }

        let mut record = self.get(id)?;
        if let Some(expected) = expected_version {
            if record.version != expected {
                return Err(RecordStoreError::VersionMismatch {
                    id: id.to_string(),
                    expected,
                    actual: record.version,
                });
            }
        }

        record.apply_changes(changes);
        Ok(record)
    }

    pub(crate) fn insert(&mut self, record: Record) {
        self.records.insert(record.id.clone(), record);
    }

    pub(crate) fn remove(&mut self, id: &str) -> Option<Record> {
        self.records.remove(id)
    }

    pub(crate) fn all(&self) -> Vec<Record> {
        self.records.values().cloned().collect()
    }

    pub(crate) fn len(&self) -> usize {
        self.records.len()
    }
}

/// Volatile record store, used for tests and the `memory` backend
#[derive(Debug, Default)]
pub struct MemoryRecordStore {
    table: RwLock<RecordTable>,
}

impl MemoryRecordStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live records
    pub fn len(&self) -> usize {
        self.table.read().map(|t| t.len()).unwrap_or(0)
    }

    /// Whether the store holds no records
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn poisoned() -> RecordStoreError {
    RecordStoreError::Internal("Lock poisoned".into())
}

impl RecordStore for MemoryRecordStore {
    fn get(&self, id: &str) -> RecordStoreResult<Record> {
        self.table.read().map_err(|_| poisoned())?.get(id)
    }

    fn put(&self, id: &str, attributes: Attributes) -> RecordStoreResult<Record> {
        let mut table = self.table.write().map_err(|_| poisoned())?;
        let record = table.prepare_put(id, attributes);
        table.insert(record.clone());
        Ok(record)
    }

    fn update_fields(
        &self,
        id: &str,
        changes: Attributes,
        expected_version: Option<u64>,
    ) -> RecordStoreResult<Record> {
        let mut table = self.table.write().map_err(|_| poisoned())?;
        let record = table.prepare_update(id, &changes, expected_version)?;
        table.insert(record.clone());
        Ok(record)
    }

    fn delete(&self, id: &str) -> RecordStoreResult<Record> {
        let mut table = self.table.write().map_err(|_| poisoned())?;
        table
            .remove(id)
            .ok_or_else(|| RecordStoreError::NotFound(id.to_string()))
    }

    fn scan_all(&self) -> RecordStoreResult<Vec<Record>> {
        Ok(self.table.read().map_err(|_| poisoned())?.all())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};

    fn attrs(value: Value) -> Attributes {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_put_get() {
        let store = MemoryRecordStore::new();
        store.put("b1", attrs(json!({"title": "Dune"}))).unwrap();

        let record = store.get("b1").unwrap();
        assert_eq!(record.version, 1);
        assert_eq!(record.attribute("title"), Some(&json!("Dune")));
    }

    #[test]
    fn test_get_missing() {
        let store = MemoryRecordStore::new();
        assert!(matches!(store.get("nope"), Err(RecordStoreError::NotFound(_))));
    }

    #[test]
    fn test_put_overwrites_and_bumps_version() {
        let store = MemoryRecordStore::new();
        store.put("b1", attrs(json!({"title": "Dune", "price": 1.0}))).unwrap();
        let record = store.put("b1", attrs(json!({"title": "Emma"}))).unwrap();

        assert_eq!(record.version, 2);
        assert!(record.attribute("price").is_none());
    }

    #[test]
    fn test_update_fields_leaves_other_attributes() {
        let store = MemoryRecordStore::new();
        store
            .put("b1", attrs(json!({"title": "Dune", "quantity": 3})))
            .unwrap();

        store
            .update_fields("b1", attrs(json!({"quantity": 2})), None)
            .unwrap();
        store
            .update_fields("b1", attrs(json!({"title": "Dune Messiah"})), None)
            .unwrap();

        let record = store.get("b1").unwrap();
        assert_eq!(record.attribute("quantity"), Some(&json!(2)));
        assert_eq!(record.attribute("title"), Some(&json!("Dune Messiah")));
        assert_eq!(record.version, 3);
    }

    #[test]
    fn test_update_fields_version_check() {
        let store = MemoryRecordStore::new();
        store.put("b1", attrs(json!({"quantity": 3}))).unwrap();

        store
            .update_fields("b1", attrs(json!({"quantity": 2})), Some(1))
            .unwrap();
        let result = store.update_fields("b1", attrs(json!({"quantity": 1})), Some(1));

        assert!(matches!(
            result,
            Err(RecordStoreError::VersionMismatch { expected: 1, actual: 2, .. })
        ));
        assert_eq!(store.get("b1").unwrap().attribute("quantity"), Some(&json!(2)));
    }

    #[test]
    fn test_update_fields_missing_record() {
        let store = MemoryRecordStore::new();
        let result = store.update_fields("b1", attrs(json!({"title": "x"})), None);
        assert!(matches!(result, Err(RecordStoreError::NotFound(_))));
    }

    #[test]
    fn test_update_fields_only_key_is_empty() {
        let store = MemoryRecordStore::new();
        store.put("b1", attrs(json!({"title": "Dune"}))).unwrap();
        let result = store.update_fields("b1", attrs(json!({"id": "b2"})), None);
        assert!(matches!(result, Err(RecordStoreError::EmptyUpdate(_))));
    }

    #[test]
    fn test_delete_is_conditional() {
        let store = MemoryRecordStore::new();
        store.put("b1", attrs(json!({"coverUrl": "http://x/a.jpg"}))).unwrap();

        let removed = store.delete("b1").unwrap();
        assert_eq!(removed.attribute("coverUrl"), Some(&json!("http://x/a.jpg")));
        assert!(matches!(store.delete("b1"), Err(RecordStoreError::NotFound(_))));
        assert!(store.is_empty());
    }

    #[test]
    fn test_scan_all() {
        let store = MemoryRecordStore::new();
        assert!(store.scan_all().unwrap().is_empty());

        for i in 0..4 {
            store.put(&format!("b{}", i), attrs(json!({"n": i}))).unwrap();
        }
        assert_eq!(store.scan_all().unwrap().len(), 4);
    }
}
