//! Durable record store backed by an append-only journal
//!
//! Every write appends a frame holding the full record image (or a
//! tombstone) and fsyncs before the write is acknowledged. On open the
//! journal is replayed front to back; the latest frame for a key wins.
//! Any corrupt or torn frame aborts the open.
//!
//! A failed append is cut back to the last complete frame. If that cut
//! fails, or fsync fails, the store is poisoned and refuses every later
//! write until it is reopened.

use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use super::backend::RecordStore;
use super::errors::{RecordStoreError, RecordStoreResult};
use super::frame::{self, JournalEntry};
use super::memory::RecordTable;
use super::record::{Attributes, Record};

/// Journal file name inside the data directory
pub const JOURNAL_FILE: &str = "records.journal";

struct JournalInner {
    file: File,
    /// End of the last complete frame
    offset: u64,
    table: RecordTable,
    poisoned: Option<String>,
}

/// Record store persisted to `<data_dir>/records.journal`
pub struct JournalRecordStore {
    path: PathBuf,
    inner: Mutex<JournalInner>,
}

impl std::fmt::Debug for JournalRecordStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JournalRecordStore")
            .field("path", &self.path)
            .finish()
    }
}

impl JournalRecordStore {
    /// Open or create the journal in `data_dir` and replay it
    pub fn open(data_dir: &Path) -> RecordStoreResult<Self> {
        fs::create_dir_all(data_dir).map_err(|e| {
            RecordStoreError::IoError(format!(
                "Failed to create data directory {}: {}",
                data_dir.display(),
                e
            ))
        })?;

        let path = data_dir.join(JOURNAL_FILE);
        let file = OpenOptions::new()
            .create(true)
            .read(true)
            .append(true)
            .open(&path)
            .map_err(|e| {
                RecordStoreError::IoError(format!(
                    "Failed to open journal {}: {}",
                    path.display(),
                    e
                ))
            })?;

        let (table, offset) = Self::replay(&path)?;

        Ok(Self {
            path,
            inner: Mutex::new(JournalInner {
                file,
                offset,
                table,
                poisoned: None,
            }),
        })
    }

    /// Rebuild the live record table from the journal file
    fn replay(path: &Path) -> RecordStoreResult<(RecordTable, u64)> {
        let data = fs::read(path).map_err(|e| {
            RecordStoreError::IoError(format!("Failed to read journal {}: {}", path.display(), e))
        })?;

        let mut table = RecordTable::default();
        let mut cursor = 0usize;

        while cursor < data.len() {
            let (entry, consumed) = frame::decode(&data[cursor..], cursor as u64)?;
            match entry {
                JournalEntry::Upsert { record } => table.insert(record),
                JournalEntry::Tombstone { id } => {
                    table.remove(&id);
                }
            }
            cursor += consumed;
        }

        Ok((table, cursor as u64))
    }

    /// Path of the journal file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Number of live records
    pub fn len(&self) -> usize {
        self.inner.lock().map(|i| i.table.len()).unwrap_or(0)
    }

    /// Whether the store holds no live records
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Bytes written to the journal so far
    pub fn journal_size(&self) -> u64 {
        self.inner.lock().map(|i| i.offset).unwrap_or(0)
    }

    /// Whether an earlier append failure made the store read-only
    pub fn is_poisoned(&self) -> bool {
        self.inner.lock().map(|i| i.poisoned.is_some()).unwrap_or(true)
    }

    fn lock(&self) -> RecordStoreResult<std::sync::MutexGuard<'_, JournalInner>> {
        self.inner
            .lock()
            .map_err(|_| RecordStoreError::Internal("Lock poisoned".into()))
    }
}

impl JournalInner {
    /// Append one entry and fsync
    fn append(&mut self, entry: &JournalEntry) -> RecordStoreResult<()> {
        if let Some(reason) = &self.poisoned {
            return Err(RecordStoreError::Poisoned(reason.clone()));
        }
        let bytes = frame::encode(entry)?;

        if let Err(e) = self.file.write_all(&bytes) {
            let cause = format!("Failed to append entry for {}: {}", entry.id(), e);
            return Err(self.rollback(cause));
        }
        if let Err(e) = self.file.sync_all() {
            // The frame may or may not be durable; only a reopen can tell.
            let cause = format!("fsync failed after entry for {}: {}", entry.id(), e);
            self.poisoned = Some(cause.clone());
            return Err(RecordStoreError::FsyncFailed(cause));
        }

        self.offset += bytes.len() as u64;
        Ok(())
    }

    /// Cut the file back to the end of the last complete frame
    fn rollback(&mut self, cause: String) -> RecordStoreError {
        match self.file.set_len(self.offset) {
            Ok(()) => RecordStoreError::IoError(cause),
            Err(e) => {
                let reason = format!("{}; truncate to {} failed: {}", cause, self.offset, e);
                self.poisoned = Some(reason.clone());
                RecordStoreError::Poisoned(reason)
            }
        }
    }

    fn commit(&mut self, record: Record) -> RecordStoreResult<Record> {
        self.append(&JournalEntry::Upsert {
            record: record.clone(),
        })?;
        self.table.insert(record.clone());
        Ok(record)
    }
}

impl RecordStore for JournalRecordStore {
    fn get(&self, id: &str) -> RecordStoreResult<Record> {
        self.lock()?.table.get(id)
    }

    fn put(&self, id: &str, attributes: Attributes) -> RecordStoreResult<Record> {
        let mut inner = self.lock()?;
        let record = inner.table.prepare_put(id, attributes);
        inner.commit(record)
    }

    fn update_fields(
        &self,
        id: &str,
        changes: Attributes,
        expected_version: Option<u64>,
    ) -> RecordStoreResult<Record> {
        let mut inner = self.lock()?;
        let record = inner.table.prepare_update(id, &changes, expected_version)?;
        inner.commit(record)
    }

    fn delete(&self, id: &str) -> RecordStoreResult<Record> {
        let mut inner = self.lock()?;
        let record = inner.table.get(id)?;
        inner.append(&JournalEntry::Tombstone { id: id.to_string() })?;
        inner.table.remove(id);
        Ok(record)
    }

    fn scan_all(&self) -> RecordStoreResult<Vec<Record>> {
        Ok(self.lock()?.table.all())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};
    use tempfile::TempDir;

    fn attrs(value: Value) -> Attributes {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_open_creates_empty_journal() {
        let temp = TempDir::new().unwrap();
        let store = JournalRecordStore::open(temp.path()).unwrap();

        assert!(store.is_empty());
        assert!(store.path().exists());
        assert_eq!(store.journal_size(), 0);
    }

    #[test]
    fn test_writes_survive_reopen() {
        let temp = TempDir::new().unwrap();
        {
            let store = JournalRecordStore::open(temp.path()).unwrap();
            store.put("b1", attrs(json!({"title": "Dune", "quantity": 3}))).unwrap();
            store.put("b2", attrs(json!({"title": "Emma"}))).unwrap();
            store
                .update_fields("b1", attrs(json!({"quantity": 2})), Some(1))
                .unwrap();
            store.delete("b2").unwrap();
        }

        let store = JournalRecordStore::open(temp.path()).unwrap();
        assert_eq!(store.len(), 1);

        let record = store.get("b1").unwrap();
        assert_eq!(record.version, 2);
        assert_eq!(record.attribute("quantity"), Some(&json!(2)));
        assert_eq!(record.attribute("title"), Some(&json!("Dune")));
        assert!(matches!(store.get("b2"), Err(RecordStoreError::NotFound(_))));
    }

    #[test]
    fn test_rejected_write_is_not_journaled() {
        let temp = TempDir::new().unwrap();
        let store = JournalRecordStore::open(temp.path()).unwrap();
        store.put("b1", attrs(json!({"quantity": 1}))).unwrap();
        let size = store.journal_size();

        let result = store.update_fields("b1", attrs(json!({"quantity": 0})), Some(7));
        assert!(matches!(result, Err(RecordStoreError::VersionMismatch { .. })));
        assert!(matches!(store.delete("missing"), Err(RecordStoreError::NotFound(_))));
        assert_eq!(store.journal_size(), size);
    }

    #[test]
    fn test_corrupt_journal_aborts_open() {
        let temp = TempDir::new().unwrap();
        {
            let store = JournalRecordStore::open(temp.path()).unwrap();
            store.put("b1", attrs(json!({"title": "Dune"}))).unwrap();
        }

        let path = temp.path().join(JOURNAL_FILE);
        let mut contents = fs::read(&path).unwrap();
        let mid = contents.len() / 2;
        contents[mid] ^= 0xFF;
        fs::write(&path, contents).unwrap();

        let result = JournalRecordStore::open(temp.path());
        assert!(matches!(result, Err(RecordStoreError::Corruption { .. })));
    }

    #[test]
    fn test_torn_tail_aborts_open() {
        let temp = TempDir::new().unwrap();
        {
            let store = JournalRecordStore::open(temp.path()).unwrap();
            store.put("b1", attrs(json!({"title": "Dune"}))).unwrap();
        }

        let path = temp.path().join(JOURNAL_FILE);
        let mut contents = fs::read(&path).unwrap();
        contents.extend_from_slice(&[0x10, 0x00]);
        fs::write(&path, contents).unwrap();

        let result = JournalRecordStore::open(temp.path());
        assert!(matches!(result, Err(RecordStoreError::Corruption { .. })));
    }

    #[test]
    fn test_rollback_cuts_partial_frame() {
        let temp = TempDir::new().unwrap();
        {
            let store = JournalRecordStore::open(temp.path()).unwrap();
            store.put("b1", attrs(json!({"title": "Dune"}))).unwrap();

            let mut inner = store.lock().unwrap();
            // Half a frame, as left behind by a short write.
            inner.file.write_all(&[0x40, 0x00, 0x00]).unwrap();
            let err = inner.rollback("short write".into());
            assert!(matches!(err, RecordStoreError::IoError(_)));
            assert!(!err.is_fatal());
            drop(inner);

            store.put("b2", attrs(json!({"title": "Emma"}))).unwrap();
            assert!(!store.is_poisoned());
        }

        let store = JournalRecordStore::open(temp.path()).unwrap();
        assert_eq!(store.len(), 2);
        assert_eq!(fs::metadata(store.path()).unwrap().len(), store.journal_size());
    }

    #[test]
    fn test_poisoned_store_refuses_writes() {
        let temp = TempDir::new().unwrap();
        let store = JournalRecordStore::open(temp.path()).unwrap();
        store.put("b1", attrs(json!({"quantity": 1}))).unwrap();
        store.lock().unwrap().poisoned = Some("fsync failed".into());
        let size = store.journal_size();

        let err = store.put("b2", attrs(json!({"quantity": 1}))).unwrap_err();
        assert!(matches!(err, RecordStoreError::Poisoned(_)));
        assert!(err.is_fatal());
        assert!(matches!(
            store.update_fields("b1", attrs(json!({"quantity": 0})), Some(1)),
            Err(RecordStoreError::Poisoned(_))
        ));
        assert!(matches!(store.delete("b1"), Err(RecordStoreError::Poisoned(_))));

        // Reads keep serving the acknowledged state.
        assert_eq!(store.get("b1").unwrap().attribute("quantity"), Some(&json!(1)));
        assert!(matches!(store.get("b2"), Err(RecordStoreError::NotFound(_))));
        assert_eq!(store.journal_size(), size);
        assert!(store.is_poisoned());
    }
}
