use std::fs;
use std::path::{Path, PathBuf};

use tracing::{info, warn};

use super::record::{RecordingPatch, RecordingRecord};
use crate::error::{Error, Result};

/// Durable, crash-surviving list of [`RecordingRecord`]s.
///
/// A single JSON file holds the whole array; every mutation is a
/// read-modify-write followed by a rename, so a crash mid-write never leaves
/// a partially written index behind. Insertion order is chronological
/// (most-recent-last).
pub struct LocalRecordingStore {
    path: PathBuf,
}

impl LocalRecordingStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// All records, order preserved. An absent index file is an empty list,
    /// never an error.
    pub fn list(&self) -> Result<Vec<RecordingRecord>> {
        self.load()
    }

    /// Look up a single record by id.
    pub fn get(&self, id: &str) -> Result<Option<RecordingRecord>> {
        Ok(self.load()?.into_iter().find(|r| r.id == id))
    }

    /// Add a record to the end of the persisted sequence.
    pub fn append(&self, record: RecordingRecord) -> Result<()> {
        let mut records = self.load()?;
        info!("Appending recording {} to store", record.id);
        records.push(record);
        self.save(&records)
    }

    /// Merge `patch` into the record with `id`. Fails with `NotFound` if the
    /// id is absent; callers must have appended before updating.
    pub fn update(&self, id: &str, patch: &RecordingPatch) -> Result<RecordingRecord> {
        let mut records = self.load()?;
        let record = records
            .iter_mut()
            .find(|r| r.id == id)
            .ok_or_else(|| Error::NotFound(id.to_string()))?;
        patch.apply(record);
        let updated = record.clone();
        self.save(&records)?;
        Ok(updated)
    }

    /// Delete exactly one record by id. A no-op (not an error) if absent.
    pub fn remove(&self, id: &str) -> Result<()> {
        let mut records = self.load()?;
        let before = records.len();
        records.retain(|r| r.id != id);
        if records.len() == before {
            warn!("Remove requested for unknown recording id {}", id);
            return Ok(());
        }
        info!("Removed recording {} from store", id);
        self.save(&records)
    }

    /// Delete all records unconditionally. Only called behind an explicit
    /// destructive confirmation.
    pub fn clear(&self) -> Result<()> {
        self.save(&[])
    }

    fn load(&self) -> Result<Vec<RecordingRecord>> {
        let data = match fs::read(&self.path) {
            Ok(data) => data,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => {
                return Err(Error::StorageUnavailable(format!(
                    "failed to read {}: {}",
                    self.path.display(),
                    e
                )))
            }
        };
        serde_json::from_slice(&data).map_err(|e| {
            Error::StorageUnavailable(format!(
                "recording index {} is unreadable: {}",
                self.path.display(),
                e
            ))
        })
    }

    fn save(&self, records: &[RecordingRecord]) -> Result<()> {
        let data = serde_json::to_vec_pretty(records)
            .map_err(|e| Error::StorageUnavailable(format!("failed to encode index: {}", e)))?;

        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                Error::StorageUnavailable(format!(
                    "failed to create {}: {}",
                    parent.display(),
                    e
                ))
            })?;
        }

        // Write to a sibling temp file and rename over the index so readers
        // never observe a partial write.
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, &data).map_err(|e| {
            Error::StorageUnavailable(format!("failed to write {}: {}", tmp.display(), e))
        })?;
        fs::rename(&tmp, &self.path).map_err(|e| {
            Error::StorageUnavailable(format!(
                "failed to replace {}: {}",
                self.path.display(),
                e
            ))
        })
    }
}
