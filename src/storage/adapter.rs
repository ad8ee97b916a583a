//! Storage adapter over the file-stream engine.
//!
//! Maps storage-interface calls (`save`, `open`, `delete`, `exists`,
//! `size`, `url`) onto [`DbFile`] operations plus the `<loid>.<ext>`
//! filename convention. Constructed once per process and passed to
//! callers explicitly; every method runs inside the caller-supplied
//! transaction and never commits or rolls back.

use std::io::Read;

use tracing::{debug, warn};

use super::config::StorageConfig;
use super::field::{filename_for, loid_from_name};
use crate::errors::{StorageError, StorageResult};
use crate::file::{DbFile, OpenMode, CHUNK_SIZE};
use crate::lo::LargeObjects;

/// File storage backed by large objects.
#[derive(Debug, Clone, Default)]
pub struct DbFileStorage {
    config: StorageConfig,
}

impl DbFileStorage {
    /// Creates a storage adapter with the given configuration.
    pub fn new(config: StorageConfig) -> Self {
        Self { config }
    }

    /// The adapter's configuration.
    pub fn config(&self) -> &StorageConfig {
        &self.config
    }

    /// Whether `name` parses as a stored file name.
    pub fn is_valid_name(&self, name: &str) -> bool {
        loid_from_name(name).is_ok()
    }

    /// Stores `content` as a new large object and returns the external
    /// name `<loid><suffixes-of-name>`.
    ///
    /// The object is created inside the caller's transaction; rolling the
    /// transaction back discards it.
    pub fn save<B: LargeObjects>(
        &self,
        lo: &mut B,
        name: &str,
        content: &mut dyn Read,
    ) -> StorageResult<String> {
        let mut file = DbFile::create(lo, OpenMode::Write)?;
        let mut buf = vec![0u8; CHUNK_SIZE];
        let mut total = 0usize;
        loop {
            let n = content.read(&mut buf)?;
            if n == 0 {
                break;
            }
            file.write(&buf[..n])?;
            total += n;
        }
        let loid = file.loid();
        file.close()?;
        let stored = filename_for(loid, name);
        debug!(loid, size = total, name = %stored, "saved file");
        Ok(stored)
    }

    /// Opens a stored file as a stream.
    pub fn open<'a, B: LargeObjects>(
        &self,
        lo: &'a mut B,
        name: &str,
        mode: OpenMode,
    ) -> StorageResult<DbFile<'a, B>> {
        let loid = loid_from_name(name)?;
        DbFile::open(lo, loid, mode)
    }

    /// Deletes a stored file. A missing object is not an error; any
    /// "replace file" flow must call this in the same transaction as the
    /// compensating save to keep the swap atomic.
    ///
    /// Existence is checked before unlinking: an `lo_unlink` on a missing
    /// object is a failed statement, and a failed statement aborts the
    /// surrounding transaction, taking every other change in it down.
    pub fn delete<B: LargeObjects>(&self, lo: &mut B, name: &str) -> StorageResult<()> {
        let loid = loid_from_name(name)?;
        if !lo.exists(loid)? {
            warn!(loid, "delete of missing large object");
            return Ok(());
        }
        lo.unlink(loid)
    }

    /// Whether the referenced object exists.
    pub fn exists<B: LargeObjects>(&self, lo: &mut B, name: &str) -> StorageResult<bool> {
        let loid = loid_from_name(name)?;
        lo.exists(loid)
    }

    /// Size in bytes of the referenced object.
    pub fn size<B: LargeObjects>(&self, lo: &mut B, name: &str) -> StorageResult<u64> {
        let mut file = self.open(lo, name, OpenMode::Read)?;
        let size = file.size()?;
        file.close()?;
        Ok(size)
    }

    /// URL the file is served under.
    pub fn url(&self, name: &str) -> StorageResult<String> {
        loid_from_name(name)?;
        let base = self.config.base_url.as_deref().ok_or(StorageError::NoUrl)?;
        Ok(format!("{}/{}", base.trim_end_matches('/'), name))
    }

    /// Replace-on-save: stores `content` and deletes the previously
    /// referenced object, both inside the caller's one transaction, so a
    /// rollback restores the old file and discards the new one.
    pub fn replace<B: LargeObjects>(
        &self,
        lo: &mut B,
        previous: Option<&str>,
        name: &str,
        content: &mut dyn Read,
    ) -> StorageResult<String> {
        let stored = self.save(lo, name, content)?;
        if let Some(previous) = previous {
            self.delete(lo, previous)?;
        }
        Ok(stored)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lo::MemoryLargeObjects;

    fn begin() -> (DbFileStorage, MemoryLargeObjects) {
        let mut lo = MemoryLargeObjects::new();
        lo.begin();
        (DbFileStorage::default(), lo)
    }

    #[test]
    fn test_save_names_file_after_loid() {
        let (storage, mut lo) = begin();
        let name = storage
            .save(&mut lo, "report.tar.gz", &mut &b"payload"[..])
            .unwrap();

        let loid = loid_from_name(&name).unwrap();
        assert_eq!(name, format!("{}.tar.gz", loid));
        assert!(storage.exists(&mut lo, &name).unwrap());
        assert_eq!(storage.size(&mut lo, &name).unwrap(), 7);
    }

    #[test]
    fn test_open_round_trip() {
        let (storage, mut lo) = begin();
        let name = storage.save(&mut lo, "a.bin", &mut &b"abc"[..]).unwrap();

        let mut file = storage.open(&mut lo, &name, OpenMode::Read).unwrap();
        assert_eq!(file.read_to_end().unwrap(), b"abc");
    }

    #[test]
    fn test_open_rejects_foreign_names() {
        let (storage, mut lo) = begin();
        let result = storage.open(&mut lo, "report.pdf", OpenMode::Read);
        assert!(matches!(result, Err(StorageError::InvalidName(_))));
        assert!(!storage.is_valid_name("report.pdf"));
    }

    #[test]
    fn test_delete_missing_leaves_transaction_usable() {
        let (storage, mut lo) = begin();
        storage.delete(&mut lo, "99.bin").unwrap();

        // No failing statement was issued, so the transaction still works.
        let name = storage.save(&mut lo, "a.bin", &mut &b"ok"[..]).unwrap();
        assert!(storage.exists(&mut lo, &name).unwrap());
    }

    #[test]
    fn test_url_requires_base_url() {
        let (storage, _) = begin();
        assert!(matches!(storage.url("1.png"), Err(StorageError::NoUrl)));

        let storage = DbFileStorage::new(StorageConfig::with_base_url("/media/"));
        assert_eq!(storage.url("1.png").unwrap(), "/media/1.png");
    }
}
