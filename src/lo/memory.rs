//! In-memory implementation of the handle seam.
//!
//! Mirrors the server's observable behavior for the engine test suite:
//! server-side cursors per descriptor, zero-filled holes on writes past
//! end-of-object, transaction scoping with snapshot rollback, and
//! transaction abort on a failed statement (after which commands are
//! rejected and a commit degrades to a rollback, as under SQLSTATE
//! 25P02). It is not a database: one connection, no locking, no
//! isolation between concurrent users.

use std::collections::HashMap;

use super::{Fd, LargeObjects, Loid, INV_READ, INV_WRITE, SEEK_CUR, SEEK_END, SEEK_SET};
use crate::errors::{StorageError, StorageResult};

#[derive(Debug, Clone)]
struct Descriptor {
    loid: Loid,
    pos: u64,
    flags: i32,
}

/// In-memory large-object store with explicit transaction control.
#[derive(Debug, Default)]
pub struct MemoryLargeObjects {
    objects: HashMap<Loid, Vec<u8>>,
    descriptors: HashMap<Fd, Descriptor>,
    snapshot: Option<HashMap<Loid, Vec<u8>>>,
    next_loid: Loid,
    next_fd: Fd,
    active: bool,
    aborted: bool,
}

impl MemoryLargeObjects {
    /// Creates an empty store with no transaction open.
    pub fn new() -> Self {
        Self {
            // First OID assigned to user objects on a fresh cluster.
            next_loid: 16384,
            ..Default::default()
        }
    }

    /// Opens a transaction. Large-object calls are rejected outside one.
    pub fn begin(&mut self) {
        self.snapshot = Some(self.objects.clone());
        self.active = true;
        self.aborted = false;
    }

    /// Commits: keeps all changes and invalidates open descriptors.
    /// An aborted transaction cannot commit; the server turns its COMMIT
    /// into a rollback, and so does this.
    pub fn commit(&mut self) {
        if self.aborted {
            self.rollback();
            return;
        }
        self.snapshot = None;
        self.descriptors.clear();
        self.active = false;
    }

    /// Rolls back: restores the state captured by [`begin`](Self::begin)
    /// and invalidates open descriptors.
    pub fn rollback(&mut self) {
        if let Some(snapshot) = self.snapshot.take() {
            self.objects = snapshot;
        }
        self.descriptors.clear();
        self.active = false;
        self.aborted = false;
    }

    fn ensure_usable(&self) -> StorageResult<()> {
        if !self.active {
            return Err(StorageError::NoActiveTransaction);
        }
        if self.aborted {
            return Err(StorageError::TransactionAborted);
        }
        Ok(())
    }

    /// Records a statement failure. Everything after it is rejected until
    /// the transaction block ends.
    fn abort<T>(&mut self, err: StorageError) -> StorageResult<T> {
        self.aborted = true;
        Err(err)
    }

    fn descriptor(&self, fd: Fd) -> StorageResult<Descriptor> {
        // A stale fd behaves like the server's invalid-descriptor error.
        self.descriptors
            .get(&fd)
            .cloned()
            .ok_or(StorageError::ClosedStream)
    }

    fn set_pos(&mut self, fd: Fd, pos: u64) {
        if let Some(desc) = self.descriptors.get_mut(&fd) {
            desc.pos = pos;
        }
    }
}

impl LargeObjects for MemoryLargeObjects {
    fn is_active(&self) -> bool {
        self.active
    }

    fn create(&mut self) -> StorageResult<Loid> {
        self.ensure_usable()?;
        let loid = self.next_loid;
        self.next_loid += 1;
        self.objects.insert(loid, Vec::new());
        Ok(loid)
    }

    fn open(&mut self, loid: Loid, flags: i32) -> StorageResult<Fd> {
        self.ensure_usable()?;
        if !self.objects.contains_key(&loid) {
            return self.abort(StorageError::ObjectNotFound(loid));
        }
        let fd = self.next_fd;
        self.next_fd += 1;
        self.descriptors.insert(fd, Descriptor { loid, pos: 0, flags });
        Ok(fd)
    }

    fn read(&mut self, fd: Fd, len: usize) -> StorageResult<Vec<u8>> {
        self.ensure_usable()?;
        let desc = match self.descriptor(fd) {
            Ok(desc) => desc,
            Err(err) => return self.abort(err),
        };
        if desc.flags & INV_READ == 0 {
            return self.abort(StorageError::Mode("reading"));
        }
        if !self.objects.contains_key(&desc.loid) {
            return self.abort(StorageError::ObjectNotFound(desc.loid));
        }
        let data = &self.objects[&desc.loid];
        let start = (desc.pos as usize).min(data.len());
        let end = start.saturating_add(len).min(data.len());
        let chunk = data[start..end].to_vec();
        self.set_pos(fd, (start + chunk.len()) as u64);
        Ok(chunk)
    }

    fn write(&mut self, fd: Fd, data: &[u8]) -> StorageResult<usize> {
        self.ensure_usable()?;
        let desc = match self.descriptor(fd) {
            Ok(desc) => desc,
            Err(err) => return self.abort(err),
        };
        if desc.flags & INV_WRITE == 0 {
            return self.abort(StorageError::Mode("writing"));
        }
        if !self.objects.contains_key(&desc.loid) {
            return self.abort(StorageError::ObjectNotFound(desc.loid));
        }
        let object = self
            .objects
            .get_mut(&desc.loid)
            .ok_or(StorageError::ObjectNotFound(desc.loid))?;
        let start = desc.pos as usize;
        let end = start + data.len();
        // Writes past end-of-object zero-fill the gap, as the server does.
        if object.len() < end {
            object.resize(end, 0);
        }
        object[start..end].copy_from_slice(data);
        self.set_pos(fd, end as u64);
        Ok(data.len())
    }

    fn seek(&mut self, fd: Fd, offset: i64, whence: i32) -> StorageResult<i64> {
        self.ensure_usable()?;
        let desc = match self.descriptor(fd) {
            Ok(desc) => desc,
            Err(err) => return self.abort(err),
        };
        if !self.objects.contains_key(&desc.loid) {
            return self.abort(StorageError::ObjectNotFound(desc.loid));
        }
        let len = self.objects[&desc.loid].len() as i64;
        let base = match whence {
            SEEK_SET => 0,
            SEEK_CUR => desc.pos as i64,
            SEEK_END => len,
            _ => {
                return self.abort(StorageError::Io(std::io::Error::new(
                    std::io::ErrorKind::InvalidInput,
                    "invalid whence",
                )))
            }
        };
        let target = base + offset;
        if target < 0 {
            return self.abort(StorageError::Io(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                "negative seek target",
            )));
        }
        self.set_pos(fd, target as u64);
        Ok(target)
    }

    fn tell(&mut self, fd: Fd) -> StorageResult<i64> {
        self.ensure_usable()?;
        match self.descriptor(fd) {
            Ok(desc) => Ok(desc.pos as i64),
            Err(err) => self.abort(err),
        }
    }

    fn truncate(&mut self, fd: Fd, len: i64) -> StorageResult<()> {
        self.ensure_usable()?;
        let desc = match self.descriptor(fd) {
            Ok(desc) => desc,
            Err(err) => return self.abort(err),
        };
        if desc.flags & INV_WRITE == 0 {
            return self.abort(StorageError::Mode("writing"));
        }
        if !self.objects.contains_key(&desc.loid) {
            return self.abort(StorageError::ObjectNotFound(desc.loid));
        }
        let object = self
            .objects
            .get_mut(&desc.loid)
            .ok_or(StorageError::ObjectNotFound(desc.loid))?;
        // lo_truncate64 zero-extends when the new length is larger.
        object.resize(len.max(0) as usize, 0);
        Ok(())
    }

    fn close(&mut self, fd: Fd) -> StorageResult<()> {
        self.ensure_usable()?;
        self.descriptors.remove(&fd);
        Ok(())
    }

    fn unlink(&mut self, loid: Loid) -> StorageResult<()> {
        self.ensure_usable()?;
        if self.objects.remove(&loid).is_none() {
            return self.abort(StorageError::ObjectNotFound(loid));
        }
        Ok(())
    }

    fn exists(&mut self, loid: Loid) -> StorageResult<bool> {
        // Runs as a query on the server, so the transaction rules apply
        // to it like any other statement.
        self.ensure_usable()?;
        Ok(self.objects.contains_key(&loid))
    }
}
