//! PostgreSQL implementation of the handle seam.
//!
//! Every primitive maps to one server-side function call
//! (`lo_create`, `lo_open`, `loread`, `lowrite`, `lo_lseek64`, `lo_tell64`,
//! `lo_truncate64`, `lo_close`, `lo_unlink`). Descriptors are only valid
//! for the duration of the transaction, which is why the seam is
//! implemented on [`postgres::Transaction`] rather than on a client.

use postgres::error::SqlState;
use postgres::Transaction;
use tracing::debug;

use super::{Fd, LargeObjects, Loid};
use crate::errors::{StorageError, StorageResult};

/// Maps the server's `undefined_object` to `ObjectNotFound`; everything
/// else passes through unmodified.
fn map_lo_error(loid: Loid, err: postgres::Error) -> StorageError {
    if err.code() == Some(&SqlState::UNDEFINED_OBJECT) {
        StorageError::ObjectNotFound(loid)
    } else {
        StorageError::Backend(err)
    }
}

impl LargeObjects for Transaction<'_> {
    fn is_active(&self) -> bool {
        // A `Transaction` value only exists between BEGIN and
        // COMMIT/ROLLBACK; the borrow checker enforces the lifecycle.
        true
    }

    fn create(&mut self) -> StorageResult<Loid> {
        let row = self.query_one("select lo_create(0)", &[])?;
        let loid: Loid = row.get(0);
        debug!(loid, "created large object");
        Ok(loid)
    }

    fn open(&mut self, loid: Loid, flags: i32) -> StorageResult<Fd> {
        let row = self
            .query_one("select lo_open($1, $2)", &[&loid, &flags])
            .map_err(|e| map_lo_error(loid, e))?;
        Ok(row.get(0))
    }

    fn read(&mut self, fd: Fd, len: usize) -> StorageResult<Vec<u8>> {
        let row = self.query_one("select loread($1, $2)", &[&fd, &(len as i32)])?;
        Ok(row.get(0))
    }

    fn write(&mut self, fd: Fd, data: &[u8]) -> StorageResult<usize> {
        let row = self.query_one("select lowrite($1, $2)", &[&fd, &data])?;
        let written: i32 = row.get(0);
        Ok(written as usize)
    }

    fn seek(&mut self, fd: Fd, offset: i64, whence: i32) -> StorageResult<i64> {
        let row = self.query_one("select lo_lseek64($1, $2, $3)", &[&fd, &offset, &whence])?;
        Ok(row.get(0))
    }

    fn tell(&mut self, fd: Fd) -> StorageResult<i64> {
        let row = self.query_one("select lo_tell64($1)", &[&fd])?;
        Ok(row.get(0))
    }

    fn truncate(&mut self, fd: Fd, len: i64) -> StorageResult<()> {
        self.execute("select lo_truncate64($1, $2)", &[&fd, &len])?;
        Ok(())
    }

    fn close(&mut self, fd: Fd) -> StorageResult<()> {
        self.execute("select lo_close($1)", &[&fd])?;
        Ok(())
    }

    fn unlink(&mut self, loid: Loid) -> StorageResult<()> {
        self.execute("select lo_unlink($1)", &[&loid])
            .map_err(|e| map_lo_error(loid, e))?;
        debug!(loid, "unlinked large object");
        Ok(())
    }

    fn exists(&mut self, loid: Loid) -> StorageResult<bool> {
        // pg_largeobject_metadata also lists empty objects; pg_largeobject
        // only has rows for objects with at least one data page.
        let row = self.query_one(
            "select exists(select 1 from pg_largeobject_metadata where oid = $1)",
            &[&loid],
        )?;
        Ok(row.get(0))
    }
}
