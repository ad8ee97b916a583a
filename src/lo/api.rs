//! The large-object handle seam.
//!
//! One blocking call per operation, executed inside the caller-supplied
//! transaction. No implementation commits or rolls back; object creation
//! and deletion are finalized or discarded by the transaction itself.

use crate::errors::StorageResult;

/// Identifier of a server-side large object (a PostgreSQL OID).
///
/// Globally unique within the database, immutable once assigned, and used
/// as the canonical filename stem.
pub type Loid = u32;

/// Open descriptor returned by [`LargeObjects::open`].
pub type Fd = i32;

/// Descriptor flag: open for reading (`INV_READ`).
pub const INV_READ: i32 = 0x40000;

/// Descriptor flag: open for writing (`INV_WRITE`).
pub const INV_WRITE: i32 = 0x20000;

/// `whence`: offset is relative to the start of the object.
pub const SEEK_SET: i32 = 0;

/// `whence`: offset is relative to the current position.
pub const SEEK_CUR: i32 = 1;

/// `whence`: offset is relative to the end of the object.
pub const SEEK_END: i32 = 2;

/// Direct, minimal-surface binding to large-object primitives.
///
/// Implemented for [`postgres::Transaction`] and, for the test suite, by
/// [`MemoryLargeObjects`](super::MemoryLargeObjects).
pub trait LargeObjects {
    /// Whether a transaction is currently active. Checked by the engine
    /// before every operation.
    fn is_active(&self) -> bool;

    /// Creates a new large object and returns its id.
    fn create(&mut self) -> StorageResult<Loid>;

    /// Opens an existing large object with `INV_*` flags.
    ///
    /// Fails with `ObjectNotFound` if the id does not exist.
    fn open(&mut self, loid: Loid, flags: i32) -> StorageResult<Fd>;

    /// Reads up to `len` bytes from the current position. Returns fewer
    /// than `len` near end-of-object and an empty buffer at it.
    fn read(&mut self, fd: Fd, len: usize) -> StorageResult<Vec<u8>>;

    /// Writes `data` at the current position; returns the count written
    /// and advances the cursor by it.
    fn write(&mut self, fd: Fd, data: &[u8]) -> StorageResult<usize>;

    /// Moves the cursor; returns the new absolute position.
    fn seek(&mut self, fd: Fd, offset: i64, whence: i32) -> StorageResult<i64>;

    /// Current absolute position of the descriptor.
    fn tell(&mut self, fd: Fd) -> StorageResult<i64>;

    /// Truncates (or zero-extends) the object to `len` bytes.
    fn truncate(&mut self, fd: Fd, len: i64) -> StorageResult<()>;

    /// Releases the descriptor.
    fn close(&mut self, fd: Fd) -> StorageResult<()>;

    /// Deletes the object. Transactional: a delete followed by rollback
    /// leaves the object fully intact.
    fn unlink(&mut self, loid: Loid) -> StorageResult<()>;

    /// Whether `loid` exists.
    fn exists(&mut self, loid: Loid) -> StorageResult<bool>;
}
