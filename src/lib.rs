//! pg-lo-store - transactional file storage on PostgreSQL large objects
//!
//! Files live as server-side large objects and are accessed through a
//! file-like stream bound to the caller's transaction: objects created in
//! a rolled-back transaction vanish, and objects deleted in one reappear,
//! so record updates and their file contents commit or fail together.
//!
//! The crate never begins, commits, or rolls back transactions itself.
//! Callers open a transaction, hand it to [`DbFile`] or [`DbFileStorage`],
//! and decide its fate after the streams are closed.
//!
//! ```no_run
//! use pg_lo_store::{DbFileStorage, OpenMode, StorageConfig};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let storage = DbFileStorage::new(StorageConfig::with_base_url("/media/"));
//!
//! let mut client = postgres::Client::connect("host=localhost user=app", postgres::NoTls)?;
//! let mut tx = client.transaction()?;
//!
//! let name = storage.save(&mut tx, "report.pdf", &mut &b"%PDF-..."[..])?;
//! let size = storage.size(&mut tx, &name)?;
//! tx.commit()?;
//! # let _ = size;
//! # Ok(())
//! # }
//! ```

pub mod errors;
pub mod file;
pub mod lo;
pub mod storage;

pub use errors::{StorageError, StorageResult};
pub use file::{DbFile, Lines, OpenMode, CHUNK_SIZE};
pub use lo::{LargeObjects, Loid, MemoryLargeObjects};
pub use storage::{DbFileStorage, FileRef, StorageConfig};
