//! Large-object handle layer.
//!
//! Minimal-surface binding to the database's large-object primitives:
//! the [`LargeObjects`] seam, its PostgreSQL implementation on
//! [`postgres::Transaction`], and an in-memory implementation for the
//! test suite. All operations execute within the caller-supplied
//! transaction; none commit or roll back.

mod api;
mod memory;
mod pg;

pub use api::{Fd, LargeObjects, Loid, INV_READ, INV_WRITE, SEEK_CUR, SEEK_END, SEEK_SET};
pub use memory::MemoryLargeObjects;
