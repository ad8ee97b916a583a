//! File-stream engine over large objects.

mod stream;

pub use stream::{DbFile, Lines, OpenMode, CHUNK_SIZE};
