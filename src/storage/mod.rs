//! Storage adapter, configuration and record field types.

mod adapter;
mod config;
mod field;

pub use adapter::DbFileStorage;
pub use config::StorageConfig;
pub use field::{filename_for, loid_from_name, FileRef};
