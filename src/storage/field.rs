//! File references for persisted records.
//!
//! Externally visible names always follow `<loid>.<original-extension>`;
//! the loid is the only part consulted when the file is opened or
//! deleted.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::errors::{StorageError, StorageResult};
use crate::lo::Loid;

/// Reference to a stored file, suitable for embedding in a persisted
/// record in place of a filesystem path.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FileRef(String);

impl FileRef {
    /// Wraps a stored name.
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// The stored name.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The large-object id parsed from the name's stem.
    pub fn loid(&self) -> StorageResult<Loid> {
        loid_from_name(&self.0)
    }

    /// Everything after the stem, including the leading dot
    /// (`".tar.gz"` for `"16385.tar.gz"`, `""` for `"16385"`).
    pub fn extension(&self) -> &str {
        suffixes(&self.0)
    }
}

impl fmt::Display for FileRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for FileRef {
    fn from(name: String) -> Self {
        Self(name)
    }
}

fn base_name(name: &str) -> &str {
    name.rsplit(['/', '\\']).next().unwrap_or(name)
}

fn suffixes(name: &str) -> &str {
    let base = base_name(name);
    match base.find('.') {
        Some(i) => &base[i..],
        None => "",
    }
}

/// Parses the loid stem out of a stored name.
///
/// The stem must be plain decimal digits; `u32::from_str` would also
/// take a `+` sign. Zero is rejected too, since the server never
/// assigns OID 0 to a large object.
pub fn loid_from_name(name: &str) -> StorageResult<Loid> {
    let base = base_name(name);
    let stem = base.split('.').next().unwrap_or("");
    if stem.is_empty() || !stem.bytes().all(|b| b.is_ascii_digit()) {
        return Err(StorageError::InvalidName(name.to_string()));
    }
    match stem.parse() {
        Ok(0) | Err(_) => Err(StorageError::InvalidName(name.to_string())),
        Ok(loid) => Ok(loid),
    }
}

/// External name for a freshly created object: the loid plus the original
/// upload name's suffixes.
pub fn filename_for(loid: Loid, original: &str) -> String {
    format!("{}{}", loid, suffixes(original))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_loid_from_name() {
        assert_eq!(loid_from_name("16385.png").unwrap(), 16385);
        assert_eq!(loid_from_name("16385").unwrap(), 16385);
        assert_eq!(loid_from_name("media/16385.tar.gz").unwrap(), 16385);
        assert!(matches!(
            loid_from_name("report.pdf"),
            Err(StorageError::InvalidName(_))
        ));
        assert!(loid_from_name("").is_err());
    }

    #[test]
    fn test_loid_stem_must_be_a_positive_decimal() {
        assert!(matches!(
            loid_from_name("0.png"),
            Err(StorageError::InvalidName(_))
        ));
        assert!(matches!(
            loid_from_name("+5.png"),
            Err(StorageError::InvalidName(_))
        ));
        assert!(loid_from_name("-5.png").is_err());
        assert!(loid_from_name("5x.png").is_err());
        // Out of OID range.
        assert!(loid_from_name("4294967296.png").is_err());
    }

    #[test]
    fn test_filename_keeps_all_suffixes() {
        assert_eq!(filename_for(7, "backup.tar.gz"), "7.tar.gz");
        assert_eq!(filename_for(7, "photos/cat.png"), "7.png");
        assert_eq!(filename_for(7, "noext"), "7");
    }

    #[test]
    fn test_file_ref() {
        let file = FileRef::new("16385.tar.gz");
        assert_eq!(file.loid().unwrap(), 16385);
        assert_eq!(file.extension(), ".tar.gz");
        assert_eq!(file.to_string(), "16385.tar.gz");
    }

    #[test]
    fn test_file_ref_serde_is_transparent() {
        let file = FileRef::new("42.png");
        assert_eq!(serde_json::to_string(&file).unwrap(), r#""42.png""#);
        let parsed: FileRef = serde_json::from_str(r#""42.png""#).unwrap();
        assert_eq!(parsed, file);
    }
}
