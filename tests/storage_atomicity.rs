//! Transactional invariant tests for the storage adapter.
//!
//! Covered properties:
//! - Atomicity: create + write inside a rolled-back transaction leaves
//!   no object behind
//! - Delete rollback safety: delete + rollback leaves the object
//!   readable with unchanged content
//! - Write-commit-reopen scenario with a 500,000 byte payload
//! - Replace-on-save keeps "swap file" semantics atomic
//! - Deleting a missing reference never issues a failing statement, so
//!   the surrounding transaction stays committable

use pg_lo_store::{DbFileStorage, MemoryLargeObjects, OpenMode, StorageError};

fn harness() -> (DbFileStorage, MemoryLargeObjects) {
    (DbFileStorage::default(), MemoryLargeObjects::new())
}

// =============================================================================
// Atomicity
// =============================================================================

#[test]
fn test_rollback_discards_created_object() {
    let (storage, mut lo) = harness();

    lo.begin();
    let name = storage.save(&mut lo, "doc.txt", &mut &b"draft"[..]).unwrap();
    assert!(storage.exists(&mut lo, &name).unwrap());
    lo.rollback();

    lo.begin();
    assert!(!storage.exists(&mut lo, &name).unwrap());
    assert!(matches!(
        storage.open(&mut lo, &name, OpenMode::Read),
        Err(StorageError::ObjectNotFound(_))
    ));
}

#[test]
fn test_delete_then_rollback_leaves_object_intact() {
    let (storage, mut lo) = harness();

    lo.begin();
    let name = storage.save(&mut lo, "doc.txt", &mut &b"hello"[..]).unwrap();
    lo.commit();

    lo.begin();
    storage.delete(&mut lo, &name).unwrap();
    assert!(!storage.exists(&mut lo, &name).unwrap());
    lo.rollback();

    lo.begin();
    let mut file = storage.open(&mut lo, &name, OpenMode::Read).unwrap();
    assert_eq!(file.read_to_end().unwrap(), b"hello");
}

#[test]
fn test_commit_then_reopen_large_payload() {
    let (storage, mut lo) = harness();
    let data: Vec<u8> = (0..500_000).map(|i| (i % 256) as u8).collect();

    lo.begin();
    let name = storage.save(&mut lo, "big.bin", &mut &data[..]).unwrap();
    lo.commit();

    lo.begin();
    let read_back = {
        let mut file = storage.open(&mut lo, &name, OpenMode::Read).unwrap();
        file.read_to_end().unwrap()
    };
    assert_eq!(read_back.len(), 500_000);
    assert_eq!(read_back, data);
}

#[test]
fn test_delete_after_commit_is_permanent() {
    let (storage, mut lo) = harness();

    lo.begin();
    let name = storage.save(&mut lo, "doc.txt", &mut &b"gone"[..]).unwrap();
    lo.commit();

    lo.begin();
    storage.delete(&mut lo, &name).unwrap();
    lo.commit();

    lo.begin();
    assert!(!storage.exists(&mut lo, &name).unwrap());
}

// =============================================================================
// Replace-on-save
// =============================================================================

#[test]
fn test_replace_swaps_objects_in_one_transaction() {
    let (storage, mut lo) = harness();

    lo.begin();
    let old = storage.save(&mut lo, "v1.txt", &mut &b"one"[..]).unwrap();
    lo.commit();

    lo.begin();
    let new = storage
        .replace(&mut lo, Some(&old), "v2.txt", &mut &b"two"[..])
        .unwrap();
    lo.commit();

    lo.begin();
    assert!(!storage.exists(&mut lo, &old).unwrap());
    let mut file = storage.open(&mut lo, &new, OpenMode::Read).unwrap();
    assert_eq!(file.read_to_end().unwrap(), b"two");
}

#[test]
fn test_replace_rollback_restores_old_and_discards_new() {
    let (storage, mut lo) = harness();

    lo.begin();
    let old = storage.save(&mut lo, "v1.txt", &mut &b"one"[..]).unwrap();
    lo.commit();

    lo.begin();
    let new = storage
        .replace(&mut lo, Some(&old), "v2.txt", &mut &b"two"[..])
        .unwrap();
    lo.rollback();

    lo.begin();
    assert!(!storage.exists(&mut lo, &new).unwrap());
    let mut file = storage.open(&mut lo, &old, OpenMode::Read).unwrap();
    assert_eq!(file.read_to_end().unwrap(), b"one");
}

#[test]
fn test_replace_with_stale_previous_reference_keeps_new_file() {
    let (storage, mut lo) = harness();

    // The previous reference points at an object that no longer exists.
    // The delete half of the swap must not issue a failing statement:
    // that would abort the transaction and take the new file with it.
    lo.begin();
    let new = storage
        .replace(&mut lo, Some("999999.bin"), "v2.txt", &mut &b"two"[..])
        .unwrap();
    lo.commit();

    lo.begin();
    assert!(storage.exists(&mut lo, &new).unwrap());
    let mut file = storage.open(&mut lo, &new, OpenMode::Read).unwrap();
    assert_eq!(file.read_to_end().unwrap(), b"two");
}

#[test]
fn test_delete_missing_does_not_abort_transaction() {
    let (storage, mut lo) = harness();

    lo.begin();
    let kept = storage.save(&mut lo, "keep.txt", &mut &b"kept"[..]).unwrap();
    storage.delete(&mut lo, "999999.bin").unwrap();
    lo.commit();

    lo.begin();
    assert!(storage.exists(&mut lo, &kept).unwrap());
}

// =============================================================================
// Adapter surface
// =============================================================================

#[test]
fn test_empty_save_round_trip() {
    let (storage, mut lo) = harness();

    lo.begin();
    let name = storage.save(&mut lo, "empty.bin", &mut &b""[..]).unwrap();
    // An empty object still exists; existence is metadata, not pages.
    assert!(storage.exists(&mut lo, &name).unwrap());
    assert_eq!(storage.size(&mut lo, &name).unwrap(), 0);
}

#[test]
fn test_size_of_missing_file() {
    let (storage, mut lo) = harness();

    lo.begin();
    assert!(matches!(
        storage.size(&mut lo, "424242.bin"),
        Err(StorageError::ObjectNotFound(424242))
    ));
}

#[test]
fn test_loid_is_stable_across_transactions() {
    let (storage, mut lo) = harness();

    lo.begin();
    let name = storage.save(&mut lo, "a.png", &mut &b"img"[..]).unwrap();
    lo.commit();

    lo.begin();
    let file = storage.open(&mut lo, &name, OpenMode::Read).unwrap();
    assert_eq!(format!("{}.png", file.loid()), name);
}
