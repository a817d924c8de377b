//! MemStore Tests
//!
//! Tests verify:
//! - The shared store contract (create/get/delete/get_all)
//! - TTL expiry, lazy and through the sweep capability
//! - Stale heap entries are skipped
//! - Concurrent access patterns

use std::sync::Arc;
use std::thread;
use std::time::Duration;

use slotkv::ttl::{now_unix_secs, Sweep, SweepOutcome};
use slotkv::{MemStore, SlotKvError, Store};

// =============================================================================
// Basic Operations Tests
// =============================================================================

#[test]
fn test_new_memstore_is_empty() {
    let store = MemStore::new();
    assert!(store.is_empty());
    assert_eq!(store.len(), 0);
    assert!(store.get_all().unwrap().is_empty());
}

#[test]
fn test_create_and_get() {
    let store = MemStore::new();

    store.create(b"key1", b"value1", 0).unwrap();

    assert!(store.is_exists(b"key1"));
    assert_eq!(store.get(b"key1").unwrap(), b"value1".to_vec());
}

#[test]
fn test_get_nonexistent_key() {
    let store = MemStore::new();
    assert!(matches!(store.get(b"nope"), Err(SlotKvError::KeyNotFound)));
}

#[test]
fn test_create_existing_key_fails() {
    let store = MemStore::new();
    store.create(b"key", b"v1", 0).unwrap();

    assert!(matches!(
        store.create(b"key", b"v2", 0),
        Err(SlotKvError::KeyAlreadyExists)
    ));
    assert_eq!(store.get(b"key").unwrap(), b"v1".to_vec());
}

#[test]
fn test_delete() {
    let store = MemStore::new();
    store.create(b"a", b"1", 0).unwrap();
    store.create(b"b", b"2", 5).unwrap();

    store.delete(b"a").unwrap();
    store.delete(b"b").unwrap();
    store.delete(b"missing").unwrap();

    assert!(!store.is_exists(b"a"));
    assert!(!store.is_exists(b"b"));
    assert!(store.is_empty());
}

#[test]
fn test_get_all_returns_every_pair() {
    let store = MemStore::new();
    store.create(b"key_1", b"{\"1\":2}", 0).unwrap();
    store.create(b"key_2", &vec![b'x'; 8800], 0).unwrap();
    store.create(b"key_3", b"{\"1\":\"ss\"}", 0).unwrap();

    let all = store.get_all().unwrap();
    assert_eq!(all.len(), 3);
    assert_eq!(all[b"key_2".as_slice()].len(), 8800);

    store.delete(b"key_2").unwrap();
    let keys: Vec<Vec<u8>> = store.get_all().unwrap().into_keys().collect();
    assert_eq!(keys, vec![b"key_1".to_vec(), b"key_3".to_vec()]);
}

#[test]
fn test_flush_is_noop() {
    let store = MemStore::new();
    store.create(b"k", b"v", 0).unwrap();
    store.flush().unwrap();
    assert_eq!(store.len(), 1);
}

// =============================================================================
// TTL Tests
// =============================================================================

#[test]
fn test_ttl_expires_lazily_on_get() {
    let store = MemStore::new();
    store.create(b"temp", b"value", 1).unwrap();

    thread::sleep(Duration::from_millis(2100));

    assert!(matches!(store.get(b"temp"), Err(SlotKvError::KeyExpired)));
    assert!(!store.is_exists(b"temp"));
    assert!(store.get_all().unwrap().is_empty());
}

#[test]
fn test_create_over_expired_key() {
    let store = MemStore::new();
    store.create(b"key", b"old", 1).unwrap();

    thread::sleep(Duration::from_millis(2100));

    store.create(b"key", b"new", 0).unwrap();
    assert_eq!(store.get(b"key").unwrap(), b"new".to_vec());
}

#[test]
fn test_expire_next_removes_due_key() {
    let store = MemStore::new();
    store.create(b"soon", b"v", 10).unwrap();
    store.create(b"never", b"v", 0).unwrap();

    let now = now_unix_secs();
    assert_eq!(store.expire_next(now).unwrap(), SweepOutcome::Idle);
    assert_eq!(
        store.expire_next(now + 60).unwrap(),
        SweepOutcome::Removed(b"soon".to_vec())
    );

    assert!(!store.is_exists(b"soon"));
    assert!(store.is_exists(b"never"));
}

#[test]
fn test_stale_entry_after_delete_and_rewrite() {
    let store = MemStore::new();
    store.create(b"key", b"v1", 10).unwrap();
    store.delete(b"key").unwrap();
    store.create(b"key", b"v2", 0).unwrap();

    let later = now_unix_secs() + 60;
    assert_eq!(store.expire_next(later).unwrap(), SweepOutcome::Stale);
    assert_eq!(store.expire_next(later).unwrap(), SweepOutcome::Idle);
    assert_eq!(store.get(b"key").unwrap(), b"v2".to_vec());
}

#[test]
fn test_stale_entry_for_deleted_key() {
    let store = MemStore::new();
    store.create(b"key", b"v1", 10).unwrap();
    store.delete(b"key").unwrap();

    assert_eq!(store.pending_expirations(), 1);
    assert_eq!(
        store.expire_next(now_unix_secs() + 60).unwrap(),
        SweepOutcome::Stale
    );
    assert_eq!(store.pending_expirations(), 0);
}

// =============================================================================
// Concurrency Tests
// =============================================================================

#[test]
fn test_concurrent_creates() {
    let store = Arc::new(MemStore::new());

    let handles: Vec<_> = (0..4)
        .map(|t| {
            let store = Arc::clone(&store);
            thread::spawn(move || {
                for i in 0..100 {
                    let key = format!("t{}_{}", t, i);
                    store.create(key.as_bytes(), key.as_bytes(), 0).unwrap();
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }

    assert_eq!(store.len(), 400);
    assert_eq!(store.get(b"t3_99").unwrap(), b"t3_99".to_vec());
}

#[test]
fn test_concurrent_create_same_key_single_winner() {
    let store = Arc::new(MemStore::new());

    let handles: Vec<_> = (0..8)
        .map(|t| {
            let store = Arc::clone(&store);
            thread::spawn(move || store.create(b"contended", &[t as u8], 0).is_ok())
        })
        .collect();

    let winners = handles
        .into_iter()
        .map(|h| h.join().unwrap())
        .filter(|&won| won)
        .count();

    assert_eq!(winners, 1);
    assert_eq!(store.len(), 1);
}
