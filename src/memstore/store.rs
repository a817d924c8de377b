//! MemStore implementation
//!
//! HashMaps behind a single mutex, plus the shared TTL heap.

use std::collections::{BTreeMap, HashMap};

use parking_lot::Mutex;

use crate::error::{Result, SlotKvError};
use crate::store::Store;
use crate::ttl::{self, Sweep, SweepOutcome, TtlEntry, TtlHeap};

/// TTL attached to a live key
#[derive(Debug, Clone, Copy)]
struct TtlStamp {
    expires_at: u32,
    generation: u64,
}

/// In-memory store with TTL support
pub struct MemStore {
    inner: Mutex<MemStoreInner>,
}

#[derive(Default)]
struct MemStoreInner {
    values: HashMap<Vec<u8>, Vec<u8>>,
    /// Only keys written with a TTL appear here
    ttls: HashMap<Vec<u8>, TtlStamp>,
    heap: TtlHeap,
    next_generation: u64,
}

impl MemStore {
    /// Create a new empty MemStore
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(MemStoreInner::default()),
        }
    }

    /// Heap entries awaiting expiry, stale ones included
    pub fn pending_expirations(&self) -> usize {
        self.inner.lock().heap.len()
    }
}

impl Default for MemStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemStoreInner {
    fn is_expired(&self, key: &[u8], now: u32) -> bool {
        self.ttls
            .get(key)
            .map(|stamp| ttl::is_passed(stamp.expires_at, now))
            .unwrap_or(false)
    }

    fn remove(&mut self, key: &[u8]) -> bool {
        self.ttls.remove(key);
        self.values.remove(key).is_some()
    }
}

impl Store for MemStore {
    fn is_exists(&self, key: &[u8]) -> bool {
        self.inner.lock().values.contains_key(key)
    }

    fn create(&self, key: &[u8], value: &[u8], ttl_seconds: u32) -> Result<()> {
        let mut inner = self.inner.lock();
        let now = ttl::now_unix_secs();

        if inner.values.contains_key(key) {
            if !inner.is_expired(key, now) {
                return Err(SlotKvError::KeyAlreadyExists);
            }
            inner.remove(key);
        }

        let expires_at = ttl::expiry_from(now, ttl_seconds)?;
        inner.values.insert(key.to_vec(), value.to_vec());

        if expires_at != 0 {
            let generation = inner.next_generation;
            inner.next_generation += 1;

            inner.ttls.insert(
                key.to_vec(),
                TtlStamp {
                    expires_at,
                    generation,
                },
            );
            inner.heap.push(TtlEntry {
                expires_at,
                key: key.to_vec(),
                generation,
            });
        }

        Ok(())
    }

    fn get(&self, key: &[u8]) -> Result<Vec<u8>> {
        let mut inner = self.inner.lock();

        if !inner.values.contains_key(key) {
            return Err(SlotKvError::KeyNotFound);
        }
        if inner.is_expired(key, ttl::now_unix_secs()) {
            inner.remove(key);
            return Err(SlotKvError::KeyExpired);
        }

        inner
            .values
            .get(key)
            .cloned()
            .ok_or(SlotKvError::KeyNotFound)
    }

    fn delete(&self, key: &[u8]) -> Result<()> {
        self.inner.lock().remove(key);
        Ok(())
    }

    fn get_all(&self) -> Result<BTreeMap<Vec<u8>, Vec<u8>>> {
        let inner = self.inner.lock();
        let now = ttl::now_unix_secs();

        Ok(inner
            .values
            .iter()
            .filter(|(key, _)| !inner.is_expired(key, now))
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect())
    }

    fn len(&self) -> usize {
        self.inner.lock().values.len()
    }
}

impl Sweep for MemStore {
    fn expire_next(&self, now: u32) -> Result<SweepOutcome> {
        let mut inner = self.inner.lock();

        let Some(due) = inner.heap.pop_due(now) else {
            return Ok(SweepOutcome::Idle);
        };

        match inner.ttls.get(&due.key) {
            Some(stamp) if stamp.generation == due.generation => {
                inner.remove(&due.key);
                Ok(SweepOutcome::Removed(due.key))
            }
            _ => Ok(SweepOutcome::Stale),
        }
    }
}
