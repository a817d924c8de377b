//! Store contract
//!
//! Operations shared by the file-backed and memory-backed stores.

use std::collections::BTreeMap;

use crate::error::Result;

/// Key-value contract implemented by every backend
///
/// All methods take `&self`; implementations synchronize internally so a
/// store can be shared across caller threads and its sweep thread.
pub trait Store: Send + Sync {
    /// Whether `key` currently has a record (expired-but-unswept included)
    fn is_exists(&self, key: &[u8]) -> bool;

    /// Insert a new record; `ttl_seconds == 0` means no expiry
    ///
    /// Fails with `KeyAlreadyExists` if a live record holds `key`. An
    /// expired record under `key` is removed first.
    fn create(&self, key: &[u8], value: &[u8], ttl_seconds: u32) -> Result<()>;

    /// Fetch a value
    ///
    /// Fails with `KeyExpired` (after deleting the record) if its TTL has
    /// passed, and with `KeyNotFound` if absent.
    fn get(&self, key: &[u8]) -> Result<Vec<u8>>;

    /// Remove a record; no-op if absent
    fn delete(&self, key: &[u8]) -> Result<()>;

    /// Every live key/value pair
    fn get_all(&self) -> Result<BTreeMap<Vec<u8>, Vec<u8>>>;

    /// Number of live records
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Make pending writes durable
    fn flush(&self) -> Result<()> {
        Ok(())
    }
}
