//! Engine Module
//!
//! The public entry point that fronts a store backend.
//!
//! ## Responsibilities
//! - Enforce external key/value size limits
//! - Check key existence before delegating (`KeyNotFound`, `KeyAlreadyExists`)
//! - Own the store and run its expiration engine for the engine's lifetime
//! - Serialize typed values to JSON documents

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::config::Config;
use crate::error::{Result, SlotKvError};
use crate::memstore::MemStore;
use crate::storage::{self, FileStore};
use crate::store::Store;
use crate::ttl::{ExpirationEngine, Sweep};

/// A store plus its background expiration
///
/// The engine is handed explicitly to whoever needs it; there is no
/// global instance. All methods take `&self`, so an `Engine` can be shared
/// between threads behind an `Arc`.
pub struct Engine<S: Store + Sweep + 'static> {
    /// Engine configuration
    config: Config,

    /// Backend, shared with the sweep thread
    store: Arc<S>,

    /// Running sweep; `None` once stopped
    expiration: Option<ExpirationEngine>,
}

impl Engine<FileStore> {
    /// Open or create a file-backed engine with the given config
    ///
    /// On startup:
    /// 1. Validate the config
    /// 2. Ensure the store file exists
    /// 3. Bootstrap or load the slot file
    /// 4. Start the expiration engine
    pub fn open(config: Config) -> Result<Self> {
        config.validate()?;
        storage::ensure_file(&config.path)?;

        let store = FileStore::open(&config.path, config.initial_slots)?;
        Self::with_store(config, store)
    }

    /// Open with a path (convenience method)
    ///
    /// Uses default config with the specified file path
    pub fn open_path(path: &Path) -> Result<Self> {
        Self::open(Config::builder().path(path).build())
    }
}

impl Engine<MemStore> {
    /// Create an engine over a fresh in-memory store
    pub fn in_memory(config: Config) -> Result<Self> {
        Self::with_store(config, MemStore::new())
    }
}

impl<S: Store + Sweep + 'static> Engine<S> {
    /// Wrap an already opened store and start its expiration engine
    pub fn with_store(config: Config, store: S) -> Result<Self> {
        config.validate()?;

        let store = Arc::new(store);
        let expiration = ExpirationEngine::start(
            Arc::clone(&store),
            config.poll_interval,
            config.sweep_failure_policy,
        )?;

        Ok(Self {
            config,
            store,
            expiration: Some(expiration),
        })
    }

    // =========================================================================
    // Operations
    // =========================================================================

    /// Write a new key without expiry
    pub fn write(&self, key: &[u8], value: &[u8]) -> Result<()> {
        self.write_with_ttl(key, value, 0)
    }

    /// Write a new key that expires `ttl_seconds` from now (0 = never)
    pub fn write_with_ttl(&self, key: &[u8], value: &[u8], ttl_seconds: u32) -> Result<()> {
        if key.len() > self.config.max_key_len {
            return Err(SlotKvError::KeyTooLarge {
                len: key.len(),
                max: self.config.max_key_len,
            });
        }
        if value.len() > self.config.max_value_len {
            return Err(SlotKvError::ValueTooLarge {
                len: value.len(),
                max: self.config.max_value_len,
            });
        }

        // Existence is re-checked under the store lock, which also clears an
        // expired-but-unswept record
        self.store.create(key, value, ttl_seconds)
    }

    /// Read a value
    ///
    /// Fails with `KeyNotFound` if absent and `KeyExpired` if its TTL passed.
    pub fn read(&self, key: &[u8]) -> Result<Vec<u8>> {
        if !self.store.is_exists(key) {
            return Err(SlotKvError::KeyNotFound);
        }
        self.store.get(key)
    }

    /// Delete a key, failing with `KeyNotFound` if absent
    pub fn delete(&self, key: &[u8]) -> Result<()> {
        if !self.store.is_exists(key) {
            return Err(SlotKvError::KeyNotFound);
        }
        self.store.delete(key)
    }

    pub fn exists(&self, key: &[u8]) -> bool {
        self.store.is_exists(key)
    }

    /// Every live key/value pair
    pub fn get_all(&self) -> Result<BTreeMap<Vec<u8>, Vec<u8>>> {
        self.store.get_all()
    }

    pub fn len(&self) -> usize {
        self.store.len()
    }

    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }

    // =========================================================================
    // JSON Documents
    // =========================================================================

    pub fn write_json<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> Result<()> {
        self.write_json_with_ttl(key, value, 0)
    }

    pub fn write_json_with_ttl<T: Serialize + ?Sized>(
        &self,
        key: &str,
        value: &T,
        ttl_seconds: u32,
    ) -> Result<()> {
        let bytes = serde_json::to_vec(value)?;
        self.write_with_ttl(key.as_bytes(), &bytes, ttl_seconds)
    }

    pub fn read_json<T: DeserializeOwned>(&self, key: &str) -> Result<T> {
        let bytes = self.read(key.as_bytes())?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    /// Every live pair decoded as JSON, keyed by UTF-8 key
    pub fn get_all_json(&self) -> Result<BTreeMap<String, serde_json::Value>> {
        self.get_all()?
            .into_iter()
            .map(|(key, value)| {
                let key = String::from_utf8(key)
                    .map_err(|e| SlotKvError::Serialization(format!("non UTF-8 key: {}", e)))?;
                Ok((key, serde_json::from_slice(&value)?))
            })
            .collect()
    }

    // =========================================================================
    // Lifecycle
    // =========================================================================

    /// Close the engine gracefully
    ///
    /// Blocks until the sweep thread has exited, then syncs the store.
    pub fn close(mut self) -> Result<()> {
        self.stop_expiration();
        self.store.flush()
    }

    fn stop_expiration(&mut self) {
        if let Some(mut expiration) = self.expiration.take() {
            expiration.stop();
        }
    }

    // =========================================================================
    // Accessors (for testing and debugging)
    // =========================================================================

    /// The backing store
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Whether the sweep thread is alive
    pub fn is_expiring(&self) -> bool {
        self.expiration
            .as_ref()
            .map(ExpirationEngine::is_running)
            .unwrap_or(false)
    }

    /// Get the configuration
    pub fn config(&self) -> &Config {
        &self.config
    }
}

impl<S: Store + Sweep + 'static> Drop for Engine<S> {
    fn drop(&mut self) {
        if self.expiration.is_none() {
            return;
        }
        self.stop_expiration();
        if let Err(e) = self.store.flush() {
            tracing::warn!("Failed to flush store on drop: {}", e);
        }
    }
}
