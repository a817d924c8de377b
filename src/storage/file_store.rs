//! File Store
//!
//! Slot allocator, key index and TTL bookkeeping over a `SlotRegion`.

use std::collections::{BTreeMap, HashMap};
use std::fs::OpenOptions;
use std::path::{Path, PathBuf};

use parking_lot::Mutex;

use crate::error::{Result, SlotKvError};
use crate::record::codec;
use crate::store::Store;
use crate::ttl::{self, Sweep, SweepOutcome, TtlEntry, TtlHeap};

use super::SlotRegion;

/// Where a live record sits and which TTL applies to it
#[derive(Debug, Clone, Copy)]
struct IndexEntry {
    /// First slot of the record
    slot: u32,
    /// Absolute expiry, 0 = none
    expires_at: u32,
    /// Matches the heap entry pushed for this record
    generation: u64,
}

/// Durable store over a memory-mapped slot file
///
/// ## Concurrency:
/// - One mutex guards the mapping, index, cursor, record count and heap
/// - Every logical operation (encode a record, tombstone a span, update the
///   header) completes under that lock, so the in-memory state never
///   diverges from the file and no reader sees a half-written record
/// - The expiration sweep goes through the same lock via `Sweep`
pub struct FileStore {
    path: PathBuf,
    inner: Mutex<FileStoreInner>,
}

struct FileStoreInner {
    region: SlotRegion,

    /// key → record location
    index: HashMap<Vec<u8>, IndexEntry>,

    /// Next free slot; only ever advances
    cursor: u32,

    /// Live records, mirrored to the header
    record_count: u32,

    /// Pending expirations (may hold stale entries)
    heap: TtlHeap,

    next_generation: u64,
}

impl FileStore {
    /// Open the store file at `path`
    ///
    /// The file must exist (see `storage::ensure_file`). An empty file is
    /// bootstrapped with `initial_slots` of capacity; a non-empty one must
    /// carry the magic byte and is rescanned to rebuild the index.
    pub fn open(path: &Path, initial_slots: u32) -> Result<Self> {
        let file = OpenOptions::new().read(true).write(true).open(path)?;
        let file_len = file.metadata()?.len();

        let inner = if file_len == 0 {
            let region = SlotRegion::create(file, initial_slots)?;
            tracing::info!(
                path = %path.display(),
                total_slots = region.total_slots(),
                "Bootstrapped new store file"
            );
            FileStoreInner::new(region)
        } else {
            let inner = FileStoreInner::rebuild(SlotRegion::load(file)?)?;
            tracing::info!(
                path = %path.display(),
                records = inner.record_count,
                cursor = inner.cursor,
                total_slots = inner.region.total_slots(),
                "Loaded existing store file"
            );
            inner
        };

        Ok(Self {
            path: path.to_path_buf(),
            inner: Mutex::new(inner),
        })
    }

    // =========================================================================
    // Accessors (for testing and debugging)
    // =========================================================================

    /// Path of the backing file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Record count as persisted in the file header
    pub fn record_count(&self) -> u32 {
        self.inner.lock().region.record_count()
    }

    /// Allocation cursor (next slot to be written)
    pub fn cursor(&self) -> u32 {
        self.inner.lock().cursor
    }

    /// Slot capacity of the current mapping
    pub fn total_slots(&self) -> u32 {
        self.inner.lock().region.total_slots()
    }

    /// Heap entries awaiting expiry, stale ones included
    pub fn pending_expirations(&self) -> usize {
        self.inner.lock().heap.len()
    }
}

impl FileStoreInner {
    fn new(region: SlotRegion) -> Self {
        Self {
            region,
            index: HashMap::new(),
            cursor: 0,
            record_count: 0,
            heap: TtlHeap::new(),
            next_generation: 0,
        }
    }

    /// Rebuild index, cursor and heap by scanning a loaded region
    ///
    /// The scan visits every slot from 0, decoding each primary record and
    /// jumping past its span. The persisted record count is only checked
    /// against what the scan found, never used to cut the scan short.
    fn rebuild(region: SlotRegion) -> Result<Self> {
        let expected = region.record_count();
        let total = region.total_slots();
        let mut inner = Self::new(region);

        let mut slot = 0u32;
        let mut found = 0u32;
        // One past the last slot of the last record found
        let mut end = 0u32;

        while slot < total {
            let offset = SlotRegion::slot_offset(slot);
            if !codec::is_primary(inner.region.bytes(), offset) {
                slot += 1;
                continue;
            }

            let record = codec::read_record(inner.region.bytes(), offset)?;
            if inner.index.contains_key(&record.key) {
                return Err(SlotKvError::CorruptStore(format!(
                    "duplicate key {:?} at slot {}",
                    String::from_utf8_lossy(&record.key),
                    slot
                )));
            }

            let generation = inner.bump_generation();
            if record.ttl != 0 {
                inner.heap.push(TtlEntry {
                    expires_at: record.ttl,
                    key: record.key.clone(),
                    generation,
                });
            }
            inner.index.insert(
                record.key,
                IndexEntry {
                    slot,
                    expires_at: record.ttl,
                    generation,
                },
            );

            slot += record.slot_count as u32;
            end = slot;
            found += 1;
        }

        if found != expected {
            tracing::warn!(
                expected,
                found,
                "Persisted record count disagrees with slot contents, adopting scanned count"
            );
            inner.region.set_record_count(found);
        }
        inner.record_count = found;

        let persisted_cursor = inner.region.cursor();
        inner.cursor = end.max(persisted_cursor).min(total);
        if inner.cursor != persisted_cursor {
            inner.region.set_cursor(inner.cursor);
        }

        Ok(inner)
    }

    fn bump_generation(&mut self) -> u64 {
        let generation = self.next_generation;
        self.next_generation += 1;
        generation
    }

    /// Grow the file if fewer than `needed` slots remain past the cursor
    ///
    /// Grows by at least twice the shortfall (and at least the current
    /// capacity) so repeated appends amortize the remap.
    fn ensure_capacity(&mut self, needed: u32) -> Result<()> {
        let total = self.region.total_slots();
        let remaining = total - self.cursor;
        if remaining >= needed {
            return Ok(());
        }

        let shortfall = needed - remaining;
        let grow_by = shortfall.saturating_mul(2).max(total);
        self.region.grow(grow_by)
    }

    /// Tombstone the record under `key` and drop it from the index
    ///
    /// Returns `false` if the key was not indexed.
    fn remove(&mut self, key: &[u8]) -> Result<bool> {
        let Some(entry) = self.index.get(key).copied() else {
            return Ok(false);
        };

        codec::delete_record(self.region.bytes_mut(), SlotRegion::slot_offset(entry.slot))?;
        self.index.remove(key);

        self.record_count = self.record_count.saturating_sub(1);
        self.region.set_record_count(self.record_count);

        tracing::trace!(key = %String::from_utf8_lossy(key), slot = entry.slot, "Record tombstoned");
        Ok(true)
    }
}

impl Store for FileStore {
    fn is_exists(&self, key: &[u8]) -> bool {
        self.inner.lock().index.contains_key(key)
    }

    fn create(&self, key: &[u8], value: &[u8], ttl_seconds: u32) -> Result<()> {
        let mut guard = self.inner.lock();
        let inner = &mut *guard;
        let now = ttl::now_unix_secs();

        if let Some(entry) = inner.index.get(key).copied() {
            if !ttl::is_passed(entry.expires_at, now) {
                return Err(SlotKvError::KeyAlreadyExists);
            }
            inner.remove(key)?;
        }

        let needed = codec::slots_needed(key.len(), value.len())? as u32;
        let expires_at = ttl::expiry_from(now, ttl_seconds)?;
        inner.ensure_capacity(needed)?;

        let slot = inner.cursor;
        let used = codec::write_record(
            inner.region.bytes_mut(),
            SlotRegion::slot_offset(slot),
            key,
            value,
            expires_at,
        )?;

        inner.cursor += used as u32;
        inner.record_count += 1;
        inner.region.set_cursor(inner.cursor);
        inner.region.set_record_count(inner.record_count);

        let generation = inner.bump_generation();
        inner.index.insert(
            key.to_vec(),
            IndexEntry {
                slot,
                expires_at,
                generation,
            },
        );
        if expires_at != 0 {
            inner.heap.push(TtlEntry {
                expires_at,
                key: key.to_vec(),
                generation,
            });
        }

        tracing::trace!(
            key = %String::from_utf8_lossy(key),
            slot,
            slots = used,
            expires_at,
            "Record written"
        );
        Ok(())
    }

    fn get(&self, key: &[u8]) -> Result<Vec<u8>> {
        let mut guard = self.inner.lock();
        let inner = &mut *guard;

        let entry = inner
            .index
            .get(key)
            .copied()
            .ok_or(SlotKvError::KeyNotFound)?;

        if ttl::is_passed(entry.expires_at, ttl::now_unix_secs()) {
            inner.remove(key)?;
            return Err(SlotKvError::KeyExpired);
        }

        let record = codec::read_record(inner.region.bytes(), SlotRegion::slot_offset(entry.slot))?;
        Ok(record.value)
    }

    fn delete(&self, key: &[u8]) -> Result<()> {
        self.inner.lock().remove(key)?;
        Ok(())
    }

    /// Scan slots `0..cursor`, skipping available slots one at a time
    fn get_all(&self) -> Result<BTreeMap<Vec<u8>, Vec<u8>>> {
        let inner = self.inner.lock();
        let now = ttl::now_unix_secs();
        let bytes = inner.region.bytes();

        let mut all = BTreeMap::new();
        let mut slot = 0u32;

        while slot < inner.cursor {
            let offset = SlotRegion::slot_offset(slot);
            if !codec::is_primary(bytes, offset) {
                slot += 1;
                continue;
            }

            let record = codec::read_record(bytes, offset)?;
            slot += record.slot_count as u32;

            if !ttl::is_passed(record.ttl, now) {
                all.insert(record.key, record.value);
            }
        }

        Ok(all)
    }

    fn len(&self) -> usize {
        self.inner.lock().index.len()
    }

    fn flush(&self) -> Result<()> {
        self.inner.lock().region.flush()
    }
}

impl Sweep for FileStore {
    fn expire_next(&self, now: u32) -> Result<SweepOutcome> {
        let mut guard = self.inner.lock();
        let inner = &mut *guard;

        let Some(due) = inner.heap.pop_due(now) else {
            return Ok(SweepOutcome::Idle);
        };

        match inner.index.get(&due.key) {
            Some(entry) if entry.generation == due.generation => {
                inner.remove(&due.key)?;
                Ok(SweepOutcome::Removed(due.key))
            }
            _ => Ok(SweepOutcome::Stale),
        }
    }
}
