//! Slot Region
//!
//! The mapped backing file: header access, slot addressing and growth.

use std::fs::File;

use memmap2::MmapMut;

use crate::error::{Result, SlotKvError};
use crate::record::SLOT_SIZE;

use super::{CURSOR_OFFSET, HEADER_SIZE, MAGIC, MAGIC_OFFSET, RECORD_COUNT_OFFSET};

/// A writable mapping over the store file
///
/// ## Concurrency:
/// - Not synchronized; the owning store keeps it behind its mutex
/// - `grow()` replaces the mapping, so no slice into the old mapping may
///   outlive the call (enforced by `&mut self`)
pub struct SlotRegion {
    /// Backing file, kept open for extension
    file: File,

    /// Current mapping of the whole file
    mmap: MmapMut,

    /// Number of whole slots after the header
    total_slots: u32,
}

impl SlotRegion {
    /// Bootstrap an empty file with `initial_slots` of capacity
    ///
    /// Writes the magic byte, a zero record count and a zero cursor.
    pub fn create(file: File, initial_slots: u32) -> Result<Self> {
        file.set_len(Self::file_len_for(initial_slots))?;
        let mmap = Self::map(&file)?;

        let mut region = Self {
            file,
            mmap,
            total_slots: initial_slots,
        };

        region.mmap[MAGIC_OFFSET] = MAGIC;
        region.set_record_count(0);
        region.set_cursor(0);
        region.mmap.flush_range(0, HEADER_SIZE)?;

        Ok(region)
    }

    /// Map an existing store file, validating its magic byte
    pub fn load(file: File) -> Result<Self> {
        let file_len = file.metadata()?.len();
        if file_len < HEADER_SIZE as u64 {
            return Err(SlotKvError::CorruptStore(format!(
                "file is {} bytes, shorter than the {}-byte header",
                file_len, HEADER_SIZE
            )));
        }

        let mmap = Self::map(&file)?;

        if mmap[MAGIC_OFFSET] != MAGIC {
            return Err(SlotKvError::CorruptStore(format!(
                "invalid magic byte: expected {}, got {}",
                MAGIC, mmap[MAGIC_OFFSET]
            )));
        }

        let slots = (file_len - HEADER_SIZE as u64) / SLOT_SIZE as u64;
        let total_slots = u32::try_from(slots).map_err(|_| {
            SlotKvError::CorruptStore(format!("file holds {} slots, more than addressable", slots))
        })?;

        Ok(Self {
            file,
            mmap,
            total_slots,
        })
    }

    // =========================================================================
    // Addressing
    // =========================================================================

    /// Byte offset of a slot inside the region
    pub fn slot_offset(slot: u32) -> usize {
        HEADER_SIZE + slot as usize * SLOT_SIZE
    }

    /// Total slot capacity of the current mapping
    pub fn total_slots(&self) -> u32 {
        self.total_slots
    }

    /// The whole mapped file, header included
    pub fn bytes(&self) -> &[u8] {
        &self.mmap
    }

    /// Mutable view of the whole mapped file
    pub fn bytes_mut(&mut self) -> &mut [u8] {
        &mut self.mmap
    }

    // =========================================================================
    // Header
    // =========================================================================

    /// Persisted number of live records
    pub fn record_count(&self) -> u32 {
        self.read_u32(RECORD_COUNT_OFFSET)
    }

    pub fn set_record_count(&mut self, count: u32) {
        self.write_u32(RECORD_COUNT_OFFSET, count);
    }

    /// Persisted slot high-water mark
    pub fn cursor(&self) -> u32 {
        self.read_u32(CURSOR_OFFSET)
    }

    pub fn set_cursor(&mut self, cursor: u32) {
        self.write_u32(CURSOR_OFFSET, cursor);
    }

    fn read_u32(&self, at: usize) -> u32 {
        let mut buf = [0u8; 4];
        buf.copy_from_slice(&self.mmap[at..at + 4]);
        u32::from_be_bytes(buf)
    }

    fn write_u32(&mut self, at: usize, value: u32) {
        self.mmap[at..at + 4].copy_from_slice(&value.to_be_bytes());
    }

    // =========================================================================
    // Growth
    // =========================================================================

    /// Extend the file by `additional_slots` and remap it
    ///
    /// On failure the previous mapping and capacity stay in effect.
    pub fn grow(&mut self, additional_slots: u32) -> Result<()> {
        let new_total = self.total_slots.checked_add(additional_slots).ok_or_else(|| {
            SlotKvError::Io(std::io::Error::new(
                std::io::ErrorKind::OutOfMemory,
                "slot capacity exceeds u32 range",
            ))
        })?;

        self.file.set_len(Self::file_len_for(new_total))?;
        let mmap = Self::map(&self.file)?;

        self.mmap = mmap;
        self.total_slots = new_total;

        tracing::debug!(
            additional_slots,
            total_slots = new_total,
            "Extended and remapped store file"
        );
        Ok(())
    }

    /// Sync dirty pages of the mapping to disk
    pub fn flush(&self) -> Result<()> {
        self.mmap.flush()?;
        Ok(())
    }

    // =========================================================================
    // Private Helpers
    // =========================================================================

    fn file_len_for(slots: u32) -> u64 {
        HEADER_SIZE as u64 + slots as u64 * SLOT_SIZE as u64
    }

    fn map(file: &File) -> Result<MmapMut> {
        // SAFETY: the file is owned by this region and a single process is
        // assumed to access it, so the mapping is not truncated underneath us.
        let mmap = unsafe { MmapMut::map_mut(file)? };
        Ok(mmap)
    }
}
