//! Record Module
//!
//! One logical key/value entry laid out over fixed-size slots.
//!
//! ## Slot Layout
//! ```text
//! Primary slot (512 bytes)
//! ┌────────┬─────────┬─────────┬─────────┬───────────┬──────────────────────┐
//! │Type (1)│Slots (1)│ TTL (4) │KeyLen(1)│ ValLen (2)│ Key │ Value ...      │
//! └────────┴─────────┴─────────┴─────────┴───────────┴──────────────────────┘
//!
//! Continuation slot (512 bytes)
//! ┌────────┬───────────────────────────────┬────────────────────────────────┐
//! │Type (1)│ Reserved (8, zero)            │ Value continued ...            │
//! └────────┴───────────────────────────────┴────────────────────────────────┘
//! ```
//!
//! Every slot reserves the same 9-byte metadata width, so the payload
//! capacity is 503 bytes per slot and continuation slots never repeat
//! the key. Multi-byte integers are big-endian.

pub mod codec;

pub use codec::{delete_record, is_primary, read_record, slots_needed, write_record};

// =============================================================================
// Layout Constants
// =============================================================================

/// Physical size of one slot
pub const SLOT_SIZE: usize = 512;

/// Metadata bytes reserved at the start of every slot
pub const SLOT_METADATA_LEN: usize = 9;

/// Payload bytes available in each slot
pub const USABLE_BYTES_PER_SLOT: usize = SLOT_SIZE - SLOT_METADATA_LEN;

/// Largest key the 1-byte length field can describe
pub const MAX_KEY_LEN: usize = u8::MAX as usize;

/// Largest value the 2-byte length field can describe
pub const MAX_VALUE_LEN: usize = u16::MAX as usize;

/// Largest span the 1-byte slot count can describe
pub const MAX_SLOTS_PER_RECORD: usize = u8::MAX as usize;

// Field offsets inside a primary slot
pub(crate) const TYPE_OFFSET: usize = 0;
pub(crate) const SLOT_COUNT_OFFSET: usize = 1;
pub(crate) const TTL_OFFSET: usize = 2;
pub(crate) const KEY_LEN_OFFSET: usize = 6;
pub(crate) const VALUE_LEN_OFFSET: usize = 7;
pub(crate) const PAYLOAD_OFFSET: usize = SLOT_METADATA_LEN;

// =============================================================================
// Slot Type
// =============================================================================

/// Type flag stored in the first byte of every slot
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum SlotType {
    /// Never written, or tombstoned by a delete
    Available = 0,

    /// First slot of a record, carries the header
    Primary = 1,

    /// Subsequent slot of a multi-slot record
    Continuation = 2,
}

impl SlotType {
    /// Parse a type flag byte
    pub fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            0 => Some(SlotType::Available),
            1 => Some(SlotType::Primary),
            2 => Some(SlotType::Continuation),
            _ => None,
        }
    }
}

// =============================================================================
// Record
// =============================================================================

/// A decoded record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    pub slot_type: SlotType,
    /// Number of slots the record spans
    pub slot_count: u8,
    /// Absolute expiry (unix seconds), 0 = none
    pub ttl: u32,
    pub key_len: u8,
    pub value_len: u16,
    pub key: Vec<u8>,
    pub value: Vec<u8>,
}
