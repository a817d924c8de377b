//! Storage Module
//!
//! Durable backend: a memory-mapped file of fixed-size slots.
//!
//! ## Responsibilities
//! - Bootstrap a fresh file or load and validate an existing one
//! - Allocate slots through a monotonic cursor (tombstones are not reused)
//! - Keep the key → slot index and persisted record count in step
//! - Grow the file on demand and remap
//!
//! ## File Format
//! ```text
//! ┌────────────────────────────────────────────────────┐
//! │ Header (10 bytes)                                  │
//! │ ┌──────────┬──────────────┬──────────┬───────────┐ │
//! │ │Magic (1) │RecordCount(4)│Cursor (4)│Reserved(1)│ │
//! │ └──────────┴──────────────┴──────────┴───────────┘ │
//! ├────────────────────────────────────────────────────┤
//! │ Slot 0 (512 bytes)                                 │
//! │ Slot 1 (512 bytes)                                 │
//! │ ... (see record module for the slot layout)        │
//! └────────────────────────────────────────────────────┘
//! ```

pub mod bootstrap;
mod file_store;
mod region;

pub use bootstrap::ensure_file;
pub use file_store::FileStore;
pub use region::SlotRegion;

/// Sentinel byte marking a valid store file
pub const MAGIC: u8 = 99;

/// Size of the file header; slot 0 starts here
pub const HEADER_SIZE: usize = 10;

pub(crate) const MAGIC_OFFSET: usize = 0;
pub(crate) const RECORD_COUNT_OFFSET: usize = 1;
pub(crate) const CURSOR_OFFSET: usize = 5;
