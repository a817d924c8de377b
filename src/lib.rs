//! # SlotKV
//!
//! An embedded, single-process key-value store with:
//! - A slot-based binary file format accessed through a memory-mapped region
//! - Crash-tolerant bootstrap via a magic byte and persisted record count
//! - Optional per-key TTL with lazy and background expiration
//! - An in-memory backend sharing the same contract and TTL machinery
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                         Engine                              │
//! │          (size limits, existence checks, JSON)              │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │  Store + Sweep
//!          ┌────────────┴────────────┐
//!          │                         │
//!          ▼                         ▼
//!   ┌─────────────┐          ┌─────────────┐
//!   │  FileStore  │          │  MemStore   │
//!   │   (Mutex)   │          │   (Mutex)   │
//!   └──────┬──────┘          └─────────────┘
//!          │                         ▲
//!          ▼                         │
//!   ┌─────────────┐   ┌──────────────┴─────────────┐
//!   │Record Codec │   │ TtlHeap + ExpirationEngine │
//!   │ SlotRegion  │   │    (shared by both)        │
//!   │   (mmap)    │   └────────────────────────────┘
//!   └─────────────┘
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod config;

pub mod record;
pub mod storage;
pub mod ttl;
pub mod memstore;
pub mod store;
pub mod engine;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use error::{SlotKvError, Result};
pub use config::{Config, SweepFailurePolicy};
pub use engine::Engine;
pub use memstore::MemStore;
pub use storage::FileStore;
pub use store::Store;

// =============================================================================
// Version Info
// =============================================================================

/// Current version of SlotKV
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
