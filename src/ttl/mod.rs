//! TTL Module
//!
//! Absolute expiry timestamps, the min-heap that orders them, and the
//! background task that sweeps due keys out of a store.
//!
//! ## Responsibilities
//! - Convert relative TTLs into 4-byte unix-second timestamps
//! - Order pending expirations by timestamp (`TtlHeap`)
//! - Run one periodic sweep per store instance (`ExpirationEngine`)
//!
//! Heap entries are never updated in place. Each carries the generation
//! of the record it was pushed for, so an entry outliving an overwrite or
//! delete is recognized as stale and skipped.

pub mod heap;
pub mod sweeper;

use std::time::{SystemTime, UNIX_EPOCH};

use crate::error::{Result, SlotKvError};

pub use heap::{TtlEntry, TtlHeap};
pub use sweeper::{ExpirationEngine, Sweep, SweepOutcome};

/// Current wall-clock time in unix seconds
pub fn now_unix_secs() -> u32 {
    let secs = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0);
    u32::try_from(secs).unwrap_or(u32::MAX)
}

/// Absolute expiry for a TTL relative to `now`; 0 means no expiry
pub fn expiry_from(now: u32, ttl_seconds: u32) -> Result<u32> {
    if ttl_seconds == 0 {
        return Ok(0);
    }
    now.checked_add(ttl_seconds)
        .ok_or(SlotKvError::TtlOverflow(ttl_seconds))
}

/// Whether an absolute expiry has passed at `now`
pub fn is_passed(expires_at: u32, now: u32) -> bool {
    expires_at != 0 && now > expires_at
}
