//! Memory Store Module
//!
//! Non-durable backend with the same contract as the file store.
//!
//! ## Responsibilities
//! - Keep key → value and key → TTL in process memory
//! - Share the TTL heap and expiration engine with the file store
//! - Isolate the expiration protocol from any file I/O (handy in tests)

mod store;

pub use store::MemStore;
