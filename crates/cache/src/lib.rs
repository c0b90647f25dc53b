//! Namespaced in-memory cache with TTL expiry, tags, and priority eviction.

pub mod clock;
pub mod entry;
pub mod error;
pub mod store;

// Re-export the core types to provide a clean public API.
pub use clock::{Clock, ManualClock, SystemClock};
pub use entry::{CacheEntry, EntryOptions, Invalidation, priority};
pub use error::CacheError;
pub use store::{CacheStats, CacheStore, NamespaceStats};
