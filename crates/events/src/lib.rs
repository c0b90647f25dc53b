//! # Dashboard Events
//!
//! This crate defines the notifications the data core publishes while it
//! loads, caches, and ranks data, plus the broadcast bus UI collaborators
//! subscribe to.
//!
//! As a Layer 0 crate, it depends only on `core-types` and provides the definitive
//! language for all state-change notifications.

// Declare the modules that make up this crate.
pub mod bus;
pub mod error;
pub mod messages;

// Re-export the core types to provide a clean public API.
pub use bus::{EventBus, run_event_logger};
pub use error::EventsError;
pub use messages::{DashboardEvent, LeaderboardSummary, RetryScheduled, SnapshotSummary};
