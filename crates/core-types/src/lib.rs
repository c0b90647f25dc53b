pub mod enums;
pub mod error;
pub mod outcome;
pub mod structs;

// Re-export the core types to provide a clean public API.
pub use enums::{DataOrigin, ErrorKind, RequestState, SourceKind};
pub use error::CoreError;
pub use outcome::{FetchFailure, FetchOutcome};
pub use structs::{
    DashboardSnapshot, DisplayInfo, Holding, HoldingView, PortfolioView, RankInfo, RankView,
    RankedEntry, RawLeaderboardEntry, SourceSlot, ValidatedEntry,
};
