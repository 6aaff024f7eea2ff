//! Refresh loop, render slot and cycle statistics.

pub mod orchestrator;
pub mod render;
pub mod stats;

// Re-export commonly used types
pub use orchestrator::{FetchFailure, RefreshOrchestrator, RefreshSettings};
pub use render::{RenderHandle, RenderView};
pub use stats::{RefreshStats, RefreshStatsSnapshot, SharedRefreshStats};
