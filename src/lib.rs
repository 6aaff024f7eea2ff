//! Rideau Dashboard - ice and weather conditions for monitored canal sites.
//!
//! This library turns periodic sensor-aggregation documents into what a
//! dashboard shows: a safety status card per location, one worst-case overall
//! status, and history charts aligned on a common time axis.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                        Rideau Dashboard                         │
//! ├─────────────────────────────────────────────────────────────────┤
//! │  ┌─────────────┐   latest    ┌─────────────┐                    │
//! │  │  Upstream   │────────────▶│   Status    │──┐                 │
//! │  │ (HTTP/file) │             │  Resolver   │  │  ┌───────────┐  │
//! │  └─────────────┘   history   ├─────────────┤  ├─▶│  Render   │  │
//! │         │       ────────────▶│   Series    │──┘  │  Handle   │  │
//! │         │                    │   Aligner   │     └───────────┘  │
//! │         ▼                    └─────────────┘           │        │
//! │  ┌─────────────┐                                       ▼        │
//! │  │  Refresh    │  fixed interval, single-flight   HTTP server  │
//! │  │Orchestrator │                                                │
//! │  └─────────────┘                                                │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```no_run
//! use rideau_dashboard::{FileUpstream, RefreshOrchestrator, RefreshSettings};
//!
//! # tokio::runtime::Runtime::new().unwrap().block_on(async {
//! let settings = RefreshSettings::default();
//! let upstream = FileUpstream::new("samples.jsonl", settings.transform.locations.clone());
//! let orchestrator = RefreshOrchestrator::new(upstream, settings);
//!
//! if let Ok(payload) = orchestrator.run_cycle().await {
//!     println!("{}", payload.summary());
//! }
//! # });
//! ```

pub mod config;
pub mod core;
pub mod refresh;
pub mod store;
pub mod upstream;

#[cfg(feature = "server")]
pub mod server;

// Re-export key types at crate root for convenience
pub use config::{Config, ConfigError, UpstreamConfig};
pub use core::{
    align, classify, resolve_overall, AggregationSample, AlignedSeriesSet, HistoryWindow,
    LatestSnapshot, Location, Metric, OverallStatus, RenderPayload, Severity, TransformSettings,
};
pub use refresh::{
    FetchFailure, RefreshOrchestrator, RefreshSettings, RenderHandle, RenderView, RefreshStats,
    SharedRefreshStats,
};
pub use store::SampleStore;
pub use upstream::{FileUpstream, Upstream, UpstreamError, UpstreamQuery};

#[cfg(feature = "http")]
pub use upstream::{HttpUpstream, HttpUpstreamConfig};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
