//! # cubestat-core
//!
//! Live horizon charts for machine metrics: CPU, GPU, neural accelerator,
//! memory, swap, disk, network and power.
//!
//! ## Architecture
//!
//! Source → Ingestion loop → Dashboard (store + viewport) → Frame layout
//!
//! A platform source produces one [`Snapshot`] per sampling interval, either
//! polled ([`PollSource`], Linux) or decoded from a framed subprocess stream
//! ([`RecordDecoder`], macOS powermetrics). The ingestion loop publishes each
//! snapshot into the shared [`Dashboard`], which owns a bounded
//! [`SeriesStore`], the [`Viewport`] and one [`Presenter`] per metric group.
//! The terminal front end asks the dashboard for a [`FrameLayout`] and paints
//! it.
//!
//! ```no_run
//! use cubestat_core::{Config, Dashboard, Platform, ingest, sources};
//!
//! let config = Config::default();
//! let platform = Platform::detect().unwrap();
//! let mut stream = platform.start(&config).unwrap();
//! let mut dashboard =
//!     Dashboard::new(&config, platform.groups(), sources::cpu_count()).shared();
//! ingest::run(stream.as_mut(), &mut dashboard).unwrap();
//! ```

pub mod config;
pub mod dashboard;
pub mod error;
pub mod export;
pub mod framing;
pub mod ingest;
pub mod layout;
pub mod mode;
pub mod presenters;
pub mod scale;
pub mod source;
pub mod sources;
pub mod store;

pub use config::{Config, GroupModes};
pub use dashboard::{Dashboard, SharedDashboard, Viewport};
pub use error::{CubestatError, Result};
pub use export::{CsvSink, ExportFormat, JsonlSink};
pub use framing::{PLIST_SENTINEL, StreamFramer};
pub use ingest::{FailureTracker, PollIngest, SnapshotSink, SnapshotStream, StreamIngest};
pub use layout::{ChartRow, FrameLayout};
pub use mode::{
    ColorTheme, CpuMode, DisplayMode, GpuMode, PowerMode, RamMode, SimpleMode, ViewMode,
};
pub use presenters::{Presenter, Visibility};
pub use scale::GLYPHS;
pub use source::{PollSource, Reading, RecordDecoder, Snapshot};
pub use sources::Platform;
pub use store::{Group, Series, SeriesStore};

/// Library version (from Cargo.toml).
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
