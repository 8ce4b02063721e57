//! Intel GPU Usage Library
//!
//! Samples Intel GPU engine utilization (Render, Blitter, Video, Enhance)
//! through the Intel Metrics Discovery API (`libigdmd`).
//!
//! # Overview
//!
//! - [`MetricsLibrary`] loads the vendor library at runtime and implements
//!   [`MetricsDriver`], the thin boundary over the vendor descriptor tree
//! - [`Session`] opens the first Intel adapter, finds a metric set with engine
//!   utilization metrics and takes samples from it
//! - [`monitor::run`] prints samples once or on a fixed cadence
//!
//! Samples currently carry fixed per-engine values for every busy counter the
//! selected metric set exposes; the discovery and activation path is real.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use intel_gpu_usage::{default_library_paths, MetricsLibrary, Session};
//!
//! let library = MetricsLibrary::load(&default_library_paths())?;
//! let mut session = Session::open(library)?;
//! session.find_utilization_metric_set()?;
//!
//! let util = session.sample()?;
//! println!("{}", util);
//! # Ok::<(), intel_gpu_usage::Error>(())
//! ```
//!
//! # Permissions
//!
//! Opening the metrics device may require root privileges or access to the
//! DRM render node, depending on the driver's `perf_stream_paranoid` setting.

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

pub mod classify;
pub mod config;
pub mod error;
pub mod md;
pub mod monitor;
pub mod session;
pub mod types;

// Re-export main types at crate root
pub use config::MonitorConfig;
pub use error::{Error, Result};
pub use md::{default_library_paths, CompletionCode, MetricsDriver, MetricsLibrary};
pub use monitor::{Mode, UtilizationSource};
pub use session::Session;
pub use types::*;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }
}
