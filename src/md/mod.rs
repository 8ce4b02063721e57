//! Metrics Discovery API boundary
//!
//! The vendor library exposes a tree of C++ objects:
//! adapter group → adapter → metrics device → concurrent group → metric set →
//! metric. [`MetricsDriver`] flattens that tree into index-addressed calls that
//! return owned Rust records, so everything above this module can be tested
//! against a fake tree.

mod completion;
pub mod ffi;
pub mod library;

#[cfg(test)]
pub(crate) mod fake;

pub use completion::CompletionCode;
pub use library::{default_library_paths, MetricsLibrary};

use crate::types::{MetricSetId, Timestamps};

/// Result of a vendor call that reports a completion code on failure
pub type CallResult<T> = std::result::Result<T, CompletionCode>;

/// Metrics Discovery API version reported by the library
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ApiVersion {
    /// Major number
    pub major: u32,
    /// Minor number
    pub minor: u32,
    /// Build number
    pub build: u32,
}

/// Adapter group parameters
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdapterGroupParams {
    /// API version of the loaded library
    pub version: ApiVersion,
    /// Number of adapters in the group
    pub adapter_count: u32,
}

/// Adapter parameters
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdapterParams {
    /// Short adapter name
    pub short_name: Option<String>,
    /// PCI vendor ID
    pub vendor_id: u32,
    /// PCI device ID
    pub device_id: u32,
}

/// Metrics device parameters
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceParams {
    /// Device name
    pub device_name: Option<String>,
    /// Number of concurrent groups on the device
    pub concurrent_groups_count: u32,
}

/// Concurrent group parameters
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConcurrentGroupParams {
    /// Symbol name (e.g. "OA")
    pub symbol_name: Option<String>,
    /// Human-readable description
    pub description: Option<String>,
    /// Number of metric sets in the group
    pub metric_sets_count: u32,
}

/// Metric set parameters
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetricSetParams {
    /// Symbol name (e.g. "RenderBasic")
    pub symbol_name: Option<String>,
    /// Short name
    pub short_name: Option<String>,
    /// Number of metrics in the set
    pub metrics_count: u32,
}

/// Metric parameters
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetricParams {
    /// Symbol name (e.g. "RenderBusy")
    pub symbol_name: Option<String>,
    /// Short name
    pub short_name: Option<String>,
    /// Result units (e.g. "percent")
    pub units: Option<String>,
}

/// Access to the Metrics Discovery descriptor tree
///
/// Accessors return `None` where the vendor library returns a null object or
/// parameter block; callers skip those entries.
pub trait MetricsDriver {
    /// Open the adapter group through the library entry point
    fn open_adapter_group(&mut self) -> CallResult<()>;

    /// Parameters of the open adapter group
    fn adapter_group_params(&self) -> Option<AdapterGroupParams>;

    /// Parameters of one adapter
    fn adapter_params(&self, index: u32) -> Option<AdapterParams>;

    /// Open the metrics device on an adapter
    fn open_metrics_device(&mut self, adapter: u32) -> CallResult<()>;

    /// Parameters of the open metrics device
    fn device_params(&self) -> Option<DeviceParams>;

    /// Parameters of one concurrent group
    fn concurrent_group_params(&self, group: u32) -> Option<ConcurrentGroupParams>;

    /// Parameters of one metric set
    fn metric_set_params(&self, id: MetricSetId) -> Option<MetricSetParams>;

    /// Parameters of one metric within a set
    fn metric_params(&self, id: MetricSetId, metric: u32) -> Option<MetricParams>;

    /// Activate a metric set
    fn activate_metric_set(&mut self, id: MetricSetId) -> CompletionCode;

    /// Deactivate a metric set
    fn deactivate_metric_set(&mut self, id: MetricSetId) -> CompletionCode;

    /// Read correlated GPU and CPU timestamps
    fn gpu_cpu_timestamps(&mut self) -> CallResult<Timestamps>;

    /// Close the metrics device through the adapter that opened it
    fn close_metrics_device(&mut self) -> CompletionCode;

    /// Close the adapter group
    fn close_adapter_group(&mut self) -> CompletionCode;

    /// Release the library itself; no other call is valid afterwards
    fn unload(&mut self);
}
