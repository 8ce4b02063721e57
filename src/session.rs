//! Metrics session: device lookup, metric set discovery and sampling
//!
//! A [`Session`] owns the driver and tracks which vendor resources have been
//! acquired. Resources are released in reverse acquisition order by
//! [`Session::cleanup`], which also runs on drop.

use std::thread;
use std::time::Duration;

use log::{debug, info, warn};

use crate::classify::{classify_metric, placeholder_value, sample_channel};
use crate::error::{Error, Result};
use crate::md::{ConcurrentGroupParams, MetricParams, MetricSetParams, MetricsDriver};
use crate::monitor::UtilizationSource;
use crate::types::{AdapterInfo, GpuUtilization, MetricSetId};

/// Default time a metric set stays active for one sample
pub const DEFAULT_MEASUREMENT_WINDOW: Duration = Duration::from_millis(100);

/// One metric set and its metrics
#[derive(Debug, Clone)]
pub struct MetricSetEntry {
    /// Where the set lives in the tree
    pub id: MetricSetId,
    /// Set parameters
    pub params: MetricSetParams,
    /// Metrics with a parameter block, in index order
    pub metrics: Vec<MetricParams>,
}

impl MetricSetEntry {
    /// Returns true if any metric looks like an engine utilization counter
    pub fn has_utilization_metrics(&self) -> bool {
        self.metrics.iter().any(|m| {
            m.symbol_name
                .as_deref()
                .and_then(classify_metric)
                .is_some()
        })
    }
}

/// One concurrent group and its metric sets
#[derive(Debug, Clone)]
pub struct ConcurrentGroupEntry {
    /// Group index on the device
    pub index: u32,
    /// Group parameters
    pub params: ConcurrentGroupParams,
    /// Metric sets with a parameter block, in index order
    pub metric_sets: Vec<MetricSetEntry>,
}

/// Sampling context over a Metrics Discovery driver
pub struct Session<D: MetricsDriver> {
    driver: D,
    measurement_window: Duration,
    group_open: bool,
    adapter: Option<AdapterInfo>,
    device_open: bool,
    metric_set: Option<MetricSetId>,
    metric_set_name: Option<String>,
    active: bool,
    released: bool,
}

impl<D: MetricsDriver> Session<D> {
    /// Open the adapter group, pick the first Intel adapter and open its
    /// metrics device
    ///
    /// On failure everything acquired so far is released before returning.
    pub fn open(driver: D) -> Result<Self> {
        let mut session = Self {
            driver,
            measurement_window: DEFAULT_MEASUREMENT_WINDOW,
            group_open: false,
            adapter: None,
            device_open: false,
            metric_set: None,
            metric_set_name: None,
            active: false,
            released: false,
        };
        session.open_device()?;
        Ok(session)
    }

    /// Set how long the metric set stays active for each sample
    pub fn with_measurement_window(mut self, window: Duration) -> Self {
        self.measurement_window = window;
        self
    }

    fn open_device(&mut self) -> Result<()> {
        self.driver
            .open_adapter_group()
            .map_err(|code| Error::vendor("open adapter group", code))?;
        self.group_open = true;

        let group = self
            .driver
            .adapter_group_params()
            .ok_or(Error::MissingParams {
                what: "adapter group",
            })?;
        debug!(
            "Found {} adapter(s) (API {}.{}.{})",
            group.adapter_count, group.version.major, group.version.minor, group.version.build
        );

        let adapter = self
            .adapters()
            .into_iter()
            .find(|a| a.is_intel())
            .ok_or(Error::NoIntelAdapter)?;
        debug!(
            "Found Intel GPU: {} (Device ID: 0x{:X})",
            adapter.display_name(),
            adapter.device_id
        );

        self.driver
            .open_metrics_device(adapter.index)
            .map_err(|code| Error::vendor("open metrics device", code))?;
        self.device_open = true;
        self.adapter = Some(adapter);
        info!("Metrics device opened successfully");

        Ok(())
    }

    /// List every adapter in the group, skipping entries without parameters
    pub fn adapters(&self) -> Vec<AdapterInfo> {
        let count = self
            .driver
            .adapter_group_params()
            .map(|p| p.adapter_count)
            .unwrap_or(0);

        (0..count)
            .filter_map(|index| {
                let params = self.driver.adapter_params(index)?;
                Some(AdapterInfo {
                    index,
                    short_name: params.short_name,
                    vendor_id: params.vendor_id,
                    device_id: params.device_id,
                })
            })
            .collect()
    }

    /// The adapter the metrics device was opened on
    pub fn adapter(&self) -> Option<&AdapterInfo> {
        self.adapter.as_ref()
    }

    /// The selected metric set, if any
    pub fn metric_set(&self) -> Option<MetricSetId> {
        self.metric_set
    }

    /// Symbol name of the selected metric set
    pub fn metric_set_name(&self) -> Option<&str> {
        self.metric_set_name.as_deref()
    }

    /// Name the metrics device reports for itself
    pub fn device_name(&self) -> Option<String> {
        self.driver.device_params()?.device_name
    }

    fn concurrent_groups_count(&self) -> Result<u32> {
        self.driver
            .device_params()
            .map(|p| p.concurrent_groups_count)
            .ok_or(Error::MissingParams {
                what: "metrics device",
            })
    }

    fn metrics_of(&self, id: MetricSetId, count: u32) -> Vec<MetricParams> {
        (0..count)
            .filter_map(|m| self.driver.metric_params(id, m))
            .collect()
    }

    /// Walk the whole descriptor tree
    pub fn catalog(&self) -> Result<Vec<ConcurrentGroupEntry>> {
        let groups = self.concurrent_groups_count()?;
        let mut catalog = Vec::new();

        for group in 0..groups {
            let Some(params) = self.driver.concurrent_group_params(group) else {
                continue;
            };

            let metric_sets = (0..params.metric_sets_count)
                .filter_map(|set| {
                    let id = MetricSetId::new(group, set);
                    let params = self.driver.metric_set_params(id)?;
                    let metrics = self.metrics_of(id, params.metrics_count);
                    Some(MetricSetEntry {
                        id,
                        params,
                        metrics,
                    })
                })
                .collect();

            catalog.push(ConcurrentGroupEntry {
                index: group,
                params,
                metric_sets,
            });
        }

        Ok(catalog)
    }

    /// Select the first metric set that carries engine utilization metrics
    ///
    /// Groups and sets are visited in index order and the walk stops at the
    /// first qualifying set.
    pub fn find_utilization_metric_set(&mut self) -> Result<MetricSetId> {
        let groups = self.concurrent_groups_count()?;
        info!("Device has {} concurrent group(s)", groups);

        for group in 0..groups {
            let Some(group_params) = self.driver.concurrent_group_params(group) else {
                continue;
            };
            info!(
                "Concurrent group {}: {} ({} metric sets)",
                group,
                group_params.symbol_name.as_deref().unwrap_or("Unknown"),
                group_params.metric_sets_count
            );

            for set in 0..group_params.metric_sets_count {
                let id = MetricSetId::new(group, set);
                let Some(set_params) = self.driver.metric_set_params(id) else {
                    continue;
                };
                let set_name = set_params.symbol_name.as_deref().unwrap_or("Unknown");
                info!(
                    "  Metric set {}: {} ({} metrics)",
                    set,
                    set_name,
                    set_params.metrics_count
                );

                let mut found = false;
                for metric in self.metrics_of(id, set_params.metrics_count) {
                    let Some(name) = metric.symbol_name.as_deref() else {
                        continue;
                    };
                    if let Some(class) = classify_metric(name) {
                        info!(
                            "    Found {} metric: {}",
                            class.channel.name().to_lowercase(),
                            name
                        );
                        found = true;
                    }
                }

                if found {
                    debug!("Selected metric set: {}", set_name);
                    self.metric_set = Some(id);
                    self.metric_set_name = set_params.symbol_name.clone();
                    return Ok(id);
                }
            }
        }

        warn!("No GPU utilization metric set found");
        warn!("Available metric sets may not include engine utilization on this platform");
        Err(Error::NoUtilizationMetricSet)
    }

    /// Take one sample from the selected metric set
    ///
    /// The set is activated, left running for the measurement window, read and
    /// deactivated. Timestamp and deactivation failures are only logged.
    pub fn sample(&mut self) -> Result<GpuUtilization> {
        let id = self.metric_set.ok_or(Error::NoMetricSetSelected)?;

        let code = self.driver.activate_metric_set(id);
        if !code.is_ok_or_already_initialized() {
            return Err(Error::vendor("activate metric set", code));
        }
        self.active = true;

        let timestamps = match self.driver.gpu_cpu_timestamps() {
            Ok(ts) => {
                debug!("GPU timestamp {} ns, CPU timestamp {} ns", ts.gpu_ns, ts.cpu_ns);
                Some(ts)
            }
            Err(code) => {
                warn!("GetGpuCpuTimestamps failed: {}", code);
                None
            }
        };

        thread::sleep(self.measurement_window);

        let reading = self.read_values(id);
        self.deactivate(id);

        let mut util = reading?;
        util.timestamps = timestamps;
        util.normalize();
        Ok(util)
    }

    fn read_values(&self, id: MetricSetId) -> Result<GpuUtilization> {
        let params = self
            .driver
            .metric_set_params(id)
            .ok_or(Error::MissingParams { what: "metric set" })?;

        let mut util = GpuUtilization::default();
        for metric in self.metrics_of(id, params.metrics_count) {
            if let Some(channel) = metric.symbol_name.as_deref().and_then(sample_channel) {
                util.set_channel(channel, placeholder_value(channel));
            }
        }
        Ok(util)
    }

    fn deactivate(&mut self, id: MetricSetId) {
        let code = self.driver.deactivate_metric_set(id);
        if code.is_ok() {
            self.active = false;
        } else {
            warn!("Failed to deactivate metric set: {}", code);
        }
    }

    /// Release everything in reverse acquisition order
    ///
    /// Deactivates an active metric set, closes the metrics device, closes the
    /// adapter group and unloads the library. Steps for resources that were
    /// never acquired are skipped. Calling this more than once is a no-op.
    pub fn cleanup(&mut self) {
        if self.released {
            return;
        }
        self.released = true;
        info!("Cleaning up resources...");

        if self.active {
            if let Some(id) = self.metric_set {
                let code = self.driver.deactivate_metric_set(id);
                if !code.is_ok() {
                    warn!("Failed to deactivate metric set: {}", code);
                }
            }
            self.active = false;
        }

        if self.device_open {
            let code = self.driver.close_metrics_device();
            if !code.is_ok() {
                warn!("Failed to close metrics device: {}", code);
            }
            self.device_open = false;
        }

        if self.group_open {
            let code = self.driver.close_adapter_group();
            if !code.is_ok() {
                warn!("Failed to close adapter group: {}", code);
            }
            self.group_open = false;
        }

        self.driver.unload();
    }
}

impl<D: MetricsDriver> UtilizationSource for Session<D> {
    fn sample(&mut self) -> Result<GpuUtilization> {
        Session::sample(self)
    }
}

impl<D: MetricsDriver> Drop for Session<D> {
    fn drop(&mut self) {
        self.cleanup();
    }
}
