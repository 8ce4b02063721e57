//! In-memory descriptor tree for tests

use std::cell::RefCell;
use std::rc::Rc;

use super::{
    AdapterGroupParams, AdapterParams, ApiVersion, CallResult, CompletionCode,
    ConcurrentGroupParams, DeviceParams, MetricParams, MetricSetParams, MetricsDriver,
};
use crate::types::{MetricSetId, Timestamps, INTEL_VENDOR_ID};

pub(crate) type CallLog = Rc<RefCell<Vec<String>>>;

pub(crate) struct FakeSet {
    pub name: &'static str,
    /// `None` models a metric whose parameter block has no symbol name
    pub metrics: Vec<Option<&'static str>>,
}

pub(crate) struct FakeGroup {
    pub name: &'static str,
    pub sets: Vec<FakeSet>,
}

pub(crate) struct FakeDriver {
    pub adapters: Vec<AdapterParams>,
    pub groups: Vec<FakeGroup>,
    pub open_group_code: CompletionCode,
    pub open_device_code: CompletionCode,
    pub activate_code: CompletionCode,
    pub deactivate_code: CompletionCode,
    pub timestamps_code: CompletionCode,
    /// Adapters, groups and sets whose parameter block comes back null
    pub null_adapters: Vec<u32>,
    pub null_groups: Vec<u32>,
    pub null_sets: Vec<MetricSetId>,
    pub calls: CallLog,
    group_open: bool,
    device_open: bool,
}

pub(crate) fn set(name: &'static str, metrics: &[&'static str]) -> FakeSet {
    FakeSet {
        name,
        metrics: metrics.iter().copied().map(Some).collect(),
    }
}

pub(crate) fn group(name: &'static str, sets: Vec<FakeSet>) -> FakeGroup {
    FakeGroup { name, sets }
}

pub(crate) fn adapter(vendor_id: u32, device_id: u32, name: &str) -> AdapterParams {
    AdapterParams {
        short_name: Some(name.to_string()),
        vendor_id,
        device_id,
    }
}

impl FakeDriver {
    pub fn new(adapters: Vec<AdapterParams>, groups: Vec<FakeGroup>) -> Self {
        Self {
            adapters,
            groups,
            open_group_code: CompletionCode::Ok,
            open_device_code: CompletionCode::Ok,
            activate_code: CompletionCode::Ok,
            deactivate_code: CompletionCode::Ok,
            timestamps_code: CompletionCode::Ok,
            null_adapters: Vec::new(),
            null_groups: Vec::new(),
            null_sets: Vec::new(),
            calls: Rc::new(RefCell::new(Vec::new())),
            group_open: false,
            device_open: false,
        }
    }

    /// One Intel adapter carrying the given groups
    pub fn intel(groups: Vec<FakeGroup>) -> Self {
        Self::new(vec![adapter(INTEL_VENDOR_ID, 0x5917, "UHD620")], groups)
    }

    /// A typical device: a compute set without engine metrics, then a
    /// render set with busy counters
    pub fn typical() -> Self {
        Self::intel(vec![group(
            "OA",
            vec![
                set("ComputeBasic", &["GpuTime", "EuActive"]),
                set(
                    "RenderBasic",
                    &["GpuTime", "RenderBusy", "BlitterBusy", "VideoBusy"],
                ),
            ],
        )])
    }

    pub fn log(&self) -> CallLog {
        Rc::clone(&self.calls)
    }

    fn record(&self, call: impl Into<String>) {
        self.calls.borrow_mut().push(call.into());
    }

    fn find_set(&self, id: MetricSetId) -> Option<&FakeSet> {
        if !self.device_open || self.null_sets.contains(&id) {
            return None;
        }
        self.groups
            .get(id.group as usize)?
            .sets
            .get(id.set as usize)
    }
}

impl MetricsDriver for FakeDriver {
    fn open_adapter_group(&mut self) -> CallResult<()> {
        self.record("open_adapter_group");
        self.open_group_code.into_result()?;
        self.group_open = true;
        Ok(())
    }

    fn adapter_group_params(&self) -> Option<AdapterGroupParams> {
        self.group_open.then(|| AdapterGroupParams {
            version: ApiVersion {
                major: 1,
                minor: 13,
                build: 0,
            },
            adapter_count: self.adapters.len() as u32,
        })
    }

    fn adapter_params(&self, index: u32) -> Option<AdapterParams> {
        if !self.group_open || self.null_adapters.contains(&index) {
            return None;
        }
        self.adapters.get(index as usize).cloned()
    }

    fn open_metrics_device(&mut self, adapter: u32) -> CallResult<()> {
        self.record(format!("open_metrics_device({})", adapter));
        self.open_device_code.into_result()?;
        self.device_open = true;
        Ok(())
    }

    fn device_params(&self) -> Option<DeviceParams> {
        self.device_open.then(|| DeviceParams {
            device_name: Some("Fake".to_string()),
            concurrent_groups_count: self.groups.len() as u32,
        })
    }

    fn concurrent_group_params(&self, group: u32) -> Option<ConcurrentGroupParams> {
        if !self.device_open || self.null_groups.contains(&group) {
            return None;
        }
        let group = self.groups.get(group as usize)?;
        Some(ConcurrentGroupParams {
            symbol_name: Some(group.name.to_string()),
            description: None,
            metric_sets_count: group.sets.len() as u32,
        })
    }

    fn metric_set_params(&self, id: MetricSetId) -> Option<MetricSetParams> {
        let set = self.find_set(id)?;
        Some(MetricSetParams {
            symbol_name: Some(set.name.to_string()),
            short_name: None,
            metrics_count: set.metrics.len() as u32,
        })
    }

    fn metric_params(&self, id: MetricSetId, metric: u32) -> Option<MetricParams> {
        let name = self.find_set(id)?.metrics.get(metric as usize)?;
        Some(MetricParams {
            symbol_name: name.map(str::to_string),
            short_name: None,
            units: Some("percent".to_string()),
        })
    }

    fn activate_metric_set(&mut self, id: MetricSetId) -> CompletionCode {
        self.record(format!("activate({},{})", id.group, id.set));
        self.activate_code
    }

    fn deactivate_metric_set(&mut self, id: MetricSetId) -> CompletionCode {
        self.record(format!("deactivate({},{})", id.group, id.set));
        self.deactivate_code
    }

    fn gpu_cpu_timestamps(&mut self) -> CallResult<Timestamps> {
        self.record("gpu_cpu_timestamps");
        self.timestamps_code.into_result().map(|()| Timestamps {
            gpu_ns: 1_000,
            cpu_ns: 2_000,
            cpu_id: 0,
        })
    }

    fn close_metrics_device(&mut self) -> CompletionCode {
        self.record("close_metrics_device");
        self.device_open = false;
        CompletionCode::Ok
    }

    fn close_adapter_group(&mut self) -> CompletionCode {
        self.record("close_adapter_group");
        self.group_open = false;
        CompletionCode::Ok
    }

    fn unload(&mut self) {
        self.record("unload");
    }
}
