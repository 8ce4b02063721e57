//! Dynamic loading of the Metrics Discovery library
//!
//! [`MetricsLibrary`] owns the library handle and the raw handles of the
//! adapter group and metrics device opened through it. Every other object in
//! the tree belongs to the library and is looked up again on each call.

use std::path::{Path, PathBuf};
use std::ptr;

use libloading::{Library, Symbol};
use log::{debug, warn};

use super::ffi::{
    opt_string, IAdapter, IAdapterGroup, IConcurrentGroup, IMetric, IMetricSet, IMetricsDevice,
    OpenAdapterGroupFn, OPEN_ADAPTER_GROUP,
};
use super::{
    AdapterGroupParams, AdapterParams, ApiVersion, CallResult, CompletionCode,
    ConcurrentGroupParams, DeviceParams, MetricParams, MetricSetParams, MetricsDriver,
};
use crate::error::{Error, Result};
use crate::types::{MetricSetId, Timestamps};

/// Library locations tried when none is given explicitly, in order
#[cfg(not(windows))]
const LIBRARY_CANDIDATES: &[&str] = &[
    "./dump/linux64/release/metrics_discovery/libigdmd.so",
    "/usr/lib/x86_64-linux-gnu/libigdmd.so",
    "/usr/local/lib/libigdmd.so",
    "libigdmd.so",
];

#[cfg(windows)]
const LIBRARY_CANDIDATES: &[&str] = &["igdmd64.dll"];

/// Get the built-in library search list
pub fn default_library_paths() -> Vec<PathBuf> {
    LIBRARY_CANDIDATES.iter().map(PathBuf::from).collect()
}

/// Call a virtual method through an interface pointer
macro_rules! vcall {
    ($obj:expr, $method:ident $(, $arg:expr)*) => {
        ((*(*$obj).vtbl).$method)($obj $(, $arg)*)
    };
}

#[cfg(unix)]
fn open_library(path: &Path) -> std::result::Result<Library, libloading::Error> {
    // Lazy binding: the library pulls in driver symbols we never call.
    let library = unsafe { libloading::os::unix::Library::open(Some(path), libc::RTLD_LAZY) }?;
    Ok(Library::from(library))
}

#[cfg(not(unix))]
fn open_library(path: &Path) -> std::result::Result<Library, libloading::Error> {
    unsafe { Library::new(path) }
}

/// The loaded Metrics Discovery library
pub struct MetricsLibrary {
    library: Option<Library>,
    path: PathBuf,
    open_adapter_group_fn: OpenAdapterGroupFn,
    adapter_group: *mut IAdapterGroup,
    adapter: *mut IAdapter,
    device: *mut IMetricsDevice,
}

impl MetricsLibrary {
    /// Load the library from the first candidate path that opens
    ///
    /// Fails with [`Error::LibraryNotFound`] if no candidate loads, or with
    /// [`Error::EntryPointMissing`] if the library lacks `OpenAdapterGroup`.
    pub fn load<P: AsRef<Path>>(candidates: &[P]) -> Result<Self> {
        let mut tried = Vec::with_capacity(candidates.len());

        for candidate in candidates {
            let path = candidate.as_ref();
            match open_library(path) {
                Ok(library) => {
                    debug!("Loaded library from: {}", path.display());
                    return Self::with_library(library, path.to_path_buf());
                }
                Err(e) => {
                    debug!("Could not load {}: {}", path.display(), e);
                    tried.push(path.to_path_buf());
                }
            }
        }

        Err(Error::LibraryNotFound { tried })
    }

    fn with_library(library: Library, path: PathBuf) -> Result<Self> {
        let open_adapter_group_fn = unsafe {
            let symbol: Symbol<'_, OpenAdapterGroupFn> = library
                .get(OPEN_ADAPTER_GROUP)
                .map_err(|source| Error::EntryPointMissing {
                    symbol: "OpenAdapterGroup",
                    source,
                })?;
            *symbol
        };

        Ok(Self {
            library: Some(library),
            path,
            open_adapter_group_fn,
            adapter_group: ptr::null_mut(),
            adapter: ptr::null_mut(),
            device: ptr::null_mut(),
        })
    }

    /// Path the library was loaded from
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn adapter_ptr(&self, index: u32) -> *mut IAdapter {
        if self.adapter_group.is_null() {
            return ptr::null_mut();
        }
        unsafe { vcall!(self.adapter_group, get_adapter, index) }
    }

    fn concurrent_group_ptr(&self, group: u32) -> *mut IConcurrentGroup {
        if self.device.is_null() {
            return ptr::null_mut();
        }
        unsafe { vcall!(self.device, get_concurrent_group, group) }
    }

    fn metric_set_ptr(&self, id: MetricSetId) -> *mut IMetricSet {
        let group = self.concurrent_group_ptr(id.group);
        if group.is_null() {
            return ptr::null_mut();
        }
        unsafe { vcall!(group, get_metric_set, id.set) }
    }

    fn metric_ptr(&self, id: MetricSetId, metric: u32) -> *mut IMetric {
        let set = self.metric_set_ptr(id);
        if set.is_null() {
            return ptr::null_mut();
        }
        unsafe { vcall!(set, get_metric, metric) }
    }
}

impl MetricsDriver for MetricsLibrary {
    fn open_adapter_group(&mut self) -> CallResult<()> {
        if self.library.is_none() {
            return Err(CompletionCode::ErrorGeneral);
        }
        if !self.adapter_group.is_null() {
            return Ok(());
        }

        let mut group: *mut IAdapterGroup = ptr::null_mut();
        let code = CompletionCode::from_raw(unsafe { (self.open_adapter_group_fn)(&mut group) });
        code.into_result()?;
        if group.is_null() {
            return Err(CompletionCode::ErrorGeneral);
        }

        self.adapter_group = group;
        Ok(())
    }

    fn adapter_group_params(&self) -> Option<AdapterGroupParams> {
        if self.adapter_group.is_null() {
            return None;
        }
        unsafe {
            let params = vcall!(self.adapter_group, get_params).as_ref()?;
            Some(AdapterGroupParams {
                version: ApiVersion {
                    major: params.version.major_number,
                    minor: params.version.minor_number,
                    build: params.version.build_number,
                },
                adapter_count: params.adapter_count,
            })
        }
    }

    fn adapter_params(&self, index: u32) -> Option<AdapterParams> {
        let adapter = self.adapter_ptr(index);
        if adapter.is_null() {
            return None;
        }
        unsafe {
            let params = vcall!(adapter, get_params).as_ref()?;
            Some(AdapterParams {
                short_name: opt_string(params.short_name),
                vendor_id: params.vendor_id,
                device_id: params.device_id,
            })
        }
    }

    fn open_metrics_device(&mut self, adapter: u32) -> CallResult<()> {
        let adapter_ptr = self.adapter_ptr(adapter);
        if adapter_ptr.is_null() {
            return Err(CompletionCode::ErrorInvalidParameter);
        }

        let mut device: *mut IMetricsDevice = ptr::null_mut();
        let code = CompletionCode::from_raw(unsafe {
            vcall!(adapter_ptr, open_metrics_device, &mut device)
        });
        code.into_result()?;
        if device.is_null() {
            return Err(CompletionCode::ErrorGeneral);
        }

        self.adapter = adapter_ptr;
        self.device = device;
        Ok(())
    }

    fn device_params(&self) -> Option<DeviceParams> {
        if self.device.is_null() {
            return None;
        }
        unsafe {
            let params = vcall!(self.device, get_params).as_ref()?;
            Some(DeviceParams {
                device_name: opt_string(params.device_name),
                concurrent_groups_count: params.concurrent_groups_count,
            })
        }
    }

    fn concurrent_group_params(&self, group: u32) -> Option<ConcurrentGroupParams> {
        let group = self.concurrent_group_ptr(group);
        if group.is_null() {
            return None;
        }
        unsafe {
            let params = vcall!(group, get_params).as_ref()?;
            Some(ConcurrentGroupParams {
                symbol_name: opt_string(params.symbol_name),
                description: opt_string(params.description),
                metric_sets_count: params.metric_sets_count,
            })
        }
    }

    fn metric_set_params(&self, id: MetricSetId) -> Option<MetricSetParams> {
        let set = self.metric_set_ptr(id);
        if set.is_null() {
            return None;
        }
        unsafe {
            let params = vcall!(set, get_params).as_ref()?;
            Some(MetricSetParams {
                symbol_name: opt_string(params.symbol_name),
                short_name: opt_string(params.short_name),
                metrics_count: params.metrics_count,
            })
        }
    }

    fn metric_params(&self, id: MetricSetId, metric: u32) -> Option<MetricParams> {
        let metric = self.metric_ptr(id, metric);
        if metric.is_null() {
            return None;
        }
        unsafe {
            let params = vcall!(metric, get_params).as_ref()?;
            Some(MetricParams {
                symbol_name: opt_string(params.symbol_name),
                short_name: opt_string(params.short_name),
                units: opt_string(params.metric_result_units),
            })
        }
    }

    fn activate_metric_set(&mut self, id: MetricSetId) -> CompletionCode {
        let set = self.metric_set_ptr(id);
        if set.is_null() {
            return CompletionCode::ErrorInvalidParameter;
        }
        CompletionCode::from_raw(unsafe { vcall!(set, activate) })
    }

    fn deactivate_metric_set(&mut self, id: MetricSetId) -> CompletionCode {
        let set = self.metric_set_ptr(id);
        if set.is_null() {
            return CompletionCode::ErrorInvalidParameter;
        }
        CompletionCode::from_raw(unsafe { vcall!(set, deactivate) })
    }

    fn gpu_cpu_timestamps(&mut self) -> CallResult<Timestamps> {
        if self.device.is_null() {
            return Err(CompletionCode::ErrorGeneral);
        }

        let mut ts = Timestamps::default();
        let code = CompletionCode::from_raw(unsafe {
            vcall!(
                self.device,
                get_gpu_cpu_timestamps,
                &mut ts.gpu_ns,
                &mut ts.cpu_ns,
                &mut ts.cpu_id
            )
        });
        code.into_result().map(|()| ts)
    }

    fn close_metrics_device(&mut self) -> CompletionCode {
        if self.device.is_null() || self.adapter.is_null() {
            return CompletionCode::Ok;
        }
        let code =
            CompletionCode::from_raw(unsafe { vcall!(self.adapter, close_metrics_device, self.device) });
        self.device = ptr::null_mut();
        self.adapter = ptr::null_mut();
        code
    }

    fn close_adapter_group(&mut self) -> CompletionCode {
        if self.adapter_group.is_null() {
            return CompletionCode::Ok;
        }
        let code = CompletionCode::from_raw(unsafe { vcall!(self.adapter_group, close) });
        self.adapter_group = ptr::null_mut();
        code
    }

    fn unload(&mut self) {
        // Handles must not outlive the code that implements them.
        if !self.device.is_null() {
            let code = self.close_metrics_device();
            if !code.is_ok() {
                warn!("Failed to close metrics device: {}", code);
            }
        }
        if !self.adapter_group.is_null() {
            let code = self.close_adapter_group();
            if !code.is_ok() {
                warn!("Failed to close adapter group: {}", code);
            }
        }
        if let Some(library) = self.library.take() {
            if let Err(e) = library.close() {
                warn!("Failed to unload {}: {}", self.path.display(), e);
            }
        }
    }
}

impl Drop for MetricsLibrary {
    fn drop(&mut self) {
        self.unload();
    }
}
