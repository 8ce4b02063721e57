//! Raw Metrics Discovery ABI
//!
//! The vendor interfaces are C++ classes with single inheritance, so each
//! object starts with a vtable pointer and newer interface versions only append
//! slots. Only the leading slots of the 1.x interfaces are described here;
//! anything we never call is kept as an opaque pointer to hold its position.
//!
//! Parameter blocks are likewise declared up to the last field we read.
//!
//! Member functions are declared `extern "C"` with `this` as the first
//! argument, which matches both the Itanium and the MSVC x86_64 conventions.

use std::ffi::{c_char, c_int, c_void, CStr};

/// `TCompletionCode`
pub type TCompletionCode = c_int;

/// Entry point exported by the library
pub type OpenAdapterGroupFn =
    unsafe extern "system" fn(adapter_group: *mut *mut IAdapterGroup) -> TCompletionCode;

/// Name of the entry point
pub const OPEN_ADAPTER_GROUP: &[u8] = b"OpenAdapterGroup\0";

type Opaque = *const c_void;

/// Leading vtable slots taken by a virtual destructor
///
/// Itanium emits a complete and a deleting destructor; MSVC emits a single
/// scalar deleting destructor.
#[repr(C)]
#[allow(dead_code)]
pub struct DestructorSlots {
    complete: Opaque,
    #[cfg(not(windows))]
    deleting: Opaque,
}

#[cfg(test)]
impl DestructorSlots {
    pub(super) fn null() -> Self {
        Self {
            complete: std::ptr::null(),
            #[cfg(not(windows))]
            deleting: std::ptr::null(),
        }
    }
}

/// `TApiVersion_1_0`
#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct TApiVersion {
    /// Major number
    pub major_number: u32,
    /// Minor number
    pub minor_number: u32,
    /// Build number
    pub build_number: u32,
}

/// `TAdapterGroupParams_1_6`
#[repr(C)]
pub struct TAdapterGroupParams {
    /// API version
    pub version: TApiVersion,
    /// Number of adapters
    pub adapter_count: u32,
}

/// `TAdapterId_1_6`: an id type followed by a LUID / major-minor union
#[repr(C)]
pub struct TAdapterId {
    /// `TAdapterIdType`
    pub id_type: c_int,
    /// Union payload
    pub data: [u32; 2],
}

/// Leading fields of `TAdapterParams_1_6`
#[repr(C)]
pub struct TAdapterParams {
    /// Short name
    pub short_name: *const c_char,
    /// System id
    pub system_id: TAdapterId,
    /// PCI vendor id
    pub vendor_id: u32,
    /// PCI sub vendor id
    pub sub_vendor_id: u32,
    /// PCI device id
    pub device_id: u32,
}

/// Leading fields of `TMetricsDeviceParams_1_0`
#[repr(C)]
pub struct TMetricsDeviceParams {
    /// API version
    pub version: TApiVersion,
    /// Number of concurrent groups
    pub concurrent_groups_count: u32,
    /// Number of global symbols
    pub global_symbols_count: u32,
    /// Number of delta functions
    pub delta_functions_count: u32,
    /// Number of equation element types
    pub equation_element_types_count: u32,
    /// Number of equation operations
    pub equation_operations_count: u32,
    /// Device name
    pub device_name: *const c_char,
}

/// Leading fields of `TConcurrentGroupParams_1_0`
#[repr(C)]
pub struct TConcurrentGroupParams {
    /// Symbol name
    pub symbol_name: *const c_char,
    /// Description
    pub description: *const c_char,
    /// Measurement type mask
    pub measurement_type_mask: u32,
    /// Number of metric sets
    pub metric_sets_count: u32,
}

/// Leading fields of `TMetricSetParams_1_0`
#[repr(C)]
pub struct TMetricSetParams {
    /// Symbol name
    pub symbol_name: *const c_char,
    /// Short name
    pub short_name: *const c_char,
    /// API mask
    pub api_mask: u32,
    /// Category mask
    pub category_mask: u32,
    /// Raw report size
    pub raw_report_size: u32,
    /// Query report size
    pub query_report_size: u32,
    /// Number of metrics
    pub metrics_count: u32,
}

/// Leading fields of `TMetricParams_1_0`
#[repr(C)]
pub struct TMetricParams {
    /// Index of the metric in its set
    pub id_in_set: u32,
    /// Group id
    pub group_id: u32,
    /// Symbol name
    pub symbol_name: *const c_char,
    /// Short name
    pub short_name: *const c_char,
    /// Group name
    pub group_name: *const c_char,
    /// Long name
    pub long_name: *const c_char,
    /// DX to OGL alias
    pub dx_to_ogl_alias: *const c_char,
    /// Usage flags
    pub usage_flags_mask: u32,
    /// API mask
    pub api_mask: u32,
    /// `TMetricResultType`
    pub result_type: c_int,
    /// Result units
    pub metric_result_units: *const c_char,
}

/// `IAdapterGroup_1_6`
#[repr(C)]
pub struct IAdapterGroup {
    /// Vtable
    pub vtbl: *const AdapterGroupVtbl,
}

/// Vtable of `IAdapterGroup_1_6`
#[repr(C)]
#[allow(dead_code)]
pub struct AdapterGroupVtbl {
    pub(super) dtor: DestructorSlots,
    /// `GetParams`
    pub get_params: unsafe extern "C" fn(this: *mut IAdapterGroup) -> *const TAdapterGroupParams,
    /// `GetAdapter`
    pub get_adapter: unsafe extern "C" fn(this: *mut IAdapterGroup, index: u32) -> *mut IAdapter,
    /// `Close`
    pub close: unsafe extern "C" fn(this: *mut IAdapterGroup) -> TCompletionCode,
}

/// `IAdapter_1_6`
#[repr(C)]
pub struct IAdapter {
    /// Vtable
    pub vtbl: *const AdapterVtbl,
}

/// Vtable of `IAdapter_1_6`
#[repr(C)]
#[allow(dead_code)]
pub struct AdapterVtbl {
    pub(super) dtor: DestructorSlots,
    /// `GetParams`
    pub get_params: unsafe extern "C" fn(this: *mut IAdapter) -> *const TAdapterParams,
    pub(super) reset: Opaque,
    /// `OpenMetricsDevice`
    pub open_metrics_device: unsafe extern "C" fn(
        this: *mut IAdapter,
        device: *mut *mut IMetricsDevice,
    ) -> TCompletionCode,
    pub(super) open_metrics_device_from_file: Opaque,
    /// `CloseMetricsDevice`
    pub close_metrics_device:
        unsafe extern "C" fn(this: *mut IAdapter, device: *mut IMetricsDevice) -> TCompletionCode,
}

/// `IMetricsDevice_1_0`
#[repr(C)]
pub struct IMetricsDevice {
    /// Vtable
    pub vtbl: *const MetricsDeviceVtbl,
}

/// Vtable of `IMetricsDevice_1_0`
#[repr(C)]
#[allow(dead_code)]
pub struct MetricsDeviceVtbl {
    pub(super) dtor: DestructorSlots,
    /// `GetParams`
    pub get_params: unsafe extern "C" fn(this: *mut IMetricsDevice) -> *const TMetricsDeviceParams,
    /// `GetConcurrentGroup`
    pub get_concurrent_group:
        unsafe extern "C" fn(this: *mut IMetricsDevice, index: u32) -> *mut IConcurrentGroup,
    pub(super) get_global_symbol: Opaque,
    pub(super) get_global_symbol_value_by_name: Opaque,
    pub(super) get_last_error: Opaque,
    /// `GetGpuCpuTimestamps`
    pub get_gpu_cpu_timestamps: unsafe extern "C" fn(
        this: *mut IMetricsDevice,
        gpu_timestamp_ns: *mut u64,
        cpu_timestamp_ns: *mut u64,
        cpu_id: *mut u32,
    ) -> TCompletionCode,
}

/// `IConcurrentGroup_1_0`
#[repr(C)]
pub struct IConcurrentGroup {
    /// Vtable
    pub vtbl: *const ConcurrentGroupVtbl,
}

/// Vtable of `IConcurrentGroup_1_0`
#[repr(C)]
#[allow(dead_code)]
pub struct ConcurrentGroupVtbl {
    pub(super) dtor: DestructorSlots,
    /// `GetParams`
    pub get_params:
        unsafe extern "C" fn(this: *mut IConcurrentGroup) -> *const TConcurrentGroupParams,
    /// `GetMetricSet`
    pub get_metric_set:
        unsafe extern "C" fn(this: *mut IConcurrentGroup, index: u32) -> *mut IMetricSet,
}

/// `IMetricSet_1_0`
#[repr(C)]
pub struct IMetricSet {
    /// Vtable
    pub vtbl: *const MetricSetVtbl,
}

/// Vtable of `IMetricSet_1_0`
#[repr(C)]
#[allow(dead_code)]
pub struct MetricSetVtbl {
    pub(super) dtor: DestructorSlots,
    /// `GetParams`
    pub get_params: unsafe extern "C" fn(this: *mut IMetricSet) -> *const TMetricSetParams,
    /// `GetMetric`
    pub get_metric: unsafe extern "C" fn(this: *mut IMetricSet, index: u32) -> *mut IMetric,
    pub(super) get_information: Opaque,
    pub(super) get_complementary_metric_set: Opaque,
    /// `Activate`
    pub activate: unsafe extern "C" fn(this: *mut IMetricSet) -> TCompletionCode,
    /// `Deactivate`
    pub deactivate: unsafe extern "C" fn(this: *mut IMetricSet) -> TCompletionCode,
}

/// `IMetric_1_0`
#[repr(C)]
pub struct IMetric {
    /// Vtable
    pub vtbl: *const MetricVtbl,
}

/// Vtable of `IMetric_1_0`
#[repr(C)]
#[allow(dead_code)]
pub struct MetricVtbl {
    pub(super) dtor: DestructorSlots,
    /// `GetParams`
    pub get_params: unsafe extern "C" fn(this: *mut IMetric) -> *const TMetricParams,
}

/// Copy a possibly null C string owned by the library
///
/// # Safety
///
/// `ptr` must be null or point to a NUL-terminated string that stays valid
/// for the duration of the call.
pub unsafe fn opt_string(ptr: *const c_char) -> Option<String> {
    if ptr.is_null() {
        None
    } else {
        Some(CStr::from_ptr(ptr).to_string_lossy().into_owned())
    }
}
