//! Data types for Intel GPU utilization sampling

use std::fmt;

/// PCI vendor id of Intel
pub const INTEL_VENDOR_ID: u32 = 0x8086;

/// GPU engine channels reported in each sample
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EngineChannel {
    /// Render/3D engine
    Render,
    /// Blitter/Copy engine
    Blitter,
    /// Video decode engine
    Video,
    /// Video enhance engine
    Enhance,
}

impl EngineChannel {
    /// All channels in display order
    pub const ALL: [EngineChannel; 4] = [
        EngineChannel::Render,
        EngineChannel::Blitter,
        EngineChannel::Video,
        EngineChannel::Enhance,
    ];

    /// Get the display name for this channel
    pub fn name(&self) -> &'static str {
        match self {
            EngineChannel::Render => "Render",
            EngineChannel::Blitter => "Blitter",
            EngineChannel::Video => "Video",
            EngineChannel::Enhance => "Enhance",
        }
    }
}

/// Information about the adapter the session runs against
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdapterInfo {
    /// Index of the adapter inside the adapter group
    pub index: u32,
    /// Short adapter name if the driver reports one
    pub short_name: Option<String>,
    /// PCI vendor ID (0x8086 for Intel)
    pub vendor_id: u32,
    /// PCI device ID
    pub device_id: u32,
}

impl AdapterInfo {
    /// Returns true if this is an Intel adapter
    pub fn is_intel(&self) -> bool {
        self.vendor_id == INTEL_VENDOR_ID
    }

    /// Name to show to users
    pub fn display_name(&self) -> &str {
        self.short_name.as_deref().unwrap_or("Unknown")
    }
}

/// Address of a metric set inside the device tree
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MetricSetId {
    /// Concurrent group index
    pub group: u32,
    /// Metric set index within the group
    pub set: u32,
}

impl MetricSetId {
    /// Create a new MetricSetId
    pub fn new(group: u32, set: u32) -> Self {
        Self { group, set }
    }
}

/// GPU and CPU clocks captured at the start of a measurement
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Timestamps {
    /// GPU timestamp in nanoseconds
    pub gpu_ns: u64,
    /// CPU timestamp in nanoseconds
    pub cpu_ns: u64,
    /// CPU the timestamps were taken on
    pub cpu_id: u32,
}

/// One utilization sample across the four engine channels
///
/// Values are percentages. After [`GpuUtilization::normalize`] the `total`
/// never exceeds 100.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct GpuUtilization {
    /// Render/3D engine busy percentage
    pub render: f64,
    /// Blitter engine busy percentage
    pub blitter: f64,
    /// Video engine busy percentage
    pub video: f64,
    /// Video enhance engine busy percentage
    pub enhance: f64,
    /// Sum of the four channels
    pub total: f64,
    /// Clock correlation taken while sampling, if the driver provided it
    pub timestamps: Option<Timestamps>,
}

impl GpuUtilization {
    /// Build a normalized sample from raw channel values
    pub fn from_raw(render: f64, blitter: f64, video: f64, enhance: f64) -> Self {
        let mut util = Self {
            render,
            blitter,
            video,
            enhance,
            ..Self::default()
        };
        util.normalize();
        util
    }

    /// Get the value of one channel
    pub fn channel(&self, channel: EngineChannel) -> f64 {
        match channel {
            EngineChannel::Render => self.render,
            EngineChannel::Blitter => self.blitter,
            EngineChannel::Video => self.video,
            EngineChannel::Enhance => self.enhance,
        }
    }

    /// Set the value of one channel
    pub fn set_channel(&mut self, channel: EngineChannel, value: f64) {
        match channel {
            EngineChannel::Render => self.render = value,
            EngineChannel::Blitter => self.blitter = value,
            EngineChannel::Video => self.video = value,
            EngineChannel::Enhance => self.enhance = value,
        }
    }

    /// Recompute `total`, scaling every channel down by the same factor if the
    /// raw sum exceeds 100
    pub fn normalize(&mut self) {
        self.total = self.render + self.blitter + self.video + self.enhance;
        if self.total > 100.0 {
            let scale = 100.0 / self.total;
            self.render *= scale;
            self.blitter *= scale;
            self.video *= scale;
            self.enhance *= scale;
            self.total = 100.0;
        }
    }
}

impl fmt::Display for GpuUtilization {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Render: {:.1}%  Blitter: {:.1}%  Video: {:.1}%  Enhance: {:.1}%  | Total: {:.1}%",
            self.render, self.blitter, self.video, self.enhance, self.total
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_total_unscaled_below_hundred() {
        let util = GpuUtilization::from_raw(25.0, 5.0, 10.0, 0.0);
        assert!(close(util.total, 40.0));
        assert!(close(util.render, 25.0));
        assert!(close(util.blitter, 5.0));
        assert!(close(util.video, 10.0));
    }

    #[test]
    fn test_exactly_hundred_is_left_alone() {
        let util = GpuUtilization::from_raw(50.0, 25.0, 25.0, 0.0);
        assert!(close(util.total, 100.0));
        assert!(close(util.render, 50.0));
    }

    #[test]
    fn test_overflow_scales_proportionally() {
        let util = GpuUtilization::from_raw(70.0, 20.0, 20.0, 0.0);
        assert!(close(util.total, 100.0));
        let sum = util.render + util.blitter + util.video + util.enhance;
        assert!(close(sum, 100.0));
        assert!(close(util.render / util.blitter, 3.5));
        assert!(close(util.blitter, util.video));
        assert_eq!(
            util.to_string(),
            "Render: 63.6%  Blitter: 18.2%  Video: 18.2%  Enhance: 0.0%  | Total: 100.0%"
        );
    }

    #[test]
    fn test_large_values_including_enhance() {
        let util = GpuUtilization::from_raw(100.0, 100.0, 100.0, 100.0);
        for channel in EngineChannel::ALL {
            assert!(close(util.channel(channel), 25.0));
        }
        assert!(close(util.total, 100.0));
    }

    #[test]
    fn test_display_format() {
        let util = GpuUtilization::from_raw(23.5, 0.0, 12.3, 0.0);
        assert_eq!(
            util.to_string(),
            "Render: 23.5%  Blitter: 0.0%  Video: 12.3%  Enhance: 0.0%  | Total: 35.8%"
        );
    }

    #[test]
    fn test_set_channel() {
        let mut util = GpuUtilization::default();
        util.set_channel(EngineChannel::Video, 10.0);
        util.set_channel(EngineChannel::Enhance, 2.0);
        util.normalize();
        assert!(close(util.channel(EngineChannel::Video), 10.0));
        assert!(close(util.total, 12.0));
    }

    #[test]
    fn test_adapter_is_intel() {
        let adapter = AdapterInfo {
            index: 0,
            short_name: None,
            vendor_id: 0x8086,
            device_id: 0x5917,
        };
        assert!(adapter.is_intel());
        assert_eq!(adapter.display_name(), "Unknown");
    }
}
