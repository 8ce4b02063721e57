//! Metric name classification
//!
//! The Metrics Discovery API does not tag metrics by engine, so utilization
//! counters are recognized from their symbol names. A name qualifies when it
//! mentions an engine (`Render`, `Blitter`, `Video`) and an activity
//! (`Busy`, `Util`), in any letter case.

use crate::types::EngineChannel;

/// Engine keywords, checked in this order
const ENGINE_KEYWORDS: [(&str, EngineChannel); 3] = [
    ("render", EngineChannel::Render),
    ("blitter", EngineChannel::Blitter),
    ("video", EngineChannel::Video),
];

/// What a recognized metric measures
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Activity {
    /// Time the engine was busy
    Busy,
    /// Engine utilization
    Util,
}

/// Classification of a utilization metric
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MetricClass {
    /// The engine channel the metric belongs to
    pub channel: EngineChannel,
    /// What the metric measures
    pub activity: Activity,
}

/// Classify a metric symbol name
///
/// Returns `None` if the name does not look like an engine utilization
/// counter.
pub fn classify_metric(name: &str) -> Option<MetricClass> {
    let lower = name.to_ascii_lowercase();

    let activity = if lower.contains("busy") {
        Activity::Busy
    } else if lower.contains("util") {
        Activity::Util
    } else {
        return None;
    };

    ENGINE_KEYWORDS
        .iter()
        .find(|(keyword, _)| lower.contains(keyword))
        .map(|&(_, channel)| MetricClass { channel, activity })
}

/// The channel a metric contributes to while sampling
///
/// Only busy counters feed a channel.
pub fn sample_channel(name: &str) -> Option<EngineChannel> {
    match classify_metric(name) {
        Some(MetricClass {
            channel,
            activity: Activity::Busy,
        }) => Some(channel),
        _ => None,
    }
}

/// Value reported for a channel until real counter reads are wired up
///
/// TODO: replace with calculated metric values once the IO stream read path
/// (OpenIoStream / ReadIoStream / CalculateMetrics) is bound.
pub fn placeholder_value(channel: EngineChannel) -> f64 {
    match channel {
        EngineChannel::Render => 25.0,
        EngineChannel::Blitter => 5.0,
        EngineChannel::Video => 10.0,
        EngineChannel::Enhance => 0.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_case_insensitive_engine_and_activity() {
        for engine in ["Render", "render", "RENDER"] {
            for activity in ["Busy", "busy", "BUSY"] {
                let name = format!("{}{}", engine, activity);
                assert_eq!(
                    classify_metric(&name),
                    Some(MetricClass {
                        channel: EngineChannel::Render,
                        activity: Activity::Busy,
                    }),
                    "{}",
                    name
                );
            }
        }
    }

    #[test]
    fn test_util_keyword() {
        for name in ["BlitterUtil", "blitter_utilization", "BLITTER_UTIL"] {
            assert_eq!(
                classify_metric(name),
                Some(MetricClass {
                    channel: EngineChannel::Blitter,
                    activity: Activity::Util,
                })
            );
        }
    }

    #[test]
    fn test_video_engine() {
        let class = classify_metric("VideoBusy").unwrap();
        assert_eq!(class.channel, EngineChannel::Video);
    }

    #[test]
    fn test_unrelated_names() {
        assert_eq!(classify_metric("GpuTime"), None);
        assert_eq!(classify_metric("RenderBasicCount"), None);
        assert_eq!(classify_metric("EuActive"), None);
        assert_eq!(classify_metric("GpuBusy"), None);
        assert_eq!(classify_metric(""), None);
    }

    #[test]
    fn test_render_wins_over_video() {
        let class = classify_metric("RenderVideoBusy").unwrap();
        assert_eq!(class.channel, EngineChannel::Render);
    }

    #[test]
    fn test_sample_channel_only_busy() {
        assert_eq!(sample_channel("RenderBusy"), Some(EngineChannel::Render));
        assert_eq!(sample_channel("blitter_busy"), Some(EngineChannel::Blitter));
        assert_eq!(sample_channel("VIDEOBUSY"), Some(EngineChannel::Video));
        assert_eq!(sample_channel("RenderUtil"), None);
        assert_eq!(sample_channel("GpuTime"), None);
    }

    #[test]
    fn test_placeholder_values() {
        assert_eq!(placeholder_value(EngineChannel::Render), 25.0);
        assert_eq!(placeholder_value(EngineChannel::Blitter), 5.0);
        assert_eq!(placeholder_value(EngineChannel::Video), 10.0);
        assert_eq!(placeholder_value(EngineChannel::Enhance), 0.0);
    }
}
