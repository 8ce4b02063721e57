//! Sample-and-print loop

use std::io::{self, Write};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use log::error;

#[cfg(test)]
use mockall::automock;

use crate::error::Result;
use crate::types::GpuUtilization;

/// Default pause between samples in continuous mode
pub const DEFAULT_SAMPLE_INTERVAL: Duration = Duration::from_secs(1);

/// Anything that can produce utilization samples
#[cfg_attr(test, automock)]
pub trait UtilizationSource {
    /// Take one sample
    fn sample(&mut self) -> Result<GpuUtilization>;
}

/// How many samples to take
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Mode {
    /// One sample, then exit
    Snapshot,
    /// Sample until interrupted
    #[default]
    Continuous,
}

/// Why the loop ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// Snapshot mode finished its single sample
    SnapshotTaken,
    /// The running flag was cleared
    Interrupted,
    /// A sample could not be taken
    SampleFailed,
}

/// Outcome of [`run`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunSummary {
    /// Number of samples printed
    pub samples: usize,
    /// Why the loop ended
    pub reason: StopReason,
}

/// Sample, print and pause until done
///
/// Every iteration samples once and writes one line to `out`. In snapshot
/// mode the loop ends after the first iteration. In continuous mode it then
/// calls `pause(interval)` and checks `running`; a flag cleared during the
/// pause is only seen once the pause returns.
pub fn run<S, W, P>(
    source: &mut S,
    mode: Mode,
    interval: Duration,
    running: &AtomicBool,
    out: &mut W,
    mut pause: P,
) -> io::Result<RunSummary>
where
    S: UtilizationSource + ?Sized,
    W: Write,
    P: FnMut(Duration),
{
    let mut samples = 0;

    let reason = loop {
        match source.sample() {
            Ok(util) => {
                writeln!(out, "{}", util)?;
                out.flush()?;
                samples += 1;
            }
            Err(e) => {
                error!("Error reading GPU utilization: {}", e);
                writeln!(out, "Error reading GPU utilization")?;
                break StopReason::SampleFailed;
            }
        }

        if mode == Mode::Snapshot {
            break StopReason::SnapshotTaken;
        }

        pause(interval);

        if !running.load(Ordering::SeqCst) {
            break StopReason::Interrupted;
        }
    };

    Ok(RunSummary { samples, reason })
}
