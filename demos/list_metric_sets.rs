//! Example: List the Metrics Discovery descriptor tree
//!
//! This example opens the first Intel adapter and prints every concurrent
//! group, metric set and metric it exposes, marking the engine utilization
//! metrics the monitor recognizes.
//!
//! Run with: cargo run --example list_metric_sets [-- /path/to/libigdmd.so]

use intel_gpu_usage::classify::classify_metric;
use intel_gpu_usage::{MetricsLibrary, MonitorConfig, Result, Session};

fn main() -> Result<()> {
    println!("Intel Metrics Discovery Tree");
    println!("============================");
    println!();

    let config = MonitorConfig {
        library_override: std::env::args().nth(1).map(Into::into),
        ..MonitorConfig::default()
    };

    let library = match MetricsLibrary::load(&config.library_candidates()) {
        Ok(library) => library,
        Err(e) => {
            eprintln!("Error: {}", e);
            eprintln!();
            eprintln!("Make sure libigdmd is installed, or pass its path:");
            eprintln!("  cargo run --example list_metric_sets -- /path/to/libigdmd.so");
            return Err(e);
        }
    };
    println!("Library: {}", library.path().display());

    let session = match Session::open(library) {
        Ok(session) => session,
        Err(e) => {
            eprintln!("Error: {}", e);
            if e.is_permission_error() {
                eprintln!();
                eprintln!("To fix permission issues, try one of:");
                eprintln!("  1. Run as root");
                eprintln!("  2. Set /proc/sys/dev/i915/perf_stream_paranoid to 0");
            }
            return Err(e);
        }
    };

    for adapter in session.adapters() {
        println!(
            "Adapter #{}: {} (Vendor ID: 0x{:04x}, Device ID: 0x{:04x}){}",
            adapter.index,
            adapter.display_name(),
            adapter.vendor_id,
            adapter.device_id,
            if session.adapter() == Some(&adapter) {
                " [opened]"
            } else {
                ""
            }
        );
    }
    if let Some(name) = session.device_name() {
        println!("Metrics device: {}", name);
    }
    println!();

    for group in session.catalog()? {
        println!(
            "Concurrent group {}: {}",
            group.index,
            group.params.symbol_name.as_deref().unwrap_or("Unknown")
        );
        if let Some(ref description) = group.params.description {
            println!("  {}", description);
        }

        for set in &group.metric_sets {
            println!(
                "  Metric set {}: {} ({} metrics){}",
                set.id.set,
                set.params.symbol_name.as_deref().unwrap_or("Unknown"),
                set.metrics.len(),
                if set.has_utilization_metrics() {
                    " *"
                } else {
                    ""
                }
            );

            for metric in &set.metrics {
                let Some(name) = metric.symbol_name.as_deref() else {
                    continue;
                };
                let mut line = format!("    {}", name);
                if let Some(ref short_name) = metric.short_name {
                    line.push_str(&format!(" \"{}\"", short_name));
                }
                if let Some(ref units) = metric.units {
                    line.push_str(&format!(" ({})", units));
                }
                if let Some(class) = classify_metric(name) {
                    line.push_str(&format!(" [{}, {:?}]", class.channel.name(), class.activity));
                }
                println!("{}", line);
            }
        }
        println!();
    }

    println!("* metric set carries engine utilization metrics");
    Ok(())
}
