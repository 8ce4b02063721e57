//! GPU Usage Monitor
//!
//! Prints Intel GPU engine utilization once (`--snapshot`) or every second
//! until interrupted.

use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;

use anyhow::{Context, Result};
use clap::error::ErrorKind;
use clap::Parser;
use log::info;

use intel_gpu_usage::config::LIBRARY_ENV_VAR;
use intel_gpu_usage::{
    monitor, AdapterInfo, Error, MetricsLibrary, Mode, MonitorConfig, Session,
};

const AFTER_HELP: &str = "\
Output format:
  Render: 23.5%  Blitter: 0.0%  Video: 12.3%  Enhance: 0.0%  | Total: 35.8%

Note: This program requires Intel GPU and appropriate permissions.
      Run with root privileges if you encounter access denied errors.";

/// GPU Usage Monitor - Intel Metrics Discovery
#[derive(Debug, Parser)]
#[command(name = "gpu_usage", after_help = AFTER_HELP)]
struct Cli {
    /// Take a single snapshot instead of updating every second
    #[arg(short, long)]
    snapshot: bool,

    /// Metrics Discovery library to try before the built-in locations
    #[arg(long, value_name = "PATH", env = LIBRARY_ENV_VAR)]
    library: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,
}

fn init_logging(verbose: bool) -> Result<()> {
    let level = if verbose {
        simplelog::LevelFilter::Debug
    } else {
        simplelog::LevelFilter::Info
    };

    let mut lcfg = simplelog::ConfigBuilder::new();
    lcfg.set_time_level(simplelog::LevelFilter::Off)
        .set_location_level(simplelog::LevelFilter::Off)
        .set_target_level(simplelog::LevelFilter::Off)
        .set_thread_level(simplelog::LevelFilter::Off);
    simplelog::TermLogger::init(
        level,
        lcfg.build(),
        simplelog::TerminalMode::Stderr,
        simplelog::ColorChoice::Auto,
    )
    .context("Failed to initialize logger")
}

fn write_startup<W: Write>(
    out: &mut W,
    library: &Path,
    adapters: &[AdapterInfo],
    selected: Option<&AdapterInfo>,
    metric_set: Option<&str>,
) -> io::Result<()> {
    writeln!(out, "Loaded library from: {}", library.display())?;
    writeln!(out, "Found {} adapter(s)", adapters.len())?;
    if let Some(adapter) = selected {
        writeln!(
            out,
            "Found Intel GPU: {} (Device ID: 0x{:X})",
            adapter.display_name(),
            adapter.device_id
        )?;
    }
    if let Some(name) = metric_set {
        writeln!(out, "Selected metric set: {}", name)?;
    }
    Ok(())
}

fn run(cli: Cli) -> Result<()> {
    let config = MonitorConfig {
        mode: if cli.snapshot {
            Mode::Snapshot
        } else {
            Mode::Continuous
        },
        library_override: cli.library,
        ..MonitorConfig::default()
    };
    config.validate()?;

    let running = Arc::new(AtomicBool::new(true));
    let running_clone = running.clone();
    ctrlc::set_handler(move || {
        running_clone.store(false, Ordering::SeqCst);
    })
    .context("Error setting Ctrl-C handler")?;

    println!("Intel GPU Usage Monitor");
    println!("======================");

    info!("Initializing Intel Metrics Discovery API...");
    let library = MetricsLibrary::load(&config.library_candidates())
        .context("Failed to initialize Metrics Discovery API")?;
    let library_path = library.path().to_path_buf();
    let mut session = Session::open(library)
        .context("Failed to initialize Metrics Discovery API")?
        .with_measurement_window(config.measurement_window);

    session
        .find_utilization_metric_set()
        .context("Failed to find GPU utilization metrics")?;
    write_startup(
        &mut io::stdout().lock(),
        &library_path,
        &session.adapters(),
        session.adapter(),
        session.metric_set_name(),
    )?;

    println!();
    println!("Monitoring GPU usage...");
    match config.mode {
        Mode::Snapshot => println!("Mode: Single snapshot"),
        Mode::Continuous => println!("Mode: Continuous (press Ctrl+C to stop)"),
    }
    println!();

    let summary = monitor::run(
        &mut session,
        config.mode,
        config.sample_interval,
        &running,
        &mut io::stdout().lock(),
        thread::sleep,
    )?;
    info!("Stopped after {} sample(s): {:?}", summary.samples, summary.reason);

    session.cleanup();
    println!("GPU monitoring completed");
    Ok(())
}

fn print_hints(err: &anyhow::Error) {
    let Some(err) = err.downcast_ref::<Error>() else {
        return;
    };
    if err.is_load_error() {
        eprintln!("Make sure the library is built and accessible");
    } else if err.is_discovery_error() {
        eprintln!("This may be normal on some platforms or drivers");
    } else if err.is_permission_error() {
        eprintln!("Run with root privileges if you encounter access denied errors");
    }
}

fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            let _ = e.print();
            return match e.kind() {
                ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => ExitCode::SUCCESS,
                _ => ExitCode::FAILURE,
            };
        }
    };

    if let Err(e) = init_logging(cli.verbose) {
        eprintln!("Error: {:#}", e);
        return ExitCode::FAILURE;
    }

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            print_hints(&e);
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_continuous() {
        let cli = Cli::try_parse_from(["gpu_usage"]).unwrap();
        assert!(!cli.snapshot);
        assert!(!cli.verbose);
    }

    #[test]
    fn test_snapshot_flags() {
        assert!(Cli::try_parse_from(["gpu_usage", "-s"]).unwrap().snapshot);
        assert!(Cli::try_parse_from(["gpu_usage", "--snapshot"]).unwrap().snapshot);
    }

    #[test]
    fn test_help_is_not_a_failure() {
        let err = Cli::try_parse_from(["gpu_usage", "--help"]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::DisplayHelp);
        let err = Cli::try_parse_from(["gpu_usage", "-h"]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::DisplayHelp);
    }

    #[test]
    fn test_unknown_argument_is_rejected() {
        let err = Cli::try_parse_from(["gpu_usage", "--bogus"]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnknownArgument);
        let err = Cli::try_parse_from(["gpu_usage", "extra"]).unwrap_err();
        assert_ne!(err.kind(), ErrorKind::DisplayHelp);
    }

    #[test]
    fn test_library_override() {
        let cli = Cli::try_parse_from(["gpu_usage", "--library", "/opt/libigdmd.so"]).unwrap();
        assert_eq!(cli.library, Some(PathBuf::from("/opt/libigdmd.so")));
    }

    #[test]
    fn test_startup_lines() {
        let adapters = vec![
            AdapterInfo {
                index: 0,
                short_name: Some("GTX1050".to_string()),
                vendor_id: 0x10de,
                device_id: 0x1c82,
            },
            AdapterInfo {
                index: 1,
                short_name: None,
                vendor_id: 0x8086,
                device_id: 0x3e92,
            },
        ];
        let mut out = Vec::new();
        write_startup(
            &mut out,
            Path::new("/usr/local/lib/libigdmd.so"),
            &adapters,
            adapters.get(1),
            Some("RenderBasic"),
        )
        .unwrap();

        assert_eq!(
            String::from_utf8(out).unwrap(),
            "Loaded library from: /usr/local/lib/libigdmd.so\n\
             Found 2 adapter(s)\n\
             Found Intel GPU: Unknown (Device ID: 0x3E92)\n\
             Selected metric set: RenderBasic\n"
        );
    }

    #[test]
    fn test_cli_definition() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
