//! OS Entropy CLI
//!
//! Command-line interface for drawing raw bytes from the system entropy
//! devices and observing how the gatherer behaves under starvation.

use clap::Parser;
use os_entropy::{
    device::FileConfig,
    gather::{EntropyReader, GatherStats},
    metrics::MetricsRegistry,
};
use std::io::{self, Write};
use std::path::PathBuf;
use std::process;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Exit status for configuration and usage problems.
const EXIT_CONFIG: i32 = 1;
/// Exit status when the entropy device is unusable.
const EXIT_FATAL: i32 = 2;
/// Exit status for a second Ctrl-C, following the shell's 128 + SIGINT.
const EXIT_INTERRUPTED: i32 = 130;

/// Read random bytes from the operating system's entropy devices.
#[derive(Debug, Parser)]
#[command(name = "os-entropy", version, about)]
struct Args {
    /// TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Quality level; 2 and above read from the blocking device.
    #[arg(short, long, default_value_t = 1, allow_hyphen_values = true)]
    level: i32,

    /// Bytes per gather.
    #[arg(short, long, default_value_t = 32)]
    bytes: usize,

    /// Number of gathers to perform.
    #[arg(short = 'n', long, default_value_t = 1)]
    count: u64,

    /// Keep gathering until Ctrl-C. The first Ctrl-C stops between gathers;
    /// a second one exits at once, even while a starved device is waited on.
    #[arg(long, conflicts_with = "count")]
    continuous: bool,

    /// Write raw bytes instead of hex lines.
    #[arg(long)]
    raw: bool,

    /// Serve Prometheus metrics on this port (0 disables).
    #[arg(long)]
    metrics_port: Option<u16>,
}

fn main() {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => match FileConfig::from_file(path) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("Failed to load config {}: {}", path.display(), e);
                process::exit(EXIT_CONFIG);
            }
        },
        None => FileConfig::default(),
    };
    if let Some(port) = args.metrics_port {
        config.output.metrics_port = port;
    }

    debug!("OS Entropy v{}", os_entropy::VERSION);

    let reader = match EntropyReader::install(EntropyReader::new(config.device.clone())) {
        Ok(reader) => reader,
        Err(_) => EntropyReader::global(),
    };

    let stop = Arc::new(StopSignal::default());
    if args.continuous {
        let stop = Arc::clone(&stop);
        let handler = move || {
            if stop.press() {
                process::exit(EXIT_INTERRUPTED);
            }
            info!("Stopping after the current gather, press Ctrl-C again to abort");
        };
        if let Err(e) = ctrlc::set_handler(handler) {
            warn!("Failed to install Ctrl-C handler: {}", e);
        }
    }

    serve_metrics(config.output.metrics_port, reader);

    let mut buffer = vec![0u8; args.bytes];
    let mut stdout = io::stdout().lock();
    let mut gathered = 0u64;

    while args.continuous || gathered < args.count {
        if stop.requested() {
            info!("Interrupted, stopping");
            break;
        }

        let report = match reader.gather(&mut buffer, args.level) {
            Ok(report) => report,
            Err(e) => {
                error!(error = %e, "Fatal entropy device error");
                eprintln!("fatal: {}", e);
                process::exit(EXIT_FATAL);
            }
        };
        gathered += 1;

        debug!(
            bytes = report.bytes,
            reads = report.reads,
            timeouts = report.timeouts,
            quality = report.quality(),
            "Gather complete"
        );

        if let Err(e) = write_output(&mut stdout, &buffer, args.raw) {
            if e.kind() == io::ErrorKind::BrokenPipe {
                break;
            }
            eprintln!("Failed to write output: {}", e);
            process::exit(EXIT_CONFIG);
        }
    }

    let stats = reader.stats();
    info!(
        requests = stats.requests,
        bytes = stats.bytes,
        timeouts = stats.timeouts,
        notices = stats.notices,
        "Done"
    );
    log_final_metrics(&stats);
}

fn write_output(out: &mut impl Write, bytes: &[u8], raw: bool) -> io::Result<()> {
    if raw {
        out.write_all(bytes)?;
    } else {
        let hex: String = bytes.iter().map(|b| format!("{:02x}", b)).collect();
        writeln!(out, "{}", hex)?;
    }
    out.flush()
}

/// Ctrl-C state for `--continuous` runs.
#[derive(Debug, Default)]
struct StopSignal {
    requested: AtomicBool,
}

impl StopSignal {
    /// Records a press. Returns true if a stop was already pending.
    fn press(&self) -> bool {
        self.requested.swap(true, Ordering::SeqCst)
    }

    fn requested(&self) -> bool {
        self.requested.load(Ordering::SeqCst)
    }
}

fn log_final_metrics(stats: &GatherStats) {
    let registry = match MetricsRegistry::new() {
        Ok(registry) => registry,
        Err(e) => {
            warn!("Failed to create metrics registry: {}", e);
            return;
        }
    };
    registry.update(stats);
    match registry.encode() {
        Ok(output) => debug!("Final metrics:\n{}", output),
        Err(e) => warn!("Failed to encode metrics: {}", e),
    }
}

#[cfg(feature = "metrics")]
fn serve_metrics(port: u16, reader: &'static EntropyReader) {
    use os_entropy::metrics::{MetricsServer, MetricsServerConfig, MetricsState};

    if port == 0 {
        return;
    }

    let registry = match MetricsRegistry::new() {
        Ok(registry) => registry,
        Err(e) => {
            warn!("Failed to create metrics registry: {}", e);
            return;
        }
    };
    let server = MetricsServer::new(
        MetricsServerConfig::with_port(port),
        MetricsState::new(reader, registry),
    );

    std::thread::spawn(move || {
        let runtime = match tokio::runtime::Runtime::new() {
            Ok(runtime) => runtime,
            Err(e) => {
                warn!("Failed to start metrics runtime: {}", e);
                return;
            }
        };
        if let Err(e) = runtime.block_on(server.run()) {
            warn!("Metrics server stopped: {}", e);
        }
    });
}

#[cfg(not(feature = "metrics"))]
fn serve_metrics(port: u16, _reader: &'static EntropyReader) {
    if port != 0 {
        warn!(port, "Built without the `metrics` feature, not serving metrics");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hex_output() {
        let mut out = Vec::new();
        write_output(&mut out, &[0x00, 0xab, 0x10], false).unwrap();
        assert_eq!(out, b"00ab10\n");
    }

    #[test]
    fn test_raw_output() {
        let mut out = Vec::new();
        write_output(&mut out, &[1, 2, 3], true).unwrap();
        assert_eq!(out, vec![1, 2, 3]);
    }

    #[test]
    fn test_args_parse() {
        let args = Args::parse_from(["os-entropy", "--level", "2", "--bytes", "64", "--raw"]);
        assert_eq!(args.level, 2);
        assert_eq!(args.bytes, 64);
        assert!(args.raw);
        assert_eq!(args.count, 1);
        assert!(!args.continuous);
    }

    #[test]
    fn test_second_ctrl_c_aborts() {
        let stop = StopSignal::default();
        assert!(!stop.requested());

        assert!(!stop.press());
        assert!(stop.requested());
        assert!(stop.press());
    }

    #[test]
    fn test_continuous_help_describes_stop() {
        use clap::CommandFactory;

        let command = Args::command();
        let continuous = command
            .get_arguments()
            .find(|arg| arg.get_id() == "continuous")
            .unwrap();
        let help = continuous.get_help().unwrap().to_string();
        assert!(help.contains("stops between gathers"));
        assert!(help.contains("second one exits at once"));
    }
}
