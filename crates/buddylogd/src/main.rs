//! buddylogd - memory fragmentation logging daemon.
//!
//! Samples `/proc/buddyinfo` and process/system memory counters on a fixed
//! interval and appends them to per-session files until interrupted.

use tikv_jemallocator::Jemalloc;
#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;

use std::process::ExitCode;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use clap::{Parser, ValueEnum};
use tracing::{Level, debug, error, info, warn};
use tracing_subscriber::EnvFilter;

use buddylog_core::collector::{BuddyInfoSource, RealFs};
use buddylog_core::logger::{
    BuddyInfoFormat, FailurePolicy, LoggerConfig, LoggerError, LoggerKind, MemoryLogger, Session,
};

/// Memory fragmentation logging daemon.
#[derive(Parser)]
#[command(name = "buddylogd", about = "Memory fragmentation logging daemon", version)]
struct Args {
    /// Snapshot interval in seconds.
    #[arg(short, long, default_value = "10")]
    interval: u64,

    /// Output directory for log files.
    #[arg(short, long, default_value = "./data")]
    output_dir: String,

    /// Label included in log file names.
    #[arg(short, long)]
    label: Option<String>,

    /// Path to /proc filesystem.
    #[arg(long, default_value = "/proc")]
    proc_path: String,

    /// Stop after this many snapshots. Runs until interrupted if omitted.
    #[arg(short, long)]
    count: Option<u64>,

    /// Record written to the buddyinfo log.
    #[arg(long, value_enum, default_value_t = Format::Snapshot)]
    format: Format,

    /// Loggers to run (comma-separated): buddyinfo, process_memory.
    #[arg(long, value_delimiter = ',', value_parser = parse_kind, default_value = "buddyinfo,process_memory")]
    loggers: Vec<LoggerKind>,

    /// Keep going when one logger fails a snapshot.
    #[arg(long)]
    isolate_failures: bool,

    /// Increase logging verbosity (-v for debug, -vv for trace). Default is info level.
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Quiet mode - only show errors.
    #[arg(short, long)]
    quiet: bool,
}

#[derive(Clone, Copy, ValueEnum)]
enum Format {
    /// Full buddyinfo snapshot per line.
    Snapshot,
    /// One fragmentation percentage per node/zone per line.
    Measurements,
}

impl From<Format> for BuddyInfoFormat {
    fn from(format: Format) -> Self {
        match format {
            Format::Snapshot => BuddyInfoFormat::Snapshot,
            Format::Measurements => BuddyInfoFormat::Measurements,
        }
    }
}

fn parse_kind(s: &str) -> Result<LoggerKind, String> {
    LoggerKind::from_name(s.trim()).ok_or_else(|| {
        format!(
            "unknown logger '{}' (expected one of: {})",
            s,
            LoggerKind::ALL.map(LoggerKind::name).join(", ")
        )
    })
}

/// Initializes the tracing subscriber with the appropriate log level.
/// Default level is INFO. Use -q for quiet mode (errors only).
fn init_logging(verbose: u8, quiet: bool) {
    let level = if quiet {
        Level::ERROR
    } else {
        match verbose {
            0 => Level::INFO,
            1 => Level::DEBUG,
            _ => Level::TRACE,
        }
    };

    let filter = EnvFilter::from_default_env()
        .add_directive(format!("buddylogd={}", level).parse().unwrap())
        .add_directive(format!("buddylog_core={}", level).parse().unwrap());

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

fn build_config(args: &Args) -> LoggerConfig {
    let policy = if args.isolate_failures {
        FailurePolicy::Isolate
    } else {
        FailurePolicy::Propagate
    };
    LoggerConfig::new(&args.output_dir)
        .with_label(args.label.as_deref())
        .with_proc_path(&args.proc_path)
        .with_buddyinfo_format(args.format.into())
        .with_failure_policy(policy)
        .with_kinds(args.loggers.clone())
}

/// Runs snapshots until `running` is cleared or `count` is reached.
fn run(
    logger: &mut MemoryLogger,
    interval: Duration,
    count: Option<u64>,
    running: &AtomicBool,
) -> Result<u64, LoggerError> {
    let mut session = Session::begin(logger)?;
    let mut taken: u64 = 0;

    while running.load(Ordering::SeqCst) && count.is_none_or(|c| taken < c) {
        session.snapshot()?;
        taken += 1;
        debug!("Snapshot #{} written", taken);
        for failure in session.last_failures() {
            warn!("Snapshot #{}: {} skipped ({})", taken, failure.logger, failure.error);
        }

        if count.is_some_and(|c| taken >= c) {
            break;
        }

        // Sleep with periodic checks for shutdown signal
        let sleep_interval = Duration::from_millis(100);
        let mut remaining = interval;
        while remaining > Duration::ZERO && running.load(Ordering::SeqCst) {
            let sleep_time = remaining.min(sleep_interval);
            std::thread::sleep(sleep_time);
            remaining = remaining.saturating_sub(sleep_time);
        }
    }

    session.finish()?;
    Ok(taken)
}

fn main() -> ExitCode {
    let args = Args::parse();

    init_logging(args.verbose, args.quiet);

    info!("buddylogd {} starting", env!("CARGO_PKG_VERSION"));
    info!(
        "Config: interval={}s, output={}, proc={}",
        args.interval, args.output_dir, args.proc_path
    );

    let config = build_config(&args);
    if config.kinds.contains(&LoggerKind::BuddyInfo) {
        let source = BuddyInfoSource::new(RealFs::new(), &args.proc_path);
        if !source.is_available() {
            warn!("{} not found, buddyinfo snapshots will fail", source.path().display());
        }
    }

    let mut logger = MemoryLogger::from_config(RealFs::new(), &config);
    for path in logger.output_paths() {
        info!("Output: {}", path.display());
    }

    // Setup graceful shutdown
    let running = Arc::new(AtomicBool::new(true));
    let r = running.clone();

    if let Err(e) = ctrlc::set_handler(move || {
        info!("Received shutdown signal");
        r.store(false, Ordering::SeqCst);
    }) {
        warn!("Failed to set Ctrl-C handler: {}", e);
    }

    info!("Starting collection loop");

    let interval = Duration::from_secs(args.interval);
    match run(&mut logger, interval, args.count, &running) {
        Ok(taken) => {
            info!("Shutdown complete after {} snapshots", taken);
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("Logging session failed: {}", e);
            ExitCode::FAILURE
        }
    }
}
