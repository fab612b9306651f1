//! Logger for process and system memory counters.

use std::path::{Path, PathBuf};
use std::time::Instant;

use chrono::{Local, Utc};
use tracing::{debug, info};

use super::output::{OutputFile, output_path};
use super::{LoggerError, SnapshotLogger};
use crate::collector::{MemorySource, ProcfsMemorySource, RealFs};
use crate::model::ProcessMemoryRecord;

/// Appends memory counters to a CSV file, one row per snapshot.
///
/// Columns are [`ProcessMemoryRecord::CSV_HEADER`]. The header row is
/// written when the session is opened.
pub struct ProcessMemoryLogger<M: MemorySource = ProcfsMemorySource<RealFs>> {
    source: M,
    output_path: PathBuf,
    output: Option<OutputFile>,
    started: Option<Instant>,
    snapshot_count: u64,
    vm_total: u64,
    vm_available: u64,
    throughput: f64,
}

impl ProcessMemoryLogger<ProcfsMemorySource<RealFs>> {
    /// Creates a logger reading the host's `/proc`.
    pub fn new(output_dir: impl AsRef<Path>, label: Option<&str>) -> Self {
        Self::with_source(
            ProcfsMemorySource::new(RealFs::new(), "/proc"),
            output_dir,
            label,
        )
    }
}

impl<M: MemorySource> ProcessMemoryLogger<M> {
    pub const NAME: &'static str = "process_memory";
    const OUTPUT_PREFIX: &'static str = "proc-memory-log";
    const OUTPUT_EXTENSION: &'static str = "csv";

    /// Creates a logger over an explicit source.
    ///
    /// The output file name is fixed here, from the current local time.
    pub fn with_source(source: M, output_dir: impl AsRef<Path>, label: Option<&str>) -> Self {
        let output_path = output_path(
            output_dir.as_ref(),
            Self::OUTPUT_PREFIX,
            label,
            Self::OUTPUT_EXTENSION,
            Local::now(),
        );
        Self {
            source,
            output_path,
            output: None,
            started: None,
            snapshot_count: 0,
            vm_total: 0,
            vm_available: 0,
            throughput: 0.0,
        }
    }

    /// Total system memory in bytes from the last snapshot.
    ///
    /// Does not change across snapshots.
    pub fn vm_total(&self) -> u64 {
        self.vm_total
    }

    /// Available system memory in bytes from the last snapshot.
    pub fn vm_available(&self) -> u64 {
        self.vm_available
    }

    /// Snapshots per second from the last snapshot.
    pub fn throughput(&self) -> f64 {
        self.throughput
    }
}

impl<M: MemorySource> SnapshotLogger for ProcessMemoryLogger<M> {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn open(&mut self) -> Result<(), LoggerError> {
        if self.output.is_some() {
            return Ok(());
        }
        let mut output = OutputFile::create(&self.output_path)?;
        output.write_line(&ProcessMemoryRecord::CSV_HEADER.join(","))?;
        output.flush()?;
        self.output = Some(output);
        self.started = Some(Instant::now());
        info!("Logging process memory to {}", self.output_path.display());
        Ok(())
    }

    fn snapshot(&mut self) -> Result<(), LoggerError> {
        let output = self
            .output
            .as_mut()
            .ok_or(LoggerError::NotOpen { logger: Self::NAME })?;

        let process = self.source.process_memory()?;
        let vm = self.source.virtual_memory()?;
        self.vm_total = vm.total;
        self.vm_available = vm.available;

        let timestamp = Utc::now().timestamp_micros() as f64 / 1_000_000.0;
        self.snapshot_count += 1;
        let elapsed = self
            .started
            .map(|s| s.elapsed().as_secs_f64())
            .unwrap_or_default();
        self.throughput = if elapsed > 0.0 {
            self.snapshot_count as f64 / elapsed
        } else {
            0.0
        };

        let record = ProcessMemoryRecord {
            process,
            vm,
            timestamp,
            throughput: self.throughput,
        };
        output.write_line(&record.csv_row())?;
        output.flush()?;

        debug!(
            "process memory snapshot #{}: rss={} vm_available={}",
            self.snapshot_count, record.process.rss, record.vm.available
        );
        Ok(())
    }

    fn close(&mut self) -> Result<(), LoggerError> {
        self.snapshot_count = 0;
        self.started = None;
        if let Some(output) = self.output.take() {
            output.close()?;
            info!("Closed {}", self.output_path.display());
        }
        Ok(())
    }

    fn is_open(&self) -> bool {
        self.output.is_some()
    }

    fn snapshot_count(&self) -> u64 {
        self.snapshot_count
    }

    fn output_path(&self) -> Option<&Path> {
        Some(&self.output_path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collector::MockFs;
    use tempfile::TempDir;

    fn mock_logger(fs: MockFs, dir: &TempDir) -> ProcessMemoryLogger<ProcfsMemorySource<MockFs>> {
        ProcessMemoryLogger::with_source(
            ProcfsMemorySource::new(fs, "/proc"),
            dir.path(),
            Some("test-memory-logger"),
        )
    }

    fn read_rows(path: &Path) -> Vec<Vec<String>> {
        std::fs::read_to_string(path)
            .unwrap()
            .lines()
            .map(|l| l.split(',').map(str::to_string).collect())
            .collect()
    }

    #[test]
    fn test_snapshot() {
        let dir = TempDir::new().unwrap();
        let mut logger = mock_logger(MockFs::typical_system(), &dir);

        logger.open().unwrap();
        logger.snapshot().unwrap();
        assert_eq!(logger.snapshot_count(), 1);
        logger.close().unwrap();

        let rows = read_rows(logger.output_path().unwrap());
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0], ProcessMemoryRecord::CSV_HEADER.to_vec());
        assert_eq!(rows[1].len(), ProcessMemoryRecord::CSV_HEADER.len());
        assert_eq!(rows[1][0], (1200 * 4096).to_string());
        assert_eq!(rows[1][7], (16384000u64 * 1024).to_string());
    }

    #[test]
    fn test_accessors_track_last_snapshot() {
        let dir = TempDir::new().unwrap();
        let mut logger = mock_logger(MockFs::typical_system(), &dir);
        assert_eq!(logger.vm_total(), 0);

        logger.open().unwrap();
        logger.snapshot().unwrap();
        logger.snapshot().unwrap();

        assert_eq!(logger.vm_total(), 16384000 * 1024);
        assert_eq!(logger.vm_available(), 12000000 * 1024);
        assert!(logger.throughput() > 0.0);
        assert_eq!(logger.snapshot_count(), 2);
    }

    #[test]
    fn test_output_file_name() {
        let dir = TempDir::new().unwrap();
        let logger = mock_logger(MockFs::typical_system(), &dir);
        let name = logger
            .output_path()
            .unwrap()
            .file_name()
            .unwrap()
            .to_string_lossy()
            .to_string();

        assert!(name.starts_with("proc-memory-log-test-memory-logger-"));
        assert!(name.ends_with(".csv"));
    }

    #[test]
    fn test_lifecycle_errors() {
        let dir = TempDir::new().unwrap();
        let mut logger = mock_logger(MockFs::typical_system(), &dir);

        assert!(matches!(
            logger.snapshot(),
            Err(LoggerError::NotOpen { logger: "process_memory" })
        ));

        logger.open().unwrap();
        logger.close().unwrap();
        logger.close().unwrap();
        assert!(matches!(logger.snapshot(), Err(LoggerError::NotOpen { .. })));
    }

    #[test]
    fn test_reopen_starts_new_session() {
        let dir = TempDir::new().unwrap();
        let mut logger = mock_logger(MockFs::typical_system(), &dir);

        logger.open().unwrap();
        logger.snapshot().unwrap();
        logger.snapshot().unwrap();
        logger.close().unwrap();

        logger.open().unwrap();
        logger.snapshot().unwrap();
        assert_eq!(logger.snapshot_count(), 1);
        logger.close().unwrap();

        assert_eq!(read_rows(logger.output_path().unwrap()).len(), 2);
    }

    #[test]
    fn test_failed_read_writes_no_row() {
        let mut fs = MockFs::typical_system();
        fs.remove_file("/proc/meminfo");
        let dir = TempDir::new().unwrap();
        let mut logger = mock_logger(fs, &dir);

        logger.open().unwrap();
        assert!(matches!(logger.snapshot(), Err(LoggerError::Io(_))));
        assert_eq!(logger.snapshot_count(), 0);
        logger.close().unwrap();

        assert_eq!(read_rows(logger.output_path().unwrap()).len(), 1);
    }
}
