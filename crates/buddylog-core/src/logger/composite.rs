//! Composite logger running several loggers under one session.

use std::path::{Path, PathBuf};

use tracing::warn;

use super::buddyinfo::BuddyInfoLogger;
use super::config::LoggerConfig;
use super::process_memory::ProcessMemoryLogger;
use super::{LoggerError, SnapshotLogger};
use crate::collector::{BuddyInfoSource, FileSystem, ProcfsMemorySource, RealFs};

/// Logger types the composite knows how to build.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LoggerKind {
    BuddyInfo,
    ProcessMemory,
}

impl LoggerKind {
    /// Every kind, in fan-out order.
    pub const ALL: [LoggerKind; 2] = [LoggerKind::BuddyInfo, LoggerKind::ProcessMemory];

    pub fn name(self) -> &'static str {
        match self {
            LoggerKind::BuddyInfo => "buddyinfo",
            LoggerKind::ProcessMemory => "process_memory",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.name() == name)
    }

    fn build<F: FileSystem + Clone + 'static>(
        self,
        fs: &F,
        config: &LoggerConfig,
    ) -> Box<dyn SnapshotLogger> {
        let label = config.label.as_deref();
        match self {
            LoggerKind::BuddyInfo => Box::new(
                BuddyInfoLogger::with_source(
                    BuddyInfoSource::new(fs.clone(), &config.proc_path),
                    &config.output_dir,
                    label,
                )
                .with_format(config.buddyinfo_format),
            ),
            LoggerKind::ProcessMemory => Box::new(ProcessMemoryLogger::with_source(
                ProcfsMemorySource::new(fs.clone(), &config.proc_path),
                &config.output_dir,
                label,
            )),
        }
    }
}

/// What the composite does when a sub-logger's `snapshot()` fails.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FailurePolicy {
    /// Stop the fan-out and return the error. Later sub-loggers are skipped.
    #[default]
    Propagate,
    /// Log the error, remember it and continue with the next sub-logger.
    Isolate,
}

/// A sub-logger failure swallowed under [`FailurePolicy::Isolate`].
#[derive(Debug)]
pub struct LoggerFailure {
    pub logger: &'static str,
    pub error: LoggerError,
}

/// Fan-out over an ordered set of loggers.
pub struct MemoryLogger {
    loggers: Vec<Box<dyn SnapshotLogger>>,
    policy: FailurePolicy,
    last_failures: Vec<LoggerFailure>,
}

impl MemoryLogger {
    pub const NAME: &'static str = "memory";

    /// Creates a composite of every logger kind reading the host's `/proc`.
    pub fn new(output_dir: impl Into<PathBuf>, label: Option<&str>) -> Self {
        Self::from_config(RealFs::new(), &LoggerConfig::new(output_dir).with_label(label))
    }

    /// Creates a composite of `config.kinds`, all reading through `fs`.
    ///
    /// Each kind is built once even if `kinds` repeats it.
    pub fn from_config<F: FileSystem + Clone + 'static>(fs: F, config: &LoggerConfig) -> Self {
        let loggers = config
            .unique_kinds()
            .iter()
            .map(|kind| kind.build(&fs, config))
            .collect();
        Self::from_loggers(loggers).with_failure_policy(config.failure_policy)
    }

    /// Creates a composite over arbitrary loggers, run in the given order.
    pub fn from_loggers(loggers: Vec<Box<dyn SnapshotLogger>>) -> Self {
        Self {
            loggers,
            policy: FailurePolicy::default(),
            last_failures: Vec::new(),
        }
    }

    pub fn with_failure_policy(mut self, policy: FailurePolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Sub-logger names, in fan-out order.
    pub fn names(&self) -> Vec<&'static str> {
        self.loggers.iter().map(|l| l.name()).collect()
    }

    pub fn loggers(&self) -> &[Box<dyn SnapshotLogger>] {
        &self.loggers
    }

    /// Output files of all sub-loggers.
    pub fn output_paths(&self) -> Vec<&Path> {
        self.loggers.iter().filter_map(|l| l.output_path()).collect()
    }

    /// Failures isolated during the last `snapshot()` call.
    pub fn last_failures(&self) -> &[LoggerFailure] {
        &self.last_failures
    }
}

impl SnapshotLogger for MemoryLogger {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    /// Opens every sub-logger. If one fails, those already opened are closed
    /// again before the error is returned.
    fn open(&mut self) -> Result<(), LoggerError> {
        for i in 0..self.loggers.len() {
            if let Err(e) = self.loggers[i].open() {
                for opened in &mut self.loggers[..i] {
                    if let Err(close_err) = opened.close() {
                        warn!("Failed to close {} logger: {}", opened.name(), close_err);
                    }
                }
                return Err(e);
            }
        }
        Ok(())
    }

    fn snapshot(&mut self) -> Result<(), LoggerError> {
        self.last_failures.clear();
        if let Some(closed) = self.loggers.iter().find(|l| !l.is_open()) {
            return Err(LoggerError::NotOpen {
                logger: closed.name(),
            });
        }

        for logger in &mut self.loggers {
            if let Err(error) = logger.snapshot() {
                match self.policy {
                    FailurePolicy::Propagate => return Err(error),
                    FailurePolicy::Isolate => {
                        warn!("{} snapshot failed: {}", logger.name(), error);
                        self.last_failures.push(LoggerFailure {
                            logger: logger.name(),
                            error,
                        });
                    }
                }
            }
        }
        Ok(())
    }

    /// Closes every sub-logger, even after a failure. Returns the first error.
    fn close(&mut self) -> Result<(), LoggerError> {
        let mut first_error = None;
        for logger in &mut self.loggers {
            if let Err(e) = logger.close() {
                warn!("Failed to close {} logger: {}", logger.name(), e);
                first_error.get_or_insert(e);
            }
        }
        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    fn is_open(&self) -> bool {
        !self.loggers.is_empty() && self.loggers.iter().all(|l| l.is_open())
    }

    /// Highest snapshot count among the sub-loggers.
    fn snapshot_count(&self) -> u64 {
        self.loggers
            .iter()
            .map(|l| l.snapshot_count())
            .max()
            .unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collector::MockFs;
    use crate::logger::Session;
    use crate::logger::testing::RecordingLogger;
    use tempfile::TempDir;

    fn mock_composite(fs: MockFs, dir: &TempDir) -> MemoryLogger {
        let config = LoggerConfig::new(dir.path()).with_label(Some("composite"));
        MemoryLogger::from_config(fs, &config)
    }

    fn line_count(path: &Path) -> usize {
        std::fs::read_to_string(path).unwrap().lines().count()
    }

    #[test]
    fn test_logger_kind_names() {
        assert_eq!(LoggerKind::from_name("buddyinfo"), Some(LoggerKind::BuddyInfo));
        assert_eq!(
            LoggerKind::from_name("process_memory"),
            Some(LoggerKind::ProcessMemory)
        );
        assert_eq!(LoggerKind::from_name("psutil"), None);
    }

    #[test]
    fn test_builds_all_kinds_in_order() {
        let dir = TempDir::new().unwrap();
        let logger = mock_composite(MockFs::typical_system(), &dir);
        assert_eq!(logger.names(), vec!["buddyinfo", "process_memory"]);
        assert_eq!(logger.output_paths().len(), 2);
    }

    #[test]
    fn test_snapshot_adds_one_record_per_logger() {
        let dir = TempDir::new().unwrap();
        let mut logger = mock_composite(MockFs::typical_system(), &dir);

        logger.open().unwrap();
        logger.snapshot().unwrap();

        let paths: Vec<PathBuf> = logger.output_paths().iter().map(|p| p.to_path_buf()).collect();
        assert_eq!(line_count(&paths[0]), 1);
        // header + one row
        assert_eq!(line_count(&paths[1]), 2);
        for sub in logger.loggers() {
            assert_eq!(sub.snapshot_count(), 1);
        }

        logger.close().unwrap();
        for sub in logger.loggers() {
            assert_eq!(sub.snapshot_count(), 0);
            assert!(!sub.is_open());
        }
        assert_eq!(logger.snapshot_count(), 0);
    }

    #[test]
    fn test_snapshot_before_open() {
        let dir = TempDir::new().unwrap();
        let mut logger = mock_composite(MockFs::typical_system(), &dir);
        assert!(matches!(
            logger.snapshot(),
            Err(LoggerError::NotOpen { logger: "buddyinfo" })
        ));
    }

    #[test]
    fn test_close_twice() {
        let dir = TempDir::new().unwrap();
        let mut logger = mock_composite(MockFs::typical_system(), &dir);
        logger.open().unwrap();
        logger.close().unwrap();
        logger.close().unwrap();
        assert!(matches!(logger.snapshot(), Err(LoggerError::NotOpen { .. })));
    }

    #[test]
    fn test_propagate_stops_at_first_failure() {
        let (mut failing, failing_calls) = RecordingLogger::new("failing");
        failing.fail_snapshot = true;
        let (healthy, healthy_calls) = RecordingLogger::new("healthy");

        let mut logger = MemoryLogger::from_loggers(vec![Box::new(failing), Box::new(healthy)]);
        logger.open().unwrap();

        assert!(matches!(logger.snapshot(), Err(LoggerError::Io(_))));
        assert_eq!(failing_calls.borrow().snapshots, 1);
        assert_eq!(healthy_calls.borrow().snapshots, 0);
        assert!(logger.last_failures().is_empty());
    }

    #[test]
    fn test_isolate_continues_past_failure() {
        let (mut failing, _) = RecordingLogger::new("failing");
        failing.fail_snapshot = true;
        let (healthy, healthy_calls) = RecordingLogger::new("healthy");

        let mut logger = MemoryLogger::from_loggers(vec![Box::new(failing), Box::new(healthy)])
            .with_failure_policy(FailurePolicy::Isolate);
        logger.open().unwrap();

        logger.snapshot().unwrap();
        assert_eq!(healthy_calls.borrow().snapshots, 1);
        assert_eq!(logger.last_failures().len(), 1);
        assert_eq!(logger.last_failures()[0].logger, "failing");
    }

    #[test]
    fn test_isolate_with_real_loggers() {
        let mut fs = MockFs::typical_system();
        fs.remove_file("/proc/buddyinfo");
        let dir = TempDir::new().unwrap();
        let config = LoggerConfig::new(dir.path()).with_failure_policy(FailurePolicy::Isolate);
        let mut logger = MemoryLogger::from_config(fs, &config);

        logger.open().unwrap();
        logger.snapshot().unwrap();

        assert_eq!(logger.last_failures().len(), 1);
        assert_eq!(logger.last_failures()[0].logger, "buddyinfo");
        assert_eq!(logger.loggers()[1].snapshot_count(), 1);
    }

    #[test]
    fn test_open_failure_closes_opened_loggers() {
        let (first, first_calls) = RecordingLogger::new("first");
        let (mut second, _) = RecordingLogger::new("second");
        second.fail_open = true;

        let mut logger = MemoryLogger::from_loggers(vec![Box::new(first), Box::new(second)]);

        assert!(logger.open().is_err());
        assert_eq!(first_calls.borrow().closes, 1);
        assert!(!logger.loggers()[0].is_open());
    }

    #[test]
    fn test_session_over_composite() {
        let dir = TempDir::new().unwrap();
        let mut logger = mock_composite(MockFs::typical_system(), &dir);

        {
            let mut session = Session::begin(&mut logger).unwrap();
            session.snapshot().unwrap();
            session.snapshot().unwrap();
            assert_eq!(session.snapshot_count(), 2);
        }

        assert!(!logger.is_open());
        let paths: Vec<PathBuf> = logger.output_paths().iter().map(|p| p.to_path_buf()).collect();
        assert_eq!(line_count(&paths[0]), 2);
        assert_eq!(line_count(&paths[1]), 3);
    }

    #[test]
    fn test_subset_of_kinds() {
        let dir = TempDir::new().unwrap();
        let config = LoggerConfig::new(dir.path()).with_kinds(vec![LoggerKind::ProcessMemory]);
        let logger = MemoryLogger::from_config(MockFs::typical_system(), &config);
        assert_eq!(logger.names(), vec!["process_memory"]);
    }

    #[test]
    fn test_repeated_kind_gets_one_logger_and_file() {
        let dir = TempDir::new().unwrap();
        let mut config = LoggerConfig::new(dir.path());
        config.kinds = vec![LoggerKind::BuddyInfo, LoggerKind::BuddyInfo];
        let mut logger = MemoryLogger::from_config(MockFs::typical_system(), &config);
        assert_eq!(logger.names(), vec!["buddyinfo"]);

        logger.open().unwrap();
        logger.snapshot().unwrap();
        logger.snapshot().unwrap();
        logger.close().unwrap();

        let paths: Vec<PathBuf> = logger.output_paths().iter().map(|p| p.to_path_buf()).collect();
        assert_eq!(paths.len(), 1);
        assert_eq!(line_count(&paths[0]), 2);
    }
}
