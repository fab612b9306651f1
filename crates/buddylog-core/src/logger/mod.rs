//! Snapshot loggers.
//!
//! Every logger follows the same lifecycle:
//!
//! ```text
//! new() ──► open() ──► snapshot() × N ──► close()
//!             │                              │
//!             └──── output file owned ───────┘
//! ```
//!
//! `open()` creates the session file, `snapshot()` captures one measurement
//! and appends it (flushed before returning), `close()` flushes, syncs and
//! releases the file. [`Session`] ties `close()` to scope exit.
//!
//! Loggers are not thread-safe: one instance is driven by one thread at a
//! time, which `&mut self` on every lifecycle method enforces.
//!
//! # Usage
//!
//! ```no_run
//! use buddylog_core::logger::{MemoryLogger, Session};
//!
//! let mut logger = MemoryLogger::new("./data", Some("baseline"));
//! let mut session = Session::begin(&mut logger)?;
//! for _ in 0..10 {
//!     session.snapshot()?;
//! }
//! session.finish()?;
//! # Ok::<(), buddylog_core::logger::LoggerError>(())
//! ```

mod buddyinfo;
mod composite;
mod config;
mod output;
mod process_memory;

use std::ops::Deref;
use std::path::Path;

use tracing::warn;

use crate::collector::{CollectError, ParseError};
use crate::fragmentation::FragmentationError;

pub use buddyinfo::{BuddyInfoFormat, BuddyInfoLogger};
pub use composite::{FailurePolicy, LoggerFailure, LoggerKind, MemoryLogger};
pub use config::LoggerConfig;
pub use output::output_path;
pub use process_memory::ProcessMemoryLogger;

/// Error type for logger operations.
#[derive(Debug)]
pub enum LoggerError {
    /// `snapshot()` called outside an open session.
    NotOpen { logger: &'static str },
    /// Source unreadable or output not writable.
    Io(std::io::Error),
    /// Source content malformed.
    Parse(ParseError),
    /// Fragmentation could not be computed for a zone.
    Fragmentation(FragmentationError),
    /// Record serialization failed.
    Json(serde_json::Error),
}

impl std::fmt::Display for LoggerError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LoggerError::NotOpen { logger } => write!(f, "logger {} is not open", logger),
            LoggerError::Io(e) => write!(f, "I/O error: {}", e),
            LoggerError::Parse(e) => write!(f, "{}", e),
            LoggerError::Fragmentation(e) => write!(f, "fragmentation: {}", e),
            LoggerError::Json(e) => write!(f, "serialization error: {}", e),
        }
    }
}

impl std::error::Error for LoggerError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            LoggerError::NotOpen { .. } => None,
            LoggerError::Io(e) => Some(e),
            LoggerError::Parse(e) => Some(e),
            LoggerError::Fragmentation(e) => Some(e),
            LoggerError::Json(e) => Some(e),
        }
    }
}

impl From<std::io::Error> for LoggerError {
    fn from(e: std::io::Error) -> Self {
        LoggerError::Io(e)
    }
}

impl From<ParseError> for LoggerError {
    fn from(e: ParseError) -> Self {
        LoggerError::Parse(e)
    }
}

impl From<FragmentationError> for LoggerError {
    fn from(e: FragmentationError) -> Self {
        LoggerError::Fragmentation(e)
    }
}

impl From<serde_json::Error> for LoggerError {
    fn from(e: serde_json::Error) -> Self {
        LoggerError::Json(e)
    }
}

impl From<CollectError> for LoggerError {
    fn from(e: CollectError) -> Self {
        match e {
            CollectError::Io(e) => LoggerError::Io(e),
            CollectError::Parse(e) => LoggerError::Parse(e),
        }
    }
}

/// Capture/persist lifecycle shared by all metric sources.
pub trait SnapshotLogger {
    /// Short stable name, used in logs and errors.
    fn name(&self) -> &'static str;

    /// Acquires the output file. Calling it on an open logger is a no-op.
    fn open(&mut self) -> Result<(), LoggerError>;

    /// Captures one measurement and appends it to the output.
    ///
    /// Fails with [`LoggerError::NotOpen`] before `open()` or after `close()`.
    fn snapshot(&mut self) -> Result<(), LoggerError>;

    /// Flushes and releases the output file and resets the snapshot counter.
    /// Safe to call any number of times.
    fn close(&mut self) -> Result<(), LoggerError>;

    fn is_open(&self) -> bool;

    /// Number of `snapshot()` calls since the session was opened.
    fn snapshot_count(&self) -> u64;

    /// Output file of this logger, if it writes exactly one.
    fn output_path(&self) -> Option<&Path> {
        None
    }
}

/// An open logging session.
///
/// The logger is opened by [`Session::begin`] and closed when the session is
/// dropped, whichever way the scope is left. Use [`Session::finish`] to close
/// explicitly and observe close errors.
pub struct Session<'a, L: SnapshotLogger + ?Sized> {
    logger: &'a mut L,
    closed: bool,
}

impl<'a, L: SnapshotLogger + ?Sized> Session<'a, L> {
    pub fn begin(logger: &'a mut L) -> Result<Self, LoggerError> {
        logger.open()?;
        Ok(Self {
            logger,
            closed: false,
        })
    }

    pub fn snapshot(&mut self) -> Result<(), LoggerError> {
        self.logger.snapshot()
    }

    /// Closes the logger, returning any flush error.
    pub fn finish(mut self) -> Result<(), LoggerError> {
        self.closed = true;
        self.logger.close()
    }
}

impl<L: SnapshotLogger + ?Sized> Deref for Session<'_, L> {
    type Target = L;

    fn deref(&self) -> &L {
        self.logger
    }
}

impl<L: SnapshotLogger + ?Sized> Drop for Session<'_, L> {
    fn drop(&mut self) {
        if self.closed {
            return;
        }
        if let Err(e) = self.logger.close() {
            warn!("Failed to close {} logger: {}", self.logger.name(), e);
        }
    }
}


#[cfg(test)]
mod tests {
    use super::testing::RecordingLogger;
    use super::*;

    #[test]
    fn test_session_closes_on_drop() {
        let (mut logger, calls) = RecordingLogger::new("rec");
        {
            let mut session = Session::begin(&mut logger).unwrap();
            session.snapshot().unwrap();
            assert_eq!(session.snapshot_count(), 1);
        }
        assert!(!logger.is_open());
        assert_eq!(calls.borrow().closes, 1);
    }

    #[test]
    fn test_session_closes_on_early_error() {
        fn run(logger: &mut RecordingLogger) -> Result<(), LoggerError> {
            let mut session = Session::begin(logger)?;
            session.snapshot()?;
            session.snapshot()?;
            session.finish()
        }

        let (mut logger, calls) = RecordingLogger::new("rec");
        logger.fail_snapshot = true;

        assert!(run(&mut logger).is_err());
        assert!(!logger.is_open());
        assert_eq!(calls.borrow().snapshots, 1);
        assert_eq!(calls.borrow().closes, 1);
    }

    #[test]
    fn test_session_finish_closes_once() {
        let (mut logger, calls) = RecordingLogger::new("rec");
        let session = Session::begin(&mut logger).unwrap();
        session.finish().unwrap();
        assert_eq!(calls.borrow().closes, 1);
    }

    #[test]
    fn test_session_begin_propagates_open_error() {
        let (mut logger, calls) = RecordingLogger::new("rec");
        logger.fail_open = true;

        assert!(matches!(Session::begin(&mut logger), Err(LoggerError::Io(_))));
        assert_eq!(calls.borrow().closes, 0);
    }

    #[test]
    fn test_collect_error_maps_to_logger_error() {
        let parse: LoggerError = CollectError::Parse(ParseError::new("bad")).into();
        assert!(matches!(parse, LoggerError::Parse(_)));

        let io: LoggerError = CollectError::Io(std::io::Error::other("gone")).into();
        assert!(matches!(io, LoggerError::Io(_)));
    }

    #[test]
    fn test_not_open_display() {
        let err = LoggerError::NotOpen { logger: "buddyinfo" };
        assert_eq!(err.to_string(), "logger buddyinfo is not open");
    }
}
