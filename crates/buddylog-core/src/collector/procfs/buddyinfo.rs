//! Buddy allocator source reading `/proc/buddyinfo`.

use std::path::PathBuf;

use chrono::Utc;

use super::error::CollectError;
use super::parser::parse_buddyinfo;
use crate::collector::traits::FileSystem;
use crate::model::BuddyInfoSnapshot;

/// Reads and parses `<proc>/buddyinfo`.
pub struct BuddyInfoSource<F: FileSystem> {
    fs: F,
    proc_path: String,
}

impl<F: FileSystem> BuddyInfoSource<F> {
    /// Creates a new source.
    ///
    /// # Arguments
    /// * `fs` - Filesystem implementation (real or mock)
    /// * `proc_path` - Base path to proc filesystem (usually "/proc")
    pub fn new(fs: F, proc_path: impl Into<String>) -> Self {
        Self {
            fs,
            proc_path: proc_path.into(),
        }
    }

    /// Path of the buddyinfo file this source reads.
    pub fn path(&self) -> PathBuf {
        PathBuf::from(&self.proc_path).join("buddyinfo")
    }

    /// Returns true when the buddyinfo file is present.
    pub fn is_available(&self) -> bool {
        self.fs.exists(&self.path())
    }

    /// Captures the current allocator state.
    ///
    /// The snapshot timestamp is taken before the file is read.
    pub fn read(&self) -> Result<BuddyInfoSnapshot, CollectError> {
        let timestamp = Utc::now().timestamp();
        let content = self.fs.read_to_string(&self.path())?;
        Ok(parse_buddyinfo(&content, timestamp)?)
    }
}
