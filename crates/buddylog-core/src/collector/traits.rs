//! Abstractions over the data sources.
//!
//! `FileSystem` lets sources read the real `/proc` on Linux or an in-memory
//! mock in tests. `MemorySource` is the seam the process memory logger pulls
//! its counters through.

use std::io;
use std::path::Path;

use crate::collector::procfs::CollectError;
use crate::model::{ProcessMemInfo, VirtualMemInfo};

/// Abstraction for filesystem reads.
pub trait FileSystem: Send + Sync {
    /// Reads the entire contents of a file as a string.
    fn read_to_string(&self, path: &Path) -> io::Result<String>;

    /// Checks if a path exists.
    fn exists(&self, path: &Path) -> bool;
}

/// Real filesystem implementation that delegates to `std::fs`.
#[derive(Debug, Default, Clone, Copy)]
pub struct RealFs;

impl RealFs {
    pub fn new() -> Self {
        Self
    }
}

impl FileSystem for RealFs {
    fn read_to_string(&self, path: &Path) -> io::Result<String> {
        std::fs::read_to_string(path)
    }

    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }
}

/// Provider of process and system memory counters.
pub trait MemorySource {
    /// Memory usage of the current process.
    fn process_memory(&self) -> Result<ProcessMemInfo, CollectError>;

    /// System-wide memory statistics.
    fn virtual_memory(&self) -> Result<VirtualMemInfo, CollectError>;
}
