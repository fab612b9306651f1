//! Process and system memory counters from `/proc/self/statm` and `/proc/meminfo`.

use std::path::PathBuf;

use super::error::CollectError;
use super::parser::{parse_meminfo, parse_statm};
use crate::collector::traits::{FileSystem, MemorySource};
use crate::model::{ProcessMemInfo, VirtualMemInfo};

/// Page size used to convert statm pages to bytes.
const PAGE_SIZE: u64 = 4096;

/// `MemorySource` backed by procfs.
pub struct ProcfsMemorySource<F: FileSystem> {
    fs: F,
    proc_path: String,
    page_size: u64,
}

impl<F: FileSystem> ProcfsMemorySource<F> {
    /// Creates a new memory source.
    ///
    /// # Arguments
    /// * `fs` - Filesystem implementation (real or mock)
    /// * `proc_path` - Base path to proc filesystem (usually "/proc")
    pub fn new(fs: F, proc_path: impl Into<String>) -> Self {
        Self {
            fs,
            proc_path: proc_path.into(),
            page_size: PAGE_SIZE,
        }
    }

    fn proc_file(&self, name: &str) -> PathBuf {
        PathBuf::from(&self.proc_path).join(name)
    }
}

impl<F: FileSystem> MemorySource for ProcfsMemorySource<F> {
    fn process_memory(&self) -> Result<ProcessMemInfo, CollectError> {
        let content = self.fs.read_to_string(&self.proc_file("self/statm"))?;
        let statm = parse_statm(&content)?;

        Ok(ProcessMemInfo {
            rss: statm.resident * self.page_size,
            vms: statm.size * self.page_size,
            shared: statm.shared * self.page_size,
            text: statm.text * self.page_size,
            lib: statm.lib * self.page_size,
            data: statm.data * self.page_size,
            dirty: statm.dt * self.page_size,
        })
    }

    fn virtual_memory(&self) -> Result<VirtualMemInfo, CollectError> {
        let content = self.fs.read_to_string(&self.proc_file("meminfo"))?;
        let info = parse_meminfo(&content)?;

        let total = info.mem_total * 1024;
        let available = info.mem_available * 1024;
        let free = info.mem_free * 1024;
        let buffers = info.buffers * 1024;
        let cached = (info.cached + info.s_reclaimable) * 1024;

        // Cached can exceed what is left after free on some kernels
        let used = total
            .checked_sub(free + buffers + cached)
            .unwrap_or_else(|| total.saturating_sub(free));
        let percent = total.saturating_sub(available) as f64 * 100.0 / total as f64;

        Ok(VirtualMemInfo {
            total,
            available,
            percent,
            used,
            free,
            active: info.active * 1024,
            inactive: info.inactive * 1024,
            buffers,
            cached,
            shared: info.shmem * 1024,
            slab: info.slab * 1024,
        })
    }
}
