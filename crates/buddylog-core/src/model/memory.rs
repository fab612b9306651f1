//! Process and system memory counters.

use serde::{Deserialize, Serialize};

/// Memory of the current process.
///
/// Source: `/proc/self/statm` (pages, converted to bytes)
#[derive(Clone, Serialize, Deserialize, Debug, PartialEq, Eq, Default)]
pub struct ProcessMemInfo {
    /// Resident set size.
    pub rss: u64,
    /// Total program size.
    pub vms: u64,
    /// Resident shared pages (file-backed).
    pub shared: u64,
    /// Text (code).
    pub text: u64,
    /// Library. Always 0 since Linux 2.6.
    pub lib: u64,
    /// Data + stack.
    pub data: u64,
    /// Dirty pages. Always 0 since Linux 2.6.
    pub dirty: u64,
}

/// System-wide virtual memory statistics.
///
/// Source: `/proc/meminfo` (kB, converted to bytes)
#[derive(Clone, Serialize, Deserialize, Debug, PartialEq, Default)]
pub struct VirtualMemInfo {
    /// MemTotal.
    pub total: u64,
    /// MemAvailable.
    pub available: u64,
    /// `(total - available) / total * 100`.
    pub percent: f64,
    /// `total - free - buffers - cached`.
    pub used: u64,
    /// MemFree.
    pub free: u64,
    /// Active.
    pub active: u64,
    /// Inactive.
    pub inactive: u64,
    /// Buffers.
    pub buffers: u64,
    /// Cached + SReclaimable.
    pub cached: u64,
    /// Shmem.
    pub shared: u64,
    /// Slab.
    pub slab: u64,
}

/// One row of the process memory log.
#[derive(Clone, Serialize, Deserialize, Debug, PartialEq, Default)]
pub struct ProcessMemoryRecord {
    pub process: ProcessMemInfo,
    pub vm: VirtualMemInfo,
    /// Seconds since epoch, fractional.
    pub timestamp: f64,
    /// Snapshots per second since the session was opened.
    pub throughput: f64,
}

impl ProcessMemoryRecord {
    /// Column names, in row order.
    pub const CSV_HEADER: [&'static str; 20] = [
        "rss",
        "vms",
        "shared",
        "text",
        "lib",
        "data",
        "dirty",
        "vm_total",
        "vm_available",
        "vm_percent",
        "vm_used",
        "vm_free",
        "vm_active",
        "vm_inactive",
        "vm_buffers",
        "vm_cached",
        "vm_shared",
        "vm_slab",
        "timestamp",
        "throughput",
    ];

    /// Formats the record as a CSV row matching [`Self::CSV_HEADER`].
    pub fn csv_row(&self) -> String {
        let p = &self.process;
        let vm = &self.vm;
        let fields = [
            p.rss.to_string(),
            p.vms.to_string(),
            p.shared.to_string(),
            p.text.to_string(),
            p.lib.to_string(),
            p.data.to_string(),
            p.dirty.to_string(),
            vm.total.to_string(),
            vm.available.to_string(),
            vm.percent.to_string(),
            vm.used.to_string(),
            vm.free.to_string(),
            vm.active.to_string(),
            vm.inactive.to_string(),
            vm.buffers.to_string(),
            vm.cached.to_string(),
            vm.shared.to_string(),
            vm.slab.to_string(),
            self.timestamp.to_string(),
            self.throughput.to_string(),
        ];
        fields.join(",")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_csv_row_matches_header_width() {
        let record = ProcessMemoryRecord {
            process: ProcessMemInfo {
                rss: 4096,
                vms: 8192,
                ..Default::default()
            },
            vm: VirtualMemInfo {
                total: 1024,
                percent: 12.5,
                ..Default::default()
            },
            timestamp: 1700000000.5,
            throughput: 2.0,
        };

        let row = record.csv_row();
        let columns: Vec<&str> = row.split(',').collect();
        assert_eq!(columns.len(), ProcessMemoryRecord::CSV_HEADER.len());
        assert_eq!(columns[0], "4096");
        assert_eq!(columns[1], "8192");
        assert_eq!(columns[7], "1024");
        assert_eq!(columns[9], "12.5");
        assert_eq!(columns[18], "1700000000.5");
        assert_eq!(columns[19], "2");
    }
}
