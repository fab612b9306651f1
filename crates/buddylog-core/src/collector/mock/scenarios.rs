//! Pre-built mock filesystem scenarios for testing.

use super::filesystem::MockFs;

/// Two-node machine. Free counts taken from a real x86_64 host.
pub(crate) const TYPICAL_BUDDYINFO: &str = "\
Node 0, zone      DMA      0      0      0      0      0      0      0      0      1      1      2
Node 0, zone    DMA32   2276   2354   2313   2467   2193   1962   1605   1083    491    157    159
Node 0, zone   Normal 272212 416747 380128 291594 201237 133952  72185  37780  19157   8814  17597
Node 1, zone   Normal 437273 438880 516277 395388 241545 134083  69199  33740  14747   5564  17340
";

pub(crate) const TYPICAL_MEMINFO: &str = "\
MemTotal:       16384000 kB
MemFree:         8192000 kB
MemAvailable:   12000000 kB
Buffers:          512000 kB
Cached:          2048000 kB
SwapCached:            0 kB
Active:          4096000 kB
Inactive:        2048000 kB
SwapTotal:       4096000 kB
SwapFree:        4096000 kB
Dirty:              1024 kB
Writeback:             0 kB
Shmem:            128000 kB
Slab:             512000 kB
SReclaimable:     256000 kB
";

pub(crate) const TYPICAL_STATM: &str = "5000 1200 800 100 0 900 0\n";

impl MockFs {
    /// Creates a typical two-node system with buddyinfo, meminfo and the
    /// calling process's statm.
    pub fn typical_system() -> Self {
        let mut fs = Self::new();
        fs.add_file("/proc/buddyinfo", TYPICAL_BUDDYINFO);
        fs.add_file("/proc/meminfo", TYPICAL_MEMINFO);
        fs.add_file("/proc/self/statm", TYPICAL_STATM);
        fs
    }

    /// Single node whose Movable zone has no free pages at all.
    pub fn exhausted_zone_system() -> Self {
        let mut fs = Self::typical_system();
        fs.add_file(
            "/proc/buddyinfo",
            "\
Node 0, zone      DMA      0      0      0      0      0      0      0      0      1      1      2
Node 0, zone  Movable      0      0      0      0      0      0      0      0      0      0      0
",
        );
        fs
    }
}
