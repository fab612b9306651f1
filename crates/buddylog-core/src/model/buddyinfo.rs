//! Buddy allocator state.
//!
//! Source: `/proc/buddyinfo`, one line per NUMA node / zone pair:
//!
//! ```text
//! Node 0, zone      DMA      1      1      1      0      2      1      1      0      1      1      3
//! Node 0, zone    DMA32   2276   2354   2313   2467   2193   1962   1605   1083    491    157    159
//! ```

use serde::{Deserialize, Serialize};

/// Free-list histogram of one memory zone.
#[derive(Clone, Serialize, Deserialize, Debug, PartialEq, Eq, Default)]
pub struct Zone {
    /// Zone name (DMA, DMA32, Normal, HighMem, Movable, ...).
    pub zone_type: String,

    /// Number of free blocks per order.
    /// Index `i` counts free blocks spanning `2^i` pages.
    pub free_fragments: Vec<u64>,
}

impl Zone {
    pub fn new(zone_type: impl Into<String>, free_fragments: Vec<u64>) -> Self {
        Self {
            zone_type: zone_type.into(),
            free_fragments,
        }
    }

    /// Number of orders tracked for this zone.
    pub fn orders(&self) -> usize {
        self.free_fragments.len()
    }
}

/// A NUMA node with its zones in discovery order.
#[derive(Clone, Serialize, Deserialize, Debug, PartialEq, Eq, Default)]
pub struct NumaNode {
    pub node_index: u32,
    pub zones: Vec<Zone>,
}

/// Structured contents of `/proc/buddyinfo` at one instant.
#[derive(Clone, Serialize, Deserialize, Debug, PartialEq, Eq, Default)]
pub struct BuddyInfoSnapshot {
    /// Capture time, seconds since epoch.
    pub timestamp: i64,
    /// Nodes in the order they first appeared in the feed.
    pub numa_nodes: Vec<NumaNode>,
}

impl BuddyInfoSnapshot {
    /// Total number of zones across all nodes.
    pub fn zone_count(&self) -> usize {
        self.numa_nodes.iter().map(|n| n.zones.len()).sum()
    }

    pub fn node(&self, node_index: u32) -> Option<&NumaNode> {
        self.numa_nodes.iter().find(|n| n.node_index == node_index)
    }
}

/// Fragmentation of a single node/zone pair.
#[derive(Clone, Serialize, Deserialize, Debug, PartialEq)]
pub struct FragmentationMeasurement {
    /// Timestamp of the snapshot this was derived from, seconds since epoch.
    pub timestamp: i64,
    pub node_index: u32,
    pub zone_type: String,
    /// Percentage in `[0, 100]` (not `[0, 1]`).
    /// High values mean free memory sits mostly in small blocks.
    pub percentage: f64,
}
