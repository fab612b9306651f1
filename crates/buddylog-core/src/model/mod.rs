//! Data models for memory sampling.
//!
//! - [`buddyinfo`]: buddy allocator state from `/proc/buddyinfo` and the
//!   fragmentation measurements derived from it
//! - [`memory`]: process and system memory counters
//!
//! Records are plain values: built once per capture, handed to the
//! serializer, never mutated afterwards.

mod buddyinfo;
mod memory;

pub use buddyinfo::{BuddyInfoSnapshot, FragmentationMeasurement, NumaNode, Zone};
pub use memory::{ProcessMemInfo, ProcessMemoryRecord, VirtualMemInfo};
