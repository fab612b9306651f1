//! buddylog-core: physical memory fragmentation sampling.
//!
//! Provides:
//! - `model`: value records (zones, NUMA nodes, snapshots, measurements)
//! - `collector`: `/proc` access: buddyinfo parser, memory source, mock filesystem
//! - `fragmentation`: per-zone fragmentation percentage
//! - `logger`: snapshot loggers with an open/snapshot/close lifecycle

pub mod collector;
pub mod fragmentation;
pub mod logger;
pub mod model;
