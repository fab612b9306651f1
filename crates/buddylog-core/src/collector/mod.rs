//! Memory state sources for Linux.
//!
//! Everything here reads through the [`FileSystem`] trait so the same code
//! runs against the real `/proc` or an in-memory [`MockFs`].
//!
//! ```text
//!  BuddyInfoLogger         ProcessMemoryLogger
//!        │                         │
//!  BuddyInfoSource         ProcfsMemorySource (MemorySource)
//!  /proc/buddyinfo         /proc/self/statm, /proc/meminfo
//!        │                         │
//!        └───────────┬─────────────┘
//!             FileSystem (trait)
//!             ├── RealFs  (Linux)
//!             └── MockFs  (tests)
//! ```
//!
//! # Usage
//!
//! ```
//! use buddylog_core::collector::{BuddyInfoSource, MockFs};
//!
//! let fs = MockFs::typical_system();
//! let source = BuddyInfoSource::new(fs, "/proc");
//! let snapshot = source.read().unwrap();
//! assert_eq!(snapshot.numa_nodes.len(), 2);
//! ```

pub mod mock;
pub mod procfs;
pub mod traits;

pub use mock::MockFs;
pub use procfs::{BuddyInfoSource, CollectError, ParseError, ProcfsMemorySource};
pub use traits::{FileSystem, MemorySource, RealFs};
