//! Sources backed by the Linux `/proc` filesystem.

mod buddyinfo;
mod error;
mod memory;
pub mod parser;

pub use buddyinfo::BuddyInfoSource;
pub use error::CollectError;
pub use memory::ProcfsMemorySource;
pub use parser::ParseError;
