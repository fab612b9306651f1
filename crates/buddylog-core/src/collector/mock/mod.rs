//! Mock filesystem for testing sources without a real `/proc`.

mod filesystem;
pub(crate) mod scenarios;

pub use filesystem::MockFs;
