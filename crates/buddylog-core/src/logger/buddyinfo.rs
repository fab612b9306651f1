//! Logger for `/proc/buddyinfo`, used to track memory fragmentation.

use std::path::{Path, PathBuf};

use chrono::Local;
use tracing::{debug, info, warn};

use super::output::{OutputFile, output_path};
use super::{LoggerError, SnapshotLogger};
use crate::collector::{BuddyInfoSource, FileSystem, RealFs};
use crate::fragmentation::compute_all;
use crate::model::{BuddyInfoSnapshot, FragmentationMeasurement};

/// Record written per `snapshot()` call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum BuddyInfoFormat {
    /// One line per capture holding the full snapshot:
    /// `{"timestamp":..,"numa_nodes":[{"node_index":..,"zones":[{"zone_type":..,"free_fragments":[..]}]}]}`
    #[default]
    Snapshot,
    /// One line per node/zone holding the derived measurement:
    /// `{"timestamp":..,"node_index":..,"zone_type":..,"percentage":..}`
    Measurements,
}

/// Appends buddy allocator captures to a JSON lines file.
pub struct BuddyInfoLogger<F: FileSystem = RealFs> {
    source: BuddyInfoSource<F>,
    output_path: PathBuf,
    output: Option<OutputFile>,
    format: BuddyInfoFormat,
    snapshot_count: u64,
    last_measurements: Vec<FragmentationMeasurement>,
}

impl BuddyInfoLogger<RealFs> {
    /// Creates a logger reading the host's `/proc/buddyinfo`.
    pub fn new(output_dir: impl AsRef<Path>, label: Option<&str>) -> Self {
        Self::with_source(BuddyInfoSource::new(RealFs::new(), "/proc"), output_dir, label)
    }
}

impl<F: FileSystem> BuddyInfoLogger<F> {
    pub const NAME: &'static str = "buddyinfo";
    const OUTPUT_PREFIX: &'static str = "proc-buddyinfo-log";
    const OUTPUT_EXTENSION: &'static str = "jsonl";

    /// Creates a logger over an explicit source.
    ///
    /// The output file name is fixed here, from the current local time.
    pub fn with_source(
        source: BuddyInfoSource<F>,
        output_dir: impl AsRef<Path>,
        label: Option<&str>,
    ) -> Self {
        let output_path = output_path(
            output_dir.as_ref(),
            Self::OUTPUT_PREFIX,
            label,
            Self::OUTPUT_EXTENSION,
            Local::now(),
        );
        Self {
            source,
            output_path,
            output: None,
            format: BuddyInfoFormat::default(),
            snapshot_count: 0,
            last_measurements: Vec::new(),
        }
    }

    pub fn with_format(mut self, format: BuddyInfoFormat) -> Self {
        self.format = format;
        self
    }

    pub fn format(&self) -> BuddyInfoFormat {
        self.format
    }

    /// Reads the current allocator state without writing it.
    pub fn read_buddy_info(&self) -> Result<BuddyInfoSnapshot, LoggerError> {
        Ok(self.source.read()?)
    }

    /// Fragmentation of every zone from the last successful capture.
    pub fn last_measurements(&self) -> &[FragmentationMeasurement] {
        &self.last_measurements
    }
}

impl<F: FileSystem> SnapshotLogger for BuddyInfoLogger<F> {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn open(&mut self) -> Result<(), LoggerError> {
        if self.output.is_some() {
            return Ok(());
        }
        self.output = Some(OutputFile::create(&self.output_path)?);
        info!("Logging buddyinfo to {}", self.output_path.display());
        Ok(())
    }

    fn snapshot(&mut self) -> Result<(), LoggerError> {
        let output = self
            .output
            .as_mut()
            .ok_or(LoggerError::NotOpen { logger: Self::NAME })?;
        self.snapshot_count += 1;

        let data = self.source.read()?;
        match self.format {
            BuddyInfoFormat::Snapshot => {
                output.write_line(&serde_json::to_string(&data)?)?;
                output.flush()?;
                // The persisted record does not depend on the derived values.
                self.last_measurements = match compute_all(&data) {
                    Ok(measurements) => measurements,
                    Err(e) => {
                        warn!("Skipping fragmentation for snapshot {}: {}", data.timestamp, e);
                        Vec::new()
                    }
                };
            }
            BuddyInfoFormat::Measurements => {
                let measurements = compute_all(&data)?;
                let lines = measurements
                    .iter()
                    .map(serde_json::to_string)
                    .collect::<Result<Vec<_>, _>>()?;
                output.write_lines(&lines)?;
                output.flush()?;
                self.last_measurements = measurements;
            }
        }

        debug!(
            "buddyinfo snapshot #{}: {} nodes, {} zones",
            self.snapshot_count,
            data.numa_nodes.len(),
            data.zone_count()
        );
        Ok(())
    }

    fn close(&mut self) -> Result<(), LoggerError> {
        self.snapshot_count = 0;
        if let Some(output) = self.output.take() {
            output.close()?;
            info!("Closed {}", self.output_path.display());
        }
        Ok(())
    }

    fn is_open(&self) -> bool {
        self.output.is_some()
    }

    fn snapshot_count(&self) -> u64 {
        self.snapshot_count
    }

    fn output_path(&self) -> Option<&Path> {
        Some(&self.output_path)
    }
}
