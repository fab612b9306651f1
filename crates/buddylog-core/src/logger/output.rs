//! Session output files.

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};

/// Timestamp format used in file names. Sorts chronologically.
const FILE_TIME_FORMAT: &str = "%Y-%m-%d-%H-%M-%S";

/// Builds `<dir>/<prefix>[-<label>]-<YYYY-MM-DD-HH-MM-SS>.<ext>`.
///
/// An empty label is treated as no label.
pub fn output_path(
    output_dir: &Path,
    prefix: &str,
    label: Option<&str>,
    extension: &str,
    started_at: DateTime<Local>,
) -> PathBuf {
    let mut basename = prefix.to_string();
    if let Some(label) = label.filter(|l| !l.is_empty()) {
        basename.push('-');
        basename.push_str(label);
    }
    basename.push('-');
    basename.push_str(&started_at.format(FILE_TIME_FORMAT).to_string());
    basename.push('.');
    basename.push_str(extension);
    output_dir.join(basename)
}

/// Append-only line writer owned by a single logger for one session.
pub(crate) struct OutputFile {
    writer: BufWriter<File>,
}

impl OutputFile {
    /// Creates (or truncates) the file, creating parent directories.
    pub(crate) fn create(path: &Path) -> io::Result<Self> {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)?;
        }
        let file = File::create(path)?;
        Ok(Self {
            writer: BufWriter::new(file),
        })
    }

    pub(crate) fn write_line(&mut self, line: &str) -> io::Result<()> {
        self.writer.write_all(line.as_bytes())?;
        self.writer.write_all(b"\n")
    }

    /// Writes every line with a single buffered write. Nothing is written
    /// for an empty slice.
    pub(crate) fn write_lines(&mut self, lines: &[String]) -> io::Result<()> {
        if lines.is_empty() {
            return Ok(());
        }
        let mut block = lines.join("\n");
        block.push('\n');
        self.writer.write_all(block.as_bytes())
    }

    pub(crate) fn flush(&mut self) -> io::Result<()> {
        self.writer.flush()
    }

    /// Flushes buffered lines and syncs the file to disk.
    pub(crate) fn close(self) -> io::Result<()> {
        let file = self.writer.into_inner().map_err(|e| e.into_error())?;
        file.sync_all()
    }
}
