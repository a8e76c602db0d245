//! G-code output: buffer, wipe tower planning and clustered emission.

pub mod emit;
pub mod wipe_plan;

use std::fs;
use std::path::Path;

use crate::Result;

pub use emit::{EmissionDriver, RegionCodeGenerator};
pub use wipe_plan::{PurgeBlockEngine, WipeFragment, WipeTowerEngine, WipeTowerPlanner};

/// An in-memory G-code buffer.
#[derive(Debug, Clone, Default)]
pub struct GCode {
    content: String,
}

impl GCode {
    /// Create an empty buffer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Wrap an existing string.
    pub fn from_string(content: String) -> Self {
        Self { content }
    }

    /// Full buffer contents.
    pub fn content(&self) -> &str {
        &self.content
    }

    /// Append one line, adding the trailing newline.
    pub fn append_line(&mut self, line: &str) {
        self.content.push_str(line);
        self.content.push('\n');
    }

    /// Append a `;` comment line.
    pub fn append_comment(&mut self, comment: &str) {
        self.content.push_str("; ");
        self.content.push_str(comment);
        self.content.push('\n');
    }

    /// Append a raw fragment verbatim.
    pub fn append(&mut self, fragment: &str) {
        self.content.push_str(fragment);
    }

    /// Write the buffer to a file.
    pub fn write_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        fs::write(path, &self.content)?;
        Ok(())
    }

    /// Iterate over the buffer's lines.
    pub fn lines(&self) -> impl Iterator<Item = &str> {
        self.content.lines()
    }

    pub fn line_count(&self) -> usize {
        self.content.lines().count()
    }

    pub fn len(&self) -> usize {
        self.content.len()
    }

    pub fn is_empty(&self) -> bool {
        self.content.is_empty()
    }
}

/// Summary counters collected across planning and emission.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct GCodeStats {
    /// Number of tool changes in the final schedule.
    pub tool_change_count: usize,
    /// Total purge volume across all tool changes (mm³).
    pub purge_volume_mm3: f64,
    /// Units (object regions and support layers) emitted.
    pub emitted_units: usize,
    /// Number of batches in the object schedule.
    pub batch_count: usize,
}
