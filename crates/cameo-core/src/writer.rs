//! Text Writer - Converts Exportable types to grammar text files
//!
//! The TextWriter handles the final stage of conversion: turning the
//! in-memory Exportable representations into files on disk.
//!
//! # Examples
//!
//! ```no_run
//! use cameo_core::exportable::{Exportable, Namespace};
//! use cameo_core::writer::TextWriter;
//! use std::path::Path;
//!
//! let writer = TextWriter::default();
//! let namespace = Namespace::new("shr.core");
//!
//! // Write to string
//! let text = writer.write(&namespace);
//! println!("{}", text);
//!
//! // Write `out/shr_core.txt`
//! let exportables: Vec<&dyn Exportable> = vec![&namespace];
//! writer.write_batch(&exportables, Path::new("out")).unwrap();
//! ```

use crate::error::{CameoError, Result};
use crate::exportable::Exportable;
use crate::stats::WriteStats;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Extension of every generated file
pub const OUTPUT_EXTENSION: &str = "txt";

/// Writes exportables to `<dir>/<file_stem>.txt`
#[derive(Debug, Clone)]
pub struct TextWriter {
    /// Whether to add trailing newline to files
    add_trailing_newline: bool,
}

impl Default for TextWriter {
    fn default() -> Self {
        Self {
            add_trailing_newline: true,
        }
    }
}

impl TextWriter {
    /// Set whether to add a trailing newline
    pub fn with_trailing_newline(mut self, add: bool) -> Self {
        self.add_trailing_newline = add;
        self
    }

    /// Convert an Exportable to its file content
    pub fn write(&self, exportable: &dyn Exportable) -> String {
        let mut text = exportable.to_text();

        if self.add_trailing_newline && !text.ends_with('\n') {
            text.push('\n');
        }

        text
    }

    /// Path an exportable is written to inside `output_dir`
    pub fn output_path(&self, exportable: &dyn Exportable, output_dir: &Path) -> PathBuf {
        output_dir.join(format!("{}.{}", exportable.file_stem(), OUTPUT_EXTENSION))
    }

    /// Write an Exportable to a file, creating parent directories
    ///
    /// Returns the number of bytes written.
    pub fn write_to_file(&self, exportable: &dyn Exportable, path: &Path) -> Result<usize> {
        let text = self.write(exportable);

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| CameoError::io(parent, e))?;
        }

        fs::write(path, &text).map_err(|e| CameoError::io(path, e))?;
        debug!("Wrote {} ({} bytes)", path.display(), text.len());

        Ok(text.len())
    }

    /// Write multiple Exportables to files in a directory
    ///
    /// Each exportable is written to a separate file named after its file
    /// stem. The directory is created if it doesn't exist.
    pub fn write_batch(
        &self,
        exportables: &[&dyn Exportable],
        output_dir: &Path,
    ) -> Result<WriteStats> {
        fs::create_dir_all(output_dir).map_err(|e| CameoError::io(output_dir, e))?;

        let mut stats = WriteStats::new();
        for exportable in exportables {
            let file_path = self.output_path(*exportable, output_dir);
            stats.bytes_written += self.write_to_file(*exportable, &file_path)?;
            stats.files_written += 1;
        }

        Ok(stats)
    }
}
