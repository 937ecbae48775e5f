//! Statistics tracking for conversion runs
//!
//! This module provides statistics structures for tracking progress and results
//! during the schema-to-grammar conversion.

use std::fmt;
use std::time::Duration;

/// Statistics for the processing phase
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProcessingStats {
    /// Number of namespaces rendered
    pub namespaces_processed: usize,
    /// Number of namespaces skipped as malformed
    pub namespaces_skipped: usize,
    /// Number of data elements across all rendered namespaces
    pub elements: usize,
    /// Number of elements rendered at namespace level
    pub base_elements: usize,
    /// Number of value sets rendered
    pub value_sets_processed: usize,
    /// Number of value sets skipped as malformed
    pub value_sets_skipped: usize,
    /// Number of value-set files (one per namespace)
    pub value_set_namespaces: usize,
    /// Number of diagnostics raised
    pub diagnostics: usize,
}

impl ProcessingStats {
    /// Create new empty processing statistics
    pub fn new() -> Self {
        Self::default()
    }

    /// Elements rendered inside another element
    pub fn nested_elements(&self) -> usize {
        self.elements.saturating_sub(self.base_elements)
    }

    /// Fold the stats of another document into this one
    pub fn merge(&mut self, other: &ProcessingStats) {
        self.namespaces_processed += other.namespaces_processed;
        self.namespaces_skipped += other.namespaces_skipped;
        self.elements += other.elements;
        self.base_elements += other.base_elements;
        self.value_sets_processed += other.value_sets_processed;
        self.value_sets_skipped += other.value_sets_skipped;
        self.value_set_namespaces += other.value_set_namespaces;
        self.diagnostics += other.diagnostics;
    }

    /// Check if anything was skipped
    pub fn has_skipped(&self) -> bool {
        self.namespaces_skipped > 0 || self.value_sets_skipped > 0
    }
}

impl fmt::Display for ProcessingStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} namespaces ({} elements, {} nested), {} value sets in {} files",
            self.namespaces_processed,
            self.elements,
            self.nested_elements(),
            self.value_sets_processed,
            self.value_set_namespaces
        )?;
        if self.has_skipped() {
            write!(
                f,
                ", {} namespaces and {} value sets skipped",
                self.namespaces_skipped, self.value_sets_skipped
            )?;
        }
        if self.diagnostics > 0 {
            write!(f, ", {} diagnostics", self.diagnostics)?;
        }
        Ok(())
    }
}

/// Statistics for the file writing phase
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WriteStats {
    /// Number of grammar files written
    pub files_written: usize,
    /// Total bytes written
    pub bytes_written: usize,
}

impl WriteStats {
    /// Create new empty write statistics
    pub fn new() -> Self {
        Self::default()
    }

    /// Check if any files were written
    pub fn has_written(&self) -> bool {
        self.files_written > 0
    }

    /// Fold another batch into this one
    pub fn merge(&mut self, other: WriteStats) {
        self.files_written += other.files_written;
        self.bytes_written += other.bytes_written;
    }

    /// Get human-readable size
    pub fn human_size(&self) -> String {
        let bytes = self.bytes_written as f64;
        if bytes < 1024.0 {
            format!("{} B", bytes)
        } else if bytes < 1024.0 * 1024.0 {
            format!("{:.2} KB", bytes / 1024.0)
        } else {
            format!("{:.2} MB", bytes / (1024.0 * 1024.0))
        }
    }
}

impl fmt::Display for WriteStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} files written ({})",
            self.files_written,
            self.human_size()
        )
    }
}

/// Summary of an entire conversion run
#[derive(Debug, Clone)]
pub struct ConversionSummary {
    pub processing_stats: ProcessingStats,
    pub write_stats: WriteStats,
    /// Code systems known after the run, including newly allocated ones
    pub code_systems: usize,
    pub duration: Duration,
}

impl ConversionSummary {
    pub fn new(
        processing_stats: ProcessingStats,
        write_stats: WriteStats,
        code_systems: usize,
        duration: Duration,
    ) -> Self {
        Self {
            processing_stats,
            write_stats,
            code_systems,
            duration,
        }
    }

    /// True when no input was skipped
    pub fn is_clean(&self) -> bool {
        !self.processing_stats.has_skipped()
    }
}

impl fmt::Display for ConversionSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Processing: {}", self.processing_stats)?;
        writeln!(f, "Output:     {}", self.write_stats)?;
        writeln!(f, "Registry:   {} code systems", self.code_systems)?;
        write!(f, "Duration:   {:.2}s", self.duration.as_secs_f64())
    }
}
