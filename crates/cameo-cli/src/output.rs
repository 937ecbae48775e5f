//! Terminal output for conversion results

use cameo_core::{CodeSystemRegistry, ConversionSummary, Diagnostic};
use colored::Colorize;
use std::path::Path;

/// Prints conversion summaries and registry listings to stdout
#[derive(Debug, Default)]
pub struct ConversionReporter;

impl ConversionReporter {
    pub fn new() -> Self {
        Self
    }

    pub fn print(&self, summary: &ConversionSummary, diagnostics: &[Diagnostic], output_dir: &Path) {
        let stats = &summary.processing_stats;

        if summary.is_clean() {
            println!("{}", "Conversion completed".green().bold());
        } else {
            println!("{}", "Conversion completed with skipped input".yellow().bold());
        }

        println!(
            "  Namespaces: {} ({} elements, {} nested)",
            stats.namespaces_processed.to_string().cyan(),
            stats.elements,
            stats.nested_elements()
        );
        println!(
            "  Value sets: {} in {} files",
            stats.value_sets_processed.to_string().cyan(),
            stats.value_set_namespaces
        );
        if stats.has_skipped() {
            println!(
                "  Skipped:    {} namespaces, {} value sets",
                stats.namespaces_skipped.to_string().red(),
                stats.value_sets_skipped.to_string().red()
            );
        }
        println!(
            "  Output:     {} -> {}",
            summary.write_stats,
            output_dir.display().to_string().cyan()
        );
        println!("  Registry:   {} code systems", summary.code_systems);
        println!(
            "  Time:       {}",
            utils::format_duration(summary.duration).dimmed()
        );

        if !diagnostics.is_empty() {
            println!(
                "\n{} {}",
                diagnostics.len().to_string().yellow().bold(),
                "diagnostics:".yellow()
            );
            for diagnostic in diagnostics {
                println!(
                    "  {} {}",
                    format!("[{}]", diagnostic.kind).yellow(),
                    diagnostic.message
                );
            }
        }
    }

    pub fn print_code_systems(&self, registry: &CodeSystemRegistry, source: &Path) {
        let origin = if source.is_file() {
            source.display().to_string()
        } else {
            "built-in".to_string()
        };
        println!("{} ({})", "Code systems".bold(), origin.dimmed());

        for (uri, abbreviation) in registry.iter() {
            println!("  {}{}", format!("{:<8}", abbreviation).cyan(), uri);
        }
        println!("\n{} entries", registry.len());
    }
}

/// Progress reporter for long-running operations
pub struct ProgressReporter {
    enabled: bool,
    total: usize,
}

impl ProgressReporter {
    pub fn new(enabled: bool, total: usize) -> Self {
        Self { enabled, total }
    }

    pub fn update(&self, current: usize, message: &str) {
        if !self.enabled {
            return;
        }

        let percentage = if self.total > 0 {
            (current * 100) / self.total
        } else {
            0
        };

        eprint!("\r{} [{}/{}] {}%", message, current, self.total, percentage);

        if current >= self.total {
            eprintln!(); // New line when complete
        }
    }

    pub fn finish(&self, message: &str) {
        if self.enabled {
            eprintln!("\r{message} Complete!");
        }
    }
}

/// Utility functions for output formatting
pub mod utils {
    /// Format duration in human-readable format
    pub fn format_duration(duration: std::time::Duration) -> String {
        let total_ms = duration.as_millis();

        if total_ms < 1000 {
            format!("{total_ms}ms")
        } else if total_ms < 60_000 {
            format!("{:.1}s", total_ms as f64 / 1000.0)
        } else {
            let minutes = total_ms / 60_000;
            let seconds = (total_ms % 60_000) as f64 / 1000.0;
            format!("{minutes}m {seconds:.1}s")
        }
    }
}
