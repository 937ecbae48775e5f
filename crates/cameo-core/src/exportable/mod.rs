//! Exportable types for grammar text output
//!
//! This module contains the in-memory forms of rendered constructs. Each
//! Exportable knows how to convert itself to grammar text via `to_text()`.
//!
//! Renderers never mutate caller state: they return the text together with a
//! [`Usage`] report (code systems used, namespaces referenced, diagnostics)
//! that the caller merges into its own.

pub mod constraint;
pub mod data_element;
pub mod namespace;
pub mod value;
pub mod value_set;

// Re-exports
pub use constraint::*;
pub use data_element::*;
pub use namespace::*;
pub use value::*;
pub use value_set::*;

use crate::registry::UNDETERMINED;
use indexmap::IndexMap;
use std::collections::BTreeSet;
use std::fmt;

/// Width of the label column in element and namespace files
pub const LABEL_WIDTH: usize = 20;

/// Width of the label column in value-set files
pub const VALUE_SET_LABEL_WIDTH: usize = 40;

/// Indentation of nested definitions
pub const DEFINITION_INDENT: usize = 10;

/// Core trait for types that are written out as one grammar file
pub trait Exportable {
    /// Convert this exportable to grammar text
    fn to_text(&self) -> String;

    /// Get the name of this exportable (the namespace label)
    fn name(&self) -> &str;

    /// Output file name without extension
    fn file_stem(&self) -> String;
}

/// Category of a non-fatal problem found while rendering
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DiagnosticKind {
    UnknownConstraint,
    UnknownChild,
    UnknownRule,
    MalformedNamespace,
    MalformedValueSet,
    NestingCycle,
    UnresolvedLabel,
    DuplicateLabel,
}

impl DiagnosticKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            DiagnosticKind::UnknownConstraint => "unknown-constraint",
            DiagnosticKind::UnknownChild => "unknown-child",
            DiagnosticKind::UnknownRule => "unknown-rule",
            DiagnosticKind::MalformedNamespace => "malformed-namespace",
            DiagnosticKind::MalformedValueSet => "malformed-value-set",
            DiagnosticKind::NestingCycle => "nesting-cycle",
            DiagnosticKind::UnresolvedLabel => "unresolved-label",
            DiagnosticKind::DuplicateLabel => "duplicate-label",
        }
    }
}

impl fmt::Display for DiagnosticKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A non-fatal problem: the affected output has a gap but the batch goes on
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub kind: DiagnosticKind,
    pub message: String,
}

impl Diagnostic {
    pub fn new(kind: DiagnosticKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.kind, self.message)
    }
}

/// Side-channel data produced by a render
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Usage {
    /// Code-system URI → abbreviation, first use first
    pub code_systems: IndexMap<String, String>,
    /// Other namespaces referenced
    pub uses: BTreeSet<String>,
    pub diagnostics: Vec<Diagnostic>,
}

impl Usage {
    /// Record a code system as used
    ///
    /// Empty abbreviations (banned systems) and the undetermined marker are
    /// never listed in code-system tables.
    pub fn record_code_system(&mut self, system: &str, abbreviation: &str) {
        if system.is_empty() || abbreviation.is_empty() || abbreviation == UNDETERMINED {
            return;
        }
        self.code_systems
            .entry(system.to_string())
            .or_insert_with(|| abbreviation.to_string());
    }

    pub fn add_use(&mut self, namespace: &str) {
        if !namespace.is_empty() {
            self.uses.insert(namespace.to_string());
        }
    }

    pub fn diagnose(&mut self, kind: DiagnosticKind, message: impl Into<String>) {
        self.diagnostics.push(Diagnostic::new(kind, message));
    }

    /// Fold another report into this one, keeping first-seen order
    pub fn merge(&mut self, other: Usage) {
        for (system, abbreviation) in other.code_systems {
            self.code_systems.entry(system).or_insert(abbreviation);
        }
        self.uses.extend(other.uses);
        self.diagnostics.extend(other.diagnostics);
    }
}

/// Rendered text plus the usage it produced
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Rendered {
    pub text: String,
    pub usage: Usage,
}

impl Rendered {
    pub fn new(text: impl Into<String>, usage: Usage) -> Self {
        Self {
            text: text.into(),
            usage,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }
}

/// `label` padded to the element label column, followed by `value`
pub fn labeled(label: &str, value: &str) -> String {
    format!("{:width$}{}", label, value, width = LABEL_WIDTH)
}

/// Quote free text for a `Description:` line
pub fn quoted(text: &str) -> String {
    format!("\"{}\"", text)
}

/// `ABBR#code` followed by the quoted display text when there is one
pub fn code_text(abbreviation: &str, code: &str, display: &str) -> String {
    if display.is_empty() {
        format!("{}#{}", abbreviation, code)
    } else {
        format!("{}#{} \"{}\"", abbreviation, code, display)
    }
}

/// Shift every non-empty line right by `width` columns
pub fn indent(text: &str, width: usize) -> String {
    text.lines()
        .map(|line| {
            if line.is_empty() {
                String::new()
            } else {
                format!("{:width$}{}", "", line, width = width)
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Join the non-empty parts with `separator`
pub fn join_non_empty<S: AsRef<str>>(parts: &[S], separator: &str) -> String {
    parts
        .iter()
        .map(AsRef::as_ref)
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(separator)
}
