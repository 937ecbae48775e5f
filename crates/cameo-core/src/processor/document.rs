//! Document processor
//!
//! Entry point of the conversion: locates the namespace and value-set
//! sections of a document and drives both pipelines against one registry.
//! Namespaces are processed first, in input order, then value sets, so code
//! allocation order is fixed for a given input.

use crate::{
    CameoError, Result,
    exportable::{Diagnostic, DiagnosticKind, Namespace, ValueSetNamespace},
    models::{Document, NAMESPACES_SECTION, NamespaceNode, VALUE_SETS_SECTION, ValueSetNode},
    processor::{NamespaceProcessor, ValueSetProcessor, group_by_namespace, take_diagnostics},
    registry::CodeSystemRegistry,
    stats::ProcessingStats,
};
use serde_json::Value;
use tracing::{debug, info, warn};

/// Everything rendered from one document
#[derive(Debug, Default)]
pub struct ProcessedDocument {
    /// Rendered namespaces, in input order
    pub namespaces: Vec<Namespace>,
    /// Value sets grouped per namespace, first-seen namespace first
    pub value_sets: Vec<ValueSetNamespace>,
    pub diagnostics: Vec<Diagnostic>,
    pub stats: ProcessingStats,
}

/// Document processor
pub struct DocumentProcessor<'a> {
    registry: &'a mut CodeSystemRegistry,
}

impl<'a> DocumentProcessor<'a> {
    /// Create a new document processor
    pub fn new(registry: &'a mut CodeSystemRegistry) -> Self {
        Self { registry }
    }

    /// Process a raw JSON document
    pub fn process_value(&mut self, document: Value) -> Result<ProcessedDocument> {
        let document: Document = serde_json::from_value(document)?;
        self.process(&document)
    }

    /// Process a parsed document
    ///
    /// A missing `Namespaces` or `ValueSets` section is fatal and reported
    /// before anything is rendered. Any single namespace or value set that
    /// fails is skipped with a diagnostic.
    pub fn process(&mut self, document: &Document) -> Result<ProcessedDocument> {
        let namespaces = document
            .section(NAMESPACES_SECTION)
            .ok_or(CameoError::MissingSection {
                section: NAMESPACES_SECTION,
            })?;
        let value_sets = document
            .section(VALUE_SETS_SECTION)
            .ok_or(CameoError::MissingSection {
                section: VALUE_SETS_SECTION,
            })?;

        let mut output = ProcessedDocument::default();

        info!("Processing {} namespaces", namespaces.children.len());
        for raw in &namespaces.children {
            self.process_namespace(raw, &mut output);
        }

        info!("Processing {} value sets", value_sets.children.len());
        let mut rendered = Vec::with_capacity(value_sets.children.len());
        for raw in &value_sets.children {
            let label = raw_label(raw);
            let result = match serde_json::from_value::<ValueSetNode>(raw.clone()) {
                Ok(node) => ValueSetProcessor::new(self.registry).process(&node),
                Err(e) => Err(e.into()),
            };

            match result {
                Ok(mut value_set) => {
                    output.diagnostics.extend(take_diagnostics(&mut value_set));
                    output.stats.value_sets_processed += 1;
                    rendered.push(value_set);
                }
                Err(e) => {
                    output.stats.value_sets_skipped += 1;
                    output.diagnostics.push(Diagnostic::new(
                        DiagnosticKind::MalformedValueSet,
                        format!("skipping value set '{}': {}", label, e),
                    ));
                }
            }
        }

        output.value_sets = group_by_namespace(rendered).into_values().collect();
        output.stats.value_set_namespaces = output.value_sets.len();
        output.stats.diagnostics = output.diagnostics.len();

        for diagnostic in &output.diagnostics {
            warn!("{}", diagnostic);
        }
        debug!("Processing complete: {}", output.stats);

        Ok(output)
    }

    fn process_namespace(&mut self, raw: &Value, output: &mut ProcessedDocument) {
        let label = raw_label(raw);
        let mut processor = NamespaceProcessor::new(self.registry);

        let result = match serde_json::from_value::<NamespaceNode>(raw.clone()) {
            Ok(node) => processor.process(&node),
            Err(e) => Err(e.into()),
        };

        match result {
            Ok(namespace) => {
                output.stats.namespaces_processed += 1;
                output.stats.elements += namespace.elements.len();
                output.stats.base_elements += namespace.bases.len();
                output.diagnostics.extend(processor.take_diagnostics());
                output.namespaces.push(namespace);
            }
            Err(e) => {
                output.stats.namespaces_skipped += 1;
                output.diagnostics.push(Diagnostic::new(
                    DiagnosticKind::MalformedNamespace,
                    format!("skipping namespace '{}': {}", label, e),
                ));
            }
        }
    }
}

/// Best-effort label of a node that may not decode
fn raw_label(raw: &Value) -> &str {
    raw.get("label").and_then(Value::as_str).unwrap_or("<unlabeled>")
}
