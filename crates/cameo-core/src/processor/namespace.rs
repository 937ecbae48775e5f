//! Namespace processor
//!
//! Builds the element tree of one namespace and decides, for every element,
//! whether it is rendered at top level or nested under another element.
//!
//! Two passes run over the declaration tree:
//!
//! 1. **Membership**: depth-first, left-to-right. Every `DataElement` is
//!    registered; every identifiable or choice value under an element adds
//!    that element as a parent of each local label it can point at.
//! 2. **Resolution**: in declaration order. Elements without parents are
//!    bases and are marked defined first. Then each element parses its
//!    children into property lines and claims every local label that is not
//!    yet defined. The first claim wins.
//!
//! Elements that end up unreachable from any base (nesting cycles) are
//! promoted to bases afterwards so every element is rendered exactly once.

use crate::{
    Result,
    exportable::{
        ConstraintKind, DataElement, Diagnostic, DiagnosticKind, Namespace, RenderableValue,
        Usage, ValueKind, ValueRenderer, labeled,
    },
    models::{ChildNode, DataElementNode, Identifier, NamespaceNode, ValueNode},
    registry::{CodeSystemRegistry, UNDETERMINED},
};
use std::collections::HashSet;
use tracing::debug;

/// Namespace processor
pub struct NamespaceProcessor<'a> {
    registry: &'a mut CodeSystemRegistry,
    diagnostics: Vec<Diagnostic>,
}

impl<'a> NamespaceProcessor<'a> {
    /// Create a new namespace processor
    pub fn new(registry: &'a mut CodeSystemRegistry) -> Self {
        Self {
            registry,
            diagnostics: Vec::new(),
        }
    }

    /// Diagnostics raised by the last `process` call
    pub fn take_diagnostics(&mut self) -> Vec<Diagnostic> {
        std::mem::take(&mut self.diagnostics)
    }

    /// Process a namespace record into a resolved Namespace
    pub fn process(&mut self, node: &NamespaceNode) -> Result<Namespace> {
        debug!("Processing namespace '{}'", node.label);

        let mut namespace = Namespace::new(node.label.clone());
        namespace.description = node.description.clone();
        namespace.version = node.grammar_version;

        self.collect_members(&node.children, None, &mut namespace)?;
        self.resolve(&mut namespace)?;
        self.promote_unreachable(&mut namespace);

        for element in namespace.elements.values_mut() {
            namespace.uses.extend(element.usage.uses.iter().cloned());
            self.diagnostics
                .extend(std::mem::take(&mut element.usage.diagnostics));
        }

        debug!(
            "Namespace '{}': {} elements, {} bases",
            namespace.label,
            namespace.elements.len(),
            namespace.bases.len()
        );

        Ok(namespace)
    }

    /// Membership pass
    fn collect_members(
        &mut self,
        children: &[ChildNode],
        parent: Option<&str>,
        namespace: &mut Namespace,
    ) -> Result<()> {
        for child in children {
            match child {
                ChildNode::Element(node) => {
                    let element = self.build_element(node, &namespace.label)?;
                    if namespace.elements.contains_key(&node.label) {
                        self.diagnostics.push(Diagnostic::new(
                            DiagnosticKind::DuplicateLabel,
                            format!(
                                "element '{}' is declared more than once in namespace '{}'; the last declaration is kept",
                                node.label, namespace.label
                            ),
                        ));
                    }
                    namespace.elements.insert(node.label.clone(), element);
                    self.collect_members(&node.children, Some(node.label.as_str()), namespace)?;
                }
                ChildNode::Value(value) => {
                    let Some(parent) = parent else {
                        continue;
                    };
                    for candidate in membership_candidates(value) {
                        if candidate.namespace == namespace.label && !candidate.label.is_empty() {
                            namespace
                                .parents
                                .entry(candidate.label)
                                .or_default()
                                .push(parent.to_string());
                        }
                    }
                }
            }
        }
        Ok(())
    }

    /// Build an element's own lines; children are parsed later
    fn build_element(&mut self, node: &DataElementNode, namespace: &str) -> Result<DataElement> {
        let mut element = DataElement::new(node.label.clone(), namespace);
        element.is_entry = node.is_entry;
        element.is_abstract = node.is_abstract;
        element.description = node.description.clone();
        element.children = node.children.clone();

        let mut codes = Vec::with_capacity(node.concepts.len());
        for concept in &node.concepts {
            let abbreviation = self.registry.get(&concept.system)?;
            element
                .usage
                .record_code_system(&concept.system, &abbreviation);
            codes.push(format!("{}#{}", abbreviation, concept.code));
        }
        element.concept = if codes.is_empty() {
            labeled("Concept:", UNDETERMINED)
        } else {
            labeled("Concept:", &codes.join(", "))
        };

        for base in &node.based_on {
            element.based_on.push(labeled("Based on:", &base.label));
            element.usage.add_use(&base.namespace);
        }

        if let Some(value) = &node.value {
            match ValueRenderer::new(self.registry, namespace).build(value)? {
                Some((renderable, usage)) => {
                    element.value = renderable.value_line();
                    element.usage.merge(usage);
                    for reference in renderable.references() {
                        element.usage.add_use(&reference.namespace);
                    }
                }
                None if value.kind.is_empty() => {}
                None => element.usage.diagnose(
                    DiagnosticKind::UnknownChild,
                    format!(
                        "unknown value kind '{}' on element '{}' in namespace '{}'",
                        value.kind, node.label, namespace
                    ),
                ),
            }
        }

        Ok(element)
    }

    /// Resolution pass
    fn resolve(&mut self, namespace: &mut Namespace) -> Result<()> {
        let labels: Vec<String> = namespace.elements.keys().cloned().collect();

        // Every base is marked before any element claims anything
        for label in &labels {
            let has_parents = namespace
                .parents
                .get(label)
                .is_some_and(|parents| !parents.is_empty());
            if has_parents {
                continue;
            }
            if let Some(element) = namespace.elements.get_mut(label) {
                element.is_defined = true;
                namespace.bases.push(label.clone());
            }
        }

        for label in &labels {
            let children = match namespace.elements.get_mut(label) {
                Some(element) => std::mem::take(&mut element.children),
                None => continue,
            };

            let mut properties = Vec::new();
            let mut definitions = Vec::new();
            let mut usage = Usage::default();

            for child in &children {
                // Nested declarations are rendered only through claims
                let ChildNode::Value(value) = child else {
                    continue;
                };

                let Some((renderable, child_usage)) =
                    ValueRenderer::new(self.registry, &namespace.label).build(value)?
                else {
                    usage.diagnose(
                        DiagnosticKind::UnknownChild,
                        format!(
                            "unknown child kind '{}' under '{}' in namespace '{}'",
                            value.kind, label, namespace.label
                        ),
                    );
                    continue;
                };

                properties.push(renderable.property_line());
                usage.merge(child_usage);
                self.claim_references(&renderable, label, namespace, &mut definitions, &mut usage);
            }

            if let Some(element) = namespace.elements.get_mut(label) {
                element.children = children;
                element.properties = properties;
                element.definitions = definitions;
                element.usage.merge(usage);
            }
        }

        Ok(())
    }

    /// Claim every local, declared, undefined label a child points at
    fn claim_references(
        &self,
        renderable: &RenderableValue,
        owner: &str,
        namespace: &mut Namespace,
        definitions: &mut Vec<String>,
        usage: &mut Usage,
    ) {
        for reference in renderable.references() {
            if reference.namespace != namespace.label {
                usage.add_use(&reference.namespace);
                continue;
            }
            if reference.label.is_empty() || reference.label == owner {
                continue;
            }

            match namespace.elements.get_mut(&reference.label) {
                Some(target) if !target.is_defined => {
                    target.is_defined = true;
                    definitions.push(reference.label);
                }
                Some(_) => {}
                None => usage.diagnose(
                    DiagnosticKind::UnresolvedLabel,
                    format!(
                        "'{}' references '{}', which is not declared in namespace '{}'",
                        owner, reference.label, namespace.label
                    ),
                ),
            }
        }
    }

    /// Promote elements no base can reach until every element is rendered
    fn promote_unreachable(&mut self, namespace: &mut Namespace) {
        loop {
            let reachable = reachable_from_bases(namespace);
            let Some(orphan) = namespace
                .elements
                .keys()
                .find(|label| !reachable.contains(label.as_str()))
                .cloned()
            else {
                break;
            };

            for element in namespace.elements.values_mut() {
                element.definitions.retain(|label| *label != orphan);
            }
            if let Some(element) = namespace.elements.get_mut(&orphan) {
                element.is_defined = true;
            }

            self.diagnostics.push(Diagnostic::new(
                DiagnosticKind::NestingCycle,
                format!(
                    "element '{}' in namespace '{}' is not reachable from any top-level element; rendering it at top level",
                    orphan, namespace.label
                ),
            ));
            namespace.bases.push(orphan);
        }
    }
}

/// Labels a value can point at for membership purposes
///
/// An identifiable value whose first constraint is a TypeConstraint points
/// at the narrowed types instead of its own identifier.
fn membership_candidates(value: &ValueNode) -> Vec<Identifier> {
    match ValueKind::from_tag(&value.kind) {
        Some(ValueKind::Identifiable) => {
            let narrowed = value
                .constraints
                .first()
                .is_some_and(|record| ConstraintKind::of(record) == ConstraintKind::Type);
            if narrowed {
                value
                    .constraints
                    .iter()
                    .filter(|record| ConstraintKind::of(record) == ConstraintKind::Type)
                    .map(|record| record.is_a.identifier())
                    .collect()
            } else {
                vec![value.identifier.clone()]
            }
        }
        Some(ValueKind::Choice) => value
            .value
            .iter()
            .map(|alternative| alternative.identifier.clone())
            .collect(),
        _ => Vec::new(),
    }
}

fn reachable_from_bases(namespace: &Namespace) -> HashSet<&str> {
    let mut reachable = HashSet::new();
    let mut stack: Vec<&str> = namespace.bases.iter().map(String::as_str).collect();

    while let Some(label) = stack.pop() {
        if !reachable.insert(label) {
            continue;
        }
        if let Some(element) = namespace.elements.get(label) {
            stack.extend(element.definitions.iter().map(String::as_str));
        }
    }
    reachable
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exportable::{DEFINITION_INDENT, Exportable};
    use serde_json::json;

    fn process(node: serde_json::Value) -> (Namespace, Vec<Diagnostic>) {
        let node: NamespaceNode = serde_json::from_value(node).unwrap();
        let mut registry = CodeSystemRegistry::with_builtin();
        let mut processor = NamespaceProcessor::new(&mut registry);
        let namespace = processor.process(&node).unwrap();
        (namespace, processor.take_diagnostics())
    }

    fn element(label: &str, children: serde_json::Value) -> serde_json::Value {
        json!({"type": "DataElement", "label": label, "children": children})
    }

    fn child(label: &str) -> serde_json::Value {
        json!({
            "type": "IdentifiableValue",
            "identifier": {"label": label, "namespace": "shr.test"},
            "min": 0, "max": 1
        })
    }

    fn count_titles(text: &str, label: &str) -> usize {
        text.lines()
            .filter(|line| line.trim_start() == labeled("Element:", label))
            .count()
    }

    #[test]
    fn test_base_nests_local_child() {
        let (namespace, diagnostics) = process(json!({
            "label": "shr.test",
            "children": [
                element("Parent", json!([child("Child")])),
                element("Child", json!([]))
            ]
        }));

        assert!(diagnostics.is_empty());
        assert_eq!(namespace.bases, vec!["Parent"]);
        assert_eq!(namespace.elements["Parent"].definitions, vec!["Child"]);

        let text = namespace.to_text();
        let nested_title = format!(
            "{:indent$}{}",
            "",
            labeled("Element:", "Child"),
            indent = DEFINITION_INDENT
        );
        assert!(text.contains(&nested_title));
        assert!(text.contains(&format!("{:20}Child", "0..1")));
    }

    #[test]
    fn test_first_claim_wins() {
        let (namespace, _) = process(json!({
            "label": "shr.test",
            "children": [
                element("First", json!([child("Shared")])),
                element("Second", json!([child("Shared")])),
                element("Shared", json!([]))
            ]
        }));

        assert_eq!(namespace.elements["First"].definitions, vec!["Shared"]);
        assert!(namespace.elements["Second"].definitions.is_empty());
        // The second sibling still lists the property
        assert_eq!(namespace.elements["Second"].properties.len(), 1);
        assert_eq!(count_titles(&namespace.to_text(), "Shared"), 1);
    }

    #[test]
    fn test_bases_are_never_claimed() {
        // `Later` has no parents (ref values are not membership edges) so it
        // stays a base even though `Earlier` refers to it.
        let (namespace, _) = process(json!({
            "label": "shr.test",
            "children": [
                element("Earlier", json!([
                    {"type": "RefValue", "identifier": {"label": "Later", "namespace": "shr.test"}}
                ])),
                element("Later", json!([]))
            ]
        }));

        assert_eq!(namespace.bases, vec!["Earlier", "Later"]);
        assert!(namespace.elements["Earlier"].definitions.is_empty());
    }

    #[test]
    fn test_foreign_references_become_uses() {
        let (namespace, _) = process(json!({
            "label": "shr.test",
            "children": [
                element("Obs", json!([
                    {"type": "IdentifiableValue", "identifier": {"label": "Code", "namespace": "shr.core"}},
                    {"type": "IdentifiableValue", "identifier": {"label": "string", "namespace": "primitive"}}
                ]))
            ]
        }));

        assert!(namespace.uses.contains("shr.core"));
        let header = namespace.build_header();
        assert!(header.contains(&labeled("Uses:", "shr.core")));
        assert!(!header.contains("primitive"));
    }

    #[test]
    fn test_narrowed_type_is_nested() {
        let (namespace, _) = process(json!({
            "label": "shr.test",
            "children": [
                element("Finding", json!([{
                    "type": "IdentifiableValue",
                    "identifier": {"label": "Result", "namespace": "shr.core"},
                    "constraints": [
                        {"type": "TypeConstraint", "isA": {"_name": "Panel", "_namespace": "shr.test"}}
                    ]
                }])),
                element("Panel", json!([]))
            ]
        }));

        assert_eq!(namespace.bases, vec!["Finding"]);
        assert_eq!(namespace.elements["Finding"].definitions, vec!["Panel"]);
        assert!(namespace.uses.contains("shr.core"));
    }

    #[test]
    fn test_cycle_is_broken_with_diagnostic() {
        let (namespace, diagnostics) = process(json!({
            "label": "shr.test",
            "children": [
                element("A", json!([child("B")])),
                element("B", json!([child("A")]))
            ]
        }));

        assert_eq!(namespace.bases, vec!["A"]);
        assert_eq!(namespace.elements["A"].definitions, vec!["B"]);
        assert!(namespace.elements["B"].definitions.is_empty());
        assert!(
            diagnostics
                .iter()
                .any(|d| d.kind == DiagnosticKind::NestingCycle)
        );

        let text = namespace.to_text();
        assert_eq!(count_titles(&text, "A"), 1);
        assert_eq!(count_titles(&text, "B"), 1);
    }

    #[test]
    fn test_every_element_rendered_once() {
        let (namespace, _) = process(json!({
            "label": "shr.test",
            "children": [
                element("Root", json!([child("Mid"), child("Leaf")])),
                element("Mid", json!([child("Leaf"), child("Deep")])),
                element("Leaf", json!([])),
                element("Deep", json!([child("Root")])),
                element("Loner", json!([]))
            ]
        }));

        let text = namespace.to_text();
        for label in ["Root", "Mid", "Leaf", "Deep", "Loner"] {
            assert_eq!(count_titles(&text, label), 1, "{label} rendered wrong");
        }
    }

    #[test]
    fn test_nested_declarations_are_registered() {
        let (namespace, _) = process(json!({
            "label": "shr.test",
            "children": [
                element("Outer", json!([
                    child("Inner"),
                    element("Inner", json!([]))
                ]))
            ]
        }));

        assert_eq!(namespace.elements.len(), 2);
        assert_eq!(namespace.elements["Outer"].definitions, vec!["Inner"]);
        // Nested declarations do not show up as properties
        assert_eq!(namespace.elements["Outer"].properties.len(), 1);
    }

    #[test]
    fn test_element_lines() {
        let (namespace, _) = process(json!({
            "label": "shr.test",
            "children": [{
                "type": "DataElement",
                "label": "Dose",
                "isEntry": true,
                "description": "Amount given",
                "basedOn": [{"label": "Quantity", "namespace": "shr.core"}],
                "concepts": [
                    {"code": "123", "system": "http://snomed.info/sct"},
                    {"code": "9", "system": "http://example.com"}
                ],
                "value": {
                    "type": "IdentifiableValue",
                    "identifier": {"label": "decimal", "namespace": "primitive"},
                    "min": 1, "max": 1
                }
            }]
        }));

        let text = namespace.to_text();
        assert!(text.contains(&labeled("EntryElement:", "Dose")));
        assert!(text.contains(&labeled("Based on:", "Quantity")));
        assert!(text.contains(&labeled("Concept:", "SCT#123, AAA#9")));
        assert!(text.contains(&labeled("Description:", "\"Amount given\"")));
        assert!(text.contains(&labeled("Value:", "decimal")));
        assert!(text.contains(&labeled("CodeSystem:", "SCT = http://snomed.info/sct")));
        assert!(text.contains(&labeled("CodeSystem:", "AAA = http://example.com")));
    }

    #[test]
    fn test_concept_defaults_to_undetermined() {
        let (namespace, _) = process(json!({
            "label": "shr.test",
            "children": [element("Bare", json!([]))]
        }));
        assert_eq!(namespace.elements["Bare"].concept, labeled("Concept:", "TBD"));
    }

    #[test]
    fn test_unknown_child_kind_is_diagnosed() {
        let (namespace, diagnostics) = process(json!({
            "label": "shr.test",
            "children": [element("Odd", json!([{"type": "Mystery"}]))]
        }));

        assert!(namespace.elements["Odd"].properties.is_empty());
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].kind, DiagnosticKind::UnknownChild);
        assert!(diagnostics[0].message.contains("Mystery"));
    }

    #[test]
    fn test_duplicate_label_keeps_last() {
        let (namespace, diagnostics) = process(json!({
            "label": "shr.test",
            "children": [
                {"type": "DataElement", "label": "Twice", "description": "first"},
                {"type": "DataElement", "label": "Twice", "description": "second"}
            ]
        }));

        assert_eq!(namespace.elements.len(), 1);
        assert_eq!(namespace.elements["Twice"].description, "second");
        assert_eq!(diagnostics[0].kind, DiagnosticKind::DuplicateLabel);
    }

    #[test]
    fn test_undeclared_local_label_is_diagnosed() {
        let (namespace, diagnostics) = process(json!({
            "label": "shr.test",
            "children": [element("Holder", json!([child("Ghost")]))]
        }));

        assert!(namespace.elements["Holder"].definitions.is_empty());
        assert!(
            diagnostics
                .iter()
                .any(|d| d.kind == DiagnosticKind::UnresolvedLabel)
        );
    }

    #[test]
    fn test_allocation_follows_declaration_order() {
        let node = json!({
            "label": "shr.test",
            "children": [
                {"type": "DataElement", "label": "One", "concepts": [{"code": "1", "system": "http://one.org"}]},
                {"type": "DataElement", "label": "Two", "concepts": [{"code": "2", "system": "http://two.org"}]}
            ]
        });

        let (first, _) = process(node.clone());
        let (second, _) = process(node);
        assert_eq!(first.to_text(), second.to_text());
        assert_eq!(first.elements["One"].concept, labeled("Concept:", "AAA#1"));
        assert_eq!(first.elements["Two"].concept, labeled("Concept:", "AAB#2"));
    }
}
