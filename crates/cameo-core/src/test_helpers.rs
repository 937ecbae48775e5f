//! Test helpers and utilities for unit and integration testing
//!
//! This module provides:
//! - Test data builders for namespace and element records
//! - Grammar text validation helpers
//! - Common test fixtures

use crate::models::*;

/// Builder for creating test DataElementNode instances
pub struct TestElementBuilder {
    element: DataElementNode,
}

impl TestElementBuilder {
    /// Create a new builder with the given label
    pub fn new(label: &str) -> Self {
        Self {
            element: DataElementNode {
                label: label.to_string(),
                ..Default::default()
            },
        }
    }

    pub fn entry(mut self) -> Self {
        self.element.is_entry = true;
        self
    }

    pub fn with_description(mut self, description: &str) -> Self {
        self.element.description = description.to_string();
        self
    }

    pub fn with_concept(mut self, system: &str, code: &str) -> Self {
        self.element.concepts.push(Coding {
            code: code.to_string(),
            system: system.to_string(),
            ..Default::default()
        });
        self
    }

    pub fn based_on(mut self, label: &str, namespace: &str) -> Self {
        self.element.based_on.push(Identifier::new(label, namespace));
        self
    }

    pub fn with_value(mut self, value: ValueNode) -> Self {
        self.element.value = Some(value);
        self
    }

    /// Add a property referencing another element
    pub fn with_property(mut self, value: ValueNode) -> Self {
        self.element.children.push(ChildNode::Value(value));
        self
    }

    /// Declare a nested element inside this one
    pub fn with_nested(mut self, element: DataElementNode) -> Self {
        self.element.children.push(ChildNode::Element(Box::new(element)));
        self
    }

    pub fn build(self) -> DataElementNode {
        self.element
    }
}

/// Builder for creating test NamespaceNode instances
pub struct TestNamespaceBuilder {
    namespace: NamespaceNode,
}

impl TestNamespaceBuilder {
    pub fn new(label: &str) -> Self {
        Self {
            namespace: NamespaceNode {
                label: label.to_string(),
                grammar_version: GrammarVersion {
                    major: 5,
                    minor: 0,
                    patch: 1,
                },
                ..Default::default()
            },
        }
    }

    pub fn with_description(mut self, description: &str) -> Self {
        self.namespace.description = description.to_string();
        self
    }

    pub fn with_element(mut self, element: DataElementNode) -> Self {
        self.namespace
            .children
            .push(ChildNode::Element(Box::new(element)));
        self
    }

    pub fn build(self) -> NamespaceNode {
        self.namespace
    }
}

/// An `IdentifiableValue` referencing `label` in `namespace`
pub fn identifiable(label: &str, namespace: &str, min: u64, max: Option<u64>) -> ValueNode {
    ValueNode {
        kind: "IdentifiableValue".to_string(),
        identifier: Identifier::new(label, namespace),
        min: Some(min),
        max: Some(match max {
            Some(count) => MaxCardinality::Count(count),
            None => MaxCardinality::Text("*".to_string()),
        }),
        ..Default::default()
    }
}

/// Grammar text validation helpers
pub mod text_validation {
    /// Assert that grammar output contains expected lines
    pub fn assert_text_contains(text: &str, expected_lines: &[&str]) {
        for line in expected_lines {
            assert!(
                text.contains(line),
                "Expected line not found in output:\n  Expected: {}\n  Actual output:\n{}",
                line,
                text
            );
        }
    }

    /// Assert that grammar output does NOT contain specific lines
    pub fn assert_text_not_contains(text: &str, unexpected_lines: &[&str]) {
        for line in unexpected_lines {
            assert!(
                !text.contains(line),
                "Unexpected line found in output:\n  Unexpected: {}\n  Actual output:\n{}",
                line,
                text
            );
        }
    }

    /// Assert that grammar output contains all lines in order
    pub fn assert_text_order(text: &str, ordered_lines: &[&str]) {
        let mut last_pos = 0;
        for (i, line) in ordered_lines.iter().enumerate() {
            match text[last_pos..].find(line) {
                Some(pos) => last_pos += pos + line.len(),
                None => panic!(
                    "Line {} not found in expected order.\n  Expected: {}\n  Output:\n{}",
                    i, line, text
                ),
            }
        }
    }

    /// Count non-overlapping occurrences of `needle`
    pub fn count_occurrences(text: &str, needle: &str) -> usize {
        text.matches(needle).count()
    }

    /// Normalize output for comparison (trims lines, drops blank ones)
    pub fn normalize_text(text: &str) -> String {
        text.lines()
            .map(|line| line.trim())
            .filter(|line| !line.is_empty())
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Common test fixtures
pub mod fixtures {
    use serde_json::{Value, json};

    /// A small two-namespace document with one value set
    pub fn sample_document() -> Value {
        json!({
            "label": "Sample",
            "children": [
                {
                    "type": "Namespaces",
                    "children": [
                        {
                            "label": "shr.core",
                            "description": "Core elements",
                            "grammarVersion": {"major": 5, "minor": 0, "patch": 1},
                            "children": [
                                {
                                    "type": "DataElement",
                                    "label": "Quantity",
                                    "value": {"type": "IdentifiableValue", "identifier": {"label": "decimal", "namespace": "primitive"}, "min": 1, "max": 1}
                                },
                                {
                                    "type": "DataElement",
                                    "label": "Status",
                                    "description": "Lifecycle state",
                                    "concepts": [{"code": "12345", "system": "http://snomed.info/sct"}],
                                    "value": {
                                        "type": "IdentifiableValue",
                                        "identifier": {"label": "code", "namespace": "primitive"},
                                        "min": 1,
                                        "max": 1,
                                        "constraints": [{
                                            "type": "ValueSetConstraint",
                                            "valueset": "urn:tbd:StatusVS",
                                            "bindingStrength": "REQUIRED"
                                        }]
                                    }
                                }
                            ]
                        },
                        {
                            "label": "shr.test",
                            "grammarVersion": {"major": 5, "minor": 0, "patch": 1},
                            "children": [
                                {
                                    "type": "DataElement",
                                    "label": "Observation",
                                    "isEntry": true,
                                    "children": [
                                        {"type": "IdentifiableValue", "identifier": {"label": "Finding", "namespace": "shr.test"}, "min": 0, "max": 1},
                                        {"type": "IdentifiableValue", "identifier": {"label": "Status", "namespace": "shr.core"}, "min": 1, "max": 1}
                                    ]
                                },
                                {
                                    "type": "DataElement",
                                    "label": "Finding",
                                    "value": {"type": "IdentifiableValue", "identifier": {"label": "string", "namespace": "primitive"}, "min": 1, "max": 1}
                                }
                            ]
                        }
                    ]
                },
                {
                    "type": "ValueSets",
                    "children": [
                        {
                            "label": "StatusVS",
                            "namespace": "shr.core",
                            "grammarVersion": {"major": 5, "minor": 0, "patch": 1},
                            "description": "Allowed states",
                            "children": [
                                {"type": "ValueSetIncludesCodeRule", "code": {"code": "active", "system": "http://hl7.org/fhir/status", "display": "Active"}},
                                {"type": "ValueSetIncludesFromCodeSystemRule", "system": "http://loinc.org"}
                            ]
                        }
                    ]
                }
            ]
        })
    }
}

#[cfg(test)]
mod test_helpers_tests {
    use super::text_validation::*;
    use super::*;

    #[test]
    fn test_element_builder() {
        let element = TestElementBuilder::new("Observation")
            .entry()
            .with_concept("http://loinc.org", "1234-5")
            .with_property(identifiable("Finding", "shr.test", 0, None))
            .with_nested(TestElementBuilder::new("Finding").build())
            .build();

        assert!(element.is_entry);
        assert_eq!(element.concepts[0].code, "1234-5");
        assert_eq!(element.children.len(), 2);
        assert_eq!(element.children[1].kind(), DATA_ELEMENT);
    }

    #[test]
    fn test_identifiable_cardinality() {
        assert_eq!(identifiable("A", "ns", 0, None).cardinality().range(), "0..*");
        assert_eq!(identifiable("A", "ns", 1, Some(1)).cardinality().range(), "1..1");
    }

    #[test]
    fn test_sample_document_decodes() {
        let document: Document = serde_json::from_value(fixtures::sample_document()).unwrap();
        assert!(document.section(NAMESPACES_SECTION).is_some());
        assert_eq!(document.section(VALUE_SETS_SECTION).unwrap().children.len(), 1);
    }

    #[test]
    fn test_text_assertions() {
        let text = "Grammar: DataElement 5.0\nNamespace: shr.test\n\nElement: A";
        assert_text_contains(text, &["Namespace: shr.test"]);
        assert_text_not_contains(text, &["EntryElement:"]);
        assert_text_order(text, &["Grammar:", "Namespace:", "Element: A"]);
        assert_eq!(count_occurrences(text, "Element"), 2);
        assert_eq!(normalize_text("  a  \n\n b "), "a\nb");
    }

    #[test]
    #[should_panic(expected = "not found in expected order")]
    fn test_order_assertion_fails() {
        assert_text_order("b\na", &["a", "b"]);
    }
}
