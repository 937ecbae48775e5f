//! Data-element rendering

use super::{DEFINITION_INDENT, Usage, indent, join_non_empty, labeled, quoted};
use crate::models::ChildNode;
use indexmap::IndexMap;

/// One data element of a namespace
///
/// Elements refer to each other only by label; the owning namespace holds
/// all of them, and nested definitions are looked up there at render time.
#[derive(Debug, Clone, Default)]
pub struct DataElement {
    pub label: String,
    pub namespace: String,
    pub is_entry: bool,
    pub is_abstract: bool,
    /// Rendered `Concept:` line
    pub concept: String,
    /// Rendered `Based on:` lines
    pub based_on: Vec<String>,
    pub description: String,
    /// Rendered `Value:` line, empty when there is no value slot
    pub value: String,
    /// Raw child records, parsed into properties during resolution
    pub children: Vec<ChildNode>,
    pub properties: Vec<String>,
    /// Labels of the elements nested under this one, in claim order
    pub definitions: Vec<String>,
    pub usage: Usage,
    /// Set once the element is rendered somewhere (as a base or nested)
    pub is_defined: bool,
}

impl DataElement {
    pub fn new(label: impl Into<String>, namespace: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            namespace: namespace.into(),
            ..Default::default()
        }
    }

    /// Header block: title, based-on, concept, description, value, properties
    pub fn render_header(&self) -> String {
        let title = if self.is_entry {
            "EntryElement:"
        } else {
            "Element:"
        };
        let description = if self.description.is_empty() {
            String::new()
        } else {
            labeled("Description:", &quoted(&self.description))
        };

        let mut lines = vec![labeled(title, &self.label)];
        lines.extend(self.based_on.iter().cloned());
        lines.push(self.concept.clone());
        lines.push(description);
        lines.push(self.value.clone());
        lines.extend(self.properties.iter().cloned());

        join_non_empty(&lines, "\n")
    }

    /// Full rendering including every claimed definition, indented
    pub fn render(&self, elements: &IndexMap<String, DataElement>) -> String {
        let mut blocks = vec![self.render_header()];
        blocks.extend(
            self.definitions
                .iter()
                .filter_map(|label| elements.get(label))
                .map(|nested| indent(&nested.render(elements), DEFINITION_INDENT)),
        );
        join_non_empty(&blocks, "\n\n")
    }
}
