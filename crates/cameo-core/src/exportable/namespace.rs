//! Namespace file rendering

use super::{DataElement, Exportable, join_non_empty, labeled, quoted};
use crate::models::GrammarVersion;
use indexmap::IndexMap;
use std::collections::BTreeSet;

/// Dependency name that never appears on a `Uses:` line
pub const PRIMITIVE_NAMESPACE: &str = "primitive";

/// A fully resolved namespace
#[derive(Debug, Clone, Default)]
pub struct Namespace {
    pub label: String,
    pub description: String,
    pub version: GrammarVersion,
    /// Every declared element, in declaration order
    pub elements: IndexMap<String, DataElement>,
    /// Child label → labels of the elements that reference it
    pub parents: IndexMap<String, Vec<String>>,
    /// Elements rendered at top level
    pub bases: Vec<String>,
    /// Other namespaces referenced
    pub uses: BTreeSet<String>,
}

impl Namespace {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            ..Default::default()
        }
    }

    /// `Description:` and `Uses:` are always present, even when empty
    pub fn build_header(&self) -> String {
        let uses: Vec<&str> = self
            .uses
            .iter()
            .map(String::as_str)
            .filter(|ns| !ns.is_empty() && *ns != PRIMITIVE_NAMESPACE && *ns != self.label)
            .collect();

        [
            labeled("Grammar:", &format!("DataElement {}", self.version.short())),
            labeled("Namespace:", &self.label),
            labeled("Description:", &quoted(&self.description)),
            labeled("Uses:", &uses.join(", ")).trim_end().to_string(),
        ]
        .join("\n")
    }

    /// `CodeSystem:` table, first use first
    pub fn build_code_systems(&self) -> String {
        let mut systems: IndexMap<&str, &str> = IndexMap::new();
        for element in self.elements.values() {
            for (system, abbreviation) in &element.usage.code_systems {
                systems
                    .entry(system.as_str())
                    .or_insert(abbreviation.as_str());
            }
        }

        systems
            .iter()
            .map(|(system, abbreviation)| {
                labeled("CodeSystem:", &format!("{} = {}", abbreviation, system))
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    pub fn build_body(&self) -> String {
        let blocks: Vec<String> = self
            .bases
            .iter()
            .filter_map(|label| self.elements.get(label))
            .map(|element| element.render(&self.elements))
            .collect();
        join_non_empty(&blocks, "\n\n")
    }
}

impl Exportable for Namespace {
    fn to_text(&self) -> String {
        join_non_empty(
            &[
                self.build_header(),
                self.build_code_systems(),
                self.build_body(),
            ],
            "\n\n",
        )
    }

    fn name(&self) -> &str {
        &self.label
    }

    fn file_stem(&self) -> String {
        self.label.replace('.', "_")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn namespace() -> Namespace {
        let mut ns = Namespace::new("shr.test");
        ns.version = GrammarVersion {
            major: 5,
            minor: 2,
            patch: 1,
        };
        ns
    }

    #[test]
    fn test_header_keeps_empty_description_and_uses() {
        let ns = namespace();
        assert_eq!(
            ns.build_header(),
            format!(
                "{:20}DataElement 5.2\n{:20}shr.test\n{:20}\"\"\nUses:",
                "Grammar:", "Namespace:", "Description:"
            )
        );
    }

    #[test]
    fn test_uses_sorted_and_filtered() {
        let mut ns = namespace();
        ns.description = "Test namespace".to_string();
        for dependency in ["shr.entity", "primitive", "shr.test", "shr.core", ""] {
            ns.uses.insert(dependency.to_string());
        }

        let header = ns.build_header();
        assert!(header.contains(&labeled("Description:", "\"Test namespace\"")));
        assert!(header.ends_with(&labeled("Uses:", "shr.core, shr.entity")));
    }

    #[test]
    fn test_code_system_table_deduplicated() {
        let mut ns = namespace();
        let mut first = DataElement::new("A", "shr.test");
        first.usage.record_code_system("http://loinc.org", "LNC");
        let mut second = DataElement::new("B", "shr.test");
        second.usage.record_code_system("http://example.com", "AAA");
        second.usage.record_code_system("http://loinc.org", "LNC");
        ns.elements.insert("A".to_string(), first);
        ns.elements.insert("B".to_string(), second);

        assert_eq!(
            ns.build_code_systems(),
            format!(
                "{:20}LNC = http://loinc.org\n{:20}AAA = http://example.com",
                "CodeSystem:", "CodeSystem:"
            )
        );
    }

    #[test]
    fn test_file_stem() {
        assert_eq!(namespace().file_stem(), "shr_test");
    }

    #[test]
    fn test_sections_separated_by_blank_line() {
        let mut ns = namespace();
        ns.elements
            .insert("A".to_string(), DataElement::new("A", "shr.test"));
        ns.elements
            .insert("B".to_string(), DataElement::new("B", "shr.test"));
        ns.bases = vec!["A".to_string(), "B".to_string()];

        let text = ns.to_text();
        let sections: Vec<&str> = text.split("\n\n").collect();
        assert_eq!(sections.len(), 3);
        assert!(sections[1].starts_with("Element:"));
        assert!(sections[2].ends_with("B"));
    }
}
