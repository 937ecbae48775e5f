//! Value-set rendering, grouped into one file per namespace

use super::{Exportable, LABEL_WIDTH, Usage, VALUE_SET_LABEL_WIDTH, join_non_empty};
use crate::models::GrammarVersion;
use std::collections::BTreeSet;

/// Label padded to the value-set label column
fn vs_labeled(label: &str, value: &str) -> String {
    format!("{:width$}{}", label, value, width = VALUE_SET_LABEL_WIDTH)
}

/// One rendered value set
#[derive(Debug, Clone, Default)]
pub struct ValueSet {
    pub label: String,
    pub namespace: String,
    pub version: GrammarVersion,
    pub description: String,
    /// Comma-joined `ABBR#code` list, empty when there are no concepts
    pub concepts: String,
    /// One rendered line per inclusion rule
    pub rules: Vec<String>,
    pub usage: Usage,
}

impl ValueSet {
    pub fn new(label: impl Into<String>, namespace: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            namespace: namespace.into(),
            ..Default::default()
        }
    }

    pub fn render(&self) -> String {
        let concepts = if self.concepts.is_empty() {
            String::new()
        } else {
            vs_labeled("Concept:", &self.concepts)
        };
        let description = if self.description.is_empty() {
            String::new()
        } else {
            vs_labeled("Description:", &self.description)
        };

        let mut lines = vec![vs_labeled("ValueSet:", &self.label), concepts, description];
        lines.extend(self.rules.iter().cloned());
        join_non_empty(&lines, "\n")
    }

    /// `CodeSystem:` lines for the systems this value set used
    pub fn code_system_lines(&self) -> impl Iterator<Item = String> + '_ {
        self.usage.code_systems.iter().map(|(system, abbreviation)| {
            format!(
                "{:width$}{} = {}",
                "CodeSystem:",
                abbreviation,
                system,
                width = LABEL_WIDTH
            )
        })
    }
}

/// All value sets that share a namespace
#[derive(Debug, Clone, Default)]
pub struct ValueSetNamespace {
    pub namespace: String,
    /// Taken from the first value set added
    pub version: GrammarVersion,
    pub value_sets: Vec<ValueSet>,
    /// Deduplicated, sorted `CodeSystem:` lines
    pub code_systems: BTreeSet<String>,
}

impl ValueSetNamespace {
    pub fn new(first: ValueSet) -> Self {
        let mut group = Self {
            namespace: first.namespace.clone(),
            version: first.version,
            ..Default::default()
        };
        group.add(first);
        group
    }

    pub fn add(&mut self, value_set: ValueSet) {
        self.code_systems.extend(value_set.code_system_lines());
        self.value_sets.push(value_set);
    }

    pub fn build_header(&self) -> String {
        format!(
            "{:width$}ValueSet {}\n{:width$}{}",
            "Grammar:",
            self.version,
            "Namespace:",
            self.namespace,
            width = LABEL_WIDTH
        )
    }
}

impl Exportable for ValueSetNamespace {
    fn to_text(&self) -> String {
        let code_systems = self
            .code_systems
            .iter()
            .cloned()
            .collect::<Vec<_>>()
            .join("\n");
        let value_sets = self
            .value_sets
            .iter()
            .map(ValueSet::render)
            .collect::<Vec<_>>()
            .join("\n\n");

        join_non_empty(&[self.build_header(), code_systems, value_sets], "\n\n")
    }

    fn name(&self) -> &str {
        &self.namespace
    }

    fn file_stem(&self) -> String {
        format!("{}_vs", self.namespace.replace('.', "_"))
    }
}
