//! ValueSet processor
//!
//! Converts value-set declarations into rendered ValueSets and groups them
//! into one ValueSetNamespace per namespace.

use crate::{
    Result,
    exportable::{
        Diagnostic, DiagnosticKind, Usage, VALUE_SET_LABEL_WIDTH, ValueSet, ValueSetNamespace,
        code_text,
    },
    models::{RuleNode, ValueSetNode},
    registry::CodeSystemRegistry,
};
use indexmap::IndexMap;
use tracing::debug;

/// Closed set of inclusion-rule kinds, keyed by the record's `type` tag
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RuleKind {
    FromCode,
    Code,
    Descendants,
    FromCodeSystem,
    Unknown(String),
}

impl RuleKind {
    pub fn from_tag(tag: &str) -> Self {
        match tag {
            "ValueSetIncludesFromCodeRule" => RuleKind::FromCode,
            "ValueSetIncludesCodeRule" => RuleKind::Code,
            "ValueSetIncludesDescendentsRule" => RuleKind::Descendants,
            "ValueSetIncludesFromCodeSystemRule" => RuleKind::FromCodeSystem,
            other => RuleKind::Unknown(other.to_string()),
        }
    }
}

/// ValueSet processor
pub struct ValueSetProcessor<'a> {
    registry: &'a mut CodeSystemRegistry,
}

impl<'a> ValueSetProcessor<'a> {
    /// Create a new ValueSet processor
    pub fn new(registry: &'a mut CodeSystemRegistry) -> Self {
        Self { registry }
    }

    /// Process a value-set declaration into a rendered ValueSet
    ///
    /// Diagnostics for unknown rule kinds are left in the value set's usage.
    pub fn process(&mut self, node: &ValueSetNode) -> Result<ValueSet> {
        debug!("Processing ValueSet '{}'", node.label);

        let mut value_set = ValueSet::new(node.label.clone(), node.namespace.clone());
        value_set.version = node.grammar_version;
        value_set.description = node.description.clone();

        let mut codes = Vec::with_capacity(node.concepts.len());
        for concept in &node.concepts {
            let abbreviation = self.registry.get(&concept.system)?;
            value_set
                .usage
                .record_code_system(&concept.system, &abbreviation);
            codes.push(format!("{}#{}", abbreviation, concept.code));
        }
        value_set.concepts = codes.join(", ");

        for rule in &node.children {
            if let Some(line) = self.render_rule(rule, &node.label, &mut value_set.usage)? {
                value_set.rules.push(line);
            }
        }

        debug!(
            "Created ValueSet '{}' with {} rules",
            value_set.label,
            value_set.rules.len()
        );

        Ok(value_set)
    }

    fn render_rule(
        &mut self,
        rule: &RuleNode,
        owner: &str,
        usage: &mut Usage,
    ) -> Result<Option<String>> {
        let kind = RuleKind::from_tag(&rule.kind);

        let system = match kind {
            RuleKind::FromCodeSystem => &rule.system,
            RuleKind::Unknown(ref tag) => {
                usage.diagnose(
                    DiagnosticKind::UnknownRule,
                    format!("unknown rule kind '{}' in value set '{}'", tag, owner),
                );
                return Ok(None);
            }
            _ => &rule.code.system,
        };
        let abbreviation = self.registry.get(system)?;
        usage.record_code_system(system, &abbreviation);

        let code = &rule.code;
        let line = match kind {
            RuleKind::FromCode => format!(
                "Includes codes from {}",
                code_text(&abbreviation, &code.code, code.display_text())
            ),
            RuleKind::Code => format!(
                "{:<width$}\"{}\"",
                format!("{}#{}", abbreviation, code.code),
                code.display_text(),
                width = VALUE_SET_LABEL_WIDTH
            ),
            RuleKind::Descendants => format!(
                "Includes codes descending from {}",
                code_text(&abbreviation, &code.code, code.display_text())
            ),
            RuleKind::FromCodeSystem => format!("Includes codes from {}", abbreviation),
            RuleKind::Unknown(_) => return Ok(None),
        };

        Ok(Some(line))
    }
}

/// Group value sets by namespace, first-seen namespace first
pub fn group_by_namespace(
    value_sets: impl IntoIterator<Item = ValueSet>,
) -> IndexMap<String, ValueSetNamespace> {
    let mut groups: IndexMap<String, ValueSetNamespace> = IndexMap::new();
    for value_set in value_sets {
        match groups.get_mut(&value_set.namespace) {
            Some(group) => group.add(value_set),
            None => {
                groups.insert(
                    value_set.namespace.clone(),
                    ValueSetNamespace::new(value_set),
                );
            }
        }
    }
    groups
}

/// Drain the diagnostics a value set collected while rendering
pub fn take_diagnostics(value_set: &mut ValueSet) -> Vec<Diagnostic> {
    std::mem::take(&mut value_set.usage.diagnostics)
}
