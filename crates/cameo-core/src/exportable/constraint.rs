//! Constraint rendering
//!
//! A constrained value carries an ordered list of constraint records. The
//! whole list is rendered as one unit, dispatching on the first record's
//! kind.

use super::{DiagnosticKind, LABEL_WIDTH, Rendered, Usage, code_text};
use crate::Result;
use crate::models::ConstraintRecord;
use crate::registry::CodeSystemRegistry;
use std::collections::BTreeMap;
use tracing::debug;

/// Value-set URIs under this prefix are abbreviated to their last segment
pub const INTERNAL_VALUE_SET_PREFIX: &str = "http://standardhealthrecord.org/shr/";

/// Value-set URIs containing this fragment are still to be determined
pub const UNRESOLVED_VALUE_SET_SCHEME: &str = "urn:tbd";

/// Label that renders code constraints as units
pub const QUANTITY_LABEL: &str = "Quantity";

/// Width of the `includes min..max` column
const INCLUDES_WIDTH: usize = 30;

/// Closed set of constraint kinds, keyed by the record's `type` tag
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConstraintKind {
    ValueSet,
    Code,
    Boolean,
    IncludesCode,
    Type,
    Card,
    IncludesType,
    Unknown(String),
}

impl ConstraintKind {
    pub fn from_tag(tag: &str) -> Self {
        match tag {
            "ValueSetConstraint" => ConstraintKind::ValueSet,
            "CodeConstraint" => ConstraintKind::Code,
            "BooleanConstraint" => ConstraintKind::Boolean,
            "IncludesCodeConstraint" => ConstraintKind::IncludesCode,
            "TypeConstraint" => ConstraintKind::Type,
            "CardConstraint" => ConstraintKind::Card,
            "IncludesTypeConstraint" => ConstraintKind::IncludesType,
            other => ConstraintKind::Unknown(other.to_string()),
        }
    }

    pub fn of(record: &ConstraintRecord) -> Self {
        Self::from_tag(&record.kind)
    }
}

/// Owning label extended with the trailing component of each `:` segment
///
/// `("Foo", "shr.core.Bar:shr.core.Baz")` becomes `Foo.Bar.Baz`.
pub fn dotted_path(label: &str, path: &str) -> String {
    if path.is_empty() {
        return label.to_string();
    }

    let mut dotted = label.to_string();
    for segment in path.split(':') {
        let component = segment.rsplit('.').next().unwrap_or(segment);
        dotted.push('.');
        dotted.push_str(component);
    }
    dotted
}

/// Renders constraint lists for one namespace
pub struct ConstraintRenderer<'a> {
    registry: &'a mut CodeSystemRegistry,
    namespace: &'a str,
}

impl<'a> ConstraintRenderer<'a> {
    pub fn new(registry: &'a mut CodeSystemRegistry, namespace: &'a str) -> Self {
        Self {
            registry,
            namespace,
        }
    }

    /// Render a list of records sharing the owning `label`
    ///
    /// An empty list renders as an empty string. An unknown kind also renders
    /// as an empty string and leaves a diagnostic in the usage report.
    pub fn render(&mut self, records: &[ConstraintRecord], label: &str) -> Result<Rendered> {
        let mut usage = Usage::default();
        let text = self.render_into(records, label, &mut usage)?;
        Ok(Rendered::new(text, usage))
    }

    fn render_into(
        &mut self,
        records: &[ConstraintRecord],
        label: &str,
        usage: &mut Usage,
    ) -> Result<String> {
        let Some(first) = records.first() else {
            return Ok(String::new());
        };

        match ConstraintKind::of(first) {
            ConstraintKind::ValueSet => Ok(render_value_set(first, label, usage)),
            ConstraintKind::Code => self.render_code(first, label, usage),
            ConstraintKind::Boolean => Ok(format!(
                "{} is {}",
                label,
                first.value.unwrap_or(false)
            )),
            ConstraintKind::IncludesCode => self.render_includes_code(records, label, usage),
            ConstraintKind::Type => Ok(render_type(records, label)),
            ConstraintKind::Card => self.render_card(records, label, usage),
            ConstraintKind::IncludesType => Ok(render_includes_type(records, label)),
            ConstraintKind::Unknown(tag) => {
                debug!("Unknown constraint kind '{}' on '{}'", tag, label);
                usage.diagnose(
                    DiagnosticKind::UnknownConstraint,
                    format!(
                        "unknown constraint kind '{}' on '{}' in namespace '{}'",
                        tag, label, self.namespace
                    ),
                );
                Ok(String::new())
            }
        }
    }

    fn render_code(
        &mut self,
        record: &ConstraintRecord,
        label: &str,
        usage: &mut Usage,
    ) -> Result<String> {
        let source = self.coding(record, usage)?;
        let conjunction = if label == QUANTITY_LABEL {
            "with units"
        } else {
            "is"
        };
        Ok(format!("{} {} {}", label, conjunction, source))
    }

    fn render_includes_code(
        &mut self,
        records: &[ConstraintRecord],
        label: &str,
        usage: &mut Usage,
    ) -> Result<String> {
        let mut includes = Vec::with_capacity(records.len());
        for record in records {
            includes.push(self.coding(record, usage)?);
        }
        Ok(format!("{} includes {}", label, includes.join(" includes ")))
    }

    /// `<range><path or nested constraint>` per record
    ///
    /// A non-card record directly after a card record on the same path
    /// constrains that path and is folded into the card line.
    fn render_card(
        &mut self,
        records: &[ConstraintRecord],
        label: &str,
        usage: &mut Usage,
    ) -> Result<String> {
        let mut lines = Vec::with_capacity(records.len());
        let mut index = 0;

        while index < records.len() {
            let record = &records[index];
            let path = dotted_path(label, &record.path);
            let mut body = path.clone();

            if let Some(next) = records.get(index + 1)
                && ConstraintKind::of(next) != ConstraintKind::Card
                && next.path == record.path
            {
                let nested = ConstraintRecord {
                    path: String::new(),
                    ..next.clone()
                };
                let text = self.render_into(std::slice::from_ref(&nested), &path, usage)?;
                if !text.is_empty() {
                    body = text;
                }
                index += 1;
            }

            lines.push(format!(
                "{:width$}{}",
                record.cardinality().range(),
                body,
                width = LABEL_WIDTH
            ));
            index += 1;
        }

        Ok(lines.join("\n"))
    }

    fn coding(&mut self, record: &ConstraintRecord, usage: &mut Usage) -> Result<String> {
        let code = &record.code;
        let abbreviation = self.registry.get(&code.system)?;
        usage.record_code_system(&code.system, &abbreviation);
        Ok(code_text(&abbreviation, &code.code, code.display_text()))
    }
}

fn render_value_set(record: &ConstraintRecord, label: &str, usage: &mut Usage) -> String {
    let uri = record.valueset.as_str();
    let target = if uri.contains(INTERNAL_VALUE_SET_PREFIX) {
        let mut segments = uri.trim_end_matches('/').rsplit('/');
        let name = segments.next().unwrap_or(uri).to_string();
        if let Some(namespace) = segments.next() {
            usage.add_use(namespace);
        }
        name
    } else if uri.contains(UNRESOLVED_VALUE_SET_SCHEME) {
        let fragment = uri.rsplit(':').next().unwrap_or(uri);
        format!("TBD \"{}\"", fragment)
    } else {
        uri.to_string()
    };

    let subject = dotted_path(label, &record.path);
    match record.binding_strength.as_str() {
        "EXTENSIBLE" => format!("{} from {} if covered", subject, target),
        "PREFERRED" => format!("{} should be from {}", subject, target),
        "EXAMPLE" => format!("{} could be from {}", subject, target),
        _ => format!("{} from {}", subject, target),
    }
}

fn render_type(records: &[ConstraintRecord], label: &str) -> String {
    records
        .iter()
        .map(|record| {
            if record.on_value {
                format!("{} value is type {}", label, record.is_a.name)
            } else {
                format!("{} is type {}", label, record.is_a.name)
            }
        })
        .collect::<Vec<_>>()
        .join(" or ")
}

fn render_includes_type(records: &[ConstraintRecord], label: &str) -> String {
    let mut groups: BTreeMap<String, Vec<&ConstraintRecord>> = BTreeMap::new();
    for record in records {
        groups
            .entry(dotted_path(label, &record.path))
            .or_default()
            .push(record);
    }

    let mut lines = Vec::new();
    for (path, group) in groups {
        lines.push(path);
        for record in group {
            let includes = format!("includes {}", record.cardinality().range());
            lines.push(format!(
                "{:width$}ref({})",
                includes,
                record.is_a.name,
                width = INCLUDES_WIDTH
            ));
        }
    }
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Coding, MaxCardinality, TypeRef};

    fn code_record(kind: &str, system: &str, code: &str, display: &str) -> ConstraintRecord {
        ConstraintRecord {
            kind: kind.to_string(),
            code: Coding {
                code: code.to_string(),
                system: system.to_string(),
                display: display.to_string(),
                ..Default::default()
            },
            ..Default::default()
        }
    }

    fn type_record(name: &str, on_value: bool) -> ConstraintRecord {
        ConstraintRecord {
            kind: "TypeConstraint".to_string(),
            is_a: TypeRef {
                name: name.to_string(),
                namespace: "shr.core".to_string(),
            },
            on_value,
            ..Default::default()
        }
    }

    fn render(records: &[ConstraintRecord], label: &str) -> Rendered {
        let mut registry = CodeSystemRegistry::with_builtin();
        ConstraintRenderer::new(&mut registry, "shr.test")
            .render(records, label)
            .unwrap()
    }

    #[test]
    fn test_dotted_path() {
        assert_eq!(dotted_path("Foo", ""), "Foo");
        assert_eq!(dotted_path("Foo", "shr.core.Bar"), "Foo.Bar");
        assert_eq!(
            dotted_path("Foo", "shr.core.Bar:shr.core.Baz"),
            "Foo.Bar.Baz"
        );
    }

    #[test]
    fn test_empty_list_renders_nothing() {
        let rendered = render(&[], "Foo");
        assert!(rendered.is_empty());
        assert!(rendered.usage.diagnostics.is_empty());
    }

    #[test]
    fn test_quantity_code_uses_units() {
        let rendered = render(
            &[code_record("CodeConstraint", "http://loinc.org", "5", "mg")],
            "Quantity",
        );
        assert_eq!(rendered.text, "Quantity with units LNC#5 \"mg\"");
        assert_eq!(rendered.usage.code_systems["http://loinc.org"], "LNC");
    }

    #[test]
    fn test_code_without_display() {
        let rendered = render(
            &[code_record("CodeConstraint", "http://snomed.info/sct", "123", "")],
            "Status",
        );
        assert_eq!(rendered.text, "Status is SCT#123");
    }

    #[test]
    fn test_undetermined_code_system_not_recorded() {
        let rendered = render(
            &[code_record("CodeConstraint", "urn:tbd", "x", "")],
            "Status",
        );
        assert_eq!(rendered.text, "Status is TBD#x");
        assert!(rendered.usage.code_systems.is_empty());
    }

    #[test]
    fn test_boolean_lowercase() {
        let record = ConstraintRecord {
            kind: "BooleanConstraint".to_string(),
            value: Some(true),
            ..Default::default()
        };
        assert_eq!(render(&[record], "Flag").text, "Flag is true");

        let record = ConstraintRecord {
            kind: "BooleanConstraint".to_string(),
            ..Default::default()
        };
        assert_eq!(render(&[record], "Flag").text, "Flag is false");
    }

    #[test]
    fn test_value_set_binding_strengths() {
        let record = |strength: &str| ConstraintRecord {
            kind: "ValueSetConstraint".to_string(),
            valueset: "http://hl7.org/fhir/ValueSet/units".to_string(),
            binding_strength: strength.to_string(),
            ..Default::default()
        };

        assert_eq!(
            render(&[record("EXTENSIBLE")], "Units").text,
            "Units from http://hl7.org/fhir/ValueSet/units if covered"
        );
        assert_eq!(
            render(&[record("PREFERRED")], "Units").text,
            "Units should be from http://hl7.org/fhir/ValueSet/units"
        );
        assert_eq!(
            render(&[record("EXAMPLE")], "Units").text,
            "Units could be from http://hl7.org/fhir/ValueSet/units"
        );
        assert_eq!(
            render(&[record("REQUIRED")], "Units").text,
            "Units from http://hl7.org/fhir/ValueSet/units"
        );
    }

    #[test]
    fn test_internal_value_set_is_shortened() {
        let record = ConstraintRecord {
            kind: "ValueSetConstraint".to_string(),
            valueset: "http://standardhealthrecord.org/shr/core/BodySiteVS".to_string(),
            path: "shr.core.Coding".to_string(),
            ..Default::default()
        };
        let rendered = render(&[record], "Site");
        assert_eq!(rendered.text, "Site.Coding from BodySiteVS");
        assert!(rendered.usage.uses.contains("core"));
        // Value-set URIs are not code systems
        assert!(rendered.usage.code_systems.is_empty());
    }

    #[test]
    fn test_unresolved_value_set() {
        let record = ConstraintRecord {
            kind: "ValueSetConstraint".to_string(),
            valueset: "urn:tbd:Reason codes".to_string(),
            ..Default::default()
        };
        assert_eq!(
            render(&[record], "Reason").text,
            "Reason from TBD \"Reason codes\""
        );
    }

    #[test]
    fn test_includes_code_joined() {
        let rendered = render(
            &[
                code_record("IncludesCodeConstraint", "http://loinc.org", "1", "one"),
                code_record("IncludesCodeConstraint", "http://snomed.info/sct", "2", ""),
            ],
            "Panel",
        );
        assert_eq!(
            rendered.text,
            "Panel includes LNC#1 \"one\" includes SCT#2"
        );
        assert_eq!(rendered.usage.code_systems.len(), 2);
    }

    #[test]
    fn test_type_constraints_joined_with_or() {
        let rendered = render(
            &[type_record("Coding", false), type_record("Quantity", true)],
            "Result",
        );
        assert_eq!(
            rendered.text,
            "Result is type Coding or Result value is type Quantity"
        );
    }

    #[test]
    fn test_card_folds_following_constraint_on_same_path() {
        let card = ConstraintRecord {
            kind: "CardConstraint".to_string(),
            path: "shr.core.Units".to_string(),
            min: Some(1),
            max: Some(MaxCardinality::Count(1)),
            ..Default::default()
        };
        let code = ConstraintRecord {
            path: "shr.core.Units".to_string(),
            ..code_record("CodeConstraint", "http://unitsofmeasure.org", "mg", "")
        };
        let other = ConstraintRecord {
            kind: "CardConstraint".to_string(),
            path: "shr.core.Note".to_string(),
            min: Some(0),
            ..Default::default()
        };

        let rendered = render(&[card, code, other], "Dose");
        assert_eq!(
            rendered.text,
            format!("{:20}Dose.Units is UCUM#mg\n{:20}Dose.Note", "1..1", "0..*")
        );
    }

    #[test]
    fn test_includes_type_grouped_and_sorted() {
        let record = |path: &str, name: &str| ConstraintRecord {
            kind: "IncludesTypeConstraint".to_string(),
            path: path.to_string(),
            is_a: TypeRef {
                name: name.to_string(),
                namespace: "shr.core".to_string(),
            },
            min: Some(0),
            max: Some(MaxCardinality::Count(1)),
            ..Default::default()
        };

        let rendered = render(
            &[
                record("shr.core.Member", "Patient"),
                record("shr.core.Component", "Observation"),
                record("shr.core.Member", "Group"),
            ],
            "Panel",
        );
        let lines: Vec<&str> = rendered.text.lines().collect();
        assert_eq!(lines[0], "Panel.Component");
        assert!(lines[1].starts_with("includes 0..1 "));
        assert_eq!(lines[1].find("ref(Observation)"), Some(INCLUDES_WIDTH));
        assert_eq!(lines[2], "Panel.Member");
        assert_eq!(lines[3].find("ref(Patient)"), Some(INCLUDES_WIDTH));
        assert!(lines[4].ends_with("ref(Group)"));
    }

    #[test]
    fn test_unknown_kind_is_diagnosed() {
        let record = ConstraintRecord {
            kind: "FancyConstraint".to_string(),
            ..Default::default()
        };
        let rendered = render(&[record], "Foo");
        assert!(rendered.is_empty());
        assert_eq!(rendered.usage.diagnostics.len(), 1);
        assert_eq!(
            rendered.usage.diagnostics[0].kind,
            DiagnosticKind::UnknownConstraint
        );
        assert!(rendered.usage.diagnostics[0].message.contains("shr.test"));
    }
}
