//! Value slot and property rendering
//!
//! Every value record renders two ways: as a property line inside its
//! owner's property list, and as the `Value:` line of an element's own value
//! slot. Both share the cardinality range; the value-slot form drops it for
//! `1..1`.

use super::{ConstraintKind, ConstraintRenderer, LABEL_WIDTH, Usage, indent, labeled};
use crate::Result;
use crate::models::{Cardinality, ConstraintRecord, Identifier, ValueNode};
use crate::registry::CodeSystemRegistry;

/// Closed set of value kinds, keyed by the record's `type` tag
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    Identifiable,
    Ref,
    Choice,
    Placeholder,
    Incomplete,
}

impl ValueKind {
    /// `None` for tags that are not value records
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "IdentifiableValue" => Some(ValueKind::Identifiable),
            "RefValue" => Some(ValueKind::Ref),
            "ChoiceValue" => Some(ValueKind::Choice),
            "TBD" | "PlaceholderValue" => Some(ValueKind::Placeholder),
            "Incomplete" | "IncompleteValue" => Some(ValueKind::Incomplete),
            _ => None,
        }
    }
}

/// How rendered constraint text sits against the range column
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ConstraintLayout {
    /// Follows the owner's range; continuation lines align under it
    #[default]
    Aligned,
    /// Every line already starts with its own range
    Ranged,
}

impl ConstraintLayout {
    fn of(records: &[ConstraintRecord]) -> Self {
        match records.first().map(ConstraintKind::of) {
            Some(ConstraintKind::Card) => ConstraintLayout::Ranged,
            _ => ConstraintLayout::Aligned,
        }
    }
}

/// Identifiable or reference value
#[derive(Debug, Clone, PartialEq)]
pub struct ReferenceValue {
    pub identifier: Identifier,
    pub cardinality: Cardinality,
    /// Rendered constraint text, empty when unconstrained
    pub constraint: String,
    pub layout: ConstraintLayout,
    /// Types named by TypeConstraints, in record order
    pub narrowed: Vec<Identifier>,
}

/// Choice between alternative values
#[derive(Debug, Clone, PartialEq)]
pub struct ChoiceValue {
    pub cardinality: Cardinality,
    /// Rendered alternatives, empty ones dropped
    pub alternatives: Vec<String>,
    /// Identifiers of the non-placeholder alternatives
    pub options: Vec<Identifier>,
}

/// Placeholder for a value still to be determined
#[derive(Debug, Clone, PartialEq)]
pub struct PlaceholderValue {
    pub text: String,
    pub cardinality: Cardinality,
}

/// Raw-path value with a parallel constraint list
#[derive(Debug, Clone, PartialEq)]
pub struct IncompleteValue {
    /// One line per rendered constraint line, each with its range prefix
    pub lines: Vec<String>,
}

/// A value record ready to render
#[derive(Debug, Clone, PartialEq)]
pub enum RenderableValue {
    Identifiable(ReferenceValue),
    Ref(ReferenceValue),
    Choice(ChoiceValue),
    Placeholder(PlaceholderValue),
    Incomplete(IncompleteValue),
}

impl RenderableValue {
    pub fn cardinality(&self) -> Option<&Cardinality> {
        match self {
            RenderableValue::Identifiable(value) | RenderableValue::Ref(value) => {
                Some(&value.cardinality)
            }
            RenderableValue::Choice(choice) => Some(&choice.cardinality),
            RenderableValue::Placeholder(placeholder) => Some(&placeholder.cardinality),
            RenderableValue::Incomplete(_) => None,
        }
    }

    /// True when the body already carries its own range prefixes
    fn is_ranged(&self) -> bool {
        match self {
            RenderableValue::Identifiable(value) | RenderableValue::Ref(value) => {
                !value.constraint.is_empty() && value.layout == ConstraintLayout::Ranged
            }
            RenderableValue::Incomplete(_) => true,
            _ => false,
        }
    }

    /// Text after the range column
    fn body(&self) -> String {
        match self {
            RenderableValue::Identifiable(value) => {
                if value.constraint.is_empty() {
                    value.identifier.label.clone()
                } else {
                    value.constraint.clone()
                }
            }
            RenderableValue::Ref(value) => {
                if value.constraint.is_empty() {
                    format!("ref({})", value.identifier.label)
                } else {
                    value.constraint.clone()
                }
            }
            RenderableValue::Choice(choice) => choice.alternatives.join(" or "),
            RenderableValue::Placeholder(placeholder) => placeholder_text(&placeholder.text),
            RenderableValue::Incomplete(incomplete) => incomplete.lines.join("\n"),
        }
    }

    /// Line used inside the owner's property list
    ///
    /// The range column is blank only when no bound was declared.
    pub fn property_line(&self) -> String {
        let Some(cardinality) = self.cardinality().filter(|_| !self.is_ranged()) else {
            return self.body();
        };

        let range = if cardinality.is_unbounded() {
            String::new()
        } else {
            cardinality.range()
        };
        align_continuation(&format!("{:width$}{}", range, self.body(), width = LABEL_WIDTH))
    }

    /// `Value:` line of an element's own value slot
    pub fn value_line(&self) -> String {
        let Some(cardinality) = self.cardinality().filter(|_| !self.is_ranged()) else {
            return self.body();
        };

        if let RenderableValue::Placeholder(placeholder) = self
            && placeholder.text.is_empty()
        {
            return String::new();
        }

        let body = self.body();
        if body.is_empty() {
            return String::new();
        }

        let line = if cardinality.is_unbounded() || cardinality.is_exactly_one() {
            labeled("Value:", &body)
        } else {
            labeled("Value:", &format!("{} {}", cardinality.range(), body))
        };
        align_continuation(&line)
    }

    /// Identifiers this value points at, narrowed types first
    pub fn references(&self) -> Vec<Identifier> {
        match self {
            RenderableValue::Identifiable(value) => {
                let mut references = value.narrowed.clone();
                references.push(value.identifier.clone());
                references
            }
            RenderableValue::Ref(value) => vec![value.identifier.clone()],
            RenderableValue::Choice(choice) => choice.options.clone(),
            RenderableValue::Placeholder(_) | RenderableValue::Incomplete(_) => Vec::new(),
        }
    }
}

/// Shift every line after the first to the range column
fn align_continuation(text: &str) -> String {
    let mut lines = text.lines();
    let Some(first) = lines.next() else {
        return String::new();
    };

    let mut aligned = first.to_string();
    for line in lines {
        aligned.push('\n');
        aligned.push_str(&indent(line, LABEL_WIDTH));
    }
    aligned
}

fn placeholder_text(text: &str) -> String {
    format!("TBD \"{}\"", text)
}

/// Builds renderable values for one namespace
pub struct ValueRenderer<'a> {
    registry: &'a mut CodeSystemRegistry,
    namespace: &'a str,
}

impl<'a> ValueRenderer<'a> {
    pub fn new(registry: &'a mut CodeSystemRegistry, namespace: &'a str) -> Self {
        Self {
            registry,
            namespace,
        }
    }

    /// Build a value from its record
    ///
    /// Returns `None` for records whose `type` is not a value kind; the
    /// caller decides how to report them.
    pub fn build(&mut self, node: &ValueNode) -> Result<Option<(RenderableValue, Usage)>> {
        let Some(kind) = ValueKind::from_tag(&node.kind) else {
            return Ok(None);
        };

        let mut usage = Usage::default();
        let value = match kind {
            ValueKind::Identifiable => {
                RenderableValue::Identifiable(self.reference(node, &mut usage)?)
            }
            ValueKind::Ref => RenderableValue::Ref(self.reference(node, &mut usage)?),
            ValueKind::Choice => RenderableValue::Choice(self.choice(node, &mut usage)?),
            ValueKind::Placeholder => RenderableValue::Placeholder(PlaceholderValue {
                text: node.text.clone(),
                cardinality: node.cardinality(),
            }),
            ValueKind::Incomplete => {
                RenderableValue::Incomplete(self.incomplete(node, &mut usage)?)
            }
        };

        Ok(Some((value, usage)))
    }

    fn constraint_text(
        &mut self,
        records: &[ConstraintRecord],
        label: &str,
        usage: &mut Usage,
    ) -> Result<String> {
        let rendered =
            ConstraintRenderer::new(self.registry, self.namespace).render(records, label)?;
        usage.merge(rendered.usage);
        Ok(rendered.text)
    }

    fn reference(&mut self, node: &ValueNode, usage: &mut Usage) -> Result<ReferenceValue> {
        let constraint = self.constraint_text(&node.constraints, &node.identifier.label, usage)?;
        let narrowed = node
            .constraints
            .iter()
            .filter(|record| ConstraintKind::of(record) == ConstraintKind::Type)
            .filter(|record| !record.is_a.name.is_empty())
            .map(|record| record.is_a.identifier())
            .collect();

        Ok(ReferenceValue {
            identifier: node.identifier.clone(),
            cardinality: node.cardinality(),
            constraint,
            layout: ConstraintLayout::of(&node.constraints),
            narrowed,
        })
    }

    fn choice(&mut self, node: &ValueNode, usage: &mut Usage) -> Result<ChoiceValue> {
        let mut alternatives = Vec::with_capacity(node.value.len());
        let mut options = Vec::new();

        for alternative in &node.value {
            let label = &alternative.identifier.label;
            let kind = ValueKind::from_tag(&alternative.kind);
            let constraint = self.constraint_text(&alternative.constraints, label, usage)?;

            let text = if !constraint.is_empty() {
                constraint
            } else if kind == Some(ValueKind::Ref) {
                format!("ref({})", label)
            } else if kind == Some(ValueKind::Placeholder) {
                placeholder_text(&alternative.text)
            } else {
                label.clone()
            };

            if kind != Some(ValueKind::Placeholder) && !label.is_empty() {
                options.push(alternative.identifier.clone());
            }
            if !text.is_empty() {
                alternatives.push(text);
            }
        }

        Ok(ChoiceValue {
            cardinality: node.cardinality(),
            alternatives,
            options,
        })
    }

    /// Render the constraint list under the dotted raw path, then give each
    /// output line the range of the record it came from
    fn incomplete(&mut self, node: &ValueNode, usage: &mut Usage) -> Result<IncompleteValue> {
        let label = node.raw_path.join(".");
        let text = self.constraint_text(&node.constraints, &label, usage)?;

        let passthrough = node
            .constraints
            .first()
            .is_some_and(|record| ConstraintKind::of(record) == ConstraintKind::Card);
        if passthrough {
            return Ok(IncompleteValue {
                lines: text.lines().map(str::to_string).collect(),
            });
        }

        let lines = text
            .lines()
            .enumerate()
            .map(|(index, line)| {
                let range = node
                    .constraints
                    .get(index)
                    .map(ConstraintRecord::cardinality)
                    .filter(|cardinality| !cardinality.is_unbounded())
                    .map(|cardinality| cardinality.range())
                    .unwrap_or_default();
                format!("{:width$}{}", range, line, width = LABEL_WIDTH)
            })
            .collect();

        Ok(IncompleteValue { lines })
    }
}
