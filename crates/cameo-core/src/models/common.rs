//! Common record types shared by element and value-set declarations

use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// Coded value: system URI, code and optional display text
///
/// Value-set rule records carry their display text under `label`; element
/// constraints use `display`. Both are kept so renderers can fall back.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct Coding {
    #[serde(deserialize_with = "string_or_number")]
    pub code: String,
    #[serde(deserialize_with = "null_as_default")]
    pub system: String,
    #[serde(deserialize_with = "null_as_default")]
    pub display: String,
    #[serde(deserialize_with = "null_as_default")]
    pub label: String,
}

impl Coding {
    /// Display text, preferring `display` over `label`
    pub fn display_text(&self) -> &str {
        if self.display.is_empty() {
            &self.label
        } else {
            &self.display
        }
    }
}

/// Reference to a declaration by label and owning namespace
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(default)]
pub struct Identifier {
    #[serde(deserialize_with = "null_as_default")]
    pub label: String,
    #[serde(deserialize_with = "null_as_default")]
    pub namespace: String,
}

impl Identifier {
    pub fn new(label: impl Into<String>, namespace: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            namespace: namespace.into(),
        }
    }
}

/// Narrowed type target of a TypeConstraint (`isA`)
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct TypeRef {
    #[serde(rename = "_name", deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(rename = "_namespace", deserialize_with = "null_as_default")]
    pub namespace: String,
}

impl TypeRef {
    pub fn identifier(&self) -> Identifier {
        Identifier::new(self.name.clone(), self.namespace.clone())
    }
}

/// `grammarVersion { major, minor, patch }`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct GrammarVersion {
    #[serde(deserialize_with = "null_as_default")]
    pub major: u32,
    #[serde(deserialize_with = "null_as_default")]
    pub minor: u32,
    #[serde(deserialize_with = "null_as_default")]
    pub patch: u32,
}

impl GrammarVersion {
    /// `major.minor`, used by data-element headers
    pub fn short(&self) -> String {
        format!("{}.{}", self.major, self.minor)
    }
}

impl fmt::Display for GrammarVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

/// Upper cardinality bound: a count or the unbounded marker `*`
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum MaxCardinality {
    Count(u64),
    Text(String),
}

impl fmt::Display for MaxCardinality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MaxCardinality::Count(n) => write!(f, "{n}"),
            MaxCardinality::Text(s) => f.write_str(s),
        }
    }
}

/// Cardinality bounds as declared on a record
///
/// Absent bounds render as `0` and `*`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Cardinality {
    pub min: Option<u64>,
    pub max: Option<MaxCardinality>,
}

impl Cardinality {
    pub fn new(min: Option<u64>, max: Option<MaxCardinality>) -> Self {
        Self { min, max }
    }

    /// True when neither bound was declared
    pub fn is_unbounded(&self) -> bool {
        self.min.is_none() && self.max.is_none()
    }

    /// True for exactly `1..1`
    pub fn is_exactly_one(&self) -> bool {
        self.range() == "1..1"
    }

    /// `{min}..{max}` with absent bounds defaulted
    pub fn range(&self) -> String {
        let max = self
            .max
            .as_ref()
            .map(ToString::to_string)
            .unwrap_or_else(|| "*".to_string());
        format!("{}..{}", self.min.unwrap_or(0), max)
    }
}

/// Treat an explicit `null` like a missing field
pub(crate) fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Accept `"5"` or `5` for code fields
pub(crate) fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(match value {
        serde_json::Value::String(s) => s,
        serde_json::Value::Null => String::new(),
        other => other.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_cardinality_defaults() {
        let card = Cardinality::default();
        assert!(card.is_unbounded());
        assert_eq!(card.range(), "0..*");

        let card = Cardinality::new(Some(1), None);
        assert!(!card.is_unbounded());
        assert_eq!(card.range(), "1..*");
    }

    #[test]
    fn test_cardinality_exactly_one() {
        let card = Cardinality::new(Some(1), Some(MaxCardinality::Count(1)));
        assert!(card.is_exactly_one());
        assert_eq!(card.range(), "1..1");

        let card = Cardinality::new(Some(0), Some(MaxCardinality::Count(1)));
        assert!(!card.is_exactly_one());
    }

    #[test]
    fn test_max_cardinality_accepts_number_or_star() {
        let max: MaxCardinality = serde_json::from_value(json!(3)).unwrap();
        assert_eq!(max, MaxCardinality::Count(3));
        let max: MaxCardinality = serde_json::from_value(json!("*")).unwrap();
        assert_eq!(max.to_string(), "*");
    }

    #[test]
    fn test_coding_numeric_code() {
        let coding: Coding =
            serde_json::from_value(json!({"code": 5, "system": "http://loinc.org"})).unwrap();
        assert_eq!(coding.code, "5");
        assert_eq!(coding.display_text(), "");
    }

    #[test]
    fn test_null_fields_default() {
        let coding: Coding = serde_json::from_value(
            json!({"code": null, "system": "http://loinc.org", "display": null, "label": null}),
        )
        .unwrap();
        assert_eq!(coding.code, "");
        assert_eq!(coding.display_text(), "");

        let identifier: Identifier =
            serde_json::from_value(json!({"label": null, "namespace": "shr.core"})).unwrap();
        assert_eq!(identifier, Identifier::new("", "shr.core"));

        let version: GrammarVersion =
            serde_json::from_value(json!({"major": 5, "minor": null})).unwrap();
        assert_eq!(version.short(), "5.0");
    }

    #[test]
    fn test_grammar_version_formats() {
        let version: GrammarVersion =
            serde_json::from_value(json!({"major": 5, "minor": 1})).unwrap();
        assert_eq!(version.short(), "5.1");
        assert_eq!(version.to_string(), "5.1.0");
    }
}
