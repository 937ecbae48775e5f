//! Namespace and data-element declaration records

use super::{Cardinality, Coding, ConstraintRecord, GrammarVersion, Identifier, MaxCardinality};
use super::common::null_as_default;
use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize};

/// `type` tag of data-element declarations
pub const DATA_ELEMENT: &str = "DataElement";

/// One namespace of data-element declarations
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct NamespaceNode {
    #[serde(deserialize_with = "null_as_default")]
    pub label: String,
    #[serde(deserialize_with = "null_as_default")]
    pub description: String,
    #[serde(deserialize_with = "null_as_default")]
    pub grammar_version: GrammarVersion,
    #[serde(deserialize_with = "null_as_default")]
    pub children: Vec<ChildNode>,
}

/// A data-element declaration
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct DataElementNode {
    #[serde(deserialize_with = "null_as_default")]
    pub label: String,
    #[serde(deserialize_with = "null_as_default")]
    pub concepts: Vec<Coding>,
    #[serde(deserialize_with = "null_as_default")]
    pub based_on: Vec<Identifier>,
    #[serde(deserialize_with = "null_as_default")]
    pub description: String,
    #[serde(deserialize_with = "null_as_default")]
    pub is_entry: bool,
    #[serde(deserialize_with = "null_as_default")]
    pub is_abstract: bool,
    pub value: Option<ValueNode>,
    #[serde(deserialize_with = "null_as_default")]
    pub children: Vec<ChildNode>,
}

/// A value slot, property, or choice alternative
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ValueNode {
    #[serde(rename = "type", deserialize_with = "null_as_default")]
    pub kind: String,
    #[serde(deserialize_with = "null_as_default")]
    pub label: String,
    #[serde(deserialize_with = "null_as_default")]
    pub identifier: Identifier,
    pub min: Option<u64>,
    pub max: Option<MaxCardinality>,
    #[serde(deserialize_with = "null_as_default")]
    pub constraints: Vec<ConstraintRecord>,
    /// Alternatives of a `ChoiceValue`
    #[serde(deserialize_with = "null_as_default")]
    pub value: Vec<ValueNode>,
    #[serde(deserialize_with = "null_as_default")]
    pub text: String,
    #[serde(deserialize_with = "null_as_default")]
    pub raw_path: Vec<String>,
}

impl ValueNode {
    pub fn cardinality(&self) -> Cardinality {
        Cardinality::new(self.min, self.max.clone())
    }
}

/// Child of a namespace or element: a nested declaration or a value record
#[derive(Debug, Clone)]
pub enum ChildNode {
    Element(Box<DataElementNode>),
    Value(ValueNode),
}

impl ChildNode {
    /// The record's `type` tag
    pub fn kind(&self) -> &str {
        match self {
            ChildNode::Element(_) => DATA_ELEMENT,
            ChildNode::Value(value) => &value.kind,
        }
    }
}

impl<'de> Deserialize<'de> for ChildNode {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = serde_json::Value::deserialize(deserializer)?;
        let is_element = raw.get("type").and_then(serde_json::Value::as_str) == Some(DATA_ELEMENT);

        if is_element {
            serde_json::from_value(raw)
                .map(|node| ChildNode::Element(Box::new(node)))
                .map_err(de::Error::custom)
        } else {
            serde_json::from_value(raw)
                .map(ChildNode::Value)
                .map_err(de::Error::custom)
        }
    }
}
