//! Coded value-set declaration records

use super::{Coding, GrammarVersion};
use super::common::null_as_default;
use serde::{Deserialize, Serialize};

/// One value-set declaration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ValueSetNode {
    #[serde(deserialize_with = "null_as_default")]
    pub label: String,
    #[serde(deserialize_with = "null_as_default")]
    pub namespace: String,
    #[serde(deserialize_with = "null_as_default")]
    pub grammar_version: GrammarVersion,
    #[serde(deserialize_with = "null_as_default")]
    pub description: String,
    #[serde(deserialize_with = "null_as_default")]
    pub concepts: Vec<Coding>,
    #[serde(deserialize_with = "null_as_default")]
    pub children: Vec<RuleNode>,
}

/// One inclusion rule of a value set
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct RuleNode {
    #[serde(rename = "type", deserialize_with = "null_as_default")]
    pub kind: String,
    #[serde(deserialize_with = "null_as_default")]
    pub code: Coding,
    /// Code-system URI of `ValueSetIncludesFromCodeSystemRule`
    #[serde(deserialize_with = "null_as_default")]
    pub system: String,
    #[serde(deserialize_with = "null_as_default")]
    pub label: String,
}
