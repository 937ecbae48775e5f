//! Top-level document and its section nodes

use super::common::null_as_default;
use serde::{Deserialize, Serialize};

/// `type` tag of the namespace collection section
pub const NAMESPACES_SECTION: &str = "Namespaces";
/// `type` tag of the value-set collection section
pub const VALUE_SETS_SECTION: &str = "ValueSets";

/// The parsed input document
///
/// Section children stay as raw JSON so each namespace or value set can be
/// decoded (and fail) independently of its siblings.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Document {
    #[serde(deserialize_with = "null_as_default")]
    pub label: String,
    #[serde(deserialize_with = "null_as_default")]
    pub children: Vec<SectionNode>,
}

/// A top-level collection node (`Namespaces` or `ValueSets`)
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct SectionNode {
    #[serde(rename = "type", deserialize_with = "null_as_default")]
    pub kind: String,
    #[serde(deserialize_with = "null_as_default")]
    pub label: String,
    #[serde(deserialize_with = "null_as_default")]
    pub children: Vec<serde_json::Value>,
}

impl Document {
    /// Find the first section with the given `type` tag
    pub fn section(&self, kind: &str) -> Option<&SectionNode> {
        self.children.iter().find(|section| section.kind == kind)
    }
}
