//! Constraint records attached to element values and properties

use super::{Cardinality, Coding, MaxCardinality, TypeRef};
use super::common::null_as_default;
use serde::{Deserialize, Serialize};

/// One raw constraint record
///
/// The record is a union of every constraint shape; which fields matter is
/// decided by `kind` (the JSON `type` tag).
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ConstraintRecord {
    #[serde(rename = "type", deserialize_with = "null_as_default")]
    pub kind: String,
    #[serde(deserialize_with = "null_as_default")]
    pub path: String,
    #[serde(deserialize_with = "null_as_default")]
    pub binding_strength: String,
    #[serde(deserialize_with = "null_as_default")]
    pub valueset: String,
    #[serde(deserialize_with = "null_as_default")]
    pub code: Coding,
    pub value: Option<bool>,
    #[serde(deserialize_with = "null_as_default")]
    pub is_a: TypeRef,
    #[serde(deserialize_with = "null_as_default")]
    pub on_value: bool,
    pub min: Option<u64>,
    pub max: Option<MaxCardinality>,
}

impl ConstraintRecord {
    pub fn cardinality(&self) -> Cardinality {
        Cardinality::new(self.min, self.max.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_decode_type_constraint() {
        let record: ConstraintRecord = serde_json::from_value(json!({
            "type": "TypeConstraint",
            "isA": {"_name": "Coding", "_namespace": "shr.core"},
            "onValue": true
        }))
        .unwrap();

        assert_eq!(record.kind, "TypeConstraint");
        assert_eq!(record.is_a.name, "Coding");
        assert_eq!(record.is_a.namespace, "shr.core");
        assert!(record.on_value);
        assert!(record.cardinality().is_unbounded());
    }

    #[test]
    fn test_decode_value_set_constraint() {
        let record: ConstraintRecord = serde_json::from_value(json!({
            "type": "ValueSetConstraint",
            "valueset": "http://hl7.org/fhir/ValueSet/example",
            "bindingStrength": "EXTENSIBLE",
            "path": "shr.core.Coding"
        }))
        .unwrap();

        assert_eq!(record.binding_strength, "EXTENSIBLE");
        assert_eq!(record.path, "shr.core.Coding");
        assert_eq!(record.value, None);
    }
}
