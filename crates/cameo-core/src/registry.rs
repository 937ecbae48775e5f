//! Code-system abbreviation registry
//!
//! Maps long code-system URIs to short mnemonic codes (`LNC`, `SCT`, ...).
//! Unknown systems get the next free synthetic code in the sequence
//! `AAA, AAB, ..., AAZ, ABA, ...`, skipping any code already in use.
//!
//! The registry is loaded once, passed by `&mut` to every processor, and
//! written back by the caller. Allocation order is visible in the output, so
//! callers must consult it in a fixed traversal order.

use crate::error::{CameoError, Result};
use indexmap::IndexMap;
use std::collections::HashSet;
use std::fs;
use std::path::Path;
use tracing::debug;

/// Identifier fragments that are never abbreviated
pub const BANNED_FRAGMENTS: &[&str] = &["urn:oid", "standardhealthrecord"];

/// Abbreviation marking a code system that is still to be determined
pub const UNDETERMINED: &str = "TBD";

/// Well-known code systems seeded by [`CodeSystemRegistry::with_builtin`]
const BUILTIN_CODE_SYSTEMS: &[(&str, &str)] = &[
    ("http://loinc.org", "LNC"),
    ("http://snomed.info/sct", "SCT"),
    ("http://unitsofmeasure.org", "UCUM"),
    ("http://www.nlm.nih.gov/research/umls/rxnorm", "RXN"),
    ("http://www.ama-assn.org/go/cpt", "CPT"),
    ("urn:tbd", UNDETERMINED),
];

const LETTERS: u32 = 26;
const SYNTHETIC_CAPACITY: u32 = LETTERS * LETTERS * LETTERS;

/// Code-system abbreviation registry
#[derive(Debug, Clone, Default)]
pub struct CodeSystemRegistry {
    /// URI → abbreviation, in allocation order
    codesystems: IndexMap<String, String>,
    in_use: HashSet<String>,
    /// Index of the next synthetic candidate (0 = `AAA`)
    cursor: u32,
}

impl CodeSystemRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry seeded with the built-in well-known systems
    pub fn with_builtin() -> Self {
        Self::from_entries(
            BUILTIN_CODE_SYSTEMS
                .iter()
                .map(|(uri, abbrev)| (uri.to_string(), abbrev.to_string())),
        )
    }

    /// Create a registry from pre-existing `(uri, abbreviation)` pairs
    pub fn from_entries(entries: impl IntoIterator<Item = (String, String)>) -> Self {
        let mut registry = Self::new();
        for (uri, abbrev) in entries {
            registry.insert(uri, abbrev);
        }
        registry
    }

    /// Load a persisted `{ "uri": "ABBR" }` table
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| CameoError::io(path, e))?;
        let table: IndexMap<String, String> =
            serde_json::from_str(&content).map_err(|e| CameoError::ParseError {
                file: path.to_path_buf(),
                message: e.to_string(),
            })?;

        debug!(
            "Loaded {} code systems from {}",
            table.len(),
            path.display()
        );
        Ok(Self::from_entries(table))
    }

    /// Persist the table, including abbreviations allocated during this run
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent).map_err(|e| CameoError::io(parent, e))?;
        }

        let json = serde_json::to_string_pretty(&self.codesystems)?;
        fs::write(path, json).map_err(|e| CameoError::io(path, e))?;

        debug!("Saved {} code systems to {}", self.len(), path.display());
        Ok(())
    }

    /// Abbreviation for a code-system URI, allocating one if needed
    ///
    /// Returns an empty string for empty or banned identifiers; those never
    /// consume a synthetic code.
    pub fn get(&mut self, identifier: &str) -> Result<String> {
        if identifier.is_empty() || is_banned(identifier) {
            return Ok(String::new());
        }

        if let Some(abbrev) = self.codesystems.get(identifier) {
            return Ok(abbrev.clone());
        }

        let abbrev = self.next_abbreviation(identifier)?;
        debug!("Allocated abbreviation {} for {}", abbrev, identifier);
        self.insert(identifier.to_string(), abbrev.clone());
        Ok(abbrev)
    }

    /// Look up an abbreviation without allocating
    pub fn lookup(&self, identifier: &str) -> Option<&str> {
        self.codesystems.get(identifier).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.codesystems.len()
    }

    pub fn is_empty(&self) -> bool {
        self.codesystems.is_empty()
    }

    /// `(uri, abbreviation)` pairs in load/allocation order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.codesystems
            .iter()
            .map(|(uri, abbrev)| (uri.as_str(), abbrev.as_str()))
    }

    fn insert(&mut self, uri: String, abbrev: String) {
        self.in_use.insert(abbrev.clone());
        self.codesystems.insert(uri, abbrev);
    }

    fn next_abbreviation(&mut self, identifier: &str) -> Result<String> {
        while self.cursor < SYNTHETIC_CAPACITY {
            let candidate = synthetic_code(self.cursor);
            self.cursor += 1;
            if !self.in_use.contains(&candidate) {
                return Ok(candidate);
            }
        }

        Err(CameoError::AbbreviationSpaceExhausted {
            identifier: identifier.to_string(),
        })
    }
}

fn is_banned(identifier: &str) -> bool {
    BANNED_FRAGMENTS
        .iter()
        .any(|fragment| identifier.contains(fragment))
}

/// Synthetic code for an index, last letter varying fastest
fn synthetic_code(index: u32) -> String {
    let letter = |n: u32| char::from(b'A' + (n % LETTERS) as u8);
    [
        letter(index / (LETTERS * LETTERS)),
        letter(index / LETTERS),
        letter(index),
    ]
    .iter()
    .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_allocation_sequence() {
        let mut registry = CodeSystemRegistry::new();
        assert_eq!(registry.get("http://example.com").unwrap(), "AAA");
        assert_eq!(registry.get("http://www.dsm5.org/").unwrap(), "AAB");
        assert_eq!(registry.get("http://example.com").unwrap(), "AAA");
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn test_synthetic_code_carries() {
        assert_eq!(synthetic_code(0), "AAA");
        assert_eq!(synthetic_code(25), "AAZ");
        assert_eq!(synthetic_code(26), "ABA");
        assert_eq!(synthetic_code(26 * 26), "BAA");
        assert_eq!(synthetic_code(SYNTHETIC_CAPACITY - 1), "ZZZ");
    }

    #[test]
    fn test_banned_and_empty_identifiers() {
        let mut registry = CodeSystemRegistry::new();
        assert_eq!(registry.get("").unwrap(), "");
        assert_eq!(registry.get("urn:oid:2.16.840.1").unwrap(), "");
        assert_eq!(
            registry
                .get("http://standardhealthrecord.org/shr/core/cs")
                .unwrap(),
            ""
        );
        // Banned lookups never consume a slot
        assert_eq!(registry.get("http://example.com").unwrap(), "AAA");
        assert!(registry.lookup("urn:oid:2.16.840.1").is_none());
    }

    #[test]
    fn test_skips_preloaded_abbreviations() {
        let mut registry = CodeSystemRegistry::from_entries(vec![
            ("http://a.org".to_string(), "AAA".to_string()),
            ("http://b.org".to_string(), "AAC".to_string()),
        ]);

        assert_eq!(registry.get("http://a.org").unwrap(), "AAA");
        assert_eq!(registry.get("http://new-1.org").unwrap(), "AAB");
        assert_eq!(registry.get("http://new-2.org").unwrap(), "AAD");
    }

    #[test]
    fn test_builtin_table() {
        let mut registry = CodeSystemRegistry::with_builtin();
        assert_eq!(registry.get("http://loinc.org").unwrap(), "LNC");
        assert_eq!(registry.get("urn:tbd").unwrap(), UNDETERMINED);
        assert_eq!(registry.get("http://example.com").unwrap(), "AAA");
    }

    #[test]
    fn test_exhaustion_is_an_error() {
        let mut registry = CodeSystemRegistry::new();
        registry.cursor = SYNTHETIC_CAPACITY - 1;

        assert_eq!(registry.get("http://last.org").unwrap(), "ZZZ");
        let err = registry.get("http://one-too-many.org").unwrap_err();
        assert!(matches!(err, CameoError::AbbreviationSpaceExhausted { .. }));
    }

    #[test]
    fn test_save_and_load_round_trip() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config/codesystems.json");

        let mut registry = CodeSystemRegistry::with_builtin();
        registry.get("http://example.com").unwrap();
        registry.save(&path).unwrap();

        let mut reloaded = CodeSystemRegistry::load(&path).unwrap();
        assert_eq!(reloaded.len(), registry.len());
        assert_eq!(reloaded.lookup("http://example.com"), Some("AAA"));
        // The reloaded registry continues past codes already in use
        assert_eq!(reloaded.get("http://another.org").unwrap(), "AAB");
    }

    #[test]
    fn test_load_rejects_malformed_table() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("codesystems.json");
        fs::write(&path, "[1, 2, 3]").unwrap();

        let err = CodeSystemRegistry::load(&path).unwrap_err();
        assert!(matches!(err, CameoError::ParseError { .. }));
    }
}
