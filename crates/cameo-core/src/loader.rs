//! File loading and parsing for schema documents
//!
//! This module reads the JSON document from disk. A path may name a single
//! document or a directory, in which case every `.json` file directly inside
//! it is loaded in file-name order.

use crate::error::{CameoError, Result};
use crate::models::Document;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Loader for schema documents
#[derive(Debug, Default)]
pub struct DocumentLoader;

impl DocumentLoader {
    /// Create a new DocumentLoader
    pub fn new() -> Self {
        Self
    }

    /// Load and parse one document
    pub fn load(&self, path: &Path) -> Result<Document> {
        if !path.is_file() {
            return Err(CameoError::InvalidPath(path.to_path_buf()));
        }

        debug!("Loading JSON file: {}", path.display());
        let content = fs::read_to_string(path).map_err(|e| CameoError::io(path, e))?;
        let document: Document =
            serde_json::from_str(&content).map_err(|e| CameoError::ParseError {
                file: path.to_path_buf(),
                message: e.to_string(),
            })?;

        info!(
            "Loaded document '{}' with {} sections",
            document.label,
            document.children.len()
        );
        Ok(document)
    }

    /// Document paths for a file or directory input
    pub fn discover(&self, path: &Path) -> Result<Vec<PathBuf>> {
        if path.is_file() {
            return Ok(vec![path.to_path_buf()]);
        }
        if !path.is_dir() {
            return Err(CameoError::InvalidPath(path.to_path_buf()));
        }

        let mut documents = Vec::new();
        for entry in fs::read_dir(path).map_err(|e| CameoError::io(path, e))? {
            let entry_path = entry.map_err(|e| CameoError::io(path, e))?.path();

            let hidden = entry_path
                .file_name()
                .and_then(|name| name.to_str())
                .is_some_and(|name| name.starts_with('.'));
            if hidden {
                debug!("Skipping {}", entry_path.display());
                continue;
            }

            if entry_path.is_file() && entry_path.extension().is_some_and(|ext| ext == "json") {
                documents.push(entry_path);
            }
        }

        documents.sort();
        Ok(documents)
    }
}
