//! Processors convert input records into Exportable objects
//!
//! This module provides processors for each input section:
//! - Namespace → Namespace (element tree with nesting resolved)
//! - ValueSet → ValueSet, grouped into ValueSetNamespace
//! - Document → both of the above, sharing one code-system registry

pub mod document;
pub mod namespace;
pub mod value_set;

// Re-exports
pub use document::*;
pub use namespace::*;
pub use value_set::*;
