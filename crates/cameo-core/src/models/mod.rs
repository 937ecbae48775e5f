//! Input records decoded from the schema JSON document

pub mod common;
pub mod constraint;
pub mod document;
pub mod element;
pub mod value_set;

// Re-exports
pub use common::*;
pub use constraint::*;
pub use document::*;
pub use element::*;
pub use value_set::*;
