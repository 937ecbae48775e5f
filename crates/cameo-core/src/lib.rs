//! # cameo-core
//!
//! Converts the JSON schema tree exported by a visual modeling tool into the
//! plain-text data-element and value-set grammar.
//!
//! The pipeline is:
//! - [`loader`] reads the document
//! - [`processor`] decides where every element is rendered and builds
//!   [`exportable`] values, abbreviating code systems through one
//!   [`registry::CodeSystemRegistry`]
//! - [`writer`] writes one file per namespace and one per value-set namespace
//!
//! ```no_run
//! use cameo_core::{CodeSystemRegistry, DocumentLoader, DocumentProcessor, Exportable, TextWriter};
//! use std::path::Path;
//!
//! # fn main() -> cameo_core::Result<()> {
//! let document = DocumentLoader::new().load(Path::new("shr.json"))?;
//! let mut registry = CodeSystemRegistry::with_builtin();
//! let output = DocumentProcessor::new(&mut registry).process(&document)?;
//!
//! let mut exportables: Vec<&dyn Exportable> = Vec::new();
//! exportables.extend(output.namespaces.iter().map(|ns| ns as &dyn Exportable));
//! exportables.extend(output.value_sets.iter().map(|vs| vs as &dyn Exportable));
//! TextWriter::default().write_batch(&exportables, Path::new("out"))?;
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod error;
pub mod exportable;
pub mod loader;
pub mod models;
pub mod processor;
pub mod registry;
pub mod stats;
pub mod test_helpers;
pub mod writer;

// Re-exports for convenience
pub use config::{CameoConfig, ConfigLoader};
pub use error::{CameoError, Result};
pub use exportable::{Diagnostic, DiagnosticKind, Exportable, Namespace, ValueSetNamespace};
pub use loader::DocumentLoader;
pub use processor::{DocumentProcessor, ProcessedDocument};
pub use registry::CodeSystemRegistry;
pub use stats::{ConversionSummary, ProcessingStats, WriteStats};
pub use writer::TextWriter;

/// Initialize tracing for logging
///
/// `RUST_LOG` wins when set; otherwise `default_directive` is used.
pub fn init_tracing(default_directive: &str) {
    use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_thread_ids(false)
                .with_file(true)
                .with_line_number(true)
                .with_writer(std::io::stderr),
        )
        .init();
}

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const NAME: &str = env!("CARGO_PKG_NAME");
