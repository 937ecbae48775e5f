//! Command implementations

use crate::output::{ConversionReporter, ProgressReporter};
use anyhow::{Context, Result, bail};
use cameo_core::{
    CameoConfig, CodeSystemRegistry, ConfigLoader, ConversionSummary, Diagnostic,
    DocumentLoader, DocumentProcessor, Exportable, ProcessingStats, TextWriter, WriteStats,
};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, info};

/// Options of the `convert` command, after argument parsing
#[derive(Debug, Clone, Default)]
pub struct ConvertOptions {
    pub input: PathBuf,
    pub output: Option<PathBuf>,
    pub codesystems: Option<PathBuf>,
    pub persist_codesystems: bool,
    pub progress: bool,
    pub config: Option<PathBuf>,
}

/// Load the config file, falling back to defaults when none is found
fn load_config(config_path: Option<&Path>) -> Result<CameoConfig> {
    let cwd = std::env::current_dir().context("Failed to resolve current directory")?;
    let config = ConfigLoader::load(config_path, &cwd)?;
    debug!("Using config: {:?}", config);
    Ok(config)
}

/// Load the code-system table, or the built-in one if the file is absent
fn load_registry(path: &Path) -> Result<CodeSystemRegistry> {
    if path.is_file() {
        info!("Loading code systems from {}", path.display());
        Ok(CodeSystemRegistry::load(path)?)
    } else {
        info!(
            "No code-system table at {}, using built-in systems",
            path.display()
        );
        Ok(CodeSystemRegistry::with_builtin())
    }
}

/// Execute the convert command
pub fn convert_command(options: ConvertOptions) -> Result<()> {
    let start_time = Instant::now();
    let config = load_config(options.config.as_deref())?;

    let output_dir = options.output.unwrap_or(config.output);
    let table_path = options.codesystems.unwrap_or(config.codesystems);
    let persist = options.persist_codesystems || config.persist_codesystems;

    let loader = DocumentLoader::new();
    let documents = loader
        .discover(&options.input)
        .with_context(|| format!("Input not found: {}", options.input.display()))?;
    if documents.is_empty() {
        bail!("No JSON documents found in {}", options.input.display());
    }

    info!("Converting {} documents", documents.len());
    info!("  Output: {}", output_dir.display());

    let mut registry = load_registry(&table_path)?;
    let writer = TextWriter::default().with_trailing_newline(config.trailing_newline);

    let mut processing = ProcessingStats::new();
    let mut writing = WriteStats::new();
    let mut diagnostics: Vec<Diagnostic> = Vec::new();
    let progress = ProgressReporter::new(options.progress, documents.len());

    for (index, path) in documents.iter().enumerate() {
        progress.update(index, &format!("Converting {}", path.display()));

        let document = loader.load(path)?;
        let processed = DocumentProcessor::new(&mut registry)
            .process(&document)
            .with_context(|| format!("Failed to convert {}", path.display()))?;

        let mut exportables: Vec<&dyn Exportable> = Vec::new();
        exportables.extend(processed.namespaces.iter().map(|ns| ns as &dyn Exportable));
        exportables.extend(processed.value_sets.iter().map(|vs| vs as &dyn Exportable));
        writing.merge(writer.write_batch(&exportables, &output_dir)?);

        processing.merge(&processed.stats);
        diagnostics.extend(processed.diagnostics);
    }
    progress.update(documents.len(), "Converting");
    progress.finish("Converting");

    if persist {
        registry
            .save(&table_path)
            .with_context(|| format!("Failed to save code systems to {}", table_path.display()))?;
        info!("Saved {} code systems to {}", registry.len(), table_path.display());
    }

    let summary = ConversionSummary::new(processing, writing, registry.len(), start_time.elapsed());
    ConversionReporter::new().print(&summary, &diagnostics, &output_dir);

    Ok(())
}

/// Execute the codesystems command
pub fn codesystems_command(table: Option<PathBuf>, config_path: Option<PathBuf>) -> Result<()> {
    let config = load_config(config_path.as_deref())?;
    let table_path = table.unwrap_or(config.codesystems);
    let registry = load_registry(&table_path)?;

    ConversionReporter::new().print_code_systems(&registry, &table_path);
    Ok(())
}
