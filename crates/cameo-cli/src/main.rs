//! cameo CLI
//!
//! Command-line interface for the schema-to-grammar converter

mod commands;
mod output;

use anyhow::Result;
use cameo_core::init_tracing;
use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::{Shell, generate};
use std::io;
use std::path::PathBuf;
use tracing::error;

#[derive(Parser)]
#[command(name = "cameo")]
#[command(about = "cameo: convert JSON schema exports into the text element grammar")]
#[command(version = cameo_core::VERSION)]
#[command(
    long_about = "cameo converts the JSON tree exported by a visual modeling tool into\n\
plain-text DataElement and ValueSet grammar files, one per namespace.\n\
\n\
Examples:\n  \
cameo convert shr.json                   # Write grammar files to out/\n  \
cameo convert exports/ -o grammar        # Convert every .json file in exports/\n  \
cameo convert shr.json --persist-codesystems\n  \
cameo codesystems                        # List known code-system abbreviations"
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Configuration file path
    #[arg(
        short,
        long,
        global = true,
        help = "Path to configuration file (.cameorc.json/.cameorc.toml/cameo.yaml)"
    )]
    config: Option<PathBuf>,

    /// Verbose output (can be used multiple times for increased verbosity)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Disable colored output
    #[arg(long, global = true)]
    no_color: bool,

    /// Generate shell completion script
    #[arg(
        long,
        value_enum,
        help = "Generate completion script for specified shell"
    )]
    generate_completion: Option<Shell>,
}

#[derive(Subcommand)]
enum Commands {
    /// Convert a schema document (or a directory of them) into grammar files
    Convert {
        /// Input document or directory
        #[arg(help = "JSON document, or directory of JSON documents")]
        input: PathBuf,

        /// Output directory for grammar files
        #[arg(short, long, help = "Output directory (default: out)")]
        output: Option<PathBuf>,

        /// Code-system abbreviation table
        #[arg(
            long,
            help = "Code-system table to load (default: config/codesystems.json)"
        )]
        codesystems: Option<PathBuf>,

        /// Write newly allocated abbreviations back to the table
        #[arg(long, help = "Save the code-system table after converting")]
        persist_codesystems: bool,

        /// Show progress during conversion
        #[arg(long, help = "Show per-document progress")]
        progress: bool,
    },

    /// List the code-system abbreviation table
    Codesystems {
        /// Code-system abbreviation table
        #[arg(long, help = "Code-system table to list (default: config/codesystems.json)")]
        codesystems: Option<PathBuf>,
    },

    /// Show version information
    Version {
        /// Show detailed version information
        #[arg(long, help = "Show detailed build information")]
        detailed: bool,
    },
}

fn main() {
    let cli = Cli::parse();

    // Handle shell completion generation
    if let Some(shell) = cli.generate_completion {
        generate_completion_script(shell);
        return;
    }

    // Initialize colored output
    if !cli.no_color && std::env::var("NO_COLOR").is_err() {
        colored::control::set_override(true);
    } else {
        colored::control::set_override(false);
    }

    // Initialize tracing based on verbosity
    let log_level = match cli.verbose {
        0 => "cameo=error", // Only errors by default
        1 => "cameo=warn",  // Diagnostics on first -v
        2 => "cameo=info",  // Info on -vv
        3 => "cameo=debug", // Debug on -vvv
        _ => "cameo=trace", // Trace on -vvvv+
    };
    init_tracing(log_level);

    if let Err(e) = run_command(cli) {
        error!("cameo failed: {:#}", e);
        std::process::exit(1);
    }
}

fn generate_completion_script(shell: Shell) {
    let mut cmd = Cli::command();
    let name = cmd.get_name().to_string();
    generate(shell, &mut cmd, name, &mut io::stdout());
}

fn run_command(cli: Cli) -> Result<()> {
    match cli.command {
        Some(Commands::Convert {
            input,
            output,
            codesystems,
            persist_codesystems,
            progress,
        }) => commands::convert_command(commands::ConvertOptions {
            input,
            output,
            codesystems,
            persist_codesystems,
            progress,
            config: cli.config,
        }),

        Some(Commands::Codesystems { codesystems }) => {
            commands::codesystems_command(codesystems, cli.config)
        }

        Some(Commands::Version { detailed }) => {
            if detailed {
                println!("cameo {}", cameo_core::VERSION);
                println!("Build information:");
                println!("  Target: {}", std::env::consts::ARCH);
                println!("  OS: {}", std::env::consts::OS);
                println!(
                    "  Rust version: {}",
                    option_env!("CARGO_PKG_RUST_VERSION").unwrap_or("unknown")
                );
                if let Ok(profile) = std::env::var("PROFILE") {
                    println!("  Profile: {profile}");
                }
            } else {
                println!("{}", cameo_core::VERSION);
            }
            Ok(())
        }

        None => {
            // No subcommand provided, show help
            let mut cmd = Cli::command();
            cmd.print_help()?;
            Ok(())
        }
    }
}
