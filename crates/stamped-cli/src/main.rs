//! Stamped CLI
//!
//! Command-line interface for Stamped - timestamped note documents.

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use stamped_core::route::{parse_document_ref, Route};
use stamped_core::{analytics, Config, DocumentId};

mod commands;
mod output;
mod tui;

use output::{Output, OutputFormat};

#[derive(Parser)]
#[command(name = "stamped")]
#[command(about = "Stamped - notes that timestamp every sentence")]
#[command(version)]
#[command(propagate_version = true)]
struct Cli {
    /// Output as JSON
    #[arg(long, global = true)]
    json: bool,

    /// Quiet mode - minimal output
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Use this config file instead of the default
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the TUI on the document list
    Tui,
    /// Create a new document and open it
    New,
    /// Open a document in the TUI
    Open {
        /// Document ID or path (/<id>)
        id: String,
    },
    /// List stored documents
    #[command(alias = "ls")]
    List,
    /// Print a document's content
    Show {
        /// Document ID or path (/<id>)
        id: String,
    },
    /// Export a document to stamped.csv
    Export {
        /// Document ID or path (/<id>)
        id: String,
        /// Directory to write stamped.csv into
        #[arg(short, long)]
        out: Option<PathBuf>,
    },
    /// Delete a stored document
    #[command(alias = "rm")]
    Delete {
        /// Document ID or path (/<id>)
        id: String,
    },
    /// Show or set configuration
    Config {
        #[command(subcommand)]
        command: Option<ConfigCommands>,
    },
}

#[derive(Subcommand, Clone)]
enum ConfigCommands {
    /// Show current configuration
    Show,
    /// Set a configuration value
    Set {
        /// Configuration key (data_dir, autosave_delay_secs, terminator, ...)
        key: String,
        /// Configuration value
        value: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let output = Output::new(OutputFormat::from_flags(cli.json, cli.quiet));

    // Config commands must work even when the config itself is broken
    if let Some(Commands::Config { command }) = &cli.command {
        return match command {
            Some(ConfigCommands::Show) | None => {
                commands::config::show(cli.config.as_ref(), &output)
            }
            Some(ConfigCommands::Set { key, value }) => {
                commands::config::set(key.clone(), value.clone(), cli.config.as_ref(), &output)
            }
        };
    }

    let config = Config::load_with_cli_override(cli.config.as_ref())?;

    // TUI routes log to a file; everything else logs to stderr
    let route = match &cli.command {
        None | Some(Commands::Tui) => Some(Route::Landing),
        Some(Commands::New) => Some(Route::Document(DocumentId::new())),
        Some(Commands::Open { id }) => Some(Route::Document(parse_document_ref(id)?)),
        _ => None,
    };
    if let Some(route) = route {
        let is_new = matches!(&cli.command, Some(Commands::New));
        return tui::run(config, route, is_new).await;
    }

    init_cli_logging();
    let mut store = commands::open_store(&config)?;
    let sink = analytics::from_config(&config);

    match cli.command {
        Some(Commands::List) => commands::document::list(&store, &output),
        Some(Commands::Show { id }) => commands::document::show(&mut store, id, &output),
        Some(Commands::Export { id, out }) => {
            let out_dir = out.unwrap_or_else(|| config.export_dir());
            commands::document::export(&mut store, id, out_dir, sink.as_ref(), &output)
        }
        Some(Commands::Delete { id }) => commands::document::delete(&mut store, id, &output),
        // Handled above
        None
        | Some(Commands::Tui)
        | Some(Commands::New)
        | Some(Commands::Open { .. })
        | Some(Commands::Config { .. }) => unreachable!(),
    }
}

/// Initialize stderr logging for one-shot commands
///
/// Only initializes if STAMPED_LOG is set (e.g. `STAMPED_LOG=debug`).
fn init_cli_logging() {
    let Ok(log_level) = std::env::var("STAMPED_LOG") else {
        return;
    };

    let env_filter = EnvFilter::new(format!(
        "stamped_core={},stamped_cli={},stamped={}",
        log_level, log_level, log_level
    ));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}
