//! # docground
//!
//! Command-line driver over the retrieval orchestrator.
//!
//! | Command | Description |
//! |---------|-------------|
//! | `docground ask "<query>"` | Build grounding context for a question |
//! | `docground cache stats` | Show document cache statistics |
//! | `docground cache purge-expired` | Evict expired cache records |
//! | `docground cache clear` | Evict every cache record |
//! | `docground catalog list` | List institutional sources |
//! | `docground catalog match "<query>"` | Show which sources a query triggers |
//!
//! Logs go to stderr (`RUST_LOG`, default `info`); stdout carries only the
//! command output.

mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::EnvFilter;

/// Documentation retrieval with institutional sources and a page cache.
#[derive(Debug, Parser)]
#[command(name = "docground", version)]
struct Cli {
    /// Configuration file (TOML). Defaults to the user config directory.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Retrieve, rank and extract sources for a question.
    Ask(AskArgs),

    /// Maintain the document cache.
    Cache {
        #[command(subcommand)]
        action: CacheAction,
    },

    /// Inspect the institutional source catalog.
    Catalog {
        #[command(subcommand)]
        action: CatalogAction,
    },
}

#[derive(Debug, clap::Args)]
struct AskArgs {
    /// The question.
    query: String,

    /// Number of sources, 1 to 5.
    #[arg(long, value_parser = clap::value_parser!(u8).range(1..=5))]
    sources: Option<u8>,

    /// Use search snippets instead of fetching pages.
    #[arg(long)]
    no_full_content: bool,

    /// Neither read nor write the document cache.
    #[arg(long)]
    no_cache: bool,

    /// Lifetime of newly cached pages, 1 to 168 hours.
    #[arg(long, value_parser = clap::value_parser!(u32).range(1..=168))]
    ttl_hours: Option<u32>,

    #[arg(long, value_enum, default_value_t = OutputFormat::Prompt)]
    format: OutputFormat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    /// The full answer context as JSON.
    Json,
    /// Numbered sources ready for a generator prompt.
    Prompt,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Subcommand)]
enum CacheAction {
    /// Entry counts and size on disk.
    Stats,
    /// Evict expired entries only.
    PurgeExpired,
    /// Evict every entry.
    Clear,
}

#[derive(Debug, Subcommand)]
enum CatalogAction {
    /// Print every source with its triggers.
    List,
    /// Print the sources a query would pull in.
    Match { query: String },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = commands::load_config(cli.config.as_deref())?;

    let output = match cli.command {
        Command::Ask(args) => commands::ask(&config, &args).await?,
        Command::Cache { action } => commands::cache(&config, action).await?,
        Command::Catalog { action } => commands::catalog(&config, &action)?,
    };
    println!("{output}");
    Ok(())
}
