//! # Lyric RAG CLI (`lyr`)
//!
//! The `lyr` binary seeds the catalog, answers questions from it, and
//! serves the chat API.
//!
//! ## Usage
//!
//! ```bash
//! lyr --config ./config/lyr.toml <command>
//! ```
//!
//! ## Examples
//!
//! ```bash
//! lyr init
//! lyr seed ./catalog --reset
//! lyr search "Warning Shots lyrics" --explain
//! lyr ask "What is Full Disclosure about?"
//! lyr serve
//! ```

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use lyric_rag::config::{self, StorageBackend};
use lyric_rag::{ask, backend, get, migrate, search, seed, server, stats};

/// Lyric RAG CLI: a retrieval-augmented chat assistant over a lyric and
/// commentary catalog.
///
/// All commands accept a `--config` flag pointing to a TOML configuration
/// file. See `config/lyr.example.toml` for a full example.
#[derive(Parser)]
#[command(
    name = "lyr",
    about = "Lyric RAG: answer questions about a music catalog with cited sources",
    version
)]
struct Cli {
    /// Path to configuration file (TOML).
    #[arg(long, global = true, default_value = "./config/lyr.toml")]
    config: PathBuf,

    /// Enable debug logging (keyword extraction, matching stages).
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Top-level CLI commands.
#[derive(Subcommand)]
enum Commands {
    /// Create the SQLite schema. Safe to run repeatedly.
    Init,

    /// Load catalog documents from a JSON file or a directory of lyric files.
    Seed {
        /// JSON array of `{title, content, metadata}` or a directory of .md/.txt files.
        path: PathBuf,

        /// Clear the corpus before inserting.
        #[arg(long)]
        reset: bool,
    },

    /// Delete every catalog document.
    Reset,

    /// Rank catalog documents for a query.
    Search {
        query: String,

        /// Maximum number of results (defaults to `retrieval.limit`).
        #[arg(long)]
        limit: Option<usize>,

        /// Print extracted keywords and the matching stage.
        #[arg(long)]
        explain: bool,
    },

    /// Answer a question with citations.
    Ask {
        question: String,

        /// Print the response as JSON (`{answer, citations}`).
        #[arg(long)]
        json: bool,
    },

    /// Print a catalog document by id.
    Get { id: i64 },

    /// Show or clear the chat message log.
    History {
        #[arg(long)]
        limit: Option<usize>,

        #[arg(long)]
        clear: bool,
    },

    /// Show document and message counts.
    Stats,

    /// Start the HTTP chat server.
    Serve,
}

fn init_tracing(verbose: bool) {
    let default = if verbose {
        "lyric_rag=debug,lyric_rag_core=debug"
    } else {
        "lyric_rag=info,lyric_rag_core=warn"
    };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default)))
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let cfg = config::load_config(&cli.config)?;

    match cli.command {
        Commands::Init => match cfg.storage.backend {
            StorageBackend::Sqlite => {
                migrate::run_migrations(&cfg).await?;
                println!("Database initialized successfully.");
            }
            StorageBackend::Memory => {
                println!("Memory backend selected; nothing to initialize.");
            }
        },
        Commands::Seed { path, reset } => {
            seed::run_seed(&cfg, &path, reset).await?;
        }
        Commands::Reset => {
            let store = backend::connect_store(&cfg).await?;
            let removed = store.count_documents().await?;
            store.clear_documents().await?;
            println!("Removed {} documents.", removed);
        }
        Commands::Search {
            query,
            limit,
            explain,
        } => {
            search::run_search(&cfg, &query, limit, explain).await?;
        }
        Commands::Ask { question, json } => {
            ask::run_ask(&cfg, &question, json).await?;
        }
        Commands::Get { id } => {
            get::run_get(&cfg, id).await?;
        }
        Commands::History { limit, clear } => {
            ask::run_history(&cfg, limit, clear).await?;
        }
        Commands::Stats => {
            stats::run_stats(&cfg).await?;
        }
        Commands::Serve => {
            server::run_server(&cfg).await?;
        }
    }

    Ok(())
}
