//! # Policy Lens CLI (`plens`)
//!
//! The `plens` binary runs the query endpoint and acts as its client: it
//! uploads documents into the local store, dispatches queries, and shows the
//! history of past answers.
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `plens serve` | Start the query endpoint |
//! | `plens upload <paths...>` | Ingest files or directories |
//! | `plens docs` | List stored documents |
//! | `plens remove <id>` | Delete one document |
//! | `plens ask "<query>"` | Query the endpoint with every stored document |
//! | `plens history [id]` | List past queries, or show one in full |
//! | `plens clear` | Delete every document and the query history |

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::warn;
use tracing_subscriber::EnvFilter;

use policy_lens::{client, config, ingest, server, view};

/// Policy Lens — ask an LLM structured coverage questions about your
/// policy documents.
#[derive(Parser)]
#[command(name = "plens", version, about)]
struct Cli {
    /// Path to configuration file (TOML).
    ///
    /// When the file does not exist, built-in defaults are used.
    #[arg(long, global = true, default_value = "./config/plens.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the query endpoint.
    ///
    /// Binds to `[server].bind` and forwards each query to the `[llm]`
    /// provider.
    Serve,

    /// Upload files into the local document store.
    ///
    /// Directories are expanded recursively. All files are read before any
    /// is stored; one unreadable file aborts the whole upload.
    Upload {
        #[arg(required = true)]
        paths: Vec<PathBuf>,
    },

    /// List stored documents.
    Docs,

    /// Delete one stored document.
    Remove {
        /// Document id (UUID).
        id: String,
    },

    /// Ask a question against every stored document.
    Ask {
        /// The query, e.g. "46-year-old male, knee surgery, 3-month policy".
        query: String,
    },

    /// Show past queries.
    History {
        /// Show a single query in full.
        id: Option<String>,
    },

    /// Delete every stored document and the query history.
    Clear,
}

fn init_tracing(default_level: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    init_tracing(match cli.command {
        Commands::Serve => "info",
        _ => "warn",
    });

    let cfg = if cli.config.exists() {
        config::load_config(&cli.config)?
    } else {
        warn!(path = %cli.config.display(), "config file not found; using defaults");
        config::Config::minimal()
    };

    match cli.command {
        Commands::Serve => server::run_server(&cfg).await?,
        Commands::Upload { paths } => ingest::run_upload(&cfg, &paths).await?,
        Commands::Docs => view::run_docs(&cfg).await?,
        Commands::Remove { id } => view::run_remove(&cfg, &id).await?,
        Commands::Ask { query } => client::run_ask(&cfg, &query).await?,
        Commands::History { id } => view::run_history(&cfg, id.as_deref()).await?,
        Commands::Clear => view::run_clear(&cfg).await?,
    }

    Ok(())
}
