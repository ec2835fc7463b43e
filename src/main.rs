mod cli;

use clap::{Parser, Subcommand};
use hashvdb::server::{self, SessionState};
use hashvdb::{EntryStore, ServerConfig};
use std::path::PathBuf;
use tracing_subscriber::{fmt, EnvFilter};

/// HashVDB - toy session vector database with hash-based embeddings
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Interactive session (default)
    Shell {
        /// Start the session from an export file
        #[arg(long)]
        import: Option<PathBuf>,
    },

    /// Print the embedding of a text
    Embed {
        text: String,

        /// Print all components as JSON instead of a preview
        #[arg(long)]
        full: bool,
    },

    /// Print the cosine similarity of two texts
    Compare { left: String, right: String },

    /// Rank the entries of an export file against a query
    Search { file: PathBuf, query: String },

    /// Serve a session over HTTP
    Serve {
        /// Bind address
        #[arg(short, long, default_value = "0.0.0.0")]
        bind: String,

        /// Port number
        #[arg(short, long, default_value_t = 7878)]
        port: u16,

        /// Start the session from an export file
        #[arg(long)]
        import: Option<PathBuf>,
    },
}

fn init_logging(default_directive: &str) -> anyhow::Result<()> {
    // RUST_LOG overrides the default
    let filter = EnvFilter::builder()
        .with_default_directive(default_directive.parse()?)
        .from_env_lossy();

    fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    Ok(())
}

fn load_session(import: Option<PathBuf>) -> anyhow::Result<EntryStore> {
    let mut store = EntryStore::new();
    if let Some(path) = import {
        let count = cli::import_from_file(&mut store, &path)?;
        tracing::info!(count, path = %path.display(), "session started from export");
    }
    Ok(store)
}

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let default_directive = match args.command {
        Some(Commands::Serve { .. }) => "hashvdb=info",
        _ => "hashvdb=warn",
    };
    init_logging(default_directive)?;

    match args.command {
        None => {
            let mut store = EntryStore::new();
            cli::run_shell(&mut store);
        }
        Some(Commands::Shell { import }) => {
            let mut store = load_session(import)?;
            cli::run_shell(&mut store);
        }
        Some(Commands::Embed { text, full }) => cli::run_embed(&text, full)?,
        Some(Commands::Compare { left, right }) => cli::run_compare(&left, &right)?,
        Some(Commands::Search { file, query }) => cli::run_search(&file, &query)?,
        Some(Commands::Serve { bind, port, import }) => {
            let store = load_session(import)?;
            let config = ServerConfig::default().with_bind(bind).with_port(port);
            server::run(config, SessionState::with_store(store)).await?;
        }
    }

    Ok(())
}
