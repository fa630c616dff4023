//! # AutoDoc CLI (`autodoc`)
//!
//! ## Usage
//!
//! ```bash
//! autodoc --config ./config/autodoc.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `autodoc serve` | Start the HTTP + MCP server |
//! | `autodoc resolve <input>` | Show the identity a repository string resolves to |
//! | `autodoc structure <repo_url>` | Print the cached wiki structure |
//! | `autodoc content <repo_url> <topic>` | Print one cached documentation page |

use autodoc_gateway::{config, identity, lookup, server};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// AutoDoc: browse AI-generated repository documentation.
#[derive(Parser)]
#[command(
    name = "autodoc",
    about = "AutoDoc: repository documentation lookups over HTTP, MCP, and the command line",
    version
)]
struct Cli {
    /// Path to configuration file (TOML). Optional; defaults and
    /// environment variables apply when it does not exist.
    #[arg(long, global = true, default_value = "./config/autodoc.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP server.
    ///
    /// Binds to `[server].bind` and serves the lookup endpoints, the tool
    /// API, and the MCP endpoint at `/mcp`.
    Serve,

    /// Resolve a repository URL or local path to its cache identity.
    ///
    /// Does not contact the backend.
    Resolve {
        /// Repository URL (`https://github.com/owner/repo`) or local path.
        input: String,

        /// Print the identity as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Print the wiki structure cached for a repository.
    Structure {
        /// Repository URL or local path.
        repo_url: String,
    },

    /// Print one documentation page, matched by page id or title.
    Content {
        /// Repository URL or local path.
        repo_url: String,

        /// Page id (e.g. `page-1`) or title (case-insensitive).
        topic: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // RUST_LOG overrides the per-command default.
    let default_filter = match cli.command {
        Commands::Serve => "info",
        _ => "warn",
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_filter)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        // Pure parsing; needs no config.
        Commands::Resolve { input, json } => identity::run_resolve(&input, json)?,
        Commands::Serve => {
            let cfg = config::load_config(&cli.config)?;
            server::run_server(&cfg).await?
        }
        Commands::Structure { repo_url } => {
            let cfg = config::load_config(&cli.config)?;
            lookup::run_structure(&cfg, &repo_url).await?
        }
        Commands::Content { repo_url, topic } => {
            let cfg = config::load_config(&cli.config)?;
            lookup::run_content(&cfg, &repo_url, &topic).await?
        }
    }

    Ok(())
}
