//! `feed-server` command line: run the feed or talk to a running one.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use feed_server::{list_packages, push_package, run_server, search_packages, Config};

#[derive(Parser)]
#[command(name = "feed-server")]
#[command(about = "Local package feed for .nupkg archives")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Feed URL for client operations
    #[arg(long, default_value = "http://localhost:5000", global = true)]
    server: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the package feed
    Start {
        /// Host to bind to (defaults to the configured host)
        #[arg(long)]
        host: Option<String>,

        /// Port to bind to (defaults to the configured port)
        #[arg(long)]
        port: Option<u16>,

        /// Data directory for package storage
        #[arg(long)]
        data: Option<PathBuf>,

        /// JSON configuration file
        #[arg(long, default_value = "feed.json")]
        config: PathBuf,
    },

    /// Push a .nupkg archive to the feed
    Push {
        file: PathBuf,
    },

    /// Search for the latest version of matching packages
    Search {
        query: Option<String>,
    },

    /// List every package version in the feed
    List,
}

fn main() -> Result<()> {
    let _log_guard = feed_logging::init_subscriber();

    let cli = Cli::parse();

    match cli.command {
        Commands::Start {
            host,
            port,
            data,
            config,
        } => {
            let config = Config::load_or_default(&config)
                .with_context(|| format!("Failed to load configuration {}", config.display()))?;
            let host = host.unwrap_or_else(|| config.server.default_host.clone());
            let port = port.unwrap_or(config.server.default_port);
            let data = data.unwrap_or_else(|| config.storage.default_data_dir.clone());

            // Client commands use blocking HTTP, so only the server gets a runtime.
            tokio::runtime::Builder::new_multi_thread()
                .enable_all()
                .build()
                .context("Failed to start async runtime")?
                .block_on(run_server(host, port, data, config))
        }

        Commands::Push { file } => push_package(&cli.server, file),

        Commands::Search { query } => search_packages(&cli.server, query.as_deref()),

        Commands::List => list_packages(&cli.server),
    }
}
