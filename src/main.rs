use std::net::IpAddr;
use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use notes_api::api;
use notes_api::config::ServerConfig;
use notes_api::storage::{FileStore, NoteStore};

#[derive(Parser)]
#[command(name = "notes-api")]
#[command(about = "HTTP service for short text notes stored in a JSON file")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP server
    Serve {
        /// Port for HTTP API
        #[arg(short, long)]
        port: Option<u16>,

        /// Interface to bind
        #[arg(long)]
        host: Option<IpAddr>,

        /// Path of the notes file
        #[arg(short, long)]
        data_file: Option<PathBuf>,
    },
    /// Print all stored notes as JSON
    List {
        /// Path of the notes file
        #[arg(short, long)]
        data_file: Option<PathBuf>,
    },
}

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::new(
        std::env::var("RUST_LOG").unwrap_or_else(|_| "notes_api=debug,tower_http=debug".into()),
    );

    // Logs go to stderr so `list` output on stdout stays clean JSON.
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

async fn serve(config: ServerConfig) -> anyhow::Result<()> {
    tracing::info!("Using notes file {}", config.data_file.display());
    let store = Arc::new(FileStore::new(config.data_file.clone()));

    // Fail at startup rather than on the first request if the file is unusable.
    let existing = store.get_all()?;
    tracing::info!("Loaded {} notes", existing.len());

    let app = api::create_router(store);

    let addr = config.bind_addr();
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("notes-api listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing();

    let mut config = ServerConfig::from_env();

    match cli.command {
        Some(Commands::Serve {
            port,
            host,
            data_file,
        }) => {
            if let Some(port) = port {
                config.port = port;
            }
            if let Some(host) = host {
                config.host = host;
            }
            if let Some(data_file) = data_file {
                config.data_file = data_file;
            }
            serve(config).await?;
        }
        Some(Commands::List { data_file }) => {
            let path = data_file.unwrap_or(config.data_file);
            let notes = FileStore::new(path).get_all()?;
            println!("{}", serde_json::to_string_pretty(&notes)?);
        }
        None => serve(config).await?,
    }

    Ok(())
}
