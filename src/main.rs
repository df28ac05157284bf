use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use mentormesh::{api, auth::AuthKeys, store};

#[derive(Parser)]
#[command(name = "mentormesh")]
#[command(about = "Mentorship-matching API backed by an embedded JSON document store")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the MentorMesh server
    Serve {
        /// Port for HTTP API
        #[arg(short, long, default_value = "3000")]
        port: u16,

        /// Path to the backing data file (defaults to ./data_store.json)
        #[arg(short, long)]
        data: Option<PathBuf>,
    },
}

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::new(
        std::env::var("RUST_LOG").unwrap_or_else(|_| "mentormesh=debug,tower_http=debug".into()),
    );

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing();

    let (port, data) = match cli.command {
        Some(Commands::Serve { port, data }) => (port, data),
        None => (3000, None),
    };

    let store = match data {
        Some(path) => store::FileStore::open(path, store::IoPolicy::FailOpen)?,
        None => store::FileStore::open_default()?,
    };
    let auth = AuthKeys::from_env()?;

    let app = api::create_router(store.clone(), auth);

    let listener = tokio::net::TcpListener::bind(format!("127.0.0.1:{}", port)).await?;
    tracing::info!("MentorMesh server listening on http://127.0.0.1:{}", port);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    // Flush the universe before exit.
    store.close()?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!("failed to listen for shutdown signal: {}", err);
    }
}
