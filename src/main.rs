use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use feedback_core::{SheetsClient, SheetsConfig};
use vega_feedback::{api, StorageLatch};

#[derive(Parser)]
#[command(name = "vega-feedback")]
#[command(about = "Feedback intake endpoint for the Vega AI landing page")]
struct Cli {
    /// Port for HTTP API
    #[arg(short, long, env = "PORT", default_value = "8080", global = true)]
    port: u16,

    /// Address to bind
    #[arg(long, default_value = "0.0.0.0", global = true)]
    host: String,

    /// Connect to the spreadsheet before accepting traffic
    #[arg(long, global = true)]
    eager_storage: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the feedback server (default)
    Serve,
    /// Verify spreadsheet configuration and header row, then exit
    CheckSheets,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| {
                "vega_feedback=debug,feedback_core=debug,tower_http=debug".into()
            }),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    match cli.command {
        Some(Commands::CheckSheets) => {
            let client = SheetsClient::connect(SheetsConfig::from_env()?).await?;
            println!(
                "Spreadsheet {} is reachable; sheet '{}' has headers.",
                client.spreadsheet_id(),
                client.sheet_name()
            );
        }
        Some(Commands::Serve) | None => {
            serve(&cli.host, cli.port, cli.eager_storage).await?;
        }
    }

    Ok(())
}

async fn serve(host: &str, port: u16, eager_storage: bool) -> anyhow::Result<()> {
    tracing::info!("Starting Vega feedback server on port {}", port);

    let storage = StorageLatch::from_env();
    if eager_storage && storage.get().await.is_none() {
        tracing::warn!("Serving without spreadsheet storage");
    }

    let app = api::create_router(storage);

    let listener = tokio::net::TcpListener::bind((host, port)).await?;
    tracing::info!("Vega feedback server listening on http://{}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for ctrl-c: {}", e);
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutting down");
}
