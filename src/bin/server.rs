use anyhow::Result;
use clap::Parser;
use sheet_loader::config::load_config;
use sheet_loader::http::app_server::AppServer;
use sheet_loader::Importer;
use std::path::PathBuf;
use std::time::Instant;

#[derive(Parser)]
#[command(name = "sheet-loader-server", about = "Spreadsheet upload server")]
struct Cli {
    /// Path to a TOML config file
    #[arg(long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let now = Instant::now();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let cli = Cli::parse();

    tracing::info!("Starting sheet loader server");

    let config = load_config(cli.config.as_deref())?;
    config.validate()?;
    tracing::info!(
        database = %config.database_path.display(),
        uploads = %config.upload_dir.display(),
        "Configuration loaded"
    );

    let addr = format!("{}:{}", config.host, config.port);
    let app = AppServer::new(Importer::new(config)?)?;
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    tracing::info!("Server started in {}ms", now.elapsed().as_millis());
    tracing::info!("Server listening on {}", addr);

    axum::serve(listener, app.router)
        .with_graceful_shutdown(shutdown())
        .await?;

    tracing::info!("Server shutdown complete");
    Ok(())
}

async fn shutdown() {
    let ctrl_c = async {
        if let Err(error) = tokio::signal::ctrl_c().await {
            tracing::error!(%error, "failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(error) => {
                tracing::error!(%error, "failed to install signal handler");
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

    tracing::info!("Shutdown signal received, stopping server...");
}
