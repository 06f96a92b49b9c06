// reset; cargo run -- --bind 127.0.0.1:8000 --errors-log errors.log
// curl -F "file=@./data/sites.xlsx" http://127.0.0.1:8000/upload

use clap::Parser;
use excel_normalizer::{Settings, router};
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let settings = Settings::parse();
    let ingestor = settings.build_ingestor()?;

    let listener = TcpListener::bind(settings.bind).await?;
    tracing::info!(
        address = %listener.local_addr()?,
        max_file_size = ingestor.max_file_size(),
        batch_size = ?ingestor.batch_size(),
        required_column = ingestor.required_column(),
        "excel normalizer listening"
    );

    axum::serve(listener, router(ingestor))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
}
