/// API сервер для обработки табличных данных

use anyhow::Context;
use tracing_subscriber::EnvFilter;

use datalab::{api, AppConfig, FileStore};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Инициализация логирования
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = AppConfig::from_env().context("loading configuration")?;
    let store = FileStore::open(&config.upload_dir)
        .with_context(|| format!("creating upload directory {}", config.upload_dir.display()))?;
    let addr = config.socket_addr()?;

    tracing::info!("Uploads stored in {}", store.root().display());
    let app = api::router(api::AppState::new(store, config));

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("binding {addr}"))?;
    tracing::info!("Server listening on http://{}", addr);
    axum::serve(listener, app).await.context("server error")?;

    Ok(())
}
