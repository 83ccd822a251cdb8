use anyhow::Context;
use backend::api::{self, AppState};
use backend::config::ServerConfig;
use backend::engine::{resolve_engine_path, StockfishFactory};
use backend::store::GameStore;
use clap::Parser;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = ServerConfig::parse();

    std::fs::create_dir_all(&config.games_dir)
        .with_context(|| format!("creating games directory {}", config.games_dir.display()))?;

    let engine_path = resolve_engine_path(config.stockfish_path.as_deref());
    tracing::info!("Stockfish path: {}", engine_path.display());
    let engines = StockfishFactory::new(engine_path, config.engine_move_time()).into_shared();

    let state = AppState::new(Arc::new(GameStore::new(engines)), config.games_dir.clone());
    let app = api::router(state);

    let addr = config.socket_addr();
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("binding {}", addr))?;
    tracing::info!("3D chess backend listening on http://{}", addr);

    axum::serve(listener, app).await.context("server error")?;
    Ok(())
}
