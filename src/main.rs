use std::env;

use anyhow::Context;
use axum::Router;
use tokio::net::TcpListener;

use shastra_qa::core::logging;
use shastra_qa::server::router::router;
use shastra_qa::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let state = AppState::initialize()
        .await
        .map_err(|e| anyhow::anyhow!("Failed to initialize: {}", e))?;
    logging::init(&state.paths);

    let port = env::var("PORT")
        .ok()
        .and_then(|val| val.parse::<u16>().ok())
        .unwrap_or(state.config.server.port);
    let bind_addr = format!("127.0.0.1:{}", port);

    let listener = TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("Failed to bind to {}", bind_addr))?;
    let addr = listener.local_addr()?;

    println!("SHASTRA_PORT={}", addr.port());
    tracing::info!("Listening on {}", addr);

    let app: Router = router(state);

    axum::serve(listener, app).await.context("Server error")?;

    Ok(())
}
