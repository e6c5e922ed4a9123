mod config;
mod error;
mod room;
mod signaling;

pub use config::*;
pub use error::RelayError;
pub use room::*;
pub use signaling::*;

use axum::Router;
use axum::routing::get;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tower_http::cors::{Any, CorsLayer};
use tracing::info;

/// Spawns the relay loop and returns the service the WebSocket layer talks to.
pub fn start_signaling(config: &ServerConfig) -> SignalingService {
    let (relay_tx, relay_rx) = mpsc::channel(config.command_capacity);
    let service = SignalingService::new(relay_tx, config.ice_servers.clone());

    let relay = SignalingRelay::new(RoomRegistry::new(), relay_rx, Arc::new(service.clone()));
    tokio::spawn(relay.run());

    service
}

pub fn router(service: SignalingService) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/ws", get(ws_handler))
        .route("/health", get(health_handler))
        .layer(cors)
        .with_state(service)
}

/// Serves on an already bound listener until `shutdown` resolves.
pub async fn serve_on<F>(listener: TcpListener, config: &ServerConfig, shutdown: F) -> anyhow::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let service = start_signaling(config);
    let app = router(service);

    info!("Signaling server listening on http://{}", listener.local_addr()?);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await?;

    info!("Signaling server stopped");
    Ok(())
}

pub async fn serve(config: ServerConfig) -> anyhow::Result<()> {
    let addr = config.listener_addr()?;
    let listener = TcpListener::bind(addr).await?;

    serve_on(listener, &config, async {
        let _ = tokio::signal::ctrl_c().await;
    })
    .await
}
