use crate::room::RelayCommand;
use crate::signaling::SignalingService;
use axum::Json;
use axum::extract::State;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::response::IntoResponse;
use futures::{SinkExt, StreamExt};
use parley_core::{ClientSignal, ConnectionId, ErrorKind, ServerSignal};
use serde::Serialize;
use tokio::sync::mpsc;
use tracing::{error, info, warn};

pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(service): State<SignalingService>,
) -> impl IntoResponse {
    let connection_id = ConnectionId::new();

    ws.on_upgrade(move |socket| handle_socket(socket, connection_id, service))
}

async fn handle_socket(socket: WebSocket, connection_id: ConnectionId, service: SignalingService) {
    info!("New WebSocket connection: {}", connection_id);

    let (mut sender, mut receiver) = socket.split();
    let (tx, mut rx) = mpsc::unbounded_channel();

    service.add_connection(connection_id, tx);
    service.send_signal(connection_id, &ServerSignal::Welcome { connection_id });
    service.send_signal(
        connection_id,
        &ServerSignal::IceConfig {
            ice_servers: service.ice_servers(),
        },
    );

    let mut send_task = tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            if sender.send(msg).await.is_err() {
                break;
            }
        }
    });

    let mut recv_task = tokio::spawn({
        let service = service.clone();

        async move {
            while let Some(Ok(msg)) = receiver.next().await {
                match msg {
                    Message::Text(text) => {
                        match serde_json::from_str::<ClientSignal>(text.as_str()) {
                            Ok(signal) => {
                                let cmd = RelayCommand::Signal {
                                    connection_id,
                                    signal,
                                };
                                if let Err(e) = service.relay_tx.send(cmd).await {
                                    error!("Relay died: {}", e);
                                    break;
                                }
                            }
                            Err(e) => {
                                warn!("Invalid signal from {}: {}", connection_id, e);
                                service.send_signal(
                                    connection_id,
                                    &ServerSignal::Error {
                                        message: format!("Malformed message: {}", e),
                                        kind: ErrorKind::InvalidMessage,
                                    },
                                );
                            }
                        }
                    }
                    Message::Close(_) => break,
                    _ => {}
                }
            }
        }
    });

    tokio::select! {
        _ = (&mut send_task) => recv_task.abort(),
        _ = (&mut recv_task) => send_task.abort(),
    };

    // Either side ending means the connection is gone for the relay.
    let _ = service
        .relay_tx
        .send(RelayCommand::Disconnect { connection_id })
        .await;

    service.remove_connection(&connection_id);
    info!("WebSocket disconnected: {}", connection_id);
}

#[derive(Debug, Serialize)]
pub struct Health {
    pub status: &'static str,
    pub rooms: Option<usize>,
    pub connections: usize,
}

pub async fn health_handler(State(service): State<SignalingService>) -> Json<Health> {
    Json(Health {
        status: "ok",
        rooms: service.room_count().await,
        connections: service.connection_count(),
    })
}
