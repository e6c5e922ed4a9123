use crate::error::RelayError;
use crate::room::{Departure, RelayCommand, RoomRegistry};
use crate::signaling::SignalingOutput;
use parley_core::{ClientSignal, ConnectionId, Participant, RoomId, ServerSignal};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// How a rejected relay is reported back to its sender.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Rejection {
    /// Offer/answer: rare and user-visible, so the sender gets an error message.
    Surface,
    /// Candidate: frequent and best-effort, so only the server log sees it.
    LogOnly,
}

/// Single writer over the room table. Every inbound message is handled to
/// completion, notifications included, before the next one is looked at.
pub struct SignalingRelay {
    registry: RoomRegistry,
    command_rx: mpsc::Receiver<RelayCommand>,
    output: Arc<dyn SignalingOutput>,
}

impl SignalingRelay {
    pub fn new(
        registry: RoomRegistry,
        command_rx: mpsc::Receiver<RelayCommand>,
        output: Arc<dyn SignalingOutput>,
    ) -> Self {
        Self {
            registry,
            command_rx,
            output,
        }
    }

    pub async fn run(mut self) {
        info!("Signaling relay started");

        while let Some(cmd) = self.command_rx.recv().await {
            self.handle_command(cmd).await;
        }

        info!("Command channel closed. Signaling relay stopped.");
    }

    pub async fn handle_command(&mut self, cmd: RelayCommand) {
        match cmd {
            RelayCommand::Signal {
                connection_id,
                signal,
            } => self.handle_signal(connection_id, signal).await,

            RelayCommand::Disconnect { connection_id } => {
                info!("Connection {} gone, clearing its rooms", connection_id);
                let departures = self.registry.leave_all(&connection_id);
                self.notify_departures(departures).await;
            }

            RelayCommand::RoomCount { reply } => {
                let _ = reply.send(self.registry.len());
            }
        }
    }

    async fn handle_signal(&mut self, from: ConnectionId, signal: ClientSignal) {
        match signal {
            ClientSignal::CreateRoom { display_name } => {
                let room_id = self
                    .registry
                    .create_room(Participant::new(from, display_name));
                self.output
                    .send(from, ServerSignal::RoomCreated { room_id })
                    .await;
            }

            ClientSignal::JoinRoom {
                room_id,
                display_name,
            } => {
                let room_id = normalize(room_id);
                let participant = Participant::new(from, display_name.clone());

                match self.registry.join_room(&room_id, participant) {
                    Ok(joined) => {
                        let peer_name = joined.existing.as_ref().map(|p| p.display_name.clone());
                        self.output
                            .send(
                                from,
                                ServerSignal::RoomJoined {
                                    room_id: room_id.clone(),
                                    peer_name,
                                },
                            )
                            .await;

                        if joined.rejoined {
                            return;
                        }
                        if let Some(existing) = joined.existing {
                            self.output
                                .send(
                                    existing.connection_id,
                                    ServerSignal::PeerJoined { display_name },
                                )
                                .await;
                        }
                    }
                    Err(e) => self.send_error(from, &e).await,
                }
            }

            ClientSignal::Offer { room_id, sdp } => {
                self.forward(from, room_id, ServerSignal::Offer { sdp }, Rejection::Surface)
                    .await;
            }

            ClientSignal::Answer { room_id, sdp } => {
                self.forward(from, room_id, ServerSignal::Answer { sdp }, Rejection::Surface)
                    .await;
            }

            ClientSignal::Candidate { room_id, candidate } => {
                self.forward(
                    from,
                    room_id,
                    ServerSignal::Candidate { candidate },
                    Rejection::LogOnly,
                )
                .await;
            }

            ClientSignal::LeaveRoom { room_id } => {
                let room_id = normalize(room_id);
                let departure = self.registry.leave_room(&room_id, &from);
                self.notify_departures(departure.into_iter().collect()).await;
            }
        }
    }

    async fn forward(
        &self,
        from: ConnectionId,
        room_id: Option<RoomId>,
        signal: ServerSignal,
        rejection: Rejection,
    ) {
        let target = match self.resolve_peer(&from, room_id) {
            Ok(target) => target,
            Err(e) => {
                match rejection {
                    Rejection::Surface => self.send_error(from, &e).await,
                    Rejection::LogOnly => {
                        warn!("Dropping candidate from {}: {}", from, e);
                    }
                }
                return;
            }
        };

        match target {
            Some(peer) => {
                debug!("Relaying {} from {} to {}", op_name(&signal), from, peer);
                self.output.send(peer, signal).await;
            }
            None => {
                debug!(
                    "No peer in room yet, {} from {} dropped",
                    op_name(&signal),
                    from
                );
            }
        }
    }

    /// Validates membership and returns the other member, if there is one.
    fn resolve_peer(
        &self,
        from: &ConnectionId,
        room_id: Option<RoomId>,
    ) -> Result<Option<ConnectionId>, RelayError> {
        let room_id = match room_id {
            Some(room_id) => normalize(room_id),
            None => self
                .registry
                .room_of(from)
                .cloned()
                .ok_or(RelayError::NoRoom)?,
        };

        let peer = self.registry.peer_of(&room_id, from)?;
        Ok(peer.map(|p| p.connection_id))
    }

    async fn notify_departures(&self, departures: Vec<Departure>) {
        for departure in departures {
            if let Some(remaining) = departure.remaining {
                debug!(
                    "Notifying {} that its peer left room {}",
                    remaining, departure.room_id
                );
                self.output.send(remaining, ServerSignal::PeerLeft).await;
            }
        }
    }

    async fn send_error(&self, to: ConnectionId, error: &RelayError) {
        info!("Rejecting request from {}: {}", to, error);
        self.output
            .send(
                to,
                ServerSignal::Error {
                    message: error.to_string(),
                    kind: error.kind(),
                },
            )
            .await;
    }
}

/// Room ids are typed by humans; fall back to the raw value if it does not parse
/// so the lookup simply misses.
fn normalize(room_id: RoomId) -> RoomId {
    RoomId::parse(room_id.as_str()).unwrap_or(room_id)
}

fn op_name(signal: &ServerSignal) -> &'static str {
    match signal {
        ServerSignal::Offer { .. } => "offer",
        ServerSignal::Answer { .. } => "answer",
        ServerSignal::Candidate { .. } => "candidate",
        _ => "message",
    }
}
