use crate::config::ClientConfig;
use crate::error::SessionError;
use crate::media::{MediaEvent, MediaStack};
use crate::session::{CallStatus, SessionCoordinator};
use crate::transport::{self, SignalSink, TransportEvent, WsSignalSink};
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{info, warn};

/// Requests from the user interface.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallCommand {
    CreateRoom { display_name: String },
    JoinRoom { room_id: String, display_name: String },
    SetMuted(bool),
    Hangup,
    /// Hangs up and stops the agent.
    Shutdown,
}

/// Handle held by the UI: sends commands, watches status.
#[derive(Debug, Clone)]
pub struct CallHandle {
    commands: mpsc::UnboundedSender<CallCommand>,
    status: watch::Receiver<CallStatus>,
}

impl CallHandle {
    /// Returns `false` when the agent has stopped.
    pub fn send(&self, command: CallCommand) -> bool {
        self.commands.send(command).is_ok()
    }

    pub fn status(&self) -> watch::Receiver<CallStatus> {
        self.status.clone()
    }
}

/// Single task that serializes everything a session reacts to: server
/// signals, media callbacks, user commands and the health tick.
pub struct CallAgent<M: MediaStack, S: SignalSink> {
    coordinator: SessionCoordinator<M, S>,
    media_rx: mpsc::UnboundedReceiver<MediaEvent>,
    transport_rx: mpsc::UnboundedReceiver<TransportEvent>,
    command_rx: mpsc::UnboundedReceiver<CallCommand>,
    health_interval: Duration,
}

impl<M: MediaStack, S: SignalSink> CallAgent<M, S> {
    pub fn new(
        coordinator: SessionCoordinator<M, S>,
        media_rx: mpsc::UnboundedReceiver<MediaEvent>,
        transport_rx: mpsc::UnboundedReceiver<TransportEvent>,
        health_interval: Duration,
    ) -> (Self, CallHandle) {
        let (commands, command_rx) = mpsc::unbounded_channel();
        let handle = CallHandle {
            commands,
            status: coordinator.subscribe(),
        };

        let agent = Self {
            coordinator,
            media_rx,
            transport_rx,
            command_rx,
            health_interval,
        };
        (agent, handle)
    }

    pub async fn run(mut self) {
        info!("Call agent started");
        let mut ticker = tokio::time::interval(self.health_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                event = self.transport_rx.recv() => match event {
                    Some(TransportEvent::Signal(signal)) => self.coordinator.handle_signal(signal).await,
                    Some(TransportEvent::Disconnected) | None => {
                        warn!("Signaling channel closed");
                        self.coordinator.transport_lost().await;
                        break;
                    }
                },

                Some(event) = self.media_rx.recv() => {
                    self.coordinator.handle_media_event(event).await;
                }

                command = self.command_rx.recv() => match command {
                    Some(CallCommand::Shutdown) | None => {
                        self.coordinator.hangup().await;
                        break;
                    }
                    Some(command) => self.handle_command(command).await,
                },

                _ = ticker.tick() => self.coordinator.health_check(Instant::now()),
            }
        }

        info!("Call agent stopped");
    }

    async fn handle_command(&mut self, command: CallCommand) {
        let result = match command {
            CallCommand::CreateRoom { display_name } => {
                self.coordinator.request_create_room(&display_name).await
            }
            CallCommand::JoinRoom {
                room_id,
                display_name,
            } => {
                self.coordinator
                    .request_join_room(&room_id, &display_name)
                    .await
            }
            CallCommand::SetMuted(muted) => {
                self.coordinator.set_muted(muted);
                Ok(())
            }
            CallCommand::Hangup => {
                self.coordinator.hangup().await;
                Ok(())
            }
            CallCommand::Shutdown => Ok(()),
        };

        if let Err(e) = result {
            warn!("Request rejected: {}", e);
            self.coordinator.report(e);
        }
    }
}

/// Connects to the signaling server and spawns an agent driving `media`.
pub async fn start_call<M>(config: ClientConfig, media: M) -> Result<CallHandle, SessionError>
where
    M: MediaStack + 'static,
{
    let (sink, transport_rx) = transport::connect(&config.server_url).await?;
    let health_interval = config.health_check_interval;

    let (coordinator, media_rx) = SessionCoordinator::<M, WsSignalSink>::new(media, sink, config);
    let (agent, handle) = CallAgent::new(coordinator, media_rx, transport_rx, health_interval);
    tokio::spawn(agent.run());

    Ok(handle)
}
