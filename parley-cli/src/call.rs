use anyhow::{Context, Result};
use colored::*;
use dialoguer::Input;
use parley_client::media::RtcMediaStack;
use parley_client::{CallCommand, CallHandle, CallStatus, ClientConfig, start_call};
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};

const SHUTDOWN_WAIT: Duration = Duration::from_secs(2);

pub async fn run(server: String, name: Option<String>, room: Option<String>) -> Result<()> {
    let name = match name {
        Some(name) => name,
        None => Input::<String>::new()
            .with_prompt("Your name")
            .interact_text()?,
    };
    let room = match room {
        Some(room) => Some(room),
        None => {
            let room: String = Input::new()
                .with_prompt("Room to join (empty creates a new one)")
                .allow_empty(true)
                .interact_text()?;
            Some(room).filter(|r| !r.trim().is_empty())
        }
    };

    let config = ClientConfig::default().with_server_url(server.clone());
    let handle = start_call(config, RtcMediaStack::new())
        .await
        .with_context(|| format!("Could not reach signaling server at {}", server))?;

    let command = match room {
        Some(room_id) => CallCommand::JoinRoom {
            room_id,
            display_name: name,
        },
        None => CallCommand::CreateRoom { display_name: name },
    };
    handle.send(command);

    println!(
        "{}",
        "Type 'm' + Enter to toggle mute, 'q' + Enter to hang up.".dimmed()
    );
    drive(&handle).await;

    Ok(())
}

async fn drive(handle: &CallHandle) {
    let mut status = handle.status();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut muted = false;

    loop {
        tokio::select! {
            changed = status.changed() => {
                if changed.is_err() {
                    break;
                }
                let current = status.borrow_and_update().clone();
                print_status(&current);
            }

            line = lines.next_line() => match line {
                Ok(Some(line)) => match line.trim() {
                    "m" => {
                        muted = !muted;
                        handle.send(CallCommand::SetMuted(muted));
                        println!("{}", if muted { "🔇 Muted".yellow() } else { "🎙  Live".green() });
                    }
                    "q" => break,
                    _ => {}
                },
                _ => break,
            },

            _ = tokio::signal::ctrl_c() => break,
        }
    }

    handle.send(CallCommand::Shutdown);
    let _ = tokio::time::timeout(SHUTDOWN_WAIT, async {
        while status.changed().await.is_ok() {
            let current = status.borrow_and_update().clone();
            print_status(&current);
        }
    })
    .await;
}

fn print_status(status: &CallStatus) {
    let text = match status {
        CallStatus::WaitingForPeer { room_id } => {
            format!("Waiting for someone to join. Share room code {}", room_id)
        }
        other => other.to_string(),
    };

    let line = match status {
        CallStatus::Idle => text.as_str().normal(),
        CallStatus::WaitingForPeer { .. } | CallStatus::Connecting => text.as_str().cyan(),
        CallStatus::Connected => text.as_str().green().bold(),
        CallStatus::Unstable => text.as_str().yellow(),
        CallStatus::Failed { .. } | CallStatus::Error { .. } => text.as_str().red().bold(),
        CallStatus::Ended { .. } => text.as_str().dimmed(),
    };
    println!("{}", line);
}
