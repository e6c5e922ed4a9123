mod call;
mod logging;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::*;
use parley_server::{LogFormat, ServerConfig};

#[derive(Parser)]
#[command(name = "parley", version, about = "Two-party audio calls over WebRTC")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the signaling server.
    Serve {
        #[arg(long)]
        host: Option<String>,

        #[arg(short, long)]
        port: Option<u16>,

        /// `compact` or `json`; overrides the configured format.
        #[arg(long)]
        log_format: Option<String>,
    },
    /// Start or join a call from the terminal.
    Call {
        #[arg(short, long, default_value = "ws://127.0.0.1:3000/ws")]
        server: String,

        /// Display name shown to the other participant.
        #[arg(short, long)]
        name: Option<String>,

        /// Room to join. Prompted for when omitted; leave empty to create one.
        #[arg(short, long)]
        room: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Serve {
            host,
            port,
            log_format,
        } => {
            let mut config = ServerConfig::load().context("Failed to load server configuration")?;
            if let Some(host) = host {
                config.host = host;
                config.bind_addr = None;
            }
            if let Some(port) = port {
                config.port = port;
                config.bind_addr = None;
            }
            match log_format.as_deref() {
                Some("json") => config.log_format = LogFormat::Json,
                Some("compact") => config.log_format = LogFormat::Compact,
                Some(other) => anyhow::bail!("Unknown log format '{}'", other),
                None => {}
            }
            config.validate()?;

            logging::init(config.log_format, "info");
            println!(
                "{} {}",
                "📡 Parley signaling server on".green().bold(),
                config.listener_addr()?.to_string().cyan()
            );
            parley_server::serve(config).await?;
        }

        Commands::Call { server, name, room } => {
            logging::init(LogFormat::Compact, "warn");
            call::run(server, name, room).await?;
        }
    }

    Ok(())
}
