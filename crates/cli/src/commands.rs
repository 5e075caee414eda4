//! Sub-commands. Each one drives the bridge exactly as the UI would.

use std::process::ExitCode;

use anyhow::{anyhow, Context};
use bridge::{Bridge, BridgeResponse, MessageEvents};
use clap::{Args, Subcommand};
use domain::{Port, ServerDescriptor, ServerId, TransportKind};
use serde::Serialize;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::warn;

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Manage the server registry
    Servers {
        #[command(subcommand)]
        action: ServersCommand,
    },
    /// Connect to a server, send one message, print the reply, disconnect
    Send {
        /// Registered server id
        id: String,
        /// Message text
        message: String,
    },
    /// Connect to a server and send each line read from stdin
    Chat {
        /// Registered server id
        id: String,
    },
}

#[derive(Debug, Subcommand)]
pub enum ServersCommand {
    /// Print every registered server as JSON
    List,
    /// Register a new server
    Add(ServerArgs),
    /// Replace the server with the same id
    Update(ServerArgs),
    /// Remove a server (succeeds for unknown ids)
    Remove {
        /// Registered server id
        id: String,
    },
}

#[derive(Debug, Args)]
pub struct ServerArgs {
    #[arg(long)]
    id: String,
    #[arg(long)]
    name: String,
    #[arg(long)]
    host: String,
    #[arg(long, value_parser = clap::value_parser!(u16).range(1..))]
    port: u16,
    /// `tcp` or `http`
    #[arg(long, default_value = "tcp")]
    protocol: TransportKind,
}

impl ServerArgs {
    fn into_descriptor(self) -> anyhow::Result<ServerDescriptor> {
        let id = parse_id(&self.id)?;
        let port = Port::new(self.port).ok_or_else(|| anyhow!("port must be in 1..=65535"))?;
        Ok(ServerDescriptor::new(id, self.name, self.host, port).with_protocol(self.protocol))
    }
}

pub async fn execute(
    bridge: &Bridge,
    command: Command,
    reply_buffer: usize,
) -> anyhow::Result<ExitCode> {
    match command {
        Command::Servers { action } => servers(bridge, action).await,
        Command::Send { id, message } => {
            let mut events = bridge.subscribe(reply_buffer);
            let id = parse_id(&id)?;
            if !respond(bridge.connect_server(&id).await)? {
                return Ok(ExitCode::FAILURE);
            }
            let sent = exchange(bridge, &mut events, &message).await?;
            bridge.disconnect_server().await;
            Ok(exit_code(sent))
        }
        Command::Chat { id } => {
            let mut events = bridge.subscribe(reply_buffer);
            let id = parse_id(&id)?;
            if !respond(bridge.connect_server(&id).await)? {
                return Ok(ExitCode::FAILURE);
            }

            let mut lines = BufReader::new(tokio::io::stdin()).lines();
            while let Some(line) = lines.next_line().await.context("failed to read stdin")? {
                let line = line.trim_end();
                if line.is_empty() {
                    continue;
                }
                exchange(bridge, &mut events, line).await?;
            }

            bridge.disconnect_server().await;
            Ok(ExitCode::SUCCESS)
        }
    }
}

async fn servers(bridge: &Bridge, action: ServersCommand) -> anyhow::Result<ExitCode> {
    let response = match action {
        ServersCommand::List => {
            let servers = bridge.list_servers().await;
            println!("{}", serde_json::to_string_pretty(&servers)?);
            return Ok(ExitCode::SUCCESS);
        }
        ServersCommand::Add(args) => bridge.add_server(args.into_descriptor()?).await,
        ServersCommand::Update(args) => bridge.update_server(args.into_descriptor()?).await,
        ServersCommand::Remove { id } => bridge.remove_server(&parse_id(&id)?).await,
    };
    Ok(exit_code(respond(response)?))
}

/// Sends one message, prints the response and, on success, the pushed reply.
async fn exchange(
    bridge: &Bridge,
    events: &mut MessageEvents,
    message: &str,
) -> anyhow::Result<bool> {
    if !respond(bridge.send_message(message).await)? {
        return Ok(false);
    }
    // The reply is dispatched before send_message returns.
    match events.try_recv() {
        Some(event) => print_json(&event)?,
        None => warn!("Reply was not delivered to this session"),
    }
    Ok(true)
}

/// Prints `response` and reports whether it was a success.
fn respond(response: BridgeResponse) -> anyhow::Result<bool> {
    print_json(&response)?;
    Ok(response.is_success())
}

fn print_json(value: &impl Serialize) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string(value)?);
    Ok(())
}

fn parse_id(raw: &str) -> anyhow::Result<ServerId> {
    ServerId::new(raw).ok_or_else(|| anyhow!("server id must not be empty"))
}

fn exit_code(success: bool) -> ExitCode {
    if success {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}
