//! `camsync` command-line entry point.
//!
//! # Usage
//!
//! Start the server on the default port with one simulated camera:
//! ```bash
//! camsync serve
//! ```
//!
//! Serve two simulated cameras without digital I/O:
//! ```bash
//! camsync serve --simulate camA --simulate camB --no-dio -p 6000
//! ```
//!
//! Query a running server:
//! ```bash
//! camsync request --server 127.0.0.1:6000 get camA 104
//! ```
//!
//! Logging goes to stderr and honors `RUST_LOG` (default `info`).

mod args;

use anyhow::{Context, Result};
use args::{Cli, Command, RequestArgs, ServeArgs};
use camsync_protocol::{Message, Reply};
use camsync_server::{
    ControlClient, ControlClientConfig, DeviceRegistry, ProtocolServer, RequestHandler,
    open_signal_output,
};
use clap::Parser;
use std::process::ExitCode;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<ExitCode> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.command {
        Command::Serve(args) => serve(args).await.map(|()| ExitCode::SUCCESS),
        Command::Request(args) => request(args).await,
    }
}

async fn serve(args: ServeArgs) -> Result<()> {
    let config = args.into_config().context("Failed to load configuration")?;
    config.validate()?;
    info!(version = camsync_core::VERSION, "Starting camsync");

    let signal = if config.dio_enabled {
        open_signal_output(config.dio_unit)
    } else {
        info!("Signal synchronization disabled");
        None
    };

    let registry = DeviceRegistry::enumerate_and_open(
        &config.camera_module(),
        signal.clone(),
        &config.registry_options(),
    )
    .context("Failed to open cameras")?;

    let token = CancellationToken::new();
    let handler = RequestHandler::new(registry, signal);
    let server = ProtocolServer::bind(&config, handler, token.clone()).await?;

    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!("Interrupt received, shutting down");
                token.cancel();
            }
            Err(e) => error!(error = %e, "Failed to listen for interrupt"),
        }
    });

    server.run().await?;
    Ok(())
}

/// Print the reply parts on one line; NAC replies exit non-zero.
async fn request(args: RequestArgs) -> Result<ExitCode> {
    let mut client = ControlClient::new(ControlClientConfig {
        server_addr: args.server,
        timeout: Duration::from_millis(args.timeout_ms),
    });
    client
        .connect()
        .await
        .with_context(|| format!("Failed to connect to {}", args.server))?;

    client.send(Message::from(args.parts)).await?;
    let reply = Reply::from_message(client.recv().await?)?;
    client.close().await?;

    println!("{}", reply.to_message().parts().join(" "));
    Ok(if reply.is_ack() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}
