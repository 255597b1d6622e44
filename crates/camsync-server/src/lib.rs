//! Device-session protocol server.
//!
//! This crate ties the protocol and the hardware layer together:
//!
//! - [`DeviceRegistry`] opens a [`DeviceSession`] for every attached camera,
//!   addressed by its identifier key.
//! - [`CommandRegistry`] maps command codes to typed camera accessors.
//! - [`RequestHandler`] executes requests against the registry and builds
//!   replies.
//! - [`ProtocolServer`] serves the handler over TCP until `quit` or
//!   cancellation.
//! - [`SyncLine`] mirrors every acquired frame on a digital output bit.
//!
//! # Example
//!
//! ```no_run
//! use camsync_server::{
//!     DeviceRegistry, ProtocolServer, RequestHandler, ServerConfig, open_signal_output,
//! };
//! use tokio_util::sync::CancellationToken;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = ServerConfig::default();
//! let signal = open_signal_output(config.dio_unit);
//! let registry = DeviceRegistry::enumerate_and_open(
//!     &config.camera_module(),
//!     signal.clone(),
//!     &config.registry_options(),
//! )?;
//!
//! let token = CancellationToken::new();
//! let server = ProtocolServer::bind(&config, RequestHandler::new(registry, signal), token).await?;
//! server.run().await?;
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod commands;
pub mod config;
pub mod error;
pub mod handler;
pub mod registry;
pub mod server;
pub mod session;
pub mod signal;

pub use client::{ControlClient, ControlClientConfig, ControlClientError};
pub use commands::{CommandDescriptor, CommandRegistry, DispatchError, ValueKind};
pub use config::{ServerConfig, SimulatedCamera};
pub use error::{Result, ServerError};
pub use handler::{Flow, RequestHandler};
pub use registry::{DeviceRegistry, OpenFailurePolicy, RegistryError, RegistryOptions};
pub use server::ProtocolServer;
pub use session::{DeviceSession, SessionState};
pub use signal::{SyncLine, open_signal_output, prepare_signal_output};
