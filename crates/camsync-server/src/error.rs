//! Error types for server startup and the control client.

use crate::registry::RegistryError;
use std::net::SocketAddr;
use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for server operations.
pub type Result<T> = std::result::Result<T, ServerError>;

/// Errors that stop the server from starting or running.
///
/// Request-level failures never surface here; they become NAC replies.
#[derive(Debug, Error)]
pub enum ServerError {
    /// Port outside the registered range.
    #[error("Invalid port {port}: must be within {min}..={max}")]
    InvalidPort { port: u16, min: u16, max: u16 },

    /// Bind address does not parse.
    #[error("Invalid bind address: {0}")]
    InvalidAddress(String),

    /// Failed to bind the listener
    #[error("Failed to bind to {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: std::io::Error,
    },

    /// Configuration file could not be read.
    #[error("Failed to read configuration {path}: {source}")]
    ConfigRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Configuration file is not valid TOML for [`ServerConfig`](crate::ServerConfig).
    #[error("Invalid configuration: {0}")]
    ConfigParse(#[from] toml::de::Error),

    /// Any other invalid setting.
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// Device enumeration or open failed.
    #[error(transparent)]
    Registry(#[from] RegistryError),

    /// Low-level I/O error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
