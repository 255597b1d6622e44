//! Command-line arguments.

use camsync_core::constants::DEFAULT_PORT;
use camsync_server::{OpenFailurePolicy, ServerConfig, SimulatedCamera};
use clap::{Args, Parser, Subcommand};
use std::net::SocketAddr;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "camsync")]
#[command(author, version, about = "Camera control server with frame-synchronized digital output")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run the control server
    Serve(ServeArgs),

    /// Send one request to a running server and print the reply
    Request(RequestArgs),
}

#[derive(Args, Debug, Default)]
pub struct ServeArgs {
    /// Configuration file (TOML); flags override its values
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Serve only the camera with this identifier
    #[arg(short = 'c', long = "camera")]
    pub camera: Option<String>,

    /// Digital-I/O unit (minor number)
    #[arg(short = 'a', long = "adio")]
    pub adio: Option<u32>,

    /// TCP port, 5000-65535
    #[arg(short = 'p', long)]
    pub port: Option<u16>,

    /// Listener address
    #[arg(long = "bind")]
    pub bind: Option<String>,

    /// Run without signal synchronization
    #[arg(long)]
    pub no_dio: bool,

    /// Serve the remaining cameras when one fails to open
    #[arg(long)]
    pub skip_unopenable: bool,

    /// Attach a simulated camera with this identifier (repeatable)
    #[arg(long = "simulate", value_name = "ID")]
    pub simulate: Vec<String>,
}

impl ServeArgs {
    /// Load the configuration file, if any, and apply the flags on top.
    ///
    /// # Errors
    /// Returns the loader's error if the file cannot be read or parsed.
    pub fn into_config(self) -> camsync_server::Result<ServerConfig> {
        let mut config = match &self.config {
            Some(path) => ServerConfig::from_toml_file(path)?,
            None => ServerConfig::default(),
        };

        if let Some(camera) = self.camera {
            config.camera_filter = Some(camera);
        }
        if let Some(unit) = self.adio {
            config.dio_unit = unit;
        }
        if let Some(port) = self.port {
            config.port = port;
        }
        if let Some(bind) = self.bind {
            config.bind_address = bind;
        }
        if self.no_dio {
            config.dio_enabled = false;
        }
        if self.skip_unopenable {
            config.open_failure = OpenFailurePolicy::Skip;
        }
        if !self.simulate.is_empty() {
            config.simulated_cameras = self.simulate.into_iter().map(SimulatedCamera::new).collect();
        }
        Ok(config)
    }
}

#[derive(Args, Debug)]
pub struct RequestArgs {
    /// Server address
    #[arg(long, default_value_t = SocketAddr::from(([127, 0, 0, 1], DEFAULT_PORT)))]
    pub server: SocketAddr,

    /// Reply timeout in milliseconds
    #[arg(long, default_value_t = 3000)]
    pub timeout_ms: u64,

    /// Request parts, e.g. `get camA 104`
    #[arg(required = true, num_args = 1.., allow_hyphen_values = true)]
    pub parts: Vec<String>,
}
