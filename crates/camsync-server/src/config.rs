//! Server startup configuration.
//!
//! Loaded from a TOML file, then overridden by command-line flags. Every
//! key is optional:
//!
//! ```toml
//! port = 5555
//! bind_address = "0.0.0.0"
//! camera_filter = "DEV_000F315B91E2"
//! dio_unit = 0
//! dio_enabled = true
//! poll_timeout_ms = 1000
//! frame_buffers = 5
//! max_frame_size = 65536
//! open_failure = "abort"
//!
//! [[simulated_cameras]]
//! id = "DEV_000F315B91E2"
//! model = "Mako G-234B"
//! frame_interval_ms = 33
//! ```

use crate::error::{Result, ServerError};
use crate::registry::{OpenFailurePolicy, RegistryOptions};
use camsync_core::DeviceIdentity;
use camsync_core::constants::{
    DEFAULT_BIND_ADDRESS, DEFAULT_DIO_UNIT, DEFAULT_FRAME_BUFFERS, DEFAULT_MAX_FRAME_SIZE,
    DEFAULT_POLL_TIMEOUT_MS, DEFAULT_PORT, PORT_RANGE,
};
use camsync_hardware::AnyCameraModule;
use camsync_hardware::mock::{MockCameraConfig, MockCameraModule};
use serde::{Deserialize, Serialize};
use std::net::{IpAddr, SocketAddr};
use std::path::Path;
use std::time::Duration;

/// One simulated camera attached to the mock driver.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimulatedCamera {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub model: String,
    #[serde(default)]
    pub serial: String,
    /// Free-running frame interval; frames are only delivered on demand
    /// when unset.
    #[serde(default)]
    pub frame_interval_ms: Option<u64>,
    /// Refuse every open attempt.
    #[serde(default)]
    pub fail_open: bool,
}

impl SimulatedCamera {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: String::new(),
            model: String::new(),
            serial: String::new(),
            frame_interval_ms: None,
            fail_open: false,
        }
    }

    fn to_mock_config(&self) -> MockCameraConfig {
        let identity = DeviceIdentity::new(self.id.as_str())
            .with_name(self.name.as_str())
            .with_model(self.model.as_str())
            .with_serial(self.serial.as_str());
        let mut config = MockCameraConfig::new(identity).with_fail_open(self.fail_open);
        if let Some(ms) = self.frame_interval_ms.filter(|&ms| ms > 0) {
            config = config.with_frame_interval(Duration::from_millis(ms));
        }
        config
    }
}

fn default_simulated_cameras() -> Vec<SimulatedCamera> {
    vec![SimulatedCamera {
        name: "Simulated camera".to_string(),
        model: "Mock 1936".to_string(),
        serial: "0000000001".to_string(),
        ..SimulatedCamera::new("SIM_CAM_0")
    }]
}

/// Settings read at startup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub port: u16,
    pub bind_address: String,
    /// Serve only the camera with this identifier.
    pub camera_filter: Option<String>,
    /// Digital-I/O unit (minor number).
    pub dio_unit: u32,
    /// Mirror acquisition on the digital-I/O unit.
    pub dio_enabled: bool,
    /// Longest the server loop waits before re-checking for shutdown.
    pub poll_timeout_ms: u64,
    pub frame_buffers: u32,
    pub max_frame_size: usize,
    pub open_failure: OpenFailurePolicy,
    pub simulated_cameras: Vec<SimulatedCamera>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            bind_address: DEFAULT_BIND_ADDRESS.to_string(),
            camera_filter: None,
            dio_unit: DEFAULT_DIO_UNIT,
            dio_enabled: true,
            poll_timeout_ms: DEFAULT_POLL_TIMEOUT_MS,
            frame_buffers: DEFAULT_FRAME_BUFFERS,
            max_frame_size: DEFAULT_MAX_FRAME_SIZE,
            open_failure: OpenFailurePolicy::Abort,
            simulated_cameras: default_simulated_cameras(),
        }
    }
}

impl ServerConfig {
    /// Parse a TOML document. Missing keys take their defaults.
    ///
    /// # Errors
    /// Returns `ConfigParse` if the document is not valid.
    pub fn from_toml_str(text: &str) -> Result<Self> {
        Ok(toml::from_str(text)?)
    }

    /// Read and parse a TOML file.
    ///
    /// # Errors
    /// Returns `ConfigRead` if the file cannot be read and `ConfigParse` if
    /// it is not valid.
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ServerError::ConfigRead {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    /// Check every setting.
    ///
    /// # Errors
    /// Returns `InvalidPort` for a port outside the registered range,
    /// `InvalidAddress` for an unparsable bind address and `Config` for
    /// zero-valued limits.
    pub fn validate(&self) -> Result<()> {
        if !PORT_RANGE.contains(&self.port) {
            return Err(ServerError::InvalidPort {
                port: self.port,
                min: *PORT_RANGE.start(),
                max: *PORT_RANGE.end(),
            });
        }
        self.socket_addr()?;
        if self.poll_timeout_ms == 0 {
            return Err(ServerError::Config("poll_timeout_ms must be positive".into()));
        }
        if self.frame_buffers == 0 {
            return Err(ServerError::Config("frame_buffers must be positive".into()));
        }
        if self.max_frame_size == 0 {
            return Err(ServerError::Config("max_frame_size must be positive".into()));
        }
        Ok(())
    }

    /// Listener address.
    ///
    /// # Errors
    /// Returns `InvalidAddress` if `bind_address` is not an IP address.
    pub fn socket_addr(&self) -> Result<SocketAddr> {
        let ip: IpAddr = self
            .bind_address
            .parse()
            .map_err(|_| ServerError::InvalidAddress(self.bind_address.clone()))?;
        Ok(SocketAddr::new(ip, self.port))
    }

    pub fn poll_timeout(&self) -> Duration {
        Duration::from_millis(self.poll_timeout_ms)
    }

    pub fn registry_options(&self) -> RegistryOptions {
        RegistryOptions {
            filter: self.camera_filter.clone(),
            open_failure: self.open_failure,
            frame_buffers: self.frame_buffers,
        }
    }

    /// Camera driver serving the configured simulated cameras.
    pub fn camera_module(&self) -> AnyCameraModule {
        let module = self
            .simulated_cameras
            .iter()
            .fold(MockCameraModule::new(), |module, camera| {
                module.with_config(camera.to_mock_config())
            });
        AnyCameraModule::Mock(module)
    }
}
