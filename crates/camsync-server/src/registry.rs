//! Sessions for every attached camera, keyed by identifier key.
//!
//! The registry is built once at startup and its key set never changes
//! afterwards. Iteration follows driver enumeration order.

use crate::session::DeviceSession;
use camsync_core::{DeviceIdentity, IdentifierKey};
use camsync_hardware::{AnyCamera, AnyDigitalOutput, CameraModule, HardwareError};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;
use tracing::{error, info, warn};

/// What to do when an enumerated camera fails to open.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OpenFailurePolicy {
    /// Fail startup.
    #[default]
    Abort,
    /// Log the failure and serve the remaining cameras.
    Skip,
}

/// Errors that can occur while building the registry.
#[derive(Debug, Error)]
pub enum RegistryError {
    /// The driver could not list cameras.
    #[error("Camera enumeration failed: {0}")]
    Enumeration(#[source] HardwareError),

    /// A camera could not be opened under [`OpenFailurePolicy::Abort`].
    #[error("Failed to open camera {device}: {source}")]
    Open {
        device: String,
        #[source]
        source: HardwareError,
    },

    /// Two identifiers hash to the same key.
    #[error("Identifier key {key} is shared by {first} and {second}")]
    KeyCollision {
        key: IdentifierKey,
        first: String,
        second: String,
    },
}

/// How [`DeviceRegistry::enumerate_and_open`] selects and opens cameras.
#[derive(Debug, Clone)]
pub struct RegistryOptions {
    /// Open only the camera with this identifier.
    pub filter: Option<String>,
    pub open_failure: OpenFailurePolicy,
    /// Acquisition buffers requested per camera.
    pub frame_buffers: u32,
}

impl Default for RegistryOptions {
    fn default() -> Self {
        Self {
            filter: None,
            open_failure: OpenFailurePolicy::Abort,
            frame_buffers: camsync_core::constants::DEFAULT_FRAME_BUFFERS,
        }
    }
}

/// Open sessions indexed by identifier key.
#[derive(Debug, Default)]
pub struct DeviceRegistry {
    sessions: Vec<DeviceSession>,
    index: HashMap<IdentifierKey, usize>,
}

impl DeviceRegistry {
    /// List every camera the driver reports and open a session for each.
    ///
    /// # Errors
    /// Returns `Enumeration` if the driver cannot list cameras,
    /// `KeyCollision` if two identifiers share a key, and `Open` if a camera
    /// fails to open under [`OpenFailurePolicy::Abort`].
    pub fn enumerate_and_open<M>(
        module: &M,
        signal: Option<Arc<AnyDigitalOutput>>,
        options: &RegistryOptions,
    ) -> Result<Self, RegistryError>
    where
        M: CameraModule<Camera = AnyCamera>,
    {
        let cameras = module.list_cameras().map_err(RegistryError::Enumeration)?;
        info!(driver = module.name(), count = cameras.len(), "Enumerated cameras");

        let selected: Vec<DeviceIdentity> = match &options.filter {
            Some(filter) => cameras.into_iter().filter(|c| &c.id == filter).collect(),
            None => cameras,
        };
        if let Some(filter) = &options.filter {
            if selected.is_empty() {
                warn!(filter = %filter, "No camera matches the filter");
            }
        }

        let mut registry = Self::default();
        for identity in selected {
            let key = identity.key();
            if let Some(&existing) = registry.index.get(&key) {
                return Err(RegistryError::KeyCollision {
                    key,
                    first: registry.sessions[existing].identity().id.clone(),
                    second: identity.id,
                });
            }

            let id = identity.id.clone();
            match DeviceSession::open(module, identity, signal.clone(), options.frame_buffers) {
                Ok(session) => registry.insert(session),
                Err(source) => match options.open_failure {
                    OpenFailurePolicy::Abort => {
                        error!(camera = %id, error = %source, "Failed to open camera");
                        return Err(RegistryError::Open { device: id, source });
                    }
                    OpenFailurePolicy::Skip => {
                        warn!(camera = %id, error = %source, "Skipping camera that failed to open");
                    }
                },
            }
        }

        info!(sessions = registry.len(), "Device registry ready");
        Ok(registry)
    }

    fn insert(&mut self, session: DeviceSession) {
        self.index.insert(session.key(), self.sessions.len());
        self.sessions.push(session);
    }

    pub fn lookup(&self, key: IdentifierKey) -> Option<&DeviceSession> {
        self.index.get(&key).map(|&i| &self.sessions[i])
    }

    pub fn lookup_mut(&mut self, key: IdentifierKey) -> Option<&mut DeviceSession> {
        self.index.get(&key).map(|&i| &mut self.sessions[i])
    }

    /// Key addressed by a device-id field.
    ///
    /// The text is hashed first; failing that, decimal text naming a
    /// registered key is accepted as that key.
    pub fn resolve(&self, device: &str) -> Option<IdentifierKey> {
        let hashed = IdentifierKey::from_identifier(device);
        if self.index.contains_key(&hashed) {
            return Some(hashed);
        }
        device
            .parse::<IdentifierKey>()
            .ok()
            .filter(|key| self.index.contains_key(key))
    }

    /// Session addressed by a device-id field.
    pub fn resolve_mut(&mut self, device: &str) -> Option<&mut DeviceSession> {
        let key = self.resolve(device)?;
        self.lookup_mut(key)
    }

    /// Sessions in enumeration order.
    pub fn iter(&self) -> impl Iterator<Item = &DeviceSession> {
        self.sessions.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut DeviceSession> {
        self.sessions.iter_mut()
    }

    /// Keys in enumeration order.
    pub fn keys(&self) -> impl Iterator<Item = IdentifierKey> + '_ {
        self.sessions.iter().map(DeviceSession::key)
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    /// Close every session, logging failures.
    pub fn close_all(&mut self) {
        for session in &mut self.sessions {
            if let Err(e) = session.close() {
                warn!(camera = %session.identity().id, error = %e, "Failed to close camera");
            }
        }
    }
}
