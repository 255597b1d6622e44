use crate::{Result, error::Error};
use serde::{Deserialize, Serialize};
use std::fmt;

const FNV_OFFSET_BASIS: u32 = 0x811c_9dc5;
const FNV_PRIME: u32 = 0x0100_0193;

/// Compact key derived from a device identifier string.
///
/// The key is the 32-bit FNV-1a hash of the identifier's UTF-8 bytes, so it
/// is stable across runs and machines. Any string yields a key; whether a
/// device answers to it is decided by the registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IdentifierKey(u32);

impl IdentifierKey {
    /// Hash an identifier string.
    #[must_use]
    pub fn from_identifier(identifier: &str) -> Self {
        let hash = identifier.bytes().fold(FNV_OFFSET_BASIS, |hash, byte| {
            (hash ^ u32::from(byte)).wrapping_mul(FNV_PRIME)
        });
        IdentifierKey(hash)
    }

    /// Wrap a key value received in decimal form.
    #[must_use]
    pub const fn from_raw(value: u32) -> Self {
        IdentifierKey(value)
    }

    #[must_use]
    pub const fn as_u32(&self) -> u32 {
        self.0
    }
}

impl fmt::Display for IdentifierKey {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for IdentifierKey {
    type Err = Error;

    /// Parse the decimal form produced by `Display`.
    fn from_str(s: &str) -> Result<Self> {
        s.parse::<u32>()
            .map(IdentifierKey)
            .map_err(|_| Error::InvalidMessageFormat(format!("Invalid identifier key: {s}")))
    }
}

/// Identity of an attached camera as reported by the driver at enumeration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceIdentity {
    /// Driver-level identifier used to open the device and to address it on the wire.
    pub id: String,
    pub name: String,
    pub model: String,
    pub serial: String,
}

impl DeviceIdentity {
    /// Create an identity with the given id and empty descriptive fields.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: String::new(),
            model: String::new(),
            serial: String::new(),
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_serial(mut self, serial: impl Into<String>) -> Self {
        self.serial = serial.into();
        self
    }

    /// Key this device is registered under.
    #[must_use]
    pub fn key(&self) -> IdentifierKey {
        IdentifierKey::from_identifier(&self.id)
    }
}

impl fmt::Display for DeviceIdentity {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "{} (name: {}, model: {}, serial: {})",
            self.id, self.name, self.model, self.serial
        )
    }
}
