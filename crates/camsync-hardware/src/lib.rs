//! Hardware abstraction layer for the camera control server.
//!
//! This crate defines the driver boundary the server talks to and ships a
//! simulated backend for development and testing.
//!
//! # Device Traits
//!
//! - [`CameraModule`]: enumerates and opens cameras.
//! - [`CameraDevice`]: typed feature access and callback-driven acquisition.
//! - [`DigitalOutput`]: port and bit writes on a digital-I/O unit.
//!
//! ```
//! use camsync_core::DeviceIdentity;
//! use camsync_hardware::mock::{MockCameraModule, MockDigitalOutput};
//! use camsync_hardware::{CameraDevice, CameraModule, DigitalOutput, FrameInfo};
//! use std::sync::Arc;
//!
//! # fn main() -> camsync_hardware::Result<()> {
//! let module = MockCameraModule::new().with_camera(DeviceIdentity::new("camA"));
//! let handle = module.handle("camA").unwrap();
//! let (dio, levels) = MockDigitalOutput::open(0)?;
//! dio.configure_port_output(0)?;
//! let dio = Arc::new(dio);
//!
//! let mut camera = module.open_camera("camA", 5)?;
//! let output = Arc::clone(&dio);
//! camera.start_capture(Arc::new(move |_frame: &FrameInfo| {
//!     let _ = output.write_bit(0, 0, true);
//! }))?;
//!
//! handle.fire_frame();
//! assert!(levels.bit(0, 0));
//! # Ok(())
//! # }
//! ```
//!
//! # Enum Dispatch
//!
//! [`devices`] wraps every backend in an enum (`AnyCameraModule`,
//! `AnyCamera`, `AnyDigitalOutput`) so callers hold concrete types.

pub mod devices;
pub mod error;
pub mod mock;
pub mod traits;
pub mod types;

pub use devices::{AnyCamera, AnyCameraModule, AnyDigitalOutput};
pub use error::{HardwareError, Result};
pub use traits::{CameraDevice, CameraModule, DigitalOutput};
pub use types::{Dimensions, FrameCallback, FrameInfo, IntRange};
