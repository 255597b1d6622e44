//! Mock device implementations for testing and development.
//!
//! This module provides simulated device implementations that can be controlled
//! programmatically without requiring physical hardware.

pub mod camera;
pub mod dio;

pub use camera::{MockCamera, MockCameraConfig, MockCameraHandle, MockCameraModule};
pub use dio::{MockDigitalOutput, MockDigitalOutputHandle};
