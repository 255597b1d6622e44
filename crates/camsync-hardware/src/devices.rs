//! Enum wrappers for hardware device dispatch.
//!
//! The server owns concrete types rather than trait objects; each enum lists
//! the available backends and forwards trait calls to the active one. A
//! vendor backend is added as a further variant behind its feature flag.
//!
//! # Examples
//!
//! ```
//! use camsync_core::DeviceIdentity;
//! use camsync_hardware::devices::AnyCameraModule;
//! use camsync_hardware::mock::MockCameraModule;
//! use camsync_hardware::traits::{CameraDevice, CameraModule};
//!
//! let module = AnyCameraModule::Mock(
//!     MockCameraModule::new().with_camera(DeviceIdentity::new("camA")),
//! );
//! let camera = module.open_camera("camA", 5).unwrap();
//! assert_eq!(camera.identity().id, "camA");
//! ```

use crate::mock::{MockCamera, MockCameraModule, MockDigitalOutput};
use crate::traits::{CameraDevice, CameraModule, DigitalOutput};
use crate::{Dimensions, FrameCallback, IntRange, Result};
use camsync_core::DeviceIdentity;

/// Enum wrapper for camera driver dispatch.
#[derive(Debug)]
#[non_exhaustive]
pub enum AnyCameraModule {
    /// Simulated driver for development and testing.
    Mock(MockCameraModule),
}

impl CameraModule for AnyCameraModule {
    type Camera = AnyCamera;

    fn name(&self) -> &str {
        match self {
            Self::Mock(module) => module.name(),
        }
    }

    fn list_cameras(&self) -> Result<Vec<DeviceIdentity>> {
        match self {
            Self::Mock(module) => module.list_cameras(),
        }
    }

    fn open_camera(&self, id: &str, frame_buffers: u32) -> Result<AnyCamera> {
        match self {
            Self::Mock(module) => module.open_camera(id, frame_buffers).map(AnyCamera::Mock),
        }
    }
}

/// Enum wrapper for open camera dispatch.
#[derive(Debug)]
#[non_exhaustive]
pub enum AnyCamera {
    /// Simulated camera for development and testing.
    Mock(MockCamera),
}

impl CameraDevice for AnyCamera {
    fn identity(&self) -> &DeviceIdentity {
        match self {
            Self::Mock(camera) => camera.identity(),
        }
    }

    fn is_open(&self) -> bool {
        match self {
            Self::Mock(camera) => camera.is_open(),
        }
    }

    fn close(&mut self) -> Result<()> {
        match self {
            Self::Mock(camera) => camera.close(),
        }
    }

    fn image_format(&self) -> Result<String> {
        match self {
            Self::Mock(camera) => camera.image_format(),
        }
    }

    fn set_image_format(&mut self, format: &str) -> Result<()> {
        match self {
            Self::Mock(camera) => camera.set_image_format(format),
        }
    }

    fn sensor_bit_depth(&self) -> Result<String> {
        match self {
            Self::Mock(camera) => camera.sensor_bit_depth(),
        }
    }

    fn set_sensor_bit_depth(&mut self, depth: &str) -> Result<()> {
        match self {
            Self::Mock(camera) => camera.set_sensor_bit_depth(depth),
        }
    }

    fn trigger_line(&self) -> Result<String> {
        match self {
            Self::Mock(camera) => camera.trigger_line(),
        }
    }

    fn set_trigger_line(&mut self, line: &str) -> Result<()> {
        match self {
            Self::Mock(camera) => camera.set_trigger_line(line),
        }
    }

    fn trigger_lines(&self) -> Result<Vec<String>> {
        match self {
            Self::Mock(camera) => camera.trigger_lines(),
        }
    }

    fn set_trigger_line_mode(&mut self, mode: &str) -> Result<()> {
        match self {
            Self::Mock(camera) => camera.set_trigger_line_mode(mode),
        }
    }

    fn trigger_line_source(&self) -> Result<String> {
        match self {
            Self::Mock(camera) => camera.trigger_line_source(),
        }
    }

    fn set_trigger_line_source(&mut self, source: &str) -> Result<()> {
        match self {
            Self::Mock(camera) => camera.set_trigger_line_source(source),
        }
    }

    fn trigger_line_sources(&self) -> Result<Vec<String>> {
        match self {
            Self::Mock(camera) => camera.trigger_line_sources(),
        }
    }

    fn exposure_time_us(&self) -> Result<f64> {
        match self {
            Self::Mock(camera) => camera.exposure_time_us(),
        }
    }

    fn set_exposure_time_us(&mut self, value: f64) -> Result<()> {
        match self {
            Self::Mock(camera) => camera.set_exposure_time_us(value),
        }
    }

    fn frame_rate(&self) -> Result<f64> {
        match self {
            Self::Mock(camera) => camera.frame_rate(),
        }
    }

    fn set_frame_rate(&mut self, value: f64) -> Result<()> {
        match self {
            Self::Mock(camera) => camera.set_frame_rate(value),
        }
    }

    fn frame_rate_auto(&self) -> Result<bool> {
        match self {
            Self::Mock(camera) => camera.frame_rate_auto(),
        }
    }

    fn set_frame_rate_auto(&mut self, enabled: bool) -> Result<()> {
        match self {
            Self::Mock(camera) => camera.set_frame_rate_auto(enabled),
        }
    }

    fn image_size(&self) -> Result<Dimensions> {
        match self {
            Self::Mock(camera) => camera.image_size(),
        }
    }

    fn set_image_size(&mut self, size: Dimensions) -> Result<()> {
        match self {
            Self::Mock(camera) => camera.set_image_size(size),
        }
    }

    fn image_offset(&self) -> Result<Dimensions> {
        match self {
            Self::Mock(camera) => camera.image_offset(),
        }
    }

    fn set_image_offset(&mut self, offset: Dimensions) -> Result<()> {
        match self {
            Self::Mock(camera) => camera.set_image_offset(offset),
        }
    }

    fn sensor_size(&self) -> Result<Dimensions> {
        match self {
            Self::Mock(camera) => camera.sensor_size(),
        }
    }

    fn throughput_limit(&self) -> Result<i64> {
        match self {
            Self::Mock(camera) => camera.throughput_limit(),
        }
    }

    fn set_throughput_limit(&mut self, value: i64) -> Result<()> {
        match self {
            Self::Mock(camera) => camera.set_throughput_limit(value),
        }
    }

    fn throughput_limit_range(&self) -> Result<IntRange> {
        match self {
            Self::Mock(camera) => camera.throughput_limit_range(),
        }
    }

    fn is_capturing(&self) -> bool {
        match self {
            Self::Mock(camera) => camera.is_capturing(),
        }
    }

    fn start_capture(&mut self, callback: FrameCallback) -> Result<()> {
        match self {
            Self::Mock(camera) => camera.start_capture(callback),
        }
    }

    fn stop_capture(&mut self) -> Result<()> {
        match self {
            Self::Mock(camera) => camera.stop_capture(),
        }
    }
}

/// Enum wrapper for digital-I/O dispatch.
#[derive(Debug)]
#[non_exhaustive]
pub enum AnyDigitalOutput {
    /// Simulated unit for development and testing.
    Mock(MockDigitalOutput),
}

impl DigitalOutput for AnyDigitalOutput {
    fn name(&self) -> &str {
        match self {
            Self::Mock(dio) => dio.name(),
        }
    }

    fn configure_port_output(&self, port: u8) -> Result<()> {
        match self {
            Self::Mock(dio) => dio.configure_port_output(port),
        }
    }

    fn write_port(&self, port: u8, value: u8) -> Result<()> {
        match self {
            Self::Mock(dio) => dio.write_port(port, value),
        }
    }

    fn write_bit(&self, port: u8, bit: u8, high: bool) -> Result<()> {
        match self {
            Self::Mock(dio) => dio.write_bit(port, bit, high),
        }
    }

    fn close(&self) -> Result<()> {
        match self {
            Self::Mock(dio) => dio.close(),
        }
    }
}
