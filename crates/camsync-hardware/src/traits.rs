//! Hardware device trait definitions.
//!
//! Three traits form the boundary to vendor drivers:
//!
//! - [`CameraModule`]: the driver entry point; enumerates and opens cameras.
//! - [`CameraDevice`]: one open camera with typed feature access and
//!   callback-driven acquisition.
//! - [`DigitalOutput`]: a digital-I/O unit whose port bits mirror acquisition.
//!
//! Camera calls are synchronous; vendor SDKs block on the calling thread and
//! deliver frames on a thread of their own. `DigitalOutput` takes `&self` so
//! the frame callback can drive it concurrently with the control path.

use crate::error::Result;
use crate::types::{Dimensions, FrameCallback, IntRange};
use camsync_core::DeviceIdentity;

/// Entry point of a camera driver.
pub trait CameraModule {
    type Camera: CameraDevice;

    /// Driver name, for logs.
    fn name(&self) -> &str;

    /// Identities of all attached cameras, in driver order.
    fn list_cameras(&self) -> Result<Vec<DeviceIdentity>>;

    /// Open the camera with the given identifier, allocating `frame_buffers`
    /// acquisition buffers.
    fn open_camera(&self, id: &str, frame_buffers: u32) -> Result<Self::Camera>;
}

/// An opened camera.
///
/// Getters and setters fail with `DeviceNotOpen` once [`close`](Self::close)
/// has been called. Value checks are left to the device: out-of-range input
/// surfaces as `InvalidValue`, state conflicts as `InvalidAccess`.
pub trait CameraDevice: Send {
    fn identity(&self) -> &DeviceIdentity;

    fn is_open(&self) -> bool;

    /// Release the handle. Stops a running capture first. Idempotent.
    fn close(&mut self) -> Result<()>;

    fn image_format(&self) -> Result<String>;
    fn set_image_format(&mut self, format: &str) -> Result<()>;

    fn sensor_bit_depth(&self) -> Result<String>;
    fn set_sensor_bit_depth(&mut self, depth: &str) -> Result<()>;

    /// Currently selected trigger line.
    fn trigger_line(&self) -> Result<String>;
    fn set_trigger_line(&mut self, line: &str) -> Result<()>;
    fn trigger_lines(&self) -> Result<Vec<String>>;

    /// Set the I/O mode of the selected trigger line.
    fn set_trigger_line_mode(&mut self, mode: &str) -> Result<()>;

    /// Source driving the selected trigger line.
    fn trigger_line_source(&self) -> Result<String>;
    fn set_trigger_line_source(&mut self, source: &str) -> Result<()>;
    fn trigger_line_sources(&self) -> Result<Vec<String>>;

    fn exposure_time_us(&self) -> Result<f64>;
    fn set_exposure_time_us(&mut self, value: f64) -> Result<()>;

    fn frame_rate(&self) -> Result<f64>;
    fn set_frame_rate(&mut self, value: f64) -> Result<()>;

    fn frame_rate_auto(&self) -> Result<bool>;
    fn set_frame_rate_auto(&mut self, enabled: bool) -> Result<()>;

    fn image_size(&self) -> Result<Dimensions>;
    fn set_image_size(&mut self, size: Dimensions) -> Result<()>;

    fn image_offset(&self) -> Result<Dimensions>;
    fn set_image_offset(&mut self, offset: Dimensions) -> Result<()>;

    fn sensor_size(&self) -> Result<Dimensions>;

    /// Link throughput limit in bytes per second.
    fn throughput_limit(&self) -> Result<i64>;
    fn set_throughput_limit(&mut self, value: i64) -> Result<()>;
    fn throughput_limit_range(&self) -> Result<IntRange>;

    fn is_capturing(&self) -> bool;

    /// Begin streaming; `callback` runs on the driver's thread for each frame.
    fn start_capture(&mut self, callback: FrameCallback) -> Result<()>;

    /// Stop streaming. Once this returns the callback is no longer invoked.
    fn stop_capture(&mut self) -> Result<()>;
}

/// A digital-I/O unit with 8-bit ports.
pub trait DigitalOutput: Send + Sync {
    fn name(&self) -> &str;

    /// Configure every bit of `port` as an output.
    fn configure_port_output(&self, port: u8) -> Result<()>;

    /// Write all eight bits of `port`.
    fn write_port(&self, port: u8, value: u8) -> Result<()>;

    /// Drive a single bit of `port`.
    fn write_bit(&self, port: u8, bit: u8, high: bool) -> Result<()>;

    /// Release the unit. Idempotent.
    fn close(&self) -> Result<()>;
}
