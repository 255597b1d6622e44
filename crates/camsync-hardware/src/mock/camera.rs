//! Simulated camera driver.
//!
//! [`MockCameraModule`] plays the role of a vendor camera SDK: it lists a
//! configured set of cameras and opens them as [`MockCamera`]s. Each camera
//! keeps its feature values in shared state, so a [`MockCameraHandle`] can
//! observe it and inject frames while the control path owns the camera.
//!
//! Frames reach the registered callback in one of two ways:
//!
//! - on demand, from [`MockCameraHandle::fire_frame`], on the caller's thread;
//! - free-running, from a per-camera acquisition thread when a frame interval
//!   is configured.

use crate::error::{HardwareError, Result};
use crate::traits::{CameraDevice, CameraModule};
use crate::types::{Dimensions, FrameCallback, FrameInfo, IntRange};
use camsync_core::{DeviceIdentity, Status};
use chrono::Utc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread::JoinHandle;
use std::time::Duration;
use tracing::{debug, info};

const PIXEL_FORMATS: [&str; 4] = ["Mono8", "Mono10", "Mono12", "Mono16"];
const BIT_DEPTHS: [&str; 3] = ["Bpp8", "Bpp10", "Bpp12"];
const TRIGGER_LINES: [&str; 4] = ["Line0", "Line1", "Line2", "Line3"];
const LINE_MODES: [&str; 2] = ["Input", "Output"];
const LINE_SOURCES: [&str; 4] = ["Off", "ExposureActive", "FrameTriggerWait", "AcquisitionActive"];

const SENSOR_SIZE: Dimensions = Dimensions::new(1936, 1216);
const EXPOSURE_RANGE_US: (f64, f64) = (10.0, 10_000_000.0);
const FRAME_RATE_RANGE: (f64, f64) = (1.0, 120.0);
const THROUGHPUT_RANGE: IntRange = IntRange::new(4_000_000, 450_000_000);

/// One trigger line of the simulated I/O connector.
#[derive(Debug, Clone)]
struct TriggerLineState {
    name: &'static str,
    mode: String,
    source: String,
}

#[derive(Debug)]
struct CameraState {
    open: bool,
    frame_buffers: u32,
    pixel_format: String,
    bit_depth: String,
    lines: Vec<TriggerLineState>,
    selected_line: usize,
    exposure_us: f64,
    frame_rate: f64,
    frame_rate_auto: bool,
    image_size: Dimensions,
    image_offset: Dimensions,
    throughput_limit: i64,
    capturing: bool,
    callback: Option<FrameCallbackSlot>,
    frames_delivered: u64,
    capture_starts: u32,
}

/// Wrapper so the state can derive `Debug`.
#[derive(Clone)]
struct FrameCallbackSlot(FrameCallback);

impl std::fmt::Debug for FrameCallbackSlot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("FrameCallback")
    }
}

impl Default for CameraState {
    fn default() -> Self {
        Self {
            open: false,
            frame_buffers: 0,
            pixel_format: PIXEL_FORMATS[0].to_string(),
            bit_depth: BIT_DEPTHS[0].to_string(),
            lines: TRIGGER_LINES
                .iter()
                .map(|&name| TriggerLineState {
                    name,
                    mode: LINE_MODES[0].to_string(),
                    source: LINE_SOURCES[0].to_string(),
                })
                .collect(),
            selected_line: 0,
            exposure_us: 10_000.0,
            frame_rate: 30.0,
            frame_rate_auto: false,
            image_size: SENSOR_SIZE,
            image_offset: Dimensions::new(0, 0),
            throughput_limit: THROUGHPUT_RANGE.max,
            capturing: false,
            callback: None,
            frames_delivered: 0,
            capture_starts: 0,
        }
    }
}

fn lock(state: &Mutex<CameraState>) -> MutexGuard<'_, CameraState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Hand one frame to the registered callback, if capture is running.
///
/// The callback runs with the state lock held, so `stop_capture` cannot
/// return while a frame is still being delivered. Callbacks must not call
/// back into the camera.
fn deliver_frame(state: &Mutex<CameraState>) -> bool {
    let mut state = lock(state);
    if !state.capturing {
        return false;
    }
    let Some(FrameCallbackSlot(callback)) = state.callback.clone() else {
        return false;
    };
    state.frames_delivered += 1;
    let frame = FrameInfo {
        frame_id: state.frames_delivered,
        width: u32::try_from(state.image_size.width).unwrap_or(0),
        height: u32::try_from(state.image_size.height).unwrap_or(0),
        timestamp: Utc::now(),
    };
    callback(&frame);
    true
}

/// Configuration of one simulated camera.
#[derive(Debug, Clone)]
pub struct MockCameraConfig {
    pub identity: DeviceIdentity,
    /// Deliver frames on a background thread at this interval while capturing.
    pub frame_interval: Option<Duration>,
    /// Make every open attempt fail as if another process held the camera.
    pub fail_open: bool,
}

impl MockCameraConfig {
    pub fn new(identity: DeviceIdentity) -> Self {
        Self {
            identity,
            frame_interval: None,
            fail_open: false,
        }
    }

    pub fn with_frame_interval(mut self, interval: Duration) -> Self {
        self.frame_interval = Some(interval);
        self
    }

    pub fn with_fail_open(mut self, fail_open: bool) -> Self {
        self.fail_open = fail_open;
        self
    }
}

#[derive(Debug)]
struct CameraSlot {
    config: MockCameraConfig,
    state: Arc<Mutex<CameraState>>,
}

/// Simulated camera driver.
///
/// # Examples
///
/// ```
/// use camsync_core::DeviceIdentity;
/// use camsync_hardware::mock::MockCameraModule;
/// use camsync_hardware::traits::{CameraDevice, CameraModule};
///
/// let module = MockCameraModule::new()
///     .with_camera(DeviceIdentity::new("camA"))
///     .with_camera(DeviceIdentity::new("camB"));
///
/// let ids: Vec<String> = module.list_cameras().unwrap().into_iter().map(|c| c.id).collect();
/// assert_eq!(ids, ["camA", "camB"]);
///
/// let mut camera = module.open_camera("camA", 5).unwrap();
/// camera.set_exposure_time_us(5000.0).unwrap();
/// assert_eq!(camera.exposure_time_us().unwrap(), 5000.0);
/// ```
#[derive(Debug, Default)]
pub struct MockCameraModule {
    cameras: Vec<CameraSlot>,
}

impl MockCameraModule {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach a camera with default behavior.
    pub fn with_camera(self, identity: DeviceIdentity) -> Self {
        self.with_config(MockCameraConfig::new(identity))
    }

    /// Attach a camera with explicit behavior.
    pub fn with_config(mut self, config: MockCameraConfig) -> Self {
        self.cameras.push(CameraSlot {
            config,
            state: Arc::new(Mutex::new(CameraState::default())),
        });
        self
    }

    /// Observation and frame-injection handle for an attached camera.
    pub fn handle(&self, id: &str) -> Option<MockCameraHandle> {
        self.cameras
            .iter()
            .find(|slot| slot.config.identity.id == id)
            .map(|slot| MockCameraHandle {
                state: Arc::clone(&slot.state),
            })
    }
}

impl CameraModule for MockCameraModule {
    type Camera = MockCamera;

    fn name(&self) -> &str {
        "Mock Camera Module"
    }

    fn list_cameras(&self) -> Result<Vec<DeviceIdentity>> {
        Ok(self
            .cameras
            .iter()
            .map(|slot| slot.config.identity.clone())
            .collect())
    }

    fn open_camera(&self, id: &str, frame_buffers: u32) -> Result<MockCamera> {
        let slot = self
            .cameras
            .iter()
            .find(|slot| slot.config.identity.id == id)
            .ok_or_else(|| HardwareError::not_found(id))?;

        if slot.config.fail_open {
            return Err(HardwareError::driver(
                Status::INVALID_ACCESS.code(),
                format!("{id} is in use by another process"),
            ));
        }
        if frame_buffers == 0 {
            return Err(HardwareError::invalid_value("frame_buffers", frame_buffers));
        }

        {
            let mut state = lock(&slot.state);
            if state.open {
                return Err(HardwareError::driver(
                    Status::INVALID_ACCESS.code(),
                    format!("{id} is already open"),
                ));
            }
            state.open = true;
            state.frame_buffers = frame_buffers;
        }

        info!(camera = %id, frame_buffers, "Opened mock camera");
        Ok(MockCamera {
            identity: slot.config.identity.clone(),
            state: Arc::clone(&slot.state),
            frame_interval: slot.config.frame_interval,
            free_run: None,
        })
    }
}

/// Background thread delivering frames at a fixed interval.
#[derive(Debug)]
struct FreeRun {
    stop: Arc<AtomicBool>,
    thread: JoinHandle<()>,
}

impl FreeRun {
    fn spawn(id: &str, state: Arc<Mutex<CameraState>>, interval: Duration) -> Result<Self> {
        let stop = Arc::new(AtomicBool::new(false));
        let thread_stop = Arc::clone(&stop);
        let thread = std::thread::Builder::new()
            .name(format!("acq-{id}"))
            .spawn(move || {
                while !thread_stop.load(Ordering::Acquire) {
                    std::thread::sleep(interval);
                    if thread_stop.load(Ordering::Acquire) {
                        break;
                    }
                    deliver_frame(&state);
                }
            })?;
        Ok(Self { stop, thread })
    }

    fn halt(self) {
        self.stop.store(true, Ordering::Release);
        let _ = self.thread.join();
    }
}

/// An opened simulated camera.
#[derive(Debug)]
pub struct MockCamera {
    identity: DeviceIdentity,
    state: Arc<Mutex<CameraState>>,
    frame_interval: Option<Duration>,
    free_run: Option<FreeRun>,
}

impl MockCamera {
    /// Lock the shared state, failing if the handle has been closed.
    fn open_state(&self) -> Result<MutexGuard<'_, CameraState>> {
        let state = lock(&self.state);
        if !state.open {
            return Err(HardwareError::device_not_open(&self.identity.id));
        }
        Ok(state)
    }

    fn check_choice(feature: &str, value: &str, choices: &[&str]) -> Result<()> {
        if choices.contains(&value) {
            Ok(())
        } else {
            Err(HardwareError::invalid_value(feature, value))
        }
    }

    fn check_float(feature: &str, value: f64, (min, max): (f64, f64)) -> Result<()> {
        if value.is_finite() && (min..=max).contains(&value) {
            Ok(())
        } else {
            Err(HardwareError::invalid_value(feature, value))
        }
    }

    /// Check that a region of `size` placed at `offset` fits the sensor.
    fn check_region(feature: &str, size: Dimensions, offset: Dimensions) -> Result<()> {
        let fits = size.width > 0
            && size.height > 0
            && offset.width >= 0
            && offset.height >= 0
            && size.width + offset.width <= SENSOR_SIZE.width
            && size.height + offset.height <= SENSOR_SIZE.height;
        if fits {
            Ok(())
        } else {
            Err(HardwareError::invalid_value(
                feature,
                format!("{}x{}", size.width, size.height),
            ))
        }
    }

    fn halt_free_run(&mut self) {
        if let Some(free_run) = self.free_run.take() {
            free_run.halt();
        }
    }
}

impl CameraDevice for MockCamera {
    fn identity(&self) -> &DeviceIdentity {
        &self.identity
    }

    fn is_open(&self) -> bool {
        lock(&self.state).open
    }

    fn close(&mut self) -> Result<()> {
        if !self.is_open() {
            return Ok(());
        }
        self.stop_capture()?;
        lock(&self.state).open = false;
        info!(camera = %self.identity.id, "Closed mock camera");
        Ok(())
    }

    fn image_format(&self) -> Result<String> {
        Ok(self.open_state()?.pixel_format.clone())
    }

    fn set_image_format(&mut self, format: &str) -> Result<()> {
        let mut state = self.open_state()?;
        Self::check_choice("PixelFormat", format, &PIXEL_FORMATS)?;
        state.pixel_format = format.to_string();
        Ok(())
    }

    fn sensor_bit_depth(&self) -> Result<String> {
        Ok(self.open_state()?.bit_depth.clone())
    }

    fn set_sensor_bit_depth(&mut self, depth: &str) -> Result<()> {
        let mut state = self.open_state()?;
        Self::check_choice("SensorBitDepth", depth, &BIT_DEPTHS)?;
        state.bit_depth = depth.to_string();
        Ok(())
    }

    fn trigger_line(&self) -> Result<String> {
        let state = self.open_state()?;
        Ok(state.lines[state.selected_line].name.to_string())
    }

    fn set_trigger_line(&mut self, line: &str) -> Result<()> {
        let mut state = self.open_state()?;
        let index = state
            .lines
            .iter()
            .position(|l| l.name == line)
            .ok_or_else(|| HardwareError::invalid_value("LineSelector", line))?;
        state.selected_line = index;
        Ok(())
    }

    fn trigger_lines(&self) -> Result<Vec<String>> {
        let state = self.open_state()?;
        Ok(state.lines.iter().map(|l| l.name.to_string()).collect())
    }

    fn set_trigger_line_mode(&mut self, mode: &str) -> Result<()> {
        let mut state = self.open_state()?;
        Self::check_choice("LineMode", mode, &LINE_MODES)?;
        let selected = state.selected_line;
        state.lines[selected].mode = mode.to_string();
        Ok(())
    }

    fn trigger_line_source(&self) -> Result<String> {
        let state = self.open_state()?;
        Ok(state.lines[state.selected_line].source.clone())
    }

    fn set_trigger_line_source(&mut self, source: &str) -> Result<()> {
        let mut state = self.open_state()?;
        Self::check_choice("LineSource", source, &LINE_SOURCES)?;
        let selected = state.selected_line;
        if state.lines[selected].mode != "Output" {
            return Err(HardwareError::invalid_access("LineSource"));
        }
        state.lines[selected].source = source.to_string();
        Ok(())
    }

    fn trigger_line_sources(&self) -> Result<Vec<String>> {
        self.open_state()?;
        Ok(LINE_SOURCES.iter().map(|s| s.to_string()).collect())
    }

    fn exposure_time_us(&self) -> Result<f64> {
        Ok(self.open_state()?.exposure_us)
    }

    fn set_exposure_time_us(&mut self, value: f64) -> Result<()> {
        let mut state = self.open_state()?;
        Self::check_float("ExposureTime", value, EXPOSURE_RANGE_US)?;
        state.exposure_us = value;
        Ok(())
    }

    fn frame_rate(&self) -> Result<f64> {
        Ok(self.open_state()?.frame_rate)
    }

    fn set_frame_rate(&mut self, value: f64) -> Result<()> {
        let mut state = self.open_state()?;
        if state.frame_rate_auto {
            return Err(HardwareError::invalid_access("AcquisitionFrameRate"));
        }
        Self::check_float("AcquisitionFrameRate", value, FRAME_RATE_RANGE)?;
        state.frame_rate = value;
        Ok(())
    }

    fn frame_rate_auto(&self) -> Result<bool> {
        Ok(self.open_state()?.frame_rate_auto)
    }

    fn set_frame_rate_auto(&mut self, enabled: bool) -> Result<()> {
        self.open_state()?.frame_rate_auto = enabled;
        Ok(())
    }

    fn image_size(&self) -> Result<Dimensions> {
        Ok(self.open_state()?.image_size)
    }

    fn set_image_size(&mut self, size: Dimensions) -> Result<()> {
        let mut state = self.open_state()?;
        if state.capturing {
            return Err(HardwareError::invalid_access("Width"));
        }
        Self::check_region("Width", size, state.image_offset)?;
        state.image_size = size;
        Ok(())
    }

    fn image_offset(&self) -> Result<Dimensions> {
        Ok(self.open_state()?.image_offset)
    }

    fn set_image_offset(&mut self, offset: Dimensions) -> Result<()> {
        let mut state = self.open_state()?;
        Self::check_region("OffsetX", state.image_size, offset)?;
        state.image_offset = offset;
        Ok(())
    }

    fn sensor_size(&self) -> Result<Dimensions> {
        self.open_state()?;
        Ok(SENSOR_SIZE)
    }

    fn throughput_limit(&self) -> Result<i64> {
        Ok(self.open_state()?.throughput_limit)
    }

    fn set_throughput_limit(&mut self, value: i64) -> Result<()> {
        let mut state = self.open_state()?;
        if !THROUGHPUT_RANGE.contains(value) {
            return Err(HardwareError::invalid_value("DeviceLinkThroughputLimit", value));
        }
        state.throughput_limit = value;
        Ok(())
    }

    fn throughput_limit_range(&self) -> Result<IntRange> {
        self.open_state()?;
        Ok(THROUGHPUT_RANGE)
    }

    fn is_capturing(&self) -> bool {
        lock(&self.state).capturing
    }

    fn start_capture(&mut self, callback: FrameCallback) -> Result<()> {
        {
            let mut state = self.open_state()?;
            if state.capturing {
                return Err(HardwareError::invalid_call("capture already running"));
            }
            state.capturing = true;
            state.callback = Some(FrameCallbackSlot(callback));
            state.capture_starts += 1;
        }

        if let Some(interval) = self.frame_interval {
            match FreeRun::spawn(&self.identity.id, Arc::clone(&self.state), interval) {
                Ok(free_run) => self.free_run = Some(free_run),
                Err(e) => {
                    let mut state = lock(&self.state);
                    state.capturing = false;
                    state.callback = None;
                    return Err(e);
                }
            }
        }

        debug!(camera = %self.identity.id, "Capture started");
        Ok(())
    }

    fn stop_capture(&mut self) -> Result<()> {
        {
            let mut state = lock(&self.state);
            if !state.capturing {
                return Ok(());
            }
            state.capturing = false;
            state.callback = None;
        }
        // Joined outside the lock; the acquisition thread takes it per frame.
        self.halt_free_run();

        debug!(camera = %self.identity.id, "Capture stopped");
        Ok(())
    }
}

impl Drop for MockCamera {
    fn drop(&mut self) {
        self.halt_free_run();
    }
}

/// Handle for observing a simulated camera and injecting frames.
///
/// Cloneable; every clone refers to the same camera.
#[derive(Debug, Clone)]
pub struct MockCameraHandle {
    state: Arc<Mutex<CameraState>>,
}

impl MockCameraHandle {
    /// Deliver one frame to the registered callback on the calling thread.
    ///
    /// Returns `false` when no capture is running.
    pub fn fire_frame(&self) -> bool {
        deliver_frame(&self.state)
    }

    pub fn is_open(&self) -> bool {
        lock(&self.state).open
    }

    pub fn is_capturing(&self) -> bool {
        lock(&self.state).capturing
    }

    /// Number of frames handed to callbacks since the module was created.
    pub fn frames_delivered(&self) -> u64 {
        lock(&self.state).frames_delivered
    }

    /// Number of times capture was started.
    pub fn capture_starts(&self) -> u32 {
        lock(&self.state).capture_starts
    }

    /// Buffer count requested at the last open.
    pub fn frame_buffers(&self) -> u32 {
        lock(&self.state).frame_buffers
    }

    /// I/O mode of the named trigger line.
    pub fn line_mode(&self, line: &str) -> Option<String> {
        lock(&self.state)
            .lines
            .iter()
            .find(|l| l.name == line)
            .map(|l| l.mode.clone())
    }
}
