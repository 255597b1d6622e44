//! One open camera and its acquisition state.
//!
//! ```text
//! open() ──> Idle ──start_capture()──> Capturing
//!             ^                            │
//!             └──────stop_capture()────────┘
//! Idle | Capturing ──close()──> Closed
//! ```

use crate::signal::SyncLine;
use camsync_core::constants::TRIGGER_LINE_OUTPUT_MODE;
use camsync_core::{DeviceIdentity, IdentifierKey};
use camsync_hardware::{AnyCamera, AnyDigitalOutput, CameraDevice, CameraModule, FrameInfo};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Acquisition state of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    Capturing,
    Closed,
}

/// An opened camera, addressed by its identifier key.
#[derive(Debug)]
pub struct DeviceSession {
    identity: DeviceIdentity,
    key: IdentifierKey,
    camera: AnyCamera,
    state: SessionState,
    sync: Arc<SyncLine>,
}

impl DeviceSession {
    /// Open the camera described by `identity` and normalize its trigger lines.
    ///
    /// # Errors
    /// Returns the driver's error if the camera cannot be opened. Trigger line
    /// normalization never fails the open.
    pub fn open<M>(
        module: &M,
        identity: DeviceIdentity,
        signal: Option<Arc<AnyDigitalOutput>>,
        frame_buffers: u32,
    ) -> camsync_hardware::Result<Self>
    where
        M: CameraModule<Camera = AnyCamera>,
    {
        let camera = module.open_camera(&identity.id, frame_buffers)?;
        let key = identity.key();
        let mut session = Self {
            identity,
            key,
            camera,
            state: SessionState::Idle,
            sync: Arc::new(SyncLine::new(signal)),
        };
        session.normalize_trigger_lines();
        info!(camera = %session.identity, key = %key, "Opened device session");
        Ok(session)
    }

    /// Put every trigger line in output mode, keeping the selected line.
    fn normalize_trigger_lines(&mut self) {
        let id = self.identity.id.as_str();
        let camera = &mut self.camera;

        let selected = camera
            .trigger_line()
            .inspect_err(|e| warn!(camera = id, error = %e, "Failed to read trigger line"))
            .ok();

        match camera.trigger_lines() {
            Ok(lines) => {
                for line in &lines {
                    let result = camera
                        .set_trigger_line(line)
                        .and_then(|()| camera.set_trigger_line_mode(TRIGGER_LINE_OUTPUT_MODE));
                    if let Err(e) = result {
                        warn!(camera = id, line = %line, error = %e, "Failed to set trigger line mode");
                    }
                }
            }
            Err(e) => warn!(camera = id, error = %e, "Failed to list trigger lines"),
        }

        if let Some(line) = &selected {
            if let Err(e) = camera.set_trigger_line(line) {
                warn!(camera = id, line = %line, error = %e, "Failed to restore trigger line");
            }
        }

        match (camera.trigger_line_source(), camera.trigger_line_sources()) {
            (Ok(source), Ok(sources)) => {
                debug!(camera = id, line = ?selected, source = %source, ?sources, "Trigger configuration");
            }
            (Err(e), _) | (_, Err(e)) => {
                warn!(camera = id, error = %e, "Failed to read trigger line source");
            }
        }
    }

    pub fn identity(&self) -> &DeviceIdentity {
        &self.identity
    }

    pub fn key(&self) -> IdentifierKey {
        self.key
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn is_capturing(&self) -> bool {
        self.state == SessionState::Capturing
    }

    pub fn camera(&self) -> &AnyCamera {
        &self.camera
    }

    pub fn camera_mut(&mut self) -> &mut AnyCamera {
        &mut self.camera
    }

    pub fn sync(&self) -> &SyncLine {
        &self.sync
    }

    /// Start streaming with the frame callback wired to this session's
    /// sync line.
    ///
    /// Succeeds without effect when already capturing or closed.
    ///
    /// # Errors
    /// Returns the driver's error if streaming cannot start.
    pub fn start_capture(&mut self) -> camsync_hardware::Result<()> {
        if self.state != SessionState::Idle || !self.camera.is_open() {
            return Ok(());
        }

        let sync = Arc::clone(&self.sync);
        self.camera
            .start_capture(Arc::new(move |_frame: &FrameInfo| sync.on_frame()))?;
        self.state = SessionState::Capturing;
        info!(camera = %self.identity.id, "Capture started");
        Ok(())
    }

    /// Stop streaming and drive the bound signal bit low.
    ///
    /// Succeeds without effect when not capturing. A failed signal write is
    /// logged only.
    ///
    /// # Errors
    /// Returns the driver's error if streaming cannot stop.
    pub fn stop_capture(&mut self) -> camsync_hardware::Result<()> {
        if self.state != SessionState::Capturing {
            return Ok(());
        }

        self.camera.stop_capture()?;
        self.state = SessionState::Idle;
        if let Err(e) = self.sync.reset() {
            warn!(camera = %self.identity.id, error = %e, "Failed to reset signal bit");
        }
        info!(camera = %self.identity.id, "Capture stopped");
        Ok(())
    }

    /// Stop capture if running and release the camera. Idempotent.
    ///
    /// # Errors
    /// Returns the driver's error if the camera fails to close; the session
    /// is marked closed regardless.
    pub fn close(&mut self) -> camsync_hardware::Result<()> {
        if self.state == SessionState::Closed {
            return Ok(());
        }

        if let Err(e) = self.stop_capture() {
            warn!(camera = %self.identity.id, error = %e, "Failed to stop capture before close");
        }
        let result = self.camera.close();
        self.state = SessionState::Closed;
        info!(camera = %self.identity.id, "Closed device session");
        result
    }
}

impl Drop for DeviceSession {
    fn drop(&mut self) {
        if let Err(e) = self.close() {
            warn!(camera = %self.identity.id, error = %e, "Failed to close session on drop");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signal::prepare_signal_output;
    use camsync_hardware::mock::{
        MockCameraHandle, MockCameraModule, MockDigitalOutput, MockDigitalOutputHandle,
    };
    use camsync_hardware::AnyCameraModule;

    struct Fixture {
        session: DeviceSession,
        camera: MockCameraHandle,
        dio: MockDigitalOutputHandle,
    }

    fn fixture() -> Fixture {
        let module = MockCameraModule::new().with_camera(DeviceIdentity::new("camA"));
        let camera = module.handle("camA").unwrap();
        let (dio, dio_handle) = MockDigitalOutput::open(0).unwrap();
        let signal = prepare_signal_output(AnyDigitalOutput::Mock(dio));

        let session = DeviceSession::open(
            &AnyCameraModule::Mock(module),
            DeviceIdentity::new("camA"),
            Some(signal),
            5,
        )
        .unwrap();

        Fixture {
            session,
            camera,
            dio: dio_handle,
        }
    }

    #[test]
    fn test_open_normalizes_trigger_lines() {
        let f = fixture();

        assert_eq!(f.session.state(), SessionState::Idle);
        assert_eq!(f.session.key(), IdentifierKey::from_identifier("camA"));
        assert_eq!(f.camera.frame_buffers(), 5);
        for line in ["Line0", "Line1", "Line2", "Line3"] {
            assert_eq!(f.camera.line_mode(line).as_deref(), Some("Output"));
        }
        assert_eq!(f.session.camera().trigger_line().unwrap(), "Line0");
    }

    #[test]
    fn test_open_unknown_camera_fails() {
        let module = AnyCameraModule::Mock(MockCameraModule::new());
        let err = DeviceSession::open(&module, DeviceIdentity::new("ghost"), None, 5).unwrap_err();
        assert_eq!(err.status(), camsync_core::Status::NOT_FOUND);
    }

    #[test]
    fn test_start_capture_is_idempotent() {
        let mut f = fixture();

        f.session.start_capture().unwrap();
        f.session.start_capture().unwrap();

        assert!(f.session.is_capturing());
        assert_eq!(f.camera.capture_starts(), 1);
    }

    #[test]
    fn test_stop_capture_when_idle_is_noop() {
        let mut f = fixture();
        f.session.stop_capture().unwrap();
        assert_eq!(f.session.state(), SessionState::Idle);
    }

    #[test]
    fn test_frame_toggles_bound_bit_and_stop_resets() {
        let mut f = fixture();
        f.session.sync().bind(Some(0));
        f.session.start_capture().unwrap();

        assert!(f.camera.fire_frame());
        assert!(f.dio.bit(0, 0));

        f.session.stop_capture().unwrap();
        assert!(!f.dio.bit(0, 0));
        assert!(!f.camera.is_capturing());
        assert!(!f.camera.fire_frame());
    }

    #[test]
    fn test_stop_tolerates_signal_failure() {
        let mut f = fixture();
        f.session.sync().bind(Some(3));
        f.session.start_capture().unwrap();
        f.dio.set_fail_writes(true);

        f.session.stop_capture().unwrap();
        assert_eq!(f.session.state(), SessionState::Idle);
    }

    #[test]
    fn test_close_is_idempotent_and_stops_capture() {
        let mut f = fixture();
        f.session.start_capture().unwrap();

        f.session.close().unwrap();
        f.session.close().unwrap();

        assert_eq!(f.session.state(), SessionState::Closed);
        assert!(!f.camera.is_open());
        assert!(!f.camera.is_capturing());
    }

    #[test]
    fn test_start_capture_after_close_is_noop() {
        let mut f = fixture();
        f.session.close().unwrap();
        f.session.start_capture().unwrap();
        assert_eq!(f.camera.capture_starts(), 0);
    }

    #[test]
    fn test_drop_closes_camera() {
        let f = fixture();
        let camera = f.camera.clone();
        drop(f);
        assert!(!camera.is_open());
    }
}
