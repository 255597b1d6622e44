//! Request execution against the device registry.
//!
//! [`RequestHandler`] owns every session and runs on the server loop, one
//! request at a time. Each request yields exactly one [`Reply`]; failures
//! become NAC replies carrying the status of the error.

use crate::commands::CommandRegistry;
use crate::registry::DeviceRegistry;
use camsync_core::Status;
use camsync_core::constants::SIGNAL_PORT;
use camsync_hardware::{AnyDigitalOutput, DigitalOutput};
use camsync_protocol::{Message, Reply, Request};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Whether the server keeps running after a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Shutdown,
}

/// Executes decoded requests.
#[derive(Debug)]
pub struct RequestHandler {
    registry: DeviceRegistry,
    commands: CommandRegistry,
    signal: Option<Arc<AnyDigitalOutput>>,
}

impl RequestHandler {
    /// Create a handler over `registry` with the standard command table.
    ///
    /// `signal` is released by [`shutdown`](Self::shutdown).
    pub fn new(registry: DeviceRegistry, signal: Option<Arc<AnyDigitalOutput>>) -> Self {
        Self {
            registry,
            commands: CommandRegistry::standard(),
            signal,
        }
    }

    pub fn registry(&self) -> &DeviceRegistry {
        &self.registry
    }

    /// Decode and execute one inbound message.
    pub fn handle_message(&mut self, message: Message) -> (Reply, Flow) {
        match Request::decode(message) {
            Ok(request) => self.handle(&request),
            Err(rejected) => {
                warn!(verb = %rejected.verb, error = %rejected.error, "Rejected request");
                (rejected.into_reply(), Flow::Continue)
            }
        }
    }

    /// Execute one request.
    pub fn handle(&mut self, request: &Request) -> (Reply, Flow) {
        debug!(verb = %request.verb(), device = ?request.device(), command = ?request.command(), "Handling request");

        let flow = if matches!(request, Request::Quit) {
            Flow::Shutdown
        } else {
            Flow::Continue
        };

        let builder = Reply::for_request(request);
        let reply = match self.execute(request) {
            Ok(Some(result)) => builder.result(result).build(),
            Ok(None) => builder.build(),
            Err(status) => {
                warn!(verb = %request.verb(), device = ?request.device(), status = %status, "Request failed");
                builder.status(status).build()
            }
        };
        (reply, flow)
    }

    /// Run the request, returning the reply's result text if any.
    fn execute(&mut self, request: &Request) -> Result<Option<String>, Status> {
        match request {
            Request::Quit => {
                info!("Quit requested");
                Ok(None)
            }
            Request::List => {
                let keys: Vec<String> = self.registry.keys().map(|k| k.to_string()).collect();
                Ok(Some(format!("[{}]", keys.join(", "))))
            }
            Request::StartCaptureAll => {
                for session in self.registry.iter_mut() {
                    session.start_capture().map_err(|e| e.status())?;
                }
                Ok(None)
            }
            Request::StopCaptureAll => {
                for session in self.registry.iter_mut() {
                    session.stop_capture().map_err(|e| e.status())?;
                }
                Ok(None)
            }
            Request::StartCapture { device } => {
                let session = self
                    .registry
                    .resolve_mut(device)
                    .ok_or(Status::NOT_FOUND)?;
                session.start_capture().map_err(|e| e.status())?;
                Ok(None)
            }
            Request::StopCapture { device } => {
                let session = self
                    .registry
                    .resolve_mut(device)
                    .ok_or(Status::NOT_FOUND)?;
                session.stop_capture().map_err(|e| e.status())?;
                Ok(None)
            }
            Request::Get { device, command } => {
                let session = self
                    .registry
                    .resolve_mut(device)
                    .ok_or(Status::NOT_FOUND)?;
                self.commands
                    .dispatch_get(session, command)
                    .map(Some)
                    .map_err(|e| e.status())
            }
            Request::Set {
                device,
                command,
                args,
            } => {
                let session = self
                    .registry
                    .resolve_mut(device)
                    .ok_or(Status::NOT_FOUND)?;
                self.commands
                    .dispatch_set(session, command, args)
                    .map(|()| None)
                    .map_err(|e| e.status())
            }
        }
    }

    /// Close every session, drive the signal port low and release it.
    ///
    /// Safe to call more than once.
    pub fn shutdown(&mut self) {
        self.registry.close_all();

        if let Some(signal) = self.signal.take() {
            if let Err(e) = signal.write_port(SIGNAL_PORT, 0) {
                warn!(unit = signal.name(), error = %e, "Failed to drive signal port low");
            }
            if let Err(e) = signal.close() {
                warn!(unit = signal.name(), error = %e, "Failed to close digital I/O");
            }
        }
        info!("Handler shut down");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::RegistryOptions;
    use crate::signal::prepare_signal_output;
    use camsync_core::{DeviceIdentity, IdentifierKey};
    use camsync_hardware::AnyCameraModule;
    use camsync_hardware::mock::{
        MockCameraHandle, MockCameraModule, MockDigitalOutput, MockDigitalOutputHandle,
    };
    use rstest::rstest;

    struct Fixture {
        handler: RequestHandler,
        cam_a: MockCameraHandle,
        cam_b: MockCameraHandle,
        dio: MockDigitalOutputHandle,
    }

    fn fixture() -> Fixture {
        let module = MockCameraModule::new()
            .with_camera(DeviceIdentity::new("camA"))
            .with_camera(DeviceIdentity::new("camB"));
        let cam_a = module.handle("camA").unwrap();
        let cam_b = module.handle("camB").unwrap();
        let (dio, dio_handle) = MockDigitalOutput::open(0).unwrap();
        let signal = prepare_signal_output(AnyDigitalOutput::Mock(dio));

        let registry = DeviceRegistry::enumerate_and_open(
            &AnyCameraModule::Mock(module),
            Some(Arc::clone(&signal)),
            &RegistryOptions::default(),
        )
        .unwrap();

        Fixture {
            handler: RequestHandler::new(registry, Some(signal)),
            cam_a,
            cam_b,
            dio: dio_handle,
        }
    }

    fn send(handler: &mut RequestHandler, parts: &[&str]) -> Reply {
        let (reply, _) = handler.handle_message(Message::from(parts));
        reply
    }

    #[test]
    fn test_list_returns_keys_in_order() {
        let mut f = fixture();
        let reply = send(&mut f.handler, &["list"]);

        let expected = format!(
            "[{}, {}]",
            IdentifierKey::from_identifier("camA"),
            IdentifierKey::from_identifier("camB")
        );
        assert_eq!(reply.result, expected);
        assert!(reply.is_ack());
        assert_eq!(reply.device, None);
    }

    #[test]
    fn test_set_then_get_echoes_fields() {
        let mut f = fixture();

        let reply = send(&mut f.handler, &["set", "camA", "104", "5000.0"]);
        assert!(reply.is_ack());
        assert_eq!(reply.result, "None");
        assert_eq!(reply.device.as_deref(), Some("camA"));
        assert_eq!(reply.command.as_deref(), Some("104"));

        let reply = send(&mut f.handler, &["get", "camA", "104"]);
        assert_eq!(reply.result, "5000.000000");
        assert_eq!(reply.verb, "get");
    }

    #[test]
    fn test_device_addressed_by_key() {
        let mut f = fixture();
        let key = IdentifierKey::from_identifier("camB").to_string();

        let reply = send(&mut f.handler, &["get", &key, "202"]);
        assert!(reply.is_ack());
        assert_eq!(reply.device.as_deref(), Some(key.as_str()));
    }

    #[rstest]
    #[case(&["get", "camZ", "104"])]
    #[case(&["set", "camZ", "104", "1"])]
    #[case(&["start_capture", "camZ"])]
    #[case(&["stop_capture", "camZ"])]
    fn test_unknown_device_is_not_found(#[case] parts: &[&str]) {
        let mut f = fixture();
        let reply = send(&mut f.handler, parts);
        assert_eq!(reply.status, Status::NOT_FOUND);
        assert!(!reply.is_ack());
    }

    #[rstest]
    #[case(&["get", "camA", "999"])]
    #[case(&["set", "camA", "12", "1"])]
    #[case(&["set", "camA", "104", "abc"])]
    #[case(&["frobnicate"])]
    #[case(&["get", "camA"])]
    #[case(&[])]
    fn test_wrong_command(#[case] parts: &[&str]) {
        let mut f = fixture();
        let reply = send(&mut f.handler, parts);
        assert_eq!(reply.status, Status::WRONG_TYPE);
    }

    #[test]
    fn test_capture_cycle_drives_signal() {
        let mut f = fixture();
        assert!(send(&mut f.handler, &["set", "camA", "10", "0"]).is_ack());
        assert!(send(&mut f.handler, &["start_capture_all"]).is_ack());
        assert!(f.cam_a.is_capturing());
        assert!(f.cam_b.is_capturing());

        assert!(f.cam_a.fire_frame());
        assert!(f.dio.bit(SIGNAL_PORT, 0));

        // camB is unbound
        assert!(f.cam_b.fire_frame());
        assert_eq!(f.dio.port_value(SIGNAL_PORT), 0b1);

        assert!(send(&mut f.handler, &["stop_capture_all"]).is_ack());
        assert!(!f.cam_a.is_capturing());
        assert!(!f.dio.bit(SIGNAL_PORT, 0));
    }

    #[test]
    fn test_single_device_capture() {
        let mut f = fixture();
        assert!(send(&mut f.handler, &["start_capture", "camB"]).is_ack());
        assert!(send(&mut f.handler, &["start_capture", "camB"]).is_ack());
        assert!(f.cam_b.is_capturing());
        assert!(!f.cam_a.is_capturing());
        assert_eq!(f.cam_b.capture_starts(), 1);

        assert!(send(&mut f.handler, &["stop_capture", "camB"]).is_ack());
        assert!(send(&mut f.handler, &["stop_capture", "camB"]).is_ack());
        assert!(!f.cam_b.is_capturing());
    }

    #[test]
    fn test_quit_requests_shutdown() {
        let mut f = fixture();
        let (reply, flow) = f.handler.handle_message(Message::from(&["quit"][..]));
        assert!(reply.is_ack());
        assert_eq!(flow, Flow::Shutdown);

        let (_, flow) = f.handler.handle_message(Message::from(&["list"][..]));
        assert_eq!(flow, Flow::Continue);
    }

    #[test]
    fn test_shutdown_releases_everything() {
        let mut f = fixture();
        send(&mut f.handler, &["set", "camA", "10", "4"]);
        send(&mut f.handler, &["start_capture_all"]);
        f.cam_a.fire_frame();
        assert!(f.dio.bit(SIGNAL_PORT, 4));

        f.handler.shutdown();
        f.handler.shutdown();

        assert!(!f.cam_a.is_open());
        assert!(!f.cam_b.is_open());
        assert_eq!(f.dio.port_value(SIGNAL_PORT), 0);
        assert!(f.dio.is_closed());
    }
}
