//! Shared fixtures for server integration tests.

#![allow(dead_code)]

use camsync_core::DeviceIdentity;
use camsync_hardware::mock::{
    MockCameraHandle, MockCameraModule, MockDigitalOutput, MockDigitalOutputHandle,
};
use camsync_hardware::{AnyCameraModule, AnyDigitalOutput};
use camsync_protocol::{Reply, Request};
use camsync_server::{
    ControlClient, ControlClientConfig, DeviceRegistry, ProtocolServer, RegistryOptions,
    RequestHandler, ServerConfig, prepare_signal_output,
};
use std::net::SocketAddr;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Poll interval used by test servers.
pub const POLL: Duration = Duration::from_millis(100);

/// A running server with two simulated cameras and a simulated DIO unit.
pub struct TestServer {
    pub addr: SocketAddr,
    pub token: CancellationToken,
    pub task: JoinHandle<camsync_server::Result<()>>,
    pub cam_a: MockCameraHandle,
    pub cam_b: MockCameraHandle,
    pub dio: MockDigitalOutputHandle,
}

pub fn test_config(port: u16) -> ServerConfig {
    ServerConfig {
        port,
        bind_address: "127.0.0.1".to_string(),
        poll_timeout_ms: u64::try_from(POLL.as_millis()).unwrap(),
        ..ServerConfig::default()
    }
}

/// Start a server on `port` serving `camA` and `camB`.
pub async fn start_server(port: u16) -> TestServer {
    let module = MockCameraModule::new()
        .with_camera(DeviceIdentity::new("camA").with_model("Mock 1936"))
        .with_camera(DeviceIdentity::new("camB").with_model("Mock 1936"));
    let cam_a = module.handle("camA").unwrap();
    let cam_b = module.handle("camB").unwrap();

    let (dio, dio_handle) = MockDigitalOutput::open(0).unwrap();
    let signal = prepare_signal_output(AnyDigitalOutput::Mock(dio));

    let registry = DeviceRegistry::enumerate_and_open(
        &AnyCameraModule::Mock(module),
        Some(signal.clone()),
        &RegistryOptions::default(),
    )
    .unwrap();

    let config = test_config(port);
    let token = CancellationToken::new();
    let server = ProtocolServer::bind(
        &config,
        RequestHandler::new(registry, Some(signal)),
        token.clone(),
    )
    .await
    .unwrap();
    let addr = server.local_addr().unwrap();
    let task = tokio::spawn(server.run());

    TestServer {
        addr,
        token,
        task,
        cam_a,
        cam_b,
        dio: dio_handle,
    }
}

pub async fn connect(addr: SocketAddr) -> ControlClient {
    let mut client = ControlClient::new(ControlClientConfig {
        server_addr: addr,
        timeout: Duration::from_secs(2),
    });
    client.connect().await.unwrap();
    client
}

/// Send `parts` as one request and parse the reply.
pub async fn ask(client: &mut ControlClient, parts: &[&str]) -> Reply {
    client
        .send(camsync_protocol::Message::from(parts))
        .await
        .unwrap();
    Reply::from_message(client.recv().await.unwrap()).unwrap()
}

pub async fn request(client: &mut ControlClient, request: Request) -> Reply {
    client.request(&request).await.unwrap()
}
