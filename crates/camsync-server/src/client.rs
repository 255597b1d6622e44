//! TCP client for the control protocol.
//!
//! Used by the `camsync request` command and by integration tests. Every
//! operation is bounded by the configured timeout.
//!
//! # Example Usage
//!
//! ```no_run
//! use camsync_protocol::Request;
//! use camsync_server::{ControlClient, ControlClientConfig};
//! use std::time::Duration;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let mut client = ControlClient::new(ControlClientConfig {
//!     server_addr: "127.0.0.1:5555".parse()?,
//!     timeout: Duration::from_secs(3),
//! });
//! client.connect().await?;
//!
//! let reply = client.request(&Request::get("camA", 104)).await?;
//! println!("exposure: {}", reply.result);
//!
//! client.close().await?;
//! # Ok(())
//! # }
//! ```

use camsync_core::constants::DEFAULT_PORT;
use camsync_protocol::{Message, MultipartCodec, Reply, Request};
use futures::{SinkExt, StreamExt};
use std::future::Future;
use std::net::{Ipv4Addr, SocketAddr};
use std::time::Duration;
use thiserror::Error;
use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;
use tokio_util::codec::Framed;
use tracing::{debug, trace, warn};

/// Grace period for flushing and shutting down on close.
const CLOSE_GRACE: Duration = Duration::from_millis(500);

/// Where to connect and how long each operation may take.
#[derive(Debug, Clone)]
pub struct ControlClientConfig {
    pub server_addr: SocketAddr,

    /// Bound on connect, each send and each receive.
    pub timeout: Duration,
}

impl Default for ControlClientConfig {
    fn default() -> Self {
        Self {
            server_addr: SocketAddr::from((Ipv4Addr::LOCALHOST, DEFAULT_PORT)),
            timeout: Duration::from_secs(3),
        }
    }
}

#[derive(Debug, Error)]
pub enum ControlClientError {
    #[error("Client is not connected")]
    NotConnected,

    #[error("No connection to server within {0:?}")]
    ConnectionTimeout(Duration),

    #[error("No reply from server within {0:?}")]
    ReadTimeout(Duration),

    #[error("Request not written within {0:?}")]
    WriteTimeout(Duration),

    /// The server closed the connection while a reply was expected.
    #[error("Server closed the connection")]
    ConnectionLost,

    #[error(transparent)]
    Protocol(#[from] camsync_core::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Client for one control connection.
#[derive(Debug)]
pub struct ControlClient {
    config: ControlClientConfig,
    framed: Option<Framed<TcpStream, MultipartCodec>>,
}

impl ControlClient {
    /// Create an unconnected client.
    ///
    /// ```
    /// use camsync_server::{ControlClient, ControlClientConfig};
    ///
    /// let client = ControlClient::new(ControlClientConfig::default());
    /// assert!(!client.is_connected());
    /// ```
    pub fn new(config: ControlClientConfig) -> Self {
        Self {
            config,
            framed: None,
        }
    }

    /// Connect to the server.
    ///
    /// # Errors
    ///
    /// Returns `ConnectionTimeout` if the server does not answer in time and
    /// `Io` if it refuses the connection.
    pub async fn connect(&mut self) -> Result<(), ControlClientError> {
        let addr = self.config.server_addr;
        debug!(%addr, "Connecting to control server");

        let stream = tokio::time::timeout(self.config.timeout, TcpStream::connect(addr))
            .await
            .map_err(|_| ControlClientError::ConnectionTimeout(self.config.timeout))??;
        if let Err(e) = stream.set_nodelay(true) {
            warn!(%addr, error = %e, "Failed to set TCP_NODELAY");
        }

        self.framed = Some(Framed::new(stream, MultipartCodec::new()));
        Ok(())
    }

    /// Send a raw message.
    ///
    /// # Errors
    ///
    /// Returns `NotConnected`, `WriteTimeout`, or `Protocol` if the message
    /// cannot be framed or written.
    pub async fn send(&mut self, message: Message) -> Result<(), ControlClientError> {
        trace!(parts = message.len(), "Sending request");
        let timeout = self.config.timeout;
        let framed = self.framed.as_mut().ok_or(ControlClientError::NotConnected)?;

        bounded(timeout, framed.send(message))
            .await
            .ok_or(ControlClientError::WriteTimeout(timeout))??;
        Ok(())
    }

    /// Receive a raw message.
    ///
    /// # Errors
    ///
    /// Returns `NotConnected`, `ReadTimeout`, `ConnectionLost` if the server
    /// closed the connection, or `Protocol` for an undecodable frame.
    pub async fn recv(&mut self) -> Result<Message, ControlClientError> {
        let timeout = self.config.timeout;
        let framed = self.framed.as_mut().ok_or(ControlClientError::NotConnected)?;

        let message = bounded(timeout, framed.next())
            .await
            .ok_or(ControlClientError::ReadTimeout(timeout))?
            .ok_or(ControlClientError::ConnectionLost)??;
        trace!(parts = message.len(), "Received reply");
        Ok(message)
    }

    /// Send a request and wait for its reply.
    ///
    /// # Errors
    ///
    /// Any error from [`send`](Self::send) or [`recv`](Self::recv), or
    /// `Protocol` if the answer is not a well-formed reply.
    pub async fn request(&mut self, request: &Request) -> Result<Reply, ControlClientError> {
        self.send(request.encode()).await?;
        Ok(Reply::from_message(self.recv().await?)?)
    }

    pub fn is_connected(&self) -> bool {
        self.framed.is_some()
    }

    /// Flush and shut down the connection. Calling it again does nothing.
    ///
    /// # Errors
    ///
    /// Never fails today; flush and shutdown problems are logged.
    pub async fn close(&mut self) -> Result<(), ControlClientError> {
        let Some(mut framed) = self.framed.take() else {
            return Ok(());
        };
        let addr = self.config.server_addr;

        match bounded(CLOSE_GRACE, framed.flush()).await {
            Some(Ok(())) => {}
            Some(Err(e)) => warn!(%addr, error = %e, "Flush failed on close"),
            None => warn!(%addr, "Flush timed out on close"),
        }
        let mut stream = framed.into_inner();
        match bounded(CLOSE_GRACE, stream.shutdown()).await {
            Some(Ok(())) => {}
            Some(Err(e)) => warn!(%addr, error = %e, "Shutdown failed on close"),
            None => warn!(%addr, "Shutdown timed out on close"),
        }

        debug!(%addr, "Control connection closed");
        Ok(())
    }
}

/// Run `fut` for at most `limit`; `None` on expiry.
async fn bounded<F: Future>(limit: Duration, fut: F) -> Option<F::Output> {
    tokio::time::timeout(limit, fut).await.ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use camsync_core::Status;
    use tokio::net::TcpListener;

    /// One-shot peer that answers the first request with a fixed reply.
    async fn answering_peer(reply: Reply) -> SocketAddr {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (stream, _) = listener.accept().await.unwrap();
            let mut framed = Framed::new(stream, MultipartCodec::new());
            if framed.next().await.is_some() {
                framed.send(reply.to_message()).await.unwrap();
            }
        });
        addr
    }

    fn client_for(addr: SocketAddr, timeout: Duration) -> ControlClient {
        ControlClient::new(ControlClientConfig {
            server_addr: addr,
            timeout,
        })
    }

    #[test]
    fn test_config_default() {
        let config = ControlClientConfig::default();
        assert_eq!(config.server_addr.port(), 5555);
        assert!(config.server_addr.ip().is_loopback());
        assert_eq!(config.timeout, Duration::from_secs(3));
    }

    #[tokio::test]
    async fn test_request_without_connect() {
        let mut client = ControlClient::new(ControlClientConfig::default());
        let result = client.request(&Request::List).await;
        assert!(matches!(result, Err(ControlClientError::NotConnected)));
        assert!(matches!(
            client.recv().await,
            Err(ControlClientError::NotConnected)
        ));
    }

    #[tokio::test]
    async fn test_request_reply_round_trip() {
        let addr = answering_peer(
            Reply::builder("get")
                .device("camA")
                .command("104")
                .result("5000.000000")
                .build(),
        )
        .await;
        let mut client = client_for(addr, Duration::from_secs(2));
        client.connect().await.unwrap();

        let reply = client.request(&Request::get("camA", 104)).await.unwrap();
        assert!(reply.is_ack());
        assert_eq!(reply.status, Status::SUCCESS);
        assert_eq!(reply.result, "5000.000000");

        // the peer hangs up after one reply
        assert!(matches!(
            client.recv().await,
            Err(ControlClientError::ConnectionLost)
        ));
        client.close().await.unwrap();
        assert!(!client.is_connected());
    }

    #[tokio::test]
    async fn test_silent_server_times_out() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let _peer = tokio::spawn(async move {
            let (_stream, _) = listener.accept().await.unwrap();
            tokio::time::sleep(Duration::from_secs(5)).await;
        });

        let mut client = client_for(addr, Duration::from_millis(100));
        client.connect().await.unwrap();
        client.send(Request::List.encode()).await.unwrap();
        assert!(matches!(
            client.recv().await,
            Err(ControlClientError::ReadTimeout(_))
        ));
    }

    #[tokio::test]
    async fn test_connection_timeout() {
        // RFC 5737 TEST-NET-1, never routed
        let mut client = client_for("192.0.2.1:9999".parse().unwrap(), Duration::from_millis(100));
        let result = client.connect().await;

        assert!(matches!(
            result,
            Err(ControlClientError::ConnectionTimeout(_) | ControlClientError::Io(_))
        ));
        assert!(!client.is_connected());
    }

    #[tokio::test]
    async fn test_close_is_repeatable() {
        let mut client = ControlClient::new(ControlClientConfig::default());
        client.close().await.unwrap();
        client.close().await.unwrap();
    }
}
