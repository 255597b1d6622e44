//! TCP reply server.
//!
//! # Architecture
//!
//! ```text
//! client ──> connection task ─┐
//! client ──> connection task ─┼─(mpsc)─> server loop ──> RequestHandler
//! client ──> connection task ─┘     <─(oneshot reply)─┘
//! ```
//!
//! Each connection task reads one request, forwards it to the loop and waits
//! for its reply before reading the next, so every client sees strict
//! request/reply alternation. The loop executes one request at a time.
//!
//! # Shutdown
//!
//! The loop checks its [`CancellationToken`] once per iteration; each
//! iteration waits at most the poll timeout. A `quit` request cancels the
//! token after its reply is handed back. Teardown then runs once: the
//! handler releases every device and open connections are closed.
//!
//! # Example Usage
//!
//! ```no_run
//! use camsync_server::{DeviceRegistry, ProtocolServer, RequestHandler, ServerConfig};
//! use tokio_util::sync::CancellationToken;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = ServerConfig::default();
//! let registry = DeviceRegistry::enumerate_and_open(
//!     &config.camera_module(),
//!     None,
//!     &config.registry_options(),
//! )?;
//! let handler = RequestHandler::new(registry, None);
//!
//! let server = ProtocolServer::bind(&config, handler, CancellationToken::new()).await?;
//! server.run().await?;
//! # Ok(())
//! # }
//! ```

use crate::config::ServerConfig;
use crate::error::{Result, ServerError};
use crate::handler::{Flow, RequestHandler};
use camsync_core::Status;
use camsync_protocol::{Message, MultipartCodec, Reply};
use chrono::{DateTime, Utc};
use futures::{SinkExt, StreamExt};
use std::net::SocketAddr;
use std::time::Duration;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinSet;
use tokio_util::codec::Framed;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace, warn};

/// Requests queued between connection tasks and the loop.
const REQUEST_QUEUE_DEPTH: usize = 16;

/// How long teardown waits for connection tasks to flush their last reply.
const CONNECTION_DRAIN_TIMEOUT: Duration = Duration::from_millis(500);

/// One request on its way to the loop.
#[derive(Debug)]
struct Inbound {
    message: Message,
    reply: oneshot::Sender<Reply>,
}

/// The device-session protocol server.
#[derive(Debug)]
pub struct ProtocolServer {
    listener: TcpListener,
    handler: RequestHandler,
    token: CancellationToken,
    poll_timeout: Duration,
    max_frame_size: usize,
}

impl ProtocolServer {
    /// Validate `config` and bind the listener.
    ///
    /// # Errors
    /// Returns a configuration error if `config` is invalid and `Bind` if
    /// the address cannot be bound.
    pub async fn bind(
        config: &ServerConfig,
        handler: RequestHandler,
        token: CancellationToken,
    ) -> Result<Self> {
        config.validate()?;
        let addr = config.socket_addr()?;
        info!("Binding control server to {}", addr);

        let listener = TcpListener::bind(addr)
            .await
            .map_err(|source| ServerError::Bind { addr, source })?;

        info!(
            sessions = handler.registry().len(),
            poll_timeout_ms = config.poll_timeout_ms,
            "Control server listening on {}",
            addr
        );

        Ok(Self {
            listener,
            handler,
            token,
            poll_timeout: config.poll_timeout(),
            max_frame_size: config.max_frame_size,
        })
    }

    /// Address the listener is bound to.
    ///
    /// # Errors
    /// Returns the socket error if the address cannot be read.
    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    /// Token that stops the server when cancelled.
    pub fn shutdown_token(&self) -> CancellationToken {
        self.token.clone()
    }

    /// Serve requests until `quit` or cancellation, then release everything.
    ///
    /// # Errors
    /// Currently always returns `Ok`; accept failures are logged and the loop
    /// continues.
    pub async fn run(mut self) -> Result<()> {
        let (requests, mut inbound) = mpsc::channel::<Inbound>(REQUEST_QUEUE_DEPTH);
        let mut connections = JoinSet::new();

        while !self.token.is_cancelled() {
            tokio::select! {
                accepted = self.listener.accept() => match accepted {
                    Ok((stream, addr)) => {
                        debug!("Accepted new connection from {}", addr);
                        if let Err(e) = stream.set_nodelay(true) {
                            warn!("Failed to set TCP_NODELAY for {}: {}", addr, e);
                        }
                        connections.spawn(serve_connection(
                            stream,
                            addr,
                            requests.clone(),
                            self.token.clone(),
                            self.max_frame_size,
                        ));
                    }
                    Err(e) => warn!(error = %e, "Failed to accept connection"),
                },
                Some(request) = inbound.recv() => {
                    let (reply, flow) = self.handler.handle_message(request.message);
                    if request.reply.send(reply).is_err() {
                        debug!("Client went away before its reply");
                    }
                    if flow == Flow::Shutdown {
                        self.token.cancel();
                    }
                }
                Some(_) = connections.join_next(), if !connections.is_empty() => {}
                () = tokio::time::sleep(self.poll_timeout) => {
                    trace!("Poll timeout");
                }
            }
        }

        info!("Control server shutting down");
        self.handler.shutdown();

        // Pending requests get no reply; connection tasks see the closed
        // channel and exit after flushing what they already have.
        drop(inbound);
        drop(requests);
        let drained = tokio::time::timeout(CONNECTION_DRAIN_TIMEOUT, async {
            while connections.join_next().await.is_some() {}
        })
        .await;
        if drained.is_err() {
            warn!(remaining = connections.len(), "Aborting connections after drain timeout");
            connections.abort_all();
        }

        info!("Control server stopped");
        Ok(())
    }
}

/// Forward requests from one client to the loop, one at a time.
async fn serve_connection(
    stream: TcpStream,
    addr: SocketAddr,
    requests: mpsc::Sender<Inbound>,
    token: CancellationToken,
    max_frame_size: usize,
) {
    let connected_at: DateTime<Utc> = Utc::now();
    let mut framed = Framed::new(stream, MultipartCodec::with_max_frame_size(max_frame_size));

    loop {
        let message = tokio::select! {
            () = token.cancelled() => break,
            next = framed.next() => match next {
                Some(Ok(message)) => message,
                Some(Err(e)) => {
                    warn!(addr = %addr, error = %e, "Malformed request, closing connection");
                    let reply = Reply::builder("").status(e.status()).build();
                    if let Err(e) = framed.send(reply.to_message()).await {
                        debug!(addr = %addr, error = %e, "Failed to send rejection");
                    }
                    break;
                }
                None => break,
            },
        };

        trace!(addr = %addr, parts = message.len(), "Received request");
        let (reply_tx, reply_rx) = oneshot::channel();
        let inbound = Inbound {
            message,
            reply: reply_tx,
        };
        if requests.send(inbound).await.is_err() {
            break;
        }
        let Ok(reply) = reply_rx.await else {
            break;
        };

        if let Err(e) = framed.send(fit_reply(reply, max_frame_size)).await {
            warn!(addr = %addr, error = %e, "Failed to send reply");
            break;
        }
    }

    let uptime = Utc::now() - connected_at;
    debug!(addr = %addr, uptime_ms = uptime.num_milliseconds(), "Connection closed");
}

/// Encode `reply` within `max_frame_size`.
///
/// A reply echoes the request's fields, so it can outgrow the limit even
/// when its request did not. Such a reply loses the echoed device and
/// command, and the verb too if that alone is too long. Error statuses are
/// kept; a success is reported as BadParameter.
fn fit_reply(reply: Reply, max_frame_size: usize) -> Message {
    let message = reply.to_message();
    if message.encoded_len() <= max_frame_size {
        return message;
    }
    warn!(
        size = message.encoded_len(),
        max_size = max_frame_size,
        "Reply exceeds frame limit, dropping echoed fields"
    );

    let status = if reply.status == Status::SUCCESS {
        Status::BAD_PARAMETER
    } else {
        reply.status
    };
    let message = Reply::builder(reply.verb).status(status).build().to_message();
    if message.encoded_len() <= max_frame_size {
        return message;
    }
    Reply::builder("").status(status).build().to_message()
}
