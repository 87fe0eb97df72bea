//! TCP server: bind, serial accept loop, shutdown.
//!
//! The server accepts one connection, runs its [`ConnectionHandler`] to
//! completion, then accepts the next. Serial handling is deliberate: the
//! bridge serves a single developer tool, and it is also what guarantees at
//! most one `evaluate` call is in flight against the shared engine (the
//! engine mutex is a second line of defense, not the scheduler).
//!
//! A second simultaneous connection attempt sits in the listener backlog
//! until the current connection closes.
//!
//! # Example
//!
//! ```ignore
//! use replwire::{ReplServer, engine::ScriptEngine};
//!
//! let server = ReplServer::bind("127.0.0.1:53000", my_engine).await?;
//! println!("listening on {}", server.local_addr());
//! server.run().await?;
//! ```

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use tokio::net::{TcpListener, ToSocketAddrs};
use tokio::sync::oneshot;
use tracing::{info, warn};

use crate::connection::ConnectionHandler;
use crate::engine::ScriptEngine;
use crate::error::Result;

/// TCP bridge server around a shared script engine.
pub struct ReplServer<E> {
    listener: TcpListener,
    engine: Arc<Mutex<E>>,
    local_addr: SocketAddr,
    shutdown_rx: oneshot::Receiver<()>,
    shutdown_tx: Option<oneshot::Sender<()>>,
}

/// Handle that stops the accept loop.
///
/// The connection being serviced when `shutdown` is called is allowed to
/// finish; no new connections are accepted afterwards.
pub struct ShutdownHandle {
    tx: oneshot::Sender<()>,
}

impl ShutdownHandle {
    /// Signal the server to stop accepting connections.
    pub fn shutdown(self) {
        let _ = self.tx.send(());
    }
}

impl<E: ScriptEngine> ReplServer<E> {
    /// Bind the listening socket.
    ///
    /// # Errors
    ///
    /// Returns the bind error if the port is unavailable; this is fatal to
    /// server startup.
    pub async fn bind(addr: impl ToSocketAddrs, engine: E) -> Result<Self> {
        let listener = TcpListener::bind(addr).await?;
        let local_addr = listener.local_addr()?;
        let (shutdown_tx, shutdown_rx) = oneshot::channel();

        Ok(Self {
            listener,
            engine: Arc::new(Mutex::new(engine)),
            local_addr,
            shutdown_rx,
            shutdown_tx: Some(shutdown_tx),
        })
    }

    /// The bound address (useful when binding port 0).
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Take the shutdown handle for this server.
    ///
    /// Can only be taken once; returns `None` afterwards.
    pub fn shutdown_handle(&mut self) -> Option<ShutdownHandle> {
        self.shutdown_tx.take().map(|tx| ShutdownHandle { tx })
    }

    /// Run the accept loop until shutdown.
    ///
    /// Connections are serviced one at a time. Per-connection failures are
    /// logged and never stop the loop; accept failures likewise.
    pub async fn run(mut self) -> Result<()> {
        info!("REPL bridge listening on {}", self.local_addr);

        loop {
            let accepted = tokio::select! {
                _ = &mut self.shutdown_rx => {
                    info!("shutdown requested, closing listener");
                    return Ok(());
                }
                result = self.listener.accept() => result,
            };

            let (stream, peer_addr) = match accepted {
                Ok(pair) => pair,
                Err(e) => {
                    warn!("Failed to accept connection: {}", e);
                    continue;
                }
            };

            info!("New REPL connection from {}", peer_addr);
            let handler = ConnectionHandler::new(Arc::clone(&self.engine));
            match handler.run(stream).await {
                Ok(()) => info!("Connection from {} closed", peer_addr),
                Err(e) => warn!("Connection from {} failed: {}", peer_addr, e),
            }
        }
    }
}
