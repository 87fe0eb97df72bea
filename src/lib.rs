//! # replwire
//!
//! TCP bridge between a remote REPL tool and an embedded script-evaluation
//! engine.
//!
//! A client sends source snippets as terminator-delimited frames; the bridge
//! drives the engine synchronously and streams any console output the engine
//! produces *during* evaluation back over the same socket as separate frames,
//! always ahead of the evaluation's result frame.
//!
//! ## Architecture
//!
//! - **Wire protocol** ([`protocol`]): frame = payload bytes + one terminator
//!   byte (`0x00` response, `0x01` async output). No length prefix, no
//!   handshake.
//! - **Engine seam** ([`engine`]): [`ScriptEngine`] evaluates one snippet at
//!   a time, emitting output through an injected [`OutputSink`].
//! - **Connection handling**: a per-connection state machine reads request
//!   frames, runs the engine on the blocking pool, and relays output chunks
//!   through a dedicated writer task whose channel FIFO enforces the
//!   output-before-response ordering.
//! - **Server** ([`server`]): serial accept loop; one connection at a time,
//!   one shared engine behind a mutex.
//!
//! ## Example
//!
//! ```ignore
//! use replwire::{ReplServer, engine::{EngineError, OutputSink, ScriptEngine}};
//!
//! struct MyEngine;
//!
//! impl ScriptEngine for MyEngine {
//!     fn evaluate(
//!         &mut self,
//!         source: &str,
//!         output: &dyn OutputSink,
//!     ) -> Result<String, EngineError> {
//!         output.emit("evaluating...\n");
//!         Ok(format!("evaluated {} bytes", source.len()))
//!     }
//! }
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let server = ReplServer::bind("127.0.0.1:53000", MyEngine).await?;
//!     server.run().await?;
//!     Ok(())
//! }
//! ```
//!
//! This crate assumes a trusted local development client; it is not a
//! general RPC framework and does not multiplex clients.

pub mod engine;
pub mod error;
pub mod protocol;
pub mod relay;
pub mod server;
pub mod writer;

mod connection;

pub use connection::ConnectionHandler;
pub use engine::{EngineError, NullSink, OutputSink, ScriptEngine};
pub use error::{ReplwireError, Result};
pub use protocol::{FrameBuffer, Message, Tag};
pub use relay::OutputRelay;
pub use server::{ReplServer, ShutdownHandle};
