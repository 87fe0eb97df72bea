//! Script-engine interface.
//!
//! The bridge treats the evaluation engine as an external collaborator,
//! specified by two small traits:
//!
//! - [`ScriptEngine`] evaluates one source snippet at a time.
//! - [`OutputSink`] receives console/print output the engine produces
//!   *during* an evaluation.
//!
//! The sink is passed per call rather than registered globally, so it cannot
//! be left dangling across evaluations: the engine can only emit output while
//! the call that owns the sink is on the stack.
//!
//! # Example
//!
//! ```
//! use replwire::engine::{EngineError, OutputSink, ScriptEngine};
//!
//! /// Engine that upper-cases its input and echoes it as output first.
//! struct ShoutEngine;
//!
//! impl ScriptEngine for ShoutEngine {
//!     fn evaluate(
//!         &mut self,
//!         source: &str,
//!         output: &dyn OutputSink,
//!     ) -> Result<String, EngineError> {
//!         output.emit(&format!("evaluating {source}\n"));
//!         Ok(source.to_uppercase())
//!     }
//! }
//! ```

use thiserror::Error;

/// Evaluation failure inside the engine (syntax error, runtime exception).
///
/// The display text is engine-defined and travels back to the client as an
/// ordinary Response frame; it never closes the connection.
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct EngineError {
    message: String,
}

impl EngineError {
    /// Create an engine error with the given message text.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    /// The engine-defined error text.
    pub fn message(&self) -> &str {
        &self.message
    }
}

/// Receiver for output chunks the engine produces during evaluation.
///
/// A small injected capability so the connection-side relay can be swapped
/// for a fake sink in tests.
pub trait OutputSink: Send + Sync {
    /// Receive one output chunk.
    ///
    /// Invoked synchronously on the thread driving
    /// [`ScriptEngine::evaluate`], zero or more times per call.
    fn emit(&self, chunk: &str);
}

/// An embedded script-evaluation engine.
///
/// At most one `evaluate` call is in flight at a time; the server enforces
/// this with a mutex around the shared engine instance.
pub trait ScriptEngine: Send + 'static {
    /// Evaluate one source snippet, emitting any console output to `output`
    /// as it is produced.
    ///
    /// Blocking is expected; the bridge runs this on the blocking thread
    /// pool.
    fn evaluate(&mut self, source: &str, output: &dyn OutputSink) -> Result<String, EngineError>;
}

/// Sink that discards all output.
///
/// For driving an engine outside a connection (warm-up, tests).
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

impl OutputSink for NullSink {
    fn emit(&self, _chunk: &str) {}
}
