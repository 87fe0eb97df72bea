//! Runnable demo: a tiny calculator engine behind the bridge.
//!
//! ```sh
//! cargo run --example calc_server
//! # in another terminal:
//! printf 'trace 2 + 3\0' | nc 127.0.0.1 53000 | xxd
//! ```
//!
//! Requests are `<lhs> <op> <rhs>` with `+ - * /`. Prefixing a request with
//! `trace ` makes the engine print each step as async output before the
//! result, which is the interesting part of the protocol to watch.

use replwire::engine::{EngineError, OutputSink, ScriptEngine};
use replwire::ReplServer;

struct CalcEngine;

impl CalcEngine {
    fn apply(lhs: f64, op: &str, rhs: f64) -> Result<f64, EngineError> {
        match op {
            "+" => Ok(lhs + rhs),
            "-" => Ok(lhs - rhs),
            "*" => Ok(lhs * rhs),
            "/" if rhs != 0.0 => Ok(lhs / rhs),
            "/" => Err(EngineError::new("division by zero")),
            other => Err(EngineError::new(format!("unknown operator: {other}"))),
        }
    }
}

impl ScriptEngine for CalcEngine {
    fn evaluate(&mut self, source: &str, output: &dyn OutputSink) -> Result<String, EngineError> {
        let (trace, expr) = match source.trim().strip_prefix("trace ") {
            Some(rest) => (true, rest),
            None => (false, source.trim()),
        };

        let parts: Vec<&str> = expr.split_whitespace().collect();
        let &[lhs, op, rhs] = parts.as_slice() else {
            return Err(EngineError::new("expected: <lhs> <op> <rhs>"));
        };

        let lhs: f64 = lhs
            .parse()
            .map_err(|e| EngineError::new(format!("bad operand {lhs}: {e}")))?;
        let rhs: f64 = rhs
            .parse()
            .map_err(|e| EngineError::new(format!("bad operand {rhs}: {e}")))?;

        if trace {
            output.emit(&format!("lhs = {lhs}\n"));
            output.emit(&format!("rhs = {rhs}\n"));
        }

        let value = Self::apply(lhs, op, rhs)?;
        if trace {
            output.emit(&format!("{lhs} {op} {rhs} = {value}\n"));
        }
        Ok(value.to_string())
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let server = ReplServer::bind("127.0.0.1:53000", CalcEngine).await?;
    println!("Ready for REPL connections on {}", server.local_addr());
    server.run().await?;
    Ok(())
}
