//! Host error type
//!
//! Remote failures (a traceback from the controller) and local failures
//! (serial, I/O, configuration) share one enum so callers can propagate
//! everything with `?`. Malformed position replies and gauge timeouts are
//! not errors; they degrade to sentinel values at the call site.

use std::time::Duration;

use forcestage_protocol::Side;
use thiserror::Error;

/// Convenience alias for results using the host error type.
pub type Result<T> = std::result::Result<T, HostError>;

#[derive(Error, Debug)]
pub enum HostError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serial port error: {0}")]
    Serial(#[from] serialport::Error),

    #[error("Configuration error: {0}")]
    Config(#[from] toml::de::Error),

    #[error("Controller reported an error:\n{}", lines.join("\n"))]
    RemoteExecution { lines: Vec<String> },

    #[error("{side} side switch tripped twice while homing (position {position})")]
    RepeatedSwitchTrigger { side: Side, position: i32 },

    #[error("Unexpected reply to '{request}': '{reply}'")]
    InvalidReply { request: String, reply: String },

    #[error("No completion for '{request}' after {elapsed:?}")]
    CompletionTimeout { request: String, elapsed: Duration },
}
