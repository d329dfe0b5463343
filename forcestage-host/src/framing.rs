//! Request framing
//!
//! The controller echoes every request before replying. How strictly that
//! echo is checked is a policy choice, so it sits behind
//! [`RequestFraming`].

use forcestage_protocol::markers::CONTROLLER_SUFFIX;
use tracing::warn;

use crate::error::{HostError, Result};

/// Terminator and echo policy for requests
pub trait RequestFraming {
    /// Bytes appended to every request
    fn suffix(&self) -> &'static [u8] {
        CONTROLLER_SUFFIX
    }

    /// Check the echo read back after sending `request`
    ///
    /// Returns whether it matched.
    fn check_echo(&self, request: &str, echo: &str) -> Result<bool>;
}

/// Warns on a mismatched echo and carries on
#[derive(Debug, Clone, Copy, Default)]
pub struct EchoFraming;

impl RequestFraming for EchoFraming {
    fn check_echo(&self, request: &str, echo: &str) -> Result<bool> {
        if request == echo {
            return Ok(true);
        }
        warn!(
            "Controller echo mismatch: sent '{}', got '{}'",
            request, echo
        );
        Ok(false)
    }
}

/// Fails the exchange on a mismatched echo
#[derive(Debug, Clone, Copy, Default)]
pub struct StrictEchoFraming;

impl RequestFraming for StrictEchoFraming {
    fn check_echo(&self, request: &str, echo: &str) -> Result<bool> {
        if request == echo {
            Ok(true)
        } else {
            Err(HostError::InvalidReply {
                request: request.to_string(),
                reply: echo.to_string(),
            })
        }
    }
}
