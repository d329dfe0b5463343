//! Force gauge client
//!
//! The gauge answers a `?` request with `<value> N`. While it is busy it
//! answers `*10` instead; those replies are retried for a short window and
//! then reported as [`GAUGE_ERROR`].

use std::time::{Duration, Instant};

use forcestage_protocol::markers::GAUGE_SUFFIX;
use tracing::{debug, warn};

use crate::channel::LineChannel;
use crate::error::Result;

/// Reading request
pub const REQUEST_CODE: &str = "?";
/// Busy reply
pub const ERROR_CODE: &str = "*10";
/// Value returned when no valid reading could be taken
pub const GAUGE_ERROR: f64 = 99.0;
/// Unit every valid reading ends with
pub const UNIT_SUFFIX: &str = " N";

/// Parse a reading reply; `None` for a wrong unit or bad number
pub fn parse_reading(reply: &str) -> Option<f64> {
    reply.strip_suffix(UNIT_SUFFIX)?.trim().parse().ok()
}

/// Digital force gauge on its own serial port
pub struct ForceGauge<C> {
    channel: C,
    retry_window: Duration,
}

impl<C: LineChannel> ForceGauge<C> {
    pub fn new(channel: C, retry_window: Duration) -> Self {
        Self {
            channel,
            retry_window,
        }
    }

    pub fn channel_mut(&mut self) -> &mut C {
        &mut self.channel
    }

    pub fn retry_window(&self) -> Duration {
        self.retry_window
    }

    /// Request one reading and return the raw reply
    pub fn request_reading(&mut self) -> Result<String> {
        let mut bytes = REQUEST_CODE.as_bytes().to_vec();
        bytes.extend_from_slice(GAUGE_SUFFIX);
        self.channel.write_all(&bytes)?;
        self.channel.read_line()
    }

    /// Take one reading in newtons
    ///
    /// Busy replies are retried until `timeout` has passed since the first
    /// one. Returns [`GAUGE_ERROR`] on timeout, a wrong unit or a reply
    /// that does not parse.
    pub fn get_force_measurement(&mut self, timeout: Duration) -> Result<f64> {
        let mut reply = self.request_reading()?;
        if reply == ERROR_CODE {
            let started = Instant::now();
            while reply == ERROR_CODE {
                if started.elapsed() > timeout {
                    warn!(
                        "Force gauge returning error code for at least {:?}",
                        timeout
                    );
                    return Ok(GAUGE_ERROR);
                }
                reply = self.request_reading()?;
            }
            debug!(
                "Force gauge reading obtained after {:?} of error codes",
                started.elapsed()
            );
        }

        match parse_reading(&reply) {
            Some(value) => Ok(value),
            None => {
                warn!("Force gauge returned '{}', expected a value in N", reply);
                Ok(GAUGE_ERROR)
            }
        }
    }

    /// Reading with the configured retry window
    pub fn read_force(&mut self) -> Result<f64> {
        self.get_force_measurement(self.retry_window)
    }
}
