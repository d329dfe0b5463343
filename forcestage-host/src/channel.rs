//! Line-oriented serial channels
//!
//! Both devices on the bench answer with CR-terminated text lines. A read
//! that times out returns whatever arrived so far, trimmed, which is the
//! empty string when nothing did; the exchange logic treats that as "the
//! device went quiet".

use std::io::{ErrorKind, Read, Write};

use forcestage_protocol::markers::LINE_TERMINATOR;
use serialport::SerialPort;
use tracing::trace;

use crate::config::PortConfig;
use crate::error::Result;

/// A bidirectional text channel to one device
pub trait LineChannel {
    /// Write raw bytes (request text plus its terminator)
    fn write_all(&mut self, bytes: &[u8]) -> Result<()>;

    /// Read one trimmed line; empty on timeout
    fn read_line(&mut self) -> Result<String>;
}

/// [`LineChannel`] over a serial port
pub struct SerialChannel {
    port: Box<dyn SerialPort>,
    name: String,
}

impl SerialChannel {
    /// Open the port described by `config`
    pub fn open(config: &PortConfig) -> Result<Self> {
        let port = serialport::new(&config.port, config.baud)
            .timeout(config.timeout())
            .open()?;
        Ok(Self {
            port,
            name: config.port.clone(),
        })
    }
}

impl LineChannel for SerialChannel {
    fn write_all(&mut self, bytes: &[u8]) -> Result<()> {
        trace!(
            "Sending to {}: '{}'",
            self.name,
            String::from_utf8_lossy(bytes).escape_default()
        );
        self.port.write_all(bytes)?;
        self.port.flush()?;
        Ok(())
    }

    fn read_line(&mut self) -> Result<String> {
        let mut raw = Vec::new();
        let mut byte = [0u8; 1];
        loop {
            match self.port.read(&mut byte) {
                Ok(0) => break,
                Ok(_) if byte[0] == LINE_TERMINATOR => break,
                Ok(_) => raw.push(byte[0]),
                Err(e) if e.kind() == ErrorKind::TimedOut => break,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(e.into()),
            }
        }
        let line = String::from_utf8_lossy(&raw).trim().to_string();
        trace!("Received from {}: '{}'", self.name, line.escape_default());
        Ok(line)
    }
}

#[cfg(test)]
pub(crate) mod scripted {
    use std::collections::VecDeque;

    use super::LineChannel;
    use crate::error::Result;

    /// Channel that replays a fixed script and records what was written
    #[derive(Debug, Default)]
    pub struct ScriptedChannel {
        pub replies: VecDeque<String>,
        /// Returned once the script runs out (empty = timeout)
        pub fallback: String,
        pub written: Vec<String>,
    }

    impl ScriptedChannel {
        pub fn new(replies: &[&str]) -> Self {
            Self {
                replies: replies.iter().map(|s| s.to_string()).collect(),
                ..Self::default()
            }
        }

        pub fn push(&mut self, replies: &[&str]) {
            self.replies.extend(replies.iter().map(|s| s.to_string()));
        }
    }

    impl LineChannel for ScriptedChannel {
        fn write_all(&mut self, bytes: &[u8]) -> Result<()> {
            self.written
                .push(String::from_utf8_lossy(bytes).into_owned());
            Ok(())
        }

        fn read_line(&mut self) -> Result<String> {
            Ok(self
                .replies
                .pop_front()
                .unwrap_or_else(|| self.fallback.clone()))
        }
    }
}
