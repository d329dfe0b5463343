//! Controller link
//!
//! One request at a time: send it, read the echo, then listen until the
//! reply is complete. Without `wait`, the first idle marker (or a read
//! that times out) ends the reply. With `wait`, only the completion
//! sentinel does, and the idle marker after it is consumed as well. A
//! traceback ends the reply in either mode and becomes
//! [`HostError::RemoteExecution`].

use std::time::{Duration, Instant};

use forcestage_protocol::{classify, parse_position, Completion, ExchangeClassifier, LineKind};
use forcestage_protocol::{SwitchTrip, Verdict};
use tracing::{debug, error, info};

use crate::channel::LineChannel;
use crate::error::{HostError, Result};
use crate::framing::{EchoFraming, RequestFraming};

/// Record of one request and its reply
#[derive(Debug, Clone, PartialEq)]
pub struct CommandExchange {
    pub request: String,
    pub echo_matched: bool,
    /// Lines that were neither markers nor empty
    pub diagnostics: Vec<String>,
    pub completion: Completion,
}

impl CommandExchange {
    /// Number of diagnostic lines
    pub fn count(&self) -> usize {
        self.diagnostics.len()
    }

    /// Switch trips reported during the request
    pub fn switch_trips(&self) -> impl Iterator<Item = SwitchTrip> + '_ {
        self.diagnostics.iter().filter_map(|l| SwitchTrip::parse(l))
    }

    /// First diagnostic line that is a bare integer
    pub fn value(&self) -> Option<i32> {
        self.diagnostics.iter().find_map(|l| parse_position(l))
    }
}

/// Request/reply link to the motion controller
pub struct Controller<C, F = EchoFraming> {
    channel: C,
    framing: F,
    completion_timeout: Option<Duration>,
}

impl<C: LineChannel> Controller<C> {
    pub fn new(channel: C) -> Self {
        Self::with_framing(channel, EchoFraming)
    }
}

impl<C: LineChannel, F: RequestFraming> Controller<C, F> {
    pub fn with_framing(channel: C, framing: F) -> Self {
        Self {
            channel,
            framing,
            completion_timeout: None,
        }
    }

    /// Limit how long a waiting exchange listens for the sentinel
    pub fn with_completion_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.completion_timeout = timeout;
        self
    }

    pub fn channel_mut(&mut self) -> &mut C {
        &mut self.channel
    }

    /// Send one request and read its echo
    ///
    /// Idle markers left over from an earlier reply are skipped. Returns
    /// whether the echo matched.
    pub fn send(&mut self, request: &str) -> Result<bool> {
        let mut bytes = request.as_bytes().to_vec();
        bytes.extend_from_slice(self.framing.suffix());
        self.channel.write_all(&bytes)?;

        let echo = loop {
            let line = self.channel.read_line()?;
            if classify(&line) == LineKind::Prompt {
                debug!("Skipping stale idle marker before echo");
                continue;
            }
            break line;
        };
        self.framing.check_echo(request, &echo)
    }

    /// Read one reply line
    pub fn receive(&mut self) -> Result<String> {
        self.channel.read_line()
    }

    /// Send `request` and collect its reply
    pub fn exchange(&mut self, request: &str, wait: bool, verbose: bool) -> Result<CommandExchange> {
        let echo_matched = self.send(request)?;
        let mut classifier = ExchangeClassifier::new(wait);
        let mut diagnostics = Vec::new();
        let mut error_lines = Vec::new();
        let started = Instant::now();

        let completion = loop {
            if let Some(limit) = self.completion_timeout.filter(|_| wait) {
                let elapsed = started.elapsed();
                if elapsed > limit {
                    return Err(HostError::CompletionTimeout {
                        request: request.to_string(),
                        elapsed,
                    });
                }
            }

            let line = self.receive()?;
            match classifier.feed(&line) {
                Verdict::Diagnostic => {
                    if verbose {
                        info!("Motor message {}: {}", diagnostics.len() + 1, line);
                    } else {
                        debug!("Motor message {}: {}", diagnostics.len() + 1, line);
                    }
                    diagnostics.push(line);
                }
                Verdict::ErrorText => {
                    if !line.is_empty() {
                        error!("{}", line);
                        error_lines.push(line);
                    }
                }
                Verdict::Ignored => {}
                Verdict::Complete(Completion::ErrorSurfaced) => {
                    return Err(HostError::RemoteExecution { lines: error_lines });
                }
                Verdict::Complete(completion) => break completion,
            }
        };

        if completion == Completion::SentinelReached {
            self.consume_idle_marker()?;
        }

        Ok(CommandExchange {
            request: request.to_string(),
            echo_matched,
            diagnostics,
            completion,
        })
    }

    /// Send `request` and return the number of diagnostic lines
    pub fn talk_to_actuator(&mut self, request: &str, wait: bool, verbose: bool) -> Result<usize> {
        self.exchange(request, wait, verbose).map(|e| e.count())
    }

    fn consume_idle_marker(&mut self) -> Result<()> {
        loop {
            let line = self.receive()?;
            match classify(&line) {
                LineKind::Prompt | LineKind::Empty => return Ok(()),
                _ => debug!("Ignoring line after sentinel: {}", line),
            }
        }
    }
}
