//! Reply classification for the host side of the link.
//!
//! The host reads reply lines one at a time and feeds them to an
//! [`ExchangeClassifier`], which decides when the exchange is over and how
//! it ended. A traceback always wins: once one is seen, the rest of the
//! reply is drained as error text even if the sentinel follows.

use crate::markers::{PROMPT, SENTINEL, TRACEBACK};

/// What a single reply line is
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LineKind<'a> {
    /// Blank line, or nothing arrived before the read timed out
    Empty,
    /// Idle marker (possibly with trailing text on the same line)
    Prompt,
    /// Completion sentinel
    Sentinel,
    /// First line of an error block
    Traceback,
    /// Anything else
    Diagnostic(&'a str),
}

/// Classify one reply line
pub fn classify(line: &str) -> LineKind<'_> {
    let line = line.trim();
    if line.is_empty() {
        LineKind::Empty
    } else if line.starts_with(PROMPT) {
        LineKind::Prompt
    } else if line == SENTINEL {
        LineKind::Sentinel
    } else if line.split_whitespace().next() == Some(TRACEBACK) {
        LineKind::Traceback
    } else {
        LineKind::Diagnostic(line)
    }
}

/// How an exchange finished
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Completion {
    /// The completion sentinel arrived
    SentinelReached,
    /// The controller went idle (or stopped talking) without error
    IdleReturned,
    /// A traceback was reported
    ErrorSurfaced,
}

/// Decision for one fed line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Verdict {
    /// A diagnostic line to count and surface
    Diagnostic,
    /// Part of an error block
    ErrorText,
    /// Not meaningful in the current state
    Ignored,
    /// The exchange is over
    Complete(Completion),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ExchangeState {
    Listening,
    Draining,
    Finished(Completion),
}

/// State machine deciding when a reply is complete
///
/// In blocking mode only the sentinel (or a traceback) ends the exchange;
/// empty reads and idle markers are skipped. In non-blocking mode the first
/// empty read or idle marker ends it.
#[derive(Debug, Clone)]
pub struct ExchangeClassifier {
    wait_for_sentinel: bool,
    state: ExchangeState,
}

impl ExchangeClassifier {
    /// Create a classifier for one exchange
    pub fn new(wait_for_sentinel: bool) -> Self {
        Self {
            wait_for_sentinel,
            state: ExchangeState::Listening,
        }
    }

    /// Outcome, once the exchange is over
    pub fn completion(&self) -> Option<Completion> {
        match self.state {
            ExchangeState::Finished(completion) => Some(completion),
            _ => None,
        }
    }

    /// Feed one reply line
    pub fn feed(&mut self, line: &str) -> Verdict {
        let kind = classify(line);
        match self.state {
            ExchangeState::Finished(_) => Verdict::Ignored,
            ExchangeState::Draining => match kind {
                LineKind::Prompt | LineKind::Empty => self.finish(Completion::ErrorSurfaced),
                _ => Verdict::ErrorText,
            },
            ExchangeState::Listening => match kind {
                LineKind::Traceback => {
                    self.state = ExchangeState::Draining;
                    Verdict::ErrorText
                }
                LineKind::Sentinel if self.wait_for_sentinel => {
                    self.finish(Completion::SentinelReached)
                }
                LineKind::Sentinel => Verdict::Ignored,
                LineKind::Prompt | LineKind::Empty if self.wait_for_sentinel => Verdict::Ignored,
                LineKind::Prompt | LineKind::Empty => self.finish(Completion::IdleReturned),
                LineKind::Diagnostic(_) => Verdict::Diagnostic,
            },
        }
    }

    fn finish(&mut self, completion: Completion) -> Verdict {
        self.state = ExchangeState::Finished(completion);
        Verdict::Complete(completion)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(wait: bool, lines: &[&str]) -> (usize, Option<Completion>) {
        let mut classifier = ExchangeClassifier::new(wait);
        let mut count = 0;
        for line in lines {
            match classifier.feed(line) {
                Verdict::Diagnostic => count += 1,
                Verdict::Complete(_) => break,
                _ => {}
            }
        }
        (count, classifier.completion())
    }

    #[test]
    fn test_classify() {
        assert_eq!(classify("  "), LineKind::Empty);
        assert_eq!(classify(">>> "), LineKind::Prompt);
        assert_eq!(classify(">>> motor.position"), LineKind::Prompt);
        assert_eq!(classify("DONE"), LineKind::Sentinel);
        assert_eq!(
            classify("Traceback (most recent call last):"),
            LineKind::Traceback
        );
        assert_eq!(classify("4"), LineKind::Diagnostic("4"));
        assert_eq!(classify("DONE later"), LineKind::Diagnostic("DONE later"));
    }

    #[test]
    fn test_non_blocking_ends_at_prompt() {
        assert_eq!(
            run(false, &["4", ">>>"]),
            (1, Some(Completion::IdleReturned))
        );
    }

    #[test]
    fn test_non_blocking_ends_on_silence() {
        assert_eq!(
            run(false, &["INFO: x", "INFO: y", ""]),
            (2, Some(Completion::IdleReturned))
        );
    }

    #[test]
    fn test_blocking_waits_past_prompt_for_sentinel() {
        assert_eq!(
            run(true, &["INFO: moving", "", ">>>", "INFO: stopped", "DONE"]),
            (2, Some(Completion::SentinelReached))
        );
    }

    #[test]
    fn test_traceback_wins_over_sentinel() {
        let lines = [
            "Traceback (most recent call last):",
            "  request \"motor.step(5)\"",
            "SafetyViolation: travel limit exceeded",
            "DONE",
            ">>>",
        ];
        assert_eq!(run(true, &lines), (0, Some(Completion::ErrorSurfaced)));
        assert_eq!(run(false, &lines), (0, Some(Completion::ErrorSurfaced)));
    }

    #[test]
    fn test_lines_after_finish_are_ignored() {
        let mut classifier = ExchangeClassifier::new(false);
        assert_eq!(
            classifier.feed(">>>"),
            Verdict::Complete(Completion::IdleReturned)
        );
        assert_eq!(classifier.feed("Traceback"), Verdict::Ignored);
    }
}
