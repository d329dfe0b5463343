//! Controller Communication Protocol
//!
//! This crate defines the line-oriented text protocol spoken between the
//! host and the motion controller. The controller behaves like an
//! interactive prompt: every request is a single line of text, and every
//! reply is a sequence of lines ending with the idle marker.
//!
//! # Protocol Overview
//!
//! ```text
//! host  ──► "motor.step(400, done)\r\x0c"
//! ctrl  ◄── "motor.step(400, done)"      echo
//!       ◄── "INFO: motor moved ..."      zero or more diagnostics
//!       ◄── "DONE"                       only when the request asked for it
//!       ◄── ">>>"                        idle marker
//! ```
//!
//! Failures replace the diagnostics with a block whose first word is
//! `Traceback`, followed by the idle marker. There are no correlation ids;
//! exactly one request may be in flight.

#![cfg_attr(not(test), no_std)]
#![deny(unsafe_code)]

pub mod diag;
pub mod line;
pub mod markers;
pub mod request;
pub mod response;

pub use diag::{parse_position, Severity, Side, SwitchTrip};
pub use line::{Line, LineAssembler, LineError, MAX_LINE_LEN};
pub use markers::{PROMPT, SENTINEL, TRACEBACK};
pub use request::{ArithOp, DirectionArg, ParseError, Request, StepFlags};
pub use response::{classify, Completion, ExchangeClassifier, LineKind, Verdict};
