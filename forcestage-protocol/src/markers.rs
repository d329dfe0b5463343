//! Wire markers shared by both ends of the link.

/// Final line of a reply when the request asked for completion signalling
pub const SENTINEL: &str = "DONE";

/// Idle marker printed when the controller is ready for the next request
pub const PROMPT: &str = ">>>";

/// First word of every error block
pub const TRACEBACK: &str = "Traceback";

/// Full header line of an error block
pub const TRACEBACK_HEADER: &str = "Traceback (most recent call last):";

/// Terminates every line in both directions
pub const LINE_TERMINATOR: u8 = b'\r';

/// Form feed appended after the terminator on controller requests
pub const CONTROL_BYTE: u8 = 0x0c;

/// Byte suffix the host appends to controller requests
pub const CONTROLLER_SUFFIX: &[u8] = &[LINE_TERMINATOR, CONTROL_BYTE];

/// Byte suffix the host appends to force gauge requests
pub const GAUGE_SUFFIX: &[u8] = &[LINE_TERMINATOR];
