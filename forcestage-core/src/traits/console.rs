//! Host console trait
//!
//! The console is the text channel to the host. Output is line based; input
//! is only peeked by the motion logic so a pending request can stop a move
//! without being consumed.

use core::fmt::{self, Write};

use forcestage_protocol::Severity;
use heapless::String;

/// Longest line written through [`ConsoleExt::emit`]; longer text is cut
pub const MAX_OUTPUT_LEN: usize = 128;

/// Text channel to the host
pub trait Console {
    /// Write one line; the implementation appends the terminator
    fn write_line(&mut self, line: &str);

    /// Whether host input is waiting, without consuming it
    fn input_pending(&mut self) -> bool;
}

/// Formatting helpers available on every [`Console`]
pub trait ConsoleExt: Console {
    /// Format and write one line
    fn emit(&mut self, args: fmt::Arguments<'_>) {
        let mut line: String<MAX_OUTPUT_LEN> = String::new();
        // Overflow truncates; the prefix that fit is still written
        let _ = line.write_fmt(args);
        self.write_line(&line);
    }

    /// Write a prefixed free-text diagnostic
    fn diagnostic(&mut self, severity: Severity, args: fmt::Arguments<'_>) {
        self.emit(format_args!("{}: {}", severity.prefix(), args));
    }

    fn info(&mut self, args: fmt::Arguments<'_>) {
        self.diagnostic(Severity::Info, args);
    }

    fn warning(&mut self, args: fmt::Arguments<'_>) {
        self.diagnostic(Severity::Warning, args);
    }
}

impl<C: Console + ?Sized> ConsoleExt for C {}
