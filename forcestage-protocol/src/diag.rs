//! Diagnostic lines with a fixed shape
//!
//! Most diagnostics are free text meant for a person. The few the host acts
//! on have a fixed shape defined here so both ends agree on it:
//!
//! - a bare integer line is a position report
//! - `TRIPPED <side> <position>` reports a limit switch that stopped a move

use core::fmt;

/// Keyword opening a switch trip line
const TRIPPED: &str = "TRIPPED";

/// Which end of the axis a limit switch sits on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Side {
    /// Origin end
    Left,
    /// Far end
    Right,
}

impl Side {
    pub fn as_str(self) -> &'static str {
        match self {
            Side::Left => "left",
            Side::Right => "right",
        }
    }

    pub fn from_name(text: &str) -> Option<Self> {
        match text {
            "left" => Some(Side::Left),
            "right" => Some(Side::Right),
            _ => None,
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Prefix of free-text diagnostics
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Severity {
    Info,
    Warning,
}

impl Severity {
    pub fn prefix(self) -> &'static str {
        match self {
            Severity::Info => "INFO",
            Severity::Warning => "WARNING",
        }
    }
}

/// A limit switch stopped a move
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SwitchTrip {
    pub side: Side,
    /// Motor position when the switch was seen
    pub position: i32,
}

impl SwitchTrip {
    /// Parse a trip line; other lines yield `None`
    pub fn parse(line: &str) -> Option<Self> {
        let mut words = line.split_whitespace();
        if words.next()? != TRIPPED {
            return None;
        }
        let side = Side::from_name(words.next()?)?;
        let position = words.next()?.parse().ok()?;
        if words.next().is_some() {
            return None;
        }
        Some(Self { side, position })
    }
}

impl fmt::Display for SwitchTrip {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", TRIPPED, self.side, self.position)
    }
}

/// Parse a position report line
pub fn parse_position(line: &str) -> Option<i32> {
    line.trim().parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trip_line() {
        let trip = SwitchTrip {
            side: Side::Right,
            position: 80012,
        };
        assert_eq!(trip.to_string(), "TRIPPED right 80012");
        assert_eq!(SwitchTrip::parse("TRIPPED right 80012"), Some(trip));
    }

    #[test]
    fn test_trip_rejects_other_lines() {
        assert_eq!(SwitchTrip::parse("INFO: left side switch pressed"), None);
        assert_eq!(SwitchTrip::parse("TRIPPED middle 3"), None);
        assert_eq!(SwitchTrip::parse("TRIPPED left"), None);
        assert_eq!(SwitchTrip::parse("TRIPPED left 3 4"), None);
    }

    #[test]
    fn test_position_line() {
        assert_eq!(parse_position(" -480 "), Some(-480));
        assert_eq!(parse_position("motor.step(8, trace)"), None);
        assert_eq!(parse_position(""), None);
    }
}
