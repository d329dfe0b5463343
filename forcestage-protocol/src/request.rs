//! Request grammar
//!
//! Requests are written in a small call syntax the controller evaluates:
//!
//! ```text
//! 2+2                                  arithmetic probe
//! motor.set_direction(!origin, done)
//! motor.set_speed(6)
//! motor.set_velocity(origin, 10)
//! motor.step(400, done, trace)
//! motor.no_step()
//! motor.home(10, done)
//! motor.position                       property reads
//! motor.home_position
//! motor.details
//! switches
//! calibrate(6, 10)
//! ```
//!
//! Positional arguments come first; trailing bare words are flags. The same
//! types format back into this syntax, so the host builds its requests from
//! [`Request`] values rather than ad-hoc strings.

use core::fmt;

use heapless::Vec;

/// Most comma-separated arguments a call may carry
const MAX_ARGS: usize = 6;

/// Direction argument as written on the wire
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DirectionArg {
    /// The motor's origin direction (decreasing position)
    Origin,
    /// The opposite of the origin direction (increasing position)
    AwayFromOrigin,
    /// Raw rotation code; only 0 and 1 name a direction
    Code(i32),
}

impl fmt::Display for DirectionArg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DirectionArg::Origin => f.write_str("origin"),
            DirectionArg::AwayFromOrigin => f.write_str("!origin"),
            DirectionArg::Code(code) => write!(f, "{}", code),
        }
    }
}

/// Operator of an arithmetic probe
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ArithOp {
    Add,
    Sub,
    Mul,
}

impl ArithOp {
    fn symbol(self) -> char {
        match self {
            ArithOp::Add => '+',
            ArithOp::Sub => '-',
            ArithOp::Mul => '*',
        }
    }

    /// Evaluate, returning `None` on overflow
    pub fn apply(self, lhs: i32, rhs: i32) -> Option<i32> {
        match self {
            ArithOp::Add => lhs.checked_add(rhs),
            ArithOp::Sub => lhs.checked_sub(rhs),
            ArithOp::Mul => lhs.checked_mul(rhs),
        }
    }
}

/// Optional flags of `motor.step`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct StepFlags {
    /// Print the completion sentinel when the move ends
    pub done: bool,
    /// Print the position every 0.1 mm of travel
    pub trace: bool,
    /// Ignore host input while moving
    pub hold: bool,
}

/// A parsed request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Request {
    /// Liveness probe, replies with the result on one line
    Probe { lhs: i32, op: ArithOp, rhs: i32 },
    SetDirection { direction: DirectionArg, done: bool },
    SetSpeed { speed: u16, done: bool },
    SetVelocity { direction: DirectionArg, speed: u16, done: bool },
    Step { pulses: u32, flags: StepFlags },
    NoStep { done: bool },
    Home { speed: u16, done: bool },
    Position,
    HomePosition,
    Details,
    Switches,
    Calibrate { press_speed: Option<u16>, travel_speed: Option<u16> },
}

/// Errors that can occur while parsing a request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ParseError {
    /// Nothing but whitespace
    Empty,
    /// Name is not a known property or method
    UnknownRequest,
    /// Method named without a call
    MissingCall,
    /// Parentheses do not close, or text follows the closing one
    UnbalancedParens,
    /// Fewer positional arguments than the method needs
    MissingArgument,
    /// More arguments than the method accepts
    TooManyArguments,
    /// Argument is not a number in range
    InvalidNumber,
    /// Direction argument is neither a code nor `origin`/`!origin`
    InvalidDirection,
    /// Trailing word is not a flag this method understands
    UnknownFlag,
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let msg = match self {
            ParseError::Empty => "empty request",
            ParseError::UnknownRequest => "unknown request",
            ParseError::MissingCall => "method must be called with parentheses",
            ParseError::UnbalancedParens => "unbalanced parentheses",
            ParseError::MissingArgument => "missing argument",
            ParseError::TooManyArguments => "too many arguments",
            ParseError::InvalidNumber => "invalid number",
            ParseError::InvalidDirection => "invalid direction",
            ParseError::UnknownFlag => "unknown flag",
        };
        f.write_str(msg)
    }
}

impl Request {
    /// Parse one request line
    pub fn parse(text: &str) -> Result<Self, ParseError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(ParseError::Empty);
        }
        if let Some(probe) = parse_probe(text) {
            return Ok(probe);
        }

        let (name, args) = split_call(text)?;
        match name {
            "motor.position" => property(args, Request::Position),
            "motor.home_position" => property(args, Request::HomePosition),
            "motor.details" => property(args, Request::Details),
            "switches" => property(args, Request::Switches),
            "motor.set_direction" => {
                let call = Call::new(args?, 1, &["done"])?;
                Ok(Request::SetDirection {
                    direction: parse_direction(call.positional[0])?,
                    done: call.has("done"),
                })
            }
            "motor.set_speed" => {
                let call = Call::new(args?, 1, &["done"])?;
                Ok(Request::SetSpeed {
                    speed: parse_number(call.positional[0])?,
                    done: call.has("done"),
                })
            }
            "motor.set_velocity" => {
                let call = Call::new(args?, 2, &["done"])?;
                Ok(Request::SetVelocity {
                    direction: parse_direction(call.positional[0])?,
                    speed: parse_number(call.positional[1])?,
                    done: call.has("done"),
                })
            }
            "motor.step" => {
                let call = Call::new(args?, 1, &["done", "trace", "hold"])?;
                Ok(Request::Step {
                    pulses: parse_number(call.positional[0])?,
                    flags: StepFlags {
                        done: call.has("done"),
                        trace: call.has("trace"),
                        hold: call.has("hold"),
                    },
                })
            }
            "motor.no_step" => {
                let call = Call::new(args?, 0, &["done"])?;
                Ok(Request::NoStep {
                    done: call.has("done"),
                })
            }
            "motor.home" => {
                let call = Call::new(args?, 1, &["done"])?;
                Ok(Request::Home {
                    speed: parse_number(call.positional[0])?,
                    done: call.has("done"),
                })
            }
            "calibrate" => {
                let items = args?;
                if items.len() > 2 {
                    return Err(ParseError::TooManyArguments);
                }
                let press_speed = items.first().map(|s| parse_number(s)).transpose()?;
                let travel_speed = items.get(1).map(|s| parse_number(s)).transpose()?;
                Ok(Request::Calibrate {
                    press_speed,
                    travel_speed,
                })
            }
            _ => Err(ParseError::UnknownRequest),
        }
    }

    /// Whether the reply ends with the completion sentinel
    pub fn signals_completion(&self) -> bool {
        match *self {
            Request::SetDirection { done, .. }
            | Request::SetSpeed { done, .. }
            | Request::SetVelocity { done, .. }
            | Request::NoStep { done }
            | Request::Home { done, .. } => done,
            Request::Step { flags, .. } => flags.done,
            Request::Calibrate { .. } => true,
            _ => false,
        }
    }
}

fn flag(f: &mut fmt::Formatter<'_>, on: bool, name: &str) -> fmt::Result {
    if on {
        write!(f, ", {}", name)?;
    }
    Ok(())
}

impl fmt::Display for Request {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Request::Probe { lhs, op, rhs } => write!(f, "{}{}{}", lhs, op.symbol(), rhs),
            Request::SetDirection { direction, done } => {
                write!(f, "motor.set_direction({}", direction)?;
                flag(f, done, "done")?;
                f.write_str(")")
            }
            Request::SetSpeed { speed, done } => {
                write!(f, "motor.set_speed({}", speed)?;
                flag(f, done, "done")?;
                f.write_str(")")
            }
            Request::SetVelocity {
                direction,
                speed,
                done,
            } => {
                write!(f, "motor.set_velocity({}, {}", direction, speed)?;
                flag(f, done, "done")?;
                f.write_str(")")
            }
            Request::Step { pulses, flags } => {
                write!(f, "motor.step({}", pulses)?;
                flag(f, flags.done, "done")?;
                flag(f, flags.trace, "trace")?;
                flag(f, flags.hold, "hold")?;
                f.write_str(")")
            }
            Request::NoStep { done } => {
                f.write_str("motor.no_step(")?;
                if done {
                    f.write_str("done")?;
                }
                f.write_str(")")
            }
            Request::Home { speed, done } => {
                write!(f, "motor.home({}", speed)?;
                flag(f, done, "done")?;
                f.write_str(")")
            }
            Request::Position => f.write_str("motor.position"),
            Request::HomePosition => f.write_str("motor.home_position"),
            Request::Details => f.write_str("motor.details"),
            Request::Switches => f.write_str("switches"),
            Request::Calibrate {
                press_speed,
                travel_speed,
            } => {
                f.write_str("calibrate(")?;
                if let Some(press) = press_speed {
                    write!(f, "{}", press)?;
                    if let Some(travel) = travel_speed {
                        write!(f, ", {}", travel)?;
                    }
                }
                f.write_str(")")
            }
        }
    }
}

/// `lhs <op> rhs` with integer operands; anything else is not a probe
fn parse_probe(text: &str) -> Option<Request> {
    // Skip index 0 so a leading sign belongs to the left operand
    let (index, symbol) = text
        .char_indices()
        .skip(1)
        .find(|(_, c)| matches!(c, '+' | '-' | '*'))?;
    let op = match symbol {
        '+' => ArithOp::Add,
        '-' => ArithOp::Sub,
        _ => ArithOp::Mul,
    };
    let lhs = text[..index].trim().parse().ok()?;
    let rhs = text[index + 1..].trim().parse().ok()?;
    Some(Request::Probe { lhs, op, rhs })
}

type ArgList<'a> = Vec<&'a str, MAX_ARGS>;

/// Split `name(args)` into the name and its argument list
///
/// A bare name yields `Err(MissingCall)` in the argument slot so properties
/// can accept it while methods reject it.
fn split_call(text: &str) -> Result<(&str, Result<ArgList<'_>, ParseError>), ParseError> {
    let Some(open) = text.find('(') else {
        return Ok((text, Err(ParseError::MissingCall)));
    };
    let inner = text[open + 1..]
        .strip_suffix(')')
        .ok_or(ParseError::UnbalancedParens)?;
    if inner.contains('(') || inner.contains(')') {
        return Err(ParseError::UnbalancedParens);
    }

    let mut items = Vec::new();
    if !inner.trim().is_empty() {
        for item in inner.split(',') {
            let item = item.trim();
            if item.is_empty() {
                return Err(ParseError::MissingArgument);
            }
            items.push(item).map_err(|_| ParseError::TooManyArguments)?;
        }
    }
    Ok((text[..open].trim_end(), Ok(items)))
}

fn property(args: Result<ArgList<'_>, ParseError>, request: Request) -> Result<Request, ParseError> {
    match args {
        Err(ParseError::MissingCall) => Ok(request),
        Ok(items) if items.is_empty() => Ok(request),
        Ok(_) => Err(ParseError::TooManyArguments),
        Err(e) => Err(e),
    }
}

/// Arguments split into positionals and trailing flags
struct Call<'a> {
    positional: ArgList<'a>,
    flags: ArgList<'a>,
}

impl<'a> Call<'a> {
    fn new(items: ArgList<'a>, positional: usize, allowed: &[&str]) -> Result<Self, ParseError> {
        if items.len() < positional {
            return Err(ParseError::MissingArgument);
        }
        let mut call = Call {
            positional: Vec::new(),
            flags: Vec::new(),
        };
        for (i, item) in items.into_iter().enumerate() {
            if i < positional {
                // Capacity matches the source list
                let _ = call.positional.push(item);
            } else if allowed.contains(&item) {
                let _ = call.flags.push(item);
            } else if item.parse::<i64>().is_ok() {
                return Err(ParseError::TooManyArguments);
            } else {
                return Err(ParseError::UnknownFlag);
            }
        }
        Ok(call)
    }

    fn has(&self, name: &str) -> bool {
        self.flags.contains(&name)
    }
}

fn parse_number<T: core::str::FromStr>(text: &str) -> Result<T, ParseError> {
    text.parse().map_err(|_| ParseError::InvalidNumber)
}

fn parse_direction(text: &str) -> Result<DirectionArg, ParseError> {
    match text {
        "origin" => Ok(DirectionArg::Origin),
        "!origin" => Ok(DirectionArg::AwayFromOrigin),
        _ => text
            .parse()
            .map(DirectionArg::Code)
            .map_err(|_| ParseError::InvalidDirection),
    }
}
