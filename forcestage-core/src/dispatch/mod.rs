//! Request dispatcher
//!
//! Turns request lines from the host into stage operations and writes the
//! reply. Every reply has the same shape:
//!
//! ```text
//! <request echoed verbatim>
//! <diagnostic lines>
//! DONE                      when the request signals completion
//! >>>
//! ```
//!
//! A failed request replaces the sentinel with a traceback block. The
//! dispatcher never stops on an error; the next request is handled as usual.

use core::fmt;

use forcestage_protocol::markers::TRACEBACK_HEADER;
use forcestage_protocol::{
    DirectionArg, LineAssembler, LineError, ParseError, Request, PROMPT, SENTINEL,
};

use crate::calibration;
use crate::config::CalibrationSpeeds;
use crate::error::MotionError;
use crate::motion::Direction;
use crate::stage::{Stage, StepOptions};
use crate::traits::{Console, ConsoleExt, StageHardware};

/// Why a request failed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DispatchError {
    /// Request line too long
    Line(LineError),
    /// Request did not parse
    Parse(ParseError),
    /// Probe result does not fit
    Overflow,
    /// Stage operation failed
    Motion(MotionError),
}

impl DispatchError {
    /// Name printed on the last line of the traceback
    pub fn class_name(&self) -> &'static str {
        match self {
            DispatchError::Line(_) | DispatchError::Parse(_) => "SyntaxError",
            DispatchError::Overflow => "OverflowError",
            DispatchError::Motion(e) => e.class().name(),
        }
    }
}

impl fmt::Display for DispatchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DispatchError::Line(e) => write!(f, "{}", e),
            DispatchError::Parse(e) => write!(f, "{}", e),
            DispatchError::Overflow => f.write_str("integer overflow"),
            DispatchError::Motion(e) => write!(f, "{}", e),
        }
    }
}

impl From<MotionError> for DispatchError {
    fn from(e: MotionError) -> Self {
        DispatchError::Motion(e)
    }
}

impl From<ParseError> for DispatchError {
    fn from(e: ParseError) -> Self {
        DispatchError::Parse(e)
    }
}

/// Reads request bytes and runs them against a [`Stage`]
#[derive(Debug, Clone)]
pub struct Dispatcher {
    assembler: LineAssembler,
    speeds: CalibrationSpeeds,
}

impl Dispatcher {
    /// `speeds` are used by `calibrate()` calls that omit them
    pub fn new(speeds: CalibrationSpeeds) -> Self {
        Self {
            assembler: LineAssembler::new(),
            speeds,
        }
    }

    /// Announce readiness
    pub fn start<C: Console>(&self, console: &mut C) {
        console.write_line(PROMPT);
    }

    /// Feed one received byte; runs the request once its line is complete
    ///
    /// Returns `None` until a line completes.
    pub fn feed<H, C>(
        &mut self,
        byte: u8,
        stage: &mut Stage,
        hw: &mut H,
        console: &mut C,
    ) -> Option<Result<Option<Request>, DispatchError>>
    where
        H: StageHardware,
        C: Console,
    {
        match self.assembler.feed(byte) {
            Ok(Some(line)) => Some(self.handle_line(&line, stage, hw, console)),
            Ok(None) => None,
            Err(e) => {
                let error = DispatchError::Line(e);
                write_traceback(console, "<input>", &error);
                console.write_line(PROMPT);
                Some(Err(error))
            }
        }
    }

    /// Run one request line and write the complete reply
    ///
    /// Returns the request that ran, or `None` for a blank line.
    pub fn handle_line<H, C>(
        &mut self,
        line: &str,
        stage: &mut Stage,
        hw: &mut H,
        console: &mut C,
    ) -> Result<Option<Request>, DispatchError>
    where
        H: StageHardware,
        C: Console,
    {
        if line.trim().is_empty() {
            console.write_line(PROMPT);
            return Ok(None);
        }
        console.write_line(line);

        let result = Request::parse(line)
            .map_err(DispatchError::from)
            .and_then(|request| {
                self.execute(request, stage, hw, console)?;
                Ok(request)
            });

        match result {
            Ok(request) => {
                if request.signals_completion() {
                    console.write_line(SENTINEL);
                }
                console.write_line(PROMPT);
                Ok(Some(request))
            }
            Err(error) => {
                write_traceback(console, line, &error);
                console.write_line(PROMPT);
                Err(error)
            }
        }
    }

    fn execute<H, C>(
        &mut self,
        request: Request,
        stage: &mut Stage,
        hw: &mut H,
        console: &mut C,
    ) -> Result<(), DispatchError>
    where
        H: StageHardware,
        C: Console,
    {
        match request {
            Request::Probe { lhs, op, rhs } => {
                let value = op.apply(lhs, rhs).ok_or(DispatchError::Overflow)?;
                console.emit(format_args!("{}", value));
            }
            Request::SetDirection { direction, .. } => {
                let direction = resolve_direction(stage, direction)?;
                stage.set_direction(hw, direction)?;
            }
            Request::SetSpeed { speed, .. } => {
                stage.set_speed(speed)?;
            }
            Request::SetVelocity {
                direction, speed, ..
            } => {
                let direction = resolve_direction(stage, direction)?;
                stage.set_velocity(hw, direction, speed)?;
            }
            Request::Step { pulses, flags } => {
                let options = StepOptions {
                    interruptible: !flags.hold,
                    trace: flags.trace,
                    ..StepOptions::COMMAND
                };
                let report = stage.step(hw, console, pulses, options)?;
                console.info(format_args!(
                    "motor moved {} pulses in direction {}",
                    report.pulses,
                    stage.motor().direction().code()
                ));
                if report.aborted {
                    console.info(format_args!("move interrupted by host input"));
                }
            }
            Request::NoStep { .. } => stage.no_step(hw),
            Request::Home { speed, .. } => {
                let report = stage.home(hw, console, speed)?;
                if report.aborted {
                    console.info(format_args!("homing interrupted by host input"));
                }
            }
            Request::Position => console.emit(format_args!("{}", stage.motor().position())),
            Request::HomePosition => {
                console.emit(format_args!("{}", stage.motor().home_position()))
            }
            Request::Details => stage.report_details(console),
            Request::Switches => stage.report_switches(console),
            Request::Calibrate {
                press_speed,
                travel_speed,
            } => {
                let speeds = CalibrationSpeeds {
                    press_speed: press_speed.unwrap_or(self.speeds.press_speed),
                    travel_speed: travel_speed.unwrap_or(self.speeds.travel_speed),
                };
                calibration::calibrate(stage, hw, console, speeds)?;
            }
        }
        Ok(())
    }
}

fn resolve_direction(stage: &Stage, arg: DirectionArg) -> Result<Direction, MotionError> {
    let origin = stage.motor().origin_direction();
    match arg {
        DirectionArg::Origin => Ok(origin),
        DirectionArg::AwayFromOrigin => Ok(!origin),
        DirectionArg::Code(code) => Direction::from_code(code),
    }
}

fn write_traceback<C: Console>(console: &mut C, request: &str, error: &DispatchError) {
    console.write_line(TRACEBACK_HEADER);
    console.emit(format_args!("  request \"{}\"", request));
    console.emit(format_args!("{}: {}", error.class_name(), error));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::StageConfig;
    use crate::sim::{SimConsole, SimRig};

    fn setup() -> (Dispatcher, Stage, SimRig, SimConsole) {
        let mut stage = Stage::new(&StageConfig::default()).unwrap();
        stage.motor_mut().set_position(1_000);
        (
            Dispatcher::new(CalibrationSpeeds::default()),
            stage,
            SimRig::new(1_000, 0, 64_000),
            SimConsole::default(),
        )
    }

    fn send(
        dispatcher: &mut Dispatcher,
        stage: &mut Stage,
        hw: &mut SimRig,
        console: &mut SimConsole,
        text: &str,
    ) {
        for &byte in text.as_bytes().iter().chain(b"\r\x0c") {
            dispatcher.feed(byte, stage, hw, console);
        }
    }

    #[test]
    fn test_probe_reply_shape() {
        let (mut dispatcher, mut stage, mut hw, mut console) = setup();
        send(&mut dispatcher, &mut stage, &mut hw, &mut console, "2+2");
        assert_eq!(console.lines, ["2+2", "4", ">>>"]);
    }

    #[test]
    fn test_step_with_done() {
        let (mut dispatcher, mut stage, mut hw, mut console) = setup();
        send(
            &mut dispatcher,
            &mut stage,
            &mut hw,
            &mut console,
            "motor.step(80, done)",
        );
        assert_eq!(
            console.lines,
            [
                "motor.step(80, done)",
                "INFO: motor moved 80 pulses in direction 0",
                "DONE",
                ">>>"
            ]
        );
        assert_eq!(stage.motor().position(), 920);
    }

    #[test]
    fn test_invalid_direction_code_is_configuration_error() {
        let (mut dispatcher, mut stage, mut hw, mut console) = setup();
        send(
            &mut dispatcher,
            &mut stage,
            &mut hw,
            &mut console,
            "motor.set_direction(2, done)",
        );
        assert_eq!(console.lines[1], "Traceback (most recent call last):");
        assert!(console.lines[3].starts_with("ConfigurationError: direction code 2"));
        assert_eq!(console.lines.last().map(String::as_str), Some(">>>"));
        assert!(!console.contains("DONE"));
    }

    #[test]
    fn test_unsafe_direction_is_safety_violation() {
        let (mut dispatcher, mut stage, mut hw, mut console) = setup();
        stage.motor_mut().set_position(-480);
        send(
            &mut dispatcher,
            &mut stage,
            &mut hw,
            &mut console,
            "motor.set_direction(origin)",
        );
        assert!(console.contains("SafetyViolation: direction 0 refused at position -480"));
    }

    #[test]
    fn test_syntax_error_keeps_loop_running() {
        let (mut dispatcher, mut stage, mut hw, mut console) = setup();
        send(&mut dispatcher, &mut stage, &mut hw, &mut console, "motor.fly(1)");
        assert!(console.contains("SyntaxError: unknown request"));

        console.lines.clear();
        send(&mut dispatcher, &mut stage, &mut hw, &mut console, "motor.position");
        assert_eq!(console.lines, ["motor.position", "1000", ">>>"]);
    }

    #[test]
    fn test_set_velocity_away_from_origin() {
        let (mut dispatcher, mut stage, mut hw, mut console) = setup();
        send(
            &mut dispatcher,
            &mut stage,
            &mut hw,
            &mut console,
            "motor.set_velocity(!origin, 6)",
        );
        assert_eq!(stage.motor().direction(), Direction::Clockwise);
        assert_eq!(stage.motor().speed(), 6);
        assert_eq!(hw.direction, Direction::Clockwise);
    }

    #[test]
    fn test_calibrate_always_signals_completion() {
        let (mut dispatcher, mut stage, mut hw, mut console) = setup();
        hw.right_at = 5_000;
        send(
            &mut dispatcher,
            &mut stage,
            &mut hw,
            &mut console,
            "calibrate(6, 10)",
        );
        let tail: Vec<&str> = console.lines.iter().rev().take(2).map(String::as_str).collect();
        assert_eq!(tail, [">>>", "DONE"]);
        assert_eq!(stage.motor().max_steps(), 5_000);
    }

    #[test]
    fn test_no_step_holds_output_low() {
        let (mut dispatcher, mut stage, mut hw, mut console) = setup();
        send(&mut dispatcher, &mut stage, &mut hw, &mut console, "motor.no_step()");
        assert!(hw.step_held_low);
        assert_eq!(console.lines, ["motor.no_step()", ">>>"]);
    }

    #[test]
    fn test_blank_line_only_prompts() {
        let (mut dispatcher, mut stage, mut hw, mut console) = setup();
        send(&mut dispatcher, &mut stage, &mut hw, &mut console, "");
        assert_eq!(console.lines, [">>>"]);
    }
}
