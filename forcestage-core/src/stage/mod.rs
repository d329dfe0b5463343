//! Stage context
//!
//! [`Stage`] owns the motor and both limit switches. It is created once at
//! startup and handed to the dispatch loop, which is the only code that
//! mutates it. Hardware and console are passed into each operation so the
//! same logic runs against real pins and against the test simulation.

mod home;

pub use home::HomeReport;

use forcestage_protocol::SwitchTrip;

use crate::config::StageConfig;
use crate::error::MotionError;
use crate::motion::{pulses_to_mm, Direction, PulseTiming, StepperMotor, TRACE_INTERVAL_PULSES};
use crate::switch::{LimitSwitch, Side};
use crate::traits::{Console, ConsoleExt, StageHardware};

/// How a call to [`Stage::step`] behaves
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct StepOptions {
    /// Stop between pulses when host input is pending
    pub interruptible: bool,
    /// Stop when a limit switch is pressed
    pub react_to_switches: bool,
    /// Leave a pressed switch alone instead of backing off it
    pub calibrating: bool,
    /// Print the position every 0.1 mm
    pub trace: bool,
}

impl StepOptions {
    /// A move requested by the host
    pub const COMMAND: Self = Self {
        interruptible: true,
        react_to_switches: true,
        calibrating: false,
        trace: false,
    };

    /// Backing off a switch that is known to be pressed
    pub const CLEARING: Self = Self {
        interruptible: false,
        react_to_switches: false,
        calibrating: false,
        trace: false,
    };

    /// Searching for a switch
    pub const CALIBRATION: Self = Self {
        interruptible: true,
        react_to_switches: true,
        calibrating: true,
        trace: false,
    };
}

/// Outcome of a completed [`Stage::step`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct StepReport {
    /// Pulses issued
    pub pulses: u32,
    /// Switch that ended the move early
    pub stopped_by: Option<Side>,
    /// Host input ended the move early
    pub aborted: bool,
}

/// Motor plus limit switches
#[derive(Debug, Clone)]
pub struct Stage {
    motor: StepperMotor,
    min_switch: LimitSwitch,
    max_switch: LimitSwitch,
}

impl Stage {
    /// Build the stage from its configuration
    pub fn new(config: &StageConfig) -> Result<Self, MotionError> {
        Ok(Self {
            motor: StepperMotor::new(&config.motor)?,
            min_switch: LimitSwitch::new(Side::Left, &config.left),
            max_switch: LimitSwitch::new(Side::Right, &config.right),
        })
    }

    pub fn motor(&self) -> &StepperMotor {
        &self.motor
    }

    pub(crate) fn motor_mut(&mut self) -> &mut StepperMotor {
        &mut self.motor
    }

    pub fn switch(&self, side: Side) -> &LimitSwitch {
        match side {
            Side::Left => &self.min_switch,
            Side::Right => &self.max_switch,
        }
    }

    fn switch_mut(&mut self, side: Side) -> &mut LimitSwitch {
        match side {
            Side::Left => &mut self.min_switch,
            Side::Right => &mut self.max_switch,
        }
    }

    /// Switch at the origin end
    pub fn min_side(&self) -> Side {
        self.min_switch.side()
    }

    /// Switch at the far end
    pub fn max_side(&self) -> Side {
        self.max_switch.side()
    }

    /// Direction that moves onto a switch
    pub fn heading_toward(&self, side: Side) -> Direction {
        !self.heading_away_from(side)
    }

    /// Direction that moves off a switch
    pub fn heading_away_from(&self, side: Side) -> Direction {
        if side == self.min_side() {
            self.motor.positive_direction()
        } else {
            self.motor.origin_direction()
        }
    }

    /// Drive the outputs to match the stored state (startup)
    pub fn sync_outputs<H: StageHardware>(&self, hw: &mut H) {
        hw.write_direction(self.motor.direction());
        hw.hold_step_low();
    }

    /// Set the direction through the safety gate and write the pin
    pub fn set_direction<H: StageHardware>(
        &mut self,
        hw: &mut H,
        direction: Direction,
    ) -> Result<(), MotionError> {
        self.motor.set_direction(direction)?;
        hw.write_direction(direction);
        Ok(())
    }

    /// Select a speed from the duty table
    pub fn set_speed(&mut self, speed: u16) -> Result<PulseTiming, MotionError> {
        self.motor.set_speed(speed)
    }

    /// Set direction, then speed
    pub fn set_velocity<H: StageHardware>(
        &mut self,
        hw: &mut H,
        direction: Direction,
        speed: u16,
    ) -> Result<PulseTiming, MotionError> {
        self.set_direction(hw, direction)?;
        self.set_speed(speed)
    }

    /// Hold the step output low
    pub fn no_step<H: StageHardware>(&mut self, hw: &mut H) {
        hw.hold_step_low();
    }

    /// Issue up to `pulses` step pulses
    ///
    /// After each pulse the position is updated, the switches are sampled,
    /// the travel bounds are checked and (if interruptible) the console is
    /// peeked for pending input. Blocks for the full duration of every
    /// pulse. At speed 0 the motor is stationary: no pulse is issued and
    /// the position is left alone.
    pub fn step<H, C>(
        &mut self,
        hw: &mut H,
        console: &mut C,
        pulses: u32,
        options: StepOptions,
    ) -> Result<StepReport, MotionError>
    where
        H: StageHardware,
        C: Console,
    {
        let mut report = StepReport::default();
        let timing = self.motor.timing();
        if timing.is_idle() {
            return Ok(report);
        }

        for _ in 0..pulses {
            hw.pulse(timing);
            let position = self.motor.advance();
            let index = report.pulses;
            report.pulses += 1;

            // First pulse of each interval, so a short move still reports
            if options.trace && index % TRACE_INTERVAL_PULSES == 0 {
                console.emit(format_args!("{}", position));
            }

            if options.react_to_switches {
                if let Some(side) = self.poll_switches(hw, console) {
                    report.stopped_by = Some(side);
                    console.emit(format_args!("{}", SwitchTrip { side, position }));
                    if !options.calibrating {
                        self.clear_switch_area(hw, console, side)?;
                    }
                    break;
                }
            }

            self.motor.check_travel()?;

            if options.interruptible && console.input_pending() {
                report.aborted = true;
                break;
            }
        }

        Ok(report)
    }

    /// Sample both switches; returns the first one found pressed
    pub fn poll_switches<H, C>(&mut self, hw: &mut H, console: &mut C) -> Option<Side>
    where
        H: StageHardware,
        C: Console,
    {
        let mut pressed_side = None;
        for side in [self.min_side(), self.max_side()] {
            let pressed = hw.switch_pressed(side);
            let edge = hw.take_edge_event(side);
            if edge && !pressed {
                #[cfg(feature = "defmt")]
                defmt::debug!("{} switch edge without a press", side);
            }
            if self.switch_mut(side).record(pressed) {
                console.info(format_args!("{} side switch pressed", side));
            }
            if pressed && pressed_side.is_none() {
                pressed_side = Some(side);
            }
        }
        pressed_side
    }

    /// Back off a pressed switch by its clearing offset
    pub fn clear_switch_area<H, C>(
        &mut self,
        hw: &mut H,
        console: &mut C,
        side: Side,
    ) -> Result<(), MotionError>
    where
        H: StageHardware,
        C: Console,
    {
        let away = self.heading_away_from(side);
        if self.motor.direction() == away {
            console.warning(format_args!(
                "already moving away from the {} side switch",
                side
            ));
        }
        self.set_direction(hw, away)?;

        let pulses = self.switch(side).clearing_pulses();
        self.step(hw, console, pulses, StepOptions::CLEARING)?;
        self.clear_flag(hw, console, side)
    }

    /// Re-sample a switch after backing off; fails if it is still pressed
    pub fn clear_flag<H, C>(
        &mut self,
        hw: &mut H,
        console: &mut C,
        side: Side,
    ) -> Result<(), MotionError>
    where
        H: StageHardware,
        C: Console,
    {
        // Drop edges produced while backing off
        let _ = hw.take_edge_event(side);
        if hw.switch_pressed(side) {
            self.switch_mut(side).record(true);
            return Err(MotionError::SwitchStillPressed {
                side,
                position: self.motor.position(),
            });
        }
        self.switch_mut(side).reset_flag();
        console.info(format_args!("{} side switch cleared", side));
        Ok(())
    }

    /// Store the position where a switch closed during calibration
    ///
    /// The origin switch redefines position zero; the far switch becomes the
    /// upper travel bound.
    pub(crate) fn record_press<C: Console>(&mut self, console: &mut C, side: Side) {
        let position = self.motor.position();
        console.info(format_args!(
            "{} side switch reported at position {}",
            side, position
        ));
        if side == self.min_side() {
            self.motor.set_position(0);
            self.min_switch.set_position(0);
        } else {
            self.motor.set_max_steps(position);
            self.max_switch.set_position(position);
        }
    }

    /// Print the motor's properties
    pub fn report_details<C: Console>(&self, console: &mut C) {
        let motor = &self.motor;
        let timing = motor.timing();
        console.info(format_args!(
            "origin direction {}, direction {}",
            motor.origin_direction().code(),
            motor.direction().code()
        ));
        console.info(format_args!(
            "position {} ({:.2} mm), home {} ({:.2} mm)",
            motor.position(),
            pulses_to_mm(motor.position()),
            motor.home_position(),
            pulses_to_mm(motor.home_position())
        ));
        console.info(format_args!(
            "travel bounds {}..{} pulses",
            motor.min_steps(),
            motor.max_steps()
        ));
        console.info(format_args!(
            "speed {} mm/s, pulse high {} ns, low {} ns",
            motor.speed(),
            timing.on_ns,
            timing.off_ns
        ));
    }

    /// Print one status line per switch
    pub fn report_switches<C: Console>(&self, console: &mut C) {
        for switch in [&self.min_switch, &self.max_switch] {
            console.info(format_args!(
                "{} side switch: pressed {}, position {}, clearing {:.1} mm",
                switch.side(),
                switch.is_flagged(),
                switch.position(),
                switch.clearing_offset_mm()
            ));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::{SimConsole, SimRig};

    /// Stage calibrated to 0..1000 with the carriage physically at `at`
    fn rig(at: i32) -> (Stage, SimRig, SimConsole) {
        let mut stage = Stage::new(&StageConfig::default()).unwrap();
        stage.motor_mut().set_position(at);
        stage.motor_mut().set_max_steps(1000);
        (stage, SimRig::new(at, -10, 1010), SimConsole::default())
    }

    #[test]
    fn test_step_moves_exactly_n_when_clear() {
        let (mut stage, mut hw, mut console) = rig(500);
        stage.set_direction(&mut hw, Direction::Clockwise).unwrap();
        let report = stage
            .step(&mut hw, &mut console, 120, StepOptions::COMMAND)
            .unwrap();
        assert_eq!(report.pulses, 120);
        assert_eq!(report.stopped_by, None);
        assert_eq!(stage.motor().position(), 620);

        stage
            .set_direction(&mut hw, Direction::CounterClockwise)
            .unwrap();
        stage
            .step(&mut hw, &mut console, 20, StepOptions::COMMAND)
            .unwrap();
        assert_eq!(stage.motor().position(), 600);
        assert_eq!(hw.carriage, 600);
    }

    #[test]
    fn test_zero_speed_step_keeps_position() {
        let (mut stage, mut hw, mut console) = rig(500);
        stage.set_direction(&mut hw, Direction::CounterClockwise).unwrap();
        stage.set_speed(0).unwrap();
        let report = stage
            .step(&mut hw, &mut console, 80, StepOptions::COMMAND)
            .unwrap();
        assert_eq!(report, StepReport::default());
        assert_eq!(stage.motor().position(), 500);
        assert_eq!(hw.pulses, 0);
        assert_eq!(hw.carriage, 500);
    }

    #[test]
    fn test_switch_stops_move_and_backs_off() {
        let (mut stage, mut hw, mut console) = rig(20);
        hw.left_at = 0;
        stage
            .set_direction(&mut hw, Direction::CounterClockwise)
            .unwrap();
        let report = stage
            .step(&mut hw, &mut console, 100, StepOptions::COMMAND)
            .unwrap();

        assert_eq!(report.pulses, 20);
        assert_eq!(report.stopped_by, Some(Side::Left));
        // Backed off 5 mm, direction now points away from the switch
        assert_eq!(stage.motor().position(), 400);
        assert_eq!(stage.motor().direction(), Direction::Clockwise);
        assert!(!stage.switch(Side::Left).is_flagged());
        assert!(console.contains("TRIPPED left 0"));
        assert!(console.contains("left side switch cleared"));
    }

    #[test]
    fn test_stuck_switch_is_fatal() {
        let (mut stage, mut hw, mut console) = rig(500);
        hw.left_stuck = true;
        stage
            .set_direction(&mut hw, Direction::CounterClockwise)
            .unwrap();
        let err = stage
            .step(&mut hw, &mut console, 10, StepOptions::COMMAND)
            .unwrap_err();
        assert_eq!(
            err,
            MotionError::SwitchStillPressed {
                side: Side::Left,
                position: 899
            }
        );
    }

    #[test]
    fn test_travel_limit_is_fatal() {
        let (mut stage, mut hw, mut console) = rig(995);
        stage.set_direction(&mut hw, Direction::Clockwise).unwrap();
        let err = stage
            .step(&mut hw, &mut console, 10, StepOptions::COMMAND)
            .unwrap_err();
        assert_eq!(
            err,
            MotionError::TravelLimitExceeded {
                position: 1001,
                bound: 1000
            }
        );
    }

    #[test]
    fn test_input_aborts_between_pulses() {
        let (mut stage, mut hw, mut console) = rig(500);
        console.input_after_polls = Some(3);
        stage.set_direction(&mut hw, Direction::Clockwise).unwrap();
        let report = stage
            .step(&mut hw, &mut console, 100, StepOptions::COMMAND)
            .unwrap();
        assert!(report.aborted);
        assert_eq!(report.pulses, 4);
        assert_eq!(stage.motor().position(), 504);
    }

    #[test]
    fn test_trace_prints_every_tenth_millimetre() {
        let (mut stage, mut hw, mut console) = rig(0);
        stage.set_direction(&mut hw, Direction::Clockwise).unwrap();
        let options = StepOptions {
            trace: true,
            ..StepOptions::COMMAND
        };
        stage.step(&mut hw, &mut console, 24, options).unwrap();
        assert_eq!(console.lines, ["1", "9", "17"]);

        console.lines.clear();
        stage.step(&mut hw, &mut console, 3, options).unwrap();
        assert_eq!(console.lines, ["25"]);
    }

    #[test]
    fn test_unsafe_direction_leaves_state_unchanged() {
        let mut config = StageConfig::default();
        config.motor.min_mm = 0.0;
        let mut stage = Stage::new(&config).unwrap();
        stage.motor_mut().set_position(0);
        stage.motor_mut().set_max_steps(1000);
        let mut hw = SimRig::new(0, -10, 1010);
        stage.set_direction(&mut hw, Direction::Clockwise).unwrap();
        let writes = hw.direction_writes.len();

        let err = stage
            .set_direction(&mut hw, Direction::CounterClockwise)
            .unwrap_err();
        assert_eq!(err.class(), crate::ErrorClass::Safety);
        assert_eq!(stage.motor().direction(), Direction::Clockwise);
        assert_eq!(hw.direction_writes.len(), writes);
    }
}
