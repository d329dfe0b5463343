//! Per-switch calibration state machine

use crate::config::CalibrationSpeeds;
use crate::error::MotionError;
use crate::motion::Direction;
use crate::stage::{Stage, StepOptions, StepReport};
use crate::switch::Side;
use crate::traits::{Console, StageHardware};

/// Calibration phase of one switch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum CalibrationPhase {
    /// Traverse at travel speed (skipped when not moving fast)
    ApproachFast,
    /// Approach at press speed with the rest of the budget
    ApproachSlow,
    /// Switch closed for the first time
    FirstPress,
    /// Backing off the switch
    Backoff,
    /// Slow approach over twice the clearing offset
    ApproachSecond,
    /// Switch closed for the second time
    SecondPress,
    /// Done
    BoundSet,
}

/// Drives one switch through its calibration phases
#[derive(Debug, Clone)]
pub struct SwitchCalibration {
    side: Side,
    heading: Direction,
    move_fast: bool,
    phase: CalibrationPhase,
    remaining: u32,
    second_pass: bool,
}

impl SwitchCalibration {
    pub fn new(stage: &Stage, side: Side, move_fast: bool) -> Self {
        Self {
            side,
            heading: stage.heading_toward(side),
            move_fast,
            phase: CalibrationPhase::ApproachFast,
            remaining: 0,
            second_pass: false,
        }
    }

    pub fn side(&self) -> Side {
        self.side
    }

    pub fn phase(&self) -> CalibrationPhase {
        self.phase
    }

    /// Run the current phase and move to the next one
    ///
    /// Returns the new phase. Calling it again after `BoundSet` does nothing.
    pub fn advance<H, C>(
        &mut self,
        stage: &mut Stage,
        hw: &mut H,
        console: &mut C,
        speeds: CalibrationSpeeds,
    ) -> Result<CalibrationPhase, MotionError>
    where
        H: StageHardware,
        C: Console,
    {
        self.phase = match self.phase {
            CalibrationPhase::ApproachFast => {
                let budget = stage.motor().max_steps().max(0) as u32;
                let fast = if self.move_fast { budget / 5 } else { 0 };
                stage.set_direction(hw, self.heading)?;

                let mut moved = 0;
                let mut pressed = false;
                if fast > 0 {
                    stage.set_speed(speeds.travel_speed)?;
                    let report = stage.step(hw, console, fast, StepOptions::CALIBRATION)?;
                    self.check_not_aborted(stage, &report)?;
                    if let Some(side) = report.stopped_by {
                        self.check_side(stage, side)?;
                        pressed = true;
                    }
                    moved = report.pulses;
                }
                self.remaining = budget.saturating_sub(moved);

                if pressed {
                    CalibrationPhase::FirstPress
                } else {
                    CalibrationPhase::ApproachSlow
                }
            }
            CalibrationPhase::ApproachSlow => {
                stage.set_speed(speeds.press_speed)?;
                let report = stage.step(hw, console, self.remaining, StepOptions::CALIBRATION)?;
                self.expect_press(stage, &report)?;
                CalibrationPhase::FirstPress
            }
            CalibrationPhase::FirstPress | CalibrationPhase::SecondPress => {
                stage.record_press(console, self.side);
                CalibrationPhase::Backoff
            }
            CalibrationPhase::Backoff => {
                stage.clear_switch_area(hw, console, self.side)?;
                if self.second_pass {
                    CalibrationPhase::BoundSet
                } else {
                    self.second_pass = true;
                    CalibrationPhase::ApproachSecond
                }
            }
            CalibrationPhase::ApproachSecond => {
                stage.set_direction(hw, self.heading)?;
                stage.set_speed(speeds.press_speed)?;
                let pulses = 2 * stage.switch(self.side).clearing_pulses();
                let report = stage.step(hw, console, pulses, StepOptions::CALIBRATION)?;
                self.expect_press(stage, &report)?;
                CalibrationPhase::SecondPress
            }
            CalibrationPhase::BoundSet => CalibrationPhase::BoundSet,
        };
        Ok(self.phase)
    }

    fn check_not_aborted(&self, stage: &Stage, report: &StepReport) -> Result<(), MotionError> {
        if report.aborted {
            return Err(MotionError::CalibrationAborted {
                side: self.side,
                position: stage.motor().position(),
            });
        }
        Ok(())
    }

    /// The wrong switch closing means the switch we want was never reached
    fn check_side(&self, stage: &Stage, pressed: Side) -> Result<(), MotionError> {
        if pressed != self.side {
            return Err(MotionError::LimitSwitchNotFound {
                side: self.side,
                position: stage.motor().position(),
            });
        }
        Ok(())
    }

    fn expect_press(&self, stage: &Stage, report: &StepReport) -> Result<(), MotionError> {
        self.check_not_aborted(stage, report)?;
        match report.stopped_by {
            Some(side) => self.check_side(stage, side),
            None => Err(MotionError::LimitSwitchNotFound {
                side: self.side,
                position: stage.motor().position(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::StageConfig;
    use crate::sim::{SimConsole, SimRig};

    fn run_until<H: StageHardware, C: Console>(
        machine: &mut SwitchCalibration,
        stage: &mut Stage,
        hw: &mut H,
        console: &mut C,
        phase: CalibrationPhase,
    ) {
        while machine.phase() != phase {
            machine
                .advance(stage, hw, console, CalibrationSpeeds::default())
                .unwrap();
        }
    }

    #[test]
    fn test_origin_switch_skips_fast_phase() {
        let mut stage = Stage::new(&StageConfig::default()).unwrap();
        stage.motor_mut().set_position(100);
        let mut hw = SimRig::new(100, 0, 64_000);
        let mut console = SimConsole::default();
        let mut machine = SwitchCalibration::new(&stage, Side::Left, false);

        let phase = machine
            .advance(&mut stage, &mut hw, &mut console, CalibrationSpeeds::default())
            .unwrap();
        assert_eq!(phase, CalibrationPhase::ApproachSlow);
        assert_eq!(hw.pulses, 0);
        assert_eq!(stage.motor().speed(), 10);
    }

    #[test]
    fn test_backoff_after_origin_press() {
        let mut stage = Stage::new(&StageConfig::default()).unwrap();
        stage.motor_mut().set_position(100);
        let mut hw = SimRig::new(100, 0, 64_000);
        let mut console = SimConsole::default();
        let mut machine = SwitchCalibration::new(&stage, Side::Left, false);

        run_until(
            &mut machine,
            &mut stage,
            &mut hw,
            &mut console,
            CalibrationPhase::Backoff,
        );
        // Press recorded as the new origin
        assert_eq!(stage.motor().position(), 0);
        assert_eq!(stage.motor().speed(), 6);

        let before = hw.pulses;
        machine
            .advance(&mut stage, &mut hw, &mut console, CalibrationSpeeds::default())
            .unwrap();
        assert_eq!(machine.phase(), CalibrationPhase::ApproachSecond);
        assert_eq!(hw.pulses - before, 400);
        assert_eq!(hw.direction, Direction::Clockwise);
        assert_eq!(stage.motor().position(), 400);
    }

    #[test]
    fn test_far_switch_first_press_is_provisional() {
        let mut stage = Stage::new(&StageConfig::default()).unwrap();
        stage.motor_mut().set_position(400);
        let mut hw = SimRig::new(400, 0, 10_000);
        let mut console = SimConsole::default();
        let mut machine = SwitchCalibration::new(&stage, Side::Right, true);

        // Fast traverse covers 16000 pulses, so the press happens there
        let phase = machine
            .advance(&mut stage, &mut hw, &mut console, CalibrationSpeeds::default())
            .unwrap();
        assert_eq!(phase, CalibrationPhase::FirstPress);
        assert_eq!(stage.motor().speed(), 10);

        run_until(
            &mut machine,
            &mut stage,
            &mut hw,
            &mut console,
            CalibrationPhase::ApproachSecond,
        );
        assert_eq!(stage.motor().max_steps(), 10_000);
        assert_eq!(stage.motor().position(), 9_600);

        run_until(
            &mut machine,
            &mut stage,
            &mut hw,
            &mut console,
            CalibrationPhase::BoundSet,
        );
        assert_eq!(stage.switch(Side::Right).position(), 10_000);
    }

    #[test]
    fn test_wrong_switch_is_not_found() {
        let mut stage = Stage::new(&StageConfig::default()).unwrap();
        stage.motor_mut().set_position(100);
        // Direction wiring reversed: heading for the left switch hits the right
        let mut hw = SimRig::new(100, -50_000, 0);
        hw.origin = Direction::Clockwise;
        let mut console = SimConsole::default();
        let mut machine = SwitchCalibration::new(&stage, Side::Left, false);

        machine
            .advance(&mut stage, &mut hw, &mut console, CalibrationSpeeds::default())
            .unwrap();
        let err = machine
            .advance(&mut stage, &mut hw, &mut console, CalibrationSpeeds::default())
            .unwrap_err();
        assert!(matches!(
            err,
            MotionError::LimitSwitchNotFound {
                side: Side::Left,
                ..
            }
        ));
    }
}
