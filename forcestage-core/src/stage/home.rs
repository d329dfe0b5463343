//! Return to the home position
//!
//! Moves one pulse at a time toward the home position. The first switch
//! trip on the way is tolerated (the stage backs off and the heading is
//! re-issued); a second one is fatal.

use crate::error::MotionError;
use crate::traits::{Console, ConsoleExt, StageHardware};

use super::{Stage, StepOptions};

/// Outcome of a completed [`Stage::home`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct HomeReport {
    /// Pulses issued toward home (back-off pulses excluded)
    pub pulses: u32,
    /// Switch trips seen on the way
    pub trips: u8,
    /// Host input ended the move early
    pub aborted: bool,
}

impl Stage {
    /// Move to the home position at `speed`
    ///
    /// Already being at home is not an error and touches neither speed nor
    /// direction.
    pub fn home<H, C>(
        &mut self,
        hw: &mut H,
        console: &mut C,
        speed: u16,
    ) -> Result<HomeReport, MotionError>
    where
        H: StageHardware,
        C: Console,
    {
        let mut report = HomeReport::default();
        if self.motor.position() == self.motor.home_position() {
            console.info(format_args!("already at home position"));
            return Ok(report);
        }
        if self.set_speed(speed)?.is_idle() {
            console.warning(format_args!("speed 0 cannot reach the home position"));
            return Ok(report);
        }

        loop {
            let delta = self.motor.position() - self.motor.home_position();
            if delta == 0 {
                break;
            }
            let toward_home = if delta < 0 {
                self.motor.positive_direction()
            } else {
                self.motor.origin_direction()
            };
            if self.motor.direction() != toward_home {
                self.set_direction(hw, toward_home)?;
            }

            let step = self.step(hw, console, 1, StepOptions::COMMAND)?;
            report.pulses += step.pulses;
            if let Some(side) = step.stopped_by {
                report.trips += 1;
                if report.trips > 1 {
                    return Err(MotionError::RepeatedSwitchTrigger {
                        side,
                        position: self.motor.position(),
                    });
                }
            }
            if step.aborted {
                report.aborted = true;
                break;
            }
        }

        console.info(format_args!(
            "homed to position {} in {} pulses",
            self.motor.position(),
            report.pulses
        ));
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use crate::config::StageConfig;
    use crate::error::MotionError;
    use crate::motion::Direction;
    use crate::sim::{SimConsole, SimRig};
    use crate::stage::Stage;
    use crate::switch::Side;

    fn stage_at(position: i32) -> Stage {
        let mut stage = Stage::new(&StageConfig::default()).unwrap();
        stage.motor_mut().set_position(position);
        stage
    }

    #[test]
    fn test_home_from_above() {
        let mut stage = stage_at(8_100);
        let mut hw = SimRig::new(8_100, -10, 90_000);
        let mut console = SimConsole::default();
        let report = stage.home(&mut hw, &mut console, 10).unwrap();
        assert_eq!(report.pulses, 100);
        assert_eq!(report.trips, 0);
        assert_eq!(stage.motor().position(), 8_000);
        assert_eq!(stage.motor().direction(), Direction::CounterClockwise);
    }

    #[test]
    fn test_home_from_below() {
        let mut stage = stage_at(7_950);
        let mut hw = SimRig::new(7_950, -10, 90_000);
        let mut console = SimConsole::default();
        stage.home(&mut hw, &mut console, 10).unwrap();
        assert_eq!(stage.motor().position(), 8_000);
        assert_eq!(stage.motor().direction(), Direction::Clockwise);
    }

    #[test]
    fn test_zero_delta_does_nothing() {
        let mut stage = stage_at(8_000);
        let mut hw = SimRig::new(8_000, -10, 90_000);
        let mut console = SimConsole::default();
        let speed_before = stage.motor().speed();
        let report = stage.home(&mut hw, &mut console, 6).unwrap();
        assert_eq!(report.pulses, 0);
        assert!(hw.direction_writes.is_empty());
        assert_eq!(stage.motor().speed(), speed_before);
        assert!(console.contains("already at home"));
    }

    #[test]
    fn test_zero_speed_returns_without_moving() {
        let mut stage = stage_at(8_100);
        let mut hw = SimRig::new(8_100, -10, 90_000);
        let mut console = SimConsole::default();
        let report = stage.home(&mut hw, &mut console, 0).unwrap();
        assert_eq!(report.pulses, 0);
        assert_eq!(hw.pulses, 0);
        assert_eq!(stage.motor().position(), 8_100);
        assert!(console.contains("WARNING: speed 0 cannot reach"));
    }

    #[test]
    fn test_single_trip_is_tolerated() {
        let mut stage = stage_at(8_100);
        let mut hw = SimRig::new(8_100, -10, 90_000);
        hw.spurious_press = Some((Side::Right, 10));
        let mut console = SimConsole::default();
        let report = stage.home(&mut hw, &mut console, 10).unwrap();
        // 10 pulses, 400 pulses of back-off, then 310 pulses back to home
        assert_eq!(report.trips, 1);
        assert_eq!(report.pulses, 320);
        assert_eq!(stage.motor().position(), 8_000);
        assert!(console.contains("already moving away from the right side switch"));
    }

    #[test]
    fn test_second_trip_is_fatal() {
        // The far switch sits between the carriage and home
        let mut stage = stage_at(7_900);
        let mut hw = SimRig::new(7_900, -10, 7_950);
        let mut console = SimConsole::default();
        let result = stage.home(&mut hw, &mut console, 10);
        // Second trip at 7950, backed off 400 pulses before reporting
        assert_eq!(
            result,
            Err(MotionError::RepeatedSwitchTrigger {
                side: Side::Right,
                position: 7_550
            })
        );
    }
}
