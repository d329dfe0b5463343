//! Limit switch calibration
//!
//! Finds both ends of the axis. Each switch goes through the same phases:
//!
//! ```text
//! ApproachFast ─► ApproachSlow ─► FirstPress ─► Backoff ─► ApproachSecond
//!                                                  ▲              │
//!                                                  │              ▼
//!                                   BoundSet ◄─────┴──────── SecondPress
//! ```
//!
//! The origin switch is found first (slow approach only) and redefines
//! position zero. The far switch is found next, with a fast traverse over
//! the first fifth of the travel, and becomes the upper travel bound. The
//! first press of each switch is provisional; the second, slower approach
//! sets the final value.

mod machine;

pub use machine::{CalibrationPhase, SwitchCalibration};

use crate::config::CalibrationSpeeds;
use crate::error::MotionError;
use crate::motion::PulseTiming;
use crate::stage::Stage;
use crate::traits::{Console, ConsoleExt, StageHardware};

/// Bounds found by a completed calibration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct CalibrationReport {
    /// Upper travel bound in pulses
    pub max_steps: i32,
    /// Position after the final back-off
    pub position: i32,
}

/// Calibrate both switches, origin end first
pub fn calibrate<H, C>(
    stage: &mut Stage,
    hw: &mut H,
    console: &mut C,
    speeds: CalibrationSpeeds,
) -> Result<CalibrationReport, MotionError>
where
    H: StageHardware,
    C: Console,
{
    PulseTiming::for_speed(speeds.press_speed)?;
    PulseTiming::for_speed(speeds.travel_speed)?;

    for (side, move_fast) in [(stage.min_side(), false), (stage.max_side(), true)] {
        let mut machine = SwitchCalibration::new(stage, side, move_fast);
        while machine.advance(stage, hw, console, speeds)? != CalibrationPhase::BoundSet {}
        console.info(format_args!(
            "{} side switch calibrated at position {}",
            side,
            stage.switch(side).position()
        ));
    }

    Ok(CalibrationReport {
        max_steps: stage.motor().max_steps(),
        position: stage.motor().position(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::StageConfig;
    use crate::sim::{SimConsole, SimRig};
    use crate::switch::Side;

    #[test]
    fn test_full_calibration_from_guess() {
        // Motor believes it is at 80000; the carriage is really at 40000
        let mut stage = Stage::new(&StageConfig::default()).unwrap();
        let mut hw = SimRig::new(40_000, 0, 64_000);
        let mut console = SimConsole::default();

        let report =
            calibrate(&mut stage, &mut hw, &mut console, CalibrationSpeeds::default()).unwrap();

        assert_eq!(report.max_steps, 64_000);
        assert_eq!(report.position, 63_600);
        assert_eq!(stage.switch(Side::Left).position(), 0);
        assert_eq!(stage.switch(Side::Right).position(), 64_000);
        // Position estimate now agrees with the carriage
        assert_eq!(stage.motor().position(), hw.carriage);
        assert!(console.contains("right side switch calibrated at position 64000"));
    }

    #[test]
    fn test_unsupported_speed_fails_before_moving() {
        let mut stage = Stage::new(&StageConfig::default()).unwrap();
        let mut hw = SimRig::new(40_000, 0, 64_000);
        let mut console = SimConsole::default();
        let speeds = CalibrationSpeeds {
            press_speed: 2,
            travel_speed: 10,
        };

        assert_eq!(
            calibrate(&mut stage, &mut hw, &mut console, speeds),
            Err(MotionError::UnsupportedSpeed { speed: 2 })
        );
        assert_eq!(hw.pulses, 0);
    }

    #[test]
    fn test_switch_not_found_within_budget() {
        let mut stage = Stage::new(&StageConfig::default()).unwrap();
        stage.motor_mut().set_position(1_000);
        stage.motor_mut().set_max_steps(1_000);
        let mut hw = SimRig::new(5_000, 0, 64_000);
        let mut console = SimConsole::default();

        assert_eq!(
            calibrate(&mut stage, &mut hw, &mut console, CalibrationSpeeds::default()),
            Err(MotionError::LimitSwitchNotFound {
                side: Side::Left,
                position: 0
            })
        );
        assert_eq!(hw.pulses, 1_000);
    }

    #[test]
    fn test_host_input_aborts_calibration() {
        let mut stage = Stage::new(&StageConfig::default()).unwrap();
        let mut hw = SimRig::new(40_000, 0, 64_000);
        let mut console = SimConsole {
            input_after_polls: Some(5),
            ..SimConsole::default()
        };

        assert!(matches!(
            calibrate(&mut stage, &mut hw, &mut console, CalibrationSpeeds::default()),
            Err(MotionError::CalibrationAborted {
                side: Side::Left,
                ..
            })
        ));
        assert_eq!(hw.pulses, 6);
    }
}
