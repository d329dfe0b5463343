//! Pulse timing engine
//!
//! Each permitted speed has a tuned duty fraction. The step pulse is held
//! high for `period × duty` and low for the rest of the period, with the
//! low phase never shorter than [`MIN_OFF_TIME_NS`].

use crate::error::MotionError;

/// Shortest low phase the driver tolerates between pulses
pub const MIN_OFF_TIME_NS: u32 = 1_000_000;

/// Permitted speeds (mm/s) and their duty fraction in per-mille
pub const DUTY_TABLE: [(u16, u16); 7] = [
    (10, 150),
    (9, 150),
    (8, 350),
    (7, 400),
    (6, 400),
    (5, 300),
    (0, 0),
];

const NS_PER_S: u32 = 1_000_000_000;

/// Look up the duty fraction (per-mille) for a speed
pub fn duty_per_mille(speed: u16) -> Option<u16> {
    DUTY_TABLE
        .iter()
        .find(|(s, _)| *s == speed)
        .map(|(_, duty)| *duty)
}

/// High and low phase of one step pulse
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PulseTiming {
    /// Step output high time
    pub on_ns: u32,
    /// Step output low time
    pub off_ns: u32,
}

impl PulseTiming {
    /// No motion
    pub const IDLE: Self = Self { on_ns: 0, off_ns: 0 };

    /// Timing for a speed from the duty table
    pub fn for_speed(speed: u16) -> Result<Self, MotionError> {
        let duty = duty_per_mille(speed).ok_or(MotionError::UnsupportedSpeed { speed })?;
        Self::compute(speed, duty)
    }

    /// Timing for an arbitrary speed and duty fraction
    ///
    /// Pulse frequency equals the speed in pulses per second.
    pub fn compute(speed: u16, duty_per_mille: u16) -> Result<Self, MotionError> {
        if speed == 0 {
            return Ok(Self::IDLE);
        }

        let frequency = u32::from(speed) * super::units::PULSES_PER_MM as u32;
        let period_ns = NS_PER_S / frequency;
        let on_ns = (u64::from(period_ns) * u64::from(duty_per_mille) / 1000) as u32;
        let off_ns = period_ns.saturating_sub(on_ns);

        if off_ns > 0 && off_ns < MIN_OFF_TIME_NS {
            return Err(MotionError::MinOffTimeViolation { speed, off_ns });
        }
        if on_ns > off_ns {
            return Err(MotionError::DutyCycleViolation {
                speed,
                on_ns,
                off_ns,
            });
        }
        Ok(Self { on_ns, off_ns })
    }

    /// Full period of one pulse
    pub fn period_ns(&self) -> u32 {
        self.on_ns + self.off_ns
    }

    pub fn is_idle(&self) -> bool {
        self.period_ns() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_every_table_speed_is_valid() {
        for (speed, _) in DUTY_TABLE {
            let timing = PulseTiming::for_speed(speed).unwrap();
            assert!(timing.on_ns <= timing.off_ns, "speed {}", speed);
            if speed != 0 {
                assert!(timing.off_ns >= MIN_OFF_TIME_NS, "speed {}", speed);
            }
        }
    }

    #[test]
    fn test_top_speed_timing() {
        // 800 pulses/s -> 1.25 ms period, 15 % high
        let timing = PulseTiming::for_speed(10).unwrap();
        assert_eq!(timing.on_ns, 187_500);
        assert_eq!(timing.off_ns, 1_062_500);
    }

    #[test]
    fn test_zero_speed_is_idle() {
        assert!(PulseTiming::for_speed(0).unwrap().is_idle());
    }

    #[test]
    fn test_unsupported_speed() {
        assert_eq!(
            PulseTiming::for_speed(4),
            Err(MotionError::UnsupportedSpeed { speed: 4 })
        );
    }

    #[test]
    fn test_duty_cycle_violation() {
        // 2.5 ms period at 60 % high leaves exactly the minimum low time
        assert!(matches!(
            PulseTiming::compute(5, 600),
            Err(MotionError::DutyCycleViolation { .. })
        ));
    }

    #[test]
    fn test_min_off_time_violation() {
        assert!(matches!(
            PulseTiming::compute(12, 150),
            Err(MotionError::MinOffTimeViolation { speed: 12, .. })
        ));
    }

    proptest! {
        #[test]
        fn accepted_timings_respect_constraints(speed in 1u16..200, duty in 0u16..1000) {
            if let Ok(timing) = PulseTiming::compute(speed, duty) {
                prop_assert!(timing.on_ns <= timing.off_ns);
                prop_assert!(timing.off_ns >= MIN_OFF_TIME_NS);
            }
        }
    }
}
