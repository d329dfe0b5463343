//! Motion macros
//!
//! Each macro is one or two requests to the controller. Distances are in
//! pulses; [`pulses_for_mm`] converts. "Forward" moves away from the
//! origin, "backward" toward it.

use forcestage_core::motion::mm_to_pulses;
use forcestage_protocol::{parse_position, ArithOp, DirectionArg, Request, StepFlags};
use tracing::{info, warn};

use crate::channel::LineChannel;
use crate::config::MotionConfig;
use crate::controller::{CommandExchange, Controller};
use crate::error::{HostError, Result};
use crate::framing::{EchoFraming, RequestFraming};

/// Returned by [`StageClient::quick_listen`] when the line is not a position
pub const INVALID_POSITION: i32 = -99;

/// Pulses covering `mm` of travel
pub fn pulses_for_mm(mm: f32) -> u32 {
    mm_to_pulses(mm).unsigned_abs()
}

/// Outcome of a host-driven [`StageClient::home`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HomeOutcome {
    /// Single-pulse requests issued
    pub pulses: u32,
    /// Switch trips seen on the way
    pub trips: u8,
}

/// Motion controller seen through its request macros
pub struct StageClient<C, F = EchoFraming> {
    controller: Controller<C, F>,
    speeds: MotionConfig,
    verbose: bool,
}

impl<C: LineChannel, F: RequestFraming> StageClient<C, F> {
    pub fn new(controller: Controller<C, F>, speeds: MotionConfig, verbose: bool) -> Self {
        Self {
            controller,
            speeds,
            verbose,
        }
    }

    pub fn controller_mut(&mut self) -> &mut Controller<C, F> {
        &mut self.controller
    }

    pub fn speeds(&self) -> MotionConfig {
        self.speeds
    }

    fn talk(&mut self, request: Request, wait: bool) -> Result<CommandExchange> {
        self.controller
            .exchange(&request.to_string(), wait, self.verbose)
    }

    /// Arithmetic round trip to check the link
    pub fn probe(&mut self, lhs: i32, op: ArithOp, rhs: i32) -> Result<CommandExchange> {
        self.talk(Request::Probe { lhs, op, rhs }, false)
    }

    /// Find both limit switches and reset the travel bounds
    pub fn calibrate(&mut self, press_speed: u16, travel_speed: u16, wait: bool) -> Result<usize> {
        let request = Request::Calibrate {
            press_speed: Some(press_speed),
            travel_speed: Some(travel_speed),
        };
        Ok(self.talk(request, wait)?.count())
    }

    /// Hold the step output low
    pub fn stop_motor(&mut self, wait: bool) -> Result<usize> {
        Ok(self.talk(Request::NoStep { done: wait }, wait)?.count())
    }

    pub fn move_forward_distance(&mut self, pulses: u32, wait: bool) -> Result<usize> {
        self.set_direction(DirectionArg::AwayFromOrigin)?;
        self.step(pulses, wait)
    }

    pub fn move_backward_distance(&mut self, pulses: u32, wait: bool) -> Result<usize> {
        self.set_direction(DirectionArg::Origin)?;
        self.step(pulses, wait)
    }

    pub fn move_forward_velocity(&mut self, pulses: u32, speed: u16, wait: bool) -> Result<usize> {
        self.set_velocity(DirectionArg::AwayFromOrigin, speed)?;
        self.step(pulses, wait)
    }

    pub fn move_backward_velocity(&mut self, pulses: u32, speed: u16, wait: bool) -> Result<usize> {
        self.set_velocity(DirectionArg::Origin, speed)?;
        self.step(pulses, wait)
    }

    pub fn single_step(&mut self, wait: bool) -> Result<usize> {
        self.step(1, wait)
    }

    fn set_direction(&mut self, direction: DirectionArg) -> Result<CommandExchange> {
        self.talk(
            Request::SetDirection {
                direction,
                done: false,
            },
            false,
        )
    }

    fn set_velocity(&mut self, direction: DirectionArg, speed: u16) -> Result<CommandExchange> {
        self.talk(
            Request::SetVelocity {
                direction,
                speed,
                done: false,
            },
            false,
        )
    }

    fn step(&mut self, pulses: u32, wait: bool) -> Result<usize> {
        let flags = StepFlags {
            done: wait,
            ..StepFlags::default()
        };
        Ok(self.talk(Request::Step { pulses, flags }, wait)?.count())
    }

    /// Current position in pulses
    pub fn read_position(&mut self) -> Result<i32> {
        self.read_value(Request::Position)
    }

    pub fn read_home_position(&mut self) -> Result<i32> {
        self.read_value(Request::HomePosition)
    }

    fn read_value(&mut self, request: Request) -> Result<i32> {
        let exchange = self.talk(request, false)?;
        exchange.value().ok_or_else(|| HostError::InvalidReply {
            request: exchange.request.clone(),
            reply: exchange.diagnostics.join(" | "),
        })
    }

    /// Walk to the home position one pulse per request
    ///
    /// The first switch trip on the way is tolerated (the controller backs
    /// off on its own and the heading is re-issued); a second is fatal.
    pub fn home(&mut self, speed: u16) -> Result<HomeOutcome> {
        let mut outcome = HomeOutcome::default();
        let mut position = self.read_position()?;
        let home = self.read_home_position()?;
        if position == home {
            info!("Already at home position {}", home);
            return Ok(outcome);
        }
        if speed == 0 {
            warn!("Speed 0 cannot reach home position {} from {}", home, position);
            return Ok(outcome);
        }
        self.head_toward(position, home, speed)?;

        while position != home {
            let exchange = self.talk(
                Request::Step {
                    pulses: 1,
                    flags: StepFlags::default(),
                },
                false,
            )?;
            outcome.pulses += 1;
            position = self.read_position()?;

            if let Some(trip) = exchange.switch_trips().next() {
                outcome.trips += 1;
                if outcome.trips > 1 {
                    return Err(HostError::RepeatedSwitchTrigger {
                        side: trip.side,
                        position,
                    });
                }
                warn!(
                    "{} side switch tripped at {} while homing, re-issuing heading",
                    trip.side, trip.position
                );
                self.head_toward(position, home, speed)?;
            };
        }

        info!(
            "Homed to {} in {} pulses ({} trips)",
            position, outcome.pulses, outcome.trips
        );
        Ok(outcome)
    }

    /// Let the controller home itself with the same algorithm
    pub fn device_home(&mut self, speed: u16, wait: bool) -> Result<usize> {
        Ok(self.talk(Request::Home { speed, done: wait }, wait)?.count())
    }

    fn head_toward(&mut self, position: i32, home: i32, speed: u16) -> Result<()> {
        let direction = if position > home {
            DirectionArg::Origin
        } else {
            DirectionArg::AwayFromOrigin
        };
        self.set_velocity(direction, speed)?;
        Ok(())
    }

    /// Start a traced move away from the origin without listening
    ///
    /// Position lines are read afterwards with [`quick_listen`](Self::quick_listen).
    pub fn quick_forward(&mut self, pulses: u32) -> Result<()> {
        self.quick_move(DirectionArg::AwayFromOrigin, pulses)
    }

    /// Start a traced move toward the origin without listening
    pub fn quick_backward(&mut self, pulses: u32) -> Result<()> {
        self.quick_move(DirectionArg::Origin, pulses)
    }

    fn quick_move(&mut self, direction: DirectionArg, pulses: u32) -> Result<()> {
        let set_direction = Request::SetDirection {
            direction,
            done: false,
        };
        let step = Request::Step {
            pulses,
            flags: StepFlags {
                trace: true,
                ..StepFlags::default()
            },
        };
        self.controller.send(&set_direction.to_string())?;
        self.controller.send(&step.to_string())?;
        Ok(())
    }

    /// Read one line and parse it as a position
    pub fn quick_listen(&mut self) -> Result<i32> {
        let line = self.controller.receive()?;
        Ok(parse_position(&line).unwrap_or(INVALID_POSITION))
    }
}
