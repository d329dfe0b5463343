//! Board-agnostic core logic for the force stage controller
//!
//! This crate contains all controller logic that does not depend on
//! specific hardware implementations:
//!
//! - Hardware abstraction traits (stage pins, host console)
//! - Unit conversion and pulse timing
//! - Directional safety gate and travel limits
//! - Limit switch monitoring
//! - The [`stage::Stage`] context and its motion operations
//! - Limit switch calibration state machine
//! - Request dispatcher for the host link
//! - Configuration type definitions

#![cfg_attr(not(test), no_std)]
#![deny(unsafe_code)]

pub mod calibration;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod motion;
pub mod safety;
pub mod stage;
pub mod switch;
pub mod traits;

#[cfg(test)]
pub(crate) mod sim;

pub use error::{ErrorClass, MotionError};
