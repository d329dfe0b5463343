//! RP2040-specific HAL for the force stage controller
//!
//! This crate provides RP2040 implementations of the shared
//! `forcestage-hal` traits, plus the board wiring:
//!
//! - Blocking host link over a buffered UART (implements
//!   `forcestage_hal::UartTx` and `forcestage_hal::UartRx`)
//! - Pin assignment for the stage board

#![no_std]
#![deny(unsafe_code)]

pub mod pins;
pub mod uart;

// Re-export shared traits from forcestage-hal for convenience
pub use forcestage_hal::{UartConfig, UartRx, UartTx};
