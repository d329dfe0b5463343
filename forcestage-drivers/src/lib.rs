//! Hardware driver implementations
//!
//! This crate provides concrete implementations of the traits defined
//! in forcestage-core, written against `embedded-hal` pins and the
//! forcestage-hal UART traits:
//!
//! - Step/direction pulse driver
//! - Normally-closed limit switch input
//! - [`GpioStage`], the pin bundle the stepping loop drives
//! - [`UartConsole`], the host console over a blocking UART

#![cfg_attr(not(test), no_std)]
#![deny(unsafe_code)]

pub mod console;
pub mod stage;
pub mod stepper;
pub mod switch;

pub use console::UartConsole;
pub use stage::GpioStage;
