//! Force Stage Hardware Abstraction Layer
//!
//! This crate defines the serial abstraction the controller's host link is
//! written against. Chip-specific HALs implement it; pins go through the
//! `embedded-hal` traits directly.
//!
//! # Architecture
//!
//! ```text
//! ┌───────────────────────────────────────────┐
//! │  forcestage-firmware / forcestage-drivers │
//! └───────────────────────────────────────────┘
//!                      │
//!                      ▼
//! ┌───────────────────────────────────────────┐
//! │  forcestage-hal (this crate - traits)     │
//! └───────────────────────────────────────────┘
//!                      │
//!                      ▼
//!             ┌─────────────────┐
//!             │ forcestage-hal- │
//!             │     rp2040      │
//!             └─────────────────┘
//! ```
//!
//! # Traits
//!
//! - [`uart::UartTx`], [`uart::UartRx`] - Serial communication

#![no_std]
#![deny(unsafe_code)]

pub mod uart;

// Re-export key traits at crate root for convenience
pub use uart::{Uart, UartConfig, UartRx, UartTx};
