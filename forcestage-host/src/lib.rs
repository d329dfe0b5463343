//! Host-side driver for the force stage
//!
//! Speaks the line protocol of `forcestage-protocol` to the motion
//! controller over one serial port and polls the force gauge over another.
//!
//! - [`controller::Controller`] sends one request and listens to its reply
//! - [`motion::StageClient`] builds the motion macros on top of it
//! - [`gauge::ForceGauge`] reads force values
//! - [`record::retreat_and_sample`] combines both into a sampling run

pub mod channel;
pub mod config;
pub mod controller;
pub mod error;
pub mod framing;
pub mod gauge;
pub mod motion;
pub mod record;

pub use error::{HostError, Result};
