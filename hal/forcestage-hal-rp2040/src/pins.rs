//! Stage board pin assignment
//!
//! | Pin   | Use                         |
//! |-------|-----------------------------|
//! | GP0   | Host link TX (UART0)        |
//! | GP1   | Host link RX (UART0)        |
//! | GP12  | Direction output            |
//! | GP13  | Step pulse output           |
//! | GP18  | Limit switch, far end       |
//! | GP20  | Limit switch, origin end    |
//!
//! [`take_pin!`](crate::take_pin) covers the step, direction and switch pins.

use embassy_rp::gpio::Pull;

/// Normally-closed switches pull the input low while released
pub const SWITCH_PULL: Pull = Pull::Up;

/// Macro to take a board pin by number from peripherals
///
/// Usage:
/// ```ignore
/// let step = take_pin!(p, 13); // Takes p.PIN_13 as Peri<AnyPin>
/// ```
#[macro_export]
macro_rules! take_pin {
    ($p:expr, 12) => { embassy_rp::Peri::<embassy_rp::gpio::AnyPin>::from($p.PIN_12) };
    ($p:expr, 13) => { embassy_rp::Peri::<embassy_rp::gpio::AnyPin>::from($p.PIN_13) };
    ($p:expr, 18) => { embassy_rp::Peri::<embassy_rp::gpio::AnyPin>::from($p.PIN_18) };
    ($p:expr, 20) => { embassy_rp::Peri::<embassy_rp::gpio::AnyPin>::from($p.PIN_20) };
}
