//! forcestage - Leadscrew Force Stage Controller Firmware
//!
//! Main firmware binary for the RP2040 board that drives the stage. The
//! host sends one request per line over UART0; this firmware echoes it,
//! runs it and answers with diagnostics, an optional `DONE` and the
//! `>>>` prompt.
//!
//! Two priority levels:
//!
//! - Thread mode runs the dispatch loop. Stepping is bit-banged with busy
//!   waits, so the loop never yields.
//! - An interrupt executor runs the switch edge tasks, which preempt the
//!   loop and latch every edge for the next switch poll.

#![no_std]
#![no_main]

use cortex_m_rt::entry;
use defmt::*;
use embassy_executor::InterruptExecutor;
use embassy_rp::bind_interrupts;
use embassy_rp::gpio::{Input, Level, Output};
use embassy_rp::interrupt;
use embassy_rp::interrupt::{InterruptExt, Priority};
use embassy_rp::peripherals::{PIN_18, PIN_20, UART0};
use embassy_rp::uart::{BufferedInterruptHandler, Uart};
use embassy_time::Delay;
use static_cell::StaticCell;
use {defmt_rtt as _, panic_probe as _};

use forcestage_core::config::StageConfig;
use forcestage_core::stage::Stage;
use forcestage_core::switch::Side;
use forcestage_drivers::stepper::PulseStepper;
use forcestage_drivers::switch::NcSwitch;
use forcestage_drivers::{GpioStage, UartConsole};
use forcestage_hal_rp2040::pins::SWITCH_PULL;
use forcestage_hal_rp2040::uart::{to_rp_config, RpUart};
use forcestage_hal_rp2040::{take_pin, UartConfig};

use crate::channels::{LEFT_EDGE, RIGHT_EDGE};

mod channels;
mod tasks;

bind_interrupts!(struct Irqs {
    UART0_IRQ => BufferedInterruptHandler<UART0>;
});

// Static cells for UART buffers (must live forever)
static TX_BUF: StaticCell<[u8; 256]> = StaticCell::new();
static RX_BUF: StaticCell<[u8; 256]> = StaticCell::new();

static EXECUTOR_HIGH: InterruptExecutor = InterruptExecutor::new();

#[interrupt]
unsafe fn SWI_IRQ_1() {
    EXECUTOR_HIGH.on_interrupt()
}

/// Main entry point
#[entry]
fn main() -> ! {
    info!("forcestage firmware starting...");

    // Initialize RP2040 peripherals
    let p = embassy_rp::init(Default::default());
    info!("Peripherals initialized");

    // Host link
    let tx_buf = TX_BUF.init([0u8; 256]);
    let rx_buf = RX_BUF.init([0u8; 256]);
    let uart_config = to_rp_config(&UartConfig::default()); // 115200 8N1
    let uart = Uart::new_blocking(p.UART0, p.PIN_0, p.PIN_1, uart_config);
    let uart = uart.into_buffered(Irqs, tx_buf, rx_buf);
    let console = UartConsole::new(RpUart::new(uart));
    info!("UART initialized for host link");

    // Step/direction outputs start low
    let step = Output::new(take_pin!(p, 13), Level::Low);
    let dir = Output::new(take_pin!(p, 12), Level::Low);
    let stepper = PulseStepper::new(step, dir, Delay);

    // Level inputs for the stepping loop
    let left = NcSwitch::new(Input::new(take_pin!(p, 20), SWITCH_PULL));
    let right = NcSwitch::new(Input::new(take_pin!(p, 18), SWITCH_PULL));

    let hw = GpioStage::new(stepper, left, right).with_edge_latches(&LEFT_EDGE, &RIGHT_EDGE);

    // Edge inputs on the same pads. The level inputs above are never
    // dropped, so the pads keep their configuration.
    let left_edge_pin = Input::new(unsafe { PIN_20::steal() }, SWITCH_PULL);
    let right_edge_pin = Input::new(unsafe { PIN_18::steal() }, SWITCH_PULL);

    interrupt::SWI_IRQ_1.set_priority(Priority::P2);
    let spawner = EXECUTOR_HIGH.start(interrupt::SWI_IRQ_1);
    spawner
        .spawn(tasks::switch_edge_task(left_edge_pin, &LEFT_EDGE, Side::Left))
        .unwrap();
    spawner
        .spawn(tasks::switch_edge_task(right_edge_pin, &RIGHT_EDGE, Side::Right))
        .unwrap();
    info!("Switch edge tasks spawned");

    let config = StageConfig::default();
    let stage = unwrap!(Stage::new(&config));
    info!(
        "Stage ready: position={} bounds=[{}, {}]",
        stage.motor().position(),
        stage.motor().min_steps(),
        stage.motor().max_steps()
    );

    tasks::run_dispatch_loop(stage, hw, console, config.calibration)
}
