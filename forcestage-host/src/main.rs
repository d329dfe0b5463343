//! forcestage - command line driver for the force stage
//!
//! Every subcommand opens the ports it needs, runs one macro and prints its
//! result. Settings come from a TOML file (see [`HostConfig`]).

use std::error::Error;
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use forcestage_host::channel::SerialChannel;
use forcestage_host::config::HostConfig;
use forcestage_host::controller::Controller;
use forcestage_host::gauge::ForceGauge;
use forcestage_host::motion::{pulses_for_mm, StageClient};
use forcestage_host::record::{retreat_and_sample, SamplingParams};
use forcestage_protocol::ArithOp;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "forcestage", version, about = "Drive the force stage controller and gauge")]
struct Cli {
    /// Configuration file
    #[arg(short, long, default_value = "forcestage.toml")]
    config: PathBuf,

    /// Log every controller message and debug output
    #[arg(short, long)]
    verbose: bool,

    /// Override the controller serial port
    #[arg(long)]
    port: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Check the link with an arithmetic round trip
    Probe {
        #[arg(default_value_t = 2)]
        lhs: i32,
        #[arg(default_value_t = 2)]
        rhs: i32,
    },
    /// Find both limit switches
    Calibrate {
        /// Approach speed in mm/s
        #[arg(long)]
        press: Option<u16>,
        /// Traverse speed in mm/s
        #[arg(long)]
        travel: Option<u16>,
        #[arg(long)]
        wait: bool,
    },
    /// Move away from the origin
    Forward {
        mm: f32,
        /// Speed in mm/s; keeps the current speed when omitted
        #[arg(long)]
        speed: Option<u16>,
        #[arg(long)]
        wait: bool,
    },
    /// Move toward the origin
    Backward {
        mm: f32,
        #[arg(long)]
        speed: Option<u16>,
        #[arg(long)]
        wait: bool,
    },
    /// Issue a single pulse
    Step {
        #[arg(long)]
        wait: bool,
    },
    /// Return to the home position
    Home {
        #[arg(long)]
        speed: Option<u16>,
        /// Let the controller home itself instead of stepping from here
        #[arg(long)]
        device: bool,
    },
    /// Print the current position in pulses
    Position,
    /// Hold the step output low
    Stop,
    /// Print force readings
    Gauge {
        #[arg(default_value_t = 1)]
        count: usize,
    },
    /// Retreat while recording force and position
    Retreat {
        /// Distance in mm; defaults to the sampling config
        #[arg(long)]
        mm: Option<f32>,
    },
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();

    let level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level)))
        .init();

    let mut config = HostConfig::load(&cli.config)?;
    if let Some(port) = cli.port {
        config.controller.port = port;
    }
    let verbose = cli.verbose || config.exchange.verbose;

    match cli.command {
        Command::Gauge { count } => print_readings(&config, count),
        command => run_stage_command(command, &config, verbose),
    }
}

/// Run a subcommand that talks to the controller
fn run_stage_command(
    command: Command,
    config: &HostConfig,
    verbose: bool,
) -> Result<(), Box<dyn Error>> {
    info!(
        "Connecting to controller on {} at {} baud",
        config.controller.port, config.controller.baud
    );
    let controller = Controller::new(SerialChannel::open(&config.controller)?)
        .with_completion_timeout(config.exchange.completion_timeout());
    let mut stage = StageClient::new(controller, config.motion, verbose);
    let speeds = config.motion;

    match command {
        Command::Probe { lhs, rhs } => {
            let exchange = stage.probe(lhs, ArithOp::Add, rhs)?;
            println!("{} messages: {}", exchange.count(), exchange.diagnostics.join(", "));
        }
        Command::Calibrate {
            press,
            travel,
            wait,
        } => {
            let press = press.unwrap_or(speeds.press_speed);
            let travel = travel.unwrap_or(speeds.travel_speed);
            println!("{} messages", stage.calibrate(press, travel, wait)?);
        }
        Command::Forward { mm, speed, wait } => {
            let pulses = pulses_for_mm(mm);
            let count = match speed {
                Some(speed) => stage.move_forward_velocity(pulses, speed, wait)?,
                None => stage.move_forward_distance(pulses, wait)?,
            };
            println!("{} messages", count);
        }
        Command::Backward { mm, speed, wait } => {
            let pulses = pulses_for_mm(mm);
            let count = match speed {
                Some(speed) => stage.move_backward_velocity(pulses, speed, wait)?,
                None => stage.move_backward_distance(pulses, wait)?,
            };
            println!("{} messages", count);
        }
        Command::Step { wait } => println!("{} messages", stage.single_step(wait)?),
        Command::Home { speed, device } => {
            let speed = speed.unwrap_or(speeds.homing_speed);
            if device {
                println!("{} messages", stage.device_home(speed, true)?);
            } else {
                let outcome = stage.home(speed)?;
                println!("{} pulses, {} switch trips", outcome.pulses, outcome.trips);
            }
        }
        Command::Position => println!("{}", stage.read_position()?),
        Command::Stop => println!("{} messages", stage.stop_motor(false)?),
        Command::Retreat { mm } => {
            let mut gauge = open_gauge(config)?;
            let mut params = SamplingParams::from(&config.sampling);
            if let Some(mm) = mm {
                params.travel_pulses = pulses_for_mm(mm);
            }
            let (record, summary) = retreat_and_sample(&mut stage, &mut gauge, &params)?;
            for ((t, force), (_, position)) in record.force.iter().zip(&record.position) {
                println!("{:.3}\t{}\t{}", t.as_secs_f64(), force, position);
            }
            println!(
                "{:?}: {} samples, peak {} N, travel {} mm",
                summary.reason, summary.samples, summary.peak_force_n, summary.travel_mm
            );
        }
        Command::Gauge { count } => print_readings(config, count)?,
    }
    Ok(())
}

fn open_gauge(config: &HostConfig) -> Result<ForceGauge<SerialChannel>, Box<dyn Error>> {
    info!("Connecting to force gauge on {}", config.gauge.port);
    let channel = SerialChannel::open(&config.gauge.port_config())?;
    Ok(ForceGauge::new(channel, config.gauge.retry_window()))
}

fn print_readings(config: &HostConfig, count: usize) -> Result<(), Box<dyn Error>> {
    let mut gauge = open_gauge(config)?;
    for _ in 0..count {
        println!("{} N", gauge.read_force()?);
    }
    Ok(())
}
