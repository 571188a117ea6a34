//! # Intake Control
//!
//! Demo driver for the intake actuation core. Loads the TOML configuration,
//! builds the simulated hardware backend from the configured device map,
//! and runs a scripted stretch → intake → retract cycle, logging slide
//! position and commanded power each cycle.
//!
//! On the robot the same library is driven by the driver-station loop;
//! this binary stands in for that loop during bench development.

use std::path::PathBuf;
use std::process;
use std::thread;
use std::time::{Duration, Instant};

use clap::Parser;
use intake_common::config::load_config;
use intake_common::hal::IntakeIo;
use intake_control::sequencer::Intake;
use intake_control::sim::{ScriptedVision, SimulatedIntake};
use tracing::{Level, error, info};
use tracing_subscriber::EnvFilter;

/// Intake Control — linear slide and end-effector sequencing demo
#[derive(Parser, Debug)]
#[command(name = "intake_control")]
#[command(version)]
#[command(about = "Intake actuation core demo against the simulated backend")]
struct Args {
    /// Path to the intake configuration TOML.
    #[arg(default_value = "config/intake.toml")]
    config: PathBuf,

    /// Control cycles to run.
    #[arg(long, default_value_t = 300)]
    cycles: u64,

    /// Cycle period in milliseconds.
    #[arg(long, default_value_t = 10)]
    cycle_ms: u64,

    /// Enable verbose logging (DEBUG level).
    #[arg(short, long)]
    verbose: bool,

    /// Output logs in JSON format.
    #[arg(long)]
    json: bool,
}

fn main() {
    let args = Args::parse();
    setup_tracing(&args);

    info!("Intake Control v{} starting...", env!("CARGO_PKG_VERSION"));

    if let Err(e) = run(&args) {
        error!("FATAL: {e}");
        process::exit(1);
    }

    info!("Intake Control shutdown complete");
}

fn run(args: &Args) -> Result<(), Box<dyn std::error::Error>> {
    let config = load_config(&args.config)?;
    info!(
        "Config OK: outer_pose={}, auto_speed={}, retract_delay={}ms",
        config.linear.outer_pose, config.linear.auto_speed, config.sequence.retract_delay_ms
    );

    let io = SimulatedIntake::from_device_map(&config.devices.names)?;
    let mut intake = Intake::new(config, io)?;
    let mut vision = ScriptedVision::empty();

    let cycle = Duration::from_millis(args.cycle_ms);
    // Scripted operator input, as cycle indices.
    let stretch_at = 0;
    let intake_at = args.cycles / 3;
    let retract_at = 2 * args.cycles / 3;

    for n in 0..args.cycles {
        let now = Instant::now();

        if n == stretch_at {
            intake.auto_stretch();
        } else if n == intake_at {
            intake.intake_sample();
        } else if n == retract_at {
            intake.auto_retract(now);
        }
        intake.auto_rotate(&mut vision);

        intake.update(now);
        intake.io_mut().step();

        if n % 20 == 0 {
            info!(
                "cycle {n}: pos={} power={:.3} target={:.1} mode={:?} roller={:?}",
                intake.io().read_position(),
                intake.io().power(),
                intake.linear().target_position(),
                intake.linear().mode(),
                intake.effector().roller(),
            );
        }
        thread::sleep(cycle);
    }

    intake.stop();
    info!(
        "final: pos={} robot_state={:?}",
        intake.io().read_position(),
        intake.robot_state()
    );
    Ok(())
}

fn setup_tracing(args: &Args) {
    let level = if args.verbose { Level::DEBUG } else { Level::INFO };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level.to_string()));

    if args.json {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}
