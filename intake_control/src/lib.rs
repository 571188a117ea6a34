//! # Intake Actuation Core
//!
//! Control and sequencing logic for a competition robot's intake mechanism:
//! a proportional position loop for the horizontal linear slide with
//! mode-dependent power caps, an idempotent multi-servo end-effector
//! controller with a clamped rotation tracker, a bounded one-shot task
//! scheduler for deferred actuator moves, and a step sequencer that
//! composes the two controllers into intake/vomit/stretch/retract
//! operations.
//!
//! ## Cycle Model
//!
//! Single-threaded and cooperative. One control cycle runs, in order:
//! command invocations from operator input, the subsystem
//! [`update`](sequencer::Intake::update) (linear position loop, then the
//! scheduler poll), and any hardware backend stepping the external driver
//! performs. No call blocks; every command is a bounded state mutation plus
//! at most one hardware write per actuator.

pub mod effector;
pub mod linear;
pub mod schedule;
pub mod sequencer;
pub mod sim;
