//! Actuator I/O and target provider traits.
//!
//! The control core talks to hardware exclusively through these traits,
//! enabling pluggable backends (simulation, real robot controller).
//!
//! All I/O calls are assumed immediate, non-blocking, and idempotent —
//! they latch a command register, they do not wait for motion.

use thiserror::Error;

use crate::types::{DetectedTarget, ServoChannel};

/// Error types for hardware I/O setup.
#[derive(Debug, Clone, Error)]
pub enum IoError {
    /// A required actuator handle is missing or misnamed in the device map.
    ///
    /// Fatal at initialization: the core must abort startup rather than
    /// continue with an unbound actuator.
    #[error("missing device: '{0}' not present in device map")]
    MissingDevice(String),
}

/// Interface to the intake subsystem's actuators.
///
/// # Ranges
///
/// - Motor and roller power: `[-1, 1]`
/// - Servo positions: `[0, 1]`
///
/// Callers are responsible for staying in range; backends may clamp
/// defensively but must not error on out-of-range writes.
pub trait IntakeIo {
    /// Current encoder count of the linear slide.
    fn read_position(&self) -> i32;

    /// Command the linear slide motor power.
    fn write_power(&mut self, power: f64);

    /// Command a positional servo.
    fn write_servo(&mut self, channel: ServoChannel, position: f64);

    /// Command the continuous-rotation roller power.
    fn write_roller(&mut self, power: f64);
}

/// Vision-side supplier of rotation targets.
///
/// `None` means "no target detected this call"; the consumer retains its
/// previous rotation target in that case.
pub trait TargetProvider {
    fn detect_target(&mut self) -> Option<DetectedTarget>;
}
