//! Shared state enums and the vision target type.
//!
//! All enums are plain `Copy` values owned by the component that mutates
//! them; collaborators read them through narrow getters, never through
//! globals.

use serde::{Deserialize, Serialize};

/// Control mode of the linear slide axis.
///
/// `Emergency` is a one-way trap: entered only by the controller's
/// emergency halt, cleared only by an explicit mode change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ActuatorMode {
    /// Operator drives the axis with open-loop nudges at the manual cap.
    Manual,
    /// Closed-loop positioning between the fixed inner/outer targets.
    Auto,
    /// Halted; closed loop disabled until an explicit mode change.
    Emergency,
}

impl Default for ActuatorMode {
    fn default() -> Self {
        Self::Auto
    }
}

/// Robot-wide phase signal set (never read) by the intake subsystem.
///
/// Announces to other subsystems whether the intake phase is active.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RobotState {
    /// No subsystem-specific phase active.
    None,
    /// Intake phase active (slide extended, end-effector collecting).
    Intake,
}

impl Default for RobotState {
    fn default() -> Self {
        Self::None
    }
}

/// Commanded state of the continuous-rotation intake roller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RollerState {
    /// Pulling game pieces in.
    Forward,
    /// Ejecting ("vomit").
    Reverse,
    /// Zero power.
    Stopped,
}

impl Default for RollerState {
    fn default() -> Self {
        Self::Stopped
    }
}

/// Game-piece color the operator has selected for collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SampleColor {
    Yellow,
    Red,
    Blue,
}

impl Default for SampleColor {
    fn default() -> Self {
        Self::Yellow
    }
}

/// Positional servo channels of the end-effector assembly.
///
/// `ArmLeft`/`ArmRight` are mechanically ganged and always written together.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServoChannel {
    ArmLeft,
    ArmRight,
    Hand,
    Rotation,
}

/// A target detected by the vision subsystem.
///
/// Absence of a detection is modeled as `Option<DetectedTarget>` at the
/// provider boundary, never as a sentinel angle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DetectedTarget {
    /// Desired rotation-servo angle, nominally in `[0, 1]`.
    ///
    /// Consumers must clamp: the provider is not trusted to stay in range.
    pub angle: f64,
}
