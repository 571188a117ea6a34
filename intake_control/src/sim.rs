//! Simulated hardware backend and scripted vision provider.
//!
//! Stands in for the robot controller in the demo binary and the tests:
//! records the last written power and servo positions, and integrates the
//! slide encoder toward the commanded power when stepped.

use std::collections::VecDeque;

use intake_common::hal::{IntakeIo, IoError, TargetProvider};
use intake_common::types::{DetectedTarget, ServoChannel};

/// Actuator handles the intake subsystem requires from the device map.
pub const REQUIRED_DEVICES: [&str; 6] = [
    "linear_slide",
    "arm_left",
    "arm_right",
    "hand",
    "rotation",
    "roller",
];

/// Encoder counts the simulated slide travels per cycle at full power.
const COUNTS_PER_CYCLE: f64 = 25.0;

/// In-memory intake hardware: last-write-wins command registers plus a
/// first-order slide model.
#[derive(Debug, Default)]
pub struct SimulatedIntake {
    position: f64,
    power: f64,
    servos: [f64; 4],
    roller: f64,
}

impl SimulatedIntake {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the backend from a configured device map, failing with the
    /// first missing required handle. Mirrors real-robot init, where an
    /// unbound actuator must abort startup rather than yield a null.
    pub fn from_device_map(names: &[String]) -> Result<Self, IoError> {
        for required in REQUIRED_DEVICES {
            if !names.iter().any(|n| n == required) {
                return Err(IoError::MissingDevice(required.to_string()));
            }
        }
        Ok(Self::new())
    }

    /// Advance the slide model one cycle under the commanded power.
    pub fn step(&mut self) {
        self.position += self.power * COUNTS_PER_CYCLE;
    }

    /// Force the simulated encoder (test hook).
    pub fn set_position(&mut self, counts: i32) {
        self.position = f64::from(counts);
    }

    /// Last commanded slide power.
    #[inline]
    pub const fn power(&self) -> f64 {
        self.power
    }

    /// Last commanded position of a servo channel.
    #[inline]
    pub const fn servo(&self, channel: ServoChannel) -> f64 {
        self.servos[channel_index(channel)]
    }

    /// Last commanded roller power.
    #[inline]
    pub const fn roller_power(&self) -> f64 {
        self.roller
    }
}

const fn channel_index(channel: ServoChannel) -> usize {
    match channel {
        ServoChannel::ArmLeft => 0,
        ServoChannel::ArmRight => 1,
        ServoChannel::Hand => 2,
        ServoChannel::Rotation => 3,
    }
}

impl IntakeIo for SimulatedIntake {
    fn read_position(&self) -> i32 {
        self.position as i32
    }

    fn write_power(&mut self, power: f64) {
        self.power = power;
    }

    fn write_servo(&mut self, channel: ServoChannel, position: f64) {
        self.servos[channel_index(channel)] = position;
    }

    fn write_roller(&mut self, power: f64) {
        self.roller = power;
    }
}

/// Vision provider replaying a fixed script of detections.
///
/// Yields the scripted results in order, then `None` forever.
#[derive(Debug, Default)]
pub struct ScriptedVision {
    script: VecDeque<Option<DetectedTarget>>,
}

impl ScriptedVision {
    pub fn new(script: impl IntoIterator<Item = Option<DetectedTarget>>) -> Self {
        Self {
            script: script.into_iter().collect(),
        }
    }

    /// A provider that never detects anything.
    pub fn empty() -> Self {
        Self::default()
    }
}

impl TargetProvider for ScriptedVision {
    fn detect_target(&mut self) -> Option<DetectedTarget> {
        self.script.pop_front().flatten()
    }
}

// ─── Tests ──────────────────────────────────────────────────────────
