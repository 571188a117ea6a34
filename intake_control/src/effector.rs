//! End-effector (arm, hand, rotation, roller) controller.
//!
//! All pose commands are idempotent absolute servo writes; the only carried
//! state is the rotation target, the tracked roller state, and the advisory
//! busy flag. The rotation target is clamped to `[0, 1]` after every
//! mutation, including angles supplied by the vision provider.

use intake_common::config::EffectorConfig;
use intake_common::hal::{IntakeIo, TargetProvider};
use intake_common::types::{RollerState, ServoChannel};
use tracing::debug;

/// Multi-servo end-effector assembly controller.
#[derive(Debug)]
pub struct EndEffector {
    config: EffectorConfig,
    /// Rotation-servo setpoint, always in `[0, 1]`.
    rotation_target: f64,
    roller: RollerState,
    /// Advisory flag set by the sequencer to gate external chaining.
    busy: bool,
}

impl EndEffector {
    pub fn new(config: EffectorConfig) -> Self {
        Self {
            config,
            rotation_target: 0.0,
            roller: RollerState::Stopped,
            busy: false,
        }
    }

    /// Current rotation-servo setpoint.
    #[inline]
    pub const fn rotation_target(&self) -> f64 {
        self.rotation_target
    }

    /// Tracked roller state.
    #[inline]
    pub const fn roller(&self) -> RollerState {
        self.roller
    }

    #[inline]
    pub const fn busy(&self) -> bool {
        self.busy
    }

    #[inline]
    pub fn set_busy(&mut self, busy: bool) {
        self.busy = busy;
    }

    /// Lower into the sample-collection pose (sample rotation angle).
    pub fn arm_down_for_sample(&mut self, io: &mut impl IntakeIo) {
        self.set_rotation_target(self.config.angle_sample, io);
        self.write_arm(self.config.arm_down_pose, self.config.hand_down_pose, io);
    }

    /// Lower into the specimen-collection pose (specimen rotation angle).
    pub fn arm_down_for_specimen(&mut self, io: &mut impl IntakeIo) {
        self.set_rotation_target(self.config.angle_specimen, io);
        self.write_arm(self.config.arm_down_pose, self.config.hand_down_pose, io);
    }

    /// Lower with the rotation target left wherever manual/auto rotation
    /// last put it.
    pub fn arm_down_for_free_angle(&mut self, io: &mut impl IntakeIo) {
        io.write_servo(ServoChannel::Rotation, self.rotation_target);
        self.write_arm(self.config.arm_down_pose, self.config.hand_down_pose, io);
    }

    /// Raise fully; rotation resets to the up angle.
    pub fn arm_up(&mut self, io: &mut impl IntakeIo) {
        self.set_rotation_target(self.config.angle_up, io);
        self.write_arm(self.config.arm_up_pose, self.config.hand_up_pose, io);
    }

    /// Neutral carry pose; rotation resets to the up angle.
    pub fn arm_neutral(&mut self, io: &mut impl IntakeIo) {
        self.set_rotation_target(self.config.angle_up, io);
        self.write_arm(self.config.arm_neutral_pose, self.config.hand_neutral_pose, io);
    }

    /// Run the roller: forward to collect, reverse to eject.
    pub fn roller_run(&mut self, intake: bool, io: &mut impl IntakeIo) {
        self.roller = if intake {
            RollerState::Forward
        } else {
            RollerState::Reverse
        };
        let power = if intake {
            self.config.roller_speed
        } else {
            -self.config.roller_speed
        };
        io.write_roller(power);
    }

    /// Stop the roller.
    pub fn roller_stop(&mut self, io: &mut impl IntakeIo) {
        self.roller = RollerState::Stopped;
        io.write_roller(0.0);
    }

    /// Track the vision target if one is detected; re-apply the held
    /// rotation target either way.
    pub fn auto_rotate(&mut self, provider: &mut impl TargetProvider, io: &mut impl IntakeIo) {
        if let Some(target) = provider.detect_target() {
            debug!("vision target at angle {}", target.angle);
            self.rotation_target = target.angle.clamp(0.0, 1.0);
        }
        io.write_servo(ServoChannel::Rotation, self.rotation_target);
    }

    /// Nudge the rotation target by `direction` steps and re-apply it.
    ///
    /// `direction` is -1, 0, or +1; zero acts as a hold that re-writes the
    /// current value.
    pub fn manual_rotate(&mut self, direction: i8, io: &mut impl IntakeIo) {
        let next = self.rotation_target + f64::from(direction) * self.config.rotation_step;
        self.set_rotation_target(next, io);
    }

    /// Teardown: roller to zero, rotation held at its current value.
    pub fn stop(&mut self, io: &mut impl IntakeIo) {
        self.roller_stop(io);
        self.manual_rotate(0, io);
    }

    /// Clamp, store, and write the rotation target.
    fn set_rotation_target(&mut self, value: f64, io: &mut impl IntakeIo) {
        self.rotation_target = value.clamp(0.0, 1.0);
        io.write_servo(ServoChannel::Rotation, self.rotation_target);
    }

    /// Write both ganged arm joints and the hand joint.
    fn write_arm(&mut self, arm_pose: f64, hand_pose: f64, io: &mut impl IntakeIo) {
        io.write_servo(ServoChannel::Hand, hand_pose);
        io.write_servo(ServoChannel::ArmLeft, arm_pose);
        io.write_servo(ServoChannel::ArmRight, arm_pose);
    }
}

// ─── Tests ──────────────────────────────────────────────────────────
