//! Intake step sequencer and composite operations.
//!
//! [`StepSequence`] is a small finite-state machine over a fixed cycle of
//! intake phases, navigated only through its forward/backward index tables
//! — no arbitrary jumps. [`Intake`] owns the two controllers, the deferred
//! task scheduler, and the robot-wide phase signal, and composes them into
//! the operations the driver station invokes.

use std::fmt;
use std::time::{Duration, Instant};

use intake_common::config::{IntakeConfig, PHASE_COUNT, SequenceConfig};
use intake_common::hal::{IntakeIo, TargetProvider};
use intake_common::types::{ActuatorMode, RobotState, SampleColor};
use tracing::{debug, info};

use crate::effector::EndEffector;
use crate::linear::LinearAxis;
use crate::schedule::Scheduler;

// ─── Error Type ─────────────────────────────────────────────────────

/// Step-table navigation error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SequenceError {
    /// A transition produced an index outside the phase tables.
    StepOutOfRange { step: usize },
}

impl fmt::Display for SequenceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::StepOutOfRange { step } => {
                write!(f, "step {step} outside phase table (max {})", PHASE_COUNT - 1)
            }
        }
    }
}

impl std::error::Error for SequenceError {}

// ─── Step Sequence ──────────────────────────────────────────────────

/// Named intake phases, one per step index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntakePhase {
    /// Slide extending toward the outer constant.
    Stretch,
    /// End-effector down, roller collecting.
    Intake,
    /// Roller ejecting, end-effector neutral.
    Vomit,
    /// Slide home, end-effector up.
    Idle,
}

impl IntakePhase {
    /// Phase for a validated step index.
    const fn from_step(step: usize) -> Option<Self> {
        match step {
            0 => Some(Self::Stretch),
            1 => Some(Self::Intake),
            2 => Some(Self::Vomit),
            3 => Some(Self::Idle),
            _ => None,
        }
    }
}

/// Fixed-table phase index state machine.
///
/// Transitions only ever move to `forward[current]` or `backward[current]`.
/// Tables are validated at construction and every transition is
/// bounds-checked again defensively.
#[derive(Debug, Clone)]
pub struct StepSequence {
    current: usize,
    /// Step before the most recent transition (diagnostic only).
    previous: usize,
    forward: [usize; PHASE_COUNT],
    backward: [usize; PHASE_COUNT],
}

impl StepSequence {
    /// Build from config, rejecting any out-of-bounds table entry.
    pub fn new(config: &SequenceConfig) -> Result<Self, SequenceError> {
        for table in [&config.forward, &config.backward] {
            for &step in table {
                if step >= PHASE_COUNT {
                    return Err(SequenceError::StepOutOfRange { step });
                }
            }
        }
        if config.initial_step >= PHASE_COUNT {
            return Err(SequenceError::StepOutOfRange {
                step: config.initial_step,
            });
        }
        Ok(Self {
            current: config.initial_step,
            previous: config.initial_step,
            forward: config.forward,
            backward: config.backward,
        })
    }

    /// Current step index.
    #[inline]
    pub const fn current(&self) -> usize {
        self.current
    }

    /// Step before the most recent transition.
    #[inline]
    pub const fn previous(&self) -> usize {
        self.previous
    }

    /// Move to `forward[current]`, returning the step entered.
    pub fn advance(&mut self) -> Result<usize, SequenceError> {
        self.transition_to(self.forward[self.current])
    }

    /// Move to `backward[current]`, returning the step entered.
    pub fn retreat(&mut self) -> Result<usize, SequenceError> {
        self.transition_to(self.backward[self.current])
    }

    fn transition_to(&mut self, next: usize) -> Result<usize, SequenceError> {
        if next >= PHASE_COUNT {
            return Err(SequenceError::StepOutOfRange { step: next });
        }
        self.previous = self.current;
        self.current = next;
        Ok(next)
    }
}

// ─── Deferred Commands ──────────────────────────────────────────────

/// Low-level actuator moves the sequencer defers through the scheduler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeferredCommand {
    /// Retract the linear slide (after the end-effector clears its path).
    LinearRetract,
    /// Raise the end-effector arm.
    ArmUp,
}

// ─── Intake Subsystem ───────────────────────────────────────────────

/// Top-level intake subsystem: slide controller, end-effector, step
/// sequence, deferred-task scheduler, and the robot-wide phase signal.
#[derive(Debug)]
pub struct Intake<D: IntakeIo> {
    io: D,
    linear: LinearAxis,
    effector: EndEffector,
    schedule: Scheduler<DeferredCommand>,
    steps: StepSequence,
    /// Announced to other subsystems, never read back here.
    robot_state: RobotState,
    target_color: SampleColor,
    retract_delay: Duration,
    arm_up_delay: Duration,
}

impl<D: IntakeIo> Intake<D> {
    /// Initialize the subsystem over a hardware backend.
    pub fn new(config: IntakeConfig, io: D) -> Result<Self, SequenceError> {
        let steps = StepSequence::new(&config.sequence)?;
        Ok(Self {
            io,
            linear: LinearAxis::new(config.linear),
            effector: EndEffector::new(config.effector),
            schedule: Scheduler::new(),
            steps,
            robot_state: RobotState::default(),
            target_color: SampleColor::default(),
            retract_delay: Duration::from_millis(config.sequence.retract_delay_ms),
            arm_up_delay: Duration::from_millis(config.sequence.arm_up_delay_ms),
        })
    }

    /// One control cycle: run the linear loop, then fire due deferred
    /// commands. A failed command is logged and does not stop the cycle.
    pub fn update(&mut self, now: Instant) {
        let Self {
            io,
            linear,
            effector,
            schedule,
            ..
        } = self;
        linear.update(io);
        schedule.poll(now, |command| -> Result<(), SequenceError> {
            debug!("deferred command firing: {:?}", command);
            match command {
                DeferredCommand::LinearRetract => linear.retract(io),
                DeferredCommand::ArmUp => effector.arm_up(io),
            }
            Ok(())
        });
    }

    /// Subsystem shutdown: emergency-halt the slide, neutralize the
    /// end-effector, drop pending deferred work.
    pub fn stop(&mut self) {
        self.linear.stop(&mut self.io);
        self.effector.stop(&mut self.io);
        self.schedule.clear();
        self.robot_state = RobotState::None;
    }

    // ── Composite operations ────────────────────────────────────────

    /// Lower for a sample and start collecting.
    pub fn intake_sample(&mut self) {
        self.effector.arm_down_for_sample(&mut self.io);
        self.effector.roller_run(true, &mut self.io);
    }

    /// Lower for a specimen and start collecting.
    pub fn intake_specimen(&mut self) {
        self.effector.arm_down_for_specimen(&mut self.io);
        self.effector.roller_run(true, &mut self.io);
    }

    /// Lower at the held rotation angle and start collecting.
    pub fn intake_free_angle(&mut self) {
        self.effector.arm_down_for_free_angle(&mut self.io);
        self.effector.roller_run(true, &mut self.io);
    }

    /// Eject: reverse the roller and return to the neutral carry pose.
    pub fn vomit(&mut self) {
        self.effector.roller_run(false, &mut self.io);
        self.effector.arm_neutral(&mut self.io);
    }

    /// Extend the slide under closed loop and announce the intake phase.
    pub fn auto_stretch(&mut self) {
        self.robot_state = RobotState::Intake;
        self.linear.set_mode(ActuatorMode::Auto, &mut self.io);
        self.linear.stretch(&mut self.io);
        info!("auto stretch commanded");
    }

    /// Leave the intake phase: stop the roller now, then retract the slide
    /// and raise the arm after their configured delays (both measured from
    /// this call, letting the end-effector clear the slide path first).
    pub fn auto_retract(&mut self, now: Instant) {
        self.robot_state = RobotState::None;
        self.linear.set_mode(ActuatorMode::Auto, &mut self.io);
        self.effector.roller_stop(&mut self.io);

        self.schedule
            .schedule(DeferredCommand::LinearRetract, self.retract_delay, now);
        self.schedule
            .schedule(DeferredCommand::ArmUp, self.arm_up_delay, now);
        info!("auto retract commanded, slide/arm follow-ups scheduled");
    }

    /// Track the vision target with the rotation joint.
    pub fn auto_rotate(&mut self, provider: &mut impl TargetProvider) {
        self.effector.auto_rotate(provider, &mut self.io);
    }

    /// Open-loop extend at the manual speed cap.
    pub fn manual_stretch(&mut self) {
        self.linear.set_mode(ActuatorMode::Manual, &mut self.io);
        self.linear.stretch(&mut self.io);
    }

    /// Open-loop retract at the manual speed cap.
    pub fn manual_retract(&mut self) {
        self.linear.set_mode(ActuatorMode::Manual, &mut self.io);
        self.linear.retract(&mut self.io);
    }

    /// Stop a manual slide move (no-op in AUTO).
    pub fn manual_stop(&mut self) {
        self.linear.manual_stop(&mut self.io);
    }

    /// Nudge the rotation joint.
    pub fn manual_rotate(&mut self, direction: i8) {
        self.effector.manual_rotate(direction, &mut self.io);
    }

    // ── Step navigation ─────────────────────────────────────────────

    /// Advance the phase cycle and run the entered phase's operation.
    pub fn advance(&mut self, now: Instant) -> Result<IntakePhase, SequenceError> {
        let step = self.steps.advance()?;
        self.enter_phase(step, now)
    }

    /// Retreat the phase cycle and run the entered phase's operation.
    pub fn retreat(&mut self, now: Instant) -> Result<IntakePhase, SequenceError> {
        let step = self.steps.retreat()?;
        self.enter_phase(step, now)
    }

    fn enter_phase(&mut self, step: usize, now: Instant) -> Result<IntakePhase, SequenceError> {
        let phase =
            IntakePhase::from_step(step).ok_or(SequenceError::StepOutOfRange { step })?;
        debug!("entering phase {:?} (step {})", phase, step);
        match phase {
            IntakePhase::Stretch => self.auto_stretch(),
            IntakePhase::Intake => self.intake_sample(),
            IntakePhase::Vomit => self.vomit(),
            IntakePhase::Idle => self.auto_retract(now),
        }
        Ok(phase)
    }

    // ── Accessors ───────────────────────────────────────────────────

    /// Robot-wide phase signal (set here, read by other subsystems).
    #[inline]
    pub const fn robot_state(&self) -> RobotState {
        self.robot_state
    }

    /// Select which game-piece color to collect.
    pub fn set_target_color(&mut self, color: SampleColor) {
        self.target_color = color;
    }

    #[inline]
    pub const fn target_color(&self) -> SampleColor {
        self.target_color
    }

    #[inline]
    pub const fn linear(&self) -> &LinearAxis {
        &self.linear
    }

    #[inline]
    pub fn linear_mut(&mut self) -> &mut LinearAxis {
        &mut self.linear
    }

    #[inline]
    pub const fn effector(&self) -> &EndEffector {
        &self.effector
    }

    #[inline]
    pub fn effector_mut(&mut self) -> &mut EndEffector {
        &mut self.effector
    }

    #[inline]
    pub const fn steps(&self) -> &StepSequence {
        &self.steps
    }

    /// Pending deferred commands (for telemetry and tests).
    #[inline]
    pub fn pending_tasks(&self) -> usize {
        self.schedule.pending()
    }

    /// Hardware backend access (simulation stepping, telemetry).
    #[inline]
    pub const fn io(&self) -> &D {
        &self.io
    }

    #[inline]
    pub fn io_mut(&mut self) -> &mut D {
        &mut self.io
    }
}

// ─── Tests ──────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::SimulatedIntake;
    use intake_common::types::{RollerState, ServoChannel};

    fn test_config() -> IntakeConfig {
        let mut config = IntakeConfig::default();
        config.linear.outer_pose = 1000.0;
        config
    }

    fn intake() -> Intake<SimulatedIntake> {
        Intake::new(test_config(), SimulatedIntake::new()).unwrap()
    }

    #[test]
    fn step_tables_cycle_idle_stretch_intake_idle() {
        let mut steps = StepSequence::new(&SequenceConfig::default()).unwrap();
        assert_eq!(steps.current(), 3);

        assert_eq!(steps.advance().unwrap(), 0);
        assert_eq!(steps.advance().unwrap(), 1);
        assert_eq!(steps.advance().unwrap(), 3);
        assert_eq!(steps.previous(), 1);
    }

    #[test]
    fn retreat_follows_backward_table() {
        let mut steps = StepSequence::new(&SequenceConfig::default()).unwrap();
        steps.advance().unwrap(); // 3 -> 0
        steps.advance().unwrap(); // 0 -> 1
        assert_eq!(steps.retreat().unwrap(), 2);
        assert_eq!(steps.retreat().unwrap(), 0);
        assert_eq!(steps.previous(), 2);
    }

    #[test]
    fn bad_table_rejected_at_construction() {
        let mut config = SequenceConfig::default();
        config.backward[1] = 7;
        let err = StepSequence::new(&config).unwrap_err();
        assert_eq!(err, SequenceError::StepOutOfRange { step: 7 });
    }

    #[test]
    fn intake_sample_poses_and_runs_roller() {
        let mut intake = intake();
        intake.intake_sample();

        let io = intake.io();
        assert_eq!(io.servo(ServoChannel::ArmLeft), 0.0);
        assert_eq!(io.servo(ServoChannel::ArmRight), 0.0);
        assert_eq!(io.servo(ServoChannel::Hand), 0.0);
        assert_eq!(intake.effector().rotation_target(), 0.0);
        assert_eq!(intake.effector().roller(), RollerState::Forward);
    }

    #[test]
    fn vomit_reverses_roller_and_goes_neutral() {
        let mut intake = intake();
        intake.intake_sample();
        intake.vomit();

        assert_eq!(intake.effector().roller(), RollerState::Reverse);
        assert_eq!(intake.io().servo(ServoChannel::ArmLeft), 0.5);
        assert_eq!(intake.io().servo(ServoChannel::Hand), 0.5);
    }

    #[test]
    fn auto_stretch_signals_intake_and_extends() {
        let mut intake = intake();
        intake.auto_stretch();

        assert_eq!(intake.robot_state(), RobotState::Intake);
        assert_eq!(intake.linear().mode(), ActuatorMode::Auto);
        assert_eq!(intake.linear().target_position(), 1000.0);
        assert!(intake.linear().closed_loop());
    }

    #[test]
    fn auto_retract_schedules_two_deferred_commands() {
        let t0 = Instant::now();
        let mut intake = intake();
        intake.auto_stretch();

        intake.auto_retract(t0);
        assert_eq!(intake.robot_state(), RobotState::None);
        assert_eq!(intake.effector().roller(), RollerState::Stopped);
        // The mode change already re-seeded the target at home; the
        // deferred retract re-commands it once the arm has cleared.
        assert_eq!(intake.linear().target_position(), 0.0);
        assert_eq!(intake.pending_tasks(), 2);

        // Before either delay elapses nothing fires.
        intake.update(t0 + Duration::from_millis(99));
        assert_eq!(intake.pending_tasks(), 2);
        assert_eq!(intake.io().servo(ServoChannel::ArmLeft), 0.0);

        // Both configured delays are 100ms from the call.
        intake.update(t0 + Duration::from_millis(100));
        assert_eq!(intake.pending_tasks(), 0);
        assert_eq!(intake.linear().target_position(), 0.0);
        assert!(intake.linear().closed_loop());
        assert_eq!(intake.io().servo(ServoChannel::ArmLeft), 1.0);
        assert_eq!(intake.effector().rotation_target(), 0.5);
    }

    #[test]
    fn deferred_commands_fire_at_most_once() {
        let t0 = Instant::now();
        let mut intake = intake();
        intake.auto_retract(t0);

        intake.update(t0 + Duration::from_millis(150));
        assert_eq!(intake.pending_tasks(), 0);

        // Re-extend, then confirm a later update does not re-fire retract.
        intake.auto_stretch();
        intake.update(t0 + Duration::from_millis(300));
        assert_eq!(intake.linear().target_position(), 1000.0);
    }

    #[test]
    fn manual_passthroughs_force_manual_mode() {
        let mut intake = intake();
        intake.manual_stretch();
        assert_eq!(intake.linear().mode(), ActuatorMode::Manual);
        assert!(!intake.linear().closed_loop());
        assert_eq!(intake.io().power(), 0.3);

        intake.manual_retract();
        assert_eq!(intake.io().power(), -0.3);

        intake.manual_stop();
        assert!(intake.linear().closed_loop());
        assert_eq!(intake.io().power(), 0.0);
    }

    #[test]
    fn advance_dispatches_phase_operations() {
        let t0 = Instant::now();
        let mut intake = intake();

        assert_eq!(intake.advance(t0).unwrap(), IntakePhase::Stretch);
        assert_eq!(intake.robot_state(), RobotState::Intake);

        assert_eq!(intake.advance(t0).unwrap(), IntakePhase::Intake);
        assert_eq!(intake.effector().roller(), RollerState::Forward);

        assert_eq!(intake.advance(t0).unwrap(), IntakePhase::Idle);
        assert_eq!(intake.robot_state(), RobotState::None);
        assert_eq!(intake.pending_tasks(), 2);
    }

    #[test]
    fn retreat_from_intake_enters_vomit() {
        let t0 = Instant::now();
        let mut intake = intake();
        intake.advance(t0).unwrap(); // Stretch
        intake.advance(t0).unwrap(); // Intake

        assert_eq!(intake.retreat(t0).unwrap(), IntakePhase::Vomit);
        assert_eq!(intake.effector().roller(), RollerState::Reverse);
    }

    #[test]
    fn stop_tears_down_everything() {
        let t0 = Instant::now();
        let mut intake = intake();
        intake.auto_stretch();
        intake.intake_sample();
        intake.auto_retract(t0);

        intake.stop();
        assert_eq!(intake.linear().mode(), ActuatorMode::Emergency);
        assert!(!intake.linear().closed_loop());
        assert_eq!(intake.io().power(), 0.0);
        assert_eq!(intake.effector().roller(), RollerState::Stopped);
        assert_eq!(intake.pending_tasks(), 0);
        assert_eq!(intake.robot_state(), RobotState::None);
    }

    #[test]
    fn target_color_selection() {
        let mut intake = intake();
        assert_eq!(intake.target_color(), SampleColor::Yellow);
        intake.set_target_color(SampleColor::Blue);
        assert_eq!(intake.target_color(), SampleColor::Blue);
    }
}
