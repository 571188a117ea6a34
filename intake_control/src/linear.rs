//! Horizontal linear slide position controller.
//!
//! Proportional closed loop with mode-dependent output saturation. No
//! integral or derivative term and no deadband: callers rely on reaching
//! the target asymptotically or being re-commanded.
//!
//! Mode semantics:
//! - `Auto`: stretch/retract move the target between the fixed outer/inner
//!   constants, closed loop stays enabled, output capped at the auto speed.
//! - `Manual`: stretch/retract bypass the loop and command the manual speed
//!   open-loop; `manual_stop` re-seeds the target and re-enables the loop.
//! - `Emergency`: one-way trap entered only by [`LinearAxis::stop`]. The
//!   loop stays disabled and power stays at zero until an explicit
//!   [`LinearAxis::set_mode`].

use intake_common::config::LinearConfig;
use intake_common::hal::IntakeIo;
use intake_common::types::ActuatorMode;
use tracing::{debug, info};

/// Position-controlled linear slide axis.
#[derive(Debug)]
pub struct LinearAxis {
    config: LinearConfig,
    mode: ActuatorMode,
    /// Commanded position [encoder counts].
    target_position: f64,
    /// When false, power was set open-loop by the disabling command and
    /// the periodic update must not touch it.
    closed_loop: bool,
    /// Advisory flag set by the sequencer to gate external chaining.
    busy: bool,
}

impl LinearAxis {
    /// Create the axis in its startup mode with the target at home.
    pub fn new(config: LinearConfig) -> Self {
        let target_position = config.inner_pose;
        Self {
            config,
            mode: ActuatorMode::default(),
            target_position,
            closed_loop: false,
            busy: false,
        }
    }

    /// Current control mode.
    #[inline]
    pub const fn mode(&self) -> ActuatorMode {
        self.mode
    }

    /// Commanded target position [encoder counts].
    #[inline]
    pub const fn target_position(&self) -> f64 {
        self.target_position
    }

    /// Whether the periodic update is driving the motor from the error term.
    #[inline]
    pub const fn closed_loop(&self) -> bool {
        self.closed_loop
    }

    #[inline]
    pub const fn busy(&self) -> bool {
        self.busy
    }

    #[inline]
    pub fn set_busy(&mut self, busy: bool) {
        self.busy = busy;
    }

    /// Switch mode, zero the output, re-seed the target, enable the loop.
    ///
    /// Entering `Auto` seeds the target at the home (inner) constant; any
    /// other mode seeds it at the current measured position so the loop
    /// holds station instead of jumping.
    pub fn set_mode(&mut self, mode: ActuatorMode, io: &mut impl IntakeIo) {
        self.mode = mode;
        io.write_power(0.0);
        self.target_position = if mode == ActuatorMode::Auto {
            self.config.inner_pose
        } else {
            f64::from(io.read_position())
        };
        self.closed_loop = true;
        debug!("linear mode -> {:?}, target re-seeded to {}", mode, self.target_position);
    }

    /// Extend the slide.
    ///
    /// Auto: target moves to the outer constant, loop stays closed.
    /// Otherwise: loop off, constant positive power at the manual cap.
    pub fn stretch(&mut self, io: &mut impl IntakeIo) {
        if self.mode == ActuatorMode::Auto {
            self.target_position = self.config.outer_pose;
            self.closed_loop = true;
        } else {
            self.closed_loop = false;
            io.write_power(self.config.manual_speed);
        }
    }

    /// Retract the slide. Mirror image of [`LinearAxis::stretch`].
    pub fn retract(&mut self, io: &mut impl IntakeIo) {
        if self.mode == ActuatorMode::Auto {
            self.target_position = self.config.inner_pose;
            self.closed_loop = true;
        } else {
            self.closed_loop = false;
            io.write_power(-self.config.manual_speed);
        }
    }

    /// Stop an open-loop manual move.
    ///
    /// Manual: hold station under closed loop. Emergency: zero power with
    /// the loop kept disabled (the trap stays armed). Auto: no-op — the
    /// loop is already in charge.
    pub fn manual_stop(&mut self, io: &mut impl IntakeIo) {
        match self.mode {
            ActuatorMode::Manual => {
                self.closed_loop = true;
                self.target_position = f64::from(io.read_position());
                io.write_power(0.0);
            }
            ActuatorMode::Emergency => {
                self.closed_loop = false;
                self.target_position = f64::from(io.read_position());
                io.write_power(0.0);
            }
            ActuatorMode::Auto => {}
        }
    }

    /// Emergency halt. Forces `Emergency` mode, disables the loop, zeroes
    /// power. Terminal until a subsequent explicit [`LinearAxis::set_mode`].
    pub fn stop(&mut self, io: &mut impl IntakeIo) {
        self.mode = ActuatorMode::Emergency;
        self.target_position = f64::from(io.read_position());
        self.closed_loop = false;
        io.write_power(0.0);
        info!("linear axis emergency stop at position {}", self.target_position);
    }

    /// One control cycle: error → proportional power → mode cap → motor.
    ///
    /// No-op while the loop is disabled; power was already set open-loop
    /// by the command that disabled it.
    pub fn update(&mut self, io: &mut impl IntakeIo) {
        if !self.closed_loop {
            return;
        }
        let error = self.target_position - f64::from(io.read_position());
        let cap = match self.mode {
            ActuatorMode::Auto => self.config.auto_speed,
            ActuatorMode::Manual | ActuatorMode::Emergency => self.config.manual_speed,
        };
        let power = (self.config.kp * error).clamp(-cap, cap);
        io.write_power(power);
    }
}

// ─── Tests ──────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::SimulatedIntake;

    fn config() -> LinearConfig {
        LinearConfig {
            inner_pose: 0.0,
            outer_pose: 1000.0,
            auto_speed: 0.6,
            manual_speed: 0.3,
            kp: 0.001,
        }
    }

    fn axis_and_io() -> (LinearAxis, SimulatedIntake) {
        (LinearAxis::new(config()), SimulatedIntake::new())
    }

    #[test]
    fn update_power_is_kp_times_error_within_cap() {
        let (mut axis, mut io) = axis_and_io();
        axis.set_mode(ActuatorMode::Auto, &mut io);
        // Small error: unclamped region. target=0, position=-100 → error=100.
        io.set_position(-100);
        axis.update(&mut io);
        assert!((io.power() - 0.001 * 100.0).abs() < 1e-12);
    }

    #[test]
    fn auto_stretch_drives_toward_cap_sign_correctly() {
        let (mut axis, mut io) = axis_and_io();
        axis.set_mode(ActuatorMode::Auto, &mut io);
        assert_eq!(axis.target_position(), 0.0);

        axis.stretch(&mut io);
        assert_eq!(axis.target_position(), 1000.0);
        assert!(axis.closed_loop());

        // Far from target: saturates at the auto cap, positive.
        axis.update(&mut io);
        assert!((io.power() - 0.6).abs() < 1e-12);

        // Never exceeds the cap in magnitude as the slide closes in.
        for _ in 0..200 {
            io.step();
            axis.update(&mut io);
            assert!(io.power().abs() <= 0.6 + 1e-12);
        }
    }

    #[test]
    fn auto_cap_applies_in_auto_manual_cap_otherwise() {
        let (mut axis, mut io) = axis_and_io();
        axis.set_mode(ActuatorMode::Auto, &mut io);
        io.set_position(-100_000);
        axis.update(&mut io);
        assert!((io.power() - 0.6).abs() < 1e-12);

        axis.set_mode(ActuatorMode::Manual, &mut io);
        // Manual holds station at the seeded position; force a large error.
        axis.target_position = 100_000.0;
        io.set_position(0);
        axis.update(&mut io);
        assert!((io.power() - 0.3).abs() < 1e-12);
    }

    #[test]
    fn manual_retract_is_open_loop_at_exact_manual_speed() {
        let (mut axis, mut io) = axis_and_io();
        axis.set_mode(ActuatorMode::Manual, &mut io);
        axis.retract(&mut io);
        assert!(!axis.closed_loop());
        assert_eq!(io.power(), -0.3);

        // Update is a no-op while the loop is off.
        io.set_position(12345);
        axis.update(&mut io);
        assert_eq!(io.power(), -0.3);
    }

    #[test]
    fn manual_stretch_is_open_loop_positive() {
        let (mut axis, mut io) = axis_and_io();
        axis.set_mode(ActuatorMode::Manual, &mut io);
        axis.stretch(&mut io);
        assert!(!axis.closed_loop());
        assert_eq!(io.power(), 0.3);
    }

    #[test]
    fn stop_is_emergency_trap() {
        let (mut axis, mut io) = axis_and_io();
        axis.set_mode(ActuatorMode::Auto, &mut io);
        io.set_position(400);
        axis.stop(&mut io);

        assert_eq!(axis.mode(), ActuatorMode::Emergency);
        assert!(!axis.closed_loop());
        assert_eq!(io.power(), 0.0);
        assert_eq!(axis.target_position(), 400.0);

        // Updates keep power at exactly zero until an explicit set_mode.
        for _ in 0..10 {
            axis.update(&mut io);
            assert_eq!(io.power(), 0.0);
        }

        axis.set_mode(ActuatorMode::Auto, &mut io);
        assert!(axis.closed_loop());
        assert_eq!(axis.mode(), ActuatorMode::Auto);
    }

    #[test]
    fn manual_stop_in_manual_reenables_loop() {
        let (mut axis, mut io) = axis_and_io();
        axis.set_mode(ActuatorMode::Manual, &mut io);
        axis.stretch(&mut io);
        io.set_position(250);

        axis.manual_stop(&mut io);
        assert!(axis.closed_loop());
        assert_eq!(axis.target_position(), 250.0);
        assert_eq!(io.power(), 0.0);
    }

    #[test]
    fn manual_stop_in_emergency_keeps_loop_disabled() {
        let (mut axis, mut io) = axis_and_io();
        axis.stop(&mut io);
        axis.manual_stop(&mut io);
        assert!(!axis.closed_loop());
        assert_eq!(io.power(), 0.0);
        assert_eq!(axis.mode(), ActuatorMode::Emergency);
    }

    #[test]
    fn manual_stop_in_auto_is_noop() {
        let (mut axis, mut io) = axis_and_io();
        axis.set_mode(ActuatorMode::Auto, &mut io);
        axis.stretch(&mut io);
        let target_before = axis.target_position();

        axis.manual_stop(&mut io);
        assert_eq!(axis.target_position(), target_before);
        assert!(axis.closed_loop());
    }

    #[test]
    fn set_mode_seeds_home_for_auto_and_current_for_manual() {
        let (mut axis, mut io) = axis_and_io();
        io.set_position(777);

        axis.set_mode(ActuatorMode::Auto, &mut io);
        assert_eq!(axis.target_position(), 0.0);

        axis.set_mode(ActuatorMode::Manual, &mut io);
        assert_eq!(axis.target_position(), 777.0);
    }
}
