//! TOML configuration loader with validation.
//!
//! Loads [`IntakeConfig`] from a single TOML file. Every tuning constant of
//! the subsystem (gains, speed caps, servo poses, delays, step tables,
//! device names) lives here so the control core carries no magic numbers.
//!
//! Validation runs once at startup: speed caps and servo poses must be in
//! range, the proportional gain positive, and every step-table entry a
//! valid index. A config that fails validation aborts startup.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

/// Number of phases in the intake step cycle.
pub const PHASE_COUNT: usize = 4;

// ─── Error Type ─────────────────────────────────────────────────────

/// Configuration loading/validation error.
#[derive(Debug, Clone, Error)]
pub enum ConfigError {
    /// File I/O error.
    #[error("config I/O error: {0}")]
    Io(String),
    /// TOML parse error.
    #[error("config parse error: {0}")]
    Parse(String),
    /// Parameter validation error.
    #[error("config validation: {0}")]
    Validation(String),
}

// ─── Config Sections ────────────────────────────────────────────────

/// Linear slide axis tuning.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LinearConfig {
    /// Fully retracted target [encoder counts]. Also the AUTO "home" seed.
    pub inner_pose: f64,
    /// Fully extended target [encoder counts].
    pub outer_pose: f64,
    /// Power cap in AUTO mode.
    pub auto_speed: f64,
    /// Power cap in MANUAL (and EMERGENCY) mode; also the open-loop
    /// stretch/retract magnitude outside AUTO.
    pub manual_speed: f64,
    /// Proportional gain [power per count of error].
    pub kp: f64,
}

impl Default for LinearConfig {
    fn default() -> Self {
        Self {
            inner_pose: 0.0,
            outer_pose: 0.0,
            auto_speed: 0.6,
            manual_speed: 0.3,
            kp: 1.0 * 0.001,
        }
    }
}

/// End-effector servo poses, rotation angles, and roller speed.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EffectorConfig {
    pub arm_down_pose: f64,
    pub arm_neutral_pose: f64,
    pub arm_up_pose: f64,

    pub hand_down_pose: f64,
    pub hand_neutral_pose: f64,
    pub hand_up_pose: f64,

    /// Rotation angle restored by arm-up and arm-neutral poses.
    pub angle_up: f64,
    /// Rotation angle for specimen collection.
    pub angle_specimen: f64,
    /// Rotation angle for sample collection.
    pub angle_sample: f64,

    /// Roller power magnitude (sign selects intake/eject).
    pub roller_speed: f64,
    /// Rotation-target increment per manual rotate tick.
    pub rotation_step: f64,
}

impl Default for EffectorConfig {
    fn default() -> Self {
        Self {
            arm_down_pose: 0.0,
            arm_neutral_pose: 0.5,
            arm_up_pose: 1.0,
            hand_down_pose: 0.0,
            hand_neutral_pose: 0.5,
            hand_up_pose: 1.0,
            angle_up: 0.5,
            angle_specimen: 1.0,
            angle_sample: 0.0,
            roller_speed: 0.5,
            rotation_step: 0.02,
        }
    }
}

/// Step-cycle tables and deferred-command delays.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SequenceConfig {
    /// `forward[step]` = next step when advancing.
    pub forward: [usize; PHASE_COUNT],
    /// `backward[step]` = previous step when retreating.
    pub backward: [usize; PHASE_COUNT],
    /// Step the sequencer starts in.
    pub initial_step: usize,
    /// Delay before the deferred slide retract fires [ms].
    pub retract_delay_ms: u64,
    /// Delay before the deferred arm-up fires [ms].
    pub arm_up_delay_ms: u64,
}

impl Default for SequenceConfig {
    fn default() -> Self {
        Self {
            forward: [1, 3, 1, 0],
            backward: [0, 2, 0, 3],
            initial_step: 3,
            retract_delay_ms: 100,
            arm_up_delay_ms: 100,
        }
    }
}

/// Device-map contents for backend construction.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DeviceConfig {
    /// Names of the actuator handles present on this robot.
    pub names: Vec<String>,
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            names: [
                "linear_slide",
                "arm_left",
                "arm_right",
                "hand",
                "rotation",
                "roller",
            ]
            .map(String::from)
            .to_vec(),
        }
    }
}

/// Complete intake subsystem configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct IntakeConfig {
    pub linear: LinearConfig,
    pub effector: EffectorConfig,
    pub sequence: SequenceConfig,
    pub devices: DeviceConfig,
}

// ─── Loading & Validation ───────────────────────────────────────────

/// Load and validate the intake configuration from a TOML file.
pub fn load_config(path: &Path) -> Result<IntakeConfig, ConfigError> {
    let content = fs::read_to_string(path)
        .map_err(|e| ConfigError::Io(format!("failed to read {path:?}: {e}")))?;

    let config: IntakeConfig = toml::from_str(&content)
        .map_err(|e| ConfigError::Parse(format!("failed to parse {path:?}: {e}")))?;

    config.validate()?;
    debug!("config loaded from {:?}", path);
    Ok(config)
}

impl IntakeConfig {
    /// Validate parameter bounds and step-table consistency.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let l = &self.linear;
        check_range("linear.auto_speed", l.auto_speed, 0.0, 1.0)?;
        check_range("linear.manual_speed", l.manual_speed, 0.0, 1.0)?;
        if l.kp <= 0.0 {
            return Err(ConfigError::Validation(format!(
                "linear.kp must be positive, got {}",
                l.kp
            )));
        }

        let e = &self.effector;
        for (name, value) in [
            ("effector.arm_down_pose", e.arm_down_pose),
            ("effector.arm_neutral_pose", e.arm_neutral_pose),
            ("effector.arm_up_pose", e.arm_up_pose),
            ("effector.hand_down_pose", e.hand_down_pose),
            ("effector.hand_neutral_pose", e.hand_neutral_pose),
            ("effector.hand_up_pose", e.hand_up_pose),
            ("effector.angle_up", e.angle_up),
            ("effector.angle_specimen", e.angle_specimen),
            ("effector.angle_sample", e.angle_sample),
            ("effector.roller_speed", e.roller_speed),
            ("effector.rotation_step", e.rotation_step),
        ] {
            check_range(name, value, 0.0, 1.0)?;
        }

        let s = &self.sequence;
        if s.initial_step >= PHASE_COUNT {
            return Err(ConfigError::Validation(format!(
                "sequence.initial_step {} out of range (max {})",
                s.initial_step,
                PHASE_COUNT - 1
            )));
        }
        for (table, name) in [(&s.forward, "forward"), (&s.backward, "backward")] {
            for (i, &next) in table.iter().enumerate() {
                if next >= PHASE_COUNT {
                    return Err(ConfigError::Validation(format!(
                        "sequence.{name}[{i}] = {next} out of range (max {})",
                        PHASE_COUNT - 1
                    )));
                }
            }
        }

        Ok(())
    }
}

fn check_range(name: &str, value: f64, min: f64, max: f64) -> Result<(), ConfigError> {
    if value < min || value > max {
        return Err(ConfigError::Validation(format!(
            "{name} = {value} outside [{min}, {max}]"
        )));
    }
    Ok(())
}

// ─── Tests ──────────────────────────────────────────────────────────
