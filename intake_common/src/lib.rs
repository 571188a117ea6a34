//! Intake Common Library
//!
//! Shared types and contracts for the intake actuation workspace.
//!
//! # Module Structure
//!
//! - [`types`] - Modes, roller/robot state enums, vision target type
//! - [`hal`] - Actuator I/O and target provider traits, I/O errors
//! - [`config`] - TOML configuration loading and validation

pub mod config;
pub mod hal;
pub mod types;
