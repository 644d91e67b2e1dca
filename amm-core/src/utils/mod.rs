//! Utility re-exports for aMaker drive bases.
//!
//! - `math`: power vectors, move vocabulary, and kinematics engines
//! - `controllers`: actuation encoders, the PCA9685 board, and the command
//!   surface
//! - `config`: board configuration with hardware defaults

pub mod config;
pub mod controllers;
pub mod math;

pub use config::BoardConfig;
pub use controllers::{actuators::encode, SystemCommand, SystemController};
pub use math::kinematics::{mecanum_power, power_for_move};
pub use math::{moves::DriveLayout, moves::Move, power::PowerVector};
