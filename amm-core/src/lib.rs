//! Wheel kinematics and PWM actuation encoding for aMaker motor boards on
//! no-std embedded platforms.
//!
//! For a host-side runner, see `amm-app/mock-mcu`.
#![no_std]

pub mod utils;
