//! Math utilities for aMaker drive bases.
//!
//! Power vectors, the discrete move vocabulary, and the differential/mecanum
//! kinematics engines. Everything here is pure and allocation-free.

pub mod kinematics;
pub mod moves;
pub mod power;
