//! Kinematics engines for differential and mecanum drive layouts.
//!
//! Two kinds of command are supported:
//!
//! - discrete moves from the [`Move`] vocabulary, looked up in a fixed table
//!   per layout;
//! - a continuous `(lateral, longitudinal, rotational)` triple, mixed for
//!   mecanum wheels and L1-normalized so no wheel leaves `[-1, 1]`.
//!
//! # Example
//! ```rust
//! use amm_core::utils::math::kinematics::{mecanum_power, power_for_move};
//! use amm_core::utils::math::moves::{DriveLayout, Move};
//!
//! let p = power_for_move(Move::NorthEast, DriveLayout::FourWheelMecanum).unwrap();
//! assert_eq!(p.values(), [0.0, 1.0, 0.0, 1.0]);
//! assert!(power_for_move(Move::East, DriveLayout::TwoWheel).is_none());
//!
//! let p = mecanum_power(0.5, 0.0, 0.0);
//! assert_eq!(p.values(), [1.0, 1.0, 1.0, 1.0]);
//! ```

use serde::{Deserialize, Serialize};

use super::{
    moves::{DriveLayout, Move},
    power::{PowerRange, PowerVector},
};

/// Look up the power vector for a discrete move on the given layout.
///
/// `Stop` always maps to the all-zero vector. Returns `None` when the layout
/// cannot perform the move (diagonals and strafes on a differential base).
pub fn power_for_move(
    mv: Move,
    layout: DriveLayout,
) -> Option<PowerVector> {
    let power = match layout {
        DriveLayout::TwoWheel => differential_power(mv, false),
        DriveLayout::FourWheelDifferential => differential_power(mv, true),
        DriveLayout::FourWheelMecanum => Some(mecanum_move_power(mv)),
    };
    if power.is_none() {
        tracing::warn!(?mv, ?layout, "move not supported by drive layout");
    }
    power
}

/// Like [`power_for_move`], substituting `Stop` for unsupported moves.
pub fn power_for_move_or_stop(
    mv: Move,
    layout: DriveLayout,
) -> PowerVector {
    power_for_move(mv, layout).unwrap_or(PowerVector::STOP)
}

/// Differential table. With `mirror_rear` the back wheels copy the front pair.
pub fn differential_power(
    mv: Move,
    mirror_rear: bool,
) -> Option<PowerVector> {
    let (left, right) = match mv {
        Move::Stop => (0.0, 0.0),
        Move::North => (1.0, 1.0),
        Move::South => (-1.0, -1.0),
        Move::ClockWise => (-1.0, 1.0),
        Move::CounterClockWise => (1.0, -1.0),
        _ => return None,
    };
    Some(if mirror_rear {
        PowerVector::new(left, right, left, right)
    } else {
        PowerVector::front(left, right)
    })
}

/// Mecanum table. Total over the vocabulary.
pub fn mecanum_move_power(mv: Move) -> PowerVector {
    let [fl, fr, bl, br] = match mv {
        Move::Stop => [0.0, 0.0, 0.0, 0.0],
        Move::North => [1.0, 1.0, 1.0, 1.0],
        Move::NorthEast => [0.0, 1.0, 0.0, 1.0],
        Move::East => [-1.0, 1.0, -1.0, 1.0],
        Move::SouthEast => [-1.0, 0.0, -1.0, 0.0],
        Move::South => [-1.0, -1.0, -1.0, -1.0],
        Move::SouthWest => [0.0, -1.0, -1.0, 0.0],
        Move::West => [1.0, -1.0, 1.0, -1.0],
        Move::NorthWest => [1.0, 0.0, 1.0, 0.0],
        Move::ClockWise => [1.0, 1.0, -1.0, -1.0],
        Move::CounterClockWise => [-1.0, -1.0, 1.0, 1.0],
    };
    PowerVector::new(fl, fr, bl, br)
}

/// Mecanum table as older firmware shipped it, where `South` resolved to the
/// `SouthWest` coefficients. Only for robots tuned against that behavior.
pub fn mecanum_move_power_historical(mv: Move) -> PowerVector {
    match mv {
        Move::South => mecanum_move_power(Move::SouthWest),
        other => mecanum_move_power(other),
    }
}

/// Continuous motion request, each axis in `[-1, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct MotionVector {
    pub lateral: f32,
    pub longitudinal: f32,
    pub rotational: f32,
}

impl MotionVector {
    /// Build from the normalized scale, clamping each axis to `[-1, 1]`.
    pub fn new(
        lateral: f32,
        longitudinal: f32,
        rotational: f32,
    ) -> Self {
        let c = |v| PowerRange::Signed.clamp(v);
        Self {
            lateral: c(lateral),
            longitudinal: c(longitudinal),
            rotational: c(rotational),
        }
    }

    /// Build from the `[-100, 100]` percent scale used by block commands.
    pub fn from_percent(
        lateral: f32,
        longitudinal: f32,
        rotational: f32,
    ) -> Self {
        Self::new(lateral / 100.0, longitudinal / 100.0, rotational / 100.0)
    }

    /// `|lateral| + |longitudinal| + |rotational|`
    pub fn l1_norm(&self) -> f32 {
        libm::fabsf(self.lateral) + libm::fabsf(self.longitudinal) + libm::fabsf(self.rotational)
    }

    /// Mix into mecanum wheel powers.
    pub fn mecanum_power(&self) -> PowerVector {
        let r = self.l1_norm();
        if r == 0.0 {
            return PowerVector::STOP;
        }
        let (lat, lon, rot) = (self.lateral, self.longitudinal, self.rotational);
        PowerVector::new(
            (lat + lon + rot) / r,
            (lat - lon - rot) / r,
            (lat - lon + rot) / r,
            (lat + lon - rot) / r,
        )
    }
}

/// Mecanum inverse kinematics for a normalized `(lateral, longitudinal,
/// rotational)` triple.
///
/// Inputs are clamped to `[-1, 1]`, mixed, then divided by their L1 norm so
/// that direction is kept and every wheel stays in range. A zero triple
/// yields `Stop`.
pub fn mecanum_power(
    lateral: f32,
    longitudinal: f32,
    rotational: f32,
) -> PowerVector {
    let power = MotionVector::new(lateral, longitudinal, rotational).mecanum_power();
    tracing::debug!(lateral, longitudinal, rotational, ?power, "mecanum mix");
    power
}
