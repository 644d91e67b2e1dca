//! Discrete move vocabulary and drive layouts.
//!
//! Cardinal points are read as directions on a map where North means forward.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Symbolic move requested by the user.
///
/// The numeric codes are the ones used by the command surface when a move is
/// sent as a bare integer.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Move {
    Stop = 0,
    North = 1,
    NorthEast = 2,
    East = 3,
    SouthEast = 4,
    South = 5,
    SouthWest = 6,
    West = 7,
    NorthWest = 8,
    ClockWise = 9,
    CounterClockWise = 10,
}

impl Move {
    pub const ALL: [Move; 11] = [
        Move::Stop,
        Move::North,
        Move::NorthEast,
        Move::East,
        Move::SouthEast,
        Move::South,
        Move::SouthWest,
        Move::West,
        Move::NorthWest,
        Move::ClockWise,
        Move::CounterClockWise,
    ];

    /// Decode a move code, resolving anything unknown to `Stop`.
    pub fn from_code_or_stop(code: u8) -> Move {
        Move::try_from(code).unwrap_or_else(|e| {
            tracing::warn!("{}, resolving to stop", e);
            Move::Stop
        })
    }
}

/// A move code outside the vocabulary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UnknownMove(pub u8);

impl fmt::Display for UnknownMove {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        write!(f, "unknown move code {}", self.0)
    }
}

impl TryFrom<u8> for Move {
    type Error = UnknownMove;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        Move::ALL
            .iter()
            .copied()
            .find(|m| *m as u8 == code)
            .ok_or(UnknownMove(code))
    }
}

/// Physical wheel arrangement; selects the kinematics engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DriveLayout {
    /// Left and right wheels, driven through `fl`/`fr`.
    #[default]
    TwoWheel,
    /// Four wheels, each side mirroring the two-wheel pattern.
    FourWheelDifferential,
    /// Four mecanum wheels.
    FourWheelMecanum,
}

impl DriveLayout {
    /// Number of wheels that must be bound for this layout.
    pub const fn wheel_count(self) -> usize {
        match self {
            DriveLayout::TwoWheel => 2,
            DriveLayout::FourWheelDifferential | DriveLayout::FourWheelMecanum => 4,
        }
    }

    /// Whether the layout can translate sideways and diagonally.
    pub const fn is_holonomic(self) -> bool {
        matches!(self, DriveLayout::FourWheelMecanum)
    }
}
