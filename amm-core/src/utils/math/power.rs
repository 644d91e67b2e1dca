//! Normalized per-wheel power commands.
//!
//! A `PowerVector` carries one scalar per wheel position (front-left,
//! front-right, back-left, back-right). Every entry path saturates each field
//! to the vector's declared range, so an out-of-range command simply runs the
//! wheel at its limit.
//!
//! # Example
//! ```rust
//! use amm_core::utils::math::power::PowerVector;
//! let mut p = PowerVector::new(1.4, -0.5, 0.0, 0.0);
//! assert_eq!(p.values(), [1.0, -0.5, 0.0, 0.0]);
//! p.scale(0.5);
//! assert_eq!(p.values(), [0.5, -0.25, 0.0, 0.0]);
//! ```

use serde::{Deserialize, Serialize};

/// Closed range a `PowerVector` saturates into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PowerRange {
    /// Signed power or speed, `[-1, 1]`.
    Signed,
    /// Unsigned power, `[0, 1]`.
    Unsigned,
}

impl PowerRange {
    /// `(lo, hi)` bounds of the range.
    pub const fn bounds(self) -> (f32, f32) {
        match self {
            PowerRange::Signed => (-1.0, 1.0),
            PowerRange::Unsigned => (0.0, 1.0),
        }
    }

    /// Saturate `value` to the nearest bound. NaN maps to zero.
    pub fn clamp(
        self,
        value: f32,
    ) -> f32 {
        if value.is_nan() {
            return 0.0;
        }
        let (lo, hi) = self.bounds();
        value.clamp(lo, hi)
    }
}

/// Four-wheel power command.
///
/// Two-wheel layouts only use `fl`/`fr`; `bl`/`br` stay at zero.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PowerVector {
    fl: f32,
    fr: f32,
    bl: f32,
    br: f32,
    range: PowerRange,
}

impl PowerVector {
    /// The all-zero command.
    pub const STOP: PowerVector = PowerVector {
        fl: 0.0,
        fr: 0.0,
        bl: 0.0,
        br: 0.0,
        range: PowerRange::Signed,
    };

    /// Build a signed vector, clamping each field to `[-1, 1]`.
    pub fn new(
        fl: f32,
        fr: f32,
        bl: f32,
        br: f32,
    ) -> Self {
        Self::with_range(PowerRange::Signed, fl, fr, bl, br)
    }

    /// Build an unsigned vector, clamping each field to `[0, 1]`.
    pub fn new_unsigned(
        fl: f32,
        fr: f32,
        bl: f32,
        br: f32,
    ) -> Self {
        Self::with_range(PowerRange::Unsigned, fl, fr, bl, br)
    }

    /// Build a vector in the given range, clamping each field independently.
    pub fn with_range(
        range: PowerRange,
        fl: f32,
        fr: f32,
        bl: f32,
        br: f32,
    ) -> Self {
        let mut p = PowerVector {
            fl: 0.0,
            fr: 0.0,
            bl: 0.0,
            br: 0.0,
            range,
        };
        p.set(fl, fr, bl, br);
        p
    }

    /// Build a two-wheel vector; the back fields default to zero.
    pub fn front(
        fl: f32,
        fr: f32,
    ) -> Self {
        Self::new(fl, fr, 0.0, 0.0)
    }

    /// Overwrite all four fields, re-clamping.
    pub fn set(
        &mut self,
        fl: f32,
        fr: f32,
        bl: f32,
        br: f32,
    ) {
        self.fl = self.range.clamp(fl);
        self.fr = self.range.clamp(fr);
        self.bl = self.range.clamp(bl);
        self.br = self.range.clamp(br);
    }

    /// Overwrite the front pair and zero the back pair.
    pub fn set_front(
        &mut self,
        fl: f32,
        fr: f32,
    ) {
        self.set(fl, fr, 0.0, 0.0);
    }

    /// Multiply every field by `factor`, then re-clamp.
    ///
    /// Used as a global speed limiter; the sign pattern of the move is kept.
    pub fn scale(
        &mut self,
        factor: f32,
    ) {
        self.set(
            self.fl * factor,
            self.fr * factor,
            self.bl * factor,
            self.br * factor,
        );
    }

    /// Consuming form of [`PowerVector::scale`].
    pub fn scaled(
        mut self,
        factor: f32,
    ) -> Self {
        self.scale(factor);
        self
    }

    /// `[fl, fr, bl, br]`
    pub fn values(&self) -> [f32; 4] {
        [self.fl, self.fr, self.bl, self.br]
    }

    pub fn fl(&self) -> f32 {
        self.fl
    }

    pub fn fr(&self) -> f32 {
        self.fr
    }

    pub fn bl(&self) -> f32 {
        self.bl
    }

    pub fn br(&self) -> f32 {
        self.br
    }

    pub fn range(&self) -> PowerRange {
        self.range
    }

    /// True when every field is zero.
    pub fn is_stop(&self) -> bool {
        self.values().iter().all(|&v| v == 0.0)
    }
}

impl Default for PowerVector {
    fn default() -> Self {
        Self::STOP
    }
}
