//! Whole-degree headings.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A heading in whole degrees, always normalized to `[0, 360)`.
///
/// Construction and rotation wrap in both directions, so `Angle::new(-1)`
/// is 359 degrees and `Angle::new(360)` is 0.
///
/// ```
/// use robosim_core::agent::Angle;
///
/// assert_eq!(Angle::new(-1).degrees(), 359);
/// assert_eq!(Angle::new(359).rotated(2).degrees(), 1);
/// ```
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "i64", into = "u16")]
pub struct Angle(u16);

impl Angle {
    /// Zero degrees, facing +x.
    pub const ZERO: Self = Self(0);

    /// Creates an angle from any integer number of degrees.
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub const fn new(degrees: i64) -> Self {
        // rem_euclid keeps the value in 0..360, which fits in u16
        Self(degrees.rem_euclid(360) as u16)
    }

    /// Returns the normalized degree value.
    #[must_use]
    pub const fn degrees(self) -> u16 {
        self.0
    }

    /// Returns the heading as floating-point degrees.
    #[must_use]
    pub fn as_f64(self) -> f64 {
        f64::from(self.0)
    }

    /// Rotates by `delta` degrees, wrapping.
    #[must_use]
    pub const fn rotated(self, delta: i32) -> Self {
        Self::new(self.0 as i64 + delta as i64)
    }

    /// Moves one degree along the shorter arc toward `target`.
    ///
    /// Returns `self` unchanged once the two are equal. A half-turn gap is
    /// closed clockwise (+1).
    #[must_use]
    pub fn step_toward(self, target: Self) -> Self {
        match self.gap_to(target) {
            0 => self,
            1..=180 => self.rotated(1),
            _ => self.rotated(-1),
        }
    }

    /// Clockwise distance in degrees from `self` to `target`, in `[0, 360)`.
    #[must_use]
    pub fn gap_to(self, target: Self) -> u16 {
        Self::new(i64::from(target.0) - i64::from(self.0)).0
    }
}

impl From<i64> for Angle {
    fn from(degrees: i64) -> Self {
        Self::new(degrees)
    }
}

impl From<Angle> for u16 {
    fn from(angle: Angle) -> Self {
        angle.0
    }
}

impl fmt::Display for Angle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}°", self.0)
    }
}
