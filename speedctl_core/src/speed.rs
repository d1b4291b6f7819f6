// Copyright 2026 the Subduction Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Playback speed domain type.

use core::fmt;

use serde::{Deserialize, Serialize};

/// A playback rate clamped to `[Speed::MIN, Speed::MAX]`.
///
/// The only way to build a `Speed` from an arbitrary number is
/// [`Speed::clamped`], so every value in circulation already satisfies the
/// domain bounds.
#[derive(Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(from = "f64", into = "f64")]
pub struct Speed(f64);

impl Speed {
    /// Slowest supported rate.
    pub const MIN: f64 = 0.1;
    /// Fastest supported rate.
    pub const MAX: f64 = 16.0;
    /// Native playback rate.
    pub const NORMAL: Self = Self(1.0);

    /// Clamps `requested` into the supported domain.
    ///
    /// `NaN` maps to [`Speed::NORMAL`]; infinities clamp to the nearest bound.
    #[must_use]
    pub fn clamped(requested: f64) -> Self {
        if requested.is_nan() {
            return Self::NORMAL;
        }
        Self(requested.clamp(Self::MIN, Self::MAX))
    }

    /// Returns the raw rate.
    #[inline]
    #[must_use]
    pub const fn get(self) -> f64 {
        self.0
    }

    /// Returns `self + delta`, rounded to hundredths, then clamped.
    ///
    /// Rounding keeps repeated `0.1` steps from drifting into values like
    /// `1.2000000000000002`.
    #[must_use]
    pub fn stepped(self, delta: f64) -> Self {
        Self::clamped(round_hundredths(self.0 + delta))
    }

    /// Returns `true` if this is the native rate.
    #[must_use]
    pub fn is_normal(self) -> bool {
        self.approx_eq(Self::NORMAL.0)
    }

    /// Returns `true` if `rate` is within rounding noise of this speed.
    ///
    /// Browsers may store `playbackRate` with reduced precision, so exact
    /// comparison would make rate restoration loop.
    #[must_use]
    pub fn approx_eq(self, rate: f64) -> bool {
        (self.0 - rate).abs() < 1e-6
    }

    /// Formats the speed for the overlay label, e.g. `1.25x`.
    #[must_use]
    pub fn label(self) -> alloc::string::String {
        alloc::format!("{:.2}x", self.0)
    }
}

impl Default for Speed {
    fn default() -> Self {
        Self::NORMAL
    }
}

impl From<f64> for Speed {
    fn from(value: f64) -> Self {
        Self::clamped(value)
    }
}

impl From<Speed> for f64 {
    fn from(value: Speed) -> Self {
        value.0
    }
}

impl fmt::Debug for Speed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Speed({})", self.0)
    }
}

#[expect(
    clippy::cast_possible_truncation,
    reason = "inputs are rate-scale values; i64 holds them exactly"
)]
fn round_hundredths(value: f64) -> f64 {
    if !value.is_finite() {
        return value;
    }
    let scaled = value * 100.0;
    let rounded = if scaled >= 0.0 {
        (scaled + 0.5) as i64
    } else {
        (scaled - 0.5) as i64
    };
    rounded as f64 / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clamp_matches_min_max_formula() {
        for r in [-3.0, 0.0, 0.05, 0.1, 0.5, 1.0, 2.5, 16.0, 16.01, 100.0] {
            let expected = f64::max(0.1, f64::min(r, 16.0));
            assert_eq!(
                Speed::clamped(r).get(),
                expected,
                "clamp({r}) should be max(0.1, min(r, 16))"
            );
        }
    }

    #[test]
    fn non_finite_inputs() {
        assert_eq!(Speed::clamped(f64::NAN), Speed::NORMAL, "NaN is normal");
        assert_eq!(Speed::clamped(f64::INFINITY).get(), 16.0, "+inf clamps");
        assert_eq!(Speed::clamped(f64::NEG_INFINITY).get(), 0.1, "-inf clamps");
    }

    #[test]
    fn stepping_rounds_and_clamps() {
        let mut s = Speed::NORMAL;
        for _ in 0..5 {
            s = s.stepped(0.1);
        }
        assert_eq!(s.get(), 1.5, "five 0.1 steps land exactly on 1.5");
        assert_eq!(Speed::clamped(0.15).stepped(-0.1).get(), 0.1, "floor");
        assert_eq!(Speed::clamped(15.95).stepped(0.1).get(), 16.0, "ceiling");
    }

    #[test]
    fn label_has_two_decimals() {
        assert_eq!(Speed::NORMAL.label(), "1.00x", "normal label");
        assert_eq!(Speed::clamped(1.25).label(), "1.25x", "quarter label");
    }

    #[test]
    fn serde_goes_through_clamp() {
        let s: Speed = serde_json::from_str("42.0").expect("number");
        assert_eq!(s.get(), 16.0, "deserialized speeds are clamped");
        assert_eq!(
            serde_json::to_string(&Speed::clamped(1.5)).expect("serialize"),
            "1.5",
            "serializes as a bare number"
        );
    }
}
