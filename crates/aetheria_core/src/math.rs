//! Fixed-point math utilities for deterministic simulation.
//!
//! Entity positions and velocities are fixed-point so that integration,
//! docking range checks and packed state are bit-exact across platforms.
//! Gear stats stay `f32`; they enter the kinematic state only through
//! [`fixed_from_f32`], which saturates instead of panicking.

use fixed::types::I32F32;
use serde::{Deserialize, Serialize};

/// Fixed-point number type for positions and velocities.
///
/// Uses 32 bits for integer part and 32 bits for fractional part.
/// Range: approximately -2,147,483,648 to 2,147,483,647
/// Precision: approximately 0.00000000023
pub type Fixed = I32F32;

/// Fixed-point 2D vector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Vec2Fixed {
    /// X coordinate.
    #[serde(with = "fixed_serde")]
    pub x: Fixed,
    /// Y coordinate.
    #[serde(with = "fixed_serde")]
    pub y: Fixed,
}

/// Serde support for fixed-point numbers.
///
/// Serializes fixed-point numbers as their raw bit representation (i64)
/// to preserve exact precision across serialization boundaries.
pub mod fixed_serde {
    use super::Fixed;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    /// Serialize a fixed-point number as its raw bit representation.
    pub fn serialize<S>(value: &Fixed, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        value.to_bits().serialize(serializer)
    }

    /// Deserialize a fixed-point number from its raw bit representation.
    pub fn deserialize<'de, D>(deserializer: D) -> Result<Fixed, D::Error>
    where
        D: Deserializer<'de>,
    {
        let bits = i64::deserialize(deserializer)?;
        Ok(Fixed::from_bits(bits))
    }
}

/// Convert an `f32` into [`Fixed`], saturating at the representable range.
///
/// NaN maps to zero.
#[must_use]
pub fn fixed_from_f32(value: f32) -> Fixed {
    if value.is_nan() {
        return Fixed::ZERO;
    }
    Fixed::saturating_from_num(value)
}

impl Vec2Fixed {
    /// Create a new fixed-point vector.
    #[must_use]
    pub const fn new(x: Fixed, y: Fixed) -> Self {
        Self { x, y }
    }

    /// Zero vector.
    pub const ZERO: Self = Self {
        x: Fixed::ZERO,
        y: Fixed::ZERO,
    };

    /// Create a vector from floating-point components, saturating.
    #[must_use]
    pub fn from_f32(x: f32, y: f32) -> Self {
        Self::new(fixed_from_f32(x), fixed_from_f32(y))
    }

    /// Create a vector from double-precision components, saturating.
    #[must_use]
    pub fn from_f64(x: f64, y: f64) -> Self {
        let conv = |v: f64| {
            if v.is_nan() {
                Fixed::ZERO
            } else {
                Fixed::saturating_from_num(v)
            }
        };
        Self::new(conv(x), conv(y))
    }

    /// Components as `f32`, for handing to presentation code.
    #[must_use]
    pub fn to_f32(self) -> (f32, f32) {
        (self.x.to_num(), self.y.to_num())
    }

    /// Calculate squared distance (avoids sqrt for comparisons).
    #[must_use]
    pub fn distance_squared(self, other: Self) -> Fixed {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        dx.saturating_mul(dx).saturating_add(dy.saturating_mul(dy))
    }

    /// Distance between two points.
    #[must_use]
    pub fn distance(self, other: Self) -> Fixed {
        fixed_sqrt(self.distance_squared(other))
    }

    /// Dot product of two vectors.
    #[must_use]
    pub fn dot(self, other: Self) -> Fixed {
        self.x
            .saturating_mul(other.x)
            .saturating_add(self.y.saturating_mul(other.y))
    }

    /// Vector length.
    #[must_use]
    pub fn length(self) -> Fixed {
        fixed_sqrt(self.dot(self))
    }

    /// Multiply both components by a scalar.
    #[must_use]
    pub fn scale(self, factor: Fixed) -> Self {
        Self {
            x: self.x.saturating_mul(factor),
            y: self.y.saturating_mul(factor),
        }
    }

    /// Linearly interpolate between two vectors.
    #[must_use]
    pub fn lerp(self, other: Self, t: Fixed) -> Self {
        Self {
            x: self.x + (other.x - self.x) * t,
            y: self.y + (other.y - self.y) * t,
        }
    }

    /// Normalize vector using fixed-point math.
    #[must_use]
    pub fn normalize(self) -> Self {
        let len = self.length();
        if len == Fixed::ZERO {
            return Self::ZERO;
        }

        Self::new(self.x / len, self.y / len)
    }

    /// Shorten the vector to `max` if it is longer, keeping its direction.
    #[must_use]
    pub fn clamp_length(self, max: Fixed) -> Self {
        let len = self.length();
        if len <= max || len == Fixed::ZERO {
            return self;
        }
        self.scale(max / len)
    }
}

/// Computes the square root of a fixed-point number using binary search.
#[must_use]
pub fn fixed_sqrt(value: Fixed) -> Fixed {
    if value <= Fixed::ZERO {
        return Fixed::ZERO;
    }

    let mut low = Fixed::ZERO;
    let mut high = if value > Fixed::from_num(1) {
        value
    } else {
        Fixed::from_num(1)
    };

    for _ in 0..64 {
        let mid = low + (high - low) / Fixed::from_num(2);
        let mid_sq = mid.saturating_mul(mid);

        if mid_sq <= value {
            low = mid;
        } else {
            high = mid;
        }
    }

    low
}

impl std::ops::Add for Vec2Fixed {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Self {
            x: self.x.saturating_add(rhs.x),
            y: self.y.saturating_add(rhs.y),
        }
    }
}

impl std::ops::AddAssign for Vec2Fixed {
    fn add_assign(&mut self, rhs: Self) {
        *self = *self + rhs;
    }
}

impl std::ops::Sub for Vec2Fixed {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self::Output {
        Self {
            x: self.x.saturating_sub(rhs.x),
            y: self.y.saturating_sub(rhs.y),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vec2_distance_squared() {
        let a = Vec2Fixed::new(Fixed::from_num(3), Fixed::from_num(0));
        let b = Vec2Fixed::new(Fixed::from_num(0), Fixed::from_num(4));
        assert_eq!(a.distance_squared(b), Fixed::from_num(25));
    }

    #[test]
    fn test_vec2_distance() {
        let a = Vec2Fixed::new(Fixed::from_num(3), Fixed::from_num(0));
        let b = Vec2Fixed::new(Fixed::from_num(0), Fixed::from_num(4));
        let d: f64 = a.distance(b).to_num();
        assert!((d - 5.0).abs() < 1e-6);
    }

    #[test]
    fn test_fixed_from_f32_saturates() {
        assert_eq!(fixed_from_f32(f32::NAN), Fixed::ZERO);
        assert_eq!(fixed_from_f32(f32::INFINITY), Fixed::MAX);
        assert_eq!(fixed_from_f32(1e20), Fixed::MAX);
        assert_eq!(fixed_from_f32(-1e20), Fixed::MIN);
        assert_eq!(fixed_from_f32(2.5), Fixed::from_num(2.5));
    }

    #[test]
    fn test_vec2_scale_and_add() {
        let mut p = Vec2Fixed::from_f32(1.0, 2.0);
        p += Vec2Fixed::from_f32(2.0, -4.0).scale(Fixed::from_num(0.5));
        assert_eq!(p, Vec2Fixed::from_f32(2.0, 0.0));
    }

    #[test]
    fn test_vec2_clamp_length() {
        let v = Vec2Fixed::from_f32(30.0, 40.0);
        let clamped = v.clamp_length(Fixed::from_num(5));
        let len: f64 = clamped.length().to_num();
        assert!((len - 5.0).abs() < 1e-4);

        let short = Vec2Fixed::from_f32(1.0, 0.0);
        assert_eq!(short.clamp_length(Fixed::from_num(5)), short);
    }

    #[test]
    fn test_vec2_normalize() {
        let v = Vec2Fixed::new(Fixed::from_num(3), Fixed::from_num(4));
        let norm = v.normalize();
        let len_sq: f64 = norm.dot(norm).to_num();
        assert!((len_sq - 1.0).abs() < 1e-6);
        assert_eq!(Vec2Fixed::ZERO.normalize(), Vec2Fixed::ZERO);
    }

    #[test]
    fn test_fixed_sqrt_small_values() {
        let r: f64 = fixed_sqrt(Fixed::from_num(0.25)).to_num();
        assert!((r - 0.5).abs() < 1e-6);
        assert_eq!(fixed_sqrt(Fixed::from_num(-1)), Fixed::ZERO);
    }
}
