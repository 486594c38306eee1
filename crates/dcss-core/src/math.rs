//! Grid coordinates and the vector helpers used by the sub-tile stepper

use core::ops::{Add, Sub};

use glam::DVec2;
use serde::{Deserialize, Serialize};

/// Vectors shorter than this are left alone by [`normalise`]
pub const NORMALISE_EPSILON: f64 = 0.000001;

/// Chord length of roughly 97 degrees on the unit circle
pub const STICKY_CHORD: f64 = 1.5;

/// Chord length of roughly 17 degrees on the unit circle
pub const VEER_CHORD: f64 = 0.3;

/// How hard an orb turns toward its target in one step
pub const VEER_RATE: f64 = 0.3;

/// A discrete grid cell
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Coord {
    pub x: i32,
    pub y: i32,
}

impl Coord {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Cell centre as a sub-tile position
    pub fn as_vec(self) -> DVec2 {
        DVec2::new(self.x as f64, self.y as f64)
    }

    /// Chebyshev distance (number of king moves)
    pub fn grid_distance(self, other: Coord) -> i32 {
        (self.x - other.x).abs().max((self.y - other.y).abs())
    }

    /// Squared Euclidean distance
    pub fn distance_sq(self, other: Coord) -> i32 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        dx * dx + dy * dy
    }
}

impl Add for Coord {
    type Output = Coord;

    fn add(self, rhs: Coord) -> Coord {
        Coord::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl Sub for Coord {
    type Output = Coord;

    fn sub(self, rhs: Coord) -> Coord {
        Coord::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl core::fmt::Display for Coord {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "({},{})", self.x, self.y)
    }
}

/// Scale a vector to unit length; near-zero vectors are returned unchanged.
pub fn normalise(v: DVec2) -> DVec2 {
    let d = v.length();
    if d <= NORMALISE_EPSILON {
        return v;
    }
    v / d
}

/// Whether unit vector `v` lies within `chord` of unit vector `d`.
///
/// The angle is measured as chord length, which avoids inverse trig.
pub fn in_front(v: DVec2, d: DVec2, chord: f64) -> bool {
    (d - v).length_squared() <= chord * chord
}

/// Nearest cell to a sub-tile position. Halves round away from zero.
pub fn round_to_cell(p: DVec2) -> Coord {
    Coord::new(p.x.round() as i32, p.y.round() as i32)
}

/// Diminishing returns: every `stepping` above `first_step` counts half as
/// much as the one before, up to `last_step`. A `ceiling` of -1 means none.
pub fn stepdown_value(base: i32, stepping: i32, first_step: i32, last_step: i32, ceiling: i32) -> i32 {
    let mut value = base;
    if value <= first_step {
        return value;
    }

    let mut step = first_step;
    while step <= last_step {
        if value > step {
            value = (value - step) / 2 + step;
        } else {
            break;
        }
        step += stepping;
    }

    if ceiling != -1 && value > ceiling {
        return ceiling;
    }
    value
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalise_unit_length() {
        let v = normalise(DVec2::new(3.0, 4.0));
        assert!((v.x - 0.6).abs() < 1e-12);
        assert!((v.y - 0.8).abs() < 1e-12);
    }

    #[test]
    fn test_normalise_zero_is_noop() {
        assert_eq!(normalise(DVec2::ZERO), DVec2::ZERO);
        let tiny = DVec2::new(1e-9, -1e-9);
        assert_eq!(normalise(tiny), tiny);
    }

    #[test]
    fn test_in_front_angles() {
        let east = DVec2::new(1.0, 0.0);
        let south = DVec2::new(0.0, 1.0);
        let west = DVec2::new(-1.0, 0.0);
        // 90 degrees is inside the sticky cone but outside the veer cone
        assert!(in_front(east, south, STICKY_CHORD));
        assert!(!in_front(east, south, VEER_CHORD));
        assert!(!in_front(east, west, STICKY_CHORD));
        assert!(in_front(east, east, VEER_CHORD));
    }

    #[test]
    fn test_round_to_cell_half_away_from_zero() {
        assert_eq!(round_to_cell(DVec2::new(10.5, 10.49)), Coord::new(11, 10));
        assert_eq!(round_to_cell(DVec2::new(-0.5, 2.5)), Coord::new(-1, 3));
        assert_eq!(round_to_cell(DVec2::new(10.6, 10.8)), Coord::new(11, 11));
    }

    #[test]
    fn test_stepdown_value() {
        assert_eq!(stepdown_value(20, 30, 30, 200, -1), 20);
        assert_eq!(stepdown_value(30, 30, 30, 200, -1), 30);
        assert_eq!(stepdown_value(50, 30, 30, 200, -1), 40);
        // 100 -> 65 -> 62
        assert_eq!(stepdown_value(100, 30, 30, 200, -1), 62);
        assert_eq!(stepdown_value(100, 30, 30, 200, 50), 50);
    }

    #[test]
    fn test_coord_distances() {
        let a = Coord::new(1, 1);
        let b = Coord::new(4, 3);
        assert_eq!(a.grid_distance(b), 3);
        assert_eq!(a.distance_sq(b), 13);
        assert_eq!(b - a, Coord::new(3, 2));
    }
}
