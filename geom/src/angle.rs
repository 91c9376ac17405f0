use std::f64::consts::PI;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{deserialize_f64, serialize_f64};

/// An angle in radians, usually the bearing of a line segment. Since Pt2D's y
/// axis increases downwards (screen drawing order), increasing angles sweep
/// clockwise on screen.
#[derive(Clone, Copy, Debug, PartialEq, PartialOrd, Serialize, Deserialize)]
pub struct Angle(
    #[serde(serialize_with = "serialize_f64", deserialize_with = "deserialize_f64")] f64,
);

impl Angle {
    pub const ZERO: Angle = Angle(0.0);

    pub fn new_rads(rads: f64) -> Angle {
        Angle(rads)
    }

    pub fn new_degs(degs: f64) -> Angle {
        Angle(degs.to_radians())
    }

    pub fn opposite(self) -> Angle {
        Angle(self.0 + PI)
    }

    pub fn rotate_rads(self, rads: f64) -> Angle {
        Angle(self.0 + rads)
    }

    pub fn rotate_degs(self, degrees: f64) -> Angle {
        Angle(self.0 + degrees.to_radians())
    }

    /// In [0, 2pi).
    pub fn normalized_radians(self) -> f64 {
        self.0.rem_euclid(2.0 * PI)
    }

    /// In [0, 360).
    pub fn normalized_degrees(self) -> f64 {
        self.normalized_radians().to_degrees()
    }

    /// The signed rotation in radians taking self to other, in (-pi, pi].
    pub fn shortest_rotation_towards(self, other: Angle) -> f64 {
        let mut diff = (other.0 - self.0).rem_euclid(2.0 * PI);
        if diff > PI {
            diff -= 2.0 * PI;
        }
        diff
    }

    /// Halfway between the two angles, along the shorter way around.
    pub fn average(self, other: Angle) -> Angle {
        self.rotate_rads(self.shortest_rotation_towards(other) / 2.0)
    }

    pub fn approx_eq(self, other: Angle, within_degrees: f64) -> bool {
        self.shortest_rotation_towards(other).abs().to_degrees() <= within_degrees
    }
}

impl fmt::Display for Angle {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Angle({} degrees)", self.normalized_degrees())
    }
}
