//! Mirror plane for the symmetry modifier

use super::Vector3;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Tolerance below which a plane normal is considered degenerate
pub const NORMAL_EPSILON: f64 = 1e-9;

/// An oriented plane given by a point and a normal
///
/// Used as the parameter of the symmetry modifier. The normal does not have
/// to be unit length; it is normalized on use. A near-zero normal is a
/// degenerate plane and is rejected by the kernel.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Plane {
    /// A point on the plane
    pub origin: Vector3,
    /// Plane normal (need not be unit length)
    pub normal: Vector3,
}

impl Plane {
    /// Create a plane from a point and a normal
    pub const fn new(origin: Vector3, normal: Vector3) -> Self {
        Plane { origin, normal }
    }

    /// The YZ plane through the origin (mirrors X to -X)
    pub const YZ: Plane = Plane::new(Vector3::ZERO, Vector3::UNIT_X);

    /// The XZ plane through the origin (mirrors Y to -Y)
    pub const XZ: Plane = Plane::new(Vector3::ZERO, Vector3::UNIT_Y);

    /// The XY plane through the origin (mirrors Z to -Z)
    pub const XY: Plane = Plane::new(Vector3::ZERO, Vector3::UNIT_Z);

    /// Check whether the plane normal is too short to define a mirror
    pub fn is_degenerate(&self) -> bool {
        self.normal.length_squared() < NORMAL_EPSILON * NORMAL_EPSILON
    }

    /// Reflect a point across the plane
    ///
    /// The caller must have rejected degenerate planes first.
    pub fn reflect(&self, point: Vector3) -> Vector3 {
        let n = self.normal.normalize();
        let d = (point - self.origin).dot(&n);
        point - n * (2.0 * d)
    }

    /// Signed distance from a point to the plane
    pub fn signed_distance(&self, point: Vector3) -> f64 {
        (point - self.origin).dot(&self.normal.normalize())
    }
}

impl Default for Plane {
    fn default() -> Self {
        Plane::YZ
    }
}

impl fmt::Display for Plane {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Plane[origin {}, normal {}]", self.origin, self.normal)
    }
}
