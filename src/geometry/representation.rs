//! Concrete geometric representations.
//!
//! The entity kind set is fixed and small (solid, curve, planar region), so
//! representations are a closed tagged variant with exhaustive matches
//! rather than open-ended trait objects.

use crate::error::{GeomError, Result};
use crate::types::{BoundingBox3D, Vector3};
use std::fmt;

/// Boundary mesh of a solid body.
///
/// A triangle mesh standing in for a full B-rep: shared vertex pool plus
/// index triples with counter-clockwise winding for outward-facing normals.
#[derive(Debug, Clone, PartialEq)]
pub struct SolidRep {
    /// Shared vertex pool
    pub vertices: Vec<Vector3>,
    /// Triangle index triples into `vertices`
    pub triangles: Vec<[u32; 3]>,
}

impl SolidRep {
    /// Create a solid from a vertex pool and triangle indices
    pub fn new(vertices: Vec<Vector3>, triangles: Vec<[u32; 3]>) -> Self {
        SolidRep {
            vertices,
            triangles,
        }
    }

    /// Build an axis-aligned cuboid between two opposite corners
    pub fn cuboid(min: Vector3, max: Vector3) -> Self {
        let v = vec![
            Vector3::new(min.x, min.y, min.z),
            Vector3::new(max.x, min.y, min.z),
            Vector3::new(max.x, max.y, min.z),
            Vector3::new(min.x, max.y, min.z),
            Vector3::new(min.x, min.y, max.z),
            Vector3::new(max.x, min.y, max.z),
            Vector3::new(max.x, max.y, max.z),
            Vector3::new(min.x, max.y, max.z),
        ];
        // Two triangles per face, outward winding
        let t = vec![
            [0, 2, 1],
            [0, 3, 2], // bottom (-z)
            [4, 5, 6],
            [4, 6, 7], // top (+z)
            [0, 1, 5],
            [0, 5, 4], // front (-y)
            [2, 3, 7],
            [2, 7, 6], // back (+y)
            [0, 4, 7],
            [0, 7, 3], // left (-x)
            [1, 2, 6],
            [1, 6, 5], // right (+x)
        ];
        SolidRep::new(v, t)
    }
}

/// A space curve approximated as a polyline.
#[derive(Debug, Clone, PartialEq)]
pub struct CurveRep {
    /// Points along the curve, in order
    pub points: Vec<Vector3>,
    /// Whether the last point connects back to the first
    pub closed: bool,
}

impl CurveRep {
    /// Create an open polyline curve
    pub fn from_points(points: Vec<Vector3>) -> Self {
        CurveRep {
            points,
            closed: false,
        }
    }

    /// Create a closed polyline curve
    pub fn closed(points: Vec<Vector3>) -> Self {
        CurveRep {
            points,
            closed: true,
        }
    }
}

/// A planar region bounded by a closed loop.
#[derive(Debug, Clone, PartialEq)]
pub struct RegionRep {
    /// Boundary loop, implicitly closed
    pub boundary: Vec<Vector3>,
}

impl RegionRep {
    /// Create a region from its boundary loop
    pub fn new(boundary: Vec<Vector3>) -> Self {
        RegionRep { boundary }
    }
}

/// Entity kind discriminant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RepKind {
    Solid,
    Curve,
    Region,
}

impl fmt::Display for RepKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Solid => write!(f, "solid"),
            Self::Curve => write!(f, "curve"),
            Self::Region => write!(f, "region"),
        }
    }
}

/// A concrete geometric representation of one entity version.
#[derive(Debug, Clone, PartialEq)]
pub enum Representation {
    Solid(SolidRep),
    Curve(CurveRep),
    Region(RegionRep),
}

impl Representation {
    /// Shorthand for a cuboid solid
    pub fn cuboid(min: Vector3, max: Vector3) -> Self {
        Representation::Solid(SolidRep::cuboid(min, max))
    }

    /// Shorthand for an open polyline curve
    pub fn polyline(points: Vec<Vector3>) -> Self {
        Representation::Curve(CurveRep::from_points(points))
    }

    /// The kind discriminant
    pub fn kind(&self) -> RepKind {
        match self {
            Representation::Solid(_) => RepKind::Solid,
            Representation::Curve(_) => RepKind::Curve,
            Representation::Region(_) => RepKind::Region,
        }
    }

    /// Reject degenerate inputs before they enter the database.
    ///
    /// A curve needs at least two points, a region at least three boundary
    /// points, and a solid at least one triangle over a non-empty vertex
    /// pool with in-range indices.
    pub fn validate(&self) -> Result<()> {
        match self {
            Representation::Solid(s) => {
                if s.vertices.is_empty() || s.triangles.is_empty() {
                    return Err(GeomError::precondition("solid has no geometry"));
                }
                let n = s.vertices.len() as u32;
                for tri in &s.triangles {
                    if tri.iter().any(|&i| i >= n) {
                        return Err(GeomError::precondition(format!(
                            "triangle index out of range ({} vertices)",
                            n
                        )));
                    }
                }
                Ok(())
            }
            Representation::Curve(c) => {
                if c.points.len() < 2 {
                    return Err(GeomError::precondition(
                        "curve needs at least two points",
                    ));
                }
                Ok(())
            }
            Representation::Region(r) => {
                if r.boundary.len() < 3 {
                    return Err(GeomError::precondition(
                        "region boundary needs at least three points",
                    ));
                }
                Ok(())
            }
        }
    }

    /// All points of the representation, for bounding queries
    pub fn points(&self) -> &[Vector3] {
        match self {
            Representation::Solid(s) => &s.vertices,
            Representation::Curve(c) => &c.points,
            Representation::Region(r) => &r.boundary,
        }
    }

    /// Axis-aligned bounding box, `None` for empty geometry
    pub fn bounding_box(&self) -> Option<BoundingBox3D> {
        BoundingBox3D::from_points(self.points())
    }
}
