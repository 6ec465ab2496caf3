//! Geometric kernel operations.
//!
//! The kernel is the only place representations are transformed. Operations
//! take a [`CancellationToken`] and poll it around bulk work; point
//! transforms run in parallel under rayon.

use crate::compute::CancellationToken;
use crate::error::{GeomError, Result};
use crate::types::{Plane, Vector3};
use rayon::prelude::*;

use super::representation::{CurveRep, RegionRep, Representation, SolidRep};

fn reflect_points(points: &[Vector3], plane: &Plane) -> Vec<Vector3> {
    points.par_iter().map(|p| plane.reflect(*p)).collect()
}

/// Mirror a representation across a plane.
///
/// Curves and regions yield the reflected geometry. Solids yield the
/// symmetrized body: the base joined with its reflection, with the winding
/// of reflected triangles flipped so normals stay outward.
pub fn apply_symmetry(
    rep: &Representation,
    plane: &Plane,
    token: &CancellationToken,
) -> Result<Representation> {
    if plane.is_degenerate() {
        return Err(GeomError::Computation(format!(
            "degenerate mirror plane {plane}"
        )));
    }
    token.check()?;

    let result = match rep {
        Representation::Solid(s) => {
            let offset = s.vertices.len() as u32;
            let mut vertices = s.vertices.clone();
            vertices.extend(reflect_points(&s.vertices, plane));

            let mut triangles = s.triangles.clone();
            triangles.extend(
                s.triangles
                    .iter()
                    .map(|[a, b, c]| [c + offset, b + offset, a + offset]),
            );
            Representation::Solid(SolidRep::new(vertices, triangles))
        }
        Representation::Curve(c) => Representation::Curve(CurveRep {
            points: reflect_points(&c.points, plane),
            closed: c.closed,
        }),
        Representation::Region(r) => {
            Representation::Region(RegionRep::new(reflect_points(&r.boundary, plane)))
        }
    };

    token.check()?;
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit_cube() -> Representation {
        Representation::cuboid(Vector3::ZERO, Vector3::new(1.0, 1.0, 1.0))
    }

    #[test]
    fn test_symmetrized_solid_spans_mirror() {
        let token = CancellationToken::new();
        let result = apply_symmetry(&unit_cube(), &Plane::YZ, &token).unwrap();
        let bbox = result.bounding_box().unwrap();
        assert_eq!(bbox.min, Vector3::new(-1.0, 0.0, 0.0));
        assert_eq!(bbox.max, Vector3::new(1.0, 1.0, 1.0));
        // Symmetrized solid keeps the base and adds the reflection.
        match result {
            Representation::Solid(s) => {
                assert_eq!(s.vertices.len(), 16);
                assert_eq!(s.triangles.len(), 24);
            }
            _ => panic!("expected a solid"),
        }
    }

    #[test]
    fn test_mirror_curve() {
        let token = CancellationToken::new();
        let curve = Representation::polyline(vec![
            Vector3::new(1.0, 0.0, 0.0),
            Vector3::new(2.0, 1.0, 0.0),
        ]);
        let mirrored = apply_symmetry(&curve, &Plane::YZ, &token).unwrap();
        assert_eq!(
            mirrored.points(),
            &[Vector3::new(-1.0, 0.0, 0.0), Vector3::new(-2.0, 1.0, 0.0)]
        );
    }

    #[test]
    fn test_degenerate_plane_fails() {
        let token = CancellationToken::new();
        let plane = Plane::new(Vector3::ZERO, Vector3::ZERO);
        let err = apply_symmetry(&unit_cube(), &plane, &token).unwrap_err();
        assert!(matches!(err, GeomError::Computation(_)));
    }

    #[test]
    fn test_cancelled_token_aborts() {
        let token = CancellationToken::new();
        token.cancel();
        assert!(apply_symmetry(&unit_cube(), &Plane::YZ, &token).is_err());
    }

}
