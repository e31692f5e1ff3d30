use crate::geometry::{Shell, TriangleMesh};
use crate::math::{ray_triangle_intersect, Point3, RayHit, Vector3};

/// Geometric predicate deciding whether one closed surface lies fully
/// inside another.
///
/// Inputs are assumed to be either nested or disjoint; partially overlapping
/// or touching surfaces are a precondition violation and may answer either
/// way.
pub trait ContainmentOracle {
    /// Returns `true` iff `inner` lies fully inside `outer`.
    fn contains(&self, outer: &Shell, inner: &Shell) -> bool;
}

impl<F> ContainmentOracle for F
where
    F: Fn(&Shell, &Shell) -> bool,
{
    fn contains(&self, outer: &Shell, inner: &Shell) -> bool {
        self(outer, inner)
    }
}

/// Containment by ray-parity classification of every inner vertex.
///
/// A vertex is inside when a ray from it crosses the outer surface an odd
/// number of times. Rays that graze an edge are retried along the next
/// direction; a vertex for which every direction is degenerate counts as on
/// the boundary, i.e. not inside.
#[derive(Debug, Clone)]
pub struct RayParityContainment {
    /// Barycentric tolerance under which a hit counts as grazing an edge.
    pub edge_tolerance: f64,
}

impl Default for RayParityContainment {
    fn default() -> Self {
        Self {
            edge_tolerance: 1e-9,
        }
    }
}

impl RayParityContainment {
    // Skewed directions avoid the axis-aligned diagonals of box shells.
    const DIRECTIONS: [[f64; 3]; 4] = [
        [1.0, 0.237_1, 0.109_3],
        [0.131_7, 1.0, 0.271_9],
        [0.193_1, 0.317_3, 1.0],
        [-0.612_9, -0.421_7, 0.761_3],
    ];

    /// Classifies `point` against `mesh`: `Some(true)` inside, `Some(false)`
    /// outside, `None` if every ray was degenerate.
    #[must_use]
    pub fn classify(&self, point: &Point3, mesh: &TriangleMesh) -> Option<bool> {
        'directions: for d in &Self::DIRECTIONS {
            let dir = Vector3::new(d[0], d[1], d[2]).normalize();
            let mut crossings = 0u32;
            for tri in mesh.triangles() {
                match ray_triangle_intersect(point, &dir, &tri, self.edge_tolerance) {
                    RayHit::Hit { .. } => crossings += 1,
                    RayHit::Miss => {}
                    RayHit::Degenerate => continue 'directions,
                }
            }
            return Some(crossings % 2 == 1);
        }
        None
    }
}

impl ContainmentOracle for RayParityContainment {
    fn contains(&self, outer: &Shell, inner: &Shell) -> bool {
        let (Some(ob), Some(ib)) = (outer.bounds(), inner.bounds()) else {
            return false;
        };
        let inside_bounds = (0..3).all(|axis| ib.min[axis] > ob.min[axis] && ib.max[axis] < ob.max[axis]);
        if !inside_bounds {
            return false;
        }
        inner
            .mesh()
            .vertices
            .iter()
            .all(|v| self.classify(v, outer.mesh()) == Some(true))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn cube(half: f64, center: [f64; 3]) -> Shell {
        let c = Point3::new(center[0], center[1], center[2]);
        let d = Vector3::repeat(half);
        Shell::from_mesh(TriangleMesh::cuboid(c - d, c + d)).unwrap()
    }

    #[test]
    fn classifies_center_and_far_point() {
        let oracle = RayParityContainment::default();
        let outer = cube(2.0, [0.0; 3]);
        assert_eq!(oracle.classify(&Point3::origin(), outer.mesh()), Some(true));
        assert_eq!(
            oracle.classify(&Point3::new(5.0, 0.0, 0.0), outer.mesh()),
            Some(false)
        );
    }

    #[test]
    fn vertex_on_face_diagonal_is_still_classified() {
        let oracle = RayParityContainment::default();
        let outer = cube(10.0, [0.0; 3]);
        // Equal coordinates put axis-aligned rays on the face diagonals.
        let p = Point3::new(1.5, 1.5, 1.5);
        assert_eq!(oracle.classify(&p, outer.mesh()), Some(true));
    }

    #[test]
    fn nested_cube_is_contained() {
        let oracle = RayParityContainment::default();
        assert!(oracle.contains(&cube(10.0, [0.0; 3]), &cube(1.0, [0.0; 3])));
        assert!(oracle.contains(&cube(10.0, [0.0; 3]), &cube(1.0, [5.0, 5.0, -5.0])));
    }

    #[test]
    fn containment_is_not_symmetric() {
        let oracle = RayParityContainment::default();
        assert!(!oracle.contains(&cube(1.0, [0.0; 3]), &cube(10.0, [0.0; 3])));
    }

    #[test]
    fn disjoint_cubes_are_not_contained() {
        let oracle = RayParityContainment::default();
        assert!(!oracle.contains(&cube(1.0, [0.0; 3]), &cube(1.0, [50.0, 0.0, 0.0])));
    }

    #[test]
    fn closures_are_oracles() {
        let always = |_: &Shell, _: &Shell| true;
        assert!(always.contains(&cube(1.0, [0.0; 3]), &cube(1.0, [9.0; 3])));
    }
}
