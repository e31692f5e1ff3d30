use tracing::debug;

use crate::error::{GeometryError, HierarchyError, Result};
use crate::geometry::{Shell, Structure, TriangleMesh};
use crate::math::TOLERANCE;

/// Builds an enclosing paper shell for a set of structures.
pub trait ShellGenerator {
    /// Generates a closed, outward-wound shell around `structures`.
    ///
    /// # Errors
    ///
    /// Returns an error if the set is empty or its geometry is degenerate.
    fn generate(&self, structures: &[Structure]) -> Result<Shell>;
}

/// Axis-aligned hull of the structures, offset outward and linearly
/// subdivided so the unfolded layout has enough triangles to carry detail.
#[derive(Debug, Clone, Copy)]
pub struct BoundingBoxShell {
    /// Distance between the structures' bounds and the shell.
    pub offset: f64,
    /// Number of 1-to-4 subdivision passes.
    pub subdivisions: u32,
}

impl Default for BoundingBoxShell {
    fn default() -> Self {
        Self {
            offset: 15.0,
            subdivisions: 1,
        }
    }
}

impl BoundingBoxShell {
    /// Creates a generator with the given offset and subdivision count.
    #[must_use]
    pub fn new(offset: f64, subdivisions: u32) -> Self {
        Self {
            offset,
            subdivisions,
        }
    }
}

impl ShellGenerator for BoundingBoxShell {
    fn generate(&self, structures: &[Structure]) -> Result<Shell> {
        if structures.is_empty() {
            return Err(HierarchyError::EmptyStructureSet.into());
        }

        let bounds = structures
            .iter()
            .filter_map(|s| s.mesh().bounds())
            .reduce(|a, b| a.union(&b))
            .ok_or(GeometryError::EmptyMesh)?;
        let bounds = bounds.inflated(self.offset);

        let size = bounds.size();
        if size.min() < TOLERANCE {
            return Err(GeometryError::Degenerate(format!(
                "shell bounds are flat: {size:?}"
            ))
            .into());
        }

        let mut mesh = TriangleMesh::cuboid(bounds.min, bounds.max);
        for _ in 0..self.subdivisions {
            mesh = mesh.subdivided();
        }
        debug!(
            structures = structures.len(),
            triangles = mesh.triangle_count(),
            "generated shell"
        );
        Shell::from_mesh(mesh)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::math::Point3;
    use approx::assert_relative_eq;

    fn cube(name: &str, min: f64, max: f64) -> Structure {
        Structure::new(
            name,
            TriangleMesh::cuboid(Point3::new(min, min, min), Point3::new(max, max, max)),
        )
    }

    #[test]
    fn shell_is_offset_from_structures() {
        let shell = BoundingBoxShell::new(2.0, 0)
            .generate(&[cube("a", 0.0, 1.0), cube("b", 3.0, 4.0)])
            .unwrap();
        let b = shell.bounds().unwrap();
        assert_relative_eq!(b.min.x, -2.0);
        assert_relative_eq!(b.max.z, 6.0);
        assert_eq!(shell.triangle_count(), 12);
    }

    #[test]
    fn subdivision_multiplies_triangles() {
        let shell = BoundingBoxShell::new(1.0, 2)
            .generate(&[cube("a", 0.0, 1.0)])
            .unwrap();
        assert_eq!(shell.triangle_count(), 12 * 16);
    }

    #[test]
    fn empty_set_is_rejected() {
        assert!(BoundingBoxShell::default().generate(&[]).is_err());
    }

    #[test]
    fn flat_structure_without_offset_is_degenerate() {
        let flat = Structure::new(
            "flat",
            TriangleMesh::new(
                vec![
                    Point3::new(0.0, 0.0, 0.0),
                    Point3::new(1.0, 0.0, 0.0),
                    Point3::new(0.0, 1.0, 0.0),
                ],
                vec![[0, 1, 2]],
            )
            .unwrap(),
        );
        assert!(BoundingBoxShell::new(0.0, 0).generate(&[flat]).is_err());
    }
}
