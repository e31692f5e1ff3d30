use super::TriangleMesh;
use crate::error::{GeometryError, Result};
use crate::math::{triangle_centroid, triangle_normal, Bounds3, Point3, Vector3};

/// A closed, paper-thin surface wrapping one or more structures.
///
/// Triangles are wound counter-clockwise when seen from outside, so
/// [`Shell::outward_normal`] points away from the enclosed structures.
#[derive(Debug, Clone, PartialEq)]
pub struct Shell {
    mesh: TriangleMesh,
}

impl Shell {
    /// Wraps an outward-wound triangle mesh.
    ///
    /// # Errors
    ///
    /// Returns `GeometryError::EmptyMesh` if the mesh has no triangles and
    /// `GeometryError::IndexOutOfRange` if an index does not refer to a
    /// vertex.
    pub fn from_mesh(mesh: TriangleMesh) -> Result<Self> {
        if mesh.is_empty() {
            return Err(GeometryError::EmptyMesh.into());
        }
        mesh.validate()?;
        Ok(Self { mesh })
    }

    #[must_use]
    pub fn mesh(&self) -> &TriangleMesh {
        &self.mesh
    }

    #[must_use]
    pub fn triangle_count(&self) -> usize {
        self.mesh.triangle_count()
    }

    /// Corner positions of triangle `index`.
    ///
    /// # Errors
    ///
    /// Returns `GeometryError::IndexOutOfRange` if the triangle does not exist.
    pub fn triangle(&self, index: usize) -> Result<[Point3; 3]> {
        self.mesh.triangle(index).ok_or_else(|| {
            #[allow(clippy::cast_possible_truncation)]
            let index = index as u32;
            GeometryError::IndexOutOfRange {
                index,
                count: self.mesh.triangle_count(),
            }
            .into()
        })
    }

    /// Centroid of triangle `index`.
    ///
    /// # Errors
    ///
    /// Returns an error if the triangle does not exist.
    pub fn centroid(&self, index: usize) -> Result<Point3> {
        Ok(triangle_centroid(&self.triangle(index)?))
    }

    /// Unit normal of triangle `index`, pointing out of the shell.
    ///
    /// # Errors
    ///
    /// Returns an error if the triangle does not exist or is degenerate.
    pub fn outward_normal(&self, index: usize) -> Result<Vector3> {
        triangle_normal(&self.triangle(index)?)
    }

    #[must_use]
    pub fn bounds(&self) -> Option<Bounds3> {
        self.mesh.bounds()
    }
}
