use crate::error::{GeometryError, Result};
use crate::math::{Bounds3, Point3};

/// An indexed triangle mesh.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TriangleMesh {
    /// Vertex positions.
    pub vertices: Vec<Point3>,
    /// Triangle indices (each triple defines a triangle).
    pub indices: Vec<[u32; 3]>,
}

impl TriangleMesh {
    /// Creates a mesh from vertices and triangle indices.
    ///
    /// # Errors
    ///
    /// Returns `GeometryError::IndexOutOfRange` if any index does not refer
    /// to a vertex.
    pub fn new(vertices: Vec<Point3>, indices: Vec<[u32; 3]>) -> Result<Self> {
        let mesh = Self { vertices, indices };
        mesh.validate()?;
        Ok(mesh)
    }

    /// Checks that every index refers to a vertex. The fields are public, so
    /// a mesh assembled by hand may not hold this.
    ///
    /// # Errors
    ///
    /// Returns `GeometryError::IndexOutOfRange` for the first bad index.
    pub fn validate(&self) -> Result<()> {
        let count = self.vertices.len();
        if let Some(&index) = self
            .indices
            .iter()
            .flatten()
            .find(|&&i| i as usize >= count)
        {
            return Err(GeometryError::IndexOutOfRange { index, count }.into());
        }
        Ok(())
    }

    fn is_valid_triangle(&self, tri: &[u32; 3]) -> bool {
        tri.iter().all(|&i| (i as usize) < self.vertices.len())
    }

    /// Number of triangles.
    #[must_use]
    pub fn triangle_count(&self) -> usize {
        self.indices.len()
    }

    /// Returns `true` if the mesh has no triangles.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    /// Returns the corner positions of triangle `index`, or `None` if it does
    /// not exist.
    #[must_use]
    pub fn triangle(&self, index: usize) -> Option<[Point3; 3]> {
        let [a, b, c] = *self.indices.get(index)?;
        Some([
            *self.vertices.get(a as usize)?,
            *self.vertices.get(b as usize)?,
            *self.vertices.get(c as usize)?,
        ])
    }

    /// Iterates over all triangles as corner triples. Triangles with an index
    /// out of range are skipped.
    pub fn triangles(&self) -> impl Iterator<Item = [Point3; 3]> + '_ {
        self.indices.iter().filter_map(move |&[a, b, c]| {
            Some([
                *self.vertices.get(a as usize)?,
                *self.vertices.get(b as usize)?,
                *self.vertices.get(c as usize)?,
            ])
        })
    }

    /// Axis-aligned bounds of the vertices.
    #[must_use]
    pub fn bounds(&self) -> Option<Bounds3> {
        Bounds3::from_points(&self.vertices)
    }

    /// Splits every triangle into four by inserting edge midpoints.
    ///
    /// Midpoints are shared between neighbouring triangles, so a closed mesh
    /// stays closed and keeps its winding. Triangles with an index out of
    /// range are dropped.
    #[must_use]
    pub fn subdivided(&self) -> TriangleMesh {
        let mut vertices = self.vertices.clone();
        let mut midpoints = std::collections::HashMap::new();
        let mut indices = Vec::with_capacity(self.indices.len() * 4);

        let mut midpoint = |a: u32, b: u32, vertices: &mut Vec<Point3>| -> u32 {
            let key = (a.min(b), a.max(b));
            if let Some(&id) = midpoints.get(&key) {
                return id;
            }
            let m = nalgebra::center(&vertices[a as usize], &vertices[b as usize]);
            #[allow(clippy::cast_possible_truncation)]
            let id = vertices.len() as u32;
            vertices.push(m);
            midpoints.insert(key, id);
            id
        };

        for &[a, b, c] in self.indices.iter().filter(|t| self.is_valid_triangle(t)) {
            let ab = midpoint(a, b, &mut vertices);
            let bc = midpoint(b, c, &mut vertices);
            let ca = midpoint(c, a, &mut vertices);
            indices.push([a, ab, ca]);
            indices.push([ab, b, bc]);
            indices.push([ca, bc, c]);
            indices.push([ab, bc, ca]);
        }

        TriangleMesh { vertices, indices }
    }

    /// Builds an axis-aligned box with outward (counter-clockwise) winding.
    #[must_use]
    pub fn cuboid(min: Point3, max: Point3) -> TriangleMesh {
        let vertices = vec![
            Point3::new(min.x, min.y, min.z),
            Point3::new(max.x, min.y, min.z),
            Point3::new(max.x, max.y, min.z),
            Point3::new(min.x, max.y, min.z),
            Point3::new(min.x, min.y, max.z),
            Point3::new(max.x, min.y, max.z),
            Point3::new(max.x, max.y, max.z),
            Point3::new(min.x, max.y, max.z),
        ];
        let indices = vec![
            // -z
            [0, 2, 1],
            [0, 3, 2],
            // +z
            [4, 5, 6],
            [4, 6, 7],
            // -y
            [0, 1, 5],
            [0, 5, 4],
            // +y
            [3, 7, 6],
            [3, 6, 2],
            // -x
            [0, 4, 7],
            [0, 7, 3],
            // +x
            [1, 2, 6],
            [1, 6, 5],
        ];
        TriangleMesh { vertices, indices }
    }
}
