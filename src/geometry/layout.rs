use super::Shell;
use crate::error::{GeometryError, Result};
use crate::math::{Bounds2, Point2};

/// A flattened triangle layout matching a shell triangle for triangle.
///
/// Triangle `i` of the layout is the unfolded footprint of triangle `i` of
/// its shell; every triangle owns its three 2D corners.
#[derive(Debug, Clone, PartialEq)]
pub struct Layout {
    triangles: Vec<[Point2; 3]>,
}

impl Layout {
    /// Creates a layout from per-triangle 2D corners.
    #[must_use]
    pub fn new(triangles: Vec<[Point2; 3]>) -> Self {
        Self { triangles }
    }

    /// Creates a layout for `shell`, checking that the triangle counts agree.
    ///
    /// # Errors
    ///
    /// Returns `GeometryError::LayoutMismatch` if the counts differ.
    pub fn for_shell(shell: &Shell, triangles: Vec<[Point2; 3]>) -> Result<Self> {
        if triangles.len() != shell.triangle_count() {
            return Err(GeometryError::LayoutMismatch {
                layout: triangles.len(),
                shell: shell.triangle_count(),
            }
            .into());
        }
        Ok(Self { triangles })
    }

    /// Maps raw unfolded coordinates into the unit square.
    ///
    /// Every coordinate `c` becomes `(c + absmax) / (absmax + max)` where
    /// `absmax` is the largest absolute coordinate and `max` the largest
    /// signed one, so layouts centred on the origin land in `[0, 1]²`.
    #[must_use]
    pub fn normalized(raw: &[[Point2; 3]]) -> Self {
        let mut absmax = 0.0_f64;
        let mut max = 0.0_f64;
        for p in raw.iter().flatten() {
            absmax = absmax.max(p.x.abs()).max(p.y.abs());
            max = max.max(p.x).max(p.y);
        }
        let denom = absmax + max;
        if denom <= f64::EPSILON {
            return Self::new(raw.to_vec());
        }
        let triangles = raw
            .iter()
            .map(|tri| tri.map(|p| Point2::new((p.x + absmax) / denom, (p.y + absmax) / denom)))
            .collect();
        Self { triangles }
    }

    #[must_use]
    pub fn triangle_count(&self) -> usize {
        self.triangles.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.triangles.is_empty()
    }

    #[must_use]
    pub fn triangle(&self, index: usize) -> Option<&[Point2; 3]> {
        self.triangles.get(index)
    }

    #[must_use]
    pub fn triangles(&self) -> &[[Point2; 3]] {
        &self.triangles
    }

    /// Bounding rectangle of all corners.
    #[must_use]
    pub fn bounds(&self) -> Option<Bounds2> {
        Bounds2::from_points(self.triangles.iter().flatten())
    }
}
