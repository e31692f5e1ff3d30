use image::RgbImage;

use super::Marker;
use crate::math::{Point2, PIXEL_EPSILON};

/// Normalized atlas coordinates of one baked triangle, in corner order.
///
/// UVs follow the usual texture-mapping convention: `(0, 0)` is the
/// bottom-left of the atlas and `v` grows upward, so pixel row `r` of an
/// atlas `h` rows tall has `v = 1 - r / h`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TriangleUv {
    /// Index of the layout (and shell) triangle.
    pub triangle: usize,
    pub uv: [Point2; 3],
}

/// Pixel rectangle of the atlas occupied by one triangle's crop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AtlasRegion {
    pub triangle: usize,
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl AtlasRegion {
    /// Returns `true` if the pixel lies inside the region.
    #[must_use]
    pub fn contains(&self, x: u32, y: u32) -> bool {
        x >= self.x && x < self.x + self.width && y >= self.y && y < self.y + self.height
    }
}

/// Why a triangle contributed nothing to the atlas.
#[derive(Debug, Clone, PartialEq)]
pub enum SkipReason {
    /// A corner marker was not visible in the marker frame.
    MarkerNotFound { marker: Marker },
    /// The shell triangle has no area, so it has no normal to look along.
    DegenerateTriangle,
    /// The rasterizer failed for this triangle.
    RenderFailed(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct SkippedTriangle {
    pub triangle: usize,
    pub reason: SkipReason,
}

/// A baked texture atlas and the UV mapping of every baked triangle.
#[derive(Debug, Clone)]
pub struct Atlas {
    pub(crate) image: RgbImage,
    pub(crate) uvs: Vec<TriangleUv>,
    pub(crate) regions: Vec<AtlasRegion>,
    pub(crate) skipped: Vec<SkippedTriangle>,
}

impl Atlas {
    #[must_use]
    pub fn image(&self) -> &RgbImage {
        &self.image
    }

    #[must_use]
    pub fn width(&self) -> u32 {
        self.image.width()
    }

    #[must_use]
    pub fn height(&self) -> u32 {
        self.image.height()
    }

    /// UV triples of baked triangles, in triangle order.
    #[must_use]
    pub fn uvs(&self) -> &[TriangleUv] {
        &self.uvs
    }

    /// Number of individual UV coordinates (three per baked triangle).
    #[must_use]
    pub fn uv_count(&self) -> usize {
        self.uvs.len() * 3
    }

    /// Atlas regions of baked triangles, left to right.
    #[must_use]
    pub fn regions(&self) -> &[AtlasRegion] {
        &self.regions
    }

    #[must_use]
    pub fn skipped(&self) -> &[SkippedTriangle] {
        &self.skipped
    }

    /// UVs of `triangle`, or `None` if it was skipped.
    #[must_use]
    pub fn uv_for(&self, triangle: usize) -> Option<&[Point2; 3]> {
        self.uvs
            .iter()
            .find(|t| t.triangle == triangle)
            .map(|t| &t.uv)
    }

    #[must_use]
    pub fn region_for(&self, triangle: usize) -> Option<&AtlasRegion> {
        self.regions.iter().find(|r| r.triangle == triangle)
    }

    /// Pixel addressed by a normalized UV coordinate.
    #[must_use]
    #[allow(
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        clippy::cast_precision_loss
    )]
    pub fn uv_to_pixel(&self, uv: &Point2) -> (u32, u32) {
        let x = (uv.x * f64::from(self.width()) + PIXEL_EPSILON).floor().max(0.0) as u32;
        let y = ((1.0 - uv.y) * f64::from(self.height()) + PIXEL_EPSILON).floor().max(0.0) as u32;
        (x.min(self.width().saturating_sub(1)), y.min(self.height().saturating_sub(1)))
    }
}
