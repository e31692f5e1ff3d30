use image::{imageops, RgbImage};
use tracing::debug;

use super::{Atlas, AtlasRegion, SkipReason, SkippedTriangle, TriangleCapture, TriangleUv};
use crate::error::{BakeError, Result};
use crate::math::Point2;

/// Mutable state of one shell's bake: the growing atlas strip and the
/// pixel-space UVs recorded so far.
///
/// The canvas only ever grows to the right (and, if a crop is taller than
/// every previous one, downward); nothing already placed moves.
#[derive(Debug, Default)]
pub struct BakeSession {
    canvas: Option<RgbImage>,
    seed_margin: u32,
    pixel_uvs: Vec<(usize, [(u32, u32); 3])>,
    regions: Vec<AtlasRegion>,
    skipped: Vec<SkippedTriangle>,
    triangles: usize,
}

impl BakeSession {
    /// Starts an empty session; the first crop is padded below by
    /// `seed_margin` blank rows.
    #[must_use]
    pub fn new(seed_margin: u32) -> Self {
        Self {
            seed_margin,
            ..Self::default()
        }
    }

    /// Current atlas width in pixels.
    #[must_use]
    pub fn width(&self) -> u32 {
        self.canvas.as_ref().map_or(0, RgbImage::width)
    }

    /// Current atlas height in pixels.
    #[must_use]
    pub fn height(&self) -> u32 {
        self.canvas.as_ref().map_or(0, RgbImage::height)
    }

    /// Appends one triangle's crop to the right of the atlas.
    pub fn append(&mut self, capture: TriangleCapture) {
        self.triangles += 1;
        let offset = self.width();
        let crop = capture.crop;
        let (cw, ch) = crop.dimensions();

        let canvas = match self.canvas.take() {
            None => pad_to(&crop, cw, ch + self.seed_margin),
            Some(canvas) => {
                let height = canvas.height().max(ch);
                let mut grown = pad_to(&canvas, canvas.width() + cw, height);
                imageops::replace(&mut grown, &crop, i64::from(offset), 0);
                grown
            }
        };
        self.canvas = Some(canvas);

        let corners = capture.corners.map(|(x, y)| (x + offset, y));
        self.pixel_uvs.push((capture.triangle, corners));
        self.regions.push(AtlasRegion {
            triangle: capture.triangle,
            x: offset,
            y: 0,
            width: cw,
            height: ch,
        });
        debug!(
            triangle = capture.triangle,
            width = self.width(),
            height = self.height(),
            "appended crop"
        );
    }

    /// Records a triangle that contributes nothing.
    pub fn skip(&mut self, triangle: usize, reason: SkipReason) {
        self.triangles += 1;
        self.skipped.push(SkippedTriangle { triangle, reason });
    }

    /// Normalizes the recorded UVs by the final atlas size. `v` is flipped so
    /// that it grows upward from the bottom row.
    ///
    /// # Errors
    ///
    /// Returns `BakeError::NothingBaked` if every triangle was skipped.
    #[allow(clippy::cast_precision_loss)]
    pub fn finish(self) -> Result<Atlas> {
        let Some(image) = self.canvas else {
            return Err(BakeError::NothingBaked {
                triangles: self.triangles,
            }
            .into());
        };
        let w = f64::from(image.width());
        let h = f64::from(image.height());
        let uvs = self
            .pixel_uvs
            .into_iter()
            .map(|(triangle, corners)| TriangleUv {
                triangle,
                uv: corners.map(|(x, y)| Point2::new(f64::from(x) / w, 1.0 - f64::from(y) / h)),
            })
            .collect();
        Ok(Atlas {
            image,
            uvs,
            regions: self.regions,
            skipped: self.skipped,
        })
    }
}

/// Copies `image` into the top-left of a zero-filled canvas of the given
/// size.
fn pad_to(image: &RgbImage, width: u32, height: u32) -> RgbImage {
    let mut canvas = RgbImage::new(width, height);
    imageops::replace(&mut canvas, image, 0, 0);
    canvas
}
