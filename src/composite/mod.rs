//! Top-down render of a textured, unfolded layout: the printable sheet.

use std::collections::HashMap;

use image::{imageops, Rgb, RgbImage};
use tracing::{debug, info};

use crate::bake::{Atlas, TriangleUv};
use crate::error::{CompositeError, Result};
use crate::geometry::Layout;
use crate::math::{Point2, Point3, Vector3, TOLERANCE};
use crate::render::{Camera, ClippingRange, Rasterizer, Resolution, Scene, WHITE};

/// Parameters for the flat render.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CompositeParams {
    /// Side of the square render before cropping.
    pub resolution: u32,
    /// Fraction of the layout extent left free around it.
    pub margin: f64,
    pub background: Rgb<u8>,
    /// Fill for triangles that have no atlas region.
    pub untextured: Rgb<u8>,
    /// Draw calibration points at the layout's bounding extrema.
    pub debug_markers: bool,
    pub marker_size: u32,
}

impl Default for CompositeParams {
    fn default() -> Self {
        Self {
            resolution: 2000,
            margin: 0.05,
            background: WHITE,
            untextured: Rgb([220, 220, 220]),
            debug_markers: false,
            marker_size: 5,
        }
    }
}

impl CompositeParams {
    #[must_use]
    pub fn with_resolution(mut self, resolution: u32) -> Self {
        self.resolution = resolution;
        self
    }

    #[must_use]
    pub fn with_debug_markers(mut self, debug_markers: bool) -> Self {
        self.debug_markers = debug_markers;
        self
    }
}

/// Renders a layout, textured from its atlas, into a printable image.
pub struct FlatCompositor<R> {
    rasterizer: R,
    params: CompositeParams,
}

impl<R: Rasterizer> FlatCompositor<R> {
    #[must_use]
    pub fn new(rasterizer: R, params: CompositeParams) -> Self {
        Self { rasterizer, params }
    }

    /// Convenience for [`FlatCompositor::composite`] with an [`Atlas`].
    ///
    /// # Errors
    ///
    /// Same as [`FlatCompositor::composite`].
    pub fn composite_atlas(&self, layout: &Layout, atlas: &Atlas) -> Result<RgbImage> {
        self.composite(layout, atlas.image(), atlas.uvs())
    }

    /// Lays the layout flat on the `y = 0` plane as `(x, 0, y)`, textures it
    /// from `texture` through `uvs`, and renders it face on with layout `x`
    /// running right and layout `y` running up the image. The render is
    /// cropped to a square anchored at the foreground's top-left corner.
    ///
    /// # Errors
    ///
    /// Returns `CompositeError::EmptyLayout` for a layout without triangles,
    /// `CompositeError::UvOutOfRange` if a UV entry names a missing triangle,
    /// `CompositeError::EmptyRender` if nothing was drawn, or a render error.
    pub fn composite(
        &self,
        layout: &Layout,
        texture: &RgbImage,
        uvs: &[TriangleUv],
    ) -> Result<RgbImage> {
        let bounds = layout.bounds().ok_or(CompositeError::EmptyLayout)?;
        let count = layout.triangle_count();
        if let Some(bad) = uvs.iter().find(|t| t.triangle >= count) {
            return Err(CompositeError::UvOutOfRange {
                triangle: bad.triangle,
                count,
            }
            .into());
        }
        let by_triangle: HashMap<usize, &[Point2; 3]> =
            uvs.iter().map(|t| (t.triangle, &t.uv)).collect();

        let mut scene = Scene::new(self.params.background);
        let texture_id = scene.add_texture(texture.clone());
        for (i, tri) in layout.triangles().iter().enumerate() {
            let corners = tri.map(|p| Point3::new(p.x, 0.0, p.y));
            match by_triangle.get(&i) {
                Some(uv) => scene.add_textured_triangle(corners, **uv, texture_id),
                None => scene.add_triangle(corners, self.params.untextured),
            }
        }
        if self.params.debug_markers {
            scene.add_point(
                Point3::new(bounds.min.x, 0.0, bounds.min.y),
                Rgb([255, 0, 0]),
                self.params.marker_size,
            );
            scene.add_point(
                Point3::new(bounds.max.x, 0.0, bounds.max.y),
                Rgb([0, 0, 255]),
                self.params.marker_size,
            );
        }

        let extent = bounds.width().max(bounds.height());
        let half = if extent > TOLERANCE { extent * 0.5 } else { 1.0 };
        let height = extent.max(1.0) + 10.0;
        let center = bounds.center();
        // Layout x runs right and y runs up: the handedness of the bake views.
        let camera = Camera::orthographic(
            Point3::new(center.x, -height, center.y),
            Point3::new(center.x, 0.0, center.y),
            Vector3::z(),
            half * (1.0 + self.params.margin),
        )
        .with_clipping(ClippingRange::new(0.0001, height * 2.0));

        let image = self.rasterizer.render(
            &scene,
            &camera,
            Resolution::square(self.params.resolution),
        )?;
        debug!(
            triangles = count,
            textured = by_triangle.len(),
            "rendered flat layout"
        );

        let cropped = crop_to_foreground(&image, self.params.background)?;
        info!(size = cropped.width(), "composited printable image");
        Ok(cropped)
    }
}

/// Crops `image` to a square whose side is the larger dimension of the
/// foreground bounds, anchored at their top-left corner. Parts of the square
/// beyond the source image are filled with `background`.
///
/// # Errors
///
/// Returns `CompositeError::EmptyRender` if every pixel is background.
pub fn crop_to_foreground(image: &RgbImage, background: Rgb<u8>) -> Result<RgbImage> {
    let mut bounds: Option<(u32, u32, u32, u32)> = None;
    for (x, y, px) in image.enumerate_pixels() {
        if *px == background {
            continue;
        }
        bounds = Some(match bounds {
            None => (x, y, x, y),
            Some((x0, y0, x1, y1)) => (x0.min(x), y0.min(y), x1.max(x), y1.max(y)),
        });
    }
    let (x0, y0, x1, y1) = bounds.ok_or(CompositeError::EmptyRender)?;

    let side = (x1 - x0 + 1).max(y1 - y0 + 1);
    let w = side.min(image.width() - x0);
    let h = side.min(image.height() - y0);
    let visible = imageops::crop_imm(image, x0, y0, w, h).to_image();

    let mut out = RgbImage::from_pixel(side, side, background);
    imageops::replace(&mut out, &visible, 0, 0);
    Ok(out)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::render::SoftwareRasterizer;

    const RED: Rgb<u8> = Rgb([255, 0, 0]);
    const BLUE: Rgb<u8> = Rgb([0, 0, 255]);

    fn square_layout(w: f64, h: f64) -> Layout {
        Layout::new(vec![
            [Point2::new(0.0, 0.0), Point2::new(w, 0.0), Point2::new(w, h)],
            [Point2::new(0.0, 0.0), Point2::new(w, h), Point2::new(0.0, h)],
        ])
    }

    fn two_tone() -> RgbImage {
        let mut tex = RgbImage::from_pixel(2, 1, RED);
        tex.put_pixel(1, 0, BLUE);
        tex
    }

    fn flat_uv(triangle: usize, u: f64) -> TriangleUv {
        TriangleUv {
            triangle,
            uv: [Point2::new(u, 0.5); 3],
        }
    }

    fn compositor() -> FlatCompositor<SoftwareRasterizer> {
        FlatCompositor::new(SoftwareRasterizer, CompositeParams::default().with_resolution(100))
    }

    fn count(img: &RgbImage, color: Rgb<u8>) -> usize {
        img.pixels().filter(|p| **p == color).count()
    }

    #[test]
    fn textures_each_triangle_from_its_uvs() {
        let out = compositor()
            .composite(
                &square_layout(4.0, 4.0),
                &two_tone(),
                &[flat_uv(0, 0.25), flat_uv(1, 0.75)],
            )
            .unwrap();
        assert_eq!(out.width(), out.height());
        assert!(count(&out, RED) > 100);
        assert!(count(&out, BLUE) > 100);
        // Cropped tight: the top-left corner is layout, not background.
        assert_ne!(*out.get_pixel(0, 0), WHITE);
    }

    #[test]
    fn untextured_triangles_keep_their_outline() {
        let params = CompositeParams::default().with_resolution(100);
        let out = FlatCompositor::new(SoftwareRasterizer, params)
            .composite(&square_layout(4.0, 4.0), &two_tone(), &[flat_uv(0, 0.25)])
            .unwrap();
        assert!(count(&out, params.untextured) > 100);
        assert_eq!(count(&out, BLUE), 0);
    }

    #[test]
    fn wide_layout_is_squared() {
        let out = compositor()
            .composite(&square_layout(4.0, 1.0), &two_tone(), &[])
            .unwrap();
        assert_eq!(out.width(), out.height());
        assert_eq!(*out.get_pixel(0, out.height() - 1), WHITE);
    }

    #[test]
    fn layout_y_points_up_the_sheet() {
        let params = CompositeParams::default().with_resolution(100);
        let corner = Layout::new(vec![[
            Point2::new(0.0, 0.0),
            Point2::new(4.0, 0.0),
            Point2::new(0.0, 4.0),
        ]]);
        let out = FlatCompositor::new(SoftwareRasterizer, params)
            .composite(&corner, &two_tone(), &[])
            .unwrap();
        let side = out.width();
        // The right angle sits at the bottom-left, the hypotenuse faces top-right.
        assert_eq!(*out.get_pixel(2, side - 3), params.untextured);
        assert_eq!(*out.get_pixel(side - 3, 2), WHITE);
    }

    #[test]
    fn top_of_texture_lands_on_top_of_sheet() {
        let mut tex = RgbImage::from_pixel(1, 2, BLUE);
        tex.put_pixel(0, 0, RED);
        let uv = |x: f64, y: f64| Point2::new(x / 4.0, y / 4.0);
        let layout = square_layout(4.0, 4.0);
        let uvs: Vec<TriangleUv> = layout
            .triangles()
            .iter()
            .enumerate()
            .map(|(triangle, t)| TriangleUv {
                triangle,
                uv: t.map(|p| uv(p.x, p.y)),
            })
            .collect();
        let out = compositor().composite(&layout, &tex, &uvs).unwrap();
        let (w, h) = out.dimensions();
        assert_eq!(*out.get_pixel(w / 2, 5), RED);
        assert_eq!(*out.get_pixel(w / 2, h - 5), BLUE);
    }

    #[test]
    fn empty_layout_is_an_error() {
        assert!(compositor()
            .composite(&Layout::new(Vec::new()), &two_tone(), &[])
            .is_err());
    }

    #[test]
    fn uv_for_missing_triangle_is_an_error() {
        assert!(compositor()
            .composite(&square_layout(1.0, 1.0), &two_tone(), &[flat_uv(5, 0.1)])
            .is_err());
    }

    #[test]
    fn debug_markers_mark_extrema() {
        let params = CompositeParams::default()
            .with_resolution(100)
            .with_debug_markers(true);
        let out = FlatCompositor::new(SoftwareRasterizer, params)
            .composite(&square_layout(4.0, 4.0), &two_tone(), &[])
            .unwrap();
        assert!(count(&out, RED) > 0);
        assert!(count(&out, BLUE) > 0);
    }

    #[test]
    fn crop_of_blank_image_fails() {
        let img = RgbImage::from_pixel(4, 4, WHITE);
        assert!(crop_to_foreground(&img, WHITE).is_err());
    }

    #[test]
    fn crop_anchors_at_min_corner() {
        let mut img = RgbImage::from_pixel(10, 10, WHITE);
        img.put_pixel(2, 3, RED);
        img.put_pixel(6, 4, RED);
        let out = crop_to_foreground(&img, WHITE).unwrap();
        assert_eq!(out.dimensions(), (5, 5));
        assert_eq!(*out.get_pixel(0, 0), RED);
        assert_eq!(*out.get_pixel(4, 1), RED);
    }
}
