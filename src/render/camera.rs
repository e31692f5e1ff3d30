use crate::error::{RenderError, Result};
use crate::geometry::ProjectionMethod;
use crate::math::{Point3, Vector3, TOLERANCE};

/// Output image size in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Resolution {
    pub width: u32,
    pub height: u32,
}

impl Resolution {
    #[must_use]
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Square resolution.
    #[must_use]
    pub fn square(size: u32) -> Self {
        Self::new(size, size)
    }

    /// # Errors
    ///
    /// Returns `RenderError::InvalidResolution` if either side is zero.
    pub fn validate(self) -> Result<Self> {
        if self.width == 0 || self.height == 0 {
            return Err(RenderError::InvalidResolution {
                width: self.width,
                height: self.height,
            }
            .into());
        }
        Ok(self)
    }

    #[must_use]
    pub fn aspect(self) -> f64 {
        f64::from(self.width) / f64::from(self.height)
    }
}

/// Depth range, measured from the camera along the view direction, inside
/// which geometry is drawn.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClippingRange {
    pub near: f64,
    pub far: f64,
}

impl ClippingRange {
    #[must_use]
    pub fn new(near: f64, far: f64) -> Self {
        Self { near, far }
    }

    /// Deep range admitting the whole of an inflated structure.
    #[must_use]
    pub fn inflated() -> Self {
        Self::new(0.0001, 300.01)
    }

    /// Shallow range admitting only geometry close under the shell.
    #[must_use]
    pub fn clipped() -> Self {
        Self::new(0.0001, 60.01)
    }

    #[must_use]
    pub fn for_method(method: ProjectionMethod) -> Self {
        match method {
            ProjectionMethod::Inflate => Self::inflated(),
            ProjectionMethod::Clipping => Self::clipped(),
        }
    }

    #[must_use]
    pub fn contains(&self, depth: f64) -> bool {
        depth >= self.near && depth <= self.far
    }
}

impl Default for ClippingRange {
    fn default() -> Self {
        Self::inflated()
    }
}

/// An orthographic camera.
///
/// `parallel_scale` is half the height of the visible world window; the
/// width follows from the output aspect ratio.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Camera {
    pub position: Point3,
    pub focal_point: Point3,
    pub view_up: Vector3,
    pub parallel_scale: f64,
    pub clipping: ClippingRange,
}

impl Camera {
    /// Creates an orthographic camera with the default clipping range.
    #[must_use]
    pub fn orthographic(
        position: Point3,
        focal_point: Point3,
        view_up: Vector3,
        parallel_scale: f64,
    ) -> Self {
        Self {
            position,
            focal_point,
            view_up,
            parallel_scale,
            clipping: ClippingRange::default(),
        }
    }

    #[must_use]
    pub fn with_clipping(mut self, clipping: ClippingRange) -> Self {
        self.clipping = clipping;
        self
    }

    /// Picks a view-up that is not parallel to the viewing direction:
    /// +Y, or +Z when looking (almost) straight along Y.
    #[must_use]
    pub fn default_up_for(direction: &Vector3) -> Vector3 {
        let dir = direction.normalize();
        if dir.y.abs() > 0.99 {
            Vector3::z()
        } else {
            Vector3::y()
        }
    }

    /// Builds the orthonormal view frame.
    ///
    /// # Errors
    ///
    /// Returns `RenderError::DegenerateCamera` if the camera sits on its focal
    /// point, the view-up is parallel to the view direction, or the parallel
    /// scale is not positive.
    pub fn view(&self) -> Result<ViewBasis> {
        let forward = self.focal_point - self.position;
        let dist = forward.norm();
        if dist < TOLERANCE {
            return Err(RenderError::DegenerateCamera("position equals focal point".into()).into());
        }
        if self.parallel_scale <= TOLERANCE {
            return Err(RenderError::DegenerateCamera(format!(
                "parallel scale {} must be positive",
                self.parallel_scale
            ))
            .into());
        }
        let forward = forward / dist;
        let right = forward.cross(&self.view_up);
        let right_len = right.norm();
        if right_len < TOLERANCE {
            return Err(
                RenderError::DegenerateCamera("view-up parallel to view direction".into()).into(),
            );
        }
        let right = right / right_len;
        let up = right.cross(&forward);
        Ok(ViewBasis {
            origin: self.position,
            right,
            up,
            forward,
            parallel_scale: self.parallel_scale,
            clipping: self.clipping,
        })
    }
}

/// A point after projection: pixel coordinates (origin top-left) and depth
/// along the view direction.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Projected {
    pub x: f64,
    pub y: f64,
    pub depth: f64,
}

/// Orthonormal camera frame ready for projection.
#[derive(Debug, Clone, Copy)]
pub struct ViewBasis {
    pub origin: Point3,
    pub right: Vector3,
    pub up: Vector3,
    pub forward: Vector3,
    pub parallel_scale: f64,
    pub clipping: ClippingRange,
}

impl ViewBasis {
    /// Projects a world point into pixel space.
    #[must_use]
    pub fn project(&self, p: &Point3, resolution: Resolution) -> Projected {
        let d = p - self.origin;
        let half_h = self.parallel_scale;
        let half_w = half_h * resolution.aspect();
        let ndc_x = d.dot(&self.right) / half_w;
        let ndc_y = d.dot(&self.up) / half_h;
        Projected {
            x: (ndc_x + 1.0) * 0.5 * f64::from(resolution.width),
            y: (1.0 - ndc_y) * 0.5 * f64::from(resolution.height),
            depth: d.dot(&self.forward),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn top_down() -> Camera {
        Camera::orthographic(
            Point3::new(0.0, 10.0, 0.0),
            Point3::origin(),
            Vector3::new(0.0, 0.0, -1.0),
            5.0,
        )
    }

    #[test]
    fn focal_point_projects_to_image_center() {
        let basis = top_down().view().unwrap();
        let p = basis.project(&Point3::origin(), Resolution::square(100));
        assert_relative_eq!(p.x, 50.0);
        assert_relative_eq!(p.y, 50.0);
        assert_relative_eq!(p.depth, 10.0);
    }

    #[test]
    fn top_down_axes_map_to_columns_and_rows() {
        let basis = top_down().view().unwrap();
        let res = Resolution::square(100);
        let px = basis.project(&Point3::new(5.0, 0.0, 0.0), res);
        assert_relative_eq!(px.x, 100.0);
        let pz = basis.project(&Point3::new(0.0, 0.0, 5.0), res);
        assert_relative_eq!(pz.y, 100.0);
    }

    #[test]
    fn wide_resolution_widens_window() {
        let basis = top_down().view().unwrap();
        let p = basis.project(&Point3::new(5.0, 0.0, 0.0), Resolution::new(200, 100));
        assert_relative_eq!(p.x, 150.0);
    }

    #[test]
    fn degenerate_cameras_are_rejected() {
        let mut cam = top_down();
        cam.view_up = Vector3::y();
        assert!(cam.view().is_err());

        let mut cam = top_down();
        cam.focal_point = cam.position;
        assert!(cam.view().is_err());

        let mut cam = top_down();
        cam.parallel_scale = 0.0;
        assert!(cam.view().is_err());
    }

    #[test]
    fn default_up_avoids_view_direction() {
        assert_eq!(Camera::default_up_for(&Vector3::new(0.0, -3.0, 0.0)), Vector3::z());
        assert_eq!(Camera::default_up_for(&Vector3::x()), Vector3::y());
    }

    #[test]
    fn clipping_presets() {
        assert!(ClippingRange::clipped().far < ClippingRange::inflated().far);
        assert!(ClippingRange::inflated().contains(100.0));
        assert!(!ClippingRange::clipped().contains(100.0));
        assert_eq!(
            ClippingRange::for_method(ProjectionMethod::Clipping),
            ClippingRange::clipped()
        );
    }

    #[test]
    fn zero_resolution_is_invalid() {
        assert!(Resolution::new(0, 10).validate().is_err());
        assert!(Resolution::square(1).validate().is_ok());
    }
}
