use image::Rgb;

use crate::error::{BakeError, Result};
use crate::render::{ClippingRange, Resolution, WHITE};

/// Colour tests used to find corner markers in a rendered frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MarkerThresholds {
    /// A marker's own channel must exceed this value.
    pub high: u8,
    /// The other two channels must stay below this value.
    pub low: u8,
    /// When the strict test finds nothing, accept pixels whose nearest
    /// reference colour is the marker and lie within this RGB distance of
    /// it. `None` disables the fallback.
    pub fallback_distance: Option<f32>,
}

impl Default for MarkerThresholds {
    fn default() -> Self {
        Self {
            high: 250,
            low: 1,
            fallback_distance: Some(96.0),
        }
    }
}

/// Parameters for baking one shell's atlas.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BakeParams {
    /// Size of every per-triangle frame.
    pub resolution: Resolution,
    /// Camera standoff along the inward normal. Must be negative, which puts
    /// the camera outside the shell.
    pub normal_scale: f64,
    /// Half height of the orthographic window, in world units.
    pub parallel_scale: f64,
    pub clipping: ClippingRange,
    /// Marker splat size in pixels.
    pub marker_size: u32,
    /// Padding around the marker bounds when cropping.
    pub crop_margin: u32,
    /// Blank rows added below the first crop to seed the atlas height.
    pub seed_margin: u32,
    pub background: Rgb<u8>,
    pub thresholds: MarkerThresholds,
}

impl Default for BakeParams {
    fn default() -> Self {
        Self {
            resolution: Resolution::square(500),
            normal_scale: -5.0,
            parallel_scale: 100.0,
            clipping: ClippingRange::inflated(),
            marker_size: 3,
            crop_margin: 2,
            seed_margin: 500,
            background: WHITE,
            thresholds: MarkerThresholds::default(),
        }
    }
}

impl BakeParams {
    /// Sets the frame resolution and seeds the atlas margin with its height.
    #[must_use]
    pub fn with_resolution(mut self, resolution: Resolution) -> Self {
        self.resolution = resolution;
        self.seed_margin = resolution.height;
        self
    }

    #[must_use]
    pub fn with_parallel_scale(mut self, parallel_scale: f64) -> Self {
        self.parallel_scale = parallel_scale;
        self
    }

    #[must_use]
    pub fn with_normal_scale(mut self, normal_scale: f64) -> Self {
        self.normal_scale = normal_scale;
        self
    }

    #[must_use]
    pub fn with_clipping(mut self, clipping: ClippingRange) -> Self {
        self.clipping = clipping;
        self
    }

    #[must_use]
    pub fn with_seed_margin(mut self, seed_margin: u32) -> Self {
        self.seed_margin = seed_margin;
        self
    }

    #[must_use]
    pub fn with_thresholds(mut self, thresholds: MarkerThresholds) -> Self {
        self.thresholds = thresholds;
        self
    }

    /// # Errors
    ///
    /// Returns `BakeError::InvalidParameters` if the standoff is not
    /// negative, the window is not positive, or the resolution is empty.
    pub fn validate(&self) -> Result<()> {
        if self.normal_scale >= 0.0 {
            return Err(BakeError::InvalidParameters(format!(
                "normal_scale must be negative, got {}",
                self.normal_scale
            ))
            .into());
        }
        if self.parallel_scale <= 0.0 {
            return Err(BakeError::InvalidParameters(format!(
                "parallel_scale must be positive, got {}",
                self.parallel_scale
            ))
            .into());
        }
        if self.clipping.near >= self.clipping.far {
            return Err(BakeError::InvalidParameters(format!(
                "empty clipping range {:?}",
                self.clipping
            ))
            .into());
        }
        self.resolution.validate()?;
        Ok(())
    }
}
