use image::{Rgb, RgbImage};

use super::MarkerThresholds;

/// One of the three corner markers. Triangle corner `i` carries marker `i`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Marker {
    Red,
    Green,
    Blue,
}

impl Marker {
    /// Markers in corner order.
    pub const ALL: [Marker; 3] = [Marker::Red, Marker::Green, Marker::Blue];

    /// Fully saturated marker colour.
    #[must_use]
    pub fn color(self) -> Rgb<u8> {
        match self {
            Marker::Red => Rgb([255, 0, 0]),
            Marker::Green => Rgb([0, 255, 0]),
            Marker::Blue => Rgb([0, 0, 255]),
        }
    }

    fn channel(self) -> usize {
        match self {
            Marker::Red => 0,
            Marker::Green => 1,
            Marker::Blue => 2,
        }
    }
}

/// Inclusive pixel rectangle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PixelRect {
    pub min_x: u32,
    pub min_y: u32,
    pub max_x: u32,
    pub max_y: u32,
}

impl PixelRect {
    fn point(x: u32, y: u32) -> Self {
        Self {
            min_x: x,
            min_y: y,
            max_x: x,
            max_y: y,
        }
    }

    fn extend(&mut self, x: u32, y: u32) {
        self.min_x = self.min_x.min(x);
        self.min_y = self.min_y.min(y);
        self.max_x = self.max_x.max(x);
        self.max_y = self.max_y.max(y);
    }

    /// Grows the rectangle by `margin` on every side, clamped to an image of
    /// `width` x `height`.
    #[must_use]
    pub fn padded(&self, margin: u32, width: u32, height: u32) -> Self {
        Self {
            min_x: self.min_x.saturating_sub(margin),
            min_y: self.min_y.saturating_sub(margin),
            max_x: self.max_x.saturating_add(margin).min(width.saturating_sub(1)),
            max_y: self.max_y.saturating_add(margin).min(height.saturating_sub(1)),
        }
    }

    #[must_use]
    pub fn width(&self) -> u32 {
        self.max_x - self.min_x + 1
    }

    #[must_use]
    pub fn height(&self) -> u32 {
        self.max_y - self.min_y + 1
    }

    #[must_use]
    pub fn contains(&self, x: u32, y: u32) -> bool {
        (self.min_x..=self.max_x).contains(&x) && (self.min_y..=self.max_y).contains(&y)
    }
}

/// Where the three markers were found in a frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MarkerLocation {
    /// First matching pixel (row-major) of each marker, in corner order.
    pub corners: [(u32, u32); 3],
    /// Bounds of every pixel matching any marker.
    pub bounds: PixelRect,
}

/// Finds corner markers by colour.
#[derive(Debug, Clone, Copy)]
pub struct MarkerDetector {
    thresholds: MarkerThresholds,
    background: Rgb<u8>,
}

impl MarkerDetector {
    #[must_use]
    pub fn new(thresholds: MarkerThresholds, background: Rgb<u8>) -> Self {
        Self {
            thresholds,
            background,
        }
    }

    /// Strict test: own channel above `high`, both others below `low`.
    #[must_use]
    pub fn matches_strict(&self, marker: Marker, px: &Rgb<u8>) -> bool {
        let own = marker.channel();
        (0..3).all(|c| {
            if c == own {
                px.0[c] > self.thresholds.high
            } else {
                px.0[c] < self.thresholds.low
            }
        })
    }

    /// Fallback test: `marker` is the nearest of the marker colours and the
    /// background, and within `fallback_distance` of the pixel.
    #[must_use]
    pub fn matches_nearest(&self, marker: Marker, px: &Rgb<u8>) -> bool {
        let Some(limit) = self.thresholds.fallback_distance else {
            return false;
        };
        let own = distance(px, &marker.color());
        if own > limit {
            return false;
        }
        let background = distance(px, &self.background);
        own < background
            && Marker::ALL
                .iter()
                .filter(|&&m| m != marker)
                .all(|m| own < distance(px, &m.color()))
    }

    /// Locates all three markers in `image`, or returns the first marker
    /// that could not be found.
    ///
    /// # Errors
    ///
    /// Returns the missing [`Marker`] if any marker has no matching pixel.
    pub fn locate(&self, image: &RgbImage) -> Result<MarkerLocation, Marker> {
        let mut corners = [(0, 0); 3];
        let mut bounds: Option<PixelRect> = None;

        for (slot, marker) in corners.iter_mut().zip(Marker::ALL) {
            let found = self
                .scan(image, marker, Self::matches_strict)
                .or_else(|| self.scan(image, marker, Self::matches_nearest));
            let Some((first, rect)) = found else {
                return Err(marker);
            };
            *slot = first;
            bounds = Some(match bounds {
                None => rect,
                Some(mut b) => {
                    b.extend(rect.min_x, rect.min_y);
                    b.extend(rect.max_x, rect.max_y);
                    b
                }
            });
        }

        let bounds = bounds.ok_or(Marker::Red)?;
        Ok(MarkerLocation { corners, bounds })
    }

    /// Row-major scan returning the first match and the bounds of all
    /// matches.
    fn scan(
        &self,
        image: &RgbImage,
        marker: Marker,
        test: fn(&Self, Marker, &Rgb<u8>) -> bool,
    ) -> Option<((u32, u32), PixelRect)> {
        let mut first = None;
        let mut rect: Option<PixelRect> = None;
        for (x, y, px) in image.enumerate_pixels() {
            if !test(self, marker, px) {
                continue;
            }
            first.get_or_insert((x, y));
            match rect.as_mut() {
                Some(r) => r.extend(x, y),
                None => rect = Some(PixelRect::point(x, y)),
            }
        }
        Some((first?, rect?))
    }
}

fn distance(a: &Rgb<u8>, b: &Rgb<u8>) -> f32 {
    a.0.iter()
        .zip(b.0.iter())
        .map(|(&x, &y)| {
            let d = f32::from(x) - f32::from(y);
            d * d
        })
        .sum::<f32>()
        .sqrt()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::render::WHITE;

    fn detector() -> MarkerDetector {
        MarkerDetector::new(MarkerThresholds::default(), WHITE)
    }

    fn frame() -> RgbImage {
        let mut img = RgbImage::from_pixel(20, 20, WHITE);
        img.put_pixel(3, 4, Marker::Red.color());
        img.put_pixel(4, 4, Marker::Red.color());
        img.put_pixel(15, 6, Marker::Green.color());
        img.put_pixel(9, 17, Marker::Blue.color());
        img
    }

    #[test]
    fn locates_first_pixel_of_each_marker() {
        let loc = detector().locate(&frame()).unwrap();
        assert_eq!(loc.corners, [(3, 4), (15, 6), (9, 17)]);
        assert_eq!(
            loc.bounds,
            PixelRect {
                min_x: 3,
                min_y: 4,
                max_x: 15,
                max_y: 17
            }
        );
    }

    #[test]
    fn missing_marker_is_reported() {
        let mut img = frame();
        img.put_pixel(15, 6, WHITE);
        assert_eq!(detector().locate(&img), Err(Marker::Green));
    }

    #[test]
    fn strict_test_rejects_blended_pixels() {
        let d = detector();
        assert!(d.matches_strict(Marker::Red, &Rgb([255, 0, 0])));
        assert!(!d.matches_strict(Marker::Red, &Rgb([255, 30, 0])));
        assert!(!d.matches_strict(Marker::Red, &WHITE));
    }

    #[test]
    fn fallback_accepts_near_colors_when_strict_fails() {
        let mut img = frame();
        img.put_pixel(15, 6, WHITE);
        img.put_pixel(12, 12, Rgb([20, 230, 25]));
        let loc = detector().locate(&img).unwrap();
        assert_eq!(loc.corners[1], (12, 12));

        let strict = MarkerDetector::new(
            MarkerThresholds {
                fallback_distance: None,
                ..MarkerThresholds::default()
            },
            WHITE,
        );
        assert_eq!(strict.locate(&img), Err(Marker::Green));
    }

    #[test]
    fn fallback_never_claims_background() {
        let d = detector();
        assert!(!d.matches_nearest(Marker::Blue, &Rgb([200, 200, 255])));
    }

    #[test]
    fn rect_padding_clamps_to_image() {
        let r = PixelRect {
            min_x: 1,
            min_y: 0,
            max_x: 18,
            max_y: 10,
        };
        let p = r.padded(2, 20, 12);
        assert_eq!((p.min_x, p.min_y, p.max_x, p.max_y), (0, 0, 19, 11));
        assert_eq!(p.width(), 20);
        assert!(p.contains(19, 11));
        assert!(!p.contains(20, 11));
    }
}
