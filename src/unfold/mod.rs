//! Flattening a shell into a 2D triangle layout.
//!
//! The cut-and-unfold algorithm is pluggable through [`Unfolder`]. The
//! bundled [`IsolatedUnfolder`] lays every triangle flat on its own and shelf
//! packs the pieces, which is enough for baking and compositing: every
//! triangle gets a congruent, non-overlapping footprint.
//!
//! Its sheets are NOT foldable. No two pieces share an edge, so the printed
//! triangles are loose and have to be cut out and glued one by one. A real
//! net with shared fold edges needs an edge-unfolding [`Unfolder`].

use tracing::debug;

use crate::error::Result;
use crate::geometry::{Layout, Shell};
use crate::math::{Point2, Point3, TOLERANCE};

/// Produces a 2D layout combinatorially matching a shell.
pub trait Unfolder {
    /// # Errors
    ///
    /// Returns an error if the shell cannot be flattened.
    fn unfold(&self, shell: &Shell) -> Result<Layout>;
}

impl<F> Unfolder for F
where
    F: Fn(&Shell) -> Result<Layout>,
{
    fn unfold(&self, shell: &Shell) -> Result<Layout> {
        self(shell)
    }
}

/// Lays each triangle flat independently and packs them in rows. The
/// result is a set of loose pieces, not a foldable net.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IsolatedUnfolder {
    /// Free space between neighbouring pieces.
    pub gap: f64,
}

impl Default for IsolatedUnfolder {
    fn default() -> Self {
        Self { gap: 1.0 }
    }
}

impl IsolatedUnfolder {
    #[must_use]
    pub fn new(gap: f64) -> Self {
        Self { gap: gap.max(0.0) }
    }
}

impl Unfolder for IsolatedUnfolder {
    fn unfold(&self, shell: &Shell) -> Result<Layout> {
        let mut pieces = Vec::with_capacity(shell.triangle_count());
        for i in 0..shell.triangle_count() {
            pieces.push(flatten(&shell.triangle(i)?));
        }

        let sizes: Vec<(f64, f64)> = pieces.iter().map(piece_size).collect();
        let area: f64 = sizes.iter().map(|(w, h)| w * h).sum();
        let widest = sizes.iter().map(|s| s.0).fold(0.0, f64::max);
        let row_width = (area.sqrt() * 1.5).max(widest);

        let mut placed = Vec::with_capacity(pieces.len());
        let (mut x, mut y, mut row_height) = (0.0, 0.0, 0.0_f64);
        for (piece, (w, h)) in pieces.into_iter().zip(sizes) {
            if x > 0.0 && x + w > row_width {
                x = 0.0;
                y += row_height + self.gap;
                row_height = 0.0;
            }
            placed.push(piece.map(|p| Point2::new(p.x + x, p.y + y)));
            x += w + self.gap;
            row_height = row_height.max(h);
        }
        debug!(triangles = placed.len(), row_width, "unfolded shell");
        Ok(Layout::new(placed))
    }
}

/// Congruent copy of `tri` in the plane, counter-clockwise, with its bounding
/// box anchored at the origin. The longest edge lies on the x axis so that
/// slivers stay flat. Corner order is preserved.
fn flatten(tri: &[Point3; 3]) -> [Point2; 3] {
    let base = (0..3)
        .max_by(|&a, &b| {
            let la = (tri[(a + 1) % 3] - tri[a]).norm();
            let lb = (tri[(b + 1) % 3] - tri[b]).norm();
            la.total_cmp(&lb)
        })
        .unwrap_or(0);
    let (a, b, c) = (base, (base + 1) % 3, (base + 2) % 3);

    let ab = tri[b] - tri[a];
    let ac = tri[c] - tri[a];
    let len = ab.norm();
    let mut flat = [Point2::origin(); 3];
    if len > TOLERANCE {
        let along = ac.dot(&ab) / len;
        let across = ab.cross(&ac).norm() / len;
        flat[b] = Point2::new(len, 0.0);
        flat[c] = Point2::new(along, across);
    }

    let min_x = flat.iter().map(|p| p.x).fold(f64::INFINITY, f64::min);
    flat.map(|p| Point2::new(p.x - min_x, p.y))
}

fn piece_size(piece: &[Point2; 3]) -> (f64, f64) {
    let w = piece.iter().map(|p| p.x).fold(0.0, f64::max);
    let h = piece.iter().map(|p| p.y).fold(0.0, f64::max);
    (w, h)
}
