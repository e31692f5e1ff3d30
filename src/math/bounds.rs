use super::{Point2, Point3, Vector3};

/// An axis-aligned bounding box in 3D.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds3 {
    /// Minimum corner.
    pub min: Point3,
    /// Maximum corner.
    pub max: Point3,
}

impl Bounds3 {
    /// Computes the bounds of a point set, or `None` if it is empty.
    pub fn from_points<'a, I>(points: I) -> Option<Self>
    where
        I: IntoIterator<Item = &'a Point3>,
    {
        let mut iter = points.into_iter();
        let first = *iter.next()?;
        let mut bounds = Self {
            min: first,
            max: first,
        };
        for p in iter {
            bounds.extend(p);
        }
        Some(bounds)
    }

    /// Grows the box to include `p`.
    pub fn extend(&mut self, p: &Point3) {
        self.min = self.min.inf(p);
        self.max = self.max.sup(p);
    }

    /// Returns the union of two boxes.
    #[must_use]
    pub fn union(&self, other: &Self) -> Self {
        Self {
            min: self.min.inf(&other.min),
            max: self.max.sup(&other.max),
        }
    }

    /// Returns the box grown by `offset` on every side.
    #[must_use]
    pub fn inflated(&self, offset: f64) -> Self {
        let d = Vector3::repeat(offset);
        Self {
            min: self.min - d,
            max: self.max + d,
        }
    }

    /// Extent along each axis.
    #[must_use]
    pub fn size(&self) -> Vector3 {
        self.max - self.min
    }

    /// Centre of the box.
    #[must_use]
    pub fn center(&self) -> Point3 {
        nalgebra::center(&self.min, &self.max)
    }
}

/// An axis-aligned bounding rectangle in 2D.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds2 {
    /// Minimum corner.
    pub min: Point2,
    /// Maximum corner.
    pub max: Point2,
}

impl Bounds2 {
    /// Computes the bounds of a point set, or `None` if it is empty.
    pub fn from_points<'a, I>(points: I) -> Option<Self>
    where
        I: IntoIterator<Item = &'a Point2>,
    {
        let mut iter = points.into_iter();
        let first = *iter.next()?;
        let mut min = first;
        let mut max = first;
        for p in iter {
            min = min.inf(p);
            max = max.sup(p);
        }
        Some(Self { min, max })
    }

    /// Width of the rectangle.
    #[must_use]
    pub fn width(&self) -> f64 {
        self.max.x - self.min.x
    }

    /// Height of the rectangle.
    #[must_use]
    pub fn height(&self) -> f64 {
        self.max.y - self.min.y
    }

    /// Centre of the rectangle.
    #[must_use]
    pub fn center(&self) -> Point2 {
        nalgebra::center(&self.min, &self.max)
    }
}
