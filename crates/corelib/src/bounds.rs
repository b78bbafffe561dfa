use crate::Vec3;

/// Divisor applied to the bounding-box diagonal to get the mesh scale factor.
pub const DEFAULT_SCALE_DIVISOR: f32 = 7.2;

/// Where the min/max accumulators start before the first point is visited.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum BoundsSeed {
    /// Both extrema start at the origin, so the box always contains it.
    Origin,
    /// Both extrema start at the first point.
    #[default]
    FirstVertex,
}

/// Axis-aligned extrema over a point set.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Bounds {
    pub min: Vec3,
    pub max: Vec3,
}

impl Bounds {
    pub const ZERO: Self = Self {
        min: Vec3::ZERO,
        max: Vec3::ZERO,
    };

    /// Per-axis min/max of `points`. An empty set yields [`Bounds::ZERO`].
    pub fn from_points<I>(points: I, seed: BoundsSeed) -> Self
    where
        I: IntoIterator<Item = Vec3>,
    {
        let mut points = points.into_iter();
        let mut bounds = match seed {
            BoundsSeed::Origin => Self::ZERO,
            BoundsSeed::FirstVertex => match points.next() {
                Some(p) => Self { min: p, max: p },
                None => return Self::ZERO,
            },
        };
        for p in points {
            bounds.min = bounds.min.min(p);
            bounds.max = bounds.max.max(p);
        }
        bounds
    }

    #[inline]
    pub fn extent(&self) -> Vec3 {
        self.max - self.min
    }

    #[inline]
    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    /// Length of the diagonal divided by `divisor`.
    #[inline]
    pub fn scale_factor(&self, divisor: f32) -> f32 {
        self.extent().length() / divisor
    }
}

impl Default for Bounds {
    fn default() -> Self {
        Self::ZERO
    }
}
