use crate::config::{Config, DEFAULT_SEED};
use crate::error::{GeometryError, Result};
use crate::fast_rng::FastRng;
use crate::subdivision::{Branch, SubdivCode};
use crate::{Point, NCOR, NDIM};
use nalgebra::{Matrix3, Vector3};

/// Local axis along which a box is split.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SplitDirection {
    X,
    Y,
    Z,
    /// Split along the currently longest dimension
    Auto,
}

impl SplitDirection {
    fn axis_index(self) -> Option<usize> {
        match self {
            SplitDirection::X => Some(0),
            SplitDirection::Y => Some(1),
            SplitDirection::Z => Some(2),
            SplitDirection::Auto => None,
        }
    }
}

/// An oriented rectangular region of space.
///
/// The box is described by its center, an orthonormal frame `ex, ey, ez` and
/// the half-extents `dims` along each frame vector. Corners, bounds and
/// volume are derived once at construction; apart from its private random
/// stream, a box never changes afterwards.
///
/// The box owns its stream exclusively, which is why it is not `Clone`.
#[derive(Debug)]
pub struct BoundingBox {
    pub center: Point,
    pub ex: Point,
    pub ey: Point,
    pub ez: Point,
    /// Half-extents along ex, ey and ez
    pub dims: [f64; NDIM],
    /// Lower bounds of `e_i · x` for points inside the box
    pub lb: [f64; NDIM],
    /// Upper bounds of `e_i · x` for points inside the box
    pub ub: [f64; NDIM],
    /// Vertices, ex sign varying slowest and ez sign fastest
    pub corners: [Point; NCOR],
    pub volume: f64,
    pub subdiv: SubdivCode,
    seed: u64,
    rng: FastRng,
}

impl BoundingBox {
    /// Create a root box with the default stream seed.
    ///
    /// `xdim`, `ydim` and `zdim` are full edge lengths along `ex`, `ey` and
    /// `ez`. The frame is expected to be orthonormal; this is not checked.
    pub fn new(
        center: Point,
        ex: Point,
        ey: Point,
        ez: Point,
        xdim: f64,
        ydim: f64,
        zdim: f64,
    ) -> Result<Self> {
        Self::with_seed(center, ex, ey, ez, xdim, ydim, zdim, DEFAULT_SEED)
    }

    /// Create a root box whose random stream is derived from `seed`.
    #[allow(clippy::too_many_arguments)]
    pub fn with_seed(
        center: Point,
        ex: Point,
        ey: Point,
        ez: Point,
        xdim: f64,
        ydim: f64,
        zdim: f64,
        seed: u64,
    ) -> Result<Self> {
        let dims = [0.5 * xdim, 0.5 * ydim, 0.5 * zdim];
        for (axis, &value) in dims.iter().enumerate() {
            if !value.is_finite() || value <= 0.0 {
                return Err(GeometryError::InvalidDimension { axis, value });
            }
        }
        Ok(Self::assemble(
            center,
            [ex, ey, ez],
            dims,
            SubdivCode::ROOT,
            seed,
        ))
    }

    /// Create a root box seeded from `config.seed`.
    #[allow(clippy::too_many_arguments)]
    pub fn from_config(
        center: Point,
        ex: Point,
        ey: Point,
        ez: Point,
        xdim: f64,
        ydim: f64,
        zdim: f64,
        config: &Config,
    ) -> Result<Self> {
        Self::with_seed(center, ex, ey, ez, xdim, ydim, zdim, config.seed)
    }

    /// Axis-aligned root box spanning `lower_left..upper_right`.
    pub fn from_bounds(lower_left: [f64; 3], upper_right: [f64; 3]) -> Result<Self> {
        Self::bounded(lower_left, upper_right, DEFAULT_SEED)
    }

    /// Same as [`BoundingBox::from_bounds`], seeded from `config.seed`.
    pub fn from_bounds_with_config(
        lower_left: [f64; 3],
        upper_right: [f64; 3],
        config: &Config,
    ) -> Result<Self> {
        Self::bounded(lower_left, upper_right, config.seed)
    }

    fn bounded(lower_left: [f64; 3], upper_right: [f64; 3], seed: u64) -> Result<Self> {
        let center = Point::new(
            0.5 * (lower_left[0] + upper_right[0]),
            0.5 * (lower_left[1] + upper_right[1]),
            0.5 * (lower_left[2] + upper_right[2]),
        );
        Self::with_seed(
            center,
            Vector3::x(),
            Vector3::y(),
            Vector3::z(),
            upper_right[0] - lower_left[0],
            upper_right[1] - lower_left[1],
            upper_right[2] - lower_left[2],
            seed,
        )
    }

    fn assemble(
        center: Point,
        basis: [Point; NDIM],
        dims: [f64; NDIM],
        subdiv: SubdivCode,
        seed: u64,
    ) -> Self {
        let [ex, ey, ez] = basis;
        let mut lb = [0.0; NDIM];
        let mut ub = [0.0; NDIM];
        for i in 0..NDIM {
            let c = basis[i].dot(&center);
            lb[i] = c - dims[i];
            ub[i] = c + dims[i];
        }

        let mut corners = [center; NCOR];
        for (i, corner) in corners.iter_mut().enumerate() {
            let sx = if i & 4 == 0 { -1.0 } else { 1.0 };
            let sy = if i & 2 == 0 { -1.0 } else { 1.0 };
            let sz = if i & 1 == 0 { -1.0 } else { 1.0 };
            corner.axpy(sx * dims[0], &ex, 1.0);
            corner.axpy(sy * dims[1], &ey, 1.0);
            corner.axpy(sz * dims[2], &ez, 1.0);
        }

        BoundingBox {
            center,
            ex,
            ey,
            ez,
            dims,
            lb,
            ub,
            corners,
            volume: 8.0 * dims[0] * dims[1] * dims[2],
            subdiv,
            seed,
            rng: FastRng::for_box(seed, subdiv.raw()),
        }
    }

    /// Frame vectors in ex, ey, ez order.
    pub fn basis(&self) -> [Point; NDIM] {
        [self.ex, self.ey, self.ez]
    }

    /// Root seed of the decomposition this box belongs to.
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Matrix whose rows are the frame vectors; maps global points to frame
    /// coordinates `(ex·x, ey·x, ez·x)`.
    pub fn frame(&self) -> Matrix3<f64> {
        Matrix3::from_rows(&[
            self.ex.transpose(),
            self.ey.transpose(),
            self.ez.transpose(),
        ])
    }

    /// Frame coordinates of a global point. Inside points satisfy
    /// `lb[i] <= t[i] <= ub[i]`.
    pub fn to_local(&self, x: &Point) -> Point {
        Point::new(self.ex.dot(x), self.ey.dot(x), self.ez.dot(x))
    }

    /// Global point with frame coordinates `t`.
    pub fn to_global(&self, t: &Point) -> Point {
        self.ex * t[0] + self.ey * t[1] + self.ez * t[2]
    }

    /// Full edge lengths along ex, ey and ez.
    pub fn extents(&self) -> [f64; NDIM] {
        [2.0 * self.dims[0], 2.0 * self.dims[1], 2.0 * self.dims[2]]
    }

    /// Test which points lie inside the box (bounds inclusive).
    ///
    /// This is a pure frame-projection test, not a surface test. Bounds are
    /// widened by a few ULPs so that points produced by
    /// [`generate_random_points`](Self::generate_random_points) on a rotated
    /// frame are not rejected by rounding in the projection.
    pub fn test_points(&self, points: &[Point]) -> Vec<bool> {
        points.iter().map(|p| self.contains(p)).collect()
    }

    /// Whether a single point lies inside the box (bounds inclusive).
    pub fn contains(&self, point: &Point) -> bool {
        let t = self.to_local(point);
        (0..NDIM).all(|i| {
            let slack = 8.0 * f64::EPSILON * (self.lb[i].abs().max(self.ub[i].abs()) + self.dims[i]);
            t[i] >= self.lb[i] - slack && t[i] <= self.ub[i] + slack
        })
    }

    /// Values of the six linear constraints that confine a point to the box.
    ///
    /// Entries `2i` and `2i+1` are `e_i·x - ub[i]` and `lb[i] - e_i·x`; all of
    /// them are non-positive exactly when `x` is inside.
    pub fn ieqcons(&self, x: &Point) -> [f64; 2 * NDIM] {
        let t = self.to_local(x);
        let mut result = [0.0; 2 * NDIM];
        for i in 0..NDIM {
            result[2 * i] = t[i] - self.ub[i];
            result[2 * i + 1] = self.lb[i] - t[i];
        }
        result
    }

    /// Draw `n` points uniformly distributed over the box volume from the
    /// box's own stream.
    pub fn generate_random_points(&mut self, n: usize) -> Vec<Point> {
        let mut points = Vec::with_capacity(n);
        for _ in 0..n {
            let u = self.rng.symmetric();
            let v = self.rng.symmetric();
            let w = self.rng.symmetric();
            let mut p = self.center;
            p.axpy(u * self.dims[0], &self.ex, 1.0);
            p.axpy(v * self.dims[1], &self.ey, 1.0);
            p.axpy(w * self.dims[2], &self.ez, 1.0);
            points.push(p);
        }
        points
    }

    /// Split the box in two along `dir` at fraction `ratio` of that axis's
    /// length, measured from the lower bound.
    ///
    /// Both children keep the frame and the other two dimensions. The first
    /// child is the low side and the second the high side; their subdivision
    /// codes extend this box's code with the matching branch, and each gets
    /// its own stream.
    pub fn split(&self, dir: SplitDirection, ratio: f64) -> Result<(BoundingBox, BoundingBox)> {
        if !(ratio > 0.0 && ratio < 1.0) {
            return Err(GeometryError::InvalidSplitRatio(ratio));
        }
        let axis = dir.axis_index().unwrap_or_else(|| self.longest_axis());
        let half = self.dims[axis];
        let low_half = ratio * half;
        let high_half = (1.0 - ratio) * half;
        if !(low_half > 0.0 && high_half > 0.0 && half.is_finite()) {
            return Err(GeometryError::DegenerateDimension { axis, value: half });
        }

        let low_code = self.subdiv.child(Branch::Low)?;
        let high_code = self.subdiv.child(Branch::High)?;
        let direction = self.basis()[axis];

        let mut low_dims = self.dims;
        low_dims[axis] = low_half;
        let mut low_center = self.center;
        low_center.axpy(-high_half, &direction, 1.0);

        let mut high_dims = self.dims;
        high_dims[axis] = high_half;
        let mut high_center = self.center;
        high_center.axpy(low_half, &direction, 1.0);

        log::trace!(
            "split {} along axis {} at ratio {}: half-extents {} + {}",
            self.subdiv,
            axis,
            ratio,
            low_half,
            high_half
        );

        Ok((
            Self::assemble(low_center, self.basis(), low_dims, low_code, self.seed),
            Self::assemble(high_center, self.basis(), high_dims, high_code, self.seed),
        ))
    }

    /// Index of the longest dimension, the first one on ties.
    fn longest_axis(&self) -> usize {
        let mut axis = 0;
        for i in 1..NDIM {
            if self.dims[i] > self.dims[axis] {
                axis = i;
            }
        }
        axis
    }

    /// Structural containment of this box in the cell with code `other`.
    pub fn is_in(&self, other: SubdivCode) -> crate::subdivision::Containment {
        crate::subdivision::is_in(self.subdiv, other)
    }
}
