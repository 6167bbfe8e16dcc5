use crate::{point::point_traits::*, Extent3d, Point3d, PointN};

use serde::{Deserialize, Serialize};

/// A 3D affine transform stored as the top three rows of a homogeneous 4x4 matrix. Pyramid levels use these to map voxel
/// coordinates into world coordinates.
///
/// ```
/// use pyramid_mosaic_core::prelude::*;
///
/// let t = Affine3::from_scale(PointN([2.0, 2.0, 1.0])).then_translate(PointN([10.0, 0.0, 0.0]));
///
/// assert_eq!(t.apply(PointN([1.0, 1.0, 1.0])), PointN([12.0, 2.0, 1.0]));
/// ```
#[derive(Clone, Copy, Debug, Deserialize, PartialEq, Serialize)]
pub struct Affine3 {
    pub rows: [[f64; 4]; 3],
}

impl Default for Affine3 {
    #[inline]
    fn default() -> Self {
        Self::identity()
    }
}

impl Affine3 {
    #[inline]
    pub const fn identity() -> Self {
        Self {
            rows: [
                [1.0, 0.0, 0.0, 0.0],
                [0.0, 1.0, 0.0, 0.0],
                [0.0, 0.0, 1.0, 0.0],
            ],
        }
    }

    #[inline]
    pub fn from_rows(rows: [[f64; 4]; 3]) -> Self {
        Self { rows }
    }

    /// Scales each axis independently.
    #[inline]
    pub fn from_scale(scale: Point3d) -> Self {
        let mut t = Self::identity();
        for axis in 0..3 {
            t.rows[axis][axis] = scale.at(axis);
        }

        t
    }

    #[inline]
    pub fn from_translation(translation: Point3d) -> Self {
        Self::identity().then_translate(translation)
    }

    /// The translation column.
    #[inline]
    pub fn translation(&self) -> Point3d {
        PointN([self.rows[0][3], self.rows[1][3], self.rows[2][3]])
    }

    /// Returns the transform that applies `self` and then translates by `delta`.
    #[inline]
    pub fn then_translate(&self, delta: Point3d) -> Self {
        let mut t = *self;
        for axis in 0..3 {
            t.rows[axis][3] += delta.at(axis);
        }

        t
    }

    /// Transforms a point, including the translation.
    #[inline]
    pub fn apply(&self, p: Point3d) -> Point3d {
        self.apply_linear(p) + self.translation()
    }

    /// Transforms a direction, ignoring the translation.
    #[inline]
    pub fn apply_linear(&self, v: Point3d) -> Point3d {
        let r = &self.rows;
        PointN([
            r[0][0] * v.x() + r[0][1] * v.y() + r[0][2] * v.z(),
            r[1][0] * v.x() + r[1][1] * v.y() + r[1][2] * v.z(),
            r[2][0] * v.x() + r[2][1] * v.y() + r[2][2] * v.z(),
        ])
    }

    /// Returns `self ∘ inner`, i.e. the transform that applies `inner` first.
    pub fn compose(&self, inner: &Self) -> Self {
        let a = &self.rows;
        let b = &inner.rows;
        let mut rows = [[0.0; 4]; 3];
        for i in 0..3 {
            for j in 0..4 {
                let mut sum = if j == 3 { a[i][3] } else { 0.0 };
                for k in 0..3 {
                    sum += a[i][k] * b[k][j];
                }
                rows[i][j] = sum;
            }
        }

        Self { rows }
    }

    #[inline]
    pub fn determinant(&self) -> f64 {
        let m = &self.rows;

        m[0][0] * (m[1][1] * m[2][2] - m[1][2] * m[2][1])
            - m[0][1] * (m[1][0] * m[2][2] - m[1][2] * m[2][0])
            + m[0][2] * (m[1][0] * m[2][1] - m[1][1] * m[2][0])
    }

    /// The inverse transform, or `None` if the linear part is singular.
    pub fn inverse(&self) -> Option<Self> {
        let det = self.determinant();
        if det == 0.0 || !det.is_finite() {
            return None;
        }
        let m = &self.rows;
        let inv_det = 1.0 / det;

        let mut rows = [[0.0; 4]; 3];
        rows[0][0] = (m[1][1] * m[2][2] - m[1][2] * m[2][1]) * inv_det;
        rows[0][1] = (m[0][2] * m[2][1] - m[0][1] * m[2][2]) * inv_det;
        rows[0][2] = (m[0][1] * m[1][2] - m[0][2] * m[1][1]) * inv_det;
        rows[1][0] = (m[1][2] * m[2][0] - m[1][0] * m[2][2]) * inv_det;
        rows[1][1] = (m[0][0] * m[2][2] - m[0][2] * m[2][0]) * inv_det;
        rows[1][2] = (m[0][2] * m[1][0] - m[0][0] * m[1][2]) * inv_det;
        rows[2][0] = (m[1][0] * m[2][1] - m[1][1] * m[2][0]) * inv_det;
        rows[2][1] = (m[0][1] * m[2][0] - m[0][0] * m[2][1]) * inv_det;
        rows[2][2] = (m[0][0] * m[1][1] - m[0][1] * m[1][0]) * inv_det;

        let linear = Self { rows };
        let t = linear.apply_linear(self.translation());

        Some(linear.then_translate(-t))
    }

    /// The length of the world-space vector that one voxel step along `axis` maps to.
    #[inline]
    pub fn column_norm(&self, axis: usize) -> f64 {
        let r = &self.rows;
        let column: Point3d = PointN([r[0][axis], r[1][axis], r[2][axis]]);

        column.norm()
    }

    /// Per-axis world size of one voxel.
    #[inline]
    pub fn voxel_size(&self) -> Point3d {
        PointN([self.column_norm(0), self.column_norm(1), self.column_norm(2)])
    }

    /// The axis-aligned bounding box of the image of `extent`'s eight corners.
    pub fn estimate_bounds(&self, extent: &Extent3d) -> Extent3d {
        let lo = extent.minimum;
        let hi = extent.least_upper_bound();

        let mut min = Point3d::MAX;
        let mut max = Point3d::MIN;
        for corner in 0..8 {
            let c = PointN([
                if corner & 1 == 0 { lo.x() } else { hi.x() },
                if corner & 2 == 0 { lo.y() } else { hi.y() },
                if corner & 4 == 0 { lo.z() } else { hi.z() },
            ]);
            let p = self.apply(c);
            min = min.meet(&p);
            max = max.join(&p);
        }

        Extent3d::from_bounds(min, max)
    }
}

// ████████╗███████╗███████╗████████╗
// ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝
//    ██║   █████╗  ███████╗   ██║
//    ██║   ██╔══╝  ╚════██║   ██║
//    ██║   ███████╗███████║   ██║
//    ╚═╝   ╚══════╝╚══════╝   ╚═╝
