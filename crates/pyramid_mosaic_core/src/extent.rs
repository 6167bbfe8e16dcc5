use crate::{point::point_traits::*, PointN};

use core::ops::{Add, AddAssign, Sub, SubAssign};
use num::Zero;
use serde::{Deserialize, Serialize};

/// A 2-dimensional extent with scalar type `T`.
pub type Extent2<T> = ExtentN<[T; 2]>;
/// A 2-dimensional extent with scalar type `i32`.
pub type Extent2i = ExtentN<[i32; 2]>;
/// A 3-dimensional extent with scalar type `T`.
pub type Extent3<T> = ExtentN<[T; 3]>;
/// A 3-dimensional extent with scalar type `i32`.
pub type Extent3i = ExtentN<[i32; 3]>;
/// A 3-dimensional extent with scalar type `f64`. Used for real-valued regions in world space.
pub type Extent3d = ExtentN<[f64; 3]>;

/// An N-dimensional extent. This is mathematically the Cartesian product of a half-closed interval `[a, b)` in each dimension.
/// You can also just think of it as an axis-aligned box with some shape and a minimum point. Voxel intervals of a pyramid
/// level, mosaic cells and cache chunks are all expressed as extents.
#[derive(Debug, Deserialize, Eq, Serialize)]
pub struct ExtentN<N> {
    /// The least point contained in the extent.
    pub minimum: PointN<N>,
    /// The length of each dimension.
    pub shape: PointN<N>,
}

// Derive would put bounds on `N` instead of `PointN<N>`.

impl<N> Clone for ExtentN<N>
where
    PointN<N>: Clone,
{
    #[inline]
    fn clone(&self) -> Self {
        Self {
            minimum: self.minimum.clone(),
            shape: self.shape.clone(),
        }
    }
}
impl<N> Copy for ExtentN<N> where PointN<N>: Copy {}

impl<N> PartialEq for ExtentN<N>
where
    PointN<N>: PartialEq,
{
    #[inline]
    fn eq(&self, other: &Self) -> bool {
        self.minimum.eq(&other.minimum) && self.shape.eq(&other.shape)
    }
}

impl<N> ExtentN<N> {
    /// The default representation of an extent as the minimum point and shape.
    #[inline]
    pub fn from_min_and_shape(minimum: PointN<N>, shape: PointN<N>) -> Self {
        Self { minimum, shape }
    }
}

impl<N> ExtentN<N>
where
    PointN<N>: Point,
{
    #[inline]
    pub fn volume(&self) -> <PointN<N> as Point>::Scalar {
        self.shape.volume()
    }

    /// Translate the extent such that it has `new_min` as it's new minimum.
    #[inline]
    pub fn with_minimum(&self, new_min: PointN<N>) -> Self {
        Self::from_min_and_shape(new_min, self.shape)
    }

    /// The least point `p` for which all points `q` in the extent satisfy `q < p`.
    #[inline]
    pub fn least_upper_bound(&self) -> PointN<N> {
        self.minimum + self.shape
    }

    /// Returns `true` iff the point `p` is contained in this extent.
    #[inline]
    pub fn contains(&self, p: PointN<N>) -> bool {
        let lub = self.least_upper_bound();

        self.minimum <= p && p < lub
    }

    /// An alternative representation of an extent as the minimum point and least upper bound. Components of `least_upper_bound`
    /// below `minimum` produce a zero-length dimension.
    #[inline]
    pub fn from_min_and_lub(minimum: PointN<N>, least_upper_bound: PointN<N>) -> Self {
        let shape = (least_upper_bound - minimum).join(&PointN::zero());

        Self { minimum, shape }
    }

    /// Returns the extent containing only the points in both `self` and `other`.
    #[inline]
    pub fn intersection(&self, other: &Self) -> Self {
        let minimum = self.minimum.join(&other.minimum);
        let lub = self.least_upper_bound().meet(&other.least_upper_bound());

        Self::from_min_and_lub(minimum, lub)
    }

    /// Returns `true` iff the intersection of `self` and `other` is equal to `self`.
    #[inline]
    pub fn is_subset_of(&self, other: &Self) -> bool {
        self.intersection(other).eq(self)
    }

    /// The smallest extent containing both `self` and `other`.
    #[inline]
    pub fn union_bounds(&self, other: &Self) -> Self {
        Self::from_min_and_lub(
            self.minimum.meet(&other.minimum),
            self.least_upper_bound().join(&other.least_upper_bound()),
        )
    }
}

impl<N> ExtentN<N>
where
    PointN<N>: IntegerPoint<N>,
{
    /// The number of points contained in the extent.
    #[inline]
    pub fn num_points(&self) -> usize {
        self.volume().max(0) as usize
    }

    /// Returns `true` iff the number of points in the extent is 0.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.num_points() == 0
    }

    /// An alternative representation of an integer extent as the minimum point and maximum point. This only works for integer
    /// extents, where there is a unique maximum point.
    #[inline]
    pub fn from_min_and_max(minimum: PointN<N>, max: PointN<N>) -> Self {
        Self::from_min_and_lub(minimum, max + PointN::ONES)
    }

    /// The unique greatest point in the extent.
    #[inline]
    pub fn max(&self) -> PointN<N> {
        self.least_upper_bound() - PointN::ONES
    }

    /// Iterate over all points in the extent.
    /// ```
    /// # use pyramid_mosaic_core::prelude::*;
    /// #
    /// let extent = Extent3i::from_min_and_shape(PointN([0, 0, 0]), PointN([2, 2, 1]));
    /// let points = extent.iter_points().collect::<Vec<_>>();
    /// assert_eq!(points, vec![
    ///     PointN([0, 0, 0]), PointN([1, 0, 0]), PointN([0, 1, 0]), PointN([1, 1, 0])
    /// ]);
    /// ```
    #[inline]
    pub fn iter_points(&self) -> <PointN<N> as IterExtent<N>>::PointIter {
        PointN::iter_extent(&self.minimum, &self.least_upper_bound())
    }
}

impl Extent3d {
    /// A real-valued extent spanning the closed box between `minimum` and `max`.
    #[inline]
    pub fn from_bounds(minimum: PointN<[f64; 3]>, max: PointN<[f64; 3]>) -> Self {
        Self::from_min_and_lub(minimum, max)
    }

    /// The smallest integer extent that covers every voxel touched by this real extent, i.e. `[floor(min), ceil(max))`.
    /// A zero-width axis still touches the voxel it lies in, so it covers one voxel.
    #[inline]
    pub fn covering_voxels(&self) -> Extent3i {
        let min = self.minimum.floor().as_3i();
        let mut lub = self.least_upper_bound().ceil().as_3i();
        for axis in 0..3 {
            if self.shape.0[axis] == 0.0 && lub.0[axis] <= min.0[axis] {
                lub.0[axis] = min.0[axis] + 1;
            }
        }

        Extent3i::from_min_and_lub(min, lub)
    }
}

impl From<Extent3i> for Extent3d {
    #[inline]
    fn from(e: Extent3i) -> Self {
        Self::from_min_and_shape(e.minimum.into(), e.shape.into())
    }
}

impl<T> Add<PointN<T>> for ExtentN<T>
where
    PointN<T>: Add<Output = PointN<T>>,
{
    type Output = Self;

    #[inline]
    fn add(self, rhs: PointN<T>) -> Self::Output {
        ExtentN {
            minimum: self.minimum + rhs,
            shape: self.shape,
        }
    }
}

impl<T> Sub<PointN<T>> for ExtentN<T>
where
    PointN<T>: Sub<Output = PointN<T>>,
{
    type Output = Self;

    #[inline]
    fn sub(self, rhs: PointN<T>) -> Self::Output {
        ExtentN {
            minimum: self.minimum - rhs,
            shape: self.shape,
        }
    }
}

impl<T> AddAssign<PointN<T>> for ExtentN<T>
where
    Self: Copy + Add<PointN<T>, Output = ExtentN<T>>,
{
    #[inline]
    fn add_assign(&mut self, rhs: PointN<T>) {
        *self = *self + rhs;
    }
}

impl<T> SubAssign<PointN<T>> for ExtentN<T>
where
    Self: Copy + Sub<PointN<T>, Output = ExtentN<T>>,
{
    #[inline]
    fn sub_assign(&mut self, rhs: PointN<T>) {
        *self = *self - rhs;
    }
}

/// Returns the smallest extent containing all of the given points, or `None` if there are no points.
#[inline]
pub fn bounding_extent<N, I>(mut points: I) -> Option<ExtentN<N>>
where
    I: Iterator<Item = PointN<N>>,
    PointN<N>: IntegerPoint<N>,
{
    let first_point = points.next()?;

    let mut min_point = first_point;
    let mut max_point = first_point;
    for p in points {
        min_point = min_point.meet(&p);
        max_point = max_point.join(&p);
    }

    Some(ExtentN::from_min_and_max(min_point, max_point))
}

// ████████╗███████╗███████╗████████╗
// ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝
//    ██║   █████╗  ███████╗   ██║
//    ██║   ██╔══╝  ╚════██║   ██║
//    ██║   ███████╗███████║   ██║
//    ╚═╝   ╚══════╝╚══════╝   ╚═╝

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn row_major_extent_iter2() {
        let extent = Extent2i::from_min_and_shape(PointN([0, 0]), PointN([2, 2]));

        let points: Vec<_> = extent.iter_points().collect();

        assert_eq!(
            points,
            vec![
                PointN([0, 0]),
                PointN([1, 0]),
                PointN([0, 1]),
                PointN([1, 1]),
            ]
        );
    }

    #[test]
    fn row_major_extent_iter3() {
        let extent = Extent3i::from_min_and_shape(PointN([0, 0, 0]), PointN([2, 2, 2]));

        let points: Vec<_> = extent.iter_points().collect();

        assert_eq!(
            points,
            vec![
                PointN([0, 0, 0]),
                PointN([1, 0, 0]),
                PointN([0, 1, 0]),
                PointN([1, 1, 0]),
                PointN([0, 0, 1]),
                PointN([1, 0, 1]),
                PointN([0, 1, 1]),
                PointN([1, 1, 1]),
            ]
        );
    }

    #[test]
    fn empty_intersection_is_empty() {
        let e1 = Extent2i::from_min_and_max(PointN([0; 2]), PointN([1; 2]));
        let e2 = Extent2i::from_min_and_max(PointN([3; 2]), PointN([4; 2]));

        // A naive implementation might say the shape is [-1, -1].
        assert_eq!(e1.intersection(&e2).shape, PointN([0; 2]));
        assert!(e1.intersection(&e2).is_empty());
    }

    #[test]
    fn bounding_extent_of_points() {
        let points = vec![PointN([2, 0, 1]), PointN([-1, 4, 1]), PointN([0, 0, 0])];

        assert_eq!(
            bounding_extent(points.into_iter()),
            Some(Extent3i::from_min_and_max(
                PointN([-1, 0, 0]),
                PointN([2, 4, 1])
            ))
        );
        assert_eq!(bounding_extent::<[i32; 3], _>(std::iter::empty()), None);
    }

    #[test]
    fn real_extent_covers_touched_voxels() {
        let e = Extent3d::from_bounds(PointN([0.5, -1.2, 0.0]), PointN([2.0, 0.1, 0.9]));

        assert_eq!(
            e.covering_voxels(),
            Extent3i::from_min_and_lub(PointN([0, -2, 0]), PointN([2, 1, 1]))
        );
    }

    #[test]
    fn flat_real_extent_covers_one_plane() {
        let flat = Extent3d::from_bounds(PointN([0.5, 1.0, 2.0]), PointN([2.0, 3.0, 2.0]));
        assert_eq!(
            flat.covering_voxels(),
            Extent3i::from_min_and_lub(PointN([0, 1, 2]), PointN([2, 3, 3]))
        );

        let point = Extent3d::from_bounds(PointN([1.5; 3]), PointN([1.5; 3]));
        assert_eq!(point.covering_voxels(), Extent3i::from_min_and_shape(PointN([1; 3]), PointN([1; 3])));
    }

    #[test]
    fn union_and_subset() {
        let a = Extent3i::from_min_and_shape(PointN([0; 3]), PointN([2; 3]));
        let b = Extent3i::from_min_and_shape(PointN([4, 0, 0]), PointN([1; 3]));
        let u = a.union_bounds(&b);

        assert_eq!(u, Extent3i::from_min_and_lub(PointN([0; 3]), PointN([5, 2, 2])));
        assert!(a.is_subset_of(&u));
        assert!(!u.is_subset_of(&a));
    }
}
