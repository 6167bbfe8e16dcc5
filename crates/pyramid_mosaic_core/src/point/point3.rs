use super::{point_traits::*, Point2, PointN};

use core::ops::{Add, Div, Mul, Range, Rem, Sub};
use itertools::{iproduct, ConsTuples, Product};
use std::cmp::Ordering;

/// A 3-dimensional point with scalar type `T`.
pub type Point3<T> = PointN<[T; 3]>;
/// A 3-dimensional point with scalar type `i32`.
pub type Point3i = PointN<[i32; 3]>;
/// A 3-dimensional point with scalar type `f64`.
pub type Point3d = PointN<[f64; 3]>;

impl<T> Point3<T>
where
    T: Copy,
{
    #[inline]
    pub fn x(&self) -> T {
        self.0[0]
    }

    #[inline]
    pub fn y(&self) -> T {
        self.0[1]
    }

    #[inline]
    pub fn z(&self) -> T {
        self.0[2]
    }

    #[inline]
    pub fn xy(&self) -> Point2<T> {
        PointN([self.x(), self.y()])
    }

    /// Extends a planar point with a `z` component.
    #[inline]
    pub fn from_xy(xy: Point2<T>, z: T) -> Self {
        PointN([xy.x(), xy.y(), z])
    }
}

impl Point3d {
    #[inline]
    pub fn as_3i(&self) -> Point3i {
        PointN([self.x() as i32, self.y() as i32, self.z() as i32])
    }
}

impl<T> Bounded for Point3<T>
where
    T: Bounded,
{
    const MAX: Self = PointN([T::MAX; 3]);
    const MIN: Self = PointN([T::MIN; 3]);
}

impl<T> MapComponents for Point3<T>
where
    T: Copy,
{
    type Scalar = T;

    #[inline]
    fn map_components_unary(&self, f: impl Fn(Self::Scalar) -> Self::Scalar) -> Self {
        PointN([f(self.x()), f(self.y()), f(self.z())])
    }

    #[inline]
    fn map_components_binary(
        &self,
        other: &Self,
        f: impl Fn(Self::Scalar, Self::Scalar) -> Self::Scalar,
    ) -> Self {
        PointN([
            f(self.x(), other.x()),
            f(self.y(), other.y()),
            f(self.z(), other.z()),
        ])
    }
}

impl<T> GetComponent for Point3<T>
where
    T: Copy,
{
    type Scalar = T;

    #[inline]
    fn at(&self, component_index: usize) -> T {
        self.0[component_index]
    }
}

impl<T> ConstZero for Point3<T>
where
    T: ConstZero,
{
    const ZERO: Self = PointN([T::ZERO; 3]);
}

impl<T> Ones for Point3<T>
where
    T: ConstOne,
{
    const ONES: Self = PointN([T::ONE; 3]);
}

impl Point for Point3i {
    type Scalar = i32;

    #[inline]
    fn fill(value: i32) -> Self {
        PointN([value; 3])
    }

    #[inline]
    fn volume(&self) -> i32 {
        self.x() * self.y() * self.z()
    }
}

impl Point for Point3d {
    type Scalar = f64;

    #[inline]
    fn fill(value: f64) -> Self {
        PointN([value; 3])
    }

    #[inline]
    fn volume(&self) -> f64 {
        self.x() * self.y() * self.z()
    }
}

impl IntegerPoint<[i32; 3]> for Point3i {
    #[inline]
    fn is_positive(&self) -> bool {
        self.x() > 0 && self.y() > 0 && self.z() > 0
    }
}

impl<T> DotProduct for Point3<T>
where
    T: Copy + Add<Output = T> + Mul<Output = T>,
{
    type Scalar = T;

    #[inline]
    fn dot(&self, other: &Self) -> Self::Scalar {
        self.x() * other.x() + self.y() * other.y() + self.z() * other.z()
    }
}

impl NormSquared for Point3d {
    #[inline]
    fn norm_squared(&self) -> f64 {
        self.dot(self)
    }
}

/// An iterator over all points in an `Extent3<T>`.
pub struct Extent3PointIter<T>
where
    T: Clone,
    Range<T>: Iterator<Item = T>,
{
    product_iter: ConsTuples<RangeProduct3<T>, ((T, T), T)>,
}

type RangeProduct2<T> = Product<Range<T>, Range<T>>;
type RangeProduct3<T> = Product<RangeProduct2<T>, Range<T>>;

impl<T> Iterator for Extent3PointIter<T>
where
    T: Clone,
    Range<T>: Iterator<Item = T>,
{
    type Item = Point3<T>;

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        self.product_iter.next().map(|(z, y, x)| PointN([x, y, z]))
    }
}

impl IterExtent<[i32; 3]> for Point3i {
    type PointIter = Extent3PointIter<i32>;

    #[inline(always)]
    fn iter_extent(min: &Point3i, lub: &Point3i) -> Self::PointIter {
        Extent3PointIter {
            // iproduct is opposite of row-major order.
            product_iter: iproduct!(min.z()..lub.z(), min.y()..lub.y(), min.x()..lub.x()),
        }
    }
}

// This particular partial order allows us to say that an `Extent3i` e contains a `Point3i` p iff p
// is GEQ the minimum of e and p is LEQ the maximum of e.
impl<T> PartialOrd for Point3<T>
where
    T: Copy + PartialOrd,
{
    #[inline]
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        if self < other {
            Some(Ordering::Less)
        } else if self > other {
            Some(Ordering::Greater)
        } else if self.x() == other.x() && self.y() == other.y() && self.z() == other.z() {
            Some(Ordering::Equal)
        } else {
            None
        }
    }

    #[inline]
    fn lt(&self, other: &Self) -> bool {
        self.x() < other.x() && self.y() < other.y() && self.z() < other.z()
    }

    #[inline]
    fn gt(&self, other: &Self) -> bool {
        self.x() > other.x() && self.y() > other.y() && self.z() > other.z()
    }

    #[inline]
    fn le(&self, other: &Self) -> bool {
        self.x() <= other.x() && self.y() <= other.y() && self.z() <= other.z()
    }

    #[inline]
    fn ge(&self, other: &Self) -> bool {
        self.x() >= other.x() && self.y() >= other.y() && self.z() >= other.z()
    }
}

impl From<Point3i> for Point3d {
    #[inline]
    fn from(p: Point3i) -> Self {
        PointN([p.x() as f64, p.y() as f64, p.z() as f64])
    }
}

impl_componentwise_ops!(Point3i, i32);
impl_componentwise_ops!(Point3d, f64);
impl_integer_ops!(Point3i);
impl_float_ops!(Point3d, f64);
