#[macro_use]
pub mod point_traits;

mod point2;
mod point3;

pub use point2::*;
pub use point3::*;

use point_traits::*;

use core::ops::{Add, AddAssign, Neg, Sub, SubAssign};
use num::Zero;
use serde::{Deserialize, Serialize};

/// An N-dimensional point (where N=2 or N=3), which is usually just a primitive array of type `D`.
/// It is most convenient to construct points of any dimension as:
///
/// ```
/// use pyramid_mosaic_core::PointN;
///
/// let p2 = PointN([1, 2]); // 2D
/// let p3 = PointN([1, 2, 3]); // 3D
/// ```
///
/// Points support basic linear algebraic operations such as addition, subtraction, scalar
/// multiplication, and scalar division. Integer division always rounds towards negative infinity.
///
/// ```
/// use pyramid_mosaic_core::PointN;
///
/// let p1 = PointN([1, 2]);
/// let p2 = PointN([3, 4]);
///
/// assert_eq!(p1 + p2, PointN([4, 6]));
/// assert_eq!(p1 - p2, PointN([-2, -2]));
///
/// assert_eq!(p1 * 2, PointN([2, 4]));
/// assert_eq!(p1 / 2, PointN([0, 1]));
/// assert_eq!(PointN([-1, -3]) / 2, PointN([-1, -2]));
/// ```
///
/// There is also a partial order defined on points which says that a point A is greater than a
/// point B if and only if all of the components of point A are greater than point B. This is useful
/// for easily checking is a point is inside of the extent between two other points:
///
/// ```
/// use pyramid_mosaic_core::PointN;
///
/// let min = PointN([0, 0, 0]);
/// let least_upper_bound = PointN([3, 3, 3]);
///
/// let p = PointN([0, 1, 2]);
/// assert!(min <= p && p < least_upper_bound);
/// ```
#[derive(Copy, Clone, Debug, Deserialize, Default, Eq, Hash, PartialEq, Serialize)]
pub struct PointN<N>(pub N);

impl<N> Neg for PointN<N>
where
    Self: Copy + Sub<Output = Self> + Zero,
{
    type Output = Self;

    #[inline]
    fn neg(self) -> Self::Output {
        Self::zero() - self
    }
}

impl<N> AddAssign for PointN<N>
where
    Self: Copy + Add<Output = Self>,
{
    #[inline]
    fn add_assign(&mut self, rhs: Self) {
        *self = *self + rhs;
    }
}

impl<N> SubAssign for PointN<N>
where
    Self: Copy + Sub<Output = Self>,
{
    #[inline]
    fn sub_assign(&mut self, rhs: Self) {
        *self = *self - rhs;
    }
}

impl<N> Zero for PointN<N>
where
    Self: Add<Output = Self> + ConstZero + PartialEq,
{
    #[inline]
    fn zero() -> Self {
        Self::ZERO
    }

    #[inline]
    fn is_zero(&self) -> bool {
        *self == Self::ZERO
    }
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
    fn integer_division_rounds_down() {
        assert_eq!(PointN([7, -7, 0]) / 2, PointN([3, -4, 0]));
        assert_eq!(
            PointN([7, -7, 9]) / PointN([2, 2, 3]),
            PointN([3, -4, 3])
        );
        assert_eq!(
            PointN([7, -7, 9]).vector_div_ceil(&PointN([2, 2, 4])),
            PointN([4, -3, 3])
        );
    }

    #[test]
    fn remainder_is_never_negative() {
        assert_eq!(
            PointN([7, -7, -3]).vector_rem_euclid(&PointN([4, 4, 3])),
            PointN([3, 1, 0])
        );
    }

    #[test]
    fn lattice_order() {
        let a = PointN([1, 5, 2]);
        let b = PointN([3, 0, 2]);

        assert_eq!(a.join(&b), PointN([3, 5, 2]));
        assert_eq!(a.meet(&b), PointN([1, 0, 2]));
        assert!(!(a < b) && !(a > b));
    }

    #[test]
    fn real_point_rounding() {
        let p: Point3d = PointN([1.5, -0.5, 2.0]);

        assert_eq!(p.floor().as_3i(), PointN([1, -1, 2]));
        assert_eq!(p.ceil().as_3i(), PointN([2, 0, 2]));
        assert_eq!(Point3d::from(PointN([1, 2, 3])), PointN([1.0, 2.0, 3.0]));
    }
}
