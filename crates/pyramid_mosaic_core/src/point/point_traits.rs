use crate::PointN;

use core::ops::{Add, AddAssign, Div, Mul, Neg, Rem, Sub, SubAssign};
use num::Zero;

/// A trait that bundles op traits that all `PointN<N>` (and its components) should have.
pub trait Point:
    'static
    + Add<Output = Self>
    + AddAssign
    + Bounded
    + ConstZero
    + Copy
    + Div<<Self as Point>::Scalar, Output = Self>
    + Div<Self, Output = Self>
    + GetComponent<Scalar = <Self as Point>::Scalar>
    + LatticeOrder
    + MapComponents<Scalar = <Self as Point>::Scalar>
    + Mul<<Self as Point>::Scalar, Output = Self>
    + Mul<Self, Output = Self>
    + Neg<Output = Self>
    + Ones
    + PartialEq
    + PartialOrd
    + Sized
    + Sub<Output = Self>
    + SubAssign
    + Zero
{
    type Scalar: Copy;

    fn fill(value: <Self as Point>::Scalar) -> Self;

    fn volume(&self) -> <Self as Point>::Scalar;
}

pub trait GetComponent {
    type Scalar: Copy;

    /// Returns the component specified by index. I.e. X = 0, Y = 1, Z = 2.
    fn at(&self, component_index: usize) -> Self::Scalar;
}

pub trait MapComponents {
    type Scalar;

    /// Returns the point after applying `f` component-wise.
    fn map_components_unary(&self, f: impl Fn(Self::Scalar) -> Self::Scalar) -> Self;

    /// Returns the point after applying `f` component-wise to both `self` and `other` in parallel.
    fn map_components_binary(
        &self,
        other: &Self,
        f: impl Fn(Self::Scalar, Self::Scalar) -> Self::Scalar,
    ) -> Self;
}

pub trait Ones: Copy {
    /// A point of all ones.
    const ONES: Self;
}

pub trait NormSquared {
    fn norm_squared(&self) -> f64;
}

pub trait Norm {
    fn norm(&self) -> f64;
}

impl<T> Norm for T
where
    T: NormSquared,
{
    #[inline]
    fn norm(&self) -> f64 {
        self.norm_squared().sqrt()
    }
}

pub trait DotProduct {
    type Scalar: Copy;

    /// The vector dot product.
    fn dot(&self, other: &Self) -> Self::Scalar;
}

pub trait IntegerPoint<N>:
    Eq + IntegerDiv + IterExtent<N> + Point<Scalar = i32> + Rem<Self, Output = Self> + Rem<i32, Output = Self>
{
    /// Returns `true` iff all dimensions are strictly positive.
    fn is_positive(&self) -> bool;
}

pub trait IntegerDiv {
    fn vector_div_floor(&self, rhs: &Self) -> Self;

    fn scalar_div_floor(&self, rhs: i32) -> Self;

    fn vector_div_ceil(&self, rhs: &Self) -> Self;

    fn scalar_div_ceil(&self, rhs: i32) -> Self;

    /// The remainder of floored division, which is never negative for positive divisors.
    fn vector_rem_euclid(&self, rhs: &Self) -> Self;
}

pub trait LatticeOrder {
    /// Component-wise maximum.
    fn join(&self, other: &Self) -> Self;

    /// Component-wise minimum.
    fn meet(&self, other: &Self) -> Self;
}

pub trait IterExtent<N> {
    type PointIter: Iterator<Item = PointN<N>>;

    fn iter_extent(min: &PointN<N>, lub: &PointN<N>) -> Self::PointIter;
}

// `Zero` trait doesn't allow associated constants for zero because of bignums.
pub trait ConstZero: Copy {
    const ZERO: Self;
}

// `One` trait doesn't allow associated constants for one because of bignums.
pub trait ConstOne: Copy {
    const ONE: Self;
}

impl ConstZero for i32 {
    const ZERO: i32 = 0;
}
impl ConstOne for i32 {
    const ONE: i32 = 1;
}

impl ConstZero for f64 {
    const ZERO: f64 = 0.0;
}
impl ConstOne for f64 {
    const ONE: f64 = 1.0;
}

pub trait Bounded: Copy {
    const MIN: Self;
    const MAX: Self;
}

impl Bounded for i32 {
    const MIN: Self = std::i32::MIN;
    const MAX: Self = std::i32::MAX;
}

impl Bounded for f64 {
    const MIN: Self = std::f64::MIN;
    const MAX: Self = std::f64::MAX;
}

macro_rules! impl_componentwise_ops {
    ($t:ty, $scalar:ty) => {
        impl Add for $t {
            type Output = Self;

            #[inline]
            fn add(self, rhs: Self) -> Self {
                self.map_components_binary(&rhs, |c1, c2| c1 + c2)
            }
        }

        impl Sub for $t {
            type Output = Self;

            #[inline]
            fn sub(self, rhs: Self) -> Self {
                self.map_components_binary(&rhs, |c1, c2| c1 - c2)
            }
        }

        impl Mul<$scalar> for $t {
            type Output = Self;

            #[inline]
            fn mul(self, rhs: $scalar) -> Self {
                self.map_components_unary(|c| rhs * c)
            }
        }

        impl Mul<$t> for $scalar {
            type Output = $t;

            #[inline]
            fn mul(self, rhs: $t) -> $t {
                rhs * self
            }
        }

        impl Mul<Self> for $t {
            type Output = Self;

            #[inline]
            fn mul(self, rhs: Self) -> Self {
                self.map_components_binary(&rhs, |c1, c2| c1 * c2)
            }
        }

        impl LatticeOrder for $t {
            #[inline]
            fn join(&self, other: &Self) -> Self {
                self.map_components_binary(other, <$scalar>::max)
            }

            #[inline]
            fn meet(&self, other: &Self) -> Self {
                self.map_components_binary(other, <$scalar>::min)
            }
        }
    };
}

macro_rules! impl_float_ops {
    ($t:ty, $scalar:ty) => {
        impl $t {
            #[inline]
            pub fn round(&self) -> Self {
                self.map_components_unary(|c| c.round())
            }

            #[inline]
            pub fn floor(&self) -> Self {
                self.map_components_unary(|c| c.floor())
            }

            #[inline]
            pub fn ceil(&self) -> Self {
                self.map_components_unary(|c| c.ceil())
            }

            #[inline]
            pub fn abs(&self) -> Self {
                self.map_components_unary(|c| c.abs())
            }

            /// Returns `true` iff no component is infinite or NaN.
            #[inline]
            pub fn is_finite(&self) -> bool {
                self.0.iter().all(|c| c.is_finite())
            }
        }

        impl Div<$scalar> for $t {
            type Output = Self;

            #[inline]
            fn div(self, rhs: $scalar) -> Self {
                self.map_components_unary(|c| c / rhs)
            }
        }

        impl Div<Self> for $t {
            type Output = Self;

            #[inline]
            fn div(self, rhs: Self) -> Self {
                self.map_components_binary(&rhs, |c1, c2| c1 / c2)
            }
        }
    };
}

macro_rules! impl_integer_ops {
    ($t:ty) => {
        // Use specialized implementation for integers because the default Div impl rounds towards zero, which is not what we
        // want.
        impl Div<i32> for $t {
            type Output = Self;

            #[inline]
            fn div(self, rhs: i32) -> Self {
                self.scalar_div_floor(rhs)
            }
        }

        impl Div<Self> for $t {
            type Output = Self;

            #[inline]
            fn div(self, rhs: Self) -> Self {
                self.vector_div_floor(&rhs)
            }
        }

        impl Rem<i32> for $t {
            type Output = Self;

            #[inline]
            fn rem(self, rhs: i32) -> Self {
                self.map_components_unary(|c| c % rhs)
            }
        }

        impl Rem<Self> for $t {
            type Output = Self;

            #[inline]
            fn rem(self, rhs: Self) -> Self {
                self.map_components_binary(&rhs, |c1, c2| c1 % c2)
            }
        }

        impl IntegerDiv for $t {
            #[inline]
            fn vector_div_floor(&self, rhs: &Self) -> Self {
                self.map_components_binary(rhs, |c1, c2| num::integer::div_floor(c1, c2))
            }

            #[inline]
            fn scalar_div_floor(&self, rhs: i32) -> Self {
                self.map_components_unary(|c| num::integer::div_floor(c, rhs))
            }

            #[inline]
            fn vector_div_ceil(&self, rhs: &Self) -> Self {
                self.map_components_binary(rhs, |c1, c2| num::integer::div_ceil(c1, c2))
            }

            #[inline]
            fn scalar_div_ceil(&self, rhs: i32) -> Self {
                self.map_components_unary(|c| num::integer::div_ceil(c, rhs))
            }

            #[inline]
            fn vector_rem_euclid(&self, rhs: &Self) -> Self {
                self.map_components_binary(rhs, |c1, c2| num::integer::mod_floor(c1, c2))
            }
        }
    };
}
