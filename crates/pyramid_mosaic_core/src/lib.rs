//! The core data types for describing multi-resolution voxel grids:
//! - `PointN`: an N-dimensional point, most importantly `Point2i`, `Point3i` and `Point3d`
//! - `ExtentN`: an N-dimensional extent, most importantly `Extent3i` and `Extent3d`
//! - `Affine3`: the voxel-to-world transform of a pyramid level

mod affine;
pub mod extent;
pub mod int_math;
pub mod point;

pub use affine::Affine3;
pub use extent::{bounding_extent, Extent2, Extent2i, Extent3, Extent3d, Extent3i, ExtentN};
pub use point::{
    point_traits::{
        Bounded, ConstZero, DotProduct, GetComponent, IntegerDiv, IntegerPoint, IterExtent,
        LatticeOrder, MapComponents, Norm, NormSquared, Ones, Point,
    },
    Point2, Point2i, Point3, Point3d, Point3i, PointN,
};

pub use num;

pub mod prelude {
    pub use super::{
        bounding_extent, Affine3, Bounded, ConstZero, DotProduct, Extent2, Extent2i, Extent3, Extent3d,
        Extent3i, ExtentN, GetComponent, IntegerDiv, IntegerPoint, IterExtent, LatticeOrder,
        MapComponents, Norm, NormSquared, Ones, Point, Point2, Point2i, Point3, Point3d,
        Point3i, PointN,
    };
}
