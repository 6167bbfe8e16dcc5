//! Dense 3-dimensional arrays located in a voxel lattice.
//!
//! An `Array3` contains data at exactly the set of points in its `Extent3i`, and no more. Level reads and mosaic chunks are
//! both `Array3`s, so copying between them is a matter of intersecting extents.
//!
//! ```
//! use pyramid_mosaic_core::prelude::*;
//! use pyramid_mosaic_storage::prelude::*;
//!
//! let array_extent = Extent3i::from_min_and_shape(Point3i::ZERO, Point3i::fill(16));
//! let mut array = Array3::fill(array_extent, 0u16);
//!
//! // Write all points in the extent to the same value.
//! let write_extent = Extent3i::from_min_and_lub(Point3i::fill(4), Point3i::fill(8));
//! array.for_each_mut(&write_extent, |_, value| *value = 1);
//!
//! // Only the points in the extent should have been written.
//! array.for_each(array.extent(), |p, value| {
//!     if write_extent.contains(p) {
//!         assert_eq!(value, 1);
//!     } else {
//!         assert_eq!(value, 0);
//!     }
//! });
//! ```

use crate::ChunkWeight;

use pyramid_mosaic_core::prelude::*;

use serde::{Deserialize, Serialize};

/// A flat offset into the values of an array.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
pub struct Stride(pub usize);

/// Array-local coordinates, where the array minimum is `[0, 0, 0]`.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Local3i(pub Point3i);

impl Local3i {
    #[inline]
    pub fn stride(&self, shape: Point3i) -> Stride {
        let p = self.0;

        Stride((p.x() + shape.x() * (p.y() + shape.y() * p.z())) as usize)
    }
}

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct Array3<T> {
    extent: Extent3i,
    values: Vec<T>,
}

impl<T> Array3<T> {
    /// Wraps `values` laid out in x-major order over `extent`.
    ///
    /// Panics if the number of values doesn't match the extent.
    pub fn new(extent: Extent3i, values: Vec<T>) -> Self {
        assert_eq!(extent.num_points(), values.len());

        Self { extent, values }
    }

    pub fn fill_with(extent: Extent3i, filler: impl FnMut(Point3i) -> T) -> Self {
        let values = extent.iter_points().map(filler).collect();

        Self { extent, values }
    }

    #[inline]
    pub fn extent(&self) -> &Extent3i {
        &self.extent
    }

    /// Moves the array in the lattice without touching its values.
    #[inline]
    pub fn set_minimum(&mut self, p: Point3i) {
        self.extent.minimum = p;
    }

    #[inline]
    pub fn values_slice(&self) -> &[T] {
        &self.values
    }

    #[inline]
    pub fn values_mut_slice(&mut self) -> &mut [T] {
        &mut self.values
    }

    #[inline]
    pub fn into_values(self) -> Vec<T> {
        self.values
    }

    #[inline]
    pub fn stride_from_point(&self, p: Point3i) -> Stride {
        Local3i(p - self.extent.minimum).stride(self.extent.shape)
    }

    /// Borrows the value at `p`, or `None` if `p` is outside the array.
    #[inline]
    pub fn get_ref(&self, p: Point3i) -> Option<&T> {
        if self.extent.contains(p) {
            Some(&self.values[self.stride_from_point(p).0])
        } else {
            None
        }
    }

    /// Panics if `p` is outside the array.
    #[inline]
    pub fn get_mut(&mut self, p: Point3i) -> &mut T {
        assert!(self.extent.contains(p), "{:?} is outside of {:?}", p, self.extent);
        let s = self.stride_from_point(p);

        &mut self.values[s.0]
    }

    /// Visits every point of `extent` that is also in the array.
    pub fn for_each_mut(&mut self, extent: &Extent3i, mut f: impl FnMut(Point3i, &mut T)) {
        for p in self.extent.intersection(extent).iter_points() {
            let s = self.stride_from_point(p);
            f(p, &mut self.values[s.0]);
        }
    }
}

impl<T> Array3<T>
where
    T: Clone,
{
    pub fn fill(extent: Extent3i, value: T) -> Self {
        Self {
            extent,
            values: vec![value; extent.num_points()],
        }
    }
}

impl<T> Array3<T>
where
    T: Copy,
{
    /// Panics if `p` is outside the array.
    #[inline]
    pub fn get(&self, p: Point3i) -> T {
        match self.get_ref(p) {
            Some(v) => *v,
            None => panic!("{:?} is outside of {:?}", p, self.extent),
        }
    }

    /// Visits every point of `extent` that is also in the array.
    pub fn for_each(&self, extent: &Extent3i, mut f: impl FnMut(Point3i, T)) {
        for p in self.extent.intersection(extent).iter_points() {
            f(p, self.values[self.stride_from_point(p).0]);
        }
    }
}

impl<T> ChunkWeight for Array3<T> {
    fn weight_bytes(&self) -> usize {
        self.values.len() * std::mem::size_of::<T>()
    }
}

/// Copy all points in `extent` from `src` to `dst`. Only the part of `extent` covered by both arrays is copied.
pub fn copy_extent<T>(extent: &Extent3i, src: &Array3<T>, dst: &mut Array3<T>)
where
    T: Copy,
{
    copy_extent_map(extent, src, dst, |v| v)
}

/// Like `copy_extent`, but converts each value with `f` on the way.
pub fn copy_extent_map<T, U>(
    extent: &Extent3i,
    src: &Array3<T>,
    dst: &mut Array3<U>,
    f: impl Fn(T) -> U,
) where
    T: Copy,
{
    let copy = extent
        .intersection(&src.extent)
        .intersection(&dst.extent);
    if copy.is_empty() {
        return;
    }

    // Copy one x-row at a time.
    let row_len = copy.shape.x() as usize;
    let lub = copy.least_upper_bound();
    for z in copy.minimum.z()..lub.z() {
        for y in copy.minimum.y()..lub.y() {
            let row_min = PointN([copy.minimum.x(), y, z]);
            let src_start = src.stride_from_point(row_min).0;
            let dst_start = dst.stride_from_point(row_min).0;
            let src_row = &src.values[src_start..src_start + row_len];
            let dst_row = &mut dst.values[dst_start..dst_start + row_len];
            for (d, s) in dst_row.iter_mut().zip(src_row.iter()) {
                *d = f(*s);
            }
        }
    }
}

// ████████╗███████╗███████╗████████╗
// ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝
//    ██║   █████╗  ███████╗   ██║
//    ██║   ██╔══╝  ╚════██║   ██║
//    ██║   ███████╗███████║   ██║
//    ╚═╝   ╚══════╝╚══════╝   ╚═╝
