//! The pyramid source abstraction.
//!
//! A `PyramidSource` exposes a 4-D dataset (3 spatial axes and time) as a sequence of resolution levels. Level 0 is full
//! resolution. Every level has a voxel extent, and every (time, level) pair has an affine transform from voxel to world
//! coordinates. Sources compose: wrappers (crops, extra transforms) and mosaics are sources themselves, and `kind` lets generic
//! code look through them.

use crate::{Array3, PyramidError, Result, Sample};

use pyramid_mosaic_core::prelude::*;

use auto_impl::auto_impl;
use core::marker::PhantomData;
use std::sync::Arc;

#[auto_impl(&, Box, Arc)]
pub trait PyramidSource<T>: Send + Sync
where
    T: Sample,
{
    fn name(&self) -> &str;

    fn num_levels(&self) -> u8;

    /// Returns `true` iff data exists at time point `time`.
    fn is_present(&self, time: u32) -> bool;

    /// The voxel-to-world transform of `level` at `time`.
    fn source_transform(&self, time: u32, level: u8) -> Result<Affine3>;

    /// World size of one level-0 voxel.
    fn voxel_size(&self) -> Point3d;

    fn level_extent(&self, time: u32, level: u8) -> Result<Extent3i>;

    /// Reads the voxels in `extent`, which must be inside the level extent. An empty `extent` yields an empty array.
    fn read_extent(&self, time: u32, level: u8, extent: &Extent3i) -> Result<Array3<T>>;

    /// How this source is built from other sources.
    fn kind(&self) -> SourceKind<'_, T> {
        SourceKind::Leaf
    }
}

/// A type-erased, shareable source. This is how mosaics hold their cells.
pub type SharedSource<T> = Arc<dyn PyramidSource<T>>;

pub enum SourceKind<'a, T>
where
    T: Sample,
{
    /// Owns its data.
    Leaf,
    /// Delegates to exactly one inner source.
    Wrapper(&'a dyn PyramidSource<T>),
    /// Composes many sources.
    Mosaic(&'a [SharedSource<T>]),
}

/// Extra methods for every `PyramidSource`.
pub trait PyramidSourceExt<T>: PyramidSource<T>
where
    T: Sample,
{
    /// A view of one level at one time point.
    fn voxel_array(&self, time: u32, level: u8) -> Result<SourceView<'_, T, Self>> {
        if !self.is_present(time) {
            return Err(PyramidError::TimepointUnavailable { time });
        }
        let extent = self.level_extent(time, level)?;

        Ok(SourceView {
            source: self,
            time,
            level,
            extent,
            marker: PhantomData,
        })
    }

    /// The source this one delegates to, if it is a wrapper.
    fn wrapped(&self) -> Option<&dyn PyramidSource<T>> {
        match self.kind() {
            SourceKind::Wrapper(inner) => Some(inner),
            _ => None,
        }
    }
}

impl<T, S> PyramidSourceExt<T> for S
where
    T: Sample,
    S: PyramidSource<T> + ?Sized,
{
}

/// One level of a source at one time point, addressed like an array.
pub struct SourceView<'a, T, S: ?Sized> {
    source: &'a S,
    time: u32,
    level: u8,
    extent: Extent3i,
    marker: PhantomData<T>,
}

impl<'a, T, S> SourceView<'a, T, S>
where
    T: Sample,
    S: PyramidSource<T> + ?Sized,
{
    #[inline]
    pub fn extent(&self) -> &Extent3i {
        &self.extent
    }

    pub fn time(&self) -> u32 {
        self.time
    }

    pub fn level(&self) -> u8 {
        self.level
    }

    pub fn transform(&self) -> Result<Affine3> {
        self.source.source_transform(self.time, self.level)
    }

    pub fn read(&self, extent: &Extent3i) -> Result<Array3<T>> {
        self.source.read_extent(self.time, self.level, extent)
    }

    pub fn read_all(&self) -> Result<Array3<T>> {
        self.read(&self.extent)
    }

    /// The value of a single voxel.
    pub fn get(&self, p: Point3i) -> Result<T> {
        let array = self.read(&Extent3i::from_min_and_shape(p, Point3i::ONES))?;

        Ok(array.values_slice()[0])
    }
}

/// Finds the sources that actually own data, looking through wrappers and into mosaics (recursively). Leaves are returned in
/// cell order.
pub fn leaf_sources<'a, T>(source: &'a dyn PyramidSource<T>) -> Vec<&'a dyn PyramidSource<T>>
where
    T: Sample,
{
    let mut leaves = Vec::new();
    let mut stack = vec![source];
    while let Some(mut s) = stack.pop() {
        loop {
            match s.kind() {
                SourceKind::Leaf => {
                    leaves.push(s);
                    break;
                }
                SourceKind::Wrapper(inner) => s = inner,
                SourceKind::Mosaic(cells) => {
                    stack.extend(cells.iter().rev().map(|c| &**c as &dyn PyramidSource<T>));
                    break;
                }
            }
        }
    }

    leaves
}

/// Fails with `LevelUnavailable` unless `level < num_levels`.
pub fn check_level(level: u8, num_levels: u8) -> Result<()> {
    if level < num_levels {
        Ok(())
    } else {
        Err(PyramidError::LevelUnavailable { level, num_levels })
    }
}

/// Fails with `OutOfBounds` unless `requested` is empty or inside `available`.
pub fn check_read_bounds(requested: &Extent3i, available: &Extent3i) -> Result<()> {
    if requested.is_empty() || requested.is_subset_of(available) {
        Ok(())
    } else {
        Err(PyramidError::OutOfBounds {
            requested: *requested,
            available: *available,
        })
    }
}

// ████████╗███████╗███████╗████████╗
// ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝
//    ██║   █████╗  ███████╗   ██║
//    ██║   ██╔══╝  ╚════██║   ██║
//    ██║   ███████╗███████║   ██║
//    ╚═╝   ╚══════╝╚══════╝   ╚═╝
