//! A source that places a delegate source somewhere else in world space.
//!
//! ```
//! use pyramid_mosaic_core::prelude::*;
//! use pyramid_mosaic_storage::prelude::*;
//!
//! let extent = Extent3i::from_min_and_shape(Point3i::ZERO, Point3i::fill(8));
//! let source = InMemoryPyramid::single_level("a", Array3::fill(extent, 1u8), Affine3::identity());
//!
//! let moved = TransformedPyramid::new(&source, Affine3::from_translation(PointN([100.0, 0.0, 0.0])));
//!
//! let t = moved.source_transform(0, 0).unwrap();
//! assert_eq!(t.apply(PointN([1.0, 1.0, 1.0])), PointN([101.0, 1.0, 1.0]));
//! assert!(moved.wrapped().is_some());
//! ```

use crate::{Array3, PyramidSource, Result, Sample, SourceKind};

use pyramid_mosaic_core::prelude::*;

/// Applies an extra world-space transform after every level transform of `Delegate`. Voxel data is passed through unchanged.
pub struct TransformedPyramid<Delegate> {
    delegate: Delegate,
    transform: Affine3,
    name: Option<String>,
}

impl<Delegate> TransformedPyramid<Delegate> {
    pub fn new(delegate: Delegate, transform: Affine3) -> Self {
        Self {
            delegate,
            transform,
            name: None,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());

        self
    }

    pub fn extra_transform(&self) -> &Affine3 {
        &self.transform
    }

    pub fn delegate(&self) -> &Delegate {
        &self.delegate
    }
}

impl<T, Delegate> PyramidSource<T> for TransformedPyramid<Delegate>
where
    T: Sample,
    Delegate: PyramidSource<T>,
{
    fn name(&self) -> &str {
        self.name.as_deref().unwrap_or_else(|| self.delegate.name())
    }

    fn num_levels(&self) -> u8 {
        self.delegate.num_levels()
    }

    fn is_present(&self, time: u32) -> bool {
        self.delegate.is_present(time)
    }

    fn source_transform(&self, time: u32, level: u8) -> Result<Affine3> {
        let inner = self.delegate.source_transform(time, level)?;

        Ok(self.transform.compose(&inner))
    }

    // Exact for delegates whose level-0 transform is a pure scale.
    fn voxel_size(&self) -> Point3d {
        self.transform
            .compose(&Affine3::from_scale(self.delegate.voxel_size()))
            .voxel_size()
    }

    fn level_extent(&self, time: u32, level: u8) -> Result<Extent3i> {
        self.delegate.level_extent(time, level)
    }

    fn read_extent(&self, time: u32, level: u8, extent: &Extent3i) -> Result<Array3<T>> {
        self.delegate.read_extent(time, level, extent)
    }

    fn kind(&self) -> SourceKind<'_, T> {
        SourceKind::Wrapper(&self.delegate)
    }
}

// ████████╗███████╗███████╗████████╗
// ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝
//    ██║   █████╗  ███████╗   ██║
//    ██║   ██╔══╝  ╚════██║   ██║
//    ██║   ███████╗███████║   ██║
//    ╚═╝   ╚══════╝╚══════╝   ╚═╝
