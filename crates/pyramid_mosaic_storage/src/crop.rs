//! Restricts a source to a real-valued region of interest without copying its data.
//!
//! The region is given in its own coordinates plus a transform to world space. At construction, every level's voxel interval
//! is computed by mapping the region's corners to world space, then back through the inverse of that level's transform, and
//! taking the smallest covering voxel interval. That interval is intersected with the level's actual extent, since no source
//! may be read outside its extent.
//!
//! ```
//! use pyramid_mosaic_core::prelude::*;
//! use pyramid_mosaic_storage::prelude::*;
//!
//! let extent = Extent3i::from_min_and_shape(Point3i::ZERO, Point3i::fill(100));
//! let source = InMemoryPyramid::single_level("a", Array3::fill_with(extent, |p| p.x() as u8), Affine3::identity());
//!
//! let roi = RegionOfInterest::new(Extent3d::from_bounds(Point3d::fill(20.0), Point3d::fill(40.0)));
//! let crop = CroppedPyramid::new(&source, roi, true).unwrap();
//!
//! assert_eq!(crop.level_extent(0, 0).unwrap(), Extent3i::from_min_and_shape(Point3i::ZERO, Point3i::fill(20)));
//! assert_eq!(crop.voxel_array(0, 0).unwrap().get(PointN([1, 0, 0])).unwrap(), 21);
//! ```

use crate::{check_level, check_read_bounds, Array3, PyramidError, PyramidSource, Result, Sample, SourceKind};

use pyramid_mosaic_core::prelude::*;

use serde::{Deserialize, Serialize};

/// Coordinates this close to an integer are treated as that integer before rounding outwards.
const SNAP_TOLERANCE: f64 = 1e-6;

/// A real-valued box `[min, min + shape)` in the coordinates of `transform`, at one time point.
#[derive(Clone, Copy, Debug, Deserialize, PartialEq, Serialize)]
pub struct RegionOfInterest {
    pub interval: Extent3d,
    /// Maps `interval` to world space.
    pub transform: Affine3,
    /// The time point whose level transforms are used.
    pub time: u32,
}

impl RegionOfInterest {
    /// A region given directly in world coordinates, at time point 0.
    pub fn new(interval: Extent3d) -> Self {
        Self {
            interval,
            transform: Affine3::identity(),
            time: 0,
        }
    }

    pub fn with_transform(mut self, transform: Affine3) -> Self {
        self.transform = transform;

        self
    }

    pub fn at_time(mut self, time: u32) -> Self {
        self.time = time;

        self
    }

    /// The axis-aligned world-space bounds of the region.
    pub fn world_bounds(&self) -> Extent3d {
        self.transform.estimate_bounds(&self.interval)
    }
}

pub struct CroppedPyramid<Delegate> {
    delegate: Delegate,
    region: RegionOfInterest,
    zero_origin: bool,
    intervals: Vec<Extent3i>,
    name: Option<String>,
}

impl<Delegate> CroppedPyramid<Delegate> {
    /// Computes the voxel interval of `region` on every level of `delegate`. When `zero_origin` is set, every level is
    /// re-based so that its minimum is the origin.
    pub fn new<T>(delegate: Delegate, region: RegionOfInterest, zero_origin: bool) -> Result<Self>
    where
        T: Sample,
        Delegate: PyramidSource<T>,
    {
        let world = region.world_bounds();
        let intervals = (0..delegate.num_levels())
            .map(|level| {
                let to_voxel = delegate
                    .source_transform(region.time, level)?
                    .inverse()
                    .ok_or_else(|| {
                        PyramidError::geometry(format!("level {} transform is not invertible", level))
                    })?;
                let covering = snap(to_voxel.estimate_bounds(&world)).covering_voxels();

                Ok(covering.intersection(&delegate.level_extent(region.time, level)?))
            })
            .collect::<Result<Vec<_>>>()?;

        tracing::debug!(
            source = delegate.name(),
            ?intervals,
            zero_origin,
            "cropped pyramid"
        );

        Ok(Self {
            delegate,
            region,
            zero_origin,
            intervals,
            name: None,
        })
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());

        self
    }

    /// The voxel interval of every level in the delegate's coordinates. Empty where the region misses the level.
    #[inline]
    pub fn level_intervals(&self) -> &[Extent3i] {
        &self.intervals
    }

    #[inline]
    pub fn region(&self) -> &RegionOfInterest {
        &self.region
    }

    #[inline]
    pub fn is_zero_origin(&self) -> bool {
        self.zero_origin
    }

    pub fn delegate(&self) -> &Delegate {
        &self.delegate
    }

    /// What to add to a voxel of this view to get the delegate's voxel.
    fn origin_offset(&self, level: u8) -> Point3i {
        if self.zero_origin {
            self.intervals[level as usize].minimum
        } else {
            Point3i::ZERO
        }
    }
}

fn snap(extent: Extent3d) -> Extent3d {
    let snap_component = |c: f64| {
        let rounded = c.round();
        if (c - rounded).abs() < SNAP_TOLERANCE {
            rounded
        } else {
            c
        }
    };

    Extent3d::from_bounds(
        extent.minimum.map_components_unary(snap_component),
        extent.least_upper_bound().map_components_unary(snap_component),
    )
}

impl<T, Delegate> PyramidSource<T> for CroppedPyramid<Delegate>
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
        check_level(level, self.delegate.num_levels())?;
        let inner = self.delegate.source_transform(time, level)?;

        Ok(inner.compose(&Affine3::from_translation(self.origin_offset(level).into())))
    }

    fn voxel_size(&self) -> Point3d {
        self.delegate.voxel_size()
    }

    fn level_extent(&self, _time: u32, level: u8) -> Result<Extent3i> {
        check_level(level, self.delegate.num_levels())?;

        Ok(self.intervals[level as usize] - self.origin_offset(level))
    }

    fn read_extent(&self, time: u32, level: u8, extent: &Extent3i) -> Result<Array3<T>> {
        let available = PyramidSource::<T>::level_extent(self, time, level)?;
        check_read_bounds(extent, &available)?;
        if extent.is_empty() {
            return Ok(Array3::fill(*extent, T::background()));
        }

        let mut data = self
            .delegate
            .read_extent(time, level, &(*extent + self.origin_offset(level)))?;
        data.set_minimum(extent.minimum);

        Ok(data)
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

#[cfg(test)]
mod test {
    use super::*;
    use crate::{leaf_sources, InMemoryPyramid, PyramidSourceExt, SharedSource, TransformedPyramid};

    use pretty_assertions::assert_eq;
    use std::sync::Arc;

    fn cube() -> InMemoryPyramid<u16> {
        let extent = Extent3i::from_min_and_shape(Point3i::ZERO, Point3i::fill(100));

        InMemoryPyramid::downsampled(
            "cube",
            Array3::fill_with(extent, |p| (p.x() + 100 * p.y()) as u16),
            Affine3::identity(),
            2,
            Point3i::fill(2),
        )
        .unwrap()
    }

    fn world_box(min: f64, max: f64) -> RegionOfInterest {
        RegionOfInterest::new(Extent3d::from_bounds(Point3d::fill(min), Point3d::fill(max)))
    }

    #[test]
    fn interval_inside_source() {
        let crop = CroppedPyramid::new(cube(), world_box(20.0, 40.0), false).unwrap();

        assert_eq!(
            crop.level_intervals(),
            &[
                Extent3i::from_min_and_lub(Point3i::fill(20), Point3i::fill(40)),
                Extent3i::from_min_and_lub(Point3i::fill(10), Point3i::fill(20)),
            ]
        );
        assert_eq!(crop.level_extent(0, 0).unwrap().minimum, Point3i::fill(20));

        let view = crop.voxel_array(0, 0).unwrap();
        assert_eq!(view.get(PointN([21, 22, 23])).unwrap(), 21 + 2200);
        assert!(view.get(PointN([19, 22, 23])).is_err());
    }

    #[test]
    fn flat_region_selects_one_plane() {
        let plane = RegionOfInterest::new(Extent3d::from_bounds(PointN([20.0, 20.0, 30.0]), PointN([40.0, 40.0, 30.0])));
        let crop = CroppedPyramid::new(cube(), plane, false).unwrap();

        assert_eq!(
            crop.level_intervals(),
            &[
                Extent3i::from_min_and_lub(PointN([20, 20, 30]), PointN([40, 40, 31])),
                Extent3i::from_min_and_lub(PointN([10, 10, 15]), PointN([20, 20, 16])),
            ]
        );

        let values = crop.voxel_array(0, 0).unwrap().read_all().unwrap();
        assert_eq!(values.extent().shape, PointN([20, 20, 1]));
        assert_eq!(values.get(PointN([21, 22, 30])), 21 + 2200);
    }

    #[test]
    fn region_outside_source_is_empty() {
        let crop = CroppedPyramid::new(cube(), world_box(200.0, 300.0), true).unwrap();

        for interval in crop.level_intervals() {
            assert!(interval.is_empty());
        }
        let view = crop.voxel_array(0, 0).unwrap();
        assert!(view.extent().is_empty());
        assert!(view.read_all().unwrap().values_slice().is_empty());
    }

    #[test]
    fn partial_overlap_is_clipped() {
        let crop = CroppedPyramid::new(cube(), world_box(-10.5, 5.2), false).unwrap();

        assert_eq!(
            crop.level_intervals()[0],
            Extent3i::from_min_and_lub(Point3i::ZERO, Point3i::fill(6))
        );
    }

    #[test]
    fn zero_origin_rebases_view_and_transform() {
        let crop = CroppedPyramid::new(cube(), world_box(20.0, 40.0), true)
            .unwrap()
            .with_name("roi");

        assert_eq!(PyramidSource::<u16>::name(&crop), "roi");
        assert_eq!(
            crop.level_extent(0, 1).unwrap(),
            Extent3i::from_min_and_shape(Point3i::ZERO, Point3i::fill(10))
        );

        // Voxel 0 of the view is still at world position 20.
        let t = crop.source_transform(0, 0).unwrap();
        assert_eq!(t.apply(Point3d::ZERO), Point3d::fill(20.0));
        let t1 = crop.source_transform(0, 1).unwrap();
        assert_eq!(t1.apply(Point3d::ZERO), Point3d::fill(20.0));

        let read = crop
            .read_extent(0, 0, &Extent3i::from_min_and_shape(Point3i::ZERO, PointN([2, 1, 1])))
            .unwrap();
        assert_eq!(read.into_values(), vec![20 + 2000, 21 + 2000]);
    }

    #[test]
    fn region_transform_is_applied() {
        // The region is given in a frame that is shifted by 50 and scaled by 2 relative to world.
        let region = RegionOfInterest::new(Extent3d::from_bounds(Point3d::ZERO, Point3d::fill(5.0)))
            .with_transform(Affine3::from_scale(Point3d::fill(2.0)).then_translate(Point3d::fill(50.0)));
        let crop = CroppedPyramid::new(cube(), region, false).unwrap();

        assert_eq!(
            crop.level_intervals()[0],
            Extent3i::from_min_and_lub(Point3i::fill(50), Point3i::fill(60))
        );
    }

    #[test]
    fn crop_is_a_wrapper() {
        let moved = TransformedPyramid::new(cube(), Affine3::from_translation(Point3d::fill(1000.0)));
        let crop: SharedSource<u16> = Arc::new(
            CroppedPyramid::new(moved, world_box(1020.0, 1040.0), true).unwrap(),
        );

        assert_eq!(
            crop.level_extent(0, 0).unwrap().shape,
            Point3i::fill(20)
        );
        assert!(crop.wrapped().is_some());
        let leaves: Vec<_> = leaf_sources(&*crop).iter().map(|s| s.name().to_string()).collect();
        assert_eq!(leaves, vec!["cube"]);
    }
}
