use crate::{
    check_level, check_read_bounds, copy_extent, Array3, PyramidError, PyramidSource, Result,
    Sample,
};

use pyramid_mosaic_core::prelude::*;

use std::collections::BTreeSet;

/// A pyramid whose levels are dense arrays held in memory. The same data is present at a fixed set of time points.
///
/// ```
/// use pyramid_mosaic_core::prelude::*;
/// use pyramid_mosaic_storage::prelude::*;
///
/// let extent = Extent3i::from_min_and_shape(Point3i::ZERO, PointN([64, 64, 1]));
/// let level0 = Array3::fill_with(extent, |p| p.x() as u16);
/// let pyramid = InMemoryPyramid::downsampled("ramp", level0, Affine3::identity(), 3, PointN([2, 2, 1])).unwrap();
///
/// assert_eq!(pyramid.num_levels(), 3);
/// assert_eq!(pyramid.level_extent(0, 2).unwrap().shape, PointN([16, 16, 1]));
/// ```
#[derive(Clone, Debug)]
pub struct InMemoryPyramid<T> {
    name: String,
    levels: Vec<Array3<T>>,
    transforms: Vec<Affine3>,
    timepoints: BTreeSet<u32>,
}

impl<T> InMemoryPyramid<T>
where
    T: Sample,
{
    /// One array and one voxel-to-world transform per level, present only at time point 0.
    pub fn new(name: impl Into<String>, levels: Vec<Array3<T>>, transforms: Vec<Affine3>) -> Result<Self> {
        if levels.is_empty() {
            return Err(PyramidError::geometry("a pyramid needs at least one level"));
        }
        if levels.len() != transforms.len() {
            return Err(PyramidError::geometry(format!(
                "{} levels but {} transforms",
                levels.len(),
                transforms.len()
            )));
        }
        if levels.len() > u8::MAX as usize {
            return Err(PyramidError::geometry("too many levels"));
        }

        Ok(Self {
            name: name.into(),
            levels,
            transforms,
            timepoints: std::iter::once(0).collect(),
        })
    }

    pub fn single_level(name: impl Into<String>, array: Array3<T>, transform: Affine3) -> Self {
        Self {
            name: name.into(),
            levels: vec![array],
            transforms: vec![transform],
            timepoints: std::iter::once(0).collect(),
        }
    }

    /// Builds `num_levels` levels by repeatedly subsampling `level0` by `factor`. Level `L` is scaled by `factor^L` relative to
    /// `transform`.
    pub fn downsampled(
        name: impl Into<String>,
        level0: Array3<T>,
        transform: Affine3,
        num_levels: u8,
        factor: Point3i,
    ) -> Result<Self> {
        if num_levels == 0 {
            return Err(PyramidError::geometry("a pyramid needs at least one level"));
        }
        if !factor.is_positive() {
            return Err(PyramidError::geometry(format!(
                "downsampling factor {:?} must be positive",
                factor
            )));
        }

        let mut levels = vec![level0];
        let mut transforms = vec![transform];
        let mut scale = Point3d::ONES;
        for _ in 1..num_levels {
            let next = match levels.last() {
                Some(finer) => subsample(finer, factor),
                None => break,
            };
            scale = scale * Point3d::from(factor);
            levels.push(next);
            transforms.push(transform.compose(&Affine3::from_scale(scale)));
        }

        Self::new(name, levels, transforms)
    }

    /// Replaces the set of time points at which data is present.
    pub fn with_timepoints(mut self, timepoints: impl IntoIterator<Item = u32>) -> Self {
        self.timepoints = timepoints.into_iter().collect();

        self
    }

    pub fn level(&self, level: u8) -> Option<&Array3<T>> {
        self.levels.get(level as usize)
    }

    fn check_time(&self, time: u32) -> Result<()> {
        if self.timepoints.contains(&time) {
            Ok(())
        } else {
            Err(PyramidError::TimepointUnavailable { time })
        }
    }
}

/// Takes every `factor`-th voxel, starting from the minimum.
fn subsample<T>(finer: &Array3<T>, factor: Point3i) -> Array3<T>
where
    T: Copy,
{
    let extent = finer.extent();
    let coarse_extent = Extent3i::from_min_and_shape(
        extent.minimum / factor,
        extent.shape.vector_div_floor(&factor).join(&Point3i::ONES),
    );

    Array3::fill_with(coarse_extent, |p| {
        let q = extent.minimum + (p - coarse_extent.minimum) * factor;

        finer.get(q.meet(&extent.max()))
    })
}

impl<T> PyramidSource<T> for InMemoryPyramid<T>
where
    T: Sample,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn num_levels(&self) -> u8 {
        self.levels.len() as u8
    }

    fn is_present(&self, time: u32) -> bool {
        self.timepoints.contains(&time)
    }

    fn source_transform(&self, _time: u32, level: u8) -> Result<Affine3> {
        check_level(level, self.num_levels())?;

        Ok(self.transforms[level as usize])
    }

    fn voxel_size(&self) -> Point3d {
        self.transforms[0].voxel_size()
    }

    fn level_extent(&self, _time: u32, level: u8) -> Result<Extent3i> {
        check_level(level, self.num_levels())?;

        Ok(*self.levels[level as usize].extent())
    }

    fn read_extent(&self, time: u32, level: u8, extent: &Extent3i) -> Result<Array3<T>> {
        check_level(level, self.num_levels())?;
        self.check_time(time)?;
        let array = &self.levels[level as usize];
        check_read_bounds(extent, array.extent())?;

        let mut out = Array3::fill(*extent, T::background());
        copy_extent(extent, array, &mut out);

        Ok(out)
    }
}

// ████████╗███████╗███████╗████████╗
// ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝
//    ██║   █████╗  ███████╗   ██║
//    ██║   ██╔══╝  ╚════██║   ██║
//    ██║   ███████╗███████║   ██║
//    ╚═╝   ╚══════╝╚══════╝   ╚═╝
