use pyramid_mosaic_core::prelude::*;
use pyramid_mosaic_storage::{Array3, InMemoryPyramid, PyramidError, SharedSource};

use std::sync::Arc;

/// A level-0 array whose values encode their own position, so misplaced voxels are easy to spot.
pub fn gradient_array(shape: Point3i, tag: u16) -> Array3<u16> {
    let extent = Extent3i::from_min_and_shape(Point3i::ZERO, shape);

    Array3::fill_with(extent, |p| {
        tag.wrapping_mul(1000)
            .wrapping_add((p.x() + 7 * p.y() + 13 * p.z()) as u16)
    })
}

/// `n` tiles of the same shape, each a pyramid of `num_levels` levels downsampled by 2 on the planar axes.
pub fn tile_sources(
    n: usize,
    shape: Point3i,
    num_levels: u8,
) -> Result<Vec<SharedSource<u16>>, PyramidError> {
    (0..n)
        .map(|i| {
            let pyramid = InMemoryPyramid::downsampled(
                format!("tile_{}", i),
                gradient_array(shape, i as u16),
                Affine3::identity(),
                num_levels,
                PointN([2, 2, 1]),
            )?;

            Ok(Arc::new(pyramid) as SharedSource<u16>)
        })
        .collect()
}
