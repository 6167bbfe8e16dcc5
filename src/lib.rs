//! Virtual mosaics of multi-resolution voxel pyramids.
//!
//! Many image pyramids (one per tile, channel or view) are laid out on a planar grid and exposed as a single pyramid whose
//! voxels are materialized lazily, one cell-sized chunk at a time. Any pyramid can also be restricted to a real-valued
//! region of interest.
//!
//! This library is organized into two crates:
//! - **core**: points, extents and affine transforms
//! - **storage**: pyramid sources, the grid planner, the chunk cache, mosaics, crops and provenance encoding
//!
//! Start with `MosaicBuilder` and `CroppedPyramid` in the storage crate.

pub use pyramid_mosaic_core as core;
pub use pyramid_mosaic_storage as storage;

pub mod prelude {
    pub use super::core::prelude::*;
    pub use super::storage::prelude::*;
}

// ████████╗███████╗███████╗████████╗
// ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝
//    ██║   █████╗  ███████╗   ██║
//    ██║   ██╔══╝  ╚════██║   ██║
//    ██║   ███████╗███████║   ██║
//    ╚═╝   ╚══════╝╚══════╝   ╚═╝

#[cfg(test)]
mod test {
    use super::prelude::*;

    use std::sync::Arc;

    #[test]
    fn facade_prelude_builds_a_mosaic() {
        let extent = Extent3i::from_min_and_shape(Point3i::ZERO, PointN([4, 4, 1]));
        let sources: Vec<SharedSource<u8>> = (0..2)
            .map(|i| {
                let tile = InMemoryPyramid::single_level(format!("t{}", i), Array3::fill(extent, i as u8), Affine3::identity());

                Arc::new(tile) as SharedSource<u8>
            })
            .collect();

        let mosaic = MosaicBuilder::new(MosaicConfig::default()).build(sources).unwrap();

        assert_eq!(mosaic.level_extent(0, 0).unwrap().shape, PointN([8, 4, 1]));
    }
}
