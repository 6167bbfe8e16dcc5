#![allow(clippy::type_complexity, clippy::too_many_arguments)]

//! Virtual mosaics and crops of multi-resolution voxel pyramids.
//!
//! Every pyramid is a `PyramidSource`: a sequence of resolution levels, each with a voxel extent and a voxel-to-world
//! transform per time point. Sources compose:
//!   - `InMemoryPyramid`: levels held as dense `Array3`s
//!   - `TransformedPyramid`: a delegate placed elsewhere in world space
//!   - `CroppedPyramid`: a delegate restricted to a real-valued region of interest
//!   - `MosaicPyramid`: many sources tiled into one planar grid, materialized lazily one chunk (cell) at a time
//!   - `DirectGridPyramid`: the same grid without a chunk cache
//!
//! Mosaic geometry is fixed at construction by the `GridLayout` planner, which keeps cell shapes divisible by the
//! downsampling between levels, and the per-level `CellIndex`. Chunks live in a `LazyChunkCache`, which loads each missing
//! chunk exactly once even when many threads ask for it. A `ProvenanceCodec` can pack the id of the owning source into every
//! mosaic voxel.

pub mod array;
pub mod caching;
pub mod crop;
pub mod direct_grid;
pub mod error;
pub mod grid;
pub mod memory;
pub mod mosaic;
pub mod provenance;
pub mod sample;
pub mod source;
pub mod transformed;

pub use array::*;
pub use caching::*;
pub use crop::*;
pub use direct_grid::*;
pub use error::*;
pub use grid::*;
pub use memory::*;
pub use mosaic::*;
pub use provenance::*;
pub use sample::*;
pub use source::*;
pub use transformed::*;

// Hash types to use for small keys like `PointN`.
pub type SmallKeyHashMap<K, V> = ahash::AHashMap<K, V>;
pub type SmallKeyHashSet<K> = ahash::AHashSet<K>;
pub type SmallKeyBuildHasher = ahash::RandomState;

pub mod prelude {
    pub use super::{
        copy_extent, Array3, CacheCapacity, ChunkKey, CroppedPyramid, DirectGridPyramid,
        GridLayout, InMemoryPyramid, LazyChunkCache, MosaicBuilder, MosaicConfig, MosaicPyramid,
        ProvenanceCodec, PyramidError, PyramidSource, PyramidSourceExt, RegionOfInterest, Sample,
        SharedSource, SourceKind, TransformedPyramid,
    };
}
