//! A virtual pyramid that tiles many sources into one planar grid.
//!
//! Each source owns one cell of the grid. Cells have the same shape at a given level (see `GridLayout`), and a source's data
//! is centered in its cell. Nothing is copied up front: the first read of a cell at some (time, level) synthesizes that
//! chunk from the owning source and keeps it in a `LazyChunkCache`.
//!
//! ```
//! use pyramid_mosaic_core::prelude::*;
//! use pyramid_mosaic_storage::prelude::*;
//! use std::sync::Arc;
//!
//! let extent = Extent3i::from_min_and_shape(Point3i::ZERO, PointN([10, 10, 1]));
//! let sources: Vec<SharedSource<u16>> = (0..3u16)
//!     .map(|i| {
//!         let s = InMemoryPyramid::single_level(format!("s{}", i), Array3::fill(extent, i + 1), Affine3::identity());
//!         Arc::new(s) as SharedSource<u16>
//!     })
//!     .collect();
//!
//! let mosaic = MosaicBuilder::new(MosaicConfig::default()).build(sources).unwrap();
//!
//! // Two columns, two rows, and the last cell is empty.
//! assert_eq!(mosaic.level_extent(0, 0).unwrap().shape, PointN([20, 20, 1]));
//! let view = mosaic.voxel_array(0, 0).unwrap();
//! assert_eq!(view.get(PointN([15, 5, 0])).unwrap(), 2);
//! assert_eq!(view.get(PointN([15, 15, 0])).unwrap(), 0);
//! ```

mod builder;

pub use builder::*;

use crate::{
    check_level, check_read_bounds, copy_extent, Array3, CacheStats, CellIndex, GridLayout,
    LazyChunkCache, ProvenanceCodec, PyramidError, PyramidSource, Result, Sample, SharedSource,
    SourceId, SourceKind,
};

use pyramid_mosaic_core::prelude::*;

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

/// Addresses one cached chunk: a whole cell of one level at one time point.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct ChunkKey {
    pub time: u32,
    pub level: u8,
    /// Always a multiple of the level's cell shape, with `z == 0`.
    pub minimum: Point3i,
}

pub(crate) struct Provenance {
    codec: Arc<ProvenanceCodec>,
    /// Indexed like the mosaic's sources.
    ids: Vec<SourceId>,
}

pub struct MosaicPyramid<T> {
    name: String,
    reference: SharedSource<T>,
    sources: Vec<SharedSource<T>>,
    positions: Vec<Point2i>,
    layout: GridLayout,
    cells: Vec<CellIndex>,
    region_mask: Extent3d,
    provenance: Option<Provenance>,
    cache: LazyChunkCache<ChunkKey, Array3<T>, PyramidError>,
    current_time: AtomicU32,
}

impl<T> MosaicPyramid<T>
where
    T: Sample,
{
    #[inline]
    pub fn layout(&self) -> &GridLayout {
        &self.layout
    }

    /// The cell ownership of `level`, or `None` if `level` is not planned.
    #[inline]
    pub fn cells(&self, level: u8) -> Option<&CellIndex> {
        self.cells.get(level as usize)
    }

    #[inline]
    pub fn sources(&self) -> &[SharedSource<T>] {
        &self.sources
    }

    #[inline]
    pub fn positions(&self) -> &[Point2i] {
        &self.positions
    }

    /// The world-space box around all occupied cells at level 0.
    #[inline]
    pub fn region_mask(&self) -> &Extent3d {
        &self.region_mask
    }

    pub fn codec(&self) -> Option<&Arc<ProvenanceCodec>> {
        self.provenance.as_ref().map(|p| &p.codec)
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }

    /// The number of chunks currently resident.
    pub fn num_cached_chunks(&self) -> usize {
        self.cache.len()
    }

    #[inline]
    pub fn current_time(&self) -> u32 {
        self.current_time.load(Ordering::Acquire)
    }

    /// Makes `time` the exposed time point and drops cached chunks of every other time point.
    pub fn set_current_time(&self, time: u32) -> Result<()> {
        if !self.reference.is_present(time) {
            return Err(PyramidError::TimepointUnavailable { time });
        }
        let previous = self.current_time.swap(time, Ordering::AcqRel);
        if previous != time {
            let dropped = self.cache.retain(|key| key.time == time);
            tracing::debug!(mosaic = %self.name, previous, time, dropped, "switched time point");
        }

        Ok(())
    }

    /// The level-0 translation of every source into the mosaic, in source order.
    pub fn source_translations(&self) -> Vec<(String, Point3i)> {
        let mut entries: Vec<_> = self.cells[0].iter().collect();
        entries.sort_by_key(|e| e.source_index);

        entries
            .into_iter()
            .map(|e| (self.sources[e.source_index].name().to_string(), e.translation))
            .collect()
    }

    /// Maps a mosaic voxel of `level` to the name of the source that shows it and the voxel in that source's coordinates.
    /// Margins and empty cells map to `None`.
    pub fn locate(&self, level: u8, voxel: Point3i) -> Option<(String, Point3i)> {
        let cells = self.cells.get(level as usize)?;
        let cell_min = cells.cell_minimum_containing(voxel);
        let entry = cells.resolve(cell_min.xy())?;
        let source = self.sources.get(entry.source_index)?;
        let data_extent = source.level_extent(self.current_time(), level).ok()?;

        let source_voxel = voxel - entry.translation + data_extent.minimum;
        if data_extent.contains(source_voxel) {
            Some((source.name().to_string(), source_voxel))
        } else {
            None
        }
    }

    /// The name of the source whose id is packed into `sample`. Always `None` without provenance encoding.
    pub fn decode_source(&self, sample: T) -> Option<String> {
        self.provenance
            .as_ref()
            .and_then(|p| p.codec.decode_sample_name(sample))
    }

    /// The chunk at `key`, synthesized on first use. Chunks of a time point other than the current one are not kept.
    pub fn chunk(&self, key: ChunkKey) -> Result<Arc<Array3<T>>> {
        check_level(key.level, self.layout.num_levels())?;
        if !self.reference.is_present(key.time) {
            return Err(PyramidError::TimepointUnavailable { time: key.time });
        }

        self.load_chunk(key)
    }

    /// A flight that finishes after a time switch must not refill the cache with chunks of the old time point.
    fn load_chunk(&self, key: ChunkKey) -> Result<Arc<Array3<T>>> {
        self.cache.get_or_load_if(
            key,
            |k| self.synthesize(k),
            |k| k.time == self.current_time(),
        )
    }

    /// Like `read_extent`, but a chunk that fails to load is logged and left at the background value.
    pub fn read_extent_or_background(
        &self,
        time: u32,
        level: u8,
        extent: &Extent3i,
    ) -> Result<Array3<T>> {
        self.read_chunks(time, level, extent, |key, result| match result {
            Ok(chunk) => Ok(Some(chunk)),
            Err(e) => {
                tracing::warn!(mosaic = %self.name, ?key, error = %e, "chunk unavailable, showing background");

                Ok(None)
            }
        })
    }

    fn read_chunks(
        &self,
        time: u32,
        level: u8,
        extent: &Extent3i,
        mut on_chunk: impl FnMut(ChunkKey, Result<Arc<Array3<T>>>) -> Result<Option<Arc<Array3<T>>>>,
    ) -> Result<Array3<T>> {
        check_level(level, self.layout.num_levels())?;
        if !self.reference.is_present(time) {
            return Err(PyramidError::TimepointUnavailable { time });
        }
        let cells = &self.cells[level as usize];
        check_read_bounds(extent, cells.extent())?;
        if time != self.current_time() {
            self.set_current_time(time)?;
        }

        let mut out = Array3::fill(*extent, T::background());
        if extent.is_empty() {
            return Ok(out);
        }

        let cell_xy = cells.cell_shape().xy();
        let first = extent.minimum.xy().vector_div_floor(&cell_xy);
        let last = extent.max().xy().vector_div_floor(&cell_xy);
        for position in Extent2i::from_min_and_max(first, last).iter_points() {
            let key = ChunkKey {
                time,
                level,
                minimum: Point3i::from_xy(position * cell_xy, 0),
            };
            let result = self.load_chunk(key);
            if let Some(chunk) = on_chunk(key, result)? {
                copy_extent(extent, &chunk, &mut out);
            }
        }

        Ok(out)
    }

    fn synthesize(&self, key: &ChunkKey) -> Result<Array3<T>> {
        let span = tracing::trace_span!(
            "synthesize_chunk",
            time = key.time,
            level = key.level,
            minimum = ?key.minimum
        );
        let _enter = span.enter();

        let cells = &self.cells[key.level as usize];
        if cells.cell_minimum_containing(key.minimum) != key.minimum {
            return Err(PyramidError::UnresolvedCell {
                level: key.level,
                minimum: key.minimum,
            });
        }
        let chunk_extent = Extent3i::from_min_and_shape(key.minimum, cells.cell_shape());
        let mut chunk = Array3::fill(chunk_extent, T::background());

        let entry = match cells.resolve(key.minimum.xy()) {
            Some(entry) => entry,
            None => {
                tracing::trace!("empty cell");

                return Ok(chunk);
            }
        };
        let source = self
            .sources
            .get(entry.source_index)
            .ok_or(PyramidError::UnresolvedCell {
                level: key.level,
                minimum: key.minimum,
            })?;

        let data_extent = source.level_extent(key.time, key.level)?;
        let placed = Extent3i::from_min_and_shape(entry.translation, data_extent.shape);
        let overlap = placed.intersection(&chunk_extent);
        if overlap.is_empty() {
            return Ok(chunk);
        }

        let mut data = source.read_extent(
            key.time,
            key.level,
            &(overlap - entry.translation + data_extent.minimum),
        )?;
        data.set_minimum(overlap.minimum);

        if let Some(provenance) = &self.provenance {
            let id = provenance.ids[entry.source_index];
            for value in data.values_mut_slice().iter_mut() {
                *value = provenance.codec.encode_sample(*value, id)?;
            }
        }
        copy_extent(&overlap, &data, &mut chunk);
        tracing::trace!(source = source.name(), "synthesized chunk");

        Ok(chunk)
    }
}

impl<T> PyramidSource<T> for MosaicPyramid<T>
where
    T: Sample,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn num_levels(&self) -> u8 {
        self.layout.num_levels()
    }

    fn is_present(&self, time: u32) -> bool {
        self.reference.is_present(time)
    }

    fn source_transform(&self, time: u32, level: u8) -> Result<Affine3> {
        check_level(level, self.layout.num_levels())?;

        self.reference.source_transform(time, level)
    }

    fn voxel_size(&self) -> Point3d {
        self.reference.voxel_size()
    }

    fn level_extent(&self, _time: u32, level: u8) -> Result<Extent3i> {
        check_level(level, self.layout.num_levels())?;

        Ok(*self.cells[level as usize].extent())
    }

    fn read_extent(&self, time: u32, level: u8, extent: &Extent3i) -> Result<Array3<T>> {
        self.read_chunks(time, level, extent, |_, result| result.map(Some))
    }

    fn kind(&self) -> SourceKind<'_, T> {
        SourceKind::Mosaic(&self.sources)
    }
}

// ████████╗███████╗███████╗████████╗███████╗
// ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝
//    ██║   █████╗  ███████╗   ██║   ███████╗
//    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║
//    ██║   ███████╗███████║   ██║   ███████║
//    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{leaf_sources, CacheCapacity, InMemoryPyramid, PyramidSourceExt};

    use pretty_assertions::assert_eq;
    use std::sync::atomic::AtomicUsize;
    use std::sync::Barrier;

    fn source<T: Sample>(name: &str, shape: Point3i, f: impl FnMut(Point3i) -> T) -> SharedSource<T> {
        let array = Array3::fill_with(Extent3i::from_min_and_shape(Point3i::ZERO, shape), f);

        Arc::new(InMemoryPyramid::single_level(name, array, Affine3::identity()))
    }

    fn quad(config: MosaicConfig) -> MosaicPyramid<u16> {
        let sources = (0..4u16)
            .map(|i| {
                source(&format!("s{}", i), PointN([100, 100, 1]), move |p| {
                    i * 1000 + (p.x() + p.y()) as u16
                })
            })
            .collect();

        MosaicBuilder::new(MosaicConfig {
            positions: Some(vec![[0, 0], [1, 0], [0, 1], [1, 1]]),
            ..config
        })
        .build(sources)
        .unwrap()
    }

    #[test]
    fn four_cells_make_one_image() {
        let mosaic = quad(MosaicConfig::default());

        assert_eq!(
            mosaic.level_extent(0, 0).unwrap(),
            Extent3i::from_min_and_shape(Point3i::ZERO, PointN([200, 200, 1]))
        );

        let chunk = mosaic
            .chunk(ChunkKey {
                time: 0,
                level: 0,
                minimum: PointN([100, 100, 0]),
            })
            .unwrap();
        let cell_data = Extent3i::from_min_and_shape(Point3i::ZERO, PointN([100, 100, 1]));
        let expected = mosaic.sources()[3].read_extent(0, 0, &cell_data).unwrap();
        assert_eq!(chunk.values_slice(), expected.values_slice());
        assert_eq!(chunk.extent().minimum, PointN([100, 100, 0]));
    }

    #[test]
    fn reads_span_chunk_boundaries() {
        let mosaic = quad(MosaicConfig::default());

        let extent = Extent3i::from_min_and_shape(PointN([98, 99, 0]), PointN([4, 2, 1]));
        let read = mosaic.read_extent(0, 0, &extent).unwrap();

        assert_eq!(read.get(PointN([99, 99, 0])), 99 + 99);
        assert_eq!(read.get(PointN([100, 99, 0])), 1000 + 99);
        assert_eq!(read.get(PointN([99, 100, 0])), 2000 + 99);
        assert_eq!(read.get(PointN([101, 100, 0])), 3001);
        assert_eq!(mosaic.num_cached_chunks(), 4);

        assert!(matches!(
            mosaic.read_extent(0, 0, &(extent + PointN([200, 0, 0]))),
            Err(PyramidError::OutOfBounds { .. })
        ));
    }

    #[test]
    fn smaller_sources_are_centered_in_margins() {
        let sources = vec![
            source("big", PointN([10, 10, 1]), |_| 1u8),
            source("small", PointN([4, 6, 1]), |_| 2u8),
        ];
        let mosaic = MosaicBuilder::new(MosaicConfig {
            relative_cell_margin: 0.5,
            ..Default::default()
        })
        .build(sources)
        .unwrap();

        assert_eq!(mosaic.layout().cell_shape(0), Some(PointN([20, 20, 1])));
        assert_eq!(
            mosaic.source_translations(),
            vec![
                ("big".to_string(), PointN([5, 5, 0])),
                ("small".to_string(), PointN([28, 7, 0])),
            ]
        );

        let view = mosaic.voxel_array(0, 0).unwrap();
        assert_eq!(view.get(PointN([5, 5, 0])).unwrap(), 1);
        assert_eq!(view.get(PointN([4, 5, 0])).unwrap(), 0);
        assert_eq!(view.get(PointN([28, 7, 0])).unwrap(), 2);
        assert_eq!(view.get(PointN([32, 7, 0])).unwrap(), 0);

        assert_eq!(
            mosaic.locate(0, PointN([29, 12, 0])),
            Some(("small".to_string(), PointN([1, 5, 0])))
        );
        assert_eq!(mosaic.locate(0, PointN([27, 12, 0])), None);
        assert_eq!(
            *mosaic.region_mask(),
            Extent3d::from_bounds(Point3d::ZERO, PointN([40.0, 20.0, 1.0]))
        );
    }

    #[test]
    fn levels_use_planned_cell_shapes() {
        let sources: Vec<SharedSource<u8>> = (0..2)
            .map(|i| {
                let level0 = Array3::fill(
                    Extent3i::from_min_and_shape(Point3i::ZERO, PointN([30, 14, 1])),
                    i as u8 + 1,
                );
                let pyramid = InMemoryPyramid::downsampled(
                    format!("p{}", i),
                    level0,
                    Affine3::identity(),
                    3,
                    PointN([2, 2, 1]),
                )
                .unwrap();

                Arc::new(pyramid) as SharedSource<u8>
            })
            .collect();
        let mosaic = MosaicBuilder::new(MosaicConfig::default()).build(sources).unwrap();

        assert_eq!(mosaic.layout().cell_shape(0), Some(PointN([32, 16, 1])));
        assert_eq!(mosaic.level_extent(0, 2).unwrap().shape, PointN([16, 4, 1]));
        let view = mosaic.voxel_array(0, 2).unwrap();
        let values = view.read_all().unwrap();
        assert_eq!(values.get(PointN([1, 1, 0])), 1);
        assert_eq!(values.get(PointN([9, 1, 0])), 2);
        assert!(mosaic.voxel_array(0, 3).is_err());
    }

    #[test]
    fn provenance_is_packed_into_values() {
        let codec = Arc::new(ProvenanceCodec::default());
        codec.register("unrelated").unwrap();
        let sources = vec![
            source("a", PointN([2, 2, 1]), |_| 7u32),
            source("b", PointN([2, 2, 1]), |_| 9u32),
        ];
        let mosaic = MosaicBuilder::new(MosaicConfig {
            encode_provenance: true,
            ..Default::default()
        })
        .with_codec(codec.clone())
        .build(sources)
        .unwrap();

        let view = mosaic.voxel_array(0, 0).unwrap();
        let a = view.get(PointN([0, 0, 0])).unwrap();
        let b = view.get(PointN([3, 1, 0])).unwrap();
        assert_eq!(a, 7 | (1 << 16));
        assert_eq!(b, 9 | (2 << 16));
        assert_eq!(mosaic.decode_source(b).as_deref(), Some("b"));
        assert_eq!(codec.decode(u64::from(a)), (7, 1));
    }

    #[test]
    fn provenance_needs_wide_unsigned_samples() {
        let build = |encode_provenance| {
            MosaicBuilder::new(MosaicConfig {
                encode_provenance,
                ..Default::default()
            })
            .build(vec![source("a", Point3i::ONES, |_| 1.0f32)])
        };

        assert!(matches!(build(true), Err(PyramidError::EncodingOverflow(_))));
        assert!(build(false).is_ok());
    }

    struct CountingSource {
        inner: InMemoryPyramid<u8>,
        reads: AtomicUsize,
        fail: bool,
    }

    impl PyramidSource<u8> for CountingSource {
        fn name(&self) -> &str {
            self.inner.name()
        }
        fn num_levels(&self) -> u8 {
            self.inner.num_levels()
        }
        fn is_present(&self, time: u32) -> bool {
            self.inner.is_present(time)
        }
        fn source_transform(&self, time: u32, level: u8) -> Result<Affine3> {
            self.inner.source_transform(time, level)
        }
        fn voxel_size(&self) -> Point3d {
            self.inner.voxel_size()
        }
        fn level_extent(&self, time: u32, level: u8) -> Result<Extent3i> {
            self.inner.level_extent(time, level)
        }
        fn read_extent(&self, time: u32, level: u8, extent: &Extent3i) -> Result<Array3<u8>> {
            self.reads.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(PyramidError::Source("disk on fire".to_string()));
            }
            self.inner.read_extent(time, level, extent)
        }
    }

    fn counting(name: &str, fail: bool) -> Arc<CountingSource> {
        let array = Array3::fill(Extent3i::from_min_and_shape(Point3i::ZERO, PointN([4, 4, 1])), 5u8);

        Arc::new(CountingSource {
            inner: InMemoryPyramid::single_level(name, array, Affine3::identity()).with_timepoints(vec![0, 1]),
            reads: AtomicUsize::new(0),
            fail,
        })
    }

    #[test]
    fn cached_chunks_do_not_touch_sources() {
        let counter = counting("c", false);
        let mosaic = MosaicBuilder::new(MosaicConfig::default())
            .build(vec![counter.clone() as SharedSource<u8>])
            .unwrap();
        let key = ChunkKey {
            time: 0,
            level: 0,
            minimum: Point3i::ZERO,
        };

        let first = mosaic.chunk(key).unwrap();
        let second = mosaic.chunk(key).unwrap();

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(counter.reads.load(Ordering::SeqCst), 1);
        assert_eq!(mosaic.cache_stats().hits, 1);
    }

    #[test]
    fn concurrent_reads_synthesize_once() {
        let counter = counting("c", false);
        let mosaic = Arc::new(
            MosaicBuilder::new(MosaicConfig::default())
                .build(vec![counter.clone() as SharedSource<u8>])
                .unwrap(),
        );

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let mosaic = mosaic.clone();
                std::thread::spawn(move || mosaic.voxel_array(0, 0).unwrap().read_all().unwrap())
            })
            .collect();
        for h in handles {
            assert_eq!(h.join().unwrap().into_values(), vec![5u8; 16]);
        }

        assert_eq!(counter.reads.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn failed_chunks_degrade_to_background() {
        let sources: Vec<SharedSource<u8>> = vec![counting("ok", false), counting("bad", true)];
        let mosaic = MosaicBuilder::new(MosaicConfig::default()).build(sources).unwrap();
        let all = mosaic.level_extent(0, 0).unwrap();

        assert!(matches!(
            mosaic.read_extent(0, 0, &all),
            Err(PyramidError::Source(_))
        ));

        let degraded = mosaic.read_extent_or_background(0, 0, &all).unwrap();
        assert_eq!(degraded.get(PointN([0, 0, 0])), 5);
        assert_eq!(degraded.get(PointN([4, 0, 0])), 0);
        // Failures are not cached, so every read retries.
        assert_eq!(mosaic.num_cached_chunks(), 1);
    }

    #[test]
    fn switching_time_drops_old_chunks() {
        let mosaic = MosaicBuilder::new(MosaicConfig::default())
            .build(vec![counting("c", false) as SharedSource<u8>])
            .unwrap();
        let all = mosaic.level_extent(0, 0).unwrap();

        mosaic.read_extent(0, 0, &all).unwrap();
        assert_eq!(mosaic.num_cached_chunks(), 1);

        mosaic.read_extent(1, 0, &all).unwrap();
        assert_eq!(mosaic.current_time(), 1);
        assert_eq!(mosaic.num_cached_chunks(), 1);
        assert!(!mosaic.cache.contains(&ChunkKey {
            time: 0,
            level: 0,
            minimum: Point3i::ZERO
        }));

        assert_eq!(
            mosaic.read_extent(2, 0, &all).unwrap_err(),
            PyramidError::TimepointUnavailable { time: 2 }
        );
        assert!(mosaic.set_current_time(0).is_ok());
        assert_eq!(mosaic.num_cached_chunks(), 0);
    }

    /// Blocks inside `read_extent` until released, so a test can act while a chunk is being synthesized.
    struct GatedSource {
        inner: InMemoryPyramid<u8>,
        gate: Barrier,
    }

    impl PyramidSource<u8> for GatedSource {
        fn name(&self) -> &str {
            self.inner.name()
        }
        fn num_levels(&self) -> u8 {
            self.inner.num_levels()
        }
        fn is_present(&self, time: u32) -> bool {
            self.inner.is_present(time)
        }
        fn source_transform(&self, time: u32, level: u8) -> Result<Affine3> {
            self.inner.source_transform(time, level)
        }
        fn voxel_size(&self) -> Point3d {
            self.inner.voxel_size()
        }
        fn level_extent(&self, time: u32, level: u8) -> Result<Extent3i> {
            self.inner.level_extent(time, level)
        }
        fn read_extent(&self, time: u32, level: u8, extent: &Extent3i) -> Result<Array3<u8>> {
            // Started.
            self.gate.wait();
            // Released.
            self.gate.wait();
            self.inner.read_extent(time, level, extent)
        }
    }

    #[test]
    fn synthesis_finishing_after_time_switch_is_not_cached() {
        let array = Array3::fill(Extent3i::from_min_and_shape(Point3i::ZERO, PointN([4, 4, 1])), 5u8);
        let gated = Arc::new(GatedSource {
            inner: InMemoryPyramid::single_level("g", array, Affine3::identity()).with_timepoints(vec![0, 1]),
            gate: Barrier::new(2),
        });
        let mosaic = Arc::new(
            MosaicBuilder::new(MosaicConfig::default())
                .build(vec![gated.clone() as SharedSource<u8>])
                .unwrap(),
        );
        let all = mosaic.level_extent(0, 0).unwrap();

        let reader = {
            let mosaic = mosaic.clone();
            std::thread::spawn(move || mosaic.read_extent(0, 0, &all).unwrap())
        };
        gated.gate.wait();
        mosaic.set_current_time(1).unwrap();
        gated.gate.wait();

        assert_eq!(reader.join().unwrap().into_values(), vec![5u8; 16]);
        assert_eq!(mosaic.current_time(), 1);
        assert_eq!(mosaic.num_cached_chunks(), 0);
        assert!(!mosaic.cache.contains(&ChunkKey {
            time: 0,
            level: 0,
            minimum: Point3i::ZERO
        }));
    }

    #[test]
    fn depth_is_not_rounded_with_the_tiled_axes() {
        let sources: Vec<SharedSource<u8>> = (0..2)
            .map(|i| {
                let level0 = Array3::fill(Extent3i::from_min_and_shape(Point3i::ZERO, PointN([10, 10, 5])), 1u8);
                let pyramid =
                    InMemoryPyramid::downsampled(format!("p{}", i), level0, Affine3::identity(), 2, Point3i::fill(2))
                        .unwrap();

                Arc::new(pyramid) as SharedSource<u8>
            })
            .collect();
        let reference_depth = |level| sources[0].level_extent(0, level).unwrap().shape.z();
        let depths = (reference_depth(0), reference_depth(1));

        let mosaic = MosaicBuilder::new(MosaicConfig::default()).build(sources).unwrap();

        assert_eq!(mosaic.level_extent(0, 0).unwrap().shape, PointN([20, 10, depths.0]));
        assert_eq!(mosaic.level_extent(0, 1).unwrap().shape, PointN([10, 5, depths.1]));
        assert_eq!(depths.0, 5);
        assert_eq!(mosaic.cells(1).map(|c| c.cell_shape()), Some(PointN([5, 5, depths.1])));
        assert!(mosaic.cells(2).is_none());

        let values = mosaic.voxel_array(0, 0).unwrap().read_all().unwrap();
        assert!(values.values_slice().iter().all(|v| *v == 1));
    }

    #[test]
    fn mosaics_nest() {
        let inner: SharedSource<u16> = Arc::new(quad(MosaicConfig {
            name: "inner".to_string(),
            ..Default::default()
        }));
        let outer = MosaicBuilder::new(MosaicConfig::default())
            .build(vec![inner, source("solo", PointN([200, 200, 1]), |_| 42u16)])
            .unwrap();

        let names: Vec<_> = leaf_sources(&outer).iter().map(|s| s.name().to_string()).collect();
        assert_eq!(names, vec!["s0", "s1", "s2", "s3", "solo"]);

        let view = outer.voxel_array(0, 0).unwrap();
        assert_eq!(view.get(PointN([150, 50, 0])).unwrap(), 1000 + 50 + 50);
        assert_eq!(view.get(PointN([250, 50, 0])).unwrap(), 42);
    }

    #[test]
    fn resolve_names_from_config() {
        let config: MosaicConfig = ron::from_str(
            r#"(
                name: "plate",
                sources: ["a", "b"],
                positions: Some([(0, 0), (0, 1)]),
                cache: (max_chunks: 8),
            )"#,
        )
        .unwrap();
        let lookup = |name: &str| match name {
            "a" | "b" => Some(source(name, PointN([3, 3, 1]), |_| 1u8)),
            _ => None,
        };

        let mosaic = MosaicBuilder::new(config.clone()).resolve(lookup).unwrap();
        assert_eq!(mosaic.name(), "plate");
        assert_eq!(mosaic.level_extent(0, 0).unwrap().shape, PointN([3, 6, 1]));
        assert_eq!(mosaic.cache.capacity(), CacheCapacity::with_max_chunks(8));

        let missing = MosaicConfig {
            sources: vec!["a".to_string(), "zzz".to_string()],
            ..config
        };
        assert_eq!(
            MosaicBuilder::new(missing).resolve(lookup).err(),
            Some(PyramidError::MissingSource("zzz".to_string()))
        );
    }
}
