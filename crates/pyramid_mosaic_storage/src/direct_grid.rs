//! A grid mosaic without a chunk cache.
//!
//! Every read is answered straight from the cell sources. A mosaic voxel `p` belongs to the cell at grid position
//! `floor(p / cell_shape)`, and its coordinate inside that cell is `p mod cell_shape` (per tiled axis). This is cheaper than
//! a `MosaicPyramid` when each voxel is read once, e.g. for export, and it never holds chunks in memory.

use crate::{
    auto_positions, check_level, check_read_bounds, copy_extent, validate_positions, Array3, CellIndex,
    GridLayout, PyramidError, PyramidSource, Result, Sample, SharedSource, SourceKind,
};

use pyramid_mosaic_core::prelude::*;

pub struct DirectGridPyramid<T> {
    name: String,
    sources: Vec<SharedSource<T>>,
    layout: GridLayout,
    cells: Vec<CellIndex>,
}

impl<T> DirectGridPyramid<T>
where
    T: Sample,
{
    /// Plans the grid at time point 0. `positions` are assigned automatically when `None`.
    pub fn new(
        name: impl Into<String>,
        sources: Vec<SharedSource<T>>,
        positions: Option<Vec<Point2i>>,
        relative_cell_margin: f64,
    ) -> Result<Self> {
        let reference = sources
            .first()
            .ok_or_else(|| PyramidError::geometry("a grid needs at least one source"))?;
        if !reference.is_present(0) {
            return Err(PyramidError::TimepointUnavailable { time: 0 });
        }
        let positions = positions.unwrap_or_else(|| auto_positions(sources.len()));
        validate_positions(&positions, sources.len())?;

        let layout = GridLayout::plan(&**reference, relative_cell_margin, 0)?;
        let cells = CellIndex::build_levels(&sources, &positions, &layout, 0)?;

        Ok(Self {
            name: name.into(),
            sources,
            layout,
            cells,
        })
    }

    pub fn layout(&self) -> &GridLayout {
        &self.layout
    }

    /// Copies the part of `cell_block` (which lies in one cell) that is covered by the owning source's data.
    fn read_cell_block(
        &self,
        time: u32,
        level: u8,
        cell_block: &Extent3i,
        out: &mut Array3<T>,
    ) -> Result<()> {
        let cells = &self.cells[level as usize];
        let cell_shape = cells.cell_shape();
        let position = cell_block.minimum.xy().vector_div_floor(&cell_shape.xy());
        let entry = match cells.resolve_position(position) {
            Some(entry) => entry,
            None => return Ok(()),
        };
        let source = self
            .sources
            .get(entry.source_index)
            .ok_or(PyramidError::UnresolvedCell {
                level,
                minimum: Point3i::from_xy(position * cell_shape.xy(), 0),
            })?;

        // Where the source's data starts inside the cell.
        let cell_min = Point3i::from_xy(position * cell_shape.xy(), 0);
        let data_offset = entry.translation - cell_min;

        let local_min = Point3i::from_xy(
            cell_block.minimum.xy().vector_rem_euclid(&cell_shape.xy()),
            cell_block.minimum.z(),
        );
        let local_block = cell_block.with_minimum(local_min);

        let data_extent = source.level_extent(time, level)?;
        let wanted = local_block - data_offset + data_extent.minimum;
        let read = wanted.intersection(&data_extent);
        if read.is_empty() {
            return Ok(());
        }

        let mut data = source.read_extent(time, level, &read)?;
        let shift = cell_block.minimum - local_min + data_offset - data_extent.minimum;
        data.set_minimum(read.minimum + shift);
        copy_extent(cell_block, &data, out);

        Ok(())
    }
}

impl<T> PyramidSource<T> for DirectGridPyramid<T>
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
        self.sources[0].is_present(time)
    }

    fn source_transform(&self, time: u32, level: u8) -> Result<Affine3> {
        check_level(level, self.num_levels())?;

        self.sources[0].source_transform(time, level)
    }

    fn voxel_size(&self) -> Point3d {
        self.sources[0].voxel_size()
    }

    fn level_extent(&self, _time: u32, level: u8) -> Result<Extent3i> {
        check_level(level, self.num_levels())?;

        Ok(*self.cells[level as usize].extent())
    }

    fn read_extent(&self, time: u32, level: u8, extent: &Extent3i) -> Result<Array3<T>> {
        check_level(level, self.num_levels())?;
        if !self.is_present(time) {
            return Err(PyramidError::TimepointUnavailable { time });
        }
        let cells = &self.cells[level as usize];
        check_read_bounds(extent, cells.extent())?;

        let mut out = Array3::fill(*extent, T::background());
        if extent.is_empty() {
            return Ok(out);
        }

        let cell_shape = cells.cell_shape();
        let first = extent.minimum.xy().vector_div_floor(&cell_shape.xy());
        let last = extent.max().xy().vector_div_floor(&cell_shape.xy());
        for position in Extent2i::from_min_and_max(first, last).iter_points() {
            let cell = Extent3i::from_min_and_shape(Point3i::from_xy(position * cell_shape.xy(), 0), cell_shape);
            self.read_cell_block(time, level, &cell.intersection(extent), &mut out)?;
        }

        Ok(out)
    }

    fn kind(&self) -> SourceKind<'_, T> {
        SourceKind::Mosaic(&self.sources)
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
    use crate::{InMemoryPyramid, MosaicBuilder, MosaicConfig, PyramidSourceExt};

    use std::sync::Arc;

    fn sources() -> Vec<SharedSource<u16>> {
        (0..3u16)
            .map(|i| {
                let shape = PointN([5 + i as i32, 4, 2]);
                let array = Array3::fill_with(Extent3i::from_min_and_shape(Point3i::ZERO, shape), |p| {
                    100 * (i + 1) + (p.x() + 10 * p.y()) as u16
                });

                Arc::new(InMemoryPyramid::single_level(format!("s{}", i), array, Affine3::identity()))
                    as SharedSource<u16>
            })
            .collect()
    }

    #[test]
    fn matches_cached_mosaic() {
        let positions = vec![PointN([0, 0]), PointN([2, 0]), PointN([1, 1])];
        let direct = DirectGridPyramid::new("direct", sources(), Some(positions.clone()), 0.5).unwrap();
        let cached = MosaicBuilder::new(MosaicConfig {
            positions: Some(positions.iter().map(|p| p.0).collect()),
            relative_cell_margin: 0.5,
            ..Default::default()
        })
        .build(sources())
        .unwrap();

        let extent = direct.level_extent(0, 0).unwrap();
        assert_eq!(extent, cached.level_extent(0, 0).unwrap());

        let a = direct.voxel_array(0, 0).unwrap().read_all().unwrap();
        let b = cached.voxel_array(0, 0).unwrap().read_all().unwrap();
        assert_eq!(a, b);

        // A block that straddles cells and starts inside a margin.
        let block = Extent3i::from_min_and_shape(PointN([3, 2, 1]), PointN([9, 6, 1]));
        assert_eq!(
            direct.read_extent(0, 0, &block).unwrap(),
            cached.read_extent(0, 0, &block).unwrap()
        );
    }

    #[test]
    fn local_coordinates_wrap_by_cell_shape() {
        let direct = DirectGridPyramid::new("direct", sources(), None, 0.0).unwrap();
        let view = direct.voxel_array(0, 0).unwrap();

        // Cell (1, 0) is 5 wide and holds a 6-wide source, centered with a floor offset of -1.
        assert_eq!(direct.layout().cell_shape(0), Some(PointN([5, 4, 2])));
        assert_eq!(view.get(PointN([5, 0, 0])).unwrap(), 201);
        assert_eq!(view.get(PointN([9, 3, 1])).unwrap(), 200 + 5 + 30);
        assert_eq!(view.get(PointN([0, 4, 0])).unwrap(), 300 + 1);
        assert_eq!(view.get(PointN([7, 4, 0])).unwrap(), 0);
    }
}
