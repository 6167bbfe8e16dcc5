//! Which source owns which cell of one mosaic level, and where its data sits inside the cell.
//!
//! ```
//! use pyramid_mosaic_core::prelude::*;
//! use pyramid_mosaic_storage::CellIndex;
//!
//! let positions = [PointN([0, 0]), PointN([1, 0])];
//! let data_shapes = [PointN([8, 8, 1]), PointN([6, 4, 1])];
//! let index = CellIndex::build(&positions, PointN([8, 8, 1]), &data_shapes).unwrap();
//!
//! // The smaller image is centered in its cell.
//! let entry = index.resolve(PointN([8, 0])).unwrap();
//! assert_eq!(entry.source_index, 1);
//! assert_eq!(entry.translation, PointN([9, 2, 0]));
//!
//! assert!(index.resolve(PointN([16, 0])).is_none());
//! assert_eq!(index.extent().shape, PointN([16, 8, 1]));
//! ```

use crate::{
    validate_positions, GridLayout, PyramidError, PyramidSource, Result, Sample, SharedSource,
    SmallKeyHashMap,
};

use pyramid_mosaic_core::prelude::*;

/// One occupied cell.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct CellEntry {
    /// Index of the owning source in the mosaic's source list.
    pub source_index: usize,
    pub position: Point2i,
    /// Added to a voxel of the source to get the mosaic voxel.
    pub translation: Point3i,
}

/// Immutable map from cell to owner for one level.
#[derive(Clone, Debug)]
pub struct CellIndex {
    cell_shape: Point3i,
    cells: SmallKeyHashMap<Point2i, CellEntry>,
    extent: Extent3i,
    occupied: Extent2i,
}

impl CellIndex {
    /// `positions[i]` is the grid position of source `i`, whose data at this level has shape `data_shapes[i]`.
    pub fn build(positions: &[Point2i], cell_shape: Point3i, data_shapes: &[Point3i]) -> Result<Self> {
        if positions.is_empty() {
            return Err(PyramidError::geometry("a mosaic needs at least one cell"));
        }
        if !cell_shape.is_positive() {
            return Err(PyramidError::geometry(format!(
                "cell shape {:?} must be positive",
                cell_shape
            )));
        }
        validate_positions(positions, data_shapes.len())?;

        let cell_xy = cell_shape.xy();
        let mut cells = SmallKeyHashMap::with_capacity(positions.len());
        for (source_index, (&position, &data_shape)) in positions.iter().zip(data_shapes.iter()).enumerate() {
            let cell_min = position * cell_xy;
            let offset = (cell_xy - data_shape.xy()).scalar_div_floor(2);
            cells.insert(
                position,
                CellEntry {
                    source_index,
                    position,
                    translation: Point3i::from_xy(cell_min + offset, 0),
                },
            );
        }

        let occupied = bounding_extent(positions.iter().cloned())
            .unwrap_or_else(|| Extent2i::from_min_and_shape(Point2i::ZERO, Point2i::ZERO));
        let extent = Extent3i::from_min_and_lub(
            Point3i::ZERO,
            Point3i::from_xy((occupied.max() + Point2i::ONES) * cell_xy, cell_shape.z()),
        );

        Ok(Self {
            cell_shape,
            cells,
            extent,
            occupied,
        })
    }

    /// One index per level of `layout`, using the data shape of every source at that level and time point.
    pub fn build_levels<T>(
        sources: &[SharedSource<T>],
        positions: &[Point2i],
        layout: &GridLayout,
        time: u32,
    ) -> Result<Vec<Self>>
    where
        T: Sample,
    {
        (0..layout.num_levels())
            .zip(layout.cell_shapes().iter())
            .map(|(level, &cell_shape)| {
                let data_shapes = sources
                    .iter()
                    .map(|s| Ok(s.level_extent(time, level)?.shape))
                    .collect::<Result<Vec<_>>>()?;

                Self::build(positions, cell_shape, &data_shapes)
            })
            .collect()
    }

    #[inline]
    pub fn cell_shape(&self) -> Point3i {
        self.cell_shape
    }

    /// The voxel extent of the whole level. It always starts at the origin and reaches the farthest occupied cell.
    #[inline]
    pub fn extent(&self) -> &Extent3i {
        &self.extent
    }

    /// The owner of the cell whose minimum is `cell_min`, if any. Minimums that are not on a cell boundary resolve to
    /// nothing.
    pub fn resolve(&self, cell_min: Point2i) -> Option<&CellEntry> {
        let cell_xy = self.cell_shape.xy();
        let position = cell_min.vector_div_floor(&cell_xy);
        if position * cell_xy != cell_min {
            return None;
        }

        self.cells.get(&position)
    }

    /// The owner of the cell at grid `position`.
    #[inline]
    pub fn resolve_position(&self, position: Point2i) -> Option<&CellEntry> {
        self.cells.get(&position)
    }

    /// The 3D minimum of the cell containing voxel `p`.
    #[inline]
    pub fn cell_minimum_containing(&self, p: Point3i) -> Point3i {
        let cell_xy = self.cell_shape.xy();

        Point3i::from_xy(p.xy().vector_div_floor(&cell_xy) * cell_xy, 0)
    }

    /// Voxel bounding box of the occupied cells, which may start away from the origin.
    pub fn occupied_voxels(&self) -> Extent3i {
        let cell_xy = self.cell_shape.xy();
        let min = self.occupied.minimum * cell_xy;
        let lub = (self.occupied.max() + Point2i::ONES) * cell_xy;

        Extent3i::from_min_and_lub(Point3i::from_xy(min, 0), Point3i::from_xy(lub, self.cell_shape.z()))
    }

    /// The world-space box around all occupied cells, given the voxel-to-world transform of this level.
    pub fn region_mask(&self, transform: &Affine3) -> Extent3d {
        transform.estimate_bounds(&Extent3d::from(self.occupied_voxels()))
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &CellEntry> {
        self.cells.values()
    }
}

// ████████╗███████╗███████╗████████╗
// ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝
//    ██║   █████╗  ███████╗   ██║
//    ██║   ██╔══╝  ╚════██║   ██║
//    ██║   ███████╗███████║   ██║
//    ╚═╝   ╚══════╝╚══════╝   ╚═╝
