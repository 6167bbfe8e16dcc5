//! Per-level cell shapes that stay aligned across resolution levels.
//!
//! Every cell of a mosaic has the same voxel shape at a given level. If that shape were not divisible by the downsampling
//! between consecutive levels, each coarser level would place its cells at slightly different world positions than the
//! finer one, and images would visibly jump while zooming. So the level-0 shape is rounded up to a multiple of the product
//! of all downsampling factors, and each coarser shape is the finer one divided by that level's factor. Only the two tiled
//! axes are planned this way. The depth of every level is the reference's own depth at that level.
//!
//! ```
//! use pyramid_mosaic_core::prelude::*;
//! use pyramid_mosaic_storage::prelude::*;
//!
//! let level0 = Array3::fill(Extent3i::from_min_and_shape(Point3i::ZERO, PointN([100, 60, 1])), 0u8);
//! let reference = InMemoryPyramid::downsampled("ref", level0, Affine3::identity(), 3, PointN([2, 2, 1])).unwrap();
//!
//! let layout = GridLayout::plan(&reference, 0.0, 0).unwrap();
//! assert_eq!(layout.cell_shape(0), Some(PointN([100, 60, 1])));
//! assert_eq!(layout.cell_shape(2), Some(PointN([25, 15, 1])));
//! assert_eq!(layout.cell_shape(3), None);
//! ```

use crate::{PyramidError, PyramidSource, Result, Sample};

use pyramid_mosaic_core::{int_math::round_up_to_multiple, prelude::*};

/// Factors closer than this to an integer are treated as that integer.
const FACTOR_TOLERANCE: f64 = 1e-6;

/// The frozen cell geometry of a mosaic.
#[derive(Clone, Debug, PartialEq)]
pub struct GridLayout {
    cell_shapes: Vec<Point3i>,
    /// `factors[L]` is the voxel size of level `L` divided by that of level `L - 1`. `factors[0]` is all ones.
    factors: Vec<Point3d>,
    voxel_size: Point3d,
}

impl GridLayout {
    /// Plans cell shapes from the levels of `reference` at time point `time`.
    ///
    /// `relative_margin` inflates the level-0 cell on the two tiled axes by `margin` of the reference shape on each side.
    pub fn plan<T, S>(reference: &S, relative_margin: f64, time: u32) -> Result<Self>
    where
        T: Sample,
        S: PyramidSource<T> + ?Sized,
    {
        if !relative_margin.is_finite() || relative_margin < 0.0 {
            return Err(PyramidError::geometry(format!(
                "relative cell margin {} must be finite and non-negative",
                relative_margin
            )));
        }
        let num_levels = reference.num_levels();
        if num_levels == 0 {
            return Err(PyramidError::geometry(format!(
                "reference {:?} has no levels",
                reference.name()
            )));
        }

        let voxel_sizes = (0..num_levels)
            .map(|level| Ok(reference.source_transform(time, level)?.voxel_size()))
            .collect::<Result<Vec<_>>>()?;
        let factors = downsampling_factors(&voxel_sizes)?;

        let depths = (0..num_levels)
            .map(|level| Ok(reference.level_extent(time, level)?.shape.z().max(1)))
            .collect::<Result<Vec<_>>>()?;
        let reference_shape = reference.level_extent(time, 0)?.shape;
        if !reference_shape.is_positive() {
            return Err(PyramidError::geometry(format!(
                "reference {:?} has an empty level 0 of shape {:?}",
                reference.name(),
                reference_shape
            )));
        }

        let mut base = reference_shape;
        for axis in 0..2 {
            let inflated = f64::from(base.at(axis)) * (1.0 + 2.0 * relative_margin);
            if inflated > f64::from(i32::MAX) {
                return Err(PyramidError::geometry("cell margin overflows the voxel lattice"));
            }
            base.0[axis] = inflated as i32;
        }

        let mut base_xy = base.xy();
        if num_levels > 1 {
            let product = factors
                .iter()
                .fold(Point3d::ONES, |acc, f| acc * *f)
                .round()
                .join(&Point3d::ONES)
                .as_3i()
                .xy();
            base_xy = base_xy.map_components_binary(&product, round_up_to_multiple);
        }

        let mut cell_shapes = Vec::with_capacity(num_levels as usize);
        let mut finer_xy = base_xy;
        for (factor, &depth) in factors.iter().zip(depths.iter()) {
            let xy = PointN([
                (f64::from(finer_xy.x()) / factor.x()).floor() as i32,
                (f64::from(finer_xy.y()) / factor.y()).floor() as i32,
            ])
            .join(&Point2i::ONES);
            cell_shapes.push(Point3i::from_xy(xy, depth));
            finer_xy = xy;
        }

        tracing::debug!(
            reference = reference.name(),
            ?cell_shapes,
            relative_margin,
            "planned grid layout"
        );

        Ok(Self {
            cell_shapes,
            factors,
            voxel_size: voxel_sizes[0],
        })
    }

    /// A layout with explicit per-level cell shapes and integer factors. Used when the cell shape is already known.
    pub fn from_cell_shapes(cell_shapes: Vec<Point3i>, voxel_size: Point3d) -> Result<Self> {
        if cell_shapes.is_empty() {
            return Err(PyramidError::geometry("a layout needs at least one level"));
        }
        if let Some(bad) = cell_shapes.iter().find(|s| !s.is_positive()) {
            return Err(PyramidError::geometry(format!("cell shape {:?} must be positive", bad)));
        }
        let mut factors = vec![Point3d::ONES];
        for pair in cell_shapes.windows(2) {
            factors.push(Point3d::from(pair[0]) / Point3d::from(pair[1]));
        }

        Ok(Self {
            cell_shapes,
            factors,
            voxel_size,
        })
    }

    #[inline]
    pub fn num_levels(&self) -> u8 {
        self.cell_shapes.len() as u8
    }

    /// `None` if `level` is not planned.
    #[inline]
    pub fn cell_shape(&self, level: u8) -> Option<Point3i> {
        self.cell_shapes.get(level as usize).copied()
    }

    #[inline]
    pub fn cell_shapes(&self) -> &[Point3i] {
        &self.cell_shapes
    }

    /// Voxel size of `level` relative to `level - 1`. Level 0 is all ones.
    #[inline]
    pub fn downsampling_factors(&self, level: u8) -> Option<Point3d> {
        self.factors.get(level as usize).copied()
    }

    /// World size of one cell, using the reference's level-0 voxel size.
    pub fn cell_world_shape(&self) -> Point3d {
        Point3d::from(self.cell_shapes[0]) * self.voxel_size
    }

    /// Level-0 voxel size of the reference.
    pub fn voxel_size(&self) -> Point3d {
        self.voxel_size
    }
}

fn downsampling_factors(voxel_sizes: &[Point3d]) -> Result<Vec<Point3d>> {
    let mut factors = vec![Point3d::ONES];
    for (level, pair) in voxel_sizes.windows(2).enumerate() {
        let factor = (pair[1] / pair[0]).map_components_unary(snap_to_integer);
        let valid = factor.is_finite() && factor.x() > 0.0 && factor.y() > 0.0 && factor.z() > 0.0;
        if !valid {
            return Err(PyramidError::geometry(format!(
                "downsampling factor {:?} from level {} to {} must be finite and positive",
                factor,
                level,
                level + 1
            )));
        }
        factors.push(factor);
    }

    Ok(factors)
}

fn snap_to_integer(f: f64) -> f64 {
    let rounded = f.round();
    if (f - rounded).abs() < FACTOR_TOLERANCE {
        rounded
    } else {
        f
    }
}

// ████████╗███████╗███████╗████████╗
// ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝
//    ██║   █████╗  ███████╗   ██║
//    ██║   ██╔══╝  ╚════██║   ██║
//    ██║   ███████╗███████║   ██║
//    ╚═╝   ╚══════╝╚══════╝   ╚═╝
