use super::{MosaicPyramid, Provenance};
use crate::{
    auto_positions, validate_positions, CacheCapacity, CellIndex, GridLayout, LazyChunkCache,
    ProvenanceCodec, PyramidError, PyramidSource, Result, Sample, SharedSource,
};

use pyramid_mosaic_core::prelude::*;

use serde::{Deserialize, Serialize};
use std::sync::atomic::AtomicU32;
use std::sync::Arc;

/// A serializable description of a mosaic. Source names are resolved to sources by `MosaicBuilder::resolve`.
///
/// ```
/// use pyramid_mosaic_storage::MosaicConfig;
///
/// let config: MosaicConfig = ron::from_str(r#"(
///     name: "plate",
///     sources: ["a", "b", "c"],
///     relative_cell_margin: 0.1,
/// )"#).unwrap();
///
/// assert_eq!(config.positions, None);
/// assert!(!config.encode_provenance);
/// ```
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(default)]
pub struct MosaicConfig {
    pub name: String,
    /// Names of the cell sources. The first one is the reference that fixes the cell geometry and world transform.
    pub sources: Vec<String>,
    /// `[column, row]` of each source. Assigned row-major in a near-square grid when omitted.
    pub positions: Option<Vec<[i32; 2]>>,
    /// Fraction of the reference shape added on each side of a cell, on the tiled axes.
    pub relative_cell_margin: f64,
    /// Pack the id of the source into every voxel value.
    pub encode_provenance: bool,
    pub cache: CacheCapacity,
}

impl Default for MosaicConfig {
    fn default() -> Self {
        Self {
            name: "mosaic".to_string(),
            sources: Vec::new(),
            positions: None,
            relative_cell_margin: 0.0,
            encode_provenance: false,
            cache: CacheCapacity::default(),
        }
    }
}

/// Freezes the geometry of a `MosaicPyramid`.
pub struct MosaicBuilder {
    config: MosaicConfig,
    codec: Option<Arc<ProvenanceCodec>>,
    time: u32,
}

impl MosaicBuilder {
    pub fn new(config: MosaicConfig) -> Self {
        Self {
            config,
            codec: None,
            time: 0,
        }
    }

    /// Use a codec shared with other mosaics, so ids stay unique across all of them. Only used when the config enables
    /// provenance encoding; otherwise each mosaic gets a fresh default codec.
    pub fn with_codec(mut self, codec: Arc<ProvenanceCodec>) -> Self {
        self.codec = Some(codec);

        self
    }

    /// The time point whose geometry is planned and exposed first. Defaults to 0.
    pub fn at_time(mut self, time: u32) -> Self {
        self.time = time;

        self
    }

    pub fn config(&self) -> &MosaicConfig {
        &self.config
    }

    /// Looks up each configured source name with `resolver`, then builds.
    pub fn resolve<T>(
        self,
        mut resolver: impl FnMut(&str) -> Option<SharedSource<T>>,
    ) -> Result<MosaicPyramid<T>>
    where
        T: Sample,
    {
        let sources = self
            .config
            .sources
            .iter()
            .map(|name| resolver(name).ok_or_else(|| PyramidError::MissingSource(name.clone())))
            .collect::<Result<Vec<_>>>()?;

        self.build(sources)
    }

    /// Builds from already resolved sources. The configured source names are ignored.
    pub fn build<T>(self, sources: Vec<SharedSource<T>>) -> Result<MosaicPyramid<T>>
    where
        T: Sample,
    {
        let Self { config, codec, time } = self;

        let reference = sources
            .first()
            .cloned()
            .ok_or_else(|| PyramidError::geometry("a mosaic needs at least one source"))?;
        if !reference.is_present(time) {
            return Err(PyramidError::TimepointUnavailable { time });
        }

        let positions = match &config.positions {
            Some(positions) => positions.iter().map(|p| PointN(*p)).collect(),
            None => auto_positions(sources.len()),
        };
        validate_positions(&positions, sources.len())?;

        let provenance = if config.encode_provenance {
            let codec = codec.unwrap_or_default();
            codec.check_sample_type::<T>()?;
            let ids = codec.register_all(sources.iter().map(|s| s.name()))?;

            Some(Provenance { codec, ids })
        } else {
            None
        };

        let layout = GridLayout::plan(&*reference, config.relative_cell_margin, time)?;
        let cells = CellIndex::build_levels(&sources, &positions, &layout, time)?;
        let region_mask = cells[0].region_mask(&reference.source_transform(time, 0)?);

        tracing::debug!(
            name = %config.name,
            num_sources = sources.len(),
            extent = ?cells[0].extent(),
            encode_provenance = config.encode_provenance,
            "built mosaic"
        );

        Ok(MosaicPyramid {
            name: config.name,
            reference,
            sources,
            positions,
            layout,
            cells,
            region_mask,
            provenance,
            cache: LazyChunkCache::new(config.cache),
            current_time: AtomicU32::new(time),
        })
    }
}
