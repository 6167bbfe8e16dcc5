use pyramid_mosaic_core::prelude::*;

/// Everything that can go wrong while planning, composing, cropping or reading a pyramid.
///
/// Cloneable so that one failed chunk load can be reported to every request that was waiting on it.
#[derive(Clone, Debug, PartialEq, thiserror::Error)]
pub enum PyramidError {
    #[error("invalid geometry: {0}")]
    Geometry(String),
    #[error("time point {time} is not present")]
    TimepointUnavailable { time: u32 },
    #[error("value or source id does not fit its bit width: {0}")]
    EncodingOverflow(String),
    #[error("no cell owns the chunk at {minimum:?} on level {level}")]
    UnresolvedCell { level: u8, minimum: Point3i },
    #[error("requested {requested:?} is not inside the level extent {available:?}")]
    OutOfBounds {
        requested: Extent3i,
        available: Extent3i,
    },
    #[error("level {level} requested but the pyramid has {num_levels} levels")]
    LevelUnavailable { level: u8, num_levels: u8 },
    #[error("no source named {0:?}")]
    MissingSource(String),
    #[error("source read failed: {0}")]
    Source(String),
}

impl PyramidError {
    pub(crate) fn geometry(msg: impl Into<String>) -> Self {
        Self::Geometry(msg.into())
    }
}

pub type Result<T> = std::result::Result<T, PyramidError>;
