//! Chunk caching: an explicit LRU map plus a thread-safe, single-flight cache of lazily materialized chunks built on top of
//! it.

pub mod chunk_cache;
pub mod lru_cache;

pub use chunk_cache::*;
pub use lru_cache::*;
