//! Per-voxel provenance: which source a mosaic voxel came from, packed into the voxel value itself.
//!
//! A `ProvenanceCodec` owns an append-only table from source name to a dense id, and packs `(value, id)` as
//! `value | (id << value_bits)`. Nothing is truncated: a value or id that does not fit its bits is an error.
//!
//! ```
//! use pyramid_mosaic_storage::ProvenanceCodec;
//!
//! let codec = ProvenanceCodec::new(16, 32).unwrap();
//! let a = codec.register("a").unwrap();
//! let b = codec.register("b").unwrap();
//! assert_eq!((a, b), (0, 1));
//! assert_eq!(codec.register("a").unwrap(), a);
//!
//! let packed = codec.encode(1234, b).unwrap();
//! assert_eq!(codec.decode(packed), (1234, b));
//! assert_eq!(codec.decode_name(packed).as_deref(), Some("b"));
//! ```

use crate::{PyramidError, Result, Sample, SmallKeyHashMap};

use parking_lot::RwLock;

/// Source ids are dense, starting at 0 in registration order.
pub type SourceId = u32;

pub struct ProvenanceCodec {
    value_bits: u32,
    total_bits: u32,
    table: RwLock<NameTable>,
}

#[derive(Default)]
struct NameTable {
    ids: SmallKeyHashMap<String, SourceId>,
    names: Vec<String>,
}

impl Default for ProvenanceCodec {
    /// 16 value bits in a 32-bit sample.
    fn default() -> Self {
        Self {
            value_bits: 16,
            total_bits: 32,
            table: Default::default(),
        }
    }
}

impl ProvenanceCodec {
    /// Requires `0 < value_bits < total_bits <= 64`.
    pub fn new(value_bits: u32, total_bits: u32) -> Result<Self> {
        if value_bits == 0 || value_bits >= total_bits || total_bits > 64 {
            return Err(PyramidError::EncodingOverflow(format!(
                "invalid bit split: {} value bits of {} total",
                value_bits, total_bits
            )));
        }

        Ok(Self {
            value_bits,
            total_bits,
            table: Default::default(),
        })
    }

    #[inline]
    pub fn value_bits(&self) -> u32 {
        self.value_bits
    }

    #[inline]
    pub fn total_bits(&self) -> u32 {
        self.total_bits
    }

    #[inline]
    fn id_bits(&self) -> u32 {
        self.total_bits - self.value_bits
    }

    #[inline]
    fn value_mask(&self) -> u64 {
        low_bits_mask(self.value_bits)
    }

    /// Returns the id of `name`, assigning the next free id if it is new.
    pub fn register(&self, name: &str) -> Result<SourceId> {
        if let Some(id) = self.id_of(name) {
            return Ok(id);
        }

        let mut table = self.table.write();
        // Another writer may have won the race since the read above.
        if let Some(&id) = table.ids.get(name) {
            return Ok(id);
        }
        let next = table.names.len() as u64;
        if next > low_bits_mask(self.id_bits()) || next > u64::from(SourceId::MAX) {
            return Err(PyramidError::EncodingOverflow(format!(
                "no id left for {:?}: {} ids fit in {} bits",
                name,
                next,
                self.id_bits()
            )));
        }
        let id = next as SourceId;
        table.ids.insert(name.to_string(), id);
        table.names.push(name.to_string());

        Ok(id)
    }

    /// Registers every name in order, stopping at the first failure.
    pub fn register_all<'a>(&self, names: impl IntoIterator<Item = &'a str>) -> Result<Vec<SourceId>> {
        names.into_iter().map(|n| self.register(n)).collect()
    }

    pub fn id_of(&self, name: &str) -> Option<SourceId> {
        self.table.read().ids.get(name).cloned()
    }

    pub fn name_of(&self, id: SourceId) -> Option<String> {
        self.table.read().names.get(id as usize).cloned()
    }

    pub fn len(&self) -> usize {
        self.table.read().names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn encode(&self, value: u64, id: SourceId) -> Result<u64> {
        if value > self.value_mask() {
            return Err(PyramidError::EncodingOverflow(format!(
                "value {} does not fit in {} bits",
                value, self.value_bits
            )));
        }
        if u64::from(id) > low_bits_mask(self.id_bits()) {
            return Err(PyramidError::EncodingOverflow(format!(
                "source id {} does not fit in {} bits",
                id,
                self.id_bits()
            )));
        }

        Ok(value | (u64::from(id) << self.value_bits))
    }

    /// Splits `packed` into `(value, id)`. Bits above `total_bits` are ignored.
    pub fn decode(&self, packed: u64) -> (u64, SourceId) {
        let value = packed & self.value_mask();
        let id = (packed >> self.value_bits) & low_bits_mask(self.id_bits());

        (value, id as SourceId)
    }

    pub fn decode_name(&self, packed: u64) -> Option<String> {
        self.name_of(self.decode(packed).1)
    }

    /// Fails unless every packed value fits in a `T`.
    pub fn check_sample_type<T>(&self) -> Result<()>
    where
        T: Sample,
    {
        match T::PACKABLE_BITS {
            Some(bits) if bits >= self.total_bits => Ok(()),
            Some(bits) => Err(PyramidError::EncodingOverflow(format!(
                "{} packed bits do not fit in a {}-bit sample",
                self.total_bits, bits
            ))),
            None => Err(PyramidError::EncodingOverflow(format!(
                "{} samples cannot carry a source id",
                std::any::type_name::<T>()
            ))),
        }
    }

    /// Packs `id` into a sample.
    pub fn encode_sample<T>(&self, value: T, id: SourceId) -> Result<T>
    where
        T: Sample,
    {
        let bits = value.to_packed_bits().ok_or_else(|| {
            PyramidError::EncodingOverflow(format!(
                "{} samples cannot carry a source id",
                std::any::type_name::<T>()
            ))
        })?;
        let packed = self.encode(bits, id)?;

        T::from_packed_bits(packed).ok_or_else(|| {
            PyramidError::EncodingOverflow(format!(
                "packed value {:#x} does not fit in a {}",
                packed,
                std::any::type_name::<T>()
            ))
        })
    }

    /// The source name packed into `sample`, if the sample type carries provenance and the id is registered.
    pub fn decode_sample_name<T>(&self, sample: T) -> Option<String>
    where
        T: Sample,
    {
        self.decode_name(sample.to_packed_bits()?)
    }
}

#[inline]
fn low_bits_mask(bits: u32) -> u64 {
    if bits >= 64 {
        u64::MAX
    } else {
        (1 << bits) - 1
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

    use rand::Rng;
    use std::sync::Arc;

    #[test]
    fn random_round_trips() {
        let codec = ProvenanceCodec::new(16, 32).unwrap();
        let mut rng = rand::thread_rng();

        for _ in 0..1000 {
            let value = rng.gen_range(0..=0xffff);
            let id = rng.gen_range(0..=0xffff);
            assert_eq!(codec.decode(codec.encode(value, id).unwrap()), (value, id));
        }
        assert_eq!(codec.decode(codec.encode(0xffff, 0xffff).unwrap()), (0xffff, 0xffff));
    }

    #[test]
    fn full_width_split() {
        let codec = ProvenanceCodec::new(40, 64).unwrap();
        let max_value = (1 << 40) - 1;
        let max_id = (1 << 24) - 1;

        assert_eq!(codec.encode(max_value, max_id).unwrap(), u64::MAX);
        assert_eq!(codec.decode(u64::MAX), (max_value, max_id));
    }

    #[test]
    fn overflow_is_an_error() {
        let codec = ProvenanceCodec::new(4, 6).unwrap();

        assert!(matches!(codec.encode(16, 0), Err(PyramidError::EncodingOverflow(_))));
        assert!(matches!(codec.encode(1, 4), Err(PyramidError::EncodingOverflow(_))));

        for name in ["a", "b", "c", "d"].iter() {
            codec.register(name).unwrap();
        }
        assert!(codec.register("e").is_err());
        assert_eq!(codec.len(), 4);
        assert_eq!(codec.id_of("e"), None);
        // Existing names still resolve when the table is full.
        assert_eq!(codec.register("c").unwrap(), 2);
    }

    #[test]
    fn invalid_splits() {
        assert!(ProvenanceCodec::new(0, 8).is_err());
        assert!(ProvenanceCodec::new(8, 8).is_err());
        assert!(ProvenanceCodec::new(16, 65).is_err());
    }

    #[test]
    fn sample_types() {
        let codec = ProvenanceCodec::default();
        codec.register_all(vec!["x", "y"]).unwrap();

        assert!(codec.check_sample_type::<u32>().is_ok());
        assert!(codec.check_sample_type::<u64>().is_ok());
        assert!(codec.check_sample_type::<u16>().is_err());
        assert!(codec.check_sample_type::<f32>().is_err());

        let packed = codec.encode_sample(7u32, 1).unwrap();
        assert_eq!(packed, 7 | (1 << 16));
        assert_eq!(codec.decode_sample_name(packed).as_deref(), Some("y"));
        assert!(codec.encode_sample(70_000u32, 1).is_err());
        assert!(codec.encode_sample(1.0f32, 1).is_err());
    }

    #[test]
    fn concurrent_registration_assigns_dense_ids() {
        let codec = Arc::new(ProvenanceCodec::default());
        let names: Vec<String> = (0..64).map(|i| format!("source_{}", i)).collect();

        let handles: Vec<_> = (0..4)
            .map(|_| {
                let codec = codec.clone();
                let names = names.clone();
                std::thread::spawn(move || {
                    for name in names.iter() {
                        codec.register(name).unwrap();
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }

        assert_eq!(codec.len(), 64);
        let mut ids: Vec<_> = names.iter().map(|n| codec.id_of(n).unwrap()).collect();
        ids.sort_unstable();
        assert_eq!(ids, (0..64).collect::<Vec<_>>());
    }
}
