use bytemuck::{Pod, Zeroable};
use std::convert::TryFrom;
use std::fmt::Debug;

/// A voxel value type.
///
/// The background value of any sample type is `Zeroable::zeroed()`. Unsigned integer samples can be viewed as raw bits, which
/// is what allows a source id to be packed into the high bits of a value.
pub trait Sample: Pod + Default + PartialEq + Debug + Send + Sync + 'static {
    /// The number of bits available for packed values, or `None` if this type can't carry packed values.
    const PACKABLE_BITS: Option<u32>;

    fn background() -> Self {
        Self::zeroed()
    }

    fn to_packed_bits(self) -> Option<u64>;

    /// `None` if `bits` doesn't fit, or if this type can't carry packed values.
    fn from_packed_bits(bits: u64) -> Option<Self>;
}

macro_rules! impl_unsigned_sample {
    ($t:ty) => {
        impl Sample for $t {
            const PACKABLE_BITS: Option<u32> = Some(<$t>::BITS);

            #[inline]
            fn to_packed_bits(self) -> Option<u64> {
                Some(u64::from(self))
            }

            #[inline]
            fn from_packed_bits(bits: u64) -> Option<Self> {
                <$t>::try_from(bits).ok()
            }
        }
    };
}

impl_unsigned_sample!(u8);
impl_unsigned_sample!(u16);
impl_unsigned_sample!(u32);
impl_unsigned_sample!(u64);

macro_rules! impl_float_sample {
    ($t:ty) => {
        impl Sample for $t {
            const PACKABLE_BITS: Option<u32> = None;

            #[inline]
            fn to_packed_bits(self) -> Option<u64> {
                None
            }

            #[inline]
            fn from_packed_bits(_bits: u64) -> Option<Self> {
                None
            }
        }
    };
}

impl_float_sample!(f32);
impl_float_sample!(f64);

// ████████╗███████╗███████╗████████╗
// ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝
//    ██║   █████╗  ███████╗   ██║
//    ██║   ██╔══╝  ╚════██║   ██║
//    ██║   ███████╗███████║   ██║
//    ╚═╝   ╚══════╝╚══════╝   ╚═╝

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn unsigned_bits_round_trip() {
        assert_eq!(u16::from_packed_bits(0xbeef), Some(0xbeef));
        assert_eq!(u16::from_packed_bits(0x1_0000), None);
        assert_eq!(0xffu8.to_packed_bits(), Some(0xff));
        assert_eq!(u32::PACKABLE_BITS, Some(32));
    }

    #[test]
    fn floats_cannot_carry_bits() {
        assert_eq!(1.5f32.to_packed_bits(), None);
        assert_eq!(f64::PACKABLE_BITS, None);
        assert_eq!(f32::background(), 0.0);
    }
}
