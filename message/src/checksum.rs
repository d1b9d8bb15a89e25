pub type Array = smallvec::SmallVec<[u8; 8]>;

pub trait Checksum {
    type Output: num_traits::PrimInt;

    fn checksum(vals: &[u8]) -> Self::Output;
    fn checksum_array(vals: &[u8]) -> Array;
}

#[inline]
pub const fn size<T>() -> usize
where
    T: Checksum,
{
    std::mem::size_of::<T::Output>()
}

/// Declares a unit type implementing [`Checksum`] for a multi-byte `crc`
/// catalog algorithm. The trailer is big-endian unless a `byteorder` type is
/// given.
#[macro_export]
macro_rules! impl_checksum {
    ($vis:vis $name:ident, $ty:ty, $algo:expr) => {
        $crate::impl_checksum!($vis $name, $ty, $algo, ::byteorder::BE);
    };

    ($vis:vis $name:ident, $ty:ty, $algo:expr, $endian:ty) => {
        #[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, ::serde::Serialize, ::serde::Deserialize)]
        $vis struct $name;

        impl $crate::Checksum for $name {
            type Output = $ty;

            fn checksum(vals: &[u8]) -> Self::Output {
                const INSTANCE: ::crc::Crc<$ty> = ::crc::Crc::<$ty>::new(&$algo);

                INSTANCE.checksum(vals)
            }

            fn checksum_array(vals: &[u8]) -> $crate::checksum::Array {
                ::paste::paste! {
                    let mut ret = ::smallvec::smallvec![0u8; ::std::mem::size_of::<$ty>()];
                    <$endian as ::byteorder::ByteOrder>::[< write_ $ty >](&mut ret[..], Self::checksum(vals));

                    ret
                }
            }
        }
    };
}

#[cfg(test)]
mod test {
    use byteorder::ByteOrder;
    use proptest::prelude::*;

    use super::*;
    use crate::StandardCRC;

    impl_checksum!(LittleEndianCRC, u16, ::crc::CRC_16_IBM_3740, ::byteorder::LittleEndian);

    #[test]
    fn test_standard_check_value() {
        // CRC-16/IBM-3740 catalog check value
        assert_eq!(StandardCRC::checksum(b"123456789"), 0x29b1);
        assert_eq!(&StandardCRC::checksum_array(b"123456789")[..], &[0x29, 0xb1]);
        assert_eq!(size::<StandardCRC>(), 2);
    }

    #[test]
    fn test_empty_input_is_init_value() {
        assert_eq!(StandardCRC::checksum(&[]), 0xffff);
    }

    proptest! {
        #[test]
        fn test_trailer_matches_value(vals in any::<Vec<u8>>()) {
            let value = StandardCRC::checksum(&vals);

            prop_assert_eq!(byteorder::BE::read_u16(&StandardCRC::checksum_array(&vals)), value);
            prop_assert_eq!(LittleEndianCRC::checksum(&vals), value);
            prop_assert_eq!(byteorder::LE::read_u16(&LittleEndianCRC::checksum_array(&vals)), value);
        }
    }
}
