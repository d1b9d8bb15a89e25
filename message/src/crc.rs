use bytes::{
    BufMut,
    BytesMut,
};

use crate::{
    checksum,
    Checksum,
};

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    #[error("{len}-byte frame is too short to carry a {size}-byte checksum")]
    Truncated { len: usize, size: usize },

    #[error(
        "checksum mismatch: received 0x{}, computed 0x{}",
        hex::encode(.received),
        hex::encode(.computed)
    )]
    Mismatch {
        received: checksum::Array,
        computed: checksum::Array,
    },
}

/// Number of trailer bytes `CRC` adds to a payload.
#[inline]
pub const fn overhead<CRC>() -> usize
where
    CRC: Checksum,
{
    checksum::size::<CRC>()
}

/// Appends `payload` and its checksum trailer to `dst`.
pub fn seal<CRC>(payload: &[u8], dst: &mut BytesMut)
where
    CRC: Checksum,
{
    dst.reserve(payload.len() + overhead::<CRC>());

    dst.put_slice(payload);
    dst.put_slice(&CRC::checksum_array(payload));
}

/// Verifies the checksum trailer of `src` and returns the payload it covers.
pub fn open<CRC>(src: &[u8]) -> Result<&[u8], Error>
where
    CRC: Checksum,
{
    let size = overhead::<CRC>();

    if src.len() < size {
        return Err(Error::Truncated {
            len: src.len(),
            size,
        });
    }

    let (payload, received) = src.split_at(src.len() - size);
    let computed = CRC::checksum_array(payload);

    if received != &computed[..] {
        tracing::warn!(
            received = %hex::encode(received),
            computed = %hex::encode(&computed),
            "payload with invalid checksum"
        );

        return Err(Error::Mismatch {
            received: received.into(),
            computed,
        });
    }

    Ok(payload)
}
