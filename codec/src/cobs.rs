use bytes::{
    Bytes,
    BytesMut,
};
use tokio_util::codec::{
    Decoder,
    Encoder,
};

/// Frame delimiter for COBS-stuffed bodies.
pub const DELIMITER: u8 = 0x00;

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("cobs body is malformed: {body}")]
    Malformed { body: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Worst-case stuffed length of a `len`-byte body: one code byte per started
/// 254-byte block, plus the trailing code byte a full final block needs.
#[inline]
pub const fn max_encoding_length(len: usize) -> usize {
    len + len / 254 + 1
}

/// Stuffs and destuffs a single frame body. Delimiters are not part of the
/// encoded output; the framer writes them around it.
#[derive(Debug, Clone, Copy, Default, Hash, PartialEq, Eq)]
pub struct CobsCodec;

impl<T> Encoder<T> for CobsCodec
where
    T: AsRef<[u8]>,
{
    type Error = Error;

    fn encode(&mut self, item: T, dst: &mut BytesMut) -> Result<(), Self::Error> {
        let item = item.as_ref();

        let old_len = dst.len();
        dst.resize(old_len + max_encoding_length(item.len()), 0);

        let count = cobs::encode(item, &mut dst[old_len..]);
        dst.truncate(old_len + count);

        Ok(())
    }
}

impl Decoder for CobsCodec {
    type Error = Error;
    type Item = Bytes;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        if src.is_empty() {
            return Ok(None);
        }

        let body = src.split();
        let malformed = || {
            let body = hex::encode(&body);
            tracing::trace!(%body, "cobs decode failed");

            Error::Malformed {
                body,
            }
        };

        // a delimiter can only end a frame, never sit inside one
        if body.contains(&DELIMITER) {
            return Err(malformed());
        }

        let mut out = BytesMut::new();
        out.resize(body.len(), 0);

        let count = cobs::decode(&body, &mut out).map_err(|_| malformed())?;
        out.truncate(count);

        Ok(Some(out.freeze()))
    }
}
