use bytes::{
    BufMut,
    Bytes,
    BytesMut,
};
use tokio_util::codec::{
    Decoder,
    Encoder,
};

/// Frame end. Also the frame delimiter on the wire.
pub const END: u8 = 0xC0;
/// Frame escape.
pub const ESC: u8 = 0xDB;
/// Transposed frame end.
pub const ESC_END: u8 = 0xDC;
/// Transposed frame escape.
pub const ESC_ESC: u8 = 0xDD;

pub const DELIMITER: u8 = END;

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("invalid escape sequence 0xdb 0x{0:02x}")]
    InvalidEscape(u8),

    #[error("body ends inside an escape sequence")]
    TruncatedEscape,

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Every byte may need escaping.
#[inline]
pub fn max_encoding_length(len: usize) -> usize {
    len * 2
}

/// SLIP (KISS-compatible) body stuffing, RFC 1055 escapes without the
/// surrounding `END` bytes.
#[derive(Debug, Clone, Copy, Default, Hash, PartialEq, Eq)]
pub struct SlipCodec;

impl<T> Encoder<T> for SlipCodec
where
    T: AsRef<[u8]>,
{
    type Error = Error;

    fn encode(&mut self, item: T, dst: &mut BytesMut) -> Result<(), Self::Error> {
        let item = item.as_ref();
        dst.reserve(max_encoding_length(item.len()));

        for &b in item {
            match b {
                END => dst.put_slice(&[ESC, ESC_END]),
                ESC => dst.put_slice(&[ESC, ESC_ESC]),
                _ => dst.put_u8(b),
            }
        }

        Ok(())
    }
}

impl Decoder for SlipCodec {
    type Error = Error;
    type Item = Bytes;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        if src.is_empty() {
            return Ok(None);
        }

        let body = src.split();
        let mut out = BytesMut::with_capacity(body.len());
        let mut escaped = false;

        for &b in body.iter() {
            if escaped {
                escaped = false;

                match b {
                    ESC_END => out.put_u8(END),
                    ESC_ESC => out.put_u8(ESC),
                    other => return Err(Error::InvalidEscape(other)),
                }
            } else if b == ESC {
                escaped = true;
            } else {
                out.put_u8(b);
            }
        }

        if escaped {
            return Err(Error::TruncatedEscape);
        }

        Ok(Some(out.freeze()))
    }
}
