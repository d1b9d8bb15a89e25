use std::{
    fmt::{
        Display,
        Formatter,
    },
    str::FromStr,
};

use bytes::{
    Bytes,
    BytesMut,
};
use tokio_util::codec::{
    Decoder,
    Encoder,
};

use crate::{
    cobs,
    slip,
    CobsCodec,
    SlipCodec,
};

/// Largest payload for which the single-overhead-byte COBS model holds.
pub const COBS_MAX_PAYLOAD: usize = 250;

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Cobs(#[from] cobs::Error),

    #[error(transparent)]
    Slip(#[from] slip::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

#[derive(thiserror::Error, Debug)]
#[error("unknown stuffing scheme {0:?} (expected `cobs` or `slip`)")]
pub struct UnknownScheme(String);

/// Byte-stuffing scheme, paired with its delimiter. Fixed per framer instance.
#[derive(
    Debug, Clone, Copy, Default, Hash, PartialEq, Eq, serde::Serialize, serde::Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Scheme {
    Cobs,
    #[default]
    Slip,
}

impl Scheme {
    #[inline]
    pub const fn delimiter(self) -> u8 {
        match self {
            Scheme::Cobs => cobs::DELIMITER,
            Scheme::Slip => slip::DELIMITER,
        }
    }

    #[inline]
    pub fn max_encoding_length(self, len: usize) -> usize {
        match self {
            Scheme::Cobs => cobs::max_encoding_length(len),
            Scheme::Slip => slip::max_encoding_length(len),
        }
    }

    /// The scheme actually used for a given payload capacity: COBS falls back
    /// to SLIP above [`COBS_MAX_PAYLOAD`].
    #[inline]
    pub fn for_payload(self, max_payload: usize) -> Self {
        match self {
            Scheme::Cobs if max_payload > COBS_MAX_PAYLOAD => Scheme::Slip,
            other => other,
        }
    }
}

impl<T> Encoder<T> for Scheme
where
    T: AsRef<[u8]>,
{
    type Error = Error;

    fn encode(&mut self, item: T, dst: &mut BytesMut) -> Result<(), Self::Error> {
        match self {
            Scheme::Cobs => CobsCodec.encode(item, dst)?,
            Scheme::Slip => SlipCodec.encode(item, dst)?,
        }

        Ok(())
    }
}

impl Decoder for Scheme {
    type Error = Error;
    type Item = Bytes;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        let result = match self {
            Scheme::Cobs => CobsCodec.decode(src)?,
            Scheme::Slip => SlipCodec.decode(src)?,
        };

        Ok(result)
    }
}

impl Display for Scheme {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Scheme::Cobs => f.write_str("cobs"),
            Scheme::Slip => f.write_str("slip"),
        }
    }
}

impl FromStr for Scheme {
    type Err = UnknownScheme;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "cobs" => Ok(Scheme::Cobs),
            "slip" | "kiss" => Ok(Scheme::Slip),
            _ => Err(UnknownScheme(s.to_owned())),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_cobs_falls_back_above_limit() {
        assert_eq!(Scheme::Cobs.for_payload(COBS_MAX_PAYLOAD), Scheme::Cobs);
        assert_eq!(Scheme::Cobs.for_payload(COBS_MAX_PAYLOAD + 1), Scheme::Slip);
        assert_eq!(Scheme::Slip.for_payload(8), Scheme::Slip);
    }

    #[test]
    fn test_cobs_bound() {
        // body = payload + 2 address bytes + 2 crc bytes
        for payload in 0..COBS_MAX_PAYLOAD {
            assert_eq!(Scheme::Cobs.max_encoding_length(payload + 4), payload + 5);
        }

        // a full 254-byte block is followed by one more code byte
        assert_eq!(Scheme::Cobs.max_encoding_length(COBS_MAX_PAYLOAD + 4), COBS_MAX_PAYLOAD + 6);
    }

    #[test]
    fn test_parse() -> eyre::Result<()> {
        assert_eq!("COBS".parse::<Scheme>()?, Scheme::Cobs);
        assert_eq!("kiss".parse::<Scheme>()?, Scheme::Slip);
        assert!("hdlc".parse::<Scheme>().is_err());

        Ok(())
    }

    #[test]
    fn test_dispatch() -> eyre::Result<()> {
        for mut scheme in [Scheme::Cobs, Scheme::Slip] {
            let mut dst = BytesMut::new();
            scheme.encode(&[scheme.delimiter(), 7, 8][..], &mut dst)?;

            assert!(!dst.contains(&scheme.delimiter()));
            assert_eq!(scheme.decode(&mut dst)?.as_deref(), Some(&[scheme.delimiter(), 7, 8][..]));
        }

        Ok(())
    }
}
