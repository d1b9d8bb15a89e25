use std::{
    fmt::{
        Display,
        Formatter,
    },
    io,
    time::Duration,
};

use message::Status;

/// Protocol layer owning a sticky status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Layer {
    Phy,
    Mac,
    Packet,
}

impl Display for Layer {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Layer::Phy => f.write_str("phy"),
            Layer::Mac => f.write_str("mac"),
            Layer::Packet => f.write_str("packet"),
        }
    }
}

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("{size}-byte payload exceeds the {capacity}-byte {layer} capacity")]
    Oversize {
        layer:    Layer,
        size:     usize,
        capacity: usize,
    },

    #[error("frame overran the {capacity}-byte receive accumulator")]
    Overflow { capacity: usize },

    #[error("{len}-byte output buffer cannot hold a {size}-byte payload")]
    BufferTooSmall { len: usize, size: usize },

    #[error("failed to destuff frame body")]
    Decode(#[from] codec::Error),

    #[error("failed to stuff frame body")]
    Encode(#[source] codec::Error),

    #[error("failed to pack mac header")]
    Packing(#[from] packed_struct::PackingError),

    #[error("{len}-byte frame is shorter than the mac header")]
    Runt { len: usize },

    #[error(transparent)]
    Checksum(#[from] message::crc::Error),

    #[error("byte 0x{0:02x} received outside of a frame")]
    Noise(u8),

    #[error("no frame within {0:?}")]
    Timeout(Duration),

    #[error("transport write failed")]
    Write(#[source] io::Error),

    #[error("transport read failed")]
    Read(#[source] io::Error),

    #[error("bus direction control failed")]
    Direction(#[source] io::Error),

    #[error("{layer} layer send failed")]
    Send {
        layer:  Layer,
        #[source]
        source: Box<Error>,
    },

    #[error("{layer} layer receive failed")]
    Receive {
        layer:  Layer,
        #[source]
        source: Box<Error>,
    },

    #[error("{layer} layer has no frame yet ({status})")]
    NoFrame { layer: Layer, status: Status },
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

impl Error {
    /// The numeric status a layer records when it fails with this error.
    pub fn status(&self) -> Status {
        match self {
            Error::Oversize {
                ..
            }
            | Error::Overflow {
                ..
            }
            | Error::BufferTooSmall {
                ..
            } => Status::Oversize,

            Error::Decode(_)
            | Error::Runt {
                ..
            } => Status::DecodeError,

            Error::Encode(_) | Error::Packing(_) => Status::EncodeError,
            Error::Checksum(_) => Status::CrcError,
            Error::Noise(_) => Status::ErrorData,
            Error::Timeout(_) => Status::Timeout,

            Error::Write(_)
            | Error::Direction(_)
            | Error::Send {
                ..
            } => Status::WriteError,

            Error::Read(_)
            | Error::Receive {
                ..
            }
            | Error::NoFrame {
                ..
            } => Status::ReadError,
        }
    }

    #[inline]
    pub fn is_timeout(&self) -> bool {
        matches!(self, Error::Timeout(_))
    }

    /// Whether this error condemns a single frame rather than the link. A
    /// blocking receive drops the frame and keeps listening.
    pub fn is_framing(&self) -> bool {
        matches!(
            self,
            Error::Noise(_)
                | Error::Overflow { .. }
                | Error::Oversize { .. }
                | Error::Decode(_)
                | Error::BufferTooSmall { .. }
        )
    }

    pub(crate) fn send(layer: Layer, source: Error) -> Self {
        Error::Send {
            layer,
            source: Box::new(source),
        }
    }

    pub(crate) fn receive(layer: Layer, source: Error) -> Self {
        Error::Receive {
            layer,
            source: Box::new(source),
        }
    }
}
