use packed_struct::{
    prelude::*,
    PackingResult,
};

use crate::Address;

/// MAC header preceding every frame body: `[dst][src]`.
#[derive(
    Copy, Clone, Debug, PartialEq, Eq, Hash, PackedStruct, serde::Serialize, serde::Deserialize,
)]
#[packed_struct(bit_numbering = "msb0", size_bytes = "2")]
pub struct MacHeader {
    #[packed_field(size_bytes = "1")]
    pub destination: Address,
    #[packed_field(size_bytes = "1")]
    pub source:      Address,
}

impl MacHeader {
    pub const SIZE: usize = 2;

    #[inline]
    pub fn new(destination: Address, source: Address) -> Self {
        Self {
            destination,
            source,
        }
    }

    /// Whether a node with address `local` should accept this frame.
    #[inline]
    pub fn is_for(&self, local: Address) -> bool {
        self.destination == local || self.destination.is_broadcast()
    }

    /// Splits a MAC frame into its header and payload.
    #[tracing::instrument(level = "trace", skip_all, fields(frame.len = frame.len()))]
    pub fn split(frame: &[u8]) -> PackingResult<(Self, &[u8])> {
        if frame.len() < Self::SIZE {
            return Err(PackingError::BufferTooSmall);
        }

        let (header, payload) = frame.split_at(Self::SIZE);
        let header = Self::unpack(&[header[0], header[1]])?;

        Ok((header, payload))
    }

    #[inline]
    pub fn display(&self) -> String {
        format!("{} -> {}", self.source.display(), self.destination.display())
    }
}
