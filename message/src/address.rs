use packed_struct::prelude::*;

/// Node address on the bus.
#[derive(
    Copy,
    Clone,
    Debug,
    Default,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    PackedStruct,
    derive_more::From,
    derive_more::Into,
    serde::Serialize,
    serde::Deserialize,
)]
#[packed_struct(bit_numbering = "msb0", size_bytes = "1")]
#[serde(transparent)]
pub struct Address {
    val: u8,
}

impl Address {
    /// Accepted by every node as a destination.
    pub const BROADCAST: Self = Self::new(0xff);

    #[inline]
    pub const fn new(val: u8) -> Self {
        Self {
            val,
        }
    }

    #[inline]
    pub const fn get(self) -> u8 {
        self.val
    }

    #[inline]
    pub const fn is_broadcast(self) -> bool {
        self.val == Self::BROADCAST.val
    }

    #[inline]
    pub fn display(&self) -> String {
        format!("0x{:02x}", self.val)
    }
}
