pub use ::tokio_util::codec as tokio_codec;

pub mod cobs;
mod scheme;
pub mod slip;

pub use self::{
    cobs::CobsCodec,
    scheme::*,
    slip::SlipCodec,
};
