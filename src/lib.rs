//! Addressed, checksummed datagrams over a shared half-duplex serial bus.
//!
//! A [`Node`] stacks three layers over one [`Transport`]:
//!
//! - [`Phy`] delimits frames in the raw byte stream, byte-stuffed with COBS or
//!   SLIP.
//! - [`Mac`] prepends `[dst][src]` and filters on destination.
//! - [`Node`] appends a big-endian CRC16 and filters on source.

#[macro_use]
mod macros;

pub mod config;
pub mod direction;
pub mod error;
pub mod mac;
pub mod packet;
pub mod phy;
pub mod trace;
pub mod transport;
pub mod util;

pub use codec;
pub use message;

pub use self::{
    config::{
        Config,
        Turnaround,
    },
    direction::{
        BusDirection,
        Mode,
    },
    error::{
        Error,
        Layer,
        Result,
    },
    mac::{
        Mac,
        MacFrame,
    },
    packet::{
        Node,
        Packet,
    },
    phy::Phy,
    transport::Transport,
    util::{
        Clock,
        Deadline,
        StepClock,
        SystemClock,
        Wait,
    },
};
pub use codec::Scheme;
pub use message::{
    Address,
    Status,
};
