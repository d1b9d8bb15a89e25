mod address;
pub mod checksum;
pub mod crc;
pub mod header;
mod status;

pub use address::Address;
pub use checksum::Checksum;
pub use header::MacHeader;
pub use status::Status;

impl_checksum!(pub StandardCRC, u16, ::crc::CRC_16_IBM_3740);
