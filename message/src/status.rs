use std::fmt::{
    Display,
    Formatter,
};

use packed_struct::prelude::*;

/// Result code kept by every protocol layer. The numeric values are stable and
/// shared by all layers.
#[derive(
    Copy,
    Clone,
    Debug,
    Default,
    PartialEq,
    Eq,
    Hash,
    PrimitiveEnum_u8,
    serde::Serialize,
    serde::Deserialize,
)]
pub enum Status {
    #[default]
    NoError                  = 0,
    Oversize                 = 1,
    CrcError                 = 2,
    DecodeError              = 3,
    EncodeError              = 4,
    Timeout                  = 5,
    WriteError               = 6,
    ReadError                = 7,
    NoData                   = 8,
    ErrorData                = 9,
    ReadErrorSourceBroadcast = 10,
    ReadErrorSourceSelf      = 11,
    UnknownError             = 99,
}

impl Status {
    #[inline]
    pub fn code(self) -> u8 {
        self.to_primitive()
    }
}

impl Display for Status {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let text = match self {
            Status::NoError => "no error",
            Status::Oversize => "oversize",
            Status::CrcError => "crc error",
            Status::DecodeError => "decode error",
            Status::EncodeError => "encode error",
            Status::Timeout => "timeout",
            Status::WriteError => "write error",
            Status::ReadError => "read error",
            Status::NoData => "no data",
            Status::ErrorData => "error data",
            Status::ReadErrorSourceBroadcast => "source is broadcast",
            Status::ReadErrorSourceSelf => "source is self",
            Status::UnknownError => "unknown error",
        };

        write!(f, "{} ({})", text, self.code())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_codes_are_stable() {
        let expected = [
            (Status::NoError, 0),
            (Status::Oversize, 1),
            (Status::CrcError, 2),
            (Status::DecodeError, 3),
            (Status::EncodeError, 4),
            (Status::Timeout, 5),
            (Status::WriteError, 6),
            (Status::ReadError, 7),
            (Status::NoData, 8),
            (Status::ErrorData, 9),
            (Status::ReadErrorSourceBroadcast, 10),
            (Status::ReadErrorSourceSelf, 11),
            (Status::UnknownError, 99),
        ];

        for (status, code) in expected {
            assert_eq!(status.code(), code);
            assert_eq!(Status::from_primitive(code), Some(status));
        }

        assert_eq!(Status::from_primitive(12), None);
    }
}
