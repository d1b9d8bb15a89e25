use std::time::Duration;

use codec::Scheme;
use message::{
    crc,
    Address,
    MacHeader,
    StandardCRC,
};

/// Static configuration for one bus node.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct Config {
    pub address:       Address,
    /// Largest packet data length this node sends or accepts.
    pub max_payload:   usize,
    pub scheme:        Scheme,
    /// Direction-control line. `0` disables direction control entirely.
    pub direction_pin: u8,
    /// Instance default for blocking receives.
    pub blocking:      bool,
    pub timeout_ms:    u64,
    pub turnaround:    Turnaround,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            address:       Address::new(0),
            max_payload:   64,
            scheme:        Scheme::Slip,
            direction_pin: 0,
            blocking:      false,
            timeout_ms:    1000,
            turnaround:    Turnaround::default(),
        }
    }
}

impl Config {
    /// Scheme in effect, after the COBS size fallback.
    #[inline]
    pub fn scheme(&self) -> Scheme {
        self.scheme.for_payload(self.max_payload)
    }

    #[inline]
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Largest MAC payload: packet data plus its checksum trailer.
    #[inline]
    pub fn mac_capacity(&self) -> usize {
        self.max_payload + crc::overhead::<StandardCRC>()
    }

    /// Largest unstuffed PHY body: MAC payload plus its header.
    #[inline]
    pub fn body_capacity(&self) -> usize {
        self.mac_capacity() + MacHeader::SIZE
    }

    /// Size of the receive accumulator: the worst-case stuffed body.
    #[inline]
    pub fn frame_capacity(&self) -> usize {
        self.scheme().max_encoding_length(self.body_capacity())
    }
}

/// Half-duplex bus turnaround delays around a transmission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct Turnaround {
    /// Delay after switching to transmit, before the first byte.
    pub settle_ms: u64,
    /// Delay after the flush, before switching back to receive.
    pub tail_ms:   u64,
}

impl Default for Turnaround {
    fn default() -> Self {
        Self {
            settle_ms: 10,
            tail_ms:   10,
        }
    }
}

impl Turnaround {
    #[inline]
    pub fn settle(&self) -> Duration {
        Duration::from_millis(self.settle_ms)
    }

    #[inline]
    pub fn tail(&self) -> Duration {
        Duration::from_millis(self.tail_ms)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_capacities_nest() {
        let config = Config::default();

        assert_eq!(config.mac_capacity(), 66);
        assert_eq!(config.body_capacity(), 68);
        assert_eq!(config.frame_capacity(), 136);
    }

    #[test]
    fn test_cobs_capacity() {
        let config = Config {
            scheme: Scheme::Cobs,
            ..Config::default()
        };

        assert_eq!(config.frame_capacity(), config.max_payload + 5);
    }

    #[test]
    fn test_partial_config_uses_defaults() -> eyre::Result<()> {
        let config: Config = serde_json::from_str(
            r#"{ "address": 5, "scheme": "cobs", "turnaround": { "settle_ms": 2 } }"#,
        )?;

        assert_eq!(config.address, Address::new(5));
        assert_eq!(config.scheme(), Scheme::Cobs);
        assert_eq!(config.max_payload, 64);
        assert_eq!(config.turnaround, Turnaround {
            settle_ms: 2,
            tail_ms:   10,
        });

        Ok(())
    }

    #[test]
    fn test_large_payload_forces_slip() {
        let config = Config {
            scheme: Scheme::Cobs,
            max_payload: 251,
            ..Config::default()
        };

        assert_eq!(config.scheme(), Scheme::Slip);
        assert_eq!(config.frame_capacity(), (251 + 4) * 2);
    }
}
