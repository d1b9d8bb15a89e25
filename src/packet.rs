use bytes::BytesMut;
use message::{
    crc,
    Address,
    StandardCRC,
    Status,
};

use crate::{
    direction::BusDirection,
    error::{
        Error,
        Layer,
        Result,
    },
    mac::Mac,
    phy::Phy,
    transport::Transport,
    util::{
        Clock,
        Wait,
    },
    Config,
};

/// A verified packet delivered into the caller's buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Packet {
    pub len:    usize,
    pub source: Address,
}

/// One node on the bus: the full PHY, MAC and packet stack over a single
/// transport.
pub struct Node<T, D, C> {
    mac:      Mac<T, D, C>,
    capacity: usize,
    rx:       Vec<u8>,
    tx:       BytesMut,
    status:   Status,
}

impl<T, D, C> Node<T, D, C>
where
    T: Transport,
    D: BusDirection,
    C: Clock,
{
    pub fn new(transport: T, direction: D, clock: C, config: &Config) -> Self {
        Self {
            mac:      Mac::new(transport, direction, clock, config),
            capacity: config.max_payload,
            rx:       vec![0; config.mac_capacity()],
            tx:       BytesMut::with_capacity(config.mac_capacity()),
            status:   Status::NoError,
        }
    }

    /// Reinitializes the node under `address`: statuses are cleared, any
    /// partial frame is dropped and the bus is put in receive mode.
    #[tracing::instrument(skip(self), level = "debug")]
    pub fn begin(&mut self, address: Address) -> Result<()> {
        self.status = Status::NoError;
        self.mac.begin(address)
    }

    /// Sends `data` to `destination` with a checksum trailer. Returns the
    /// number of bytes handed to the MAC layer.
    #[tracing::instrument(skip(self, data), fields(len = data.len()), level = "debug")]
    pub fn send_to(&mut self, destination: Address, data: &[u8]) -> Result<usize> {
        match self.transmit(destination, data) {
            Ok(len) => {
                self.status = Status::NoError;
                Ok(len)
            },
            Err(e) => Err(self.fail(e)),
        }
    }

    fn transmit(&mut self, destination: Address, data: &[u8]) -> Result<usize> {
        if data.len() > self.capacity {
            return Err(Error::Oversize {
                layer:    Layer::Packet,
                size:     data.len(),
                capacity: self.capacity,
            });
        }

        self.tx.clear();
        crc::seal::<StandardCRC>(data, &mut self.tx);

        self.mac.send(destination, &self.tx).map_err(|e| Error::send(Layer::Mac, e))?;

        Ok(self.tx.len())
    }

    /// Receives the next intact packet from `source`. Packets from other
    /// senders are skipped.
    #[tracing::instrument(skip(self, buf), level = "trace")]
    pub fn receive_from(
        &mut self,
        buf: &mut [u8],
        source: Address,
        wait: Wait,
    ) -> Result<Option<usize>> {
        let packet = self.receive_filtered(buf, Some(source), wait)?;
        Ok(packet.map(|p| p.len))
    }

    /// Receives the next intact packet from any sender.
    #[tracing::instrument(skip(self, buf), level = "trace")]
    pub fn receive(&mut self, buf: &mut [u8], wait: Wait) -> Result<Option<Packet>> {
        self.receive_filtered(buf, None, wait)
    }

    fn receive_filtered(
        &mut self,
        buf: &mut [u8],
        expected: Option<Address>,
        wait: Wait,
    ) -> Result<Option<Packet>> {
        let deadline = self.mac.phy().deadline(wait);

        loop {
            match self.mac.receive_until(&mut self.rx, deadline) {
                Ok(Some(frame)) => {
                    let data = match crc::open::<StandardCRC>(&self.rx[..frame.len]) {
                        Ok(data) => data,
                        Err(e) => return Err(self.fail(e.into())),
                    };

                    match expected {
                        Some(expected) if expected != frame.source => {
                            tracing::debug!(
                                source = %frame.source.display(),
                                expected = %expected.display(),
                                "skipping packet from another sender"
                            );

                            if deadline.is_none() {
                                self.status = Status::NoData;
                                return Ok(None);
                            }
                        },

                        _ => {
                            if data.len() > buf.len() {
                                let err = Error::BufferTooSmall {
                                    len:  buf.len(),
                                    size: data.len(),
                                };

                                return Err(self.fail(err));
                            }

                            buf[..data.len()].copy_from_slice(data);

                            self.status = Status::NoError;
                            return Ok(Some(Packet {
                                len:    data.len(),
                                source: frame.source,
                            }));
                        },
                    }
                },

                Ok(None)
                | Err(Error::NoFrame {
                    ..
                }) if deadline.is_none() => {
                    self.status = Status::NoData;
                    return Ok(None);
                },

                Ok(None)
                | Err(Error::NoFrame {
                    ..
                }) => {},

                Err(e) => return Err(self.fail(e)),
            }

            if let Some(deadline) = deadline {
                if self.mac.phy().expired(&deadline) {
                    return Err(self.fail(Error::Timeout(deadline.limit())));
                }
            }
        }
    }

    fn fail(&mut self, err: Error) -> Error {
        self.status = err.status();
        err
    }

    /// Status left by the most recent call serviced by `layer`.
    pub fn status(&self, layer: Layer) -> Status {
        match layer {
            Layer::Phy => self.mac.phy().status(),
            Layer::Mac => self.mac.status(),
            Layer::Packet => self.status,
        }
    }

    #[inline]
    pub fn address(&self) -> Address {
        self.mac.address()
    }

    /// Largest packet [`Node::send_to`] accepts.
    #[inline]
    pub fn max_payload(&self) -> usize {
        self.capacity
    }

    #[inline]
    pub fn mac(&self) -> &Mac<T, D, C> {
        &self.mac
    }

    #[inline]
    pub fn mac_mut(&mut self) -> &mut Mac<T, D, C> {
        &mut self.mac
    }

    #[inline]
    pub fn phy(&self) -> &Phy<T, D, C> {
        self.mac.phy()
    }

    #[inline]
    pub fn phy_mut(&mut self) -> &mut Phy<T, D, C> {
        self.mac.phy_mut()
    }
}
