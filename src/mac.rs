use bytes::{
    BufMut,
    BytesMut,
};
use message::{
    Address,
    MacHeader,
    Status,
};
use packed_struct::PackedStruct;

use crate::{
    direction::BusDirection,
    error::{
        Error,
        Layer,
        Result,
    },
    phy::Phy,
    transport::Transport,
    util::{
        Clock,
        Deadline,
        Wait,
    },
    Config,
};

/// A MAC payload delivered into the caller's buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MacFrame {
    pub len:    usize,
    pub source: Address,
    /// [`Status::ReadErrorSourceSelf`] or [`Status::ReadErrorSourceBroadcast`]
    /// for suspicious sources, otherwise [`Status::NoError`]. The payload is
    /// delivered either way.
    pub status: Status,
}

/// Addressing layer: prepends `[dst][src]` on send and drops frames meant for
/// other nodes on receive.
pub struct Mac<T, D, C> {
    phy:      Phy<T, D, C>,
    address:  Address,
    capacity: usize,
    rx:       Vec<u8>,
    tx:       BytesMut,
    status:   Status,
}

impl<T, D, C> Mac<T, D, C>
where
    T: Transport,
    D: BusDirection,
    C: Clock,
{
    pub fn new(transport: T, direction: D, clock: C, config: &Config) -> Self {
        let phy = Phy::new(transport, direction, clock, config);

        Self {
            rx: vec![0; phy.body_capacity()],
            tx: BytesMut::with_capacity(phy.body_capacity()),
            phy,
            address: config.address,
            capacity: config.mac_capacity(),
            status: Status::NoError,
        }
    }

    pub fn begin(&mut self, address: Address) -> Result<()> {
        self.address = address;
        self.status = Status::NoError;

        self.phy.begin()
    }

    #[tracing::instrument(skip(self, payload), fields(len = payload.len()), level = "debug")]
    pub fn send(&mut self, destination: Address, payload: &[u8]) -> Result<usize> {
        match self.transmit(destination, payload) {
            Ok(len) => {
                self.status = Status::NoError;
                Ok(len)
            },
            Err(e) => Err(self.fail(e)),
        }
    }

    fn transmit(&mut self, destination: Address, payload: &[u8]) -> Result<usize> {
        if payload.len() > self.capacity {
            return Err(Error::Oversize {
                layer:    Layer::Mac,
                size:     payload.len(),
                capacity: self.capacity,
            });
        }

        let header = MacHeader::new(destination, self.address);

        self.tx.clear();
        self.tx.put_slice(&header.pack()?);
        self.tx.put_slice(payload);

        self.phy.send(&self.tx).map_err(|e| Error::send(Layer::Phy, e))?;

        Ok(payload.len())
    }

    /// Receives the next frame addressed to this node or to broadcast,
    /// copying its payload into `buf`.
    ///
    /// Without blocking, a frame that is still arriving surfaces as
    /// [`Error::NoFrame`] carrying the framer's status, and a misaddressed
    /// frame as `Ok(None)`.
    pub fn receive(&mut self, buf: &mut [u8], wait: Wait) -> Result<Option<MacFrame>> {
        let deadline = self.phy.deadline(wait);
        self.receive_until(buf, deadline)
    }

    pub(crate) fn receive_until(
        &mut self,
        buf: &mut [u8],
        deadline: Option<Deadline>,
    ) -> Result<Option<MacFrame>> {
        loop {
            match self.phy.receive_until(&mut self.rx, deadline) {
                Ok(Some(len)) => match self.accept(len, buf) {
                    Ok(Some(frame)) => {
                        self.status = frame.status;
                        return Ok(Some(frame));
                    },

                    Ok(None) if deadline.is_none() => {
                        self.status = Status::NoError;
                        return Ok(None);
                    },

                    Ok(None) => {},

                    Err(e @ Error::Runt {
                        ..
                    }) if deadline.is_some() => {
                        tracing::warn!(error = %e, "dropping runt frame");
                    },

                    Err(e) => return Err(self.fail(e)),
                },

                Ok(None) => {
                    let status = self.phy.status();

                    return Err(self.fail(Error::NoFrame {
                        layer: Layer::Phy,
                        status,
                    }));
                },

                Err(e) if e.is_timeout() => return Err(self.fail(e)),

                Err(e) if deadline.is_some() && e.is_framing() => {
                    tracing::warn!(error = %e, "discarding failed frame");
                },

                Err(e) => return Err(self.fail(Error::receive(Layer::Phy, e))),
            }

            if let Some(deadline) = deadline {
                if self.phy.expired(&deadline) {
                    return Err(self.fail(Error::Timeout(deadline.limit())));
                }
            }
        }
    }

    fn accept(&self, len: usize, buf: &mut [u8]) -> Result<Option<MacFrame>> {
        let (header, payload) = MacHeader::split(&self.rx[..len]).map_err(|_| Error::Runt {
            len,
        })?;

        if !header.is_for(self.address) {
            tracing::debug!(
                header = %header.display(),
                local = %self.address.display(),
                "dropping frame for another node"
            );
            return Ok(None);
        }

        if payload.len() > buf.len() {
            return Err(Error::BufferTooSmall {
                len:  buf.len(),
                size: payload.len(),
            });
        }

        buf[..payload.len()].copy_from_slice(payload);

        let status = if header.source == self.address {
            tracing::warn!(header = %header.display(), "frame claims to come from this node");
            Status::ReadErrorSourceSelf
        } else if header.source.is_broadcast() {
            tracing::warn!(header = %header.display(), "frame claims a broadcast source");
            Status::ReadErrorSourceBroadcast
        } else {
            Status::NoError
        };

        Ok(Some(MacFrame {
            len: payload.len(),
            source: header.source,
            status,
        }))
    }

    fn fail(&mut self, err: Error) -> Error {
        self.status = err.status();
        err
    }

    #[inline]
    pub fn status(&self) -> Status {
        self.status
    }

    #[inline]
    pub fn address(&self) -> Address {
        self.address
    }

    /// Largest payload [`Mac::send`] accepts.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    #[inline]
    pub fn phy(&self) -> &Phy<T, D, C> {
        &self.phy
    }

    #[inline]
    pub fn phy_mut(&mut self) -> &mut Phy<T, D, C> {
        &mut self.phy
    }
}

#[cfg(test)]
mod test {
    use std::time::Duration;

    use super::*;
    use crate::{
        direction::NoDirection,
        transport::{
            MemoryBus,
            MemoryPort,
        },
        util::StepClock,
    };

    type TestMac = Mac<MemoryPort, NoDirection, StepClock>;

    fn config(address: u8) -> Config {
        Config {
            address: Address::new(address),
            max_payload: 8,
            ..Config::default()
        }
    }

    fn pair() -> (TestMac, TestMac, MemoryPort) {
        let bus = MemoryBus::new();
        let a = Mac::new(bus.attach(), NoDirection, StepClock::default(), &config(1));
        let port = bus.attach();
        let b = Mac::new(port.clone(), NoDirection, StepClock::default(), &config(2));

        (a, b, port)
    }

    #[test]
    fn test_send_prepends_header() -> eyre::Result<()> {
        let (mut a, _, mut b_port) = pair();

        assert_eq!(a.send(Address::new(2), b"hi")?, 2);

        let mut wire = Vec::new();
        while let Some(byte) = b_port.read_byte()? {
            wire.push(byte);
        }

        assert_eq!(wire, vec![0xc0, 2, 1, b'h', b'i', 0xc0]);

        Ok(())
    }

    #[test]
    fn test_oversize() {
        let (mut a, ..) = pair();
        let payload = vec![0u8; a.capacity() + 1];

        let err = a.send(Address::new(2), &payload).unwrap_err();

        assert!(matches!(err, Error::Oversize {
            layer: Layer::Mac,
            ..
        }));
        assert_eq!(a.status(), Status::Oversize);
    }

    #[test]
    fn test_phy_failure_is_write_error() {
        let (mut a, ..) = pair();
        a.phy_mut().transport_mut().set_fail_writes(true);

        let err = a.send(Address::new(2), b"x").unwrap_err();

        assert!(matches!(err, Error::Send {
            layer: Layer::Phy,
            ..
        }));
        assert_eq!(a.status(), Status::WriteError);
        assert_eq!(a.phy().status(), Status::WriteError);
    }

    #[test]
    fn test_blocking_receive() -> eyre::Result<()> {
        let (mut a, mut b, _) = pair();
        let mut buf = [0u8; 10];

        a.send(Address::new(2), b"abc")?;
        let frame = b.receive(&mut buf, Wait::millis(100))?;

        assert_eq!(
            frame,
            Some(MacFrame {
                len:    3,
                source: Address::new(1),
                status: Status::NoError,
            })
        );
        assert_eq!(&buf[..3], b"abc");

        Ok(())
    }

    #[test]
    fn test_broadcast_accepted() -> eyre::Result<()> {
        let (mut a, mut b, _) = pair();
        let mut buf = [0u8; 10];

        a.send(Address::BROADCAST, b"all")?;

        let frame = b.receive(&mut buf, Wait::millis(100))?.map(|f| f.len);
        assert_eq!(frame, Some(3));

        Ok(())
    }

    #[test]
    fn test_misaddressed_dropped() -> eyre::Result<()> {
        let (mut a, mut b, _) = pair();
        let mut buf = [0xaa; 10];

        a.send(Address::new(3), b"abc")?;

        // start, header, payload: "nothing yet" from the framer
        for _ in 0..6 {
            let err = b.receive(&mut buf, Wait::POLL).unwrap_err();
            assert!(matches!(err, Error::NoFrame { status: Status::NoError, .. }));
            assert_eq!(b.status(), Status::ReadError);
        }

        assert_eq!(b.receive(&mut buf, Wait::POLL)?, None);
        assert_eq!(b.status(), Status::NoError);
        assert_eq!(buf, [0xaa; 10]);

        Ok(())
    }

    #[test]
    fn test_misaddressed_blocking_times_out() {
        let (mut a, mut b, _) = pair();
        let mut buf = [0xaa; 10];

        a.send(Address::new(3), b"abc").unwrap();
        let err = b.receive(&mut buf, Wait::millis(40)).unwrap_err();

        assert!(matches!(err, Error::Timeout(t) if t == Duration::from_millis(40)));
        assert_eq!(b.status(), Status::Timeout);
        assert_eq!(buf, [0xaa; 10]);
    }

    #[test]
    fn test_suspicious_sources() -> eyre::Result<()> {
        let (_, mut b, port) = pair();
        let mut buf = [0u8; 10];

        port.inject(&[0xc0, 2, 2, 7, 0xc0]);
        let frame = b.receive(&mut buf, Wait::millis(100))?;
        assert_eq!(frame.map(|f| f.status), Some(Status::ReadErrorSourceSelf));
        assert_eq!(b.status(), Status::ReadErrorSourceSelf);

        port.inject(&[0xc0, 2, 0xff, 7, 0xc0]);
        let frame = b.receive(&mut buf, Wait::millis(100))?;
        assert_eq!(frame.map(|f| f.status), Some(Status::ReadErrorSourceBroadcast));

        Ok(())
    }

    #[test]
    fn test_runt() {
        let (_, mut b, port) = pair();
        let mut buf = [0u8; 10];

        port.inject(&[0xc0, 2, 0xc0]);

        let err = loop {
            match b.receive(&mut buf, Wait::POLL) {
                Err(Error::NoFrame {
                    ..
                }) => continue,
                other => break other.unwrap_err(),
            }
        };

        assert!(matches!(err, Error::Runt { len: 1 }));
        assert_eq!(b.status(), Status::DecodeError);
    }

    #[test]
    fn test_blocking_skips_noise_and_bad_frames() -> eyre::Result<()> {
        let (_, mut b, port) = pair();
        let mut buf = [0u8; 10];

        port.inject(&[0x11, 0xc0, 0xdb, 0x00, 0xc0]);
        port.inject(&[0xc0, 2, 0xc0]);
        port.inject(&[0xc0, 2, 9, 5, 0xc0]);

        let frame = b.receive(&mut buf, Wait::millis(100))?;

        assert_eq!(frame.map(|f| (f.len, f.source)), Some((1, Address::new(9))));
        assert_eq!(buf[0], 5);

        Ok(())
    }

    #[test]
    fn test_nonblocking_noise_is_read_error() {
        let (_, mut b, port) = pair();
        let mut buf = [0u8; 10];

        port.inject(&[0x11]);

        let err = b.receive(&mut buf, Wait::POLL).unwrap_err();
        assert!(matches!(err, Error::Receive {
            layer: Layer::Phy,
            ..
        }));
        assert_eq!(b.status(), Status::ReadError);
        assert_eq!(b.phy().status(), Status::ErrorData);
    }

    #[test]
    fn test_blocking_read_failure_is_not_retried() {
        let (_, mut b, port) = pair();
        let mut buf = [0u8; 10];

        port.set_fail_reads(true);

        let err = b.receive(&mut buf, Wait::millis(500)).unwrap_err();

        assert!(matches!(
            &err,
            Error::Receive { layer: Layer::Phy, source } if matches!(**source, Error::Read(_))
        ));
        assert_eq!(b.status(), Status::ReadError);
        assert_eq!(b.phy().status(), Status::ReadError);
        assert!(b.phy().clock().elapsed() < Duration::from_millis(10));
    }
}
