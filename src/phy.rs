use std::time::Duration;

use bytes::{
    BufMut,
    BytesMut,
};
use codec::{
    tokio_codec::{
        Decoder,
        Encoder,
    },
    Scheme,
};
use message::Status;

use crate::{
    config::Turnaround,
    direction::{
        BusDirection,
        Mode,
    },
    error::{
        Error,
        Layer,
        Result,
    },
    transport::Transport,
    util::{
        Clock,
        Deadline,
        Wait,
    },
    Config,
};

/// Receive accumulation state: sync flag plus the stuffed bytes seen since
/// the opening delimiter.
#[derive(Debug)]
struct Accumulator {
    synced:   bool,
    buf:      BytesMut,
    capacity: usize,
}

impl Accumulator {
    fn new(capacity: usize) -> Self {
        Self {
            synced: false,
            buf: BytesMut::with_capacity(capacity),
            capacity,
        }
    }

    #[inline]
    fn push(&mut self, byte: u8) -> Result<()> {
        if self.buf.len() >= self.capacity {
            let capacity = self.capacity;
            self.reset();

            return Err(Error::Overflow {
                capacity,
            });
        }

        self.buf.put_u8(byte);
        Ok(())
    }

    fn reset(&mut self) {
        self.synced = false;
        self.buf.clear();
        self.buf.reserve(self.capacity);
    }
}

/// Outcome of processing at most one byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Step {
    Frame(usize),
    Progress,
    Idle,
    Noise(u8),
}

/// Byte-at-a-time frame detector over a [`Transport`], with the direction
/// control needed to transmit on a half-duplex bus.
pub struct Phy<T, D, C> {
    transport:     T,
    direction:     D,
    clock:         C,
    scheme:        Scheme,
    pin:           u8,
    turnaround:    Turnaround,
    blocking:      bool,
    timeout:       Duration,
    body_capacity: usize,
    acc:           Accumulator,
    tx:            BytesMut,
    status:        Status,
}

impl<T, D, C> Phy<T, D, C>
where
    T: Transport,
    D: BusDirection,
    C: Clock,
{
    pub fn new(transport: T, direction: D, clock: C, config: &Config) -> Self {
        let scheme = config.scheme();
        if scheme != config.scheme {
            tracing::warn!(
                max_payload = config.max_payload,
                requested = %config.scheme,
                "payload too large for cobs, using slip"
            );
        }

        let frame_capacity = config.frame_capacity();

        Self {
            transport,
            direction,
            clock,
            scheme,
            pin: config.direction_pin,
            turnaround: config.turnaround,
            blocking: config.blocking,
            timeout: config.timeout(),
            body_capacity: config.body_capacity(),
            acc: Accumulator::new(frame_capacity),
            tx: BytesMut::with_capacity(frame_capacity + 2),
            status: Status::NoError,
        }
    }

    /// Drops any partial frame, clears the status and puts the bus in receive
    /// mode.
    pub fn begin(&mut self) -> Result<()> {
        self.acc.reset();
        self.status = Status::NoError;

        self.receive_mode().map_err(|e| self.fail(e))
    }

    /// Stuffs `body`, frames it with delimiters and writes it with the bus in
    /// transmit mode. Returns the stuffed length, delimiters excluded.
    #[tracing::instrument(skip_all, fields(len = body.len()), level = "trace")]
    pub fn send(&mut self, body: &[u8]) -> Result<usize> {
        match self.transmit(body) {
            Ok(len) => {
                self.status = Status::NoError;
                Ok(len)
            },
            Err(e) => Err(self.fail(e)),
        }
    }

    fn transmit(&mut self, body: &[u8]) -> Result<usize> {
        if body.len() > self.body_capacity {
            return Err(Error::Oversize {
                layer:    Layer::Phy,
                size:     body.len(),
                capacity: self.body_capacity,
            });
        }

        let delimiter = self.scheme.delimiter();

        self.tx.clear();
        self.tx.put_u8(delimiter);
        self.scheme.encode(body, &mut self.tx).map_err(Error::Encode)?;
        self.tx.put_u8(delimiter);

        let stuffed = self.tx.len() - 2;

        tracing::trace!(frame = %hex::encode(&self.tx), "transmitting");

        self.transmit_mode()?;

        let written = self
            .transport
            .write_all(&self.tx)
            .and_then(|()| self.transport.flush())
            .map_err(Error::Write);

        // the bus goes back to receive even if the write failed
        let reverted = self.receive_mode();

        written?;
        reverted?;

        tracing::debug!(body = body.len(), stuffed, "frame sent");

        Ok(stuffed)
    }

    fn transmit_mode(&mut self) -> Result<()> {
        if self.pin == 0 {
            return Ok(());
        }

        self.direction.set_mode(self.pin, Mode::Transmit).map_err(Error::Direction)?;
        self.clock.delay(self.turnaround.settle());

        Ok(())
    }

    fn receive_mode(&mut self) -> Result<()> {
        if self.pin == 0 {
            return Ok(());
        }

        self.clock.delay(self.turnaround.tail());
        self.direction.set_mode(self.pin, Mode::Receive).map_err(Error::Direction)
    }

    /// Polls for one frame, destuffing it into `buf`.
    ///
    /// Non-blocking calls process at most one byte and return `Ok(None)`
    /// until a frame completes. Blocking calls keep polling until a frame
    /// arrives, a framing error occurs or the timeout passes.
    pub fn receive(&mut self, buf: &mut [u8], wait: Wait) -> Result<Option<usize>> {
        let deadline = self.deadline(wait);
        self.receive_until(buf, deadline)
    }

    /// Deadline for a call made with `wait`, or `None` for a single poll.
    pub(crate) fn deadline(&self, wait: Wait) -> Option<Deadline> {
        if !(wait.blocking || self.blocking) {
            return None;
        }

        Some(Deadline::new(self.clock.now(), wait.limit(self.timeout)))
    }

    #[inline]
    pub(crate) fn expired(&self, deadline: &Deadline) -> bool {
        deadline.expired(self.clock.now())
    }

    pub(crate) fn receive_until(
        &mut self,
        buf: &mut [u8],
        deadline: Option<Deadline>,
    ) -> Result<Option<usize>> {
        loop {
            let step = self.step(buf).map_err(|e| self.fail(e))?;

            match (step, deadline) {
                (Step::Frame(len), _) => {
                    self.status = Status::NoError;
                    return Ok(Some(len));
                },

                (Step::Progress, None) => {
                    self.status = Status::NoError;
                    return Ok(None);
                },

                (Step::Idle, None) => {
                    self.status = Status::NoData;
                    return Ok(None);
                },

                (Step::Noise(byte), None) => return Err(self.fail(Error::Noise(byte))),

                (Step::Noise(byte), Some(_)) => {
                    tracing::trace!(byte = %format_args!("0x{:02x}", byte), "discarding noise");
                },

                (Step::Progress | Step::Idle, Some(_)) => {},
            }

            if let Some(deadline) = deadline {
                if self.expired(&deadline) {
                    return Err(self.fail(Error::Timeout(deadline.limit())));
                }

                if step == Step::Idle {
                    std::hint::spin_loop();
                }
            }
        }
    }

    fn step(&mut self, buf: &mut [u8]) -> Result<Step> {
        let byte = match self.transport.read_byte().map_err(Error::Read)? {
            Some(byte) => byte,
            None => return Ok(Step::Idle),
        };

        if byte != self.scheme.delimiter() {
            if !self.acc.synced {
                return Ok(Step::Noise(byte));
            }

            self.acc.push(byte)?;
            return Ok(Step::Progress);
        }

        if !self.acc.synced {
            tracing::trace!("frame start");
            self.acc.synced = true;

            return Ok(Step::Progress);
        }

        if self.acc.buf.is_empty() {
            tracing::trace!("resync");
            return Ok(Step::Progress);
        }

        self.extract(buf).map(Step::Frame)
    }

    fn extract(&mut self, buf: &mut [u8]) -> Result<usize> {
        let stuffed = self.acc.buf.len();
        let decoded = self.scheme.decode(&mut self.acc.buf);
        self.acc.reset();

        let body = decoded?.unwrap_or_default();

        if body.len() > self.body_capacity {
            return Err(Error::Oversize {
                layer:    Layer::Phy,
                size:     body.len(),
                capacity: self.body_capacity,
            });
        }

        if body.len() > buf.len() {
            return Err(Error::BufferTooSmall {
                len:  buf.len(),
                size: body.len(),
            });
        }

        buf[..body.len()].copy_from_slice(&body);

        tracing::debug!(stuffed, body = %hex::encode(&body), "frame received");

        Ok(body.len())
    }

    fn fail(&mut self, err: Error) -> Error {
        self.status = err.status();
        err
    }

    /// Status left by the most recent call.
    #[inline]
    pub fn status(&self) -> Status {
        self.status
    }

    #[inline]
    pub fn scheme(&self) -> Scheme {
        self.scheme
    }

    #[inline]
    pub fn body_capacity(&self) -> usize {
        self.body_capacity
    }

    #[inline]
    pub fn frame_capacity(&self) -> usize {
        self.acc.capacity
    }

    #[inline]
    pub fn clock(&self) -> &C {
        &self.clock
    }

    #[inline]
    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }
}
