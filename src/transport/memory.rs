use std::{
    cell::RefCell,
    collections::VecDeque,
    io,
    rc::Rc,
};

use crate::transport::Transport;

#[derive(Debug, Default)]
struct Inner {
    echo:  bool,
    ports: Vec<PortState>,
}

#[derive(Debug, Default)]
struct PortState {
    inbox:       VecDeque<u8>,
    written:     Vec<u8>,
    fail_writes: bool,
    fail_reads:  bool,
}

/// In-memory shared medium. Bytes written by one port arrive at every other
/// attached port, and at the writer too when echo is enabled.
#[derive(Debug, Clone, Default)]
pub struct MemoryBus {
    inner: Rc<RefCell<Inner>>,
}

impl MemoryBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bus on which writers hear their own transmissions, as on a real
    /// two-wire medium with the receiver left enabled.
    pub fn with_echo() -> Self {
        let bus = Self::default();
        bus.inner.borrow_mut().echo = true;

        bus
    }

    pub fn attach(&self) -> MemoryPort {
        let mut inner = self.inner.borrow_mut();
        inner.ports.push(PortState::default());

        MemoryPort {
            bus: self.inner.clone(),
            id:  inner.ports.len() - 1,
        }
    }
}

/// One node's tap on a [`MemoryBus`]. Clones are handles to the same tap.
#[derive(Debug, Clone)]
pub struct MemoryPort {
    bus: Rc<RefCell<Inner>>,
    id:  usize,
}

impl MemoryPort {
    /// Queues raw bytes for this port only, as if they arrived off the wire.
    pub fn inject(&self, bytes: &[u8]) {
        self.bus.borrow_mut().ports[self.id].inbox.extend(bytes);
    }

    /// Everything this port has written so far.
    pub fn written(&self) -> Vec<u8> {
        self.bus.borrow().ports[self.id].written.clone()
    }

    /// Bytes queued for this port and not yet read.
    pub fn pending(&self) -> usize {
        self.bus.borrow().ports[self.id].inbox.len()
    }

    pub fn set_fail_writes(&self, fail: bool) {
        self.bus.borrow_mut().ports[self.id].fail_writes = fail;
    }

    pub fn set_fail_reads(&self, fail: bool) {
        self.bus.borrow_mut().ports[self.id].fail_reads = fail;
    }
}

impl Transport for MemoryPort {
    fn available(&mut self) -> io::Result<usize> {
        Ok(self.pending())
    }

    fn read_byte(&mut self) -> io::Result<Option<u8>> {
        let mut inner = self.bus.borrow_mut();
        let port = &mut inner.ports[self.id];

        if port.fail_reads {
            return Err(io::Error::new(io::ErrorKind::BrokenPipe, "bus read disabled"));
        }

        Ok(port.inbox.pop_front())
    }

    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let mut inner = self.bus.borrow_mut();
        let echo = inner.echo;

        if inner.ports[self.id].fail_writes {
            return Err(io::Error::new(io::ErrorKind::BrokenPipe, "bus write disabled"));
        }

        for (id, port) in inner.ports.iter_mut().enumerate() {
            if id == self.id {
                port.written.extend_from_slice(buf);

                if !echo {
                    continue;
                }
            }

            port.inbox.extend(buf);
        }

        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_delivery() -> eyre::Result<()> {
        let bus = MemoryBus::new();
        let mut a = bus.attach();
        let mut b = bus.attach();
        let c = bus.attach();

        a.write_all(b"hi")?;

        assert_eq!(a.available()?, 0);
        assert_eq!(c.pending(), 2);
        assert_eq!(b.read_byte()?, Some(b'h'));
        assert_eq!(b.read_byte()?, Some(b'i'));
        assert_eq!(b.read_byte()?, None);
        assert_eq!(a.written(), b"hi");

        Ok(())
    }

    #[test]
    fn test_echo() -> eyre::Result<()> {
        let bus = MemoryBus::with_echo();
        let mut a = bus.attach();

        a.write_all(&[1, 2])?;
        assert_eq!(a.available()?, 2);

        Ok(())
    }

    #[test]
    fn test_failed_write_delivers_nothing() {
        let bus = MemoryBus::new();
        let mut a = bus.attach();
        let b = bus.attach();

        a.set_fail_writes(true);

        assert!(a.write_all(&[1]).is_err());
        assert_eq!(b.pending(), 0);
        assert!(a.written().is_empty());
    }

    #[test]
    fn test_failed_read_keeps_inbox() {
        let mut port = MemoryBus::new().attach();

        port.inject(&[7]);
        port.set_fail_reads(true);

        assert!(port.read_byte().is_err());
        assert_eq!(port.pending(), 1);
    }
}
