use std::io;

mod memory;
mod serial;

pub use memory::{
    MemoryBus,
    MemoryPort,
};
pub use serial::{
    RtsDirection,
    SerialTransport,
};

/// Raw byte stream underneath the framer. Reads never block.
pub trait Transport {
    /// Number of bytes that can be read without waiting.
    fn available(&mut self) -> io::Result<usize>;

    /// Next byte, or `None` if nothing has arrived.
    fn read_byte(&mut self) -> io::Result<Option<u8>>;

    /// Writes some prefix of `buf`, returning how much was taken.
    fn write(&mut self, buf: &[u8]) -> io::Result<usize>;

    /// Blocks until everything written has left the device.
    fn flush(&mut self) -> io::Result<()>;

    fn write_all(&mut self, mut buf: &[u8]) -> io::Result<()> {
        while !buf.is_empty() {
            match self.write(buf) {
                Ok(0) => return Err(io::ErrorKind::WriteZero.into()),
                Ok(n) => buf = &buf[n..],
                Err(e) if e.kind() == io::ErrorKind::Interrupted => {},
                Err(e) => return Err(e),
            }
        }

        Ok(())
    }
}

impl<T> Transport for &mut T
where
    T: Transport + ?Sized,
{
    #[inline]
    fn available(&mut self) -> io::Result<usize> {
        (**self).available()
    }

    #[inline]
    fn read_byte(&mut self) -> io::Result<Option<u8>> {
        (**self).read_byte()
    }

    #[inline]
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        (**self).write(buf)
    }

    #[inline]
    fn flush(&mut self) -> io::Result<()> {
        (**self).flush()
    }
}

impl<T> Transport for Box<T>
where
    T: Transport + ?Sized,
{
    #[inline]
    fn available(&mut self) -> io::Result<usize> {
        (**self).available()
    }

    #[inline]
    fn read_byte(&mut self) -> io::Result<Option<u8>> {
        (**self).read_byte()
    }

    #[inline]
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        (**self).write(buf)
    }

    #[inline]
    fn flush(&mut self) -> io::Result<()> {
        (**self).flush()
    }
}
