use std::{
    io::{
        self,
        Read,
        Write,
    },
    time::Duration,
};

use tokio_serial::SerialPort;

use crate::{
    direction::{
        BusDirection,
        Mode,
    },
    transport::Transport,
};

/// Synchronous serial device.
pub struct SerialTransport {
    port: Box<dyn SerialPort>,
}

impl SerialTransport {
    #[tracing::instrument(level = "debug")]
    pub fn open(path: &str, baud: u32) -> io::Result<Self> {
        let port = tokio_serial::new(path, baud).timeout(Duration::from_millis(10)).open()?;

        tracing::debug!("serial port open");

        Ok(Self {
            port,
        })
    }

    /// Direction control driven by this port's RTS line.
    pub fn rts_direction(&self) -> io::Result<RtsDirection> {
        Ok(RtsDirection {
            port: self.port.try_clone()?,
        })
    }
}

impl Transport for SerialTransport {
    fn available(&mut self) -> io::Result<usize> {
        Ok(self.port.bytes_to_read()? as usize)
    }

    fn read_byte(&mut self) -> io::Result<Option<u8>> {
        if self.available()? == 0 {
            return Ok(None);
        }

        let mut byte = [0u8; 1];

        match self.port.read(&mut byte) {
            Ok(0) => Ok(None),
            Ok(_) => Ok(Some(byte[0])),
            Err(e) if e.kind() == io::ErrorKind::TimedOut => Ok(None),
            Err(e) => Err(e),
        }
    }

    #[inline]
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.port.write(buf)
    }

    #[inline]
    fn flush(&mut self) -> io::Result<()> {
        self.port.flush()
    }
}

/// Drives transceiver direction with RTS: asserted while transmitting.
pub struct RtsDirection {
    port: Box<dyn SerialPort>,
}

impl BusDirection for RtsDirection {
    fn set_mode(&mut self, _pin: u8, mode: Mode) -> io::Result<()> {
        self.port.write_request_to_send(mode == Mode::Transmit)?;
        Ok(())
    }
}
