use std::{
    cell::RefCell,
    fmt::{
        Display,
        Formatter,
    },
    io,
    rc::Rc,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Mode {
    Transmit,
    Receive,
}

impl Display for Mode {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Mode::Transmit => f.write_str("transmit"),
            Mode::Receive => f.write_str("receive"),
        }
    }
}

/// Switches a half-duplex medium between driving and listening.
pub trait BusDirection {
    fn set_mode(&mut self, pin: u8, mode: Mode) -> io::Result<()>;
}

impl<T> BusDirection for &mut T
where
    T: BusDirection + ?Sized,
{
    #[inline]
    fn set_mode(&mut self, pin: u8, mode: Mode) -> io::Result<()> {
        (**self).set_mode(pin, mode)
    }
}

impl<T> BusDirection for Box<T>
where
    T: BusDirection + ?Sized,
{
    #[inline]
    fn set_mode(&mut self, pin: u8, mode: Mode) -> io::Result<()> {
        (**self).set_mode(pin, mode)
    }
}

/// For transceivers with automatic direction control.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NoDirection;

impl BusDirection for NoDirection {
    #[inline]
    fn set_mode(&mut self, _pin: u8, _mode: Mode) -> io::Result<()> {
        Ok(())
    }
}

/// Records every direction change. Clones share one log.
#[derive(Debug, Clone, Default)]
pub struct DirectionLog {
    log: Rc<RefCell<Vec<(u8, Mode)>>>,
}

impl DirectionLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> Vec<(u8, Mode)> {
        self.log.borrow().clone()
    }

    pub fn clear(&self) {
        self.log.borrow_mut().clear();
    }
}

impl BusDirection for DirectionLog {
    fn set_mode(&mut self, pin: u8, mode: Mode) -> io::Result<()> {
        self.log.borrow_mut().push((pin, mode));
        Ok(())
    }
}
