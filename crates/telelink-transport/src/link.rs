use crate::error::Result;

/// Largest payload the RFM95 LoRa module accepts in one packet.
pub const RFM95_MAX_MESSAGE_LEN: usize = 251;

/// A best-effort datagram channel: whole frames in, whole frames out.
pub trait Link {
    /// Send exactly `frame` as one datagram.
    ///
    /// Frames larger than [`Link::max_frame_size`] are rejected before
    /// anything reaches the wire.
    fn send(&mut self, frame: &[u8]) -> Result<()>;

    /// Receive one datagram into `buf`.
    ///
    /// Returns `Ok(None)` when nothing is available. A datagram longer than
    /// `buf` is truncated to `buf.len()`, the way the radio driver does.
    fn receive(&mut self, buf: &mut [u8]) -> Result<Option<usize>>;

    /// Largest frame this link carries.
    fn max_frame_size(&self) -> usize;
}

impl<L: Link + ?Sized> Link for &mut L {
    fn send(&mut self, frame: &[u8]) -> Result<()> {
        (**self).send(frame)
    }

    fn receive(&mut self, buf: &mut [u8]) -> Result<Option<usize>> {
        (**self).receive(buf)
    }

    fn max_frame_size(&self) -> usize {
        (**self).max_frame_size()
    }
}

impl<L: Link + ?Sized> Link for Box<L> {
    fn send(&mut self, frame: &[u8]) -> Result<()> {
        (**self).send(frame)
    }

    fn receive(&mut self, buf: &mut [u8]) -> Result<Option<usize>> {
        (**self).receive(buf)
    }

    fn max_frame_size(&self) -> usize {
        (**self).max_frame_size()
    }
}
